mod recipes;
mod reference;
mod users;

pub use recipes::*;
pub use reference::*;
pub use users::*;

use warp::{
    http::StatusCode,
    reply::{self, Reply},
};

fn no_content() -> reply::Response {
    reply::with_status(reply::reply(), StatusCode::NO_CONTENT).into_response()
}

fn created<T: serde::Serialize>(value: &T) -> reply::Response {
    reply::with_status(reply::json(value), StatusCode::CREATED).into_response()
}
