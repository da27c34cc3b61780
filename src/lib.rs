mod database {
    pub mod actions;
    pub mod error;
    pub mod form;
    pub mod ingest;
    pub mod pagination;
    pub mod schema;
}
mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
pub mod api {
    pub mod handlers;
    pub mod rejection;
    pub mod routes;
    pub mod state;

    pub use rejection::handle_rejection;
    pub use routes::routes;
    pub use state::AppState;
}
pub mod config;
mod constants;
pub mod logger;

pub use authentication::*;
pub use constants::*;
pub use database::*;
