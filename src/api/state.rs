use std::convert::Infallible;

use sqlx::{Pool, Postgres};
use warp::Filter;

use crate::jwt::SessionKey;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: Pool<Postgres>,
    pub key: SessionKey,
    pub body_limit: u64,
}

impl AppState {
    pub fn new(pool: Pool<Postgres>, key: SessionKey, body_limit: u64) -> Self {
        Self {
            pool,
            key,
            body_limit,
        }
    }
}

pub fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}
