use serde::Deserialize;
use warp::{
    reject::Rejection,
    reply::{self, Reply},
};

use crate::{actions, api::state::AppState, error::ApiError, schema::Id};

#[derive(Deserialize, Debug, Default)]
pub struct IngredientQuery {
    pub name: Option<String>,
}

pub async fn list_tags(state: AppState) -> Result<reply::Response, Rejection> {
    let tags = actions::list_tags(&state.pool).await?;
    Ok(reply::json(&tags).into_response())
}

pub async fn get_tag(id: Id, state: AppState) -> Result<reply::Response, Rejection> {
    let tag = actions::get_tag(id, &state.pool)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(reply::json(&tag).into_response())
}

pub async fn list_ingredients(
    query: IngredientQuery,
    state: AppState,
) -> Result<reply::Response, Rejection> {
    let name = query.name.as_deref().map(str::trim).filter(|name| !name.is_empty());
    let ingredients = actions::search_ingredients(name, &state.pool).await?;

    Ok(reply::json(&ingredients).into_response())
}

pub async fn get_ingredient(id: Id, state: AppState) -> Result<reply::Response, Rejection> {
    let ingredient = actions::get_ingredient(id, &state.pool)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(reply::json(&ingredient).into_response())
}
