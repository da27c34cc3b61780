use warp::{
    reject::Rejection,
    reply::{self, Reply},
};

use crate::{
    actions::{self, RecipeFilter, RecipeList},
    api::state::AppState,
    form::RecipeForm,
    jwt::SessionData,
    schema::Id,
    SHOPPING_LIST_FILENAME,
};

use super::{created, no_content};

pub async fn list_recipes(
    pairs: Vec<(String, String)>,
    session: Option<SessionData>,
    state: AppState,
) -> Result<reply::Response, Rejection> {
    let filter = RecipeFilter::from_pairs(&pairs)?;
    let viewer = session.map(|session| session.user_id);
    let page = actions::fetch_recipes(&filter, viewer, &state.pool).await?;

    Ok(reply::json(&page).into_response())
}

pub async fn get_recipe(
    id: Id,
    session: Option<SessionData>,
    state: AppState,
) -> Result<reply::Response, Rejection> {
    let viewer = session.map(|session| session.user_id);
    let recipe = actions::get_recipe_view(id, viewer, &state.pool).await?;

    Ok(reply::json(&recipe).into_response())
}

pub async fn create_recipe(
    session: SessionData,
    form: RecipeForm,
    state: AppState,
) -> Result<reply::Response, Rejection> {
    let recipe = form.validate_create()?;
    let view = actions::create_recipe(&session, recipe, &state.pool).await?;

    Ok(created(&view))
}

pub async fn update_recipe(
    id: Id,
    session: SessionData,
    form: RecipeForm,
    state: AppState,
) -> Result<reply::Response, Rejection> {
    let changes = form.validate_update()?;
    let view = actions::update_recipe(id, &session, changes, &state.pool).await?;

    Ok(reply::json(&view).into_response())
}

pub async fn delete_recipe(
    id: Id,
    session: SessionData,
    state: AppState,
) -> Result<reply::Response, Rejection> {
    actions::delete_recipe(id, &session, &state.pool).await?;
    Ok(no_content())
}

pub async fn add_to_list(
    id: Id,
    list: RecipeList,
    session: SessionData,
    state: AppState,
) -> Result<reply::Response, Rejection> {
    let recipe = actions::add_to_list(list, &session, id, &state.pool).await?;
    Ok(created(&recipe))
}

pub async fn remove_from_list(
    id: Id,
    list: RecipeList,
    session: SessionData,
    state: AppState,
) -> Result<reply::Response, Rejection> {
    actions::remove_from_list(list, &session, id, &state.pool).await?;
    Ok(no_content())
}

pub async fn download_shopping_cart(
    session: SessionData,
    state: AppState,
) -> Result<reply::Response, Rejection> {
    let list = actions::fetch_shopping_list(&session, &state.pool).await?;
    log::debug!("User {} downloaded their shopping list", session.user_id);

    Ok(reply::with_header(
        list.render(),
        "Content-Disposition",
        format!("attachment; filename=\"{SHOPPING_LIST_FILENAME}\""),
    )
    .into_response())
}
