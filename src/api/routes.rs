use std::convert::Infallible;

use serde::de::DeserializeOwned;
use warp::{reject::Rejection, Filter, Reply};

use super::{
    handlers,
    rejection::handle_rejection,
    state::{with_state, AppState},
};
use crate::{
    actions::RecipeList,
    jwt::SessionData,
    middleware::{with_possible_session, with_session},
    pagination::PageQuery,
    schema::Id,
};

fn json_body<T: DeserializeOwned + Send>(
    limit: u64,
) -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    warp::body::content_length_limit(limit).and(warp::body::json())
}

fn session(state: &AppState) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    with_session(state.key.clone(), state.pool.clone())
}

fn possible_session(
    state: &AppState,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
    with_possible_session(state.key.clone(), state.pool.clone())
}

/// The whole API under `/api`, with request logging and JSON error bodies.
pub fn routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    recipe_routes(&state)
        .or(list_routes("favorite", RecipeList::Favorites, &state))
        .or(list_routes("shopping_cart", RecipeList::ShoppingCart, &state))
        .or(user_routes(&state))
        .or(auth_routes(&state))
        .or(reference_routes(&state))
        .recover(handle_rejection)
        .with(warp::log("foodgram::api"))
}

fn recipe_routes(state: &AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let list = warp::path!("api" / "recipes")
        .and(warp::get())
        .and(warp::query::<Vec<(String, String)>>())
        .and(possible_session(state))
        .and(with_state(state.clone()))
        .and_then(handlers::list_recipes);

    let create = warp::path!("api" / "recipes")
        .and(warp::post())
        .and(session(state))
        .and(json_body(state.body_limit))
        .and(with_state(state.clone()))
        .and_then(handlers::create_recipe);

    let download = warp::path!("api" / "recipes" / "download_shopping_cart")
        .and(warp::get())
        .and(session(state))
        .and(with_state(state.clone()))
        .and_then(handlers::download_shopping_cart);

    let detail = warp::path!("api" / "recipes" / Id)
        .and(warp::get())
        .and(possible_session(state))
        .and(with_state(state.clone()))
        .and_then(handlers::get_recipe);

    let update = warp::path!("api" / "recipes" / Id)
        .and(warp::patch())
        .and(session(state))
        .and(json_body(state.body_limit))
        .and(with_state(state.clone()))
        .and_then(handlers::update_recipe);

    let delete = warp::path!("api" / "recipes" / Id)
        .and(warp::delete())
        .and(session(state))
        .and(with_state(state.clone()))
        .and_then(handlers::delete_recipe);

    list.or(create)
        .or(download)
        .or(detail)
        .or(update)
        .or(delete)
}

/// `POST` and `DELETE` on `/api/recipes/{id}/<segment>/`.
fn list_routes(
    segment: &'static str,
    list: RecipeList,
    state: &AppState,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let path = warp::path("api")
        .and(warp::path("recipes"))
        .and(warp::path::param::<Id>())
        .and(warp::path(segment))
        .and(warp::path::end())
        .and(warp::any().map(move || list));

    let add = path
        .clone()
        .and(warp::post())
        .and(session(state))
        .and(with_state(state.clone()))
        .and_then(handlers::add_to_list);

    let remove = path
        .and(warp::delete())
        .and(session(state))
        .and(with_state(state.clone()))
        .and_then(handlers::remove_from_list);

    add.or(remove)
}

fn user_routes(state: &AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let register = warp::path!("api" / "users")
        .and(warp::post())
        .and(json_body(state.body_limit))
        .and(with_state(state.clone()))
        .and_then(handlers::register);

    let list = warp::path!("api" / "users")
        .and(warp::get())
        .and(warp::query::<PageQuery>())
        .and(possible_session(state))
        .and(with_state(state.clone()))
        .and_then(handlers::list_users);

    let me = warp::path!("api" / "users" / "me")
        .and(warp::get())
        .and(session(state))
        .and(with_state(state.clone()))
        .and_then(handlers::me);

    let delete_me = warp::path!("api" / "users" / "me")
        .and(warp::delete())
        .and(session(state))
        .and(json_body(state.body_limit))
        .and(with_state(state.clone()))
        .and_then(handlers::delete_me);

    let set_password = warp::path!("api" / "users" / "set_password")
        .and(warp::post())
        .and(session(state))
        .and(json_body(state.body_limit))
        .and(with_state(state.clone()))
        .and_then(handlers::set_password);

    let subscriptions = warp::path!("api" / "users" / "subscriptions")
        .and(warp::get())
        .and(warp::query::<handlers::SubscriptionQuery>())
        .and(session(state))
        .and(with_state(state.clone()))
        .and_then(handlers::subscriptions);

    let detail = warp::path!("api" / "users" / Id)
        .and(warp::get())
        .and(possible_session(state))
        .and(with_state(state.clone()))
        .and_then(handlers::get_user);

    let subscribe = warp::path!("api" / "users" / Id / "subscribe")
        .and(warp::post())
        .and(warp::query::<handlers::SubscriptionQuery>())
        .and(session(state))
        .and(with_state(state.clone()))
        .and_then(handlers::subscribe);

    let unsubscribe = warp::path!("api" / "users" / Id / "subscribe")
        .and(warp::delete())
        .and(session(state))
        .and(with_state(state.clone()))
        .and_then(handlers::unsubscribe);

    register
        .or(list)
        .or(me)
        .or(delete_me)
        .or(set_password)
        .or(subscriptions)
        .or(detail)
        .or(subscribe)
        .or(unsubscribe)
}

fn auth_routes(state: &AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let login = warp::path!("api" / "auth" / "token" / "login")
        .and(warp::post())
        .and(json_body(state.body_limit))
        .and(with_state(state.clone()))
        .and_then(handlers::login);

    let logout = warp::path!("api" / "auth" / "token" / "logout")
        .and(warp::post())
        .and(session(state))
        .and(with_state(state.clone()))
        .and_then(handlers::logout);

    login.or(logout)
}

fn reference_routes(state: &AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let tags = warp::path!("api" / "tags")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::list_tags);

    let tag = warp::path!("api" / "tags" / Id)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::get_tag);

    let ingredients = warp::path!("api" / "ingredients")
        .and(warp::get())
        .and(warp::query::<handlers::IngredientQuery>())
        .and(with_state(state.clone()))
        .and_then(handlers::list_ingredients);

    let ingredient = warp::path!("api" / "ingredients" / Id)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::get_ingredient);

    tags.or(tag).or(ingredients).or(ingredient)
}
