use serde::Deserialize;
use serde_json::json;
use warp::{
    reject::Rejection,
    reply::{self, Reply},
};

use crate::{
    actions,
    api::state::AppState,
    error::ApiError,
    form::{DeleteAccountForm, LoginForm, RegisterForm, SetPasswordForm},
    jwt::SessionData,
    pagination::PageQuery,
    schema::{Id, RegisteredUser},
};

use super::{created, no_content};

/// Pagination plus the per-author cap on embedded recipes.
#[derive(Deserialize, Debug, Default, Clone, Copy)]
pub struct SubscriptionQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub recipes_limit: Option<i64>,
}

impl SubscriptionQuery {
    pub fn page(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}

pub async fn register(form: RegisterForm, state: AppState) -> Result<reply::Response, Rejection> {
    let new_user = form.validate()?;
    let user = actions::register_user(new_user, &state.pool).await?;

    Ok(created(&RegisteredUser::from(user)))
}

pub async fn list_users(
    page: PageQuery,
    session: Option<SessionData>,
    state: AppState,
) -> Result<reply::Response, Rejection> {
    let viewer = session.map(|session| session.user_id);
    let users = actions::fetch_users(viewer, page, &state.pool).await?;

    Ok(reply::json(&users).into_response())
}

pub async fn get_user(
    id: Id,
    session: Option<SessionData>,
    state: AppState,
) -> Result<reply::Response, Rejection> {
    let viewer = session.map(|session| session.user_id);
    let user = actions::get_user_view(id, viewer, &state.pool)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(reply::json(&user).into_response())
}

pub async fn me(session: SessionData, state: AppState) -> Result<reply::Response, Rejection> {
    let user = actions::get_user_view(session.user_id, Some(session.user_id), &state.pool)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    Ok(reply::json(&user).into_response())
}

pub async fn delete_me(
    session: SessionData,
    form: DeleteAccountForm,
    state: AppState,
) -> Result<reply::Response, Rejection> {
    let current_password = form
        .current_password
        .filter(|password| !password.is_empty())
        .ok_or_else(|| ApiError::invalid("current_password", "This field is required."))?;

    actions::delete_user(session.user_id, &current_password, &state.pool).await?;
    Ok(no_content())
}

pub async fn set_password(
    session: SessionData,
    form: SetPasswordForm,
    state: AppState,
) -> Result<reply::Response, Rejection> {
    let (current, new) = form.validate()?;
    actions::set_password(session.user_id, &current, &new, &state.pool).await?;

    Ok(no_content())
}

pub async fn subscriptions(
    query: SubscriptionQuery,
    session: SessionData,
    state: AppState,
) -> Result<reply::Response, Rejection> {
    let page =
        actions::fetch_subscriptions(&session, query.page(), query.recipes_limit, &state.pool)
            .await?;

    Ok(reply::json(&page).into_response())
}

pub async fn subscribe(
    id: Id,
    query: SubscriptionQuery,
    session: SessionData,
    state: AppState,
) -> Result<reply::Response, Rejection> {
    let subscription = actions::subscribe(&session, id, query.recipes_limit, &state.pool).await?;
    Ok(created(&subscription))
}

pub async fn unsubscribe(
    id: Id,
    session: SessionData,
    state: AppState,
) -> Result<reply::Response, Rejection> {
    actions::unsubscribe(&session, id, &state.pool).await?;
    Ok(no_content())
}

pub async fn login(form: LoginForm, state: AppState) -> Result<reply::Response, Rejection> {
    let token = actions::login_user(form.email.trim(), &form.password, &state.key, &state.pool).await?;
    Ok(reply::json(&json!({ "auth_token": token })).into_response())
}

/// Revokes every token the user holds, including the one presented.
pub async fn logout(session: SessionData, state: AppState) -> Result<reply::Response, Rejection> {
    actions::revoke_sessions(session.user_id, &state.pool).await?;
    log::debug!("User {} logged out", session.user_id);

    Ok(no_content())
}
