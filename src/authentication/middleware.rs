use std::convert::Infallible;

use sqlx::{Pool, Postgres};
use warp::{reject::Rejection, Filter};

use super::jwt::{verify_jwt_session, JwtSessionData, SessionData, SessionKey};
use crate::database::{actions::session_version, error::ApiError};

/// Extracts the token from `Authorization: Token <jwt>` or `Bearer <jwt>`.
pub fn parse_authorization(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();

    if token.is_empty() {
        return None;
    }
    match scheme {
        s if s.eq_ignore_ascii_case("token") || s.eq_ignore_ascii_case("bearer") => Some(token),
        _ => None,
    }
}

fn authorization() -> impl Filter<Extract = (Option<String>,), Error = Infallible> + Clone {
    warp::header::optional::<String>("authorization")
        .or(warp::any().map(|| None::<String>))
        .unify()
}

/// A token only stands while its version matches the user's current one.
pub fn check_version(claims: &JwtSessionData, current: Option<i32>) -> Result<(), ApiError> {
    match current {
        None => Err(ApiError::InvalidSession(String::from("User no longer exists"))),
        Some(version) if version != claims.version => {
            Err(ApiError::InvalidSession(String::from("Token revoked")))
        }
        Some(_) => Ok(()),
    }
}

async fn resolve_session(
    header: &str,
    key: &SessionKey,
    pool: &Pool<Postgres>,
) -> Result<SessionData, ApiError> {
    let token = parse_authorization(header)
        .ok_or_else(|| ApiError::InvalidSession(String::from("Malformed header")))?;
    let claims = verify_jwt_session(key, token)?;
    check_version(&claims, session_version(claims.user_id, pool).await?)?;

    Ok(SessionData::from(claims))
}

/// Requires a valid session; rejects with 401 otherwise.
pub fn with_session(
    key: SessionKey,
    pool: Pool<Postgres>,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    authorization().and_then(move |header: Option<String>| {
        let key = key.clone();
        let pool = pool.clone();
        async move {
            let header = header.ok_or(ApiError::Unauthorized)?;

            resolve_session(&header, &key, &pool)
                .await
                .map_err(Rejection::from)
        }
    })
}

/// Anonymous requests pass through as `None`, but a presented token must be
/// valid.
pub fn with_possible_session(
    key: SessionKey,
    pool: Pool<Postgres>,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
    authorization().and_then(move |header: Option<String>| {
        let key = key.clone();
        let pool = pool.clone();
        async move {
            let Some(header) = header else {
                return Ok::<Option<SessionData>, Rejection>(None);
            };

            Ok(Some(resolve_session(&header, &key, &pool).await?))
        }
    })
}
