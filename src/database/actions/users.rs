use crate::{
    authentication::{
        cryptography::{hash_password, verify_password},
        jwt::{generate_jwt_session, SessionKey},
    },
    error::{ApiError, QueryError},
    form::NewUser,
    pagination::{PageContext, PageQuery},
    schema::{Id, User, UserRow, UserView},
    USER_COUNT_PER_PAGE,
};

use sqlx::{Pool, Postgres};

use super::subscribed_authors;

fn password_error(e: argon2::password_hash::Error) -> ApiError {
    ApiError::Internal(format!("Password hashing failed: {e}"))
}

pub async fn get_user_by_email(
    email: &str,
    pool: &Pool<Postgres>,
) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn get_user_by_id(user_id: Id, pool: &Pool<Postgres>) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn list_users(user_ids: &[Id], pool: &Pool<Postgres>) -> Result<Vec<User>, ApiError> {
    let rows: Vec<User> = sqlx::query_as("SELECT * FROM users WHERE id = ANY($1)")
        .bind(user_ids)
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(rows)
}

/// Loads a user as seen by `viewer`.
pub async fn get_user_view(
    user_id: Id,
    viewer: Option<Id>,
    pool: &Pool<Postgres>,
) -> Result<Option<UserView>, ApiError> {
    let Some(user) = get_user_by_id(user_id, pool).await? else {
        return Ok(None);
    };
    let is_subscribed = match viewer {
        Some(viewer) => subscribed_authors(viewer, &[user.id], pool)
            .await?
            .contains(&user.id),
        None => false,
    };

    Ok(Some(UserView::from_user(user, is_subscribed)))
}

pub async fn fetch_users(
    viewer: Option<Id>,
    page: PageQuery,
    pool: &Pool<Postgres>,
) -> Result<PageContext<UserView>, ApiError> {
    let limit = page.limit(USER_COUNT_PER_PAGE);
    let rows: Vec<UserRow> = sqlx::query_as(
        "
        SELECT id, email, username, first_name, last_name, COUNT(*) OVER() AS count
        FROM users
        ORDER BY id
        LIMIT $1 OFFSET $2
    ",
    )
    .bind(limit)
    .bind(page.offset(USER_COUNT_PER_PAGE))
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let subscribed = match viewer {
        Some(viewer) => {
            let ids = rows.iter().map(|row| row.id).collect::<Vec<Id>>();
            subscribed_authors(viewer, &ids, pool).await?
        }
        None => Default::default(),
    };

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, limit, page.page())?.map(|row| {
        let is_subscribed = subscribed.contains(&row.id);
        UserView::from_row(row, is_subscribed)
    });

    Ok(page)
}

/// Creates a user; the password is stored as an argon2 hash.
pub async fn register_user(new_user: NewUser, pool: &Pool<Postgres>) -> Result<User, ApiError> {
    let password = hash_password(&new_user.password).map_err(password_error)?;

    let user: User = sqlx::query_as(
        "
        INSERT INTO users (email, username, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *;
    ",
    )
    .bind(&new_user.email)
    .bind(&new_user.username)
    .bind(&new_user.first_name)
    .bind(&new_user.last_name)
    .bind(password)
    .fetch_one(pool)
    .await
    .map_err(QueryError::from)?;

    log::info!("Registered user {} ({})", user.id, user.username);

    Ok(user)
}

pub async fn login_user(
    email: &str,
    password: &str,
    key: &SessionKey,
    pool: &Pool<Postgres>,
) -> Result<String, ApiError> {
    let invalid = || ApiError::invalid("non_field_errors", "Unable to log in with provided credentials.");

    let user = get_user_by_email(email, pool).await?.ok_or_else(invalid)?;
    let authenticated = verify_password(password, &user.password).map_err(password_error)?;
    if !authenticated {
        return Err(invalid());
    }

    generate_jwt_session(key, &user)
}

async fn check_current_password(
    user_id: Id,
    current_password: &str,
    pool: &Pool<Postgres>,
) -> Result<User, ApiError> {
    let user = get_user_by_id(user_id, pool)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    if !verify_password(current_password, &user.password).map_err(password_error)? {
        return Err(ApiError::invalid("current_password", "Invalid password."));
    }

    Ok(user)
}

pub async fn set_password(
    user_id: Id,
    current_password: &str,
    new_password: &str,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let user = check_current_password(user_id, current_password, pool).await?;
    let password = hash_password(new_password).map_err(password_error)?;

    sqlx::query("UPDATE users SET password = $1, token_version = token_version + 1 WHERE id = $2")
        .bind(password)
        .bind(user.id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    log::info!("User {} changed their password", user.id);

    Ok(())
}

/// The version a token must carry to be accepted; `None` once the user is gone.
pub async fn session_version(user_id: Id, pool: &Pool<Postgres>) -> Result<Option<i32>, ApiError> {
    let version: Option<i32> = sqlx::query_scalar("SELECT token_version FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(version)
}

/// Invalidates every token issued to the user so far.
pub async fn revoke_sessions(user_id: Id, pool: &Pool<Postgres>) -> Result<(), ApiError> {
    sqlx::query("UPDATE users SET token_version = token_version + 1 WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(())
}

/// Deletes the account; recipes, follows, favorites and the cart cascade.
pub async fn delete_user(
    user_id: Id,
    current_password: &str,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let user = check_current_password(user_id, current_password, pool).await?;

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user.id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    log::info!("Deleted user {} ({})", user.id, user.username);

    Ok(())
}
