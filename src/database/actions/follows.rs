use std::collections::{HashMap, HashSet};

use sqlx::{Pool, Postgres};

use crate::{
    authentication::permissions::ActionType,
    error::{ApiError, QueryError},
    jwt::SessionData,
    pagination::{PageContext, PageQuery},
    schema::{AuthorRow, Id, RecipeShort, SubscriptionView, UserView},
    USER_COUNT_PER_PAGE,
};

use super::get_user_by_id;

/// The subset of `author_ids` that `user_id` follows.
pub async fn subscribed_authors(
    user_id: Id,
    author_ids: &[Id],
    pool: &Pool<Postgres>,
) -> Result<HashSet<Id>, ApiError> {
    if author_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let rows: Vec<(Id,)> =
        sqlx::query_as("SELECT author_id FROM follows WHERE user_id = $1 AND author_id = ANY($2)")
            .bind(user_id)
            .bind(author_ids)
            .fetch_all(pool)
            .await
            .map_err(QueryError::from)?;

    Ok(rows.into_iter().map(|row| row.0).collect())
}

/// Newest recipes of each author, at most `limit` per author when given.
pub async fn list_author_recipes(
    author_ids: &[Id],
    limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<HashMap<Id, Vec<RecipeShort>>, ApiError> {
    if author_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<RecipeShort> = sqlx::query_as(
        "
        SELECT author_id, id, name, image, cooking_time
        FROM (
            SELECT r.author_id, r.id, r.name, r.image, r.cooking_time,
                ROW_NUMBER() OVER (PARTITION BY r.author_id ORDER BY r.id DESC) AS position
            FROM recipes r
            WHERE r.author_id = ANY($1)
        ) ranked
        WHERE $2::BIGINT IS NULL OR position <= $2
        ORDER BY author_id, position
    ",
    )
    .bind(author_ids)
    .bind(limit.map(|limit| limit.max(0)))
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let mut recipes: HashMap<Id, Vec<RecipeShort>> = HashMap::new();
    rows.into_iter()
        .for_each(|recipe| recipes.entry(recipe.author_id).or_default().push(recipe));

    Ok(recipes)
}

async fn subscription_views(
    authors: Vec<AuthorRow>,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<Vec<SubscriptionView>, ApiError> {
    let ids = authors.iter().map(|author| author.id).collect::<Vec<Id>>();
    let mut recipes = list_author_recipes(&ids, recipes_limit, pool).await?;

    Ok(authors
        .into_iter()
        .map(|author| SubscriptionView {
            recipes: recipes.remove(&author.id).unwrap_or_default(),
            recipes_count: author.recipes_count,
            author: UserView {
                email: author.email,
                id: author.id,
                username: author.username,
                first_name: author.first_name,
                last_name: author.last_name,
                is_subscribed: true,
            },
        })
        .collect())
}

pub async fn fetch_subscriptions(
    session: &SessionData,
    page: PageQuery,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<PageContext<SubscriptionView>, ApiError> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;

    let limit = page.limit(USER_COUNT_PER_PAGE);
    let rows: Vec<AuthorRow> = sqlx::query_as(
        "
        SELECT u.id, u.email, u.username, u.first_name, u.last_name,
            (SELECT COUNT(*) FROM recipes r WHERE r.author_id = u.id) AS recipes_count,
            COUNT(*) OVER() AS count
        FROM follows f
        INNER JOIN users u ON u.id = f.author_id
        WHERE f.user_id = $1
        ORDER BY f.id
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(session.user_id)
    .bind(limit)
    .bind(page.offset(USER_COUNT_PER_PAGE))
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    let views = subscription_views(rows, recipes_limit, pool).await?;

    PageContext::from_rows(views, total_count, limit, page.page())
}

async fn get_author(author_id: Id, pool: &Pool<Postgres>) -> Result<AuthorRow, ApiError> {
    let row: Option<AuthorRow> = sqlx::query_as(
        "
        SELECT u.id, u.email, u.username, u.first_name, u.last_name,
            (SELECT COUNT(*) FROM recipes r WHERE r.author_id = u.id) AS recipes_count,
            1::BIGINT AS count
        FROM users u
        WHERE u.id = $1
    ",
    )
    .bind(author_id)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    row.ok_or(ApiError::NotFound)
}

/// Follows `author_id`. Self follows and repeated follows are rejected.
pub async fn subscribe(
    session: &SessionData,
    author_id: Id,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<SubscriptionView, ApiError> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;

    let author = get_author(author_id, pool).await?;
    if author.id == session.user_id {
        return Err(ApiError::InvalidRequest(String::from(
            "You cannot subscribe to yourself.",
        )));
    }

    let result = sqlx::query(
        "INSERT INTO follows (user_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(session.user_id)
    .bind(author.id)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::InvalidRequest(String::from(
            "You are already subscribed to this author.",
        )));
    }

    let mut views = subscription_views(vec![author], recipes_limit, pool).await?;
    views
        .pop()
        .ok_or_else(|| ApiError::Internal(String::from("Subscription vanished")))
}

/// Removes the follow edge if it exists; unknown authors are 404.
pub async fn unsubscribe(
    session: &SessionData,
    author_id: Id,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;

    if get_user_by_id(author_id, pool).await?.is_none() {
        return Err(ApiError::NotFound);
    }

    sqlx::query("DELETE FROM follows WHERE user_id = $1 AND author_id = $2")
        .bind(session.user_id)
        .bind(author_id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(())
}
