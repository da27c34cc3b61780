use std::collections::HashMap;

use crate::{
    authentication::permissions::{can_manage_recipe, ActionType},
    error::{ApiError, FieldErrors, QueryError},
    form::{IngredientAmount, NewRecipe, RecipeChanges},
    jwt::SessionData,
    pagination::{PageContext, PageQuery},
    schema::{Id, Recipe, RecipePartView, RecipeRow, RecipeView, User, UserView},
    RECIPE_COUNT_PER_PAGE,
};

use sqlx::{Pool, Postgres, QueryBuilder};

use super::{
    list_recipe_parts, list_recipe_tags, list_users, listed_recipes, missing_ingredients,
    missing_tags, replace_recipe_ingredients, replace_recipe_tags, subscribed_authors, RecipeList,
};

/// Query parameters of the recipe listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeFilter {
    pub tags: Vec<String>,
    pub author: Option<Id>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub page: PageQuery,
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl RecipeFilter {
    /// Builds the filter from raw query pairs; `tags` may repeat.
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, ApiError> {
        let mut filter = Self::default();
        let mut errors = FieldErrors::new();

        for (key, value) in pairs {
            match key.as_str() {
                "tags" if !value.is_empty() => filter.tags.push(value.to_owned()),
                "author" if !value.is_empty() => match value.parse() {
                    Ok(author) => filter.author = Some(author),
                    Err(_) => errors.add("author", "Enter a number."),
                },
                "is_favorited" => filter.is_favorited = is_truthy(value),
                "is_in_shopping_cart" => filter.is_in_shopping_cart = is_truthy(value),
                "page" => match value.parse() {
                    Ok(page) => filter.page.page = Some(page),
                    Err(_) => errors.add("page", "Invalid page."),
                },
                "limit" => match value.parse() {
                    Ok(limit) => filter.page.limit = Some(limit),
                    Err(_) => errors.add("limit", "Enter a number."),
                },
                _ => {}
            }
        }

        errors.into_result(filter)
    }
}

pub async fn fetch_recipes(
    filter: &RecipeFilter,
    viewer: Option<Id>,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeView>, ApiError> {
    let limit = filter.page.limit(RECIPE_COUNT_PER_PAGE);
    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT r.*, COUNT(*) OVER() AS count FROM recipes r WHERE TRUE");

    if let Some(author) = filter.author {
        query_builder.push(" AND r.author_id = ").push_bind(author);
    }
    if !filter.tags.is_empty() {
        query_builder
            .push(
                " AND EXISTS (SELECT 1 FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id \
                 WHERE rt.recipe_id = r.id AND t.slug = ANY(",
            )
            .push_bind(filter.tags.clone())
            .push("))");
    }
    // Both toggles are no-ops for anonymous requests.
    if let Some(user_id) = viewer {
        if filter.is_favorited {
            query_builder
                .push(" AND EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ")
                .push_bind(user_id)
                .push(")");
        }
        if filter.is_in_shopping_cart {
            query_builder
                .push(" AND EXISTS (SELECT 1 FROM shopping_carts sc WHERE sc.recipe_id = r.id AND sc.user_id = ")
                .push_bind(user_id)
                .push(")");
        }
    }
    query_builder
        .push(" ORDER BY r.id DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(filter.page.offset(RECIPE_COUNT_PER_PAGE));

    let rows: Vec<RecipeRow> = query_builder
        .build_query_as()
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    let recipes = rows.into_iter().map(Recipe::from).collect();
    let views = recipe_views(recipes, viewer, pool).await?;

    PageContext::from_rows(views, total_count, limit, filter.page.page())
}

/// Expands recipes with their tags, ingredients, author and the viewer's
/// list memberships.
pub async fn recipe_views(
    recipes: Vec<Recipe>,
    viewer: Option<Id>,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeView>, ApiError> {
    if recipes.is_empty() {
        return Ok(vec![]);
    }

    let ids = recipes.iter().map(|recipe| recipe.id).collect::<Vec<Id>>();
    let mut author_ids = recipes.iter().map(|recipe| recipe.author_id).collect::<Vec<Id>>();
    author_ids.sort_unstable();
    author_ids.dedup();

    let mut tags = list_recipe_tags(&ids, pool).await?;
    let mut parts = list_recipe_parts(&ids, pool).await?;
    let authors: HashMap<Id, User> = list_users(&author_ids, pool)
        .await?
        .into_iter()
        .map(|user| (user.id, user))
        .collect();

    let (subscribed, favorited, in_cart) = match viewer {
        Some(user_id) => (
            subscribed_authors(user_id, &author_ids, pool).await?,
            listed_recipes(RecipeList::Favorites, user_id, &ids, pool).await?,
            listed_recipes(RecipeList::ShoppingCart, user_id, &ids, pool).await?,
        ),
        None => Default::default(),
    };

    recipes
        .into_iter()
        .map(|recipe| -> Result<RecipeView, ApiError> {
            let author = authors.get(&recipe.author_id).cloned().ok_or_else(|| {
                ApiError::Internal(format!("Author of recipe {} is missing", recipe.id))
            })?;

            Ok(RecipeView {
                id: recipe.id,
                tags: tags.remove(&recipe.id).unwrap_or_default(),
                author: UserView::from_user(author, subscribed.contains(&recipe.author_id)),
                ingredients: parts
                    .remove(&recipe.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(RecipePartView::from)
                    .collect(),
                is_favorited: favorited.contains(&recipe.id),
                is_in_shopping_cart: in_cart.contains(&recipe.id),
                name: recipe.name,
                image: recipe.image,
                text: recipe.text,
                cooking_time: recipe.cooking_time,
            })
        })
        .collect()
}

pub async fn get_recipe(id: Id, pool: &Pool<Postgres>) -> Result<Option<Recipe>, ApiError> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn get_recipe_view(
    id: Id,
    viewer: Option<Id>,
    pool: &Pool<Postgres>,
) -> Result<RecipeView, ApiError> {
    let recipe = get_recipe(id, pool).await?.ok_or(ApiError::NotFound)?;

    recipe_views(vec![recipe], viewer, pool)
        .await?
        .pop()
        .ok_or(ApiError::NotFound)
}

/// Loads a recipe the session is allowed to modify.
pub async fn get_recipe_mut(
    id: Id,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, ApiError> {
    session.authenticate(ActionType::ManageOwnRecipes)?;
    let recipe = get_recipe(id, pool).await?.ok_or(ApiError::NotFound)?;

    if !can_manage_recipe(session, recipe.author_id) {
        return Err(ApiError::Forbidden);
    }

    Ok(recipe)
}

async fn check_relations(
    tags: &[Id],
    ingredients: &[IngredientAmount],
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let mut errors = FieldErrors::new();

    for id in missing_tags(tags, pool).await? {
        errors.add("tags", format!("Invalid pk \"{id}\" - object does not exist."));
    }

    let ingredient_ids = ingredients.iter().map(|part| part.id).collect::<Vec<Id>>();
    for id in missing_ingredients(&ingredient_ids, pool).await? {
        errors.add(
            "ingredients",
            format!("Invalid pk \"{id}\" - object does not exist."),
        );
    }

    errors.into_result(())
}

/// Inserts the recipe, its tags and its ingredient lines atomically.
pub async fn create_recipe(
    session: &SessionData,
    recipe: NewRecipe,
    pool: &Pool<Postgres>,
) -> Result<RecipeView, ApiError> {
    session.authenticate(ActionType::CreateRecipes)?;
    check_relations(&recipe.tags, &recipe.ingredients, pool).await?;

    let mut tr = pool.begin().await.map_err(QueryError::from)?;

    let id: (Id,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, image, text, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(session.user_id)
    .bind(&recipe.name)
    .bind(&recipe.image)
    .bind(&recipe.text)
    .bind(recipe.cooking_time)
    .fetch_one(&mut *tr)
    .await
    .map_err(QueryError::from)?;

    replace_recipe_tags(id.0, &recipe.tags, &mut tr).await?;
    replace_recipe_ingredients(id.0, &recipe.ingredients, &mut tr).await?;

    tr.commit().await.map_err(QueryError::from)?;
    log::info!("User {} created recipe {}", session.user_id, id.0);

    get_recipe_view(id.0, Some(session.user_id), pool).await
}

/// Writes the present scalar fields and replaces tags and ingredient lines
/// in one transaction.
pub async fn update_recipe(
    id: Id,
    session: &SessionData,
    changes: RecipeChanges,
    pool: &Pool<Postgres>,
) -> Result<RecipeView, ApiError> {
    let recipe = get_recipe_mut(id, session, pool).await?;
    check_relations(&changes.tags, &changes.ingredients, pool).await?;

    let mut tr = pool.begin().await.map_err(QueryError::from)?;

    sqlx::query(
        "
        UPDATE recipes SET
        name = COALESCE($1, name),
        text = COALESCE($2, text),
        image = COALESCE($3, image),
        cooking_time = COALESCE($4, cooking_time)
        WHERE id = $5
    ",
    )
    .bind(&changes.name)
    .bind(&changes.text)
    .bind(&changes.image)
    .bind(changes.cooking_time)
    .bind(recipe.id)
    .execute(&mut *tr)
    .await
    .map_err(QueryError::from)?;

    replace_recipe_tags(recipe.id, &changes.tags, &mut tr).await?;
    replace_recipe_ingredients(recipe.id, &changes.ingredients, &mut tr).await?;

    tr.commit().await.map_err(QueryError::from)?;

    get_recipe_view(recipe.id, Some(session.user_id), pool).await
}

pub async fn delete_recipe(
    id: Id,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let recipe = get_recipe_mut(id, session, pool).await?;

    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(recipe.id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    log::info!("User {} deleted recipe {}", session.user_id, recipe.id);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn filter_collects_repeated_tags() {
        let filter = RecipeFilter::from_pairs(&pairs(&[
            ("tags", "breakfast"),
            ("tags", "dinner"),
            ("author", "3"),
            ("is_favorited", "1"),
            ("is_in_shopping_cart", "0"),
            ("page", "2"),
            ("limit", "10"),
        ]))
        .unwrap();

        assert_eq!(filter.tags, vec!["breakfast", "dinner"]);
        assert_eq!(filter.author, Some(3));
        assert!(filter.is_favorited);
        assert!(!filter.is_in_shopping_cart);
        assert_eq!(filter.page.offset(RECIPE_COUNT_PER_PAGE), 10);
    }

    #[test]
    fn empty_filter() {
        let filter = RecipeFilter::from_pairs(&[]).unwrap();
        assert_eq!(filter, RecipeFilter::default());

        let filter = RecipeFilter::from_pairs(&pairs(&[("tags", ""), ("unknown", "x")])).unwrap();
        assert!(filter.tags.is_empty());
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = RecipeFilter::from_pairs(&pairs(&[("author", "me"), ("page", "last")]))
            .unwrap_err();

        match err {
            ApiError::Validation(errors) => {
                assert!(errors.get("author").is_some());
                assert!(errors.get("page").is_some());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn truthy_values() {
        assert!(is_truthy("true"));
        assert!(is_truthy("True"));
        assert!(is_truthy("1"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("false"));
        assert!(!is_truthy(""));
    }
}
