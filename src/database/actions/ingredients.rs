use std::collections::HashMap;

use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

use crate::{
    error::{ApiError, QueryError},
    form::IngredientAmount,
    schema::{Id, Ingredient, RecipePart},
};

/// `ILIKE` pattern matching values that start with `value` literally.
pub fn like_prefix(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 1);
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Ingredients ordered by name, optionally narrowed to a case-insensitive
/// name prefix.
pub async fn search_ingredients(
    name: Option<&str>,
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, ApiError> {
    let rows: Vec<Ingredient> = match name.filter(|name| !name.is_empty()) {
        Some(name) => sqlx::query_as("SELECT * FROM ingredients WHERE name ILIKE $1 ORDER BY name")
            .bind(like_prefix(name))
            .fetch_all(pool)
            .await
            .map_err(QueryError::from)?,
        None => sqlx::query_as("SELECT * FROM ingredients ORDER BY name")
            .fetch_all(pool)
            .await
            .map_err(QueryError::from)?,
    };

    Ok(rows)
}

pub async fn get_ingredient(id: Id, pool: &Pool<Postgres>) -> Result<Option<Ingredient>, ApiError> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

/// Ids from `ingredient_ids` that have no ingredient row.
pub async fn missing_ingredients(
    ingredient_ids: &[Id],
    pool: &Pool<Postgres>,
) -> Result<Vec<Id>, ApiError> {
    let found: Vec<(Id,)> = sqlx::query_as("SELECT id FROM ingredients WHERE id = ANY($1)")
        .bind(ingredient_ids)
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(ingredient_ids
        .iter()
        .copied()
        .filter(|id| !found.iter().any(|row| row.0 == *id))
        .collect())
}

/// Ingredient lines of every recipe in `recipe_ids`, grouped by recipe.
pub async fn list_recipe_parts(
    recipe_ids: &[Id],
    pool: &Pool<Postgres>,
) -> Result<HashMap<Id, Vec<RecipePart>>, ApiError> {
    let rows: Vec<RecipePart> = sqlx::query_as(
        "
        SELECT ri.recipe_id, i.id, i.name, i.measurement_unit, ri.amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = ANY($1)
        ORDER BY ri.id
    ",
    )
    .bind(recipe_ids)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let mut parts: HashMap<Id, Vec<RecipePart>> = HashMap::new();
    rows.into_iter()
        .for_each(|row| parts.entry(row.recipe_id).or_default().push(row));

    Ok(parts)
}

/// Clear-then-reinsert of a recipe's ingredient lines inside the caller's
/// transaction.
pub async fn replace_recipe_ingredients(
    recipe_id: Id,
    ingredients: &[IngredientAmount],
    conn: &mut PgConnection,
) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await
        .map_err(QueryError::from)?;

    if ingredients.is_empty() {
        return Ok(());
    }

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");
    query_builder.push_values(ingredients, |mut b, part| {
        b.push_bind(recipe_id)
            .push_bind(part.id)
            .push_bind(part.amount);
    });

    query_builder
        .build()
        .execute(&mut *conn)
        .await
        .map_err(QueryError::from)?;

    Ok(())
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub inserted: u64,
    pub skipped: u64,
}

/// Get-or-create of reference ingredients in one transaction; names already
/// present are skipped.
pub async fn load_ingredients(
    rows: &[(String, String)],
    pool: &Pool<Postgres>,
) -> Result<LoadSummary, ApiError> {
    let mut tr = pool.begin().await.map_err(QueryError::from)?;
    let mut summary = LoadSummary::default();

    for (name, measurement_unit) in rows {
        let result = sqlx::query(
            "INSERT INTO ingredients (name, measurement_unit) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(name)
        .bind(measurement_unit)
        .execute(&mut *tr)
        .await
        .map_err(QueryError::from)?;

        if result.rows_affected() > 0 {
            summary.inserted += 1;
        } else {
            log::debug!("Ingredient {name} is already present");
            summary.skipped += 1;
        }
    }

    tr.commit().await.map_err(QueryError::from)?;
    Ok(summary)
}
