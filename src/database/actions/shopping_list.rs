use std::collections::BTreeMap;

use sqlx::{Pool, Postgres};

use crate::{
    authentication::permissions::ActionType,
    constants::SHOPPING_LIST_HEADER,
    error::{ApiError, QueryError},
    jwt::SessionData,
    schema::ShoppingListRow,
};

/// Ingredient totals keyed by `(name, measurement_unit)`, ordered by name.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ShoppingList {
    items: BTreeMap<(String, String), i64>,
}

impl ShoppingList {
    /// Sums amounts of rows sharing a name and unit.
    pub fn from_rows(rows: Vec<ShoppingListRow>) -> Self {
        let mut items: BTreeMap<(String, String), i64> = BTreeMap::new();
        for row in rows {
            *items.entry((row.name, row.measurement_unit)).or_insert(0) += row.amount;
        }

        Self { items }
    }

    pub fn items(&self) -> impl Iterator<Item = (&str, &str, i64)> {
        self.items
            .iter()
            .map(|((name, unit), amount)| (name.as_str(), unit.as_str(), *amount))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Plain-text body: a header line, then `name (unit) - amount` per line.
    pub fn render(&self) -> String {
        let mut body = String::from(SHOPPING_LIST_HEADER);
        for (name, unit, amount) in self.items() {
            body.push('\n');
            body.push_str(&format!("{name} ({unit}) - {amount}"));
        }
        body.push('\n');
        body
    }
}

pub async fn fetch_shopping_list(
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<ShoppingList, ApiError> {
    session.authenticate(ActionType::ManageOwnLists)?;

    let rows: Vec<ShoppingListRow> = sqlx::query_as(
        "
        SELECT i.name AS name, i.measurement_unit AS measurement_unit, SUM(ri.amount) AS amount
        FROM shopping_carts sc
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE sc.user_id = $1
        GROUP BY i.name, i.measurement_unit
        ORDER BY i.name
    ",
    )
    .bind(session.user_id)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(ShoppingList::from_rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, unit: &str, amount: i64) -> ShoppingListRow {
        ShoppingListRow {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn amounts_are_summed_per_ingredient_and_unit() {
        let list = ShoppingList::from_rows(vec![
            row("sugar", "g", 50),
            row("flour", "g", 200),
            row("flour", "g", 300),
        ]);

        assert_eq!(
            list.items().collect::<Vec<_>>(),
            vec![("flour", "g", 500), ("sugar", "g", 50)]
        );
        assert_eq!(
            list.render(),
            "Shopping list:\nflour (g) - 500\nsugar (g) - 50\n"
        );
    }

    #[test]
    fn different_units_stay_apart() {
        let list = ShoppingList::from_rows(vec![row("milk", "ml", 200), row("milk", "cup", 1)]);

        assert_eq!(list.items().count(), 2);
    }

    #[test]
    fn empty_cart_renders_header_only() {
        let list = ShoppingList::from_rows(vec![]);

        assert!(list.is_empty());
        assert_eq!(list.render(), "Shopping list:\n");
    }
}
