use crate::{
    error::ActionError,
    schema::{Id, Ingredient},
};

use sqlx::{Pool, Postgres};

/// Turns a user supplied prefix into an `ILIKE` pattern, escaping wildcards.
pub fn prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

pub async fn create_ingredient(
    name: &str,
    measurement_unit: &str,
    pool: &Pool<Postgres>,
) -> Result<Ingredient, ActionError> {
    let ingredient: Option<Ingredient> = sqlx::query_as(
        "
        INSERT INTO ingredients (name, measurement_unit)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING RETURNING *
    ",
    )
    .bind(name)
    .bind(measurement_unit)
    .fetch_optional(pool)
    .await?;

    ingredient.ok_or_else(|| {
        ActionError::Conflict(format!(
            "Ingredient {name} ({measurement_unit}) already exists"
        ))
    })
}

pub async fn get_ingredient(id: Id, pool: &Pool<Postgres>) -> Result<Option<Ingredient>, ActionError> {
    let ingredient: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(ingredient)
}

/// Case-insensitive prefix search on the ingredient name. An empty prefix lists everything.
pub async fn search_ingredients(
    prefix: &str,
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, ActionError> {
    let list: Vec<Ingredient> = sqlx::query_as(
        "SELECT * FROM ingredients WHERE name ILIKE $1 ORDER BY name, measurement_unit",
    )
    .bind(prefix_pattern(prefix))
    .fetch_all(pool)
    .await?;

    Ok(list)
}
