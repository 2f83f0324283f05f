use crate::{
    error::ActionError,
    schema::{Id, Tag},
};

use sqlx::{Pool, Postgres};

/// `#RRGGBB`, the only color format tags are stored in.
pub fn is_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

pub async fn create_tag(
    name: &str,
    color: &str,
    slug: &str,
    pool: &Pool<Postgres>,
) -> Result<Tag, ActionError> {
    if !is_hex_color(color) {
        return Err(ActionError::Validation(format!("Invalid tag color {color}")));
    }

    let tag: Option<Tag> = sqlx::query_as(
        "INSERT INTO tags (name, color, slug) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING RETURNING *",
    )
    .bind(name)
    .bind(color.to_uppercase())
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    tag.ok_or_else(|| ActionError::Conflict(format!("Tag with slug {slug} already exists")))
}

pub async fn get_tag(id: Id, pool: &Pool<Postgres>) -> Result<Option<Tag>, ActionError> {
    let tag: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(tag)
}

pub async fn list_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>, ActionError> {
    let list: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(list)
}

pub async fn list_recipe_tags(
    recipe_id: Id,
    pool: &Pool<Postgres>,
) -> Result<Vec<Tag>, ActionError> {
    let list: Vec<Tag> = sqlx::query_as(
        "
        SELECT t.*
        FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = $1
        ORDER BY t.id
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;

    Ok(list)
}
