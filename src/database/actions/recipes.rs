use std::collections::HashSet;

use crate::{
    authentication::permissions::ActionType,
    error::ActionError,
    form::{RecipeForm, ValidatedRecipe},
    jwt::SessionData,
    schema::{Id, Recipe, RecipeDetail, RecipeIngredient, RecipePreview, UserProfile},
};

use super::{get_user_by_id, has_relation, list_recipe_tags, RelationKind};
use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

/// First id of `requested` that is absent from `found`.
pub fn first_missing(requested: &[Id], found: &[Id]) -> Option<Id> {
    let found: HashSet<&Id> = found.iter().collect();
    requested.iter().find(|id| !found.contains(id)).copied()
}

async fn ensure_all_exist(
    table: &str,
    label: &str,
    ids: &[Id],
    conn: &mut PgConnection,
) -> Result<(), ActionError> {
    if ids.is_empty() {
        return Ok(());
    }

    let found: Vec<(Id,)> = sqlx::query_as(&format!("SELECT id FROM {table} WHERE id = ANY($1)"))
        .bind(ids)
        .fetch_all(&mut *conn)
        .await?;
    let found: Vec<Id> = found.into_iter().map(|row| row.0).collect();

    match first_missing(ids, &found) {
        Some(id) => Err(ActionError::NotFound(format!("{label} {id} doesn't exist"))),
        None => Ok(()),
    }
}

async fn insert_associations(
    recipe_id: Id,
    recipe: &ValidatedRecipe,
    conn: &mut PgConnection,
) -> Result<(), ActionError> {
    let mut query: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");
    query.push_values(recipe.ingredients.iter(), |mut row, part| {
        row.push_bind(recipe_id)
            .push_bind(part.id)
            .push_bind(part.amount);
    });
    query.build().execute(&mut *conn).await?;

    if !recipe.tags.is_empty() {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");
        query.push_values(recipe.tags.iter(), |mut row, tag_id| {
            row.push_bind(recipe_id).push_bind(*tag_id);
        });
        query.build().execute(&mut *conn).await?;
    }

    Ok(())
}

/// Creates a recipe (`existing == None`) or rewrites an existing one.
///
/// Scalar fields are written first, then every ingredient and tag association
/// is dropped and inserted again from `form`. Everything happens in one
/// transaction: on any error the recipe keeps its previous associations.
pub async fn save_recipe(
    form: RecipeForm,
    author_id: Id,
    existing: Option<Id>,
    pool: &Pool<Postgres>,
) -> Result<Recipe, ActionError> {
    let recipe = form.validate()?;

    let ingredient_ids: Vec<Id> = recipe.ingredients.iter().map(|part| part.id).collect();

    let mut tr = pool.begin().await?;

    ensure_all_exist("ingredients", "Ingredient", &ingredient_ids, &mut *tr).await?;
    ensure_all_exist("tags", "Tag", &recipe.tags, &mut *tr).await?;

    let saved: Recipe = match existing {
        Some(id) => {
            let saved: Option<Recipe> = sqlx::query_as(
                "
                UPDATE recipes SET name = $1, text = $2, cooking_time = $3, image = $4
                WHERE id = $5
                RETURNING *
            ",
            )
            .bind(&recipe.name)
            .bind(&recipe.text)
            .bind(recipe.cooking_time)
            .bind(&recipe.image)
            .bind(id)
            .fetch_optional(&mut *tr)
            .await?;
            let saved =
                saved.ok_or_else(|| ActionError::NotFound(format!("Recipe {id} doesn't exist")))?;

            sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
                .bind(id)
                .execute(&mut *tr)
                .await?;
            sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
                .bind(id)
                .execute(&mut *tr)
                .await?;

            saved
        }
        None => {
            sqlx::query_as(
                "
                INSERT INTO recipes (author_id, name, text, cooking_time, image)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            ",
            )
            .bind(author_id)
            .bind(&recipe.name)
            .bind(&recipe.text)
            .bind(recipe.cooking_time)
            .bind(&recipe.image)
            .fetch_one(&mut *tr)
            .await?
        }
    };

    insert_associations(saved.id, &recipe, &mut *tr).await?;

    tr.commit().await?;

    log::info!(
        "Saved recipe {} with {} ingredients and {} tags",
        saved.id,
        recipe.ingredients.len(),
        recipe.tags.len()
    );

    Ok(saved)
}

pub async fn get_recipe(id: Id, pool: &Pool<Postgres>) -> Result<Option<Recipe>, ActionError> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(&*pool)
        .await?;

    Ok(row)
}

/// Fetches a recipe the session is allowed to modify: its author, or staff.
pub async fn get_recipe_mut(
    id: Id,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, ActionError> {
    let recipe = get_recipe(id, pool)
        .await?
        .ok_or_else(|| ActionError::NotFound(format!("Recipe {id} doesn't exist")))?;

    session.authorize_owned(
        recipe.author_id,
        ActionType::ManageOwnRecipes,
        ActionType::ManageAllRecipes,
    )?;

    Ok(recipe)
}

/// Associations, favorites and cart entries go with the recipe (`ON DELETE CASCADE`).
pub async fn delete_recipe(id: Id, pool: &Pool<Postgres>) -> Result<(), ActionError> {
    let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ActionError::NotFound(format!("Recipe {id} doesn't exist")));
    }

    log::info!("Deleted recipe {id}");
    Ok(())
}

pub async fn list_recipe_ingredients(
    recipe_id: Id,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeIngredient>, ActionError> {
    let rows: Vec<RecipeIngredient> = sqlx::query_as(
        "
        SELECT i.id AS id, i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = $1
        ORDER BY ri.id
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn get_recipe_preview(
    id: Id,
    pool: &Pool<Postgres>,
) -> Result<Option<RecipePreview>, ActionError> {
    let row: Option<RecipePreview> =
        sqlx::query_as("SELECT id, name, image, cooking_time FROM recipes WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    Ok(row)
}

/// Full representation of a recipe. `viewer` drives the `is_*` flags and is
/// `None` for anonymous requests.
pub async fn get_recipe_detail(
    id: Id,
    viewer: Option<Id>,
    pool: &Pool<Postgres>,
) -> Result<RecipeDetail, ActionError> {
    let recipe = get_recipe(id, pool)
        .await?
        .ok_or_else(|| ActionError::NotFound(format!("Recipe {id} doesn't exist")))?;

    let author = get_user_by_id(pool, recipe.author_id)
        .await?
        .ok_or_else(|| ActionError::NotFound(format!("User {} doesn't exist", recipe.author_id)))?;

    let (is_subscribed, is_favorited, is_in_shopping_cart) = match viewer {
        Some(user_id) => (
            has_relation(RelationKind::Subscription, user_id, author.id, pool).await?,
            has_relation(RelationKind::Favorite, user_id, recipe.id, pool).await?,
            has_relation(RelationKind::Cart, user_id, recipe.id, pool).await?,
        ),
        None => (false, false, false),
    };

    Ok(RecipeDetail {
        id: recipe.id,
        author: UserProfile::from_user(author, is_subscribed),
        tags: list_recipe_tags(recipe.id, pool).await?,
        ingredients: list_recipe_ingredients(recipe.id, pool).await?,
        name: recipe.name,
        image: recipe.image,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
        created_at: recipe.created_at,
        is_favorited,
        is_in_shopping_cart,
    })
}

#[cfg(test)]
mod tests {
    use super::first_missing;

    #[test]
    fn nothing_missing() {
        assert_eq!(first_missing(&[1, 2, 3], &[3, 2, 1]), None);
        assert_eq!(first_missing(&[], &[]), None);
    }

    #[test]
    fn reports_first_missing_in_request_order() {
        assert_eq!(first_missing(&[4, 9, 2, 7], &[4, 2]), Some(9));
    }
}
