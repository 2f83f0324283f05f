use crate::{
    error::ActionError,
    schema::{CartIngredient, Id},
    shopping_list::ShoppingList,
};

use sqlx::{Pool, Postgres};

/// Every ingredient row reachable from the user's cart, in cart order and then
/// recipe order.
pub async fn list_cart_ingredients(
    user_id: Id,
    pool: &Pool<Postgres>,
) -> Result<Vec<CartIngredient>, ActionError> {
    let rows: Vec<CartIngredient> = sqlx::query_as(
        "
        SELECT i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM shopping_cart c
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = c.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE c.user_id = $1
        ORDER BY c.id, ri.id
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Builds the user's shopping list from the current cart. Never cached.
pub async fn aggregate_cart(user_id: Id, pool: &Pool<Postgres>) -> Result<ShoppingList, ActionError> {
    let rows = list_cart_ingredients(user_id, pool).await?;
    let list = ShoppingList::aggregate(rows);

    log::debug!(
        "Shopping list for user {user_id}: {} lines",
        list.lines.len()
    );

    Ok(list)
}
