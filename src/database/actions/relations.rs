use crate::{
    authentication::permissions::ActionType,
    error::ActionError,
    schema::{Id, RelationRecord, SubscribedAuthor},
};

use sqlx::{Pool, Postgres};

/// The user-owned relations guarded by `add_relation` / `remove_relation`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelationKind {
    Favorite,
    Cart,
    Subscription,
}

impl RelationKind {
    pub fn table(self) -> &'static str {
        match self {
            RelationKind::Favorite => "favorites",
            RelationKind::Cart => "shopping_cart",
            RelationKind::Subscription => "subscriptions",
        }
    }

    pub fn owner_column(self) -> &'static str {
        match self {
            RelationKind::Favorite | RelationKind::Cart => "user_id",
            RelationKind::Subscription => "subscriber_id",
        }
    }

    pub fn target_column(self) -> &'static str {
        match self {
            RelationKind::Favorite | RelationKind::Cart => "recipe_id",
            RelationKind::Subscription => "author_id",
        }
    }

    pub fn target_table(self) -> &'static str {
        match self {
            RelationKind::Favorite | RelationKind::Cart => "recipes",
            RelationKind::Subscription => "users",
        }
    }

    pub fn action(self) -> ActionType {
        match self {
            RelationKind::Favorite => ActionType::ManageOwnFavorites,
            RelationKind::Cart => ActionType::ManageOwnCart,
            RelationKind::Subscription => ActionType::ManageOwnSubscriptions,
        }
    }

    fn missing_target(self, target_id: Id) -> ActionError {
        match self {
            RelationKind::Favorite | RelationKind::Cart => {
                ActionError::NotFound(format!("Recipe {target_id} doesn't exist"))
            }
            RelationKind::Subscription => {
                ActionError::NotFound(format!("User {target_id} doesn't exist"))
            }
        }
    }

    fn already_exists(self) -> ActionError {
        ActionError::conflict(match self {
            RelationKind::Favorite => "Recipe is already in favorites",
            RelationKind::Cart => "Recipe is already in the shopping cart",
            RelationKind::Subscription => "Already subscribed to this author",
        })
    }

    fn not_present(self) -> ActionError {
        ActionError::not_found(match self {
            RelationKind::Favorite => "Recipe is not in favorites",
            RelationKind::Cart => "Recipe is not in the shopping cart",
            RelationKind::Subscription => "Not subscribed to this author",
        })
    }

    /// Checks that need no store access. Runs before anything else so a
    /// self-subscription fails the same way whatever the current state is.
    pub fn check(self, user_id: Id, target_id: Id) -> Result<(), ActionError> {
        if self == RelationKind::Subscription && user_id == target_id {
            return Err(ActionError::validation("Can't subscribe to yourself"));
        }
        Ok(())
    }
}

async fn ensure_target_exists(
    kind: RelationKind,
    target_id: Id,
    pool: &Pool<Postgres>,
) -> Result<(), ActionError> {
    let row: Option<(Id,)> = sqlx::query_as(&format!(
        "SELECT id FROM {} WHERE id = $1",
        kind.target_table()
    ))
    .bind(target_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(_) => Ok(()),
        None => Err(kind.missing_target(target_id)),
    }
}

pub async fn has_relation(
    kind: RelationKind,
    user_id: Id,
    target_id: Id,
    pool: &Pool<Postgres>,
) -> Result<bool, ActionError> {
    let row: Option<(Id,)> = sqlx::query_as(&format!(
        "SELECT id FROM {} WHERE {} = $1 AND {} = $2",
        kind.table(),
        kind.owner_column(),
        kind.target_column()
    ))
    .bind(user_id)
    .bind(target_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

/// Inserts the (user, target) pair.
///
/// The existence check only short-circuits the common case; two concurrent
/// requests are settled by the unique constraint, and the loser gets the same
/// `Conflict` as a sequential duplicate.
pub async fn add_relation(
    kind: RelationKind,
    user_id: Id,
    target_id: Id,
    pool: &Pool<Postgres>,
) -> Result<RelationRecord, ActionError> {
    kind.check(user_id, target_id)?;
    ensure_target_exists(kind, target_id, pool).await?;

    if has_relation(kind, user_id, target_id, pool).await? {
        return Err(kind.already_exists());
    }

    let record: Option<RelationRecord> = sqlx::query_as(&format!(
        "
        INSERT INTO {table} ({owner}, {target}) VALUES ($1, $2)
        ON CONFLICT DO NOTHING
        RETURNING id, {owner} AS owner_id, {target} AS target_id
    ",
        table = kind.table(),
        owner = kind.owner_column(),
        target = kind.target_column()
    ))
    .bind(user_id)
    .bind(target_id)
    .fetch_optional(pool)
    .await?;

    let record = record.ok_or_else(|| kind.already_exists())?;
    log::debug!("{kind:?} added: {user_id} -> {target_id}");

    Ok(record)
}

pub async fn remove_relation(
    kind: RelationKind,
    user_id: Id,
    target_id: Id,
    pool: &Pool<Postgres>,
) -> Result<(), ActionError> {
    ensure_target_exists(kind, target_id, pool).await?;

    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE {} = $1 AND {} = $2",
        kind.table(),
        kind.owner_column(),
        kind.target_column()
    ))
    .bind(user_id)
    .bind(target_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(kind.not_present());
    }

    log::debug!("{kind:?} removed: {user_id} -> {target_id}");
    Ok(())
}

pub async fn list_subscriptions(
    user_id: Id,
    pool: &Pool<Postgres>,
) -> Result<Vec<SubscribedAuthor>, ActionError> {
    let rows: Vec<SubscribedAuthor> = sqlx::query_as(
        "
        SELECT u.id, u.email, u.username, u.first_name, u.last_name, COUNT(r.id) AS recipes_count
        FROM subscriptions s
        INNER JOIN users u ON u.id = s.author_id
        LEFT JOIN recipes r ON r.author_id = u.id
        WHERE s.subscriber_id = $1
        GROUP BY u.id, s.id
        ORDER BY s.id
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_subscription_is_rejected() {
        assert!(matches!(
            RelationKind::Subscription.check(7, 7),
            Err(ActionError::Validation(_))
        ));
        assert!(RelationKind::Subscription.check(7, 8).is_ok());
    }

    #[test]
    fn same_ids_are_fine_for_recipe_relations() {
        // user 3 favoriting recipe 3 is unrelated to self-subscription
        assert!(RelationKind::Favorite.check(3, 3).is_ok());
        assert!(RelationKind::Cart.check(3, 3).is_ok());
    }

    #[test]
    fn every_kind_has_its_own_table() {
        let tables = [
            RelationKind::Favorite.table(),
            RelationKind::Cart.table(),
            RelationKind::Subscription.table(),
        ];
        assert_eq!(tables, ["favorites", "shopping_cart", "subscriptions"]);
        assert_eq!(RelationKind::Subscription.owner_column(), "subscriber_id");
        assert_eq!(RelationKind::Subscription.target_table(), "users");
        assert_eq!(RelationKind::Cart.target_table(), "recipes");
    }

    #[test]
    fn duplicate_and_missing_errors() {
        assert!(matches!(
            RelationKind::Cart.already_exists(),
            ActionError::Conflict(_)
        ));
        assert!(matches!(
            RelationKind::Favorite.not_present(),
            ActionError::NotFound(_)
        ));
        assert_eq!(
            RelationKind::Subscription.missing_target(5).to_string(),
            "User 5 doesn't exist"
        );
    }
}
