mod common;

use recipebook_sdk::{
    actions::{add_relation, has_relation, list_subscriptions, remove_relation, RelationKind},
    error::ActionError,
};
use sqlx::PgPool;

use common::{count, ingredient, recipe, user};

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn duplicate_favorite_is_a_conflict(pool: PgPool) {
    let author = user(&pool, "author").await;
    let fan = user(&pool, "fan").await;
    let egg = ingredient(&pool, "egg", "unit").await;
    let omelette = recipe(&pool, &author, &[(egg.id, 3)]).await;

    let record = add_relation(RelationKind::Favorite, fan.id, omelette.id, &pool)
        .await
        .unwrap();
    assert_eq!((record.owner_id, record.target_id), (fan.id, omelette.id));

    let again = add_relation(RelationKind::Favorite, fan.id, omelette.id, &pool).await;
    assert!(matches!(again, Err(ActionError::Conflict(_))));
    assert_eq!(count(&pool, "favorites").await, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn removing_absent_relation_is_not_found(pool: PgPool) {
    let author = user(&pool, "author").await;
    let fan = user(&pool, "fan").await;
    let egg = ingredient(&pool, "egg", "unit").await;
    let omelette = recipe(&pool, &author, &[(egg.id, 3)]).await;

    let result = remove_relation(RelationKind::Favorite, fan.id, omelette.id, &pool).await;
    assert!(matches!(result, Err(ActionError::NotFound(_))));

    let missing_recipe = remove_relation(RelationKind::Cart, fan.id, 9999, &pool).await;
    assert!(matches!(missing_recipe, Err(ActionError::NotFound(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn add_then_remove_round_trip(pool: PgPool) {
    let author = user(&pool, "author").await;
    let fan = user(&pool, "fan").await;
    let egg = ingredient(&pool, "egg", "unit").await;
    let omelette = recipe(&pool, &author, &[(egg.id, 3)]).await;

    add_relation(RelationKind::Cart, fan.id, omelette.id, &pool)
        .await
        .unwrap();
    assert!(has_relation(RelationKind::Cart, fan.id, omelette.id, &pool)
        .await
        .unwrap());
    assert!(!has_relation(RelationKind::Favorite, fan.id, omelette.id, &pool)
        .await
        .unwrap());

    remove_relation(RelationKind::Cart, fan.id, omelette.id, &pool)
        .await
        .unwrap();
    assert_eq!(count(&pool, "shopping_cart").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn self_subscription_is_always_rejected(pool: PgPool) {
    let author = user(&pool, "author").await;

    let first = add_relation(RelationKind::Subscription, author.id, author.id, &pool).await;
    assert!(matches!(first, Err(ActionError::Validation(_))));

    // a nonexistent id still fails validation before the existence check
    let ghost = add_relation(RelationKind::Subscription, 9999, 9999, &pool).await;
    assert!(matches!(ghost, Err(ActionError::Validation(_))));

    assert_eq!(count(&pool, "subscriptions").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn subscriptions_list_authors_with_recipe_counts(pool: PgPool) {
    let author = user(&pool, "author").await;
    let quiet = user(&pool, "quiet").await;
    let reader = user(&pool, "reader").await;
    let egg = ingredient(&pool, "egg", "unit").await;
    recipe(&pool, &author, &[(egg.id, 1)]).await;
    recipe(&pool, &author, &[(egg.id, 2)]).await;

    add_relation(RelationKind::Subscription, reader.id, author.id, &pool)
        .await
        .unwrap();
    add_relation(RelationKind::Subscription, reader.id, quiet.id, &pool)
        .await
        .unwrap();

    let authors = list_subscriptions(reader.id, &pool).await.unwrap();
    let counts: Vec<_> = authors
        .iter()
        .map(|a| (a.username.as_str(), a.recipes_count))
        .collect();
    assert_eq!(counts, vec![("author", 2), ("quiet", 0)]);

    let missing = add_relation(RelationKind::Subscription, reader.id, 9999, &pool).await;
    assert!(matches!(missing, Err(ActionError::NotFound(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a Postgres DATABASE_URL"]
async fn concurrent_duplicate_adds_store_one_row(pool: PgPool) {
    let author = user(&pool, "author").await;
    let shopper = user(&pool, "shopper").await;
    let egg = ingredient(&pool, "egg", "unit").await;
    let omelette = recipe(&pool, &author, &[(egg.id, 3)]).await;

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let pool = pool.clone();
            let (user_id, recipe_id) = (shopper.id, omelette.id);
            tokio::spawn(async move {
                add_relation(RelationKind::Cart, user_id, recipe_id, &pool).await
            })
        })
        .collect();

    let (mut added, mut conflicts) = (0, 0);
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => added += 1,
            Err(ActionError::Conflict(_)) => conflicts += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!((added, conflicts), (1, 15));
    assert_eq!(count(&pool, "shopping_cart").await, 1);
}
