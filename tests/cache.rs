mod common;

use recipebook_sdk::{
    actions::list_tags, cached_ingredient_search, cached_tags, create_ingredient_and_invalidate,
    create_tag_and_invalidate, error::ActionError, get_or, invalidate_cache, CacheKey, CacheScope,
};
use redis::aio::MultiplexedConnection;
use sqlx::PgPool;

async fn redis() -> MultiplexedConnection {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string());
    redis::Client::open(url)
        .unwrap()
        .get_multiplexed_async_connection()
        .await
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs Postgres and Redis"]
async fn new_tag_invalidates_cached_list(pool: PgPool) {
    let mut cache = redis().await;
    common::tag(&pool, "Breakfast", "breakfast").await;
    // invalidate anything a previous run left behind
    invalidate_cache(CacheScope::Tags, &mut cache).await.unwrap();

    let before = cached_tags(&pool, &mut cache).await.unwrap();
    assert_eq!(before.len(), 1);

    create_tag_and_invalidate("Dinner", "#E26C2D", "dinner", &pool, &mut cache)
        .await
        .unwrap();

    let after = cached_tags(&pool, &mut cache).await.unwrap();
    let slugs: Vec<_> = after.iter().map(|t| t.slug.as_str()).collect();
    assert_eq!(slugs, vec!["breakfast", "dinner"]);

    // a tag created while the list is being fetched must not be masked by
    // the older list stored afterwards
    let mut writer = redis().await;
    invalidate_cache(CacheScope::Tags, &mut cache).await.unwrap();
    let pool_ref = &pool;
    let writer_ref = &mut writer;
    let stale = get_or(CacheKey::TagList, &mut cache, move || async move {
        let old = list_tags(pool_ref).await?;
        create_tag_and_invalidate("Lunch", "#2D8CE2", "lunch", pool_ref, writer_ref).await?;
        Ok::<_, ActionError>(old)
    })
    .await
    .unwrap();
    assert_eq!(stale.len(), 2);

    let fresh = cached_tags(&pool, &mut cache).await.unwrap();
    assert_eq!(fresh.len(), 3);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs Postgres and Redis"]
async fn ingredient_search_sees_new_ingredients(pool: PgPool) {
    let mut cache = redis().await;
    invalidate_cache(CacheScope::Ingredients, &mut cache).await.unwrap();

    assert!(cached_ingredient_search("sug", &pool, &mut cache)
        .await
        .unwrap()
        .is_empty());

    create_ingredient_and_invalidate("Sugar", "g", &pool, &mut cache)
        .await
        .unwrap();

    let found = cached_ingredient_search("SUG", &pool, &mut cache).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].measurement_unit, "g");
}
