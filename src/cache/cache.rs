use std::{
    fmt::{self, Display},
    future::Future,
};

use redis::{aio::MultiplexedConnection, AsyncCommands, FromRedisValue, ToRedisArgs};
use redis_macros::{FromRedisValue, ToRedisArgs};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    actions::{create_ingredient, create_tag, list_tags, search_ingredients},
    error::{ActionError, CacheError},
    schema::{Ingredient, Tag},
};

// Caching - scopes

/// Group of entries invalidated together. Each scope has a bind key holding
/// its current generation; entries written under an older generation are stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheScope {
    Tags,
    Ingredients,
}

impl CacheScope {
    pub fn bind_key(self) -> &'static str {
        match self {
            CacheScope::Tags => "tag-cache-key",
            CacheScope::Ingredients => "ingredient-cache-key",
        }
    }

    async fn current_bind(
        self,
        cache: &mut MultiplexedConnection,
    ) -> Result<Option<String>, CacheError> {
        get_cache_value::<&str, String>(self.bind_key(), cache).await
    }
}

// Caching - keys

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheKey {
    TagList,
    IngredientSearch(String),
}

impl CacheKey {
    /// Search keys are normalized so `" Flo"` and `"flo"` share an entry.
    pub fn ingredient_search(prefix: &str) -> Self {
        CacheKey::IngredientSearch(prefix.trim().to_lowercase())
    }

    pub fn scope(&self) -> CacheScope {
        match self {
            CacheKey::TagList => CacheScope::Tags,
            CacheKey::IngredientSearch(_) => CacheScope::Ingredients,
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::TagList => write!(f, "tag-list"),
            CacheKey::IngredientSearch(prefix) => write!(f, "ingredient-search-{prefix}"),
        }
    }
}

// Cache - wrappers

#[derive(Serialize, Deserialize, FromRedisValue, ToRedisArgs, Clone, Debug)]
struct CachedEntry {
    value: serde_json::Value,
    bind: Option<String>,
}

/// Result of reading `key`: the cached value, or the generation a freshly
/// fetched value must be stored under.
enum Lookup<T> {
    Hit(T),
    Miss(Option<String>),
}

async fn lookup<T: DeserializeOwned>(
    key: &CacheKey,
    cache: &mut MultiplexedConnection,
) -> Result<Lookup<T>, CacheError> {
    // read before the value is fetched, so an invalidation that lands while
    // fetching leaves the stored entry stale instead of fresh
    let bind = key.scope().current_bind(cache).await?;

    let entry = match get_cache_value::<String, CachedEntry>(key.to_string(), cache).await {
        Ok(entry) => entry,
        Err(e) => {
            log::error!("> Failed to read cached value {key}: {e}. Deleting");
            delete_cache_value(key.to_string(), cache).await?;
            None
        }
    };

    let Some(entry) = entry else {
        return Ok(Lookup::Miss(bind));
    };
    log::trace!("> Found {key}");

    if entry.bind != bind {
        log::trace!("> Invalidated {key}");
        return Ok(Lookup::Miss(bind));
    }

    match serde_json::from_value(entry.value) {
        Ok(value) => Ok(Lookup::Hit(value)),
        Err(e) => {
            log::error!("> Failed to deserialize cached value {key}: {e}");
            Ok(Lookup::Miss(bind))
        }
    }
}

async fn store<T: Serialize>(
    key: &CacheKey,
    value: &T,
    bind: Option<String>,
    cache: &mut MultiplexedConnection,
) -> Result<(), CacheError> {
    let entry = CachedEntry {
        value: serde_json::to_value(value)?,
        bind,
    };

    set_cache_value(key.to_string(), entry, cache).await
}

/// Returns the cached value for `key`, or runs `callback` and caches its result.
///
/// The cache never fails a request: redis errors are logged and the value is
/// taken from `callback` instead.
pub async fn get_or<T, F, Fut>(
    key: CacheKey,
    cache: &mut MultiplexedConnection,
    callback: F,
) -> Result<T, ActionError>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ActionError>>,
{
    let bind = match lookup::<T>(&key, cache).await {
        Ok(Lookup::Hit(value)) => return Ok(value),
        Ok(Lookup::Miss(bind)) => Some(bind),
        Err(e) => {
            log::error!("> Cache lookup failed for {key}: {e}");
            None
        }
    };

    log::trace!("> Fetching {key}");
    let value = callback().await?;

    if let Some(bind) = bind {
        if let Err(e) = store(&key, &value, bind, cache).await {
            log::error!("> Failed to cache {key}: {e}");
        }
    }

    Ok(value)
}

/// Starts a new generation for `scope`, making every entry in it stale.
pub async fn invalidate_cache(
    scope: CacheScope,
    cache: &mut MultiplexedConnection,
) -> Result<(), CacheError> {
    let bind = Uuid::new_v4().to_string();
    set_cache_value(scope.bind_key(), bind, cache).await?;
    log::debug!("Invalidated {scope:?} cache");

    Ok(())
}

// Cached actions

pub async fn cached_tags(
    pool: &Pool<Postgres>,
    cache: &mut MultiplexedConnection,
) -> Result<Vec<Tag>, ActionError> {
    get_or(CacheKey::TagList, cache, || list_tags(pool)).await
}

pub async fn cached_ingredient_search(
    prefix: &str,
    pool: &Pool<Postgres>,
    cache: &mut MultiplexedConnection,
) -> Result<Vec<Ingredient>, ActionError> {
    get_or(CacheKey::ingredient_search(prefix), cache, || {
        search_ingredients(prefix, pool)
    })
    .await
}

/// `create_tag` followed by invalidation of the tag scope.
pub async fn create_tag_and_invalidate(
    name: &str,
    color: &str,
    slug: &str,
    pool: &Pool<Postgres>,
    cache: &mut MultiplexedConnection,
) -> Result<Tag, ActionError> {
    let tag = create_tag(name, color, slug, pool).await?;
    invalidate_cache(CacheScope::Tags, cache).await?;
    Ok(tag)
}

pub async fn create_ingredient_and_invalidate(
    name: &str,
    measurement_unit: &str,
    pool: &Pool<Postgres>,
    cache: &mut MultiplexedConnection,
) -> Result<Ingredient, ActionError> {
    let ingredient = create_ingredient(name, measurement_unit, pool).await?;
    invalidate_cache(CacheScope::Ingredients, cache).await?;
    Ok(ingredient)
}

// Cache - raw handlers

pub async fn set_cache_value<K: ToRedisArgs + Send + Sync, V: ToRedisArgs + Send + Sync>(
    key: K,
    value: V,
    cache: &mut MultiplexedConnection,
) -> Result<(), CacheError> {
    let _: () = cache.set(key, value).await?;

    Ok(())
}

pub async fn delete_cache_value<K: ToRedisArgs + Send + Sync>(
    key: K,
    cache: &mut MultiplexedConnection,
) -> Result<(), CacheError> {
    let _: () = cache.del(key).await?;

    Ok(())
}

pub async fn get_cache_value<K: ToRedisArgs + Send + Sync, V: FromRedisValue>(
    key: K,
    cache: &mut MultiplexedConnection,
) -> Result<Option<V>, CacheError> {
    let value: Option<V> = cache.get(key).await?;

    Ok(value)
}
