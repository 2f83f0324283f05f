//! warp front end over the SDK actions.

mod handlers;
mod rejection;
mod routes;

use std::{net::SocketAddr, sync::Arc};

use redis::aio::MultiplexedConnection;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use warp::Filter;

use crate::{
    config::Config,
    error::{ActionError, CacheError},
};

pub use rejection::handle_rejection;
pub use routes::routes;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct Context {
    pub pool: Pool<Postgres>,
    pub cache: MultiplexedConnection,
    pub secret: Arc<[u8]>,
    pub config: Arc<Config>,
}

impl Context {
    pub fn new(pool: Pool<Postgres>, cache: MultiplexedConnection, config: Config) -> Self {
        Self {
            pool,
            cache,
            secret: Arc::from(config.jwt_secret.as_bytes()),
            config: Arc::new(config),
        }
    }

    pub async fn connect(config: Config) -> Result<Self, ActionError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;

        let client = redis::Client::open(config.redis_url.as_str()).map_err(CacheError::from)?;
        let cache = client
            .get_multiplexed_async_connection()
            .await
            .map_err(CacheError::from)?;

        log::info!("Connected to database and cache");
        Ok(Self::new(pool, cache, config))
    }
}

/// Runs the HTTP service until the process is stopped.
pub async fn serve(ctx: Context, addr: impl Into<SocketAddr>) {
    let addr = addr.into();
    log::info!("Listening on {addr}");

    warp::serve(routes(ctx).recover(handle_rejection))
        .run(addr)
        .await;
}
