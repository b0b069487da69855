//! Database configuration & connections

use std::time::Duration;

use anyhow::{Context, Result};
use bb8::PooledConnection;
use diesel_async::{pooled_connection::AsyncDieselConnectionManager, AsyncPgConnection};

/// Type alias for the connection pool
pub type Pool = bb8::Pool<AsyncDieselConnectionManager<AsyncPgConnection>>;

/// Type alias for the connection
pub type Conn<'a> = PooledConnection<'a, AsyncDieselConnectionManager<AsyncPgConnection>>;

/// Build the database pool
pub async fn pool(url: &str, connect_timeout: u64) -> Result<Pool> {
    tracing::info!(%connect_timeout, "Connecting to database via pool");

    let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(url);

    bb8::Pool::builder()
        .connection_timeout(Duration::from_secs(connect_timeout))
        .build(config)
        .await
        .context("Could not build the database pool")
}

/// Establish a connection
pub async fn connect(pool: &Pool) -> Result<Conn<'_>> {
    tracing::debug!("Creating a db connection from connection pool");
    pool.get()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to the database: {e}"))
}
