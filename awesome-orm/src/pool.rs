//! Database connection pool management
//!
//! [`Database`] is the handle every query goes through. It starts
//! uninitialized and is set up exactly once by [`Database::create_pool`];
//! clones share the same pool. Connections handed out by
//! [`Database::acquire`] return to the pool when dropped, so release
//! happens on every exit path, including cancellation of the caller.
//!
//! Each backend keeps its native sqlx pool so rows decode with the
//! driver's own type mapping.

use std::sync::Arc;

use sqlx::mysql::MySqlPool;
use sqlx::pool::{PoolConnection, PoolOptions};
use sqlx::postgres::PgPool;
use sqlx::sqlite::SqlitePool;
use sqlx::{MySql, Postgres, Sqlite};
use tokio::sync::{OnceCell, SetError};
use tracing::info;

use crate::config::{Backend, PoolConfig};
use crate::error::{OrmError, Result};

#[derive(Debug, Clone)]
pub(crate) enum BackendPool {
    Mysql(MySqlPool),
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

/// A checked-out connection; dropping it returns it to the pool
#[derive(Debug)]
pub enum DbConnection {
    Mysql(PoolConnection<MySql>),
    Postgres(PoolConnection<Postgres>),
    Sqlite(PoolConnection<Sqlite>),
}

/// Run `$body` with `$pool` bound to whichever native pool is active
macro_rules! with_pool {
    ($pool:expr, $p:ident => $body:expr) => {
        match $pool {
            BackendPool::Mysql($p) => $body,
            BackendPool::Postgres($p) => $body,
            BackendPool::Sqlite($p) => $body,
        }
    };
}

#[derive(Debug)]
struct PoolState {
    pool: BackendPool,
    backend: Backend,
    autocommit: bool,
}

fn pool_options<DB: sqlx::Database>(config: &PoolConfig) -> PoolOptions<DB> {
    PoolOptions::new()
        .min_connections(config.minsize)
        .max_connections(config.maxsize)
        .acquire_timeout(config.acquire_timeout())
}

/// Shared handle to the process connection pool
#[derive(Debug, Clone, Default)]
pub struct Database {
    state: Arc<OnceCell<PoolState>>,
}

impl Database {
    /// Handle in the unconstructed state
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the handle and its pool in one step.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let db = Database::connect(&PoolConfig::load("awesome.toml")?).await?;
    /// ```
    pub async fn connect(config: &PoolConfig) -> Result<Self> {
        let db = Self::new();
        db.create_pool(config).await?;
        Ok(db)
    }

    /// Initialize the pool.
    ///
    /// # Errors
    ///
    /// Returns `PoolAlreadyInitialized` if this handle already has a pool,
    /// or the driver error if the initial connections fail.
    pub async fn create_pool(&self, config: &PoolConfig) -> Result<()> {
        if self.state.initialized() {
            return Err(OrmError::PoolAlreadyInitialized);
        }
        config.validate()?;

        info!("create database connection pool ({:?})", config.backend);

        let pool = match config.backend {
            Backend::Mysql => BackendPool::Mysql(
                pool_options::<MySql>(config)
                    .connect_with(config.mysql_options())
                    .await?,
            ),
            Backend::Postgres => BackendPool::Postgres(
                pool_options::<Postgres>(config)
                    .connect_with(config.postgres_options())
                    .await?,
            ),
            Backend::Sqlite => BackendPool::Sqlite(
                pool_options::<Sqlite>(config)
                    .connect_with(config.sqlite_options())
                    .await?,
            ),
        };

        let state = PoolState {
            pool,
            backend: config.backend,
            autocommit: config.autocommit,
        };

        // Lost a race with a concurrent create_pool: keep the winner only
        if let Err(err) = self.state.set(state) {
            let rejected = match err {
                SetError::AlreadyInitializedError(state) => state,
                SetError::InitializingError(state) => state,
            };
            with_pool!(&rejected.pool, p => p.close().await);
            return Err(OrmError::PoolAlreadyInitialized);
        }

        Ok(())
    }

    fn state(&self) -> Result<&PoolState> {
        self.state.get().ok_or(OrmError::PoolNotInitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.state.initialized()
    }

    /// Check out one connection, waiting while `maxsize` are in use
    pub async fn acquire(&self) -> Result<DbConnection> {
        let conn = match &self.state()?.pool {
            BackendPool::Mysql(pool) => DbConnection::Mysql(pool.acquire().await?),
            BackendPool::Postgres(pool) => DbConnection::Postgres(pool.acquire().await?),
            BackendPool::Sqlite(pool) => DbConnection::Sqlite(pool.acquire().await?),
        };
        Ok(conn)
    }

    pub fn backend(&self) -> Result<Backend> {
        Ok(self.state()?.backend)
    }

    /// Default transaction mode from the pool configuration
    pub fn autocommit(&self) -> Result<bool> {
        Ok(self.state()?.autocommit)
    }

    /// Open connections, idle or checked out
    pub fn size(&self) -> u32 {
        self.state
            .get()
            .map(|s| with_pool!(&s.pool, p => p.size()))
            .unwrap_or(0)
    }

    pub fn num_idle(&self) -> usize {
        self.state
            .get()
            .map(|s| with_pool!(&s.pool, p => p.num_idle()))
            .unwrap_or(0)
    }

    pub fn max_size(&self) -> u32 {
        self.state
            .get()
            .map(|s| with_pool!(&s.pool, p => p.options().get_max_connections()))
            .unwrap_or(0)
    }

    /// Close every connection; later acquisitions fail
    pub async fn close(&self) {
        if let Some(state) = self.state.get() {
            with_pool!(&state.pool, p => p.close().await);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn uninitialized_pool_rejects_acquire() {
        let db = Database::new();
        assert!(!db.is_initialized());

        let err = db.acquire().await.unwrap_err();
        assert!(matches!(err, OrmError::PoolNotInitialized));
        assert!(matches!(db.backend(), Err(OrmError::PoolNotInitialized)));
        assert_eq!(db.size(), 0);
    }

    #[tokio::test]
    async fn create_pool_validates_config() {
        let db = Database::new();
        let mut config = PoolConfig::sqlite("unused.db");
        config.maxsize = 0;

        let err = db.create_pool(&config).await.unwrap_err();
        assert!(matches!(err, OrmError::Config { .. }));
        assert!(!db.is_initialized());
    }

    #[tokio::test]
    async fn second_create_pool_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = PoolConfig::sqlite(dir.path().join("pool.db"));

        let db = Database::connect(&config).await.unwrap();
        let clone = db.clone();

        let err = clone.create_pool(&config).await.unwrap_err();
        assert!(matches!(err, OrmError::PoolAlreadyInitialized));
        assert_eq!(db.max_size(), 10);
        assert_eq!(db.backend().unwrap(), Backend::Sqlite);
        assert!(matches!(db.acquire().await.unwrap(), DbConnection::Sqlite(_)));
    }
}
