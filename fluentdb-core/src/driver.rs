use crate::{Config, Dialect, Error, PoolConfig, Result, RowLabeled, RowsAffected, Statement};
use async_trait::async_trait;
use std::sync::Arc;

/// Executes statements, implemented by connections and open transactions.
#[async_trait]
pub trait Executor: Send + Sync {
    fn dialect(&self) -> Dialect;
    /// Execute the statement and return all the rows.
    async fn fetch(&self, statement: &Statement) -> Result<Vec<RowLabeled>>;
    /// Execute the statement and return the number of affected rows.
    async fn execute(&self, statement: &Statement) -> Result<RowsAffected>;
}

/// Shared, pooled handle to a database, safe to use from many builders at once.
#[async_trait]
pub trait Connection: Executor {
    async fn ping(&self) -> Result<()>;
    /// Pins a connection from the pool and starts a transaction on it.
    async fn begin(&self) -> Result<Box<dyn Transaction>>;
    async fn close(&self) -> Result<()>;
}

/// Transaction owned by a single builder.
#[async_trait]
pub trait Transaction: Executor {
    async fn commit(self: Box<Self>) -> Result<()>;
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Backend entry point: knows how to turn a [`Config`] into a URL and open a pool on it.
#[async_trait]
pub trait Driver: Send + Sync {
    fn name(&self) -> &'static str;
    fn dialect(&self) -> Dialect;
    fn url(&self, config: &Config) -> String;
    /// Opens the pool, no liveness check.
    async fn open(&self, url: &str, pool: &PoolConfig) -> Result<Arc<dyn Connection>>;
}

/// Opens a pool on `url` and pings it, the pool is closed again when the ping fails.
pub async fn connect(
    driver: &dyn Driver,
    url: &str,
    pool: &PoolConfig,
) -> Result<Arc<dyn Connection>> {
    let connection = driver.open(url, pool).await?;
    if let Err(e) = connection.ping().await {
        if let Err(close) = connection.close().await {
            log::error!("{:#}", close);
        }
        return Err(e.context(format!("Database `{}` did not answer the ping", driver.name())));
    }
    Ok(connection)
}

/// Placeholder used until a real driver is registered, every connection attempt fails.
#[derive(Default, Debug, Clone, Copy)]
pub struct EmptyDriver;

#[async_trait]
impl Driver for EmptyDriver {
    fn name(&self) -> &'static str {
        "empty"
    }
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }
    fn url(&self, _config: &Config) -> String {
        "empty".into()
    }
    async fn open(&self, _url: &str, _pool: &PoolConfig) -> Result<Arc<dyn Connection>> {
        Err(Error::msg(
            "No database driver registered, call `register_driver` before loading",
        ))
    }
}
