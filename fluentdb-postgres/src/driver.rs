use crate::PostgresConnection;
use async_trait::async_trait;
use fluentdb_core::{Config, Connection, Dialect, Driver, PoolConfig, Result};
use std::sync::Arc;
use urlencoding::encode;

pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_USERNAME: &str = "user";

#[derive(Default, Debug, Clone, Copy)]
pub struct PostgresDriver {}

impl PostgresDriver {
    pub const fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl Driver for PostgresDriver {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn url(&self, config: &Config) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            encode(config.username.as_deref().unwrap_or(DEFAULT_USERNAME)),
            encode(&config.password),
            config.host,
            config.port.unwrap_or(DEFAULT_PORT),
            config.name,
            encode(&config.ssl_mode),
        )
    }

    async fn open(&self, url: &str, pool: &PoolConfig) -> Result<Arc<dyn Connection>> {
        Ok(Arc::new(PostgresConnection::open(url, pool).await?))
    }
}
