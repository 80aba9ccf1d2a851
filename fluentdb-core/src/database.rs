use crate::{Config, Connection, DBModel, Driver, EmptyDriver, Error, Result, driver::connect};
use parking_lot::{RwLock, const_rwlock};
use std::{fmt, sync::Arc};

/// Open database: the pooled connection and the configuration it was opened with.
///
/// Cheap to clone, every clone shares the same pool.
#[derive(Clone)]
pub struct Database {
    connection: Arc<dyn Connection>,
    config: Arc<Config>,
}

impl Database {
    /// Opens the pool described by `config` and checks that the database answers.
    pub async fn connect(driver: &dyn Driver, config: Config) -> Result<Self> {
        let url = driver.url(&config);
        let connection = connect(driver, &url, &config.pool).await?;
        log::info!(
            "Connected to {} database `{}` on {}",
            driver.name(),
            config.name,
            config.host
        );
        Ok(Self::new(connection, config))
    }

    /// Wraps an already open connection.
    pub fn new(connection: Arc<dyn Connection>, config: Config) -> Self {
        Self {
            connection,
            config: Arc::new(config),
        }
    }

    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fresh builder on this database.
    pub fn model(&self) -> DBModel {
        DBModel::new(self.clone())
    }

    pub async fn close(&self) -> Result<()> {
        self.connection.close().await
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("dialect", &self.connection.dialect())
            .field("config", &self.config)
            .finish()
    }
}

static DRIVER: RwLock<Option<Arc<dyn Driver>>> = const_rwlock(None);
static INSTANCE: RwLock<Option<Database>> = const_rwlock(None);

/// Replaces the driver used by [`load`] and [`try_load`].
pub fn register_driver(driver: impl Driver + 'static) {
    log::debug!("Registered database driver `{}`", driver.name());
    *DRIVER.write() = Some(Arc::new(driver));
}

/// Connects with the registered driver and keeps the database for [`instance`].
pub async fn try_load(config: Config) -> Result<Database> {
    let driver = DRIVER
        .read()
        .clone()
        .unwrap_or_else(|| Arc::new(EmptyDriver));
    let database = Database::connect(driver.as_ref(), config).await?;
    *INSTANCE.write() = Some(database.clone());
    Ok(database)
}

/// Like [`try_load`], panics when the database cannot be reached.
pub async fn load(config: Config) -> Database {
    match try_load(config).await {
        Ok(database) => database,
        Err(e) => {
            log::error!("{:#}", e);
            panic!("Could not load the database: {e:#}");
        }
    }
}

/// Database kept by the last successful load.
pub fn loaded() -> Result<Database> {
    INSTANCE
        .read()
        .clone()
        .ok_or_else(|| Error::msg("No database loaded, call `load` first"))
}

/// Fresh builder on the loaded database.
pub fn instance() -> Result<DBModel> {
    loaded().map(|db| db.model())
}
