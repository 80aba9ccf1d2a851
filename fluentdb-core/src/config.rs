use std::{env, fmt::Display, str::FromStr, time::Duration};

/// Reads `key` from the environment, falling back to `default` when unset or unparsable.
pub fn getenv<T: FromStr>(key: &str, default: T) -> T
where
    T::Err: Display,
{
    match env::var(key) {
        Ok(value) => match value.trim().parse() {
            Ok(v) => v,
            Err(e) => {
                log::warn!("Ignoring {key}=`{value}`: {e}");
                default
            }
        },
        Err(..) => default,
    }
}

/// Connection pool limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum open connections, 0 leaves the driver default.
    pub max_connections: usize,
    /// Connections kept open while idle.
    pub max_idle_connections: usize,
    pub max_lifetime: Duration,
    pub max_idle_time: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 0,
            max_idle_connections: 10,
            max_lifetime: Duration::from_secs(30 * 60),
            max_idle_time: Duration::from_secs(3 * 60),
        }
    }
}

impl PoolConfig {
    pub fn from_env() -> Self {
        let default = Self::default();
        let minutes = |key: &str, default: Duration| {
            Duration::from_secs(getenv(key, default.as_secs() / 60) * 60)
        };
        Self {
            max_connections: getenv("DB_MAX_CONNECTION", default.max_connections),
            max_idle_connections: getenv("DB_MAX_IDLE_CONNECTION", default.max_idle_connections),
            max_lifetime: minutes("DB_MAX_LIFETIME_CONNECTION", default.max_lifetime),
            max_idle_time: minutes("DB_MAX_IDLE_TIME_CONNECTION", default.max_idle_time),
        }
    }
}

/// Everything needed to open a database, usually read from the environment.
///
/// `port` and `username` have no generic default: each driver fills in its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: String,
    pub name: String,
    pub ssl_mode: String,
    /// Log generated SQL at info level.
    pub debug: bool,
    pub pool: PoolConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: None,
            username: None,
            password: "secret".into(),
            name: "gfly".into(),
            ssl_mode: "disable".into(),
            debug: false,
            pool: PoolConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            host: getenv("DB_HOST", default.host),
            port: env::var("DB_PORT").ok().and_then(|v| match v.trim().parse() {
                Ok(v) => Some(v),
                Err(e) => {
                    log::warn!("Ignoring DB_PORT=`{v}`: {e}");
                    None
                }
            }),
            username: env::var("DB_USERNAME").ok(),
            password: getenv("DB_PASSWORD", default.password),
            name: getenv("DB_NAME", default.name),
            ssl_mode: getenv("DB_SSL_MODE", default.ssl_mode),
            debug: getenv("DB_DEBUG", default.debug),
            pool: PoolConfig::from_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, None);
        assert_eq!(config.pool.max_idle_connections, 10);
        assert_eq!(config.pool.max_lifetime, Duration::from_secs(1800));
        assert_eq!(config.pool.max_idle_time, Duration::from_secs(180));
    }

    #[test]
    fn typed_env() {
        // SAFETY: the variables are unique to this test.
        unsafe {
            env::set_var("FLUENTDB_TEST_NUMBER", "42");
            env::set_var("FLUENTDB_TEST_BROKEN", "forty two");
        }
        assert_eq!(getenv("FLUENTDB_TEST_NUMBER", 0_u32), 42);
        assert_eq!(getenv("FLUENTDB_TEST_BROKEN", 7_u32), 7);
        assert_eq!(getenv("FLUENTDB_TEST_MISSING", true), true);
    }
}
