mod init;

#[cfg(test)]
mod tests {
    use super::init::init;
    use fluentdb_core::{Config, Database, PoolConfig, connect};
    use fluentdb_postgres::PostgresDriver;
    use fluentdb_tests::{execute_tests, init_logs, silent_logs};
    use std::sync::Mutex;

    static MUTEX: Mutex<()> = Mutex::new(());

    #[tokio::test]
    async fn postgres() {
        init_logs();
        let _guard = MUTEX.lock().unwrap();

        let (url, _container) = init().await;
        let error_msg = format!("Could not connect to `{url}`");
        let connection = connect(&PostgresDriver::new(), &url, &PoolConfig::default())
            .await
            .expect(&error_msg);
        let database = Database::new(
            connection,
            Config {
                debug: true,
                ..Default::default()
            },
        );
        execute_tests(database.clone()).await;
        database.close().await.expect("Could not close the pool");
    }

    #[tokio::test]
    async fn wrong_url() {
        silent_logs! {
            assert!(
                connect(&PostgresDriver::new(), "mysql://some_url", &PoolConfig::default())
                    .await
                    .is_err()
            );
        }
    }

    #[tokio::test]
    async fn unreachable_server() {
        silent_logs! {
            let config = Config {
                host: "127.0.0.1".into(),
                port: Some(1),
                ..Default::default()
            };
            let error = Database::connect(&PostgresDriver::new(), config)
                .await
                .expect_err("Nothing listens on port 1");
            assert!(format!("{error:#}").contains("did not answer the ping"));
        }
    }
}
