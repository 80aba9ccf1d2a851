mod generic;
mod orders;
mod schema;
mod transaction;
mod users;

use fluentdb::Database;
use generic::generic;
use log::LevelFilter;
use orders::orders;
use std::env;
use transaction::transaction;
use users::users;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Runs every scenario against `db`, each one drops and recreates the tables it uses.
pub async fn execute_tests(db: Database) {
    users(&db).await;
    orders(&db).await;
    transaction(&db).await;
    generic(&db).await;
}

/// Runs the code with logging disabled, for expected failures that log errors.
#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        let result = { $($code)+ };
        log::set_max_level(level);
        result
    }};
}
