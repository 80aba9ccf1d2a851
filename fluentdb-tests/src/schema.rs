use fluentdb::{Database, Dialect};

/// Drops `table` and creates it again with the DDL of the connected dialect.
pub(crate) async fn recreate(db: &Database, table: &str, postgres: &str, mysql: &str) {
    db.model()
        .raw(format!("DROP TABLE IF EXISTS {table}"), Vec::new())
        .exec()
        .await
        .unwrap_or_else(|e| panic!("Failed to drop {table}: {e:#}"));
    let ddl = match db.connection().dialect() {
        Dialect::Postgres => postgres,
        Dialect::MySql => mysql,
    };
    db.model()
        .raw(ddl, Vec::new())
        .exec()
        .await
        .unwrap_or_else(|e| panic!("Failed to create {table}: {e:#}"));
}

/// Placeholder of the `n`th argument (1 based) in raw SQL.
pub(crate) fn arg(db: &Database, n: usize) -> String {
    match db.connection().dialect() {
        Dialect::Postgres => format!("${n}"),
        Dialect::MySql => "?".into(),
    }
}
