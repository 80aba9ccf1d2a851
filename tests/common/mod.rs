#![allow(dead_code)]
use async_trait::async_trait;
use fluentdb::{
    Config, Connection, Database, Dialect, Driver, Executor, PoolConfig, Result, RowLabeled,
    RowNames, RowsAffected, Statement, Transaction, Value,
};
use parking_lot::Mutex;
use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    },
};

/// State shared by a recording connection and its transactions.
pub struct Recorder {
    pub dialect: Dialect,
    pub statements: Mutex<Vec<Statement>>,
    /// Result of each coming `fetch`, an empty result once exhausted.
    pub results: Mutex<VecDeque<Vec<RowLabeled>>>,
    pub rows_affected: Mutex<u64>,
    pub next_id: AtomicI64,
}

impl Recorder {
    pub fn new(dialect: Dialect) -> Arc<Self> {
        Arc::new(Self {
            dialect,
            statements: Mutex::new(Vec::new()),
            results: Mutex::new(VecDeque::new()),
            rows_affected: Mutex::new(1),
            next_id: AtomicI64::new(1),
        })
    }

    pub fn push_result(&self, labels: &[&str], rows: Vec<Vec<Value>>) {
        let labels: RowNames = labels.iter().map(|v| v.to_string()).collect();
        let rows = rows
            .into_iter()
            .map(|v| RowLabeled::new(labels.clone(), v.into_boxed_slice()))
            .collect();
        self.results.lock().push_back(rows);
    }

    pub fn sql(&self) -> Vec<String> {
        self.statements.lock().iter().map(|v| v.sql.clone()).collect()
    }

    pub fn last(&self) -> Statement {
        self.statements.lock().last().cloned().unwrap_or_default()
    }

    pub fn clear(&self) {
        self.statements.lock().clear();
    }

    fn record(&self, statement: &Statement) {
        self.statements.lock().push(statement.clone());
    }

    fn fetch(&self, statement: &Statement) -> Vec<RowLabeled> {
        self.record(statement);
        self.results.lock().pop_front().unwrap_or_default()
    }

    fn execute(&self, statement: &Statement) -> RowsAffected {
        self.record(statement);
        let is_insert = statement.sql.starts_with("INSERT");
        RowsAffected {
            rows_affected: *self.rows_affected.lock(),
            last_affected_id: is_insert.then(|| self.next_id.fetch_add(1, Ordering::SeqCst)),
        }
    }
}

pub struct RecordingConnection(pub Arc<Recorder>);

#[async_trait]
impl Executor for RecordingConnection {
    fn dialect(&self) -> Dialect {
        self.0.dialect
    }

    async fn fetch(&self, statement: &Statement) -> Result<Vec<RowLabeled>> {
        Ok(self.0.fetch(statement))
    }

    async fn execute(&self, statement: &Statement) -> Result<RowsAffected> {
        Ok(self.0.execute(statement))
    }
}

#[async_trait]
impl Connection for RecordingConnection {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn Transaction>> {
        self.0.record(&Statement::new("BEGIN", Vec::new()));
        Ok(Box::new(RecordingTransaction(self.0.clone())))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

pub struct RecordingTransaction(pub Arc<Recorder>);

#[async_trait]
impl Executor for RecordingTransaction {
    fn dialect(&self) -> Dialect {
        self.0.dialect
    }

    async fn fetch(&self, statement: &Statement) -> Result<Vec<RowLabeled>> {
        Ok(self.0.fetch(statement))
    }

    async fn execute(&self, statement: &Statement) -> Result<RowsAffected> {
        Ok(self.0.execute(statement))
    }
}

#[async_trait]
impl Transaction for RecordingTransaction {
    async fn commit(self: Box<Self>) -> Result<()> {
        self.0.record(&Statement::new("COMMIT", Vec::new()));
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.0.record(&Statement::new("ROLLBACK", Vec::new()));
        Ok(())
    }
}

/// Driver opening recording connections, the url is the dialect name.
#[derive(Clone, Copy)]
pub struct RecordingDriver(pub Dialect);

#[async_trait]
impl Driver for RecordingDriver {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn dialect(&self) -> Dialect {
        self.0
    }

    fn url(&self, config: &Config) -> String {
        format!("recording://{}/{}", config.host, config.name)
    }

    async fn open(&self, _url: &str, _pool: &PoolConfig) -> Result<Arc<dyn Connection>> {
        Ok(Arc::new(RecordingConnection(Recorder::new(self.0))))
    }
}

pub fn database(dialect: Dialect) -> (Database, Arc<Recorder>) {
    let recorder = Recorder::new(dialect);
    let database = Database::new(
        Arc::new(RecordingConnection(recorder.clone())),
        Config::default(),
    );
    (database, recorder)
}
