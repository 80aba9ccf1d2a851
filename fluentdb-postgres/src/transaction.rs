use crate::util::{execute_on, fetch_on};
use async_trait::async_trait;
use deadpool_postgres::Object;
use fluentdb_core::{
    Dialect, Error, Executor, Result, RowLabeled, RowsAffected, Statement, Transaction,
};

/// Transaction pinned to one pooled client.
///
/// When dropped before `commit` or `rollback` the client is detached from the pool and closed, the
/// server then rolls the transaction back.
pub struct PostgresTransaction {
    client: Option<Object>,
}

impl PostgresTransaction {
    pub(crate) async fn begin(client: Object) -> Result<Self> {
        client.batch_execute("BEGIN").await?;
        Ok(Self {
            client: Some(client),
        })
    }

    fn client(&self) -> Result<&Object> {
        self.client
            .as_ref()
            .ok_or_else(|| Error::msg("The transaction is already closed"))
    }

    async fn finish(&mut self, sql: &str) -> Result<()> {
        let client = self
            .client
            .take()
            .ok_or_else(|| Error::msg("The transaction is already closed"))?;
        if let Err(e) = client.batch_execute(sql).await {
            drop(Object::take(client));
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl Executor for PostgresTransaction {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn fetch(&self, statement: &Statement) -> Result<Vec<RowLabeled>> {
        fetch_on(self.client()?, statement).await
    }

    async fn execute(&self, statement: &Statement) -> Result<RowsAffected> {
        execute_on(self.client()?, statement).await
    }
}

#[async_trait]
impl Transaction for PostgresTransaction {
    async fn commit(mut self: Box<Self>) -> Result<()> {
        self.finish("COMMIT").await
    }

    async fn rollback(mut self: Box<Self>) -> Result<()> {
        self.finish("ROLLBACK").await
    }
}

impl Drop for PostgresTransaction {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            log::warn!("Transaction dropped while still open, its connection is discarded");
            drop(Object::take(client));
        }
    }
}
