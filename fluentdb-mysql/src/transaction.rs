use crate::util::{execute_on, fetch_on, rows_affected};
use async_trait::async_trait;
use fluentdb_core::{Dialect, Executor, Result, RowLabeled, RowsAffected, Statement, Transaction};
use tokio::sync::Mutex;

/// Transaction owning one pooled connection, rolled back by `mysql_async` when dropped while open.
pub struct MySqlTransaction {
    transaction: Mutex<mysql_async::Transaction<'static>>,
}

impl MySqlTransaction {
    pub(crate) fn new(transaction: mysql_async::Transaction<'static>) -> Self {
        Self {
            transaction: Mutex::new(transaction),
        }
    }
}

#[async_trait]
impl Executor for MySqlTransaction {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    async fn fetch(&self, statement: &Statement) -> Result<Vec<RowLabeled>> {
        let mut transaction = self.transaction.lock().await;
        fetch_on(&mut *transaction, statement).await
    }

    async fn execute(&self, statement: &Statement) -> Result<RowsAffected> {
        let mut transaction = self.transaction.lock().await;
        execute_on(&mut *transaction, statement).await?;
        Ok(rows_affected(
            transaction.affected_rows(),
            transaction.last_insert_id(),
        ))
    }
}

#[async_trait]
impl Transaction for MySqlTransaction {
    async fn commit(self: Box<Self>) -> Result<()> {
        self.transaction.into_inner().commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.transaction.into_inner().rollback().await?;
        Ok(())
    }
}
