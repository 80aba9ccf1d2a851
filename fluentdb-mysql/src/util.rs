use crate::{RowWrap, ValueWrap};
use fluentdb_core::{Result, RowLabeled, RowsAffected, Statement};
use mysql_async::{Params, prelude::Queryable};

pub(crate) fn params(statement: &Statement) -> Result<Params> {
    if statement.values.is_empty() {
        return Ok(Params::Empty);
    }
    Ok(Params::Positional(
        statement
            .values
            .iter()
            .cloned()
            .map(|v| mysql_async::Value::try_from(ValueWrap(v)))
            .collect::<Result<_>>()?,
    ))
}

/// Statements without arguments go through the text protocol, the others are prepared.
pub(crate) async fn fetch_on<Q: Queryable>(
    queryable: &mut Q,
    statement: &Statement,
) -> Result<Vec<RowLabeled>> {
    let rows: Vec<RowWrap> = match params(statement)? {
        Params::Empty => queryable.query(statement.sql.as_str()).await?,
        params => queryable.exec(statement.sql.as_str(), params).await?,
    };
    Ok(rows.into_iter().map(|row| row.0).collect())
}

pub(crate) async fn execute_on<Q: Queryable>(
    queryable: &mut Q,
    statement: &Statement,
) -> Result<()> {
    match params(statement)? {
        Params::Empty => queryable.query_drop(statement.sql.as_str()).await?,
        params => queryable.exec_drop(statement.sql.as_str(), params).await?,
    }
    Ok(())
}

pub(crate) fn rows_affected(affected: u64, last_insert_id: Option<u64>) -> RowsAffected {
    RowsAffected {
        rows_affected: affected,
        last_affected_id: last_insert_id.map(|v| v as i64),
    }
}
