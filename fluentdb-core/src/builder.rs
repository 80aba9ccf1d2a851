use crate::{
    Column, Condition, Database, DbError, Error, JoinItem, JoinType, Model, Operand, OrderByDir,
    OrderItem, Result, RowLabeled, RowsAffected, Statement, Table, Transaction, Value, WhereBuilder,
    WhereOpt, render, truncate_long,
};
use sea_query::SelectStatement;

/// Row picked by [`DBModel::get`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetOne {
    /// Ascending by primary key.
    First,
    /// Descending by primary key.
    Last,
    /// Random column, random direction.
    Take,
}

/// Fluent query builder.
///
/// Chained calls accumulate clauses, a terminal call (`first`, `find`, `create`, `update`,
/// `delete`, ...) renders and runs them, then clears everything but the open transaction. One
/// instance serves one query at a time, share the [`Database`] instead.
///
/// ```ignore
/// let mut users = Vec::new();
/// let total = db
///     .model()
///     .r#where("age", WhereOpt::GrEq, 18)
///     .order_by("name", OrderByDir::Asc)
///     .limit(10, 0)
///     .find::<User>(&mut users)
///     .await?;
/// ```
pub struct DBModel {
    pub(crate) db: Database,
    pub(crate) tx: Option<Box<dyn Transaction>>,
    /// Bound with [`DBModel::model`].
    pub(crate) model: Option<Table>,
    /// Failure raised while chaining, reported by the next terminal call.
    pub(crate) error: Option<Error>,
    pub(crate) raw: Option<Statement>,
    pub(crate) select: Vec<String>,
    pub(crate) omit: Vec<String>,
    pub(crate) conditions: WhereBuilder,
    pub(crate) joins: Vec<JoinItem>,
    pub(crate) group_by: Vec<String>,
    pub(crate) having: WhereBuilder,
    pub(crate) order_by: Vec<OrderItem>,
    /// (limit, offset)
    pub(crate) limit: Option<(u64, u64)>,
    /// (offset, fetch)
    pub(crate) fetch: Option<(u64, u64)>,
}

impl DBModel {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            tx: None,
            model: None,
            error: None,
            raw: None,
            select: Vec::new(),
            omit: Vec::new(),
            conditions: WhereBuilder::new(),
            joins: Vec::new(),
            group_by: Vec::new(),
            having: WhereBuilder::new(),
            order_by: Vec::new(),
            limit: None,
            fetch: None,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    /// Clears every clause, the transaction stays open.
    pub fn reset(&mut self) -> &mut Self {
        self.model = None;
        self.error = None;
        self.raw = None;
        self.select.clear();
        self.omit.clear();
        self.conditions.clear();
        self.joins.clear();
        self.group_by.clear();
        self.having.clear();
        self.order_by.clear();
        self.limit = None;
        self.fetch = None;
        self
    }

    /// Literal SQL used by the next terminal call instead of the generated one.
    pub fn raw(&mut self, sql: impl Into<String>, args: Vec<Value>) -> &mut Self {
        self.raw = Some(Statement::new(sql, args));
        self
    }

    /// Columns to read, or the only columns written by `create`.
    pub fn select<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Columns left out of reads and writes.
    pub fn omit<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.omit.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Binds a model instance, its non zero fields filter `find`.
    pub fn model<M: Model>(&mut self, model: &M) -> &mut Self {
        match model.describe_nested(0) {
            Ok(table) => self.model = Some(table),
            Err(e) => self.error = Some(e),
        }
        self
    }

    pub fn r#where(
        &mut self,
        field: impl Into<String>,
        opt: WhereOpt,
        value: impl Into<Operand>,
    ) -> &mut Self {
        self.conditions.r#where(field, opt, value);
        self
    }

    pub fn where_or(
        &mut self,
        field: impl Into<String>,
        opt: WhereOpt,
        value: impl Into<Operand>,
    ) -> &mut Self {
        self.conditions.where_or(field, opt, value);
        self
    }

    pub fn where_group(&mut self, build: impl FnOnce(&mut WhereBuilder)) -> &mut Self {
        self.conditions.where_group(build);
        self
    }

    pub fn where_or_group(&mut self, build: impl FnOnce(&mut WhereBuilder)) -> &mut Self {
        self.conditions.where_or_group(build);
        self
    }

    pub fn where_condition(&mut self, conditions: impl IntoIterator<Item = Condition>) -> &mut Self {
        self.conditions.where_condition(conditions);
        self
    }

    /// Appends the conditions built by `build` only when `condition` holds. They join the
    /// chain flat with their own connectors, wrap them with [`DBModel::where_group`] for a unit.
    pub fn when(&mut self, condition: bool, build: impl FnOnce(&mut WhereBuilder)) -> &mut Self {
        if condition {
            let mut conditions = WhereBuilder::new();
            build(&mut conditions);
            self.conditions.where_condition(conditions.take());
        }
        self
    }

    /// `table` may carry an alias: `"posts p"` or `"posts AS p"`.
    pub fn join(&mut self, join: JoinType, table: impl Into<String>, on: Condition) -> &mut Self {
        self.joins.push(JoinItem {
            join,
            table: table.into(),
            on,
        });
        self
    }

    pub fn group_by<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn having(
        &mut self,
        field: impl Into<String>,
        opt: WhereOpt,
        value: impl Into<Operand>,
    ) -> &mut Self {
        self.having.r#where(field, opt, value);
        self
    }

    pub fn order_by(&mut self, field: impl Into<String>, dir: OrderByDir) -> &mut Self {
        self.order_by.push(OrderItem {
            field: field.into(),
            dir,
        });
        self
    }

    /// A zero `limit` leaves the query unbounded.
    pub fn limit(&mut self, limit: u64, offset: u64) -> &mut Self {
        self.limit = (limit > 0).then_some((limit, offset));
        self
    }

    pub fn remove_limit(&mut self) -> Option<(u64, u64)> {
        self.limit.take()
    }

    /// `OFFSET offset ROWS FETCH NEXT fetch ROWS ONLY`, rendered as LIMIT/OFFSET and preferred over
    /// [`DBModel::limit`].
    pub fn fetch(&mut self, offset: u64, fetch: u64) -> &mut Self {
        self.fetch = (fetch > 0).then_some((offset, fetch));
        self
    }

    pub fn remove_fetch(&mut self) -> Option<(u64, u64)> {
        self.fetch.take()
    }

    /// Starts a transaction, every statement of this builder runs in it until commit or rollback.
    pub async fn begin(&mut self) -> Result<&mut Self> {
        if self.tx.is_some() {
            return Err(Error::msg("A transaction is already open on this builder"));
        }
        let tx = self
            .db
            .connection()
            .begin()
            .await
            .map_err(|e| driver_failure(e, "BEGIN"))?;
        self.tx = Some(tx);
        Ok(self)
    }

    /// Does nothing without an open transaction.
    pub async fn commit(&mut self) -> Result<()> {
        match self.tx.take() {
            Some(tx) => tx.commit().await.map_err(|e| driver_failure(e, "COMMIT")),
            None => Ok(()),
        }
    }

    /// Does nothing without an open transaction.
    pub async fn rollback(&mut self) -> Result<()> {
        match self.tx.take() {
            Some(tx) => tx.rollback().await.map_err(|e| driver_failure(e, "ROLLBACK")),
            None => Ok(()),
        }
    }

    pub(crate) fn dialect(&self) -> render::Dialect {
        match &self.tx {
            Some(tx) => tx.dialect(),
            None => self.db.connection().dialect(),
        }
    }

    /// Error left by a chained call.
    pub(crate) fn pending(&mut self) -> Result<()> {
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn log_statement(&self, statement: &Statement) {
        if self.db.config().debug {
            log::info!("SQL> {}", statement);
        } else {
            log::debug!("SQL> {}", statement);
        }
    }

    pub(crate) async fn fetch_rows(&self, statement: &Statement) -> Result<Vec<RowLabeled>> {
        self.log_statement(statement);
        let result = match &self.tx {
            Some(tx) => tx.fetch(statement).await,
            None => self.db.connection().fetch(statement).await,
        };
        result.map_err(|e| driver_failure(e, &statement.sql))
    }

    pub(crate) async fn execute(&self, statement: &Statement) -> Result<RowsAffected> {
        self.log_statement(statement);
        let result = match &self.tx {
            Some(tx) => tx.execute(statement).await,
            None => self.db.connection().execute(statement).await,
        };
        result.map_err(|e| driver_failure(e, &statement.sql))
    }

    /// First value of the first row, as a row count.
    pub(crate) async fn fetch_count(&self, statement: &Statement) -> Result<u64> {
        let rows = self.fetch_rows(statement).await?;
        match rows.into_iter().next().and_then(RowLabeled::into_first) {
            Some(Value::Null) | None => Ok(0),
            Some(value) if value.is_null() => Ok(0),
            Some(value) => crate::AsValue::try_from_value(value),
        }
    }

    /// Column list of a read: the explicit selection, else the columns of `table` not omitted.
    pub(crate) fn select_columns(&self, table: Option<&Table>) -> Vec<String> {
        if !self.select.is_empty() {
            return self.select.clone();
        }
        match table {
            Some(table) if !self.omit.is_empty() => table
                .sql_columns()
                .map(Column::name)
                .filter(|name| !self.omit.iter().any(|v| v == name))
                .map(String::from)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// SELECT with joins, WHERE, GROUP BY, HAVING and the explicit ORDER BY, no pagination.
    pub(crate) fn select_statement(
        &self,
        table: &Table,
        sources: &[&[Condition]],
    ) -> Result<SelectStatement> {
        let dialect = self.dialect();
        let mut select = render::select_from(table.name, &self.select_columns(Some(table)));
        for item in &self.joins {
            render::join(dialect, &mut select, item)?;
        }
        if let Some(cond) = render::and_sources(dialect, sources)? {
            select.cond_where(cond);
        }
        if !self.group_by.is_empty() {
            select.add_group_by(self.group_by.iter().map(|v| render::field_expr(v).into()));
        }
        if !self.having.is_empty() {
            select.cond_having(render::fold_conditions(dialect, self.having.conditions())?);
        }
        for item in &self.order_by {
            select.order_by_expr(render::field_expr(&item.field).into(), render::order(item.dir));
        }
        Ok(select)
    }

    pub(crate) fn paginate(&self, select: &mut SelectStatement) {
        if let Some((offset, fetch)) = self.fetch {
            select.limit(fetch).offset(offset);
        } else if let Some((limit, offset)) = self.limit {
            select.limit(limit);
            if offset > 0 {
                select.offset(offset);
            }
        }
    }
}

/// Wraps a driver failure, logging it with the statement that caused it.
pub(crate) fn driver_failure(error: Error, sql: &str) -> Error {
    log::error!("{:#}\n{}", error, truncate_long!(sql));
    Error::new(DbError::driver(error))
}

/// `pk = value` for every primary column holding a non zero value.
pub(crate) fn primary_conditions(table: &Table) -> Vec<Condition> {
    table
        .primary_columns()
        .filter(|c| !c.is_zero && !c.value.is_null())
        .map(|c| Condition::new(c.name(), WhereOpt::Eq, c.value.clone()))
        .collect()
}

/// `column = value` for every non zero data column, nothing when the model carries no data.
pub(crate) fn data_conditions(table: &Table) -> Vec<Condition> {
    if !table.has_data {
        return Vec::new();
    }
    table
        .columns
        .iter()
        .filter(|c| !c.is_not_data() && !c.is_zero && !c.def.is_primary())
        .map(|c| Condition::new(c.name(), WhereOpt::Eq, c.value.clone()))
        .collect()
}
