use crate::{
    Condition, DBModel, DbError, Error, Model, Result, Table, Value, WhereOpt,
    builder::primary_conditions, render,
};
use anyhow::Context;
use sea_query::{Alias, Query, SimpleExpr};
use std::collections::BTreeMap;

/// Field name (or column name) to value, for partial writes.
pub type Fields = BTreeMap<String, Value>;

/// What a write receives, chosen by the method called.
pub enum Record<'a, M: Model> {
    One(&'a mut M),
    /// Best effort: rows already written stay written when a later one fails.
    Batch(&'a mut [M]),
    /// The non null entries are assigned to the model before writing it.
    Keyed(&'a mut M, Fields),
}

impl DBModel {
    /// Inserts `model`, a single primary key generated by the database is written back into it.
    pub async fn create<M: Model>(&mut self, model: &mut M) -> Result<()> {
        self.write(Record::One(model)).await.map(|_| ())
    }

    /// Inserts every model and returns how many were created.
    pub async fn create_batch<M: Model>(&mut self, models: &mut [M]) -> Result<u64> {
        self.write(Record::Batch(models)).await
    }

    /// Assigns `fields` to `model`, then inserts it.
    pub async fn create_keyed<M: Model>(&mut self, model: &mut M, fields: Fields) -> Result<()> {
        self.write(Record::Keyed(model, fields)).await.map(|_| ())
    }

    /// Runs the insert described by `record`.
    pub async fn write<M: Model>(&mut self, record: Record<'_, M>) -> Result<u64> {
        let result = self.insert(record).await;
        self.reset();
        result
    }

    async fn insert<M: Model>(&mut self, record: Record<'_, M>) -> Result<u64> {
        self.pending()?;
        match record {
            Record::One(model) => self.insert_one(model).await.map(|_| 1),
            Record::Keyed(model, fields) => {
                assign(model, fields)?;
                self.insert_one(model).await.map(|_| 1)
            }
            Record::Batch(models) => {
                let total = models.len();
                let mut created = 0;
                let mut first_error = None;
                for model in models.iter_mut() {
                    match self.insert_one(model).await {
                        Ok(..) => created += 1,
                        Err(e) => {
                            log::error!("{:#}", e);
                            first_error.get_or_insert(e);
                        }
                    }
                }
                match first_error {
                    Some(e) => Err(e.context(format!(
                        "{} of {} rows of `{}` could not be created",
                        total - created,
                        total,
                        M::table_name()
                    ))),
                    None => Ok(created as u64),
                }
            }
        }
    }

    async fn insert_one<M: Model>(&self, model: &mut M) -> Result<()> {
        let table = model.describe_nested(0)?;
        let statement = match &self.raw {
            Some(raw) => raw.clone(),
            None => {
                let columns: Vec<_> = table
                    .sql_columns()
                    .filter(|c| !c.is_not_data() && !(c.def.is_primary() && c.def.serial))
                    .filter(|c| self.select.is_empty() || self.select.iter().any(|v| v == c.name()))
                    .filter(|c| !self.omit.iter().any(|v| v == c.name()))
                    .collect();
                let mut insert = Query::insert();
                insert.into_table(Alias::new(table.name));
                if columns.is_empty() {
                    insert.or_default_values();
                } else {
                    insert.columns(columns.iter().map(|c| Alias::new(c.name())));
                    let values = columns
                        .iter()
                        .map(|c| render::to_sea_value(c.value.clone()).map(SimpleExpr::Value))
                        .collect::<Result<Vec<_>>>()?;
                    insert.values(values)?;
                }
                if let [primary] = table.primaries.as_slice() {
                    if self.dialect().supports_returning() {
                        insert.returning_col(Alias::new(table.columns[*primary].name()));
                    }
                }
                self.dialect().build(&insert)?
            }
        };
        let [primary] = table.primaries.as_slice() else {
            self.execute(&statement).await?;
            return Ok(());
        };
        let key = table.columns[*primary].key();
        if self.dialect().supports_returning() {
            let mut statement = statement;
            if self.raw.is_some() {
                statement.sql = format!(
                    "{} RETURNING {}",
                    statement.sql.trim_end().trim_end_matches(';'),
                    table.columns[*primary].name()
                );
            }
            let rows = self.fetch_rows(&statement).await?;
            if let Some(id) = rows.into_iter().next().and_then(|v| v.into_first()) {
                model
                    .set_field(key, id)
                    .with_context(|| format!("While reading back the key of `{}`", table.name))?;
            }
        } else {
            let result = self.execute(&statement).await?;
            if let Some(id) = result.last_affected_id.filter(|_| table.primary_serial.is_some()) {
                model
                    .set_field(key, Value::Int64(Some(id)))
                    .with_context(|| format!("While reading back the key of `{}`", table.name))?;
            }
        }
        Ok(())
    }

    /// Updates the row of `model`, returns the number of affected rows.
    ///
    /// The WHERE clause is the non zero primary keys of `model` AND the chained conditions, an
    /// update without any fails with [`DbError::MissingWhereCondition`] before reaching the database.
    pub async fn update<M: Model>(&mut self, model: &mut M) -> Result<u64> {
        self.modify(Record::One(model)).await
    }

    /// Assigns `fields` to `model`, then updates it.
    pub async fn update_keyed<M: Model>(&mut self, model: &mut M, fields: Fields) -> Result<u64> {
        self.modify(Record::Keyed(model, fields)).await
    }

    /// Runs the update described by `record`.
    pub async fn modify<M: Model>(&mut self, record: Record<'_, M>) -> Result<u64> {
        let result = self.update_record(record).await;
        self.reset();
        result
    }

    async fn update_record<M: Model>(&mut self, record: Record<'_, M>) -> Result<u64> {
        self.pending()?;
        match record {
            Record::One(model) => self.update_one(model).await,
            Record::Keyed(model, fields) => {
                assign(model, fields)?;
                self.update_one(model).await
            }
            Record::Batch(..) => Err(DbError::InvalidModel(format!(
                "`{}` cannot be updated in batch",
                M::table_name()
            ))
            .into()),
        }
    }

    async fn update_one<M: Model>(&self, model: &M) -> Result<u64> {
        let statement = match &self.raw {
            Some(raw) => raw.clone(),
            None => {
                let table = model.describe_nested(0)?;
                let cond = self.mutation_filter(&table, primary_conditions(&table))?;
                let values = table
                    .sql_columns()
                    .filter(|c| !c.is_not_data() && !c.def.is_primary())
                    .filter(|c| self.select.is_empty() || self.select.iter().any(|v| v == c.name()))
                    .filter(|c| !self.omit.iter().any(|v| v == c.name()))
                    .map(|c| {
                        render::to_sea_value(c.value.clone())
                            .map(|v| (Alias::new(c.name()), SimpleExpr::Value(v)))
                    })
                    .collect::<Result<Vec<_>>>()?;
                if values.is_empty() {
                    return Err(DbError::InvalidModel(format!(
                        "`{}` has no column to update",
                        table.name
                    ))
                    .into());
                }
                let mut update = Query::update();
                update
                    .table(Alias::new(table.name))
                    .values(values)
                    .cond_where(cond);
                self.dialect().build(&update)?
            }
        };
        Ok(self.execute(&statement).await?.rows_affected)
    }

    /// Deletes the row of `model`, returns the number of affected rows.
    ///
    /// Same WHERE rule as [`DBModel::update`].
    pub async fn delete<M: Model>(&mut self, model: &M) -> Result<u64> {
        let result = self.delete_one(model, None).await;
        self.reset();
        result
    }

    /// Deletes by the first primary column: a [`Value::List`] key matches any of its items.
    pub async fn delete_by_key<M: Model>(&mut self, model: &M, key: impl Into<Value>) -> Result<u64> {
        let result = self.delete_one(model, Some(key.into())).await;
        self.reset();
        result
    }

    async fn delete_one<M: Model>(&mut self, model: &M, key: Option<Value>) -> Result<u64> {
        self.pending()?;
        let table = model.describe_nested(0)?;
        let primaries = match key {
            None => primary_conditions(&table),
            Some(key) => {
                let Some(primary) = table.primary_columns().next() else {
                    return Err(DbError::InvalidModel(format!(
                        "`{}` has no primary key",
                        table.name
                    ))
                    .into());
                };
                let opt = if matches!(key, Value::List(..)) {
                    WhereOpt::In
                } else {
                    WhereOpt::Eq
                };
                vec![Condition::new(primary.name(), opt, key)]
            }
        };
        self.delete_where(&table, primaries).await
    }

    async fn delete_where(&self, table: &Table, primaries: Vec<Condition>) -> Result<u64> {
        let statement = match &self.raw {
            Some(raw) => raw.clone(),
            None => {
                let cond = self.mutation_filter(table, primaries)?;
                let mut delete = Query::delete();
                delete.from_table(Alias::new(table.name)).cond_where(cond);
                self.dialect().build(&delete)?
            }
        };
        Ok(self.execute(&statement).await?.rows_affected)
    }

    /// Primary key conditions AND chained conditions, never empty.
    fn mutation_filter(&self, table: &Table, primaries: Vec<Condition>) -> Result<sea_query::Condition> {
        render::and_sources(self.dialect(), &[&primaries, self.conditions.conditions()])?.ok_or_else(|| {
            log::warn!("Refusing to modify `{}` without a WHERE condition", table.name);
            Error::new(DbError::MissingWhereCondition)
        })
    }

    /// Executes the statement set with [`DBModel::raw`], returns the number of affected rows.
    pub async fn exec(&mut self) -> Result<u64> {
        let result = self.exec_raw().await;
        self.reset();
        result
    }

    async fn exec_raw(&mut self) -> Result<u64> {
        self.pending()?;
        let Some(raw) = &self.raw else {
            return Err(Error::msg("Nothing to execute, call `raw` first"));
        };
        Ok(self.execute(raw).await?.rows_affected)
    }
}

fn assign<M: Model>(model: &mut M, fields: Fields) -> Result<()> {
    for (field, value) in fields.into_iter().filter(|(_, v)| !v.is_null()) {
        if M::column_def(&field).is_none() {
            return Err(DbError::InvalidModel(format!(
                "`{}` has no field `{}`",
                M::table_name(),
                field
            ))
            .into());
        }
        model.set_field(&field, value)?;
    }
    Ok(())
}
