use crate::{
    DBModel, DbError, GetOne, Model, OrderByDir, Result, Statement,
    builder::{data_conditions, primary_conditions},
    render,
};
use rand::{Rng, rngs::OsRng};

impl DBModel {
    /// Reads the row with the lowest primary key into `model`.
    ///
    /// Non zero primary keys and non zero fields of `model` filter the read, together with the
    /// chained conditions.
    pub async fn first<M: Model>(&mut self, model: &mut M) -> Result<()> {
        self.get(model, GetOne::First).await
    }

    /// Reads the row with the highest primary key into `model`.
    pub async fn last<M: Model>(&mut self, model: &mut M) -> Result<()> {
        self.get(model, GetOne::Last).await
    }

    /// Reads one row in no particular order into `model`.
    pub async fn take<M: Model>(&mut self, model: &mut M) -> Result<()> {
        self.get(model, GetOne::Take).await
    }

    /// Reads a single row into `model`, failing with [`DbError::NotFound`] when nothing matches.
    pub async fn get<M: Model>(&mut self, model: &mut M, get: GetOne) -> Result<()> {
        let result = self.get_one(model, get).await;
        self.reset();
        result
    }

    async fn get_one<M: Model>(&mut self, model: &mut M, get: GetOne) -> Result<()> {
        self.pending()?;
        let statement = match &self.raw {
            Some(raw) => raw.clone(),
            None => {
                let table = model.describe_nested(0)?;
                let mut select = self.select_statement(
                    &table,
                    &[
                        &primary_conditions(&table),
                        self.conditions.conditions(),
                        &data_conditions(&table),
                    ],
                )?;
                let fallback = table
                    .primary_columns()
                    .next()
                    .or_else(|| table.sql_columns().next());
                let order = match get {
                    GetOne::First => fallback.map(|c| (c.name(), OrderByDir::Asc)),
                    GetOne::Last => fallback.map(|c| (c.name(), OrderByDir::Desc)),
                    GetOne::Take => {
                        let columns: Vec<_> = table.sql_columns().collect();
                        if columns.is_empty() {
                            None
                        } else {
                            let column = columns[OsRng.gen_range(0..columns.len())];
                            let dir = if OsRng.gen_bool(0.5) {
                                OrderByDir::Asc
                            } else {
                                OrderByDir::Desc
                            };
                            Some((column.name(), dir))
                        }
                    }
                };
                if let Some((field, dir)) = order {
                    select.order_by_expr(render::field_expr(field).into(), render::order(dir));
                }
                self.paginate(&mut select);
                select.limit(1);
                self.dialect().build(&select)?
            }
        };
        let row = self
            .fetch_rows(&statement)
            .await?
            .into_iter()
            .next()
            .ok_or(DbError::NotFound)?;
        model.apply_row(row)
    }

    /// Replaces `models` with the matching rows and returns the number of rows matching the
    /// conditions regardless of LIMIT and FETCH.
    ///
    /// Only a model bound with [`DBModel::model`] adds field filters, `find` has no implicit order.
    pub async fn find<M: Model>(&mut self, models: &mut Vec<M>) -> Result<u64> {
        let result = self.find_all(models).await;
        self.reset();
        result
    }

    async fn find_all<M: Model>(&mut self, models: &mut Vec<M>) -> Result<u64> {
        self.pending()?;
        let (statement, count) = match &self.raw {
            Some(raw) => (
                raw.clone(),
                Statement::new(
                    format!("SELECT COUNT(*) AS total FROM ({}) AS _result_out_", raw.sql),
                    raw.values.clone(),
                ),
            ),
            None => {
                let table = M::default().describe_nested(0)?;
                let filters = self
                    .model
                    .as_ref()
                    .map(data_conditions)
                    .unwrap_or_default();
                let mut select =
                    self.select_statement(&table, &[self.conditions.conditions(), &filters])?;
                let dialect = self.dialect();
                let count = dialect.build(&render::count_of(select.clone()))?;
                self.paginate(&mut select);
                (dialect.build(&select)?, count)
            }
        };
        *models = self
            .fetch_rows(&statement)
            .await?
            .into_iter()
            .map(M::from_row)
            .collect::<Result<_>>()?;
        self.fetch_count(&count).await
    }

    /// Number of rows matching the chained conditions, over the table of `M`.
    pub async fn count<M: Model>(&mut self) -> Result<u64> {
        let result = self.count_rows::<M>().await;
        self.reset();
        result
    }

    async fn count_rows<M: Model>(&mut self) -> Result<u64> {
        self.pending()?;
        let table = M::default().describe_nested(0)?;
        let select = self.select_statement(&table, &[self.conditions.conditions()])?;
        let statement = self.dialect().build(&render::count_of(select))?;
        self.fetch_count(&statement).await
    }
}
