use crate::{
    Condition, DBModel, Database, Model, Operand, OrderByDir, Result, Value, WhereOpt,
    is_not_found,
};
use std::collections::BTreeMap;

/// Column to value, every entry becomes an equality condition.
pub type Filter = BTreeMap<String, Value>;

/// Sort keys a caller may ask for.
#[derive(Debug, Clone, Copy)]
pub enum AcceptedOrders<'a> {
    /// Keys used as column names.
    List(&'a [&'a str]),
    /// Public key to column name.
    Map(&'a BTreeMap<String, String>),
}

fn log_failure(error: &crate::Error) {
    if !is_not_found(error) {
        log::error!("{:#}", error);
    }
}

pub async fn get_model_by_id<M: Model>(db: &Database, id: impl Into<Operand>) -> Result<M> {
    get_model_by(db, "id", id).await
}

pub async fn get_model_by<M: Model>(
    db: &Database,
    field: &str,
    value: impl Into<Operand>,
) -> Result<M> {
    get_model_where_eq(db, field, value).await
}

pub async fn get_model_where_eq<M: Model>(
    db: &Database,
    field: &str,
    value: impl Into<Operand>,
) -> Result<M> {
    get_model(db, [Condition::new(field, WhereOpt::Eq, value)]).await
}

/// First row matching `conditions`, by primary key.
pub async fn get_model<M: Model>(
    db: &Database,
    conditions: impl IntoIterator<Item = Condition>,
) -> Result<M> {
    let mut model = M::default();
    db.model()
        .where_condition(conditions)
        .first(&mut model)
        .await
        .inspect_err(log_failure)?;
    Ok(model)
}

/// One page of rows matching `conditions` and the total number of matching rows.
///
/// `page` starts at 1, page 0 is read as the first one.
pub async fn find_models<M: Model>(
    db: &Database,
    page: u64,
    limit: u64,
    sort_field: &str,
    sort_dir: OrderByDir,
    conditions: impl IntoIterator<Item = Condition>,
) -> Result<(Vec<M>, u64)> {
    let offset = if page > 0 { (page - 1) * limit } else { 0 };
    let mut models = Vec::new();
    let mut builder = db.model();
    builder.where_condition(conditions);
    if !sort_field.is_empty() {
        builder.order_by(sort_field, sort_dir);
    }
    let total = builder
        .limit(limit, offset)
        .find(&mut models)
        .await
        .inspect_err(log_failure)?;
    Ok((models, total))
}

/// Commits when `result` is a success, rolls back otherwise.
async fn settle<T>(mut builder: DBModel, result: Result<T>) -> Result<T> {
    match result {
        Ok(value) => {
            builder.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = builder.rollback().await {
                log::error!("{:#}", rollback);
            }
            Err(e)
        }
    }
}

/// Inserts `model` in its own transaction.
pub async fn create_model<M: Model>(db: &Database, model: &mut M) -> Result<()> {
    let mut builder = db.model();
    builder.begin().await?;
    let result = builder.create(model).await;
    settle(builder, result).await
}

/// Updates `model` in its own transaction.
pub async fn update_model<M: Model>(db: &Database, model: &mut M) -> Result<u64> {
    let mut builder = db.model();
    builder.begin().await?;
    let result = builder.update(model).await;
    settle(builder, result).await
}

/// Deletes `model` in its own transaction.
pub async fn delete_model<M: Model>(db: &Database, model: &M) -> Result<u64> {
    let mut builder = db.model();
    builder.begin().await?;
    let result = builder.delete(model).await;
    settle(builder, result).await
}

fn filtered(builder: &mut DBModel, field: &str, value: Value, filters: &[Filter]) {
    builder.r#where(field, WhereOpt::Eq, value);
    for (column, value) in filters.iter().flatten() {
        builder.r#where(column.as_str(), WhereOpt::Eq, value.clone());
    }
}

/// Reads into `model` the first row where `field = value` and every filter matches.
pub async fn get_model_filtered<M: Model>(
    db: &Database,
    model: &mut M,
    field: &str,
    value: impl Into<Value>,
    filters: &[Filter],
) -> Result<()> {
    let mut builder = db.model();
    filtered(&mut builder, field, value.into(), filters);
    builder.first(model).await.inspect_err(log_failure)
}

/// One page of rows where `field = value` and every filter matches, with the total.
pub async fn list_models<M: Model>(
    db: &Database,
    page: u64,
    limit: u64,
    field: &str,
    value: impl Into<Value>,
    filters: &[Filter],
) -> Result<(Vec<M>, u64)> {
    let offset = if page > 0 { (page - 1) * limit } else { 0 };
    let mut builder = db.model();
    filtered(&mut builder, field, value.into(), filters);
    let mut models = Vec::new();
    let total = builder
        .limit(limit, offset)
        .find(&mut models)
        .await
        .inspect_err(log_failure)?;
    Ok((models, total))
}

/// Adds the ORDER BY asked by a caller: `"name"` or `"-name"` for descending.
///
/// Keys outside `accepted` are dropped, `default` (key, direction) applies when no key survives.
pub fn process_order_by(
    builder: &mut DBModel,
    order_by: &str,
    accepted: AcceptedOrders<'_>,
    default: Option<(&str, OrderByDir)>,
) {
    let (key, mut dir) = match order_by.strip_prefix('-') {
        Some(key) => (key, OrderByDir::Desc),
        None => (order_by, OrderByDir::Asc),
    };
    let mut column = match accepted {
        _ if key.is_empty() => None,
        AcceptedOrders::List(list) => list.contains(&key).then(|| key.to_string()),
        AcceptedOrders::Map(map) => map.get(key).cloned(),
    };
    if column.is_none() {
        if let Some((key, default_dir)) = default {
            column = Some(key.to_string());
            dir = default_dir;
        }
    }
    if let Some(column) = column.filter(|v| !v.is_empty()) {
        builder.order_by(column, dir);
    }
}
