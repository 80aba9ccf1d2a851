use crate::ValueWrap;
use fluentdb_core::{RowLabeled, RowNames, Value};
use mysql_async::FromRowError;

pub(crate) struct RowWrap(pub(crate) RowLabeled);

impl mysql_async::prelude::FromRow for RowWrap {
    fn from_row_opt(mut row: mysql_async::Row) -> Result<Self, FromRowError>
    where
        Self: Sized,
    {
        let names: RowNames = row
            .columns_ref()
            .iter()
            .map(|v| v.name_str().into_owned())
            .collect();
        let values: Result<fluentdb_core::Row, _> = (0..row.len())
            .map(|i| {
                row.take_opt::<ValueWrap, _>(i)
                    .unwrap_or(Ok(ValueWrap(Value::Null)))
                    .map(|v| v.0)
            })
            .collect();
        match values {
            Ok(values) => Ok(RowWrap(RowLabeled::new(names, values))),
            Err(..) => Err(FromRowError(row)),
        }
    }
}
