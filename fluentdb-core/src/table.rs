use crate::{AsValue, Column, ColumnDef, DbError, Result, RowLabeled, Value};
use std::collections::HashSet;

/// How deep `describe` follows relation fields.
pub const MAX_RELATION_DEPTH: usize = 4;

/// Marker field type carrying the `#[model(table = "...")]` override, it is never a column.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaData;

/// Descriptor of one model instance, built fresh for every operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: &'static str,
    pub columns: Vec<Column>,
    /// Indexes into `columns` of the primary key members.
    pub primaries: Vec<usize>,
    /// Index of the single primary column that is also serial.
    pub primary_serial: Option<usize>,
    pub relations: Vec<Table>,
    /// Any data column carries a non zero value.
    pub has_data: bool,
}

impl Table {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            columns: Vec::new(),
            primaries: Vec::new(),
            primary_serial: None,
            relations: Vec::new(),
            has_data: false,
        }
    }

    pub fn push(&mut self, column: Column) {
        let index = self.columns.len();
        if column.def.is_primary() {
            self.primaries.push(index);
        }
        if !column.is_not_data() && !column.is_zero {
            self.has_data = true;
        }
        self.columns.push(column);
    }

    /// Resolves `primary_serial` and validates the column set.
    pub fn finish(mut self) -> Result<Self> {
        if self.columns.iter().all(|c| c.def.is_relation()) {
            return Err(DbError::InvalidModel(format!(
                "`{}` does not map any column",
                self.name
            ))
            .into());
        }
        let mut seen = HashSet::new();
        if let Some(column) = self.columns.iter().find(|c| !seen.insert(c.name())) {
            return Err(DbError::InvalidModel(format!(
                "`{}` maps column `{}` more than once",
                self.name,
                column.name()
            ))
            .into());
        }
        let serials: Vec<usize> = self
            .primaries
            .iter()
            .copied()
            .filter(|i| self.columns[*i].def.serial)
            .collect();
        self.primary_serial = if serials.len() == 1 {
            Some(serials[0])
        } else {
            None
        };
        Ok(self)
    }

    pub fn primary_columns(&self) -> impl Iterator<Item = &Column> {
        self.primaries.iter().map(|i| &self.columns[*i])
    }

    /// Columns that exist in the database, relations excluded.
    pub fn sql_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.def.is_relation())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Column name to current value.
    pub fn values(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.columns.iter().map(|c| (c.name(), &c.value))
    }
}

/// A struct mapped to a table, implemented by `#[derive(Model)]`.
pub trait Model: Default + Send + Sync {
    fn table_name() -> &'static str;
    /// Mapped fields in declaration order, relations included.
    fn column_defs() -> &'static [ColumnDef];
    /// Describe this instance following relations up to `depth` levels.
    fn describe_nested(&self, depth: usize) -> Result<Table>;
    /// Assign `value` to the field named `field` (either the Rust field name or the column name).
    fn set_field(&mut self, field: &str, value: Value) -> Result<()>;

    fn describe(&self) -> Result<Table> {
        self.describe_nested(MAX_RELATION_DEPTH)
    }

    fn primary_defs() -> Vec<&'static ColumnDef> {
        Self::column_defs()
            .iter()
            .filter(|c| c.is_primary())
            .collect()
    }

    fn column_def(field: &str) -> Option<&'static ColumnDef> {
        Self::column_defs()
            .iter()
            .find(|c| c.key == field || c.name == field)
    }

    /// Assign the labeled values of `row` to the matching columns, unknown labels are ignored.
    fn apply_row(&mut self, row: RowLabeled) -> Result<()> {
        for (label, value) in row.labels.iter().zip(row.values.into_vec()) {
            let Some(def) = Self::column_defs()
                .iter()
                .find(|c| c.name == label.as_str() && !c.is_relation())
            else {
                continue;
            };
            self.set_field(def.key, value)?;
        }
        Ok(())
    }

    fn from_row(row: RowLabeled) -> Result<Self> {
        let mut result = Self::default();
        result.apply_row(row)?;
        Ok(result)
    }
}

/// Fields that can be followed as a relation: a model, or a collection of models.
pub trait Relation {
    fn describe_relation(&self, depth: usize, out: &mut Vec<Table>) -> Result<()>;
}

impl<R: Relation> Relation for Vec<R> {
    fn describe_relation(&self, depth: usize, out: &mut Vec<Table>) -> Result<()> {
        for item in self {
            item.describe_relation(depth, out)?;
        }
        Ok(())
    }
}

impl<R: Relation> Relation for Option<R> {
    fn describe_relation(&self, depth: usize, out: &mut Vec<Table>) -> Result<()> {
        match self {
            Some(v) => v.describe_relation(depth, out),
            None => Ok(()),
        }
    }
}

impl<R: Relation> Relation for Box<R> {
    fn describe_relation(&self, depth: usize, out: &mut Vec<Table>) -> Result<()> {
        R::describe_relation(self, depth, out)
    }
}

/// Value and zero state of a field, used by the generated `describe_nested`.
pub fn field_value<T: AsValue + Clone>(field: &T) -> (Value, bool) {
    (field.clone().as_value(), field.is_zero())
}

/// Error for a field that could not receive a value.
pub fn unsupported_field(
    model: &'static str,
    field: &str,
    source: crate::Error,
) -> crate::Error {
    DbError::UnsupportedFieldType {
        model,
        field: field.to_owned(),
        source: source.into(),
    }
    .into()
}
