use crate::Value;
use proc_macro2::TokenStream;
use quote::{ToTokens, TokenStreamExt, quote};

/// Target of a foreign key.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRef {
    /// Column name.
    pub name: &'static str,
    /// Table name.
    pub table: &'static str,
}

/// Indicates how (or if) a column participates in the primary key.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryKeyType {
    /// Single-column primary key.
    PrimaryKey,
    /// Member of a composite primary key.
    PartOfPrimaryKey,
    /// Not part of the primary key.
    #[default]
    None,
}

impl ToTokens for PrimaryKeyType {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        use PrimaryKeyType::*;
        tokens.append_all(match self {
            PrimaryKey => quote!(::fluentdb::PrimaryKeyType::PrimaryKey),
            PartOfPrimaryKey => quote!(::fluentdb::PrimaryKeyType::PartOfPrimaryKey),
            None => quote!(::fluentdb::PrimaryKeyType::None),
        });
    }
}

/// Referential action for foreign key updates / deletes.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// No special action.
    #[default]
    NoAction,
    /// Propagate delete/update.
    Cascade,
}

impl ToTokens for Action {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.append_all(match self {
            Action::NoAction => quote! { ::fluentdb::Action::NoAction },
            Action::Cascade => quote! { ::fluentdb::Action::Cascade },
        });
    }
}

/// Static description of a mapped field, produced once per model type by `#[derive(Model)]`.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    /// Rust field name.
    pub key: &'static str,
    /// Column name.
    pub name: &'static str,
    /// Declared SQL type, upper case tokens each followed by a space (`"SERIAL PRIMARY KEY "`).
    pub column_type: &'static str,
    pub primary_key: PrimaryKeyType,
    /// Generated by the database (auto increment).
    pub serial: bool,
    /// Foreign key target.
    pub references: Option<ColumnRef>,
    pub on_delete: Option<Action>,
    pub on_update: Option<Action>,
    /// Name of the related model when the field is a relation, these never map to SQL columns.
    pub relation: Option<&'static str>,
}

impl ColumnDef {
    pub fn is_primary(&self) -> bool {
        self.primary_key != PrimaryKeyType::None
    }
    pub fn is_relation(&self) -> bool {
        self.relation.is_some()
    }
    /// `REFERENCES users (id) ON DELETE CASCADE `, empty when the column is not a foreign key.
    pub fn reference_clause(&self) -> String {
        let Some(reference) = self.references else {
            return String::new();
        };
        let mut result = format!("REFERENCES {} ({}) ", reference.table, reference.name);
        if self.on_delete == Some(Action::Cascade) {
            result.push_str("ON DELETE CASCADE ");
        }
        if self.on_update == Some(Action::Cascade) {
            result.push_str("ON UPDATE CASCADE ");
        }
        result
    }
}

/// A column of a described model instance: the static definition plus the current field value.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub def: &'static ColumnDef,
    /// Current value, a typed null when the field carries no usable value.
    pub value: Value,
    pub is_zero: bool,
    /// Serial columns only count when they hold a non zero integer.
    pub has_value: bool,
}

impl Column {
    pub fn new(def: &'static ColumnDef, value: Value, is_zero: bool) -> Self {
        let has_value = !def.serial || (value.is_integer() && !value.is_null() && !is_zero);
        Self {
            def,
            value: if has_value { value } else { value.as_null() },
            is_zero: is_zero || !has_value,
            has_value,
        }
    }
    /// Placeholder for a relation field.
    pub fn relation(def: &'static ColumnDef) -> Self {
        Self {
            def,
            value: Value::Null,
            is_zero: true,
            has_value: false,
        }
    }
    pub fn name(&self) -> &'static str {
        self.def.name
    }
    pub fn key(&self) -> &'static str {
        self.def.key
    }
    /// Columns never written by INSERT or UPDATE.
    pub fn is_not_data(&self) -> bool {
        !self.has_value || self.def.relation.is_some() || self.def.references.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static ID: ColumnDef = ColumnDef {
        key: "id",
        name: "id",
        column_type: "SERIAL PRIMARY KEY ",
        primary_key: PrimaryKeyType::PrimaryKey,
        serial: true,
        references: None,
        on_delete: None,
        on_update: None,
        relation: None,
    };

    static USER_ID: ColumnDef = ColumnDef {
        key: "user_id",
        name: "user_id",
        column_type: "INTEGER ",
        primary_key: PrimaryKeyType::None,
        serial: false,
        references: Some(ColumnRef {
            name: "id",
            table: "user",
        }),
        on_delete: Some(Action::Cascade),
        on_update: None,
        relation: None,
    };

    #[test]
    fn serial_without_value() {
        let column = Column::new(&ID, Value::Int64(Some(0)), true);
        assert!(!column.has_value);
        assert!(column.is_not_data());
        assert_eq!(column.value, Value::Int64(None));
        let column = Column::new(&ID, Value::Int64(Some(12)), false);
        assert!(column.has_value);
        assert!(!column.is_not_data());
        let column = Column::new(&ID, Value::Int64(None), true);
        assert!(!column.has_value);
    }

    #[test]
    fn serial_requires_integer() {
        let column = Column::new(&ID, Value::Varchar(Some("12".into())), false);
        assert!(!column.has_value);
    }

    #[test]
    fn reference_clause() {
        assert_eq!(
            USER_ID.reference_clause(),
            "REFERENCES user (id) ON DELETE CASCADE "
        );
        assert_eq!(ID.reference_clause(), "");
        let column = Column::new(&USER_ID, Value::Int32(Some(3)), false);
        assert!(column.has_value);
        assert!(column.is_not_data());
    }
}
