use thiserror::Error;

/// Failures raised by fluentdb itself.
///
/// Operations return `anyhow::Result`, these are found with `err.downcast_ref::<DbError>()`.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("invalid model: {0}")]
    InvalidModel(String),
    #[error("missing WHERE condition, refusing to touch the whole table")]
    MissingWhereCondition,
    #[error("no rows in result set")]
    NotFound,
    #[error("driver error")]
    Driver(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error("cannot assign to field `{field}` of `{model}`")]
    UnsupportedFieldType {
        model: &'static str,
        field: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl DbError {
    /// Wraps a driver failure keeping the whole chain as source.
    pub fn driver(error: anyhow::Error) -> Self {
        DbError::Driver(error.into())
    }
}

pub fn is_not_found(error: &anyhow::Error) -> bool {
    matches!(error.downcast_ref::<DbError>(), Some(DbError::NotFound))
}

pub fn is_missing_where(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<DbError>(),
        Some(DbError::MissingWhereCondition)
    )
}
