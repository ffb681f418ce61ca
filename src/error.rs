//! Error type shared by the life-table and decomposition pipelines

use thiserror::Error;

/// Errors raised while building life tables or decomposing gaps
///
/// Division by zero (`e = T / l`, cause shares with no net change) is not an
/// error: those cells carry `f64::NAN` so a consumer can detect them downstream.
#[derive(Debug, Error)]
pub enum LifeTableError {
    /// A required column is absent from the input
    #[error("missing column `{column}` in {context}")]
    Schema { column: String, context: String },

    /// A keyed join did not have the expected cardinality
    #[error("{stage} join is not one-to-one for key {key}")]
    JoinCardinality { stage: &'static str, key: String },

    /// Strict mode: the same age appears twice within one group
    #[error("duplicate age {age} in group {group}")]
    DuplicateAge { group: String, age: u32 },

    /// Strict mode: a non-terminal mortality value is outside [0, 1]
    #[error("mortality {value} at age {age} in group {group} is outside [0, 1]")]
    InvalidMortality { group: String, age: u32, value: f64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse {field}: {value:?}")]
    Parse { field: String, value: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl LifeTableError {
    pub(crate) fn missing(column: impl Into<String>, context: impl Into<String>) -> Self {
        LifeTableError::Schema {
            column: column.into(),
            context: context.into(),
        }
    }

    pub(crate) fn parse(field: impl Into<String>, value: impl Into<String>) -> Self {
        LifeTableError::Parse {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, LifeTableError>;
