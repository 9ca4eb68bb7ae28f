use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// A single schema rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("validation failed: {}", join_messages(.0))]
    Validation(Vec<FieldError>),
    #[error("duplicate value for {field}: {value}")]
    Duplicate { field: &'static str, value: String },
    #[error("invalid {field}: {value}")]
    Cast { field: String, value: String },
    #[error("invalid query: {0}")]
    Query(String),
    #[error("invalid document body: {0}")]
    Body(#[source] serde_json::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

fn join_messages(errors: &[FieldError]) -> String {
    errors.iter().map(|e| e.message.as_str()).collect::<Vec<_>>().join(". ")
}

pub type Result<T> = std::result::Result<T, StoreError>;
