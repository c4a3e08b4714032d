//! Error types for the entire library.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use crate::tree::Dimension;
use thiserror::Error;

/// Errors caused by a parameter set that does not match the log
///
/// Raised before any tree construction begins.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Column '{column}' is required but missing from the log")]
    MissingColumn { column: String },

    #[error("Column '{column}' is required by the {dimension} dimension but missing from the log")]
    MissingDimensionColumn { column: String, dimension: Dimension },

    #[error("Column key for {0} cannot be empty")]
    EmptyColumnKey(&'static str),
}

/// Errors caused by log contents
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Event log contains no events")]
    EmptyLog,

    #[error("Case '{0}' has no events")]
    EmptyCase(String),

    #[error("Row {row}: missing value for column '{column}'")]
    MissingValue { row: usize, column: String },

    #[error("Row {row}: invalid value for column '{column}': {reason}")]
    InvalidValue {
        row: usize,
        column: String,
        reason: String,
    },

    #[error("Case '{case_id}', activity '{activity}': no {dimension} value while the dimension is enabled")]
    MissingActivityValue {
        case_id: String,
        activity: String,
        dimension: Dimension,
    },

    #[error("Case '{case_id}' carries no {dimension} data while the dimension is enabled")]
    MissingCaseData { case_id: String, dimension: Dimension },

    #[error("Case '{case_id}': {dimension} series has {found} entries for {expected} activities")]
    SeriesLength {
        case_id: String,
        dimension: Dimension,
        expected: usize,
        found: usize,
    },

    #[error("Log rows must be JSON objects, found: {0}")]
    NotAnObject(String),
}

/// Errors that can occur while pre-grouping log activities
#[derive(Error, Debug)]
pub enum GroupingError {
    #[error("Activities to group are not in log activity names: {0:?}")]
    UnknownActivities(Vec<String>),

    #[error("Unsupported data type for attribute '{attribute}': {kind}. Try converting it before manual grouping")]
    UnsupportedType { attribute: String, kind: &'static str },

    #[error("Attribute '{attribute}' mixes {base} and {incoming} values")]
    TypeMismatch {
        attribute: String,
        base: &'static str,
        incoming: &'static str,
    },
}

/// Errors that can occur during tree discovery
#[derive(Error, Debug)]
pub enum DrtError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Grouping error: {0}")]
    Grouping(#[from] GroupingError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
