use std::time::Duration;
use thiserror::Error;

/// A usage record whose count has no bucket.
///
/// The usage query only returns groups with more than one occurrence, so a
/// count below 2 means the input did not come from that query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid usage record: identifier {identifier} has count {count}, expected at least 2")]
pub struct InvalidRecordError {
    pub identifier: i64,
    pub count: i64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid port in {var}: {value:?}")]
    InvalidPort { var: &'static str, value: String },

    #[error("invalid SQL identifier {0:?}")]
    InvalidIdentifier(String),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("connection to {server} timed out after {timeout:?}")]
    ConnectTimeout { server: String, timeout: Duration },

    #[error("network error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Tds(#[from] tiberius::error::Error),

    #[error("required columns not found in result, available columns: {}", available.join(", "))]
    MissingColumns { available: Vec<String> },

    #[error("unexpected value in column {column}: {found}")]
    UnexpectedValue { column: String, found: String },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write CSV to {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
}
