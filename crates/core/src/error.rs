use thiserror::Error;

pub type MetricsResult<T> = Result<T, MetricsError>;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Invalid reference date '{0}': expected YYYY-MM-DD or YYYY/MM/DD")]
    InvalidDate(String),

    #[error("Invalid interval: {0} days (must be >= 0)")]
    InvalidInterval(i64),

    #[error("Missing required field '{field}' on {record}")]
    MissingField { record: String, field: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
