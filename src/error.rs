use thiserror::Error;

#[derive(Error, Debug)]
pub enum SalesMetricsError {
    #[error("Invalid month key '{0}': expected YYYY-MM")]
    InvalidMonthKey(String),

    #[error("Invalid metrics policy field '{field}': {details}")]
    InvalidPolicy { field: String, details: String },

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Record file not found: {0}")]
    MissingRecordFile(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SalesMetricsError>;
