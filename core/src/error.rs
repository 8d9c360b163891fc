use thiserror::Error;

#[derive(Error, Debug)]
pub enum PromoError {
    #[error("Dataset '{dataset}' has no numeric column to aggregate besides the user identifier")]
    NoNumericColumn { dataset: String },

    #[error("Dataset '{dataset}' has no user identifier column '{column}'")]
    MissingIdentifierColumn { dataset: String, column: String },

    #[error("Dataset '{dataset}' has a non-finite value in column '{column}' at line {line}")]
    NonFiniteValue { dataset: String, column: String, line: u64 },

    #[error("Invalid configuration: {field} {reason}")]
    InvalidConfiguration { field: String, reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type PromoResult<T> = Result<T, PromoError>;
