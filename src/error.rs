use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LanesError {
    #[error("Card not found: {0}")]
    CardNotFound(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Title must not be empty")]
    EmptyTitle,

    #[error("Please choose today or a future date (got {0})")]
    PastDueDate(NaiveDate),

    #[error("Invalid date: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Invalid time: {0} (expected HH:MM)")]
    InvalidTime(String),

    #[error("Invalid color: {0} (expected #rrggbb)")]
    InvalidColor(String),

    #[error("Import failed: {0}")]
    InvalidImport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Terminal error: {0}")]
    Terminal(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, LanesError>;
