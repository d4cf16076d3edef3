use thiserror::Error;

/// Errors that can occur within the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite / rusqlite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A JSON column (`notify_config`, `recurrence`) failed to encode.
    #[error("Invalid config JSON: {0}")]
    InvalidConfig(String),

    /// No reminder with the given ID exists.
    #[error("Reminder not found: {id}")]
    NotFound { id: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;
