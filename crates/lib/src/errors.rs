use thiserror::Error;

/// Errors returned by the storage layer.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage connection error: {0}")]
    Connection(String),
    #[error("Storage operation failed: {0}")]
    OperationFailed(String),
    #[error("Database error: {0}")]
    Database(#[from] turso::Error),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("Unsupported file type for '{0}'. Only markdown (.md) and csv (.csv) files are supported.")]
    UnsupportedFileType(String),
    #[error("File content is not valid UTF-8 text")]
    InvalidEncoding,
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),
}
