use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Unauthorized - {0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("Insufficient balance")]
    InsufficientFunds,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl PaymentError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into().into())
    }

    /// True for failures caused by the store or the process rather than the caller.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::CsvError(_)
                | Self::IoError(_)
                | Self::DatabaseError(_)
                | Self::MigrationError(_)
                | Self::InternalError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PaymentError>;
