use thiserror::Error;

/// Stable error codes reported alongside bulk email failures
pub mod codes {
    pub const INVALID_USER_ID: &str = "VALIDATION_1001";
    pub const INVALID_COURSE_ID: &str = "VALIDATION_1002";
    pub const CONNECTION_FAILED: &str = "DB_4001";
    pub const QUERY_FAILED: &str = "DB_4002";
    pub const INVALID_CONFIGURATION: &str = "CONFIG_5001";
    pub const INTERNAL: &str = "INTERNAL_9001";
}

#[derive(Error, Debug)]
pub enum BulkEmailError {
    #[error("Invalid user id: {0:?}")]
    InvalidUserId(String),

    #[error("Invalid course id: {0:?}")]
    InvalidCourseId(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl BulkEmailError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidUserId(_) => codes::INVALID_USER_ID,
            Self::InvalidCourseId(_) => codes::INVALID_COURSE_ID,
            Self::ConnectionFailed(_) => codes::CONNECTION_FAILED,
            Self::Storage(_) | Self::Database(_) => codes::QUERY_FAILED,
            Self::Config(_) => codes::INVALID_CONFIGURATION,
            Self::Internal(_) => codes::INTERNAL,
        }
    }

    /// True when the backing store failed, as opposed to bad input
    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_) | Self::Storage(_) | Self::Database(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BulkEmailError>;
