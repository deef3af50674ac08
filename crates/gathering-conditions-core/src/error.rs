//! Error types for the resolution engine.

use serde::{Deserialize, Serialize};

/// Service errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// A request parameter could not be parsed.
    #[error("error during parsing param '{param}' with value '{value}': {reason}")]
    InvalidArgument {
        param: String,
        value: String,
        reason: String,
    },

    /// Resource missing, or version below the known range.
    #[error("not found: {message}")]
    NotFound { message: String },

    /// Decode failure or unexpected storage failure.
    #[error("internal error: {message}")]
    Internal { message: String },

    /// Startup configuration is unusable; the process must not serve.
    #[error("invalid configuration: {message}")]
    ConfigInvalid { message: String },
}

/// Coarse classification of a [`ServiceError`], used at the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    Internal,
    ConfigInvalid,
}

impl ErrorKind {
    /// HTTP status code for this kind.
    pub fn http_status(self) -> u16 {
        match self {
            Self::InvalidArgument => 400,
            Self::NotFound => 404,
            Self::Internal | Self::ConfigInvalid => 500,
        }
    }
}

impl ServiceError {
    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub(crate) fn config_invalid(message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            message: message.into(),
        }
    }

    /// Error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Internal { .. } => ErrorKind::Internal,
            Self::ConfigInvalid { .. } => ErrorKind::ConfigInvalid,
        }
    }

    /// HTTP status code.
    pub fn http_status(&self) -> u16 {
        self.kind().http_status()
    }

    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            // Caller mistakes / missing data
            Self::InvalidArgument { .. } => 1,
            Self::NotFound { .. } => 1,

            // Refuse to start
            Self::ConfigInvalid { .. } => 2,

            // Other
            Self::Internal { .. } => 3,
        }
    }
}

/// Body rendered for a failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<&ServiceError> for ErrorResponse {
    fn from(err: &ServiceError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
