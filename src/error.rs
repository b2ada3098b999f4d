//! Error taxonomy for the voice front end.
//!
//! Every error surfaced to a host carries a stable [`ErrorKind`] plus a
//! human-readable detail string (the `Display` output).

use serde::Serialize;

use crate::speech::RecognitionError;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, VoxError>;

/// Errors returned by controller operations or raised through `VoiceEvent::Error`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VoxError {
    #[error("Voice controller is not initialized")]
    NotInitialized,

    #[error("Voice controller is already initialized")]
    AlreadyInitialized,

    #[error("Recognition is already in progress")]
    AlreadyListening,

    #[error("Speech recognition permission denied: {0}")]
    PermissionDenied(String),

    #[error("Speech engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Recognition error: {0}")]
    Recognition(RecognitionError),

    #[error("No command recognized within {0} ms")]
    Timeout(u64),

    #[error("Invalid command pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl VoxError {
    /// Machine-readable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VoxError::NotInitialized => ErrorKind::NotInitialized,
            VoxError::AlreadyInitialized => ErrorKind::AlreadyInitialized,
            VoxError::AlreadyListening => ErrorKind::AlreadyListening,
            VoxError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            VoxError::EngineUnavailable(_) => ErrorKind::EngineUnavailable,
            VoxError::Recognition(_) => ErrorKind::RecognitionError,
            VoxError::Timeout(_) => ErrorKind::Timeout,
            VoxError::InvalidPattern { .. } => ErrorKind::InvalidPattern,
            VoxError::InvalidConfig(_) => ErrorKind::InvalidConfig,
        }
    }
}

impl From<RecognitionError> for VoxError {
    fn from(err: RecognitionError) -> Self {
        VoxError::Recognition(err)
    }
}

/// Stable identifier for each error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotInitialized,
    AlreadyInitialized,
    AlreadyListening,
    PermissionDenied,
    EngineUnavailable,
    RecognitionError,
    Timeout,
    InvalidPattern,
    InvalidConfig,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotInitialized => "not_initialized",
            ErrorKind::AlreadyInitialized => "already_initialized",
            ErrorKind::AlreadyListening => "already_listening",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::EngineUnavailable => "engine_unavailable",
            ErrorKind::RecognitionError => "recognition_error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::InvalidPattern => "invalid_pattern",
            ErrorKind::InvalidConfig => "invalid_config",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
