//! Error types for movement requests and configuration loading.

use thiserror::Error;

/// Errors returned by the movement API.
///
/// A rejected request never mutates the agent: active and pending states
/// are left exactly as they were.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MovementError {
    #[error("invalid {what}: {detail}")]
    InvalidArgument { what: &'static str, detail: String },

    #[error("no movement state with index {0}")]
    InvalidTransition(u8),
}

impl MovementError {
    pub(crate) fn invalid(what: &'static str, detail: impl Into<String>) -> Self {
        Self::InvalidArgument {
            what,
            detail: detail.into(),
        }
    }
}

/// Errors that can occur while loading a [`MovementConfig`](crate::MovementConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config field `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
