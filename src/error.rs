// src/error.rs

use std::fmt;

/// Global application error enum.
/// Centralizes the error taxonomy for every remote and local operation.
#[derive(Debug)]
pub enum AdminError {
    /// Request aborted because the owning view was torn down.
    /// Benign: never surfaced to the user as a failure.
    Cancelled,

    /// Malformed or incomplete input caught before any network call.
    Validation(String),

    /// Non-2xx answer from the remote API.
    Remote { status: u16, message: String },

    /// The recognized export 400: results have not been prepared yet.
    NotReady,

    /// Connection, timeout or (de)serialization level failure.
    Transport(String),
}

impl AdminError {
    /// True for aborted requests, which must not flip an operation
    /// into a failed state.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AdminError::Cancelled)
    }
}

impl fmt::Display for AdminError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminError::Cancelled => write!(f, "request cancelled"),
            AdminError::Validation(msg) => write!(f, "validation failed: {}", msg),
            AdminError::Remote { status, message } => {
                write!(f, "remote error ({}): {}", status, message)
            }
            AdminError::NotReady => write!(f, "no results prepared yet"),
            AdminError::Transport(msg) => write!(f, "transport error: {}", msg),
        }
    }
}

impl std::error::Error for AdminError {}

/// Converts `reqwest::Error` into `AdminError::Transport`.
/// Allows using the `?` operator on client calls.
impl From<reqwest::Error> for AdminError {
    fn from(err: reqwest::Error) -> Self {
        AdminError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for AdminError {
    fn from(err: serde_json::Error) -> Self {
        AdminError::Transport(err.to_string())
    }
}

/// Converts validator's aggregated errors into a single local
/// validation failure.
impl From<validator::ValidationErrors> for AdminError {
    fn from(err: validator::ValidationErrors) -> Self {
        AdminError::Validation(err.to_string())
    }
}
