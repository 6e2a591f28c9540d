//! Unified error model for the session core and its collaborators.
//! Every failure here is recoverable: callers degrade to "signed out" or
//! "unverified role" rather than surfacing the error to the user.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("{code}: {message}")]
    Transport { code: String, message: String },
    #[error("{code}: {message}")]
    Credential { code: String, message: String },
    #[error("{code}: {message}")]
    Directory { code: String, message: String },
    #[error("{code}: {message}")]
    Timeout { code: String, message: String },
    #[error("{code}: {message}")]
    Config { code: String, message: String },
    #[error("{code}: {message}")]
    Io { code: String, message: String },
}

impl AuthError {
    pub fn code_str(&self) -> &str {
        match self {
            AuthError::Transport { code, .. }
            | AuthError::Credential { code, .. }
            | AuthError::Directory { code, .. }
            | AuthError::Timeout { code, .. }
            | AuthError::Config { code, .. }
            | AuthError::Io { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AuthError::Transport { message, .. }
            | AuthError::Credential { message, .. }
            | AuthError::Directory { message, .. }
            | AuthError::Timeout { message, .. }
            | AuthError::Config { message, .. }
            | AuthError::Io { message, .. } => message.as_str(),
        }
    }

    pub fn transport(code: impl Into<String>, msg: impl Into<String>) -> Self { AuthError::Transport { code: code.into(), message: msg.into() } }
    pub fn credential(code: impl Into<String>, msg: impl Into<String>) -> Self { AuthError::Credential { code: code.into(), message: msg.into() } }
    pub fn directory(code: impl Into<String>, msg: impl Into<String>) -> Self { AuthError::Directory { code: code.into(), message: msg.into() } }
    pub fn timeout(code: impl Into<String>, msg: impl Into<String>) -> Self { AuthError::Timeout { code: code.into(), message: msg.into() } }
    pub fn config(code: impl Into<String>, msg: impl Into<String>) -> Self { AuthError::Config { code: code.into(), message: msg.into() } }

    /// Errors that mean "the credential itself is bad", as opposed to the
    /// backend being unreachable. Both are treated as signed out; the
    /// distinction only matters for log level.
    pub fn is_credential(&self) -> bool { matches!(self, AuthError::Credential { .. }) }
}

pub type AuthResult<T> = Result<T, AuthError>;

impl From<std::io::Error> for AuthError {
    fn from(err: std::io::Error) -> Self {
        AuthError::Io { code: "io_error".into(), message: err.to_string() }
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::Credential { code: "malformed_credential".into(), message: err.to_string() }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AuthError::Timeout { code: "http_timeout".into(), message: err.to_string() }
        } else {
            AuthError::Transport { code: "http_error".into(), message: err.to_string() }
        }
    }
}
