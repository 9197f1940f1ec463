//! Unified error handling for semeru-core

use thiserror::Error;

/// Core error type for semeru-core
///
/// The poll loop recovers from every variant except [`Error::Config`], which is
/// raised while building a configuration, before any polling starts.
#[derive(Error, Debug)]
pub enum Error {
    /// Connection, DNS, timeout or unexpected HTTP status
    #[error("Network error: {0}")]
    Network(String),

    /// Server asked for a new session (redirect, auth status or marker payload)
    #[error("Session expired: {0}")]
    SessionExpired(String),

    /// Response body could not be treated as markup at all
    #[error("Markup error: {0}")]
    Markup(String),

    /// A date string did not match any known month name or expected format
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for semeru-core
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Error::Network(msg.into())
    }

    /// Create a session-expired error
    pub fn session_expired(msg: impl Into<String>) -> Self {
        Error::SessionExpired(msg.into())
    }

    /// Create a markup error
    pub fn markup(msg: impl Into<String>) -> Self {
        Error::Markup(msg.into())
    }

    /// Create a date parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Short, stable name of the error kind for status lines
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Network(_) => "network error",
            Error::SessionExpired(_) => "session expired",
            Error::Markup(_) => "markup error",
            Error::Parse(_) => "parse error",
            Error::Config(_) => "configuration error",
        }
    }

    /// Whether recovery should start by acquiring a fresh session
    pub fn needs_new_session(&self) -> bool {
        matches!(self, Error::SessionExpired(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Network("Request timed out".to_string())
        } else if err.is_connect() {
            Error::Network(format!("Connection failed: {}", err))
        } else if err.is_status() {
            match err.status() {
                Some(status) => Error::Network(format!("HTTP {}", status)),
                None => Error::Network(err.to_string()),
            }
        } else {
            Error::Network(err.to_string())
        }
    }
}
