//! Server error types.

use std::fmt;

use vanish_core::{ConfigurationError, StoreError};

/// Errors that stop the server from starting or keep it from serving.
#[derive(Debug)]
pub enum ServerError {
    /// Invalid command-line or environment settings.
    ///
    /// Fatal at startup. Fix the configuration and restart.
    Config(String),

    /// The validation policy is inconsistent.
    ///
    /// Caught at startup so it never surfaces as per-request 500s.
    Policy(ConfigurationError),

    /// The storage backend could not be opened.
    Storage(StoreError),

    /// Binding or serving the listener failed.
    Transport(std::io::Error),
}

impl ServerError {
    /// Returns true if the operator can fix this by changing settings.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Policy(_))
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Policy(err) => write!(f, "policy error: {err}"),
            Self::Storage(err) => write!(f, "storage error: {err}"),
            Self::Transport(err) => write!(f, "transport error: {err}"),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(_) => None,
            Self::Policy(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::Transport(err) => Some(err),
        }
    }
}

impl From<ConfigurationError> for ServerError {
    fn from(err: ConfigurationError) -> Self {
        Self::Policy(err)
    }
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        Self::Storage(err)
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err)
    }
}
