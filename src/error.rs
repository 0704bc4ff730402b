//! Error types for SSH Bot

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for SSH Bot
#[derive(Debug, Error)]
pub enum SshBotError {
    /// Configuration document missing, malformed or incomplete
    #[error("Configuration error: {0}")]
    Config(String),

    /// Probing the platform's cryptographic support failed unexpectedly
    #[error("Capability probe failed: {0}")]
    Capability(String),

    /// SSH connection failed or dropped
    #[error("SSH connection error: {0}")]
    Connection(String),

    /// Authentication rejected by the remote host
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// SSH key loading or parsing error
    #[error("SSH key error: {0}")]
    SshKey(String),

    /// SFTP request failed on the remote side
    #[error("SFTP error: {0}")]
    Sftp(String),

    /// Local file could not be opened, created, read or written
    #[error("Local file '{}': {}", .path.display(), .source)]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using SshBotError
pub type Result<T> = std::result::Result<T, SshBotError>;

impl SshBotError {
    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        SshBotError::Config(msg.into())
    }

    /// Create a capability probe error from a string
    pub fn capability(msg: impl Into<String>) -> Self {
        SshBotError::Capability(msg.into())
    }

    /// Create a connection error from a string
    pub fn connection(msg: impl Into<String>) -> Self {
        SshBotError::Connection(msg.into())
    }

    /// Create an authentication error from a string
    pub fn auth(msg: impl Into<String>) -> Self {
        SshBotError::Authentication(msg.into())
    }

    /// Create an SFTP error from a string
    pub fn sftp(msg: impl Into<String>) -> Self {
        SshBotError::Sftp(msg.into())
    }

    /// Wrap an IO error with the local path it happened on
    pub fn local_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SshBotError::LocalIo {
            path: path.into(),
            source,
        }
    }
}
