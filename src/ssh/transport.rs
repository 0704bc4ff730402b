//! Capability-level transport seams
//!
//! The orchestrator only needs to connect, run commands, move files and
//! disconnect. These traits describe exactly that, so the SSH implementation
//! in [`super::session`] can be swapped for an in-memory fake in tests.

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use super::auth::ConnectionParameters;
use crate::error::Result;

/// Output from a remote command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    /// Standard output and standard error, in the order they arrived
    pub output: String,

    /// Exit status reported by the server (if any)
    pub exit_status: Option<u32>,
}

impl CommandResult {
    pub fn new(output: impl Into<String>, exit_status: Option<u32>) -> Self {
        Self {
            output: output.into(),
            exit_status,
        }
    }

    /// Build a result from the raw bytes of a whole command's output
    ///
    /// Decoding happens once over the complete buffer so multi-byte
    /// characters split across channel messages survive.
    pub fn from_bytes(output: &[u8], exit_status: Option<u32>) -> Self {
        Self::new(String::from_utf8_lossy(output), exit_status)
    }
}

/// Opens authenticated sessions to a host
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect and authenticate a session for running commands
    async fn open_command_session(
        &self,
        params: &ConnectionParameters,
    ) -> Result<Box<dyn CommandSession>>;

    /// Connect and authenticate a session for transferring files
    async fn open_file_session(&self, params: &ConnectionParameters)
        -> Result<Box<dyn FileSession>>;
}

/// A connected session able to execute shell commands
#[async_trait]
pub trait CommandSession: Send {
    /// Run one command to completion
    ///
    /// A non-zero exit status is reported in the result, not as an error.
    async fn run(&mut self, command: &str) -> Result<CommandResult>;

    /// Disconnect from the host
    async fn close(self: Box<Self>) -> Result<()>;
}

/// A connected file-transfer session
#[async_trait]
pub trait FileSession: Send {
    /// Write everything from `source` to `remote_path`, replacing any existing file.
    /// Returns the number of bytes written.
    async fn upload(
        &mut self,
        source: &mut (dyn AsyncRead + Unpin + Send),
        remote_path: &str,
    ) -> Result<u64>;

    /// Copy the contents of `remote_path` into `sink`.
    /// Returns the number of bytes read.
    async fn download(
        &mut self,
        remote_path: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64>;

    /// Close the file-transfer channel and disconnect from the host
    async fn close(self: Box<Self>) -> Result<()>;
}
