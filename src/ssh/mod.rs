//! SSH transport module
//!
//! This module selects authentication for a host and provides the sessions
//! the orchestrator runs its phases over: SSH exec channels for commands and
//! SFTP for file transfers.

pub mod auth;
pub mod handler;
pub mod session;
pub mod transport;

// Re-exports
pub use auth::{
    build_connection_parameters, AuthMethod, CapabilityProbe, ConnectionParameters, PlatformProbe,
};
pub use handler::SshHandler;
pub use session::RusshTransport;
pub use transport::{CommandResult, CommandSession, FileSession, Transport};
