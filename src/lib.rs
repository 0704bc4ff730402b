//! SSH Bot - config-driven provisioning of remote hosts over SSH
//!
//! For every host declared in a JSON configuration document this crate
//! connects over SSH and, in this fixed order:
//!
//! - uploads files over SFTP (`UploadFiles`)
//! - runs shell commands and prints their output and exit status (`RunCommands`)
//! - downloads files over SFTP (`DownloadFiles`)
//!
//! Hosts are processed one at a time. A host that fails is reported and the
//! run continues with the next one.
//!
//! # Example Usage (CLI)
//!
//! ```bash
//! ssh-bot deploy.json
//! ```
//!
//! # Example configuration
//!
//! ```json
//! {
//!   "Hosts": [
//!     {
//!       "Hostname": "192.168.1.100",
//!       "Username": "admin",
//!       "PrivateKeyFile": "/home/admin/.ssh/id_ed25519",
//!       "UploadFiles": [ { "RemoteFile": "/tmp/app", "LocalFile": "target/release/app" } ],
//!       "RunCommands": [ "chmod +x /tmp/app", "/tmp/app > /tmp/app.log" ],
//!       "DownloadFiles": [ { "RemoteFile": "/tmp/app.log", "LocalFile": "app.log" } ]
//!     }
//!   ]
//! }
//! ```

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod runner;
pub mod ssh;

// Re-exports for convenience
pub use config::{Args, Config, FileTransfer, HostConfig};
pub use error::{Result, SshBotError};
pub use orchestrator::{HostOrchestrator, HostOutcome, HostState};
pub use runner::{run, RunReport};
pub use ssh::{
    AuthMethod, CapabilityProbe, CommandResult, CommandSession, ConnectionParameters,
    FileSession, PlatformProbe, RusshTransport, Transport,
};
