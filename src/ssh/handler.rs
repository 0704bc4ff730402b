//! SSH client handler implementation
//!
//! Implements the `russh::client::Handler` trait to handle SSH connection events.

use russh::keys::{HashAlg, PublicKey};
use tracing::debug;

/// SSH client handler for russh
///
/// Accepts every server host key; there is no known_hosts check.
#[derive(Debug, Clone)]
pub struct SshHandler {
    /// Host name used in log lines
    hostname: String,
}

impl SshHandler {
    /// Create a new SSH handler for a host
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
        }
    }
}

impl russh::client::Handler for SshHandler {
    type Error = anyhow::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        debug!(
            "Accepting {} host key {} from '{}'",
            server_public_key.algorithm().as_str(),
            server_public_key.fingerprint(HashAlg::Sha256),
            self.hostname
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_creation() {
        let handler = SshHandler::new("10.0.0.5");
        assert!(format!("{:?}", handler).contains("10.0.0.5"));
    }
}
