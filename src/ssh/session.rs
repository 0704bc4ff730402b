//! SSH and SFTP sessions over russh
//!
//! [`RusshTransport`] implements the transport seams: every session is a
//! fresh TCP connection, authenticated with the host's selected method and
//! restricted to the host key algorithms in its [`ConnectionParameters`].

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use russh::client::{self, Handle};
use russh::keys::{PrivateKey, PrivateKeyWithHashAlg};
use russh::{ChannelMsg, Disconnect, Preferred};
use russh_sftp::client::SftpSession;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use super::auth::{AuthMethod, ConnectionParameters};
use super::handler::SshHandler;
use super::transport::{CommandResult, CommandSession, FileSession, Transport};
use crate::error::{Result, SshBotError};

/// Transport that opens real SSH connections
#[derive(Debug, Clone, Copy, Default)]
pub struct RusshTransport;

impl RusshTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for RusshTransport {
    async fn open_command_session(
        &self,
        params: &ConnectionParameters,
    ) -> Result<Box<dyn CommandSession>> {
        let handle = connect(params).await?;
        Ok(Box::new(RusshCommandSession { handle }))
    }

    async fn open_file_session(
        &self,
        params: &ConnectionParameters,
    ) -> Result<Box<dyn FileSession>> {
        let handle = connect(params).await?;

        match start_sftp(&handle).await {
            Ok(sftp) => Ok(Box::new(RusshFileSession { handle, sftp })),
            Err(e) => {
                disconnect(&handle).await;
                Err(e)
            }
        }
    }
}

/// Build the russh client config for these parameters
fn client_config(params: &ConnectionParameters) -> client::Config {
    client::Config {
        preferred: Preferred {
            key: Cow::Owned(params.host_key_algorithms.clone()),
            ..Preferred::default()
        },
        ..client::Config::default()
    }
}

/// Connect and authenticate
async fn connect(params: &ConnectionParameters) -> Result<Handle<SshHandler>> {
    info!("Connecting to SSH server {}...", params.address());

    let addr = params.address();
    let mut session = client::connect(
        Arc::new(client_config(params)),
        addr.as_str(),
        SshHandler::new(&params.hostname),
    )
    .await
    .map_err(|e| SshBotError::connection(format!("{}: {}", addr, e)))?;

    if let Err(e) = authenticate(&mut session, params).await {
        disconnect(&session).await;
        return Err(e);
    }

    info!(
        "Successfully connected to {}@{}",
        params.username,
        params.address()
    );

    Ok(session)
}

/// Authenticate with the selected method only
async fn authenticate(session: &mut Handle<SshHandler>, params: &ConnectionParameters) -> Result<()> {
    debug!(
        "Attempting {} authentication for user '{}'",
        params.auth.kind(),
        params.username
    );

    let auth_result = match params.auth {
        AuthMethod::Password { ref password } => {
            session
                .authenticate_password(params.username.as_str(), password.as_str())
                .await
        }
        AuthMethod::PublicKey { ref key } => {
            let hash_alg = if needs_rsa_hash(key) {
                session
                    .best_supported_rsa_hash()
                    .await
                    .map_err(|e| SshBotError::connection(e.to_string()))?
                    .flatten()
            } else {
                None
            };
            session
                .authenticate_publickey(
                    params.username.as_str(),
                    PrivateKeyWithHashAlg::new(Arc::clone(key), hash_alg),
                )
                .await
        }
    }
    .map_err(|e| SshBotError::auth(e.to_string()))?;

    if auth_result.success() {
        Ok(())
    } else {
        Err(SshBotError::auth(format!(
            "{} authentication rejected for '{}'",
            params.auth.kind(),
            params.username
        )))
    }
}

/// Only RSA signatures carry a negotiable hash; other key types skip the
/// server-sig-algs lookup
fn needs_rsa_hash(key: &PrivateKey) -> bool {
    key.algorithm().is_rsa()
}

async fn start_sftp(handle: &Handle<SshHandler>) -> Result<SftpSession> {
    let channel = handle
        .channel_open_session()
        .await
        .map_err(|e| SshBotError::connection(format!("Failed to open channel: {}", e)))?;

    channel
        .request_subsystem(true, "sftp")
        .await
        .map_err(|e| SshBotError::sftp(format!("Failed to request sftp subsystem: {}", e)))?;

    SftpSession::new(channel.into_stream())
        .await
        .map_err(|e| SshBotError::sftp(format!("Failed to start sftp session: {}", e)))
}

async fn disconnect(handle: &Handle<SshHandler>) {
    if let Err(e) = handle
        .disconnect(Disconnect::ByApplication, "", "English")
        .await
    {
        warn!("Error while disconnecting: {}", e);
    }
}

/// Command session over an exec channel per command
struct RusshCommandSession {
    handle: Handle<SshHandler>,
}

#[async_trait]
impl CommandSession for RusshCommandSession {
    async fn run(&mut self, command: &str) -> Result<CommandResult> {
        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| SshBotError::connection(format!("Failed to open channel: {}", e)))?;

        channel
            .exec(true, command)
            .await
            .map_err(|e| SshBotError::connection(format!("Failed to exec command: {}", e)))?;

        let mut output = Vec::new();
        let mut exit_status = None;

        // The exit status may arrive after EOF, so read until the channel closes
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { data } => output.extend_from_slice(&data),
                ChannelMsg::ExtendedData { data, .. } => output.extend_from_slice(&data),
                ChannelMsg::ExitStatus {
                    exit_status: status,
                } => exit_status = Some(status),
                ChannelMsg::Close => break,
                _ => {}
            }
        }

        let result = CommandResult::from_bytes(&output, exit_status);

        debug!(
            "Command completed: exit_status={:?}, output_len={}",
            result.exit_status,
            result.output.len()
        );

        Ok(result)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.handle
            .disconnect(Disconnect::ByApplication, "", "English")
            .await
            .map_err(|e| SshBotError::connection(e.to_string()))
    }
}

/// File session over the `sftp` subsystem
struct RusshFileSession {
    handle: Handle<SshHandler>,
    sftp: SftpSession,
}

#[async_trait]
impl FileSession for RusshFileSession {
    async fn upload(
        &mut self,
        source: &mut (dyn AsyncRead + Unpin + Send),
        remote_path: &str,
    ) -> Result<u64> {
        // create() opens with CREATE | TRUNCATE | WRITE
        let mut remote = self
            .sftp
            .create(remote_path)
            .await
            .map_err(|e| SshBotError::sftp(format!("Cannot create '{}': {}", remote_path, e)))?;

        let written = tokio::io::copy(source, &mut remote)
            .await
            .map_err(|e| SshBotError::sftp(format!("Upload to '{}' failed: {}", remote_path, e)))?;

        remote
            .shutdown()
            .await
            .map_err(|e| SshBotError::sftp(format!("Cannot close '{}': {}", remote_path, e)))?;

        Ok(written)
    }

    async fn download(
        &mut self,
        remote_path: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64> {
        let mut remote = self
            .sftp
            .open(remote_path)
            .await
            .map_err(|e| SshBotError::sftp(format!("Cannot open '{}': {}", remote_path, e)))?;

        let read = tokio::io::copy(&mut remote, sink).await.map_err(|e| {
            SshBotError::sftp(format!("Download of '{}' failed: {}", remote_path, e))
        })?;

        Ok(read)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let sftp_closed = self
            .sftp
            .close()
            .await
            .map_err(|e| SshBotError::sftp(format!("Failed to close sftp session: {}", e)));

        let disconnected = self
            .handle
            .disconnect(Disconnect::ByApplication, "", "English")
            .await
            .map_err(|e| SshBotError::connection(e.to_string()));

        sftp_closed.and(disconnected)
    }
}
