//! Per-host orchestration
//!
//! A host is provisioned in three phases, always in this order:
//!
//! 1. upload files (one file-transfer session)
//! 2. run commands (one command session)
//! 3. download files (one file-transfer session)
//!
//! A phase only runs when its work list is present and non-empty. Each phase
//! opens its own session and closes it on every exit path. The first error
//! ends the host: remaining items and phases are skipped and the error is
//! recorded in the [`HostOutcome`].

use std::fmt;

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::config::{FileTransfer, HostConfig};
use crate::error::{Result, SshBotError};
use crate::ssh::{
    build_connection_parameters, CapabilityProbe, CommandSession, ConnectionParameters,
    FileSession, Transport,
};

/// Where a host is in its orchestration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    Init,
    AuthBuilt,
    Uploading,
    Running,
    Downloading,
    Done,
    Failed,
}

impl fmt::Display for HostState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HostState::Init => "starting",
            HostState::AuthBuilt => "preparing authentication",
            HostState::Uploading => "uploading",
            HostState::Running => "running commands",
            HostState::Downloading => "downloading",
            HostState::Done => "done",
            HostState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of orchestrating one host
#[derive(Debug)]
pub struct HostOutcome {
    pub hostname: String,

    /// Terminal state: `Done` or `Failed`
    pub state: HostState,

    /// State the host was in when it failed
    pub failed_during: Option<HostState>,

    pub error: Option<SshBotError>,

    /// Files uploaded successfully
    pub uploaded: usize,

    /// Exit status of every command that ran to completion, in order
    pub exit_statuses: Vec<Option<u32>>,

    /// Files downloaded successfully
    pub downloaded: usize,
}

impl HostOutcome {
    fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            state: HostState::Init,
            failed_during: None,
            error: None,
            uploaded: 0,
            exit_statuses: Vec::new(),
            downloaded: 0,
        }
    }

    fn fail(&mut self, error: SshBotError) {
        self.failed_during = Some(self.state);
        self.state = HostState::Failed;
        self.error = Some(error);
    }

    pub fn succeeded(&self) -> bool {
        self.state == HostState::Done
    }

    /// Commands that ran to completion, whatever their exit status
    pub fn commands_run(&self) -> usize {
        self.exit_statuses.len()
    }
}

impl fmt::Display for HostOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({} uploaded, {} commands run, {} downloaded)",
            self.hostname,
            self.state,
            self.uploaded,
            self.commands_run(),
            self.downloaded
        )?;
        if let (Some(during), Some(error)) = (self.failed_during, self.error.as_ref()) {
            write!(f, " while {}: {}", during, error)?;
        }
        Ok(())
    }
}

/// Runs the three phases for one host at a time
pub struct HostOrchestrator<'a> {
    transport: &'a dyn Transport,
    probe: &'a dyn CapabilityProbe,
}

impl<'a> HostOrchestrator<'a> {
    pub fn new(transport: &'a dyn Transport, probe: &'a dyn CapabilityProbe) -> Self {
        Self { transport, probe }
    }

    /// Provision one host; never returns an error, failures end up in the outcome
    pub async fn run(&self, host: &HostConfig) -> HostOutcome {
        let mut outcome = HostOutcome::new(&host.hostname);

        match self.run_phases(host, &mut outcome).await {
            Ok(()) => {
                outcome.state = HostState::Done;
                info!("Host '{}' done", host.hostname);
            }
            Err(e) => {
                warn!("Host '{}' failed while {}: {}", host.hostname, outcome.state, e);
                outcome.fail(e);
            }
        }

        outcome
    }

    async fn run_phases(&self, host: &HostConfig, outcome: &mut HostOutcome) -> Result<()> {
        println!(
            "Connecting to '{}' as '{}'.",
            host.hostname, host.username
        );

        let params = build_connection_parameters(host, self.probe)?;
        outcome.state = HostState::AuthBuilt;
        debug!("Connection parameters: {:?}", params);

        if let Some(files) = non_empty(&host.upload_files) {
            outcome.state = HostState::Uploading;
            upload_files(self.transport, &params, files, &mut outcome.uploaded).await?;
        }

        if let Some(commands) = non_empty(&host.run_commands) {
            outcome.state = HostState::Running;
            run_commands(self.transport, &params, commands, &mut outcome.exit_statuses).await?;
        }

        if let Some(files) = non_empty(&host.download_files) {
            outcome.state = HostState::Downloading;
            download_files(self.transport, &params, files, &mut outcome.downloaded).await?;
        }

        Ok(())
    }
}

fn non_empty<T>(items: &Option<Vec<T>>) -> Option<&[T]> {
    items.as_deref().filter(|items| !items.is_empty())
}

/// Return the phase result once the session has been released
///
/// A phase error wins over a close error; the close error is only logged then.
fn after_close<T>(phase: Result<T>, closed: Result<()>) -> Result<T> {
    match (phase, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(close_err)) => Err(close_err),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            warn!("Error while closing session after failure: {}", close_err);
            Err(e)
        }
    }
}

/// Upload every file over one file-transfer session
///
/// `done` counts the files uploaded, also when the phase fails part way.
pub async fn upload_files(
    transport: &dyn Transport,
    params: &ConnectionParameters,
    files: &[FileTransfer],
    done: &mut usize,
) -> Result<()> {
    let mut session = transport.open_file_session(params).await?;
    println!("Connected for uploading files.");

    let result = upload_each(session.as_mut(), files, done).await;
    after_close(result, session.close().await)
}

async fn upload_each(
    session: &mut dyn FileSession,
    files: &[FileTransfer],
    done: &mut usize,
) -> Result<()> {
    for transfer in files {
        println!(
            "Uploading '{}' to '{}'.",
            transfer.local_file.display(),
            transfer.remote_file
        );

        let mut local = File::open(&transfer.local_file)
            .await
            .map_err(|e| SshBotError::local_io(&transfer.local_file, e))?;

        let bytes = session.upload(&mut local, &transfer.remote_file).await?;
        debug!("Uploaded {} bytes to '{}'", bytes, transfer.remote_file);

        *done += 1;
    }

    Ok(())
}

/// Run every command over one command session
///
/// The exit status of each finished command is pushed to `statuses`.
/// Non-zero statuses are reported and otherwise ignored.
pub async fn run_commands(
    transport: &dyn Transport,
    params: &ConnectionParameters,
    commands: &[String],
    statuses: &mut Vec<Option<u32>>,
) -> Result<()> {
    let mut session = transport.open_command_session(params).await?;
    println!("Connected for running commands.");

    let result = run_each(session.as_mut(), commands, statuses).await;
    after_close(result, session.close().await)
}

async fn run_each(
    session: &mut dyn CommandSession,
    commands: &[String],
    statuses: &mut Vec<Option<u32>>,
) -> Result<()> {
    for command in commands {
        println!("Running '{}'.", command);

        let result = session.run(command).await?;

        print!("{}", result.output);
        match result.exit_status {
            Some(status) => println!("Exit status = {}", status),
            None => println!("Exit status = unknown"),
        }

        statuses.push(result.exit_status);
    }

    Ok(())
}

/// Download every file over one file-transfer session
///
/// Local files are created or truncated before the transfer starts.
pub async fn download_files(
    transport: &dyn Transport,
    params: &ConnectionParameters,
    files: &[FileTransfer],
    done: &mut usize,
) -> Result<()> {
    let mut session = transport.open_file_session(params).await?;
    println!("Connected for downloading files.");

    let result = download_each(session.as_mut(), files, done).await;
    after_close(result, session.close().await)
}

async fn download_each(
    session: &mut dyn FileSession,
    files: &[FileTransfer],
    done: &mut usize,
) -> Result<()> {
    for transfer in files {
        println!(
            "Downloading '{}' to '{}'.",
            transfer.remote_file,
            transfer.local_file.display()
        );

        let mut local = File::create(&transfer.local_file)
            .await
            .map_err(|e| SshBotError::local_io(&transfer.local_file, e))?;

        let bytes = session.download(&transfer.remote_file, &mut local).await?;
        local
            .flush()
            .await
            .map_err(|e| SshBotError::local_io(&transfer.local_file, e))?;
        debug!("Downloaded {} bytes from '{}'", bytes, transfer.remote_file);

        *done += 1;
    }

    Ok(())
}
