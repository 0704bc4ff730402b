//! Configuration and CLI argument parsing for SSH Bot
//!
//! The configuration document is a JSON file listing the hosts to provision
//! and, per host, the files to upload, the commands to run and the files to
//! download afterwards.

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SshBotError};

/// File name looked up next to the executable when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// SSH port used when a host does not specify one
pub const DEFAULT_SSH_PORT: u16 = 22;

/// SSH Bot CLI Arguments
#[derive(Parser, Debug, Clone)]
#[command(name = "ssh-bot")]
#[command(version)]
#[command(about = "Upload files, run commands and download files on hosts declared in a JSON config")]
pub struct Args {
    /// Path to the configuration document (default: config.json next to the executable)
    pub config: Option<PathBuf>,
}

impl Args {
    /// Resolve the configuration path, falling back to the executable's directory
    pub fn config_path(&self) -> Result<PathBuf> {
        match self.config {
            Some(ref path) => Ok(path.clone()),
            None => default_config_path(),
        }
    }
}

/// Top-level configuration document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Config {
    /// Hosts to provision, in order
    pub hosts: Vec<HostConfig>,
}

/// One target host and its work items
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HostConfig {
    pub hostname: String,

    #[serde(default = "default_port")]
    pub port: u16,

    pub username: String,

    /// Used only when no private key file is configured
    #[serde(default)]
    pub password: Option<String>,

    /// Path to an OpenSSH private key; takes precedence over `password`
    #[serde(default)]
    pub private_key_file: Option<PathBuf>,

    #[serde(default)]
    pub upload_files: Option<Vec<FileTransfer>>,

    #[serde(default)]
    pub run_commands: Option<Vec<String>>,

    #[serde(default)]
    pub download_files: Option<Vec<FileTransfer>>,
}

/// A remote/local file pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileTransfer {
    pub remote_file: String,
    pub local_file: PathBuf,
}

impl FileTransfer {
    pub fn new(remote_file: impl Into<String>, local_file: impl Into<PathBuf>) -> Self {
        Self {
            remote_file: remote_file.into(),
            local_file: local_file.into(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_SSH_PORT
}

impl Config {
    /// Read and parse the configuration document at `path`
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SshBotError::config(format!("cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_json(&content)
            .map_err(|e| SshBotError::config(format!("'{}': {}", path.display(), e)))
    }

    /// Parse a configuration document from a JSON string
    pub fn from_json(content: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}

/// `config.json` in the directory holding the running executable
pub fn default_config_path() -> Result<PathBuf> {
    let exe = std::env::current_exe()
        .map_err(|e| SshBotError::config(format!("cannot locate executable: {}", e)))?;
    let dir = exe
        .parent()
        .ok_or_else(|| SshBotError::config("executable has no parent directory"))?;
    Ok(dir.join(DEFAULT_CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "Hosts": [
            {
                "Hostname": "10.0.0.5",
                "Username": "deploy",
                "PrivateKeyFile": "/home/deploy/.ssh/id_ed25519",
                "UploadFiles": [ { "RemoteFile": "/opt/app/app", "LocalFile": "build/app" } ],
                "RunCommands": [ "chmod +x /opt/app/app", "/opt/app/app --selftest" ],
                "DownloadFiles": [ { "RemoteFile": "/opt/app/app.log", "LocalFile": "logs/app.log" } ]
            },
            {
                "Hostname": "backup.internal",
                "Port": 2222,
                "Username": "root",
                "Password": "hunter2",
                "RunCommands": []
            }
        ]
    }"#;

    #[test]
    fn test_parse_full_document() {
        let config = Config::from_json(SAMPLE).unwrap();
        assert_eq!(config.hosts.len(), 2);

        let first = &config.hosts[0];
        assert_eq!(first.hostname, "10.0.0.5");
        assert_eq!(first.port, DEFAULT_SSH_PORT);
        assert_eq!(
            first.private_key_file,
            Some(PathBuf::from("/home/deploy/.ssh/id_ed25519"))
        );
        assert_eq!(
            first.upload_files,
            Some(vec![FileTransfer::new("/opt/app/app", "build/app")])
        );
        assert_eq!(first.run_commands.as_ref().map(Vec::len), Some(2));
        assert!(first.password.is_none());
    }

    #[test]
    fn test_absent_lists_differ_from_empty() {
        let config = Config::from_json(SAMPLE).unwrap();
        let second = &config.hosts[1];
        assert_eq!(second.port, 2222);
        assert_eq!(second.password.as_deref(), Some("hunter2"));
        assert!(second.upload_files.is_none());
        assert_eq!(second.run_commands, Some(vec![]));
        assert!(second.download_files.is_none());
    }

    #[test]
    fn test_missing_hosts_is_rejected() {
        let err = Config::from_json(r#"{ "Other": [] }"#).unwrap_err();
        assert!(err.to_string().contains("Hosts"));
    }

    #[test]
    fn test_null_lists_are_absent() {
        let json = r#"{ "Hosts": [ { "Hostname": "h", "Username": "u", "UploadFiles": null } ] }"#;
        let config = Config::from_json(json).unwrap();
        assert!(config.hosts[0].upload_files.is_none());
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let err = Config::load(Path::new("/nonexistent/ssh-bot/config.json")).unwrap_err();
        assert!(matches!(err, SshBotError::Config(_)));
    }

    #[test]
    fn test_default_config_path_is_next_to_executable() {
        let path = default_config_path().unwrap();
        assert_eq!(path.file_name().unwrap(), DEFAULT_CONFIG_FILE);
        let exe_dir = std::env::current_exe().unwrap().parent().unwrap().to_path_buf();
        assert_eq!(path.parent().unwrap(), exe_dir.as_path());
    }

    #[test]
    fn test_args_positional_config() {
        let args = Args::parse_from(["ssh-bot", "hosts.json"]);
        assert_eq!(args.config_path().unwrap(), PathBuf::from("hosts.json"));

        let args = Args::parse_from(["ssh-bot"]);
        assert!(args.config.is_none());
    }
}
