//! Remote execution over ssh/scp subprocesses.

use std::process::Command;

use crate::config::ServerSettings;
use crate::error::{Error, RemoteCommandFailedDetails, Result};

#[derive(Debug)]
pub struct SshClient {
    pub host: String,
    pub user: String,
    pub port: u16,
    pub identity_file: Option<String>,
}

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: i32,
}

impl SshClient {
    pub fn from_server(server: &ServerSettings) -> Result<Self> {
        let mut missing = Vec::new();
        if server.host.trim().is_empty() {
            missing.push("host".to_string());
        }
        if server.user.trim().is_empty() {
            missing.push("user".to_string());
        }
        if !missing.is_empty() {
            return Err(Error::ssh_server_invalid(missing));
        }

        let identity_file = match &server.identity_file {
            Some(path) => Some(shellexpand::tilde(path).to_string()),
            None => None,
        };

        Ok(Self {
            host: server.host.clone(),
            user: server.user.clone(),
            port: server.port,
            identity_file,
        })
    }

    fn target(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    fn base_args(&self) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
        ];
        if let Some(ref key) = self.identity_file {
            args.push("-i".to_string());
            args.push(key.clone());
        }
        args
    }

    pub fn execute(&self, command: &str) -> CommandOutput {
        let mut args = self.base_args();
        args.push("-p".to_string());
        args.push(self.port.to_string());
        args.push(self.target());
        args.push(command.to_string());

        let output = Command::new("/usr/bin/ssh").args(&args).output();

        match output {
            Ok(out) => CommandOutput {
                stdout: String::from_utf8_lossy(&out.stdout).to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).to_string(),
                success: out.status.success(),
                exit_code: out.status.code().unwrap_or(-1),
            },
            Err(e) => CommandOutput {
                stdout: String::new(),
                stderr: format!("SSH error: {}", e),
                success: false,
                exit_code: -1,
            },
        }
    }

    /// Runs a command and converts a non-zero exit into an error carrying
    /// the captured output.
    pub fn execute_checked(&self, command: &str) -> Result<CommandOutput> {
        let output = self.execute(command);
        if output.success {
            return Ok(output);
        }
        Err(Error::remote_command_failed(RemoteCommandFailedDetails {
            command: command.to_string(),
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
            host: self.host.clone(),
        }))
    }

    /// Copies a local file to a path on the remote host via scp.
    pub fn upload(&self, local_path: &str, remote_path: &str) -> Result<()> {
        let mut args = self.base_args();
        args.push("-P".to_string());
        args.push(self.port.to_string());
        args.push("-r".to_string());
        args.push(local_path.to_string());
        args.push(format!("{}:{}", self.target(), remote_path));

        let output = Command::new("/usr/bin/scp").args(&args).output();

        match output {
            Ok(out) if out.status.success() => Ok(()),
            Ok(out) => Err(Error::upload_failed(
                local_path,
                String::from_utf8_lossy(&out.stderr).to_string(),
            )),
            Err(e) => Err(Error::upload_failed(local_path, e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(identity_file: Option<&str>) -> ServerSettings {
        ServerSettings {
            host: "app1.example.com".to_string(),
            user: "deployer".to_string(),
            port: 2222,
            identity_file: identity_file.map(|s| s.to_string()),
        }
    }

    #[test]
    fn from_server_expands_identity_file_tilde() {
        let client = SshClient::from_server(&server(Some("~/.ssh/deploy_key"))).unwrap();
        let key = client.identity_file.unwrap();
        assert!(!key.starts_with('~'));
        assert!(key.ends_with(".ssh/deploy_key"));
    }

    #[test]
    fn from_server_rejects_blank_host() {
        let mut settings = server(None);
        settings.host = "  ".to_string();
        let err = SshClient::from_server(&settings).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::SshServerInvalid);
    }
}
