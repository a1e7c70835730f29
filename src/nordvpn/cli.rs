//! Subprocess wrapper around the NordVPN CLI

use super::status::trim_decoration;
use super::{ControlError, VpnControl};
use crate::config::VpnConfig;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

pub struct NordVpnCli {
    program: String,
    locations_command: String,
    timeout: Option<Duration>,
}

impl NordVpnCli {
    pub fn new(config: &VpnConfig) -> Self {
        Self {
            program: config.program.clone(),
            locations_command: config.locations_command.clone(),
            timeout: config.command_timeout(),
        }
    }

    /// Run the program with `args`, requiring a zero exit status
    async fn run(&self, args: &[&str]) -> Result<Output, ControlError> {
        let command = format!("{} {}", self.program, args.join(" "));
        debug!("Running `{}`", command);

        let mut cmd = Command::new(&self.program);
        cmd.args(args).kill_on_drop(true);

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, cmd.output())
                .await
                .map_err(|_| ControlError::Timeout {
                    command: command.clone(),
                    secs: limit.as_secs(),
                })?,
            None => cmd.output().await,
        }
        .map_err(|source| ControlError::Spawn {
            command: command.clone(),
            source,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ControlError::Failed {
                command,
                code: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(output)
    }
}

impl VpnControl for NordVpnCli {
    async fn status(&self) -> Result<String, ControlError> {
        let output = self.run(&["status"]).await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn locations(&self) -> Result<Vec<String>, ControlError> {
        let output = self.run(&[self.locations_command.as_str()]).await?;
        let locations = parse_locations(&String::from_utf8_lossy(&output.stdout));
        debug!("{} locations available", locations.len());
        Ok(locations)
    }

    async fn connect(&self, location: &str) -> Result<(), ControlError> {
        info!("Connecting to {}", location);
        self.run(&["connect", location]).await?;
        Ok(())
    }
}

/// Split location list output into clean identifiers
///
/// Tokens are separated by whitespace and may carry punctuation such as
/// trailing commas; tokens that are pure decoration are dropped.
pub fn parse_locations(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(trim_decoration)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
