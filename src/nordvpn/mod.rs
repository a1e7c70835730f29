//! NordVPN control program integration
//!
//! The VPN itself is managed entirely by the vendor's CLI. We only invoke it
//! for three operations:
//!
//! - `status`: human-readable connection block, parsed by [`status`]
//! - `countries`: whitespace-separated exit locations
//! - `connect <location>`: switch exit, exit code is the only signal
//!
//! [`VpnControl`] is the seam the hop engine talks to, so tests can stand in
//! for the real program.

pub mod cli;
pub mod status;

pub use cli::{NordVpnCli, parse_locations};
pub use status::{Connectivity, ConnectionState, StatusError, parse_status};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ControlError {
    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("`{command}` exited with {code}: {stderr}")]
    Failed {
        command: String,
        code: String,
        stderr: String,
    },
    #[error("`{command}` did not finish within {secs}s")]
    Timeout { command: String, secs: u64 },
}

/// Operations the hop engine needs from the VPN control program
#[allow(async_fn_in_trait)]
pub trait VpnControl {
    /// Raw output of the status command
    async fn status(&self) -> Result<String, ControlError>;
    /// Available exit locations, already cleaned
    async fn locations(&self) -> Result<Vec<String>, ControlError>;
    /// Connect to the given exit location
    async fn connect(&self, location: &str) -> Result<(), ControlError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_error_display() {
        let err = ControlError::Failed {
            command: "nordvpn connect Atlantis".to_string(),
            code: "exit status: 1".to_string(),
            stderr: "The specified server does not exist.".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("nordvpn connect Atlantis"));
        assert!(msg.contains("does not exist"));

        let err = ControlError::Timeout {
            command: "nordvpn status".to_string(),
            secs: 30,
        };
        assert_eq!(err.to_string(), "`nordvpn status` did not finish within 30s");
    }
}
