//! Exit location rotation
//!
//! Each cycle gathers a [`Snapshot`] (tunnel status, available locations,
//! general reachability), turns it into a [`Decision`], and carries out a
//! rotation if one is due. Every error here is fatal: the supervisor running
//! us is expected to restart the process.

pub mod collector;
pub mod decision;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod mock;

pub use collector::{Snapshot, collect};
pub use decision::{Decision, LocationPicker, RandomPicker, decide};
pub use scheduler::{Hopper, run_cycle};

use crate::config::ConfigError;
use crate::nordvpn::{ControlError, StatusError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HopError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("VPN control program error: {0}")]
    Control(#[from] ControlError),
    #[error("Status output changed format: {0}")]
    Status(#[from] StatusError),
    #[error("Connected to VPN but there is no internet connection")]
    BrokenTunnel,
    #[error("Disconnected from VPN and no internet connection is available")]
    NoInternet,
    #[error("VPN is reconnecting, the control program might be frozen")]
    Stuck,
    #[error("VPN connectivity was never determined")]
    UnknownState,
    #[error("No exit locations available to rotate to")]
    NoLocations,
}
