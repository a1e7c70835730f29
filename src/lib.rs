//! vpn-hop - keep the VPN exit location rotating
//!
//! Periodically asks the NordVPN CLI for its connection status and the list
//! of available exit locations, checks general internet reachability, and
//! reconnects to a random location once the current session is old enough.
//!
//! # Architecture
//!
//! - `config`: Configuration file handling (TOML)
//! - `nordvpn`: Control program invocation and output parsing
//! - `probe`: Outbound reachability check
//! - `hop`: Snapshot collection, rotation decision and the hop loop
//!
//! # Usage
//!
//! ```bash
//! vpn-hop run --min-uptime 600 --interval 3600
//! ```

pub mod config;
pub mod hop;
pub mod nordvpn;
pub mod probe;

pub use config::Config;
pub use hop::{HopError, Hopper};
