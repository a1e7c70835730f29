//! Parsing of `nordvpn status` output
//!
//! The control program prints a loosely formatted block such as:
//!
//! ```text
//! Status: Connected
//! Hostname: de1042.nordvpn.com
//! Country: Germany
//! City: Berlin
//! Uptime: 2 hours 5 minutes 10 seconds
//! ```
//!
//! Line 0 carries the tunnel state. The labeled fields are only read while
//! connected. Lines are stripped of surrounding punctuation and box-drawing
//! characters before inspection, since the tool decorates its output with a
//! spinner on some versions.

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StatusError {
    #[error("Unrecognized connectivity in status line: {0:?}")]
    UnrecognizedConnectivity(String),
}

/// Tunnel state as self-reported by the control program
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Connectivity {
    Connected,
    Disconnected,
    Reconnecting,
    /// Not yet determined; never produced by a successful parse
    #[default]
    Unknown,
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connectivity::Connected => write!(f, "Connected"),
            Connectivity::Disconnected => write!(f, "Disconnected"),
            Connectivity::Reconnecting => write!(f, "Reconnecting"),
            Connectivity::Unknown => write!(f, "Unknown"),
        }
    }
}

impl Connectivity {
    /// Resolve connectivity from the trailing word of a status line
    ///
    /// Matching is case-sensitive, so "Disconnected" never reads as
    /// "Connected".
    pub fn from_status_line(line: &str) -> Result<Self, StatusError> {
        if line.ends_with("Connected") {
            Ok(Connectivity::Connected)
        } else if line.ends_with("Disconnected") {
            Ok(Connectivity::Disconnected)
        } else if line.ends_with("Reconnecting") {
            Ok(Connectivity::Reconnecting)
        } else {
            Err(StatusError::UnrecognizedConnectivity(line.to_string()))
        }
    }
}

/// Parsed connection record for one cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionState {
    pub connectivity: Connectivity,
    /// Exit country, only set while connected
    pub country: Option<String>,
    /// Exit city, only set while connected
    pub city: Option<String>,
    /// Session age, zero unless connected
    #[serde(serialize_with = "serialize_secs")]
    pub uptime: Duration,
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_secs())
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        self.connectivity == Connectivity::Connected
    }
}

/// Strip characters that are neither letters nor digits from both ends
pub(crate) fn trim_decoration(s: &str) -> &str {
    s.trim_matches(|c: char| !c.is_alphanumeric())
}

/// Parse the full status block into a [`ConnectionState`]
pub fn parse_status(text: &str) -> Result<ConnectionState, StatusError> {
    let mut lines = text.split('\n').map(trim_decoration);

    // split always yields at least one item
    let first = lines.next().unwrap_or_default();
    let connectivity = Connectivity::from_status_line(first)?;

    let mut state = ConnectionState {
        connectivity,
        ..Default::default()
    };

    if connectivity != Connectivity::Connected {
        return Ok(state);
    }

    for line in std::iter::once(first).chain(lines) {
        let mut tokens = line.split_whitespace();
        let Some(label) = tokens.next() else {
            continue;
        };
        let rest: Vec<&str> = tokens.collect();

        match label.trim_end_matches(':') {
            "Country" => state.country = non_empty(rest.join(" ")),
            "City" => state.city = non_empty(rest.join(" ")),
            "Uptime" => state.uptime = parse_uptime(&rest),
            _ => {}
        }
    }

    Ok(state)
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

/// Sum an uptime phrase into a duration
///
/// Accepts both the spelled-out form the tool prints
/// (`2 hours 5 minutes 10 seconds`) and the compact one (`2h 5m 10s`).
/// Units are recognized by their first letter; unknown units and
/// unparsable numbers contribute nothing.
pub fn parse_uptime(tokens: &[&str]) -> Duration {
    let mut total: u64 = 0;
    let mut pending: Option<u64> = None;

    for token in tokens {
        let split = token
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(token.len());
        let (number, unit) = token.split_at(split);

        let (value, unit) = match (number.parse::<u64>().ok(), unit) {
            (Some(n), "") => {
                pending = Some(n);
                continue;
            }
            (Some(n), unit) => (n, unit),
            (None, unit) => match pending.take() {
                Some(n) => (n, unit),
                None => continue,
            },
        };

        total = total.saturating_add(value.saturating_mul(unit_seconds(unit)));
    }

    Duration::from_secs(total)
}

fn unit_seconds(unit: &str) -> u64 {
    match unit.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('d') => 24 * 3600,
        Some('h') => 3600,
        Some('m') => 60,
        Some('s') => 1,
        _ => 0,
    }
}
