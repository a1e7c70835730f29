//! Rotation decision table
//!
//! | connectivity | reachable | uptime >= min | outcome |
//! |--------------|-----------|---------------|---------|
//! | Connected    | yes       | yes           | rotate |
//! | Connected    | yes       | no            | stay |
//! | Connected    | no        |               | fatal: broken tunnel |
//! | Disconnected | yes       |               | rotate |
//! | Disconnected | no        |               | fatal: no internet |
//! | Reconnecting |           |               | fatal: stuck |

use super::{HopError, Snapshot};
use crate::config::RotationConfig;
use crate::nordvpn::Connectivity;
use rand::Rng;
use std::time::Duration;

/// What a cycle should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Connect to `target`; it may equal the current location
    Rotate { target: String },
    /// Session is too young to rotate
    Stay {
        country: Option<String>,
        uptime: Duration,
    },
}

/// Chooses an index into the location list
pub trait LocationPicker {
    /// Return an index in `0..len`; `len` is never zero
    fn pick(&mut self, len: usize) -> usize;
}

/// Uniform picker backed by the thread-local OS-seeded generator
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPicker;

impl LocationPicker for RandomPicker {
    fn pick(&mut self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

pub fn decide<P: LocationPicker>(
    snapshot: &Snapshot,
    config: &RotationConfig,
    picker: &mut P,
) -> Result<Decision, HopError> {
    let state = &snapshot.state;

    match (state.connectivity, snapshot.reachable) {
        (Connectivity::Connected, true) if state.uptime >= config.min_uptime() => {
            pick_target(&snapshot.locations, picker)
        }
        (Connectivity::Connected, true) => Ok(Decision::Stay {
            country: state.country.clone(),
            uptime: state.uptime,
        }),
        (Connectivity::Connected, false) => Err(HopError::BrokenTunnel),
        (Connectivity::Disconnected, true) => pick_target(&snapshot.locations, picker),
        (Connectivity::Disconnected, false) => Err(HopError::NoInternet),
        (Connectivity::Reconnecting, _) => Err(HopError::Stuck),
        (Connectivity::Unknown, _) => Err(HopError::UnknownState),
    }
}

fn pick_target<P: LocationPicker>(
    locations: &[String],
    picker: &mut P,
) -> Result<Decision, HopError> {
    if locations.is_empty() {
        return Err(HopError::NoLocations);
    }
    let index = picker.pick(locations.len());
    Ok(Decision::Rotate {
        target: locations[index].clone(),
    })
}
