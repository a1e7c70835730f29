//! Concurrent snapshot collection

use super::HopError;
use crate::nordvpn::{ConnectionState, VpnControl, parse_status};
use crate::probe::Reachability;
use serde::Serialize;
use tracing::debug;

/// Everything one cycle knows about the world
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub state: ConnectionState,
    pub locations: Vec<String>,
    pub reachable: bool,
}

/// Gather status, locations and reachability concurrently
///
/// The reachability probe goes first since its network round trip is usually
/// the slowest of the three. All three are awaited before anything is
/// inspected, so a failed status or location query never yields a partial
/// snapshot.
pub async fn collect<C, R>(control: &C, probe: &R) -> Result<Snapshot, HopError>
where
    C: VpnControl,
    R: Reachability,
{
    let (reachable, status, locations) =
        tokio::join!(probe.probe(), control.status(), control.locations());

    let state = parse_status(&status?)?;
    let locations = locations?;

    debug!(
        "Snapshot: {} reachable={} locations={}",
        state.connectivity,
        reachable,
        locations.len()
    );

    Ok(Snapshot {
        state,
        locations,
        reachable,
    })
}
