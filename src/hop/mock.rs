//! In-memory stand-ins for the control program, probe and picker

use super::LocationPicker;
use crate::nordvpn::{ControlError, VpnControl};
use crate::probe::Reachability;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Duration;

pub struct MockControl {
    pub status_text: String,
    pub locations: Vec<String>,
    pub status_delay: Duration,
    pub locations_delay: Duration,
    pub fail_status: bool,
    pub fail_locations: bool,
    pub fail_connect: bool,
    pub status_calls: Cell<usize>,
    pub connects: RefCell<Vec<String>>,
}

impl MockControl {
    pub fn new(status_text: &str, locations: &[&str]) -> Self {
        Self {
            status_text: status_text.to_string(),
            locations: locations.iter().map(|s| s.to_string()).collect(),
            status_delay: Duration::ZERO,
            locations_delay: Duration::ZERO,
            fail_status: false,
            fail_locations: false,
            fail_connect: false,
            status_calls: Cell::new(0),
            connects: RefCell::new(Vec::new()),
        }
    }

    fn failure(command: &str) -> ControlError {
        ControlError::Failed {
            command: command.to_string(),
            code: "exit status: 1".to_string(),
            stderr: "mock failure".to_string(),
        }
    }
}

impl VpnControl for MockControl {
    async fn status(&self) -> Result<String, ControlError> {
        tokio::time::sleep(self.status_delay).await;
        self.status_calls.set(self.status_calls.get() + 1);
        if self.fail_status {
            return Err(Self::failure("nordvpn status"));
        }
        Ok(self.status_text.clone())
    }

    async fn locations(&self) -> Result<Vec<String>, ControlError> {
        tokio::time::sleep(self.locations_delay).await;
        if self.fail_locations {
            return Err(Self::failure("nordvpn countries"));
        }
        Ok(self.locations.clone())
    }

    async fn connect(&self, location: &str) -> Result<(), ControlError> {
        if self.fail_connect {
            return Err(Self::failure("nordvpn connect"));
        }
        self.connects.borrow_mut().push(location.to_string());
        Ok(())
    }
}

pub struct MockProbe {
    reachable: bool,
    delay: Duration,
}

impl MockProbe {
    pub fn new(reachable: bool) -> Self {
        Self {
            reachable,
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl Reachability for MockProbe {
    async fn probe(&self) -> bool {
        tokio::time::sleep(self.delay).await;
        self.reachable
    }
}

/// Replays a fixed sequence of indices
pub struct SequencePicker(pub VecDeque<usize>);

impl SequencePicker {
    pub fn new(indices: &[usize]) -> Self {
        Self(indices.iter().copied().collect())
    }
}

impl LocationPicker for SequencePicker {
    fn pick(&mut self, len: usize) -> usize {
        self.0.pop_front().unwrap_or(0) % len
    }
}
