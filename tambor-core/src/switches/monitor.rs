//! Switch edge detection

use heapless::Vec;

use super::state::{PressureSwitchState, SharedSwitchState, Switch, SWITCH_INPUTS};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SwitchTransition {
    Opened,
    Closed,
}

/// One switch changing state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SwitchEvent {
    pub switch: Switch,
    pub transition: SwitchTransition,
}

pub type SwitchEvents = Vec<SwitchEvent, 4>;

/// Edge detector over successive port reads
#[derive(Debug, Clone, Default)]
pub struct SwitchMonitor {
    last_port: u8,
    /// Set after a failed read; no read is attempted before it
    retry_at: Option<u64>,
}

impl SwitchMonitor {
    /// Monitor with every switch assumed open
    pub const fn new() -> Self {
        Self {
            last_port: 0,
            retry_at: None,
        }
    }

    /// Adopt a port value without reporting any edges
    pub fn seed(&mut self, port: u8, shared: &SharedSwitchState) -> PressureSwitchState {
        self.last_port = port & SWITCH_INPUTS;
        let state = PressureSwitchState::from_port(self.last_port);
        shared.store(state);
        state
    }

    /// Snapshot the monitor last saw
    pub fn state(&self) -> PressureSwitchState {
        PressureSwitchState::from_port(self.last_port)
    }

    /// Record a failed read at `now`
    ///
    /// Returns the time before which the port must not be read again; the
    /// interrupt line stays asserted after a failed read.
    pub fn read_failed(&mut self, now: u64, hold_off_ms: u32) -> u64 {
        let at = now + u64::from(hold_off_ms);
        self.retry_at = Some(at);
        at
    }

    /// Earliest next read after a failure, cleared by a successful read
    pub fn retry_at(&self) -> Option<u64> {
        self.retry_at
    }

    /// Process a fresh port read
    ///
    /// Stores the new snapshot in `shared` first and then returns one event
    /// per switch whose bit changed, so anyone reacting to an event already
    /// sees the matching state.
    pub fn update(&mut self, port: u8, shared: &SharedSwitchState) -> SwitchEvents {
        let port = port & SWITCH_INPUTS;
        self.retry_at = None;
        let changed = port ^ self.last_port;
        self.last_port = port;
        shared.store(PressureSwitchState::from_port(port));

        let mut events = SwitchEvents::new();
        for switch in Switch::ALL {
            let bit = switch.port_bit();
            if changed & bit == 0 {
                continue;
            }
            let transition = if port & bit != 0 {
                SwitchTransition::Closed
            } else {
                SwitchTransition::Opened
            };
            let _ = events.push(SwitchEvent { switch, transition });
        }
        events
    }
}
