//! Pressure switch snapshot

use portable_atomic::{AtomicU8, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Port bits carrying switch inputs; a set bit means the switch is closed
pub const SWITCH_INPUTS: u8 = 0x0F;

/// Individual switches on the input port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Switch {
    Lid,
    Overflow,
    Level1,
    Level2,
}

impl Switch {
    pub const ALL: [Switch; 4] = [Switch::Lid, Switch::Overflow, Switch::Level1, Switch::Level2];

    pub const fn port_bit(self) -> u8 {
        match self {
            Switch::Lid => 1 << 0,
            Switch::Overflow => 1 << 1,
            Switch::Level1 => 1 << 2,
            Switch::Level2 => 1 << 3,
        }
    }
}

/// Closed/open state of every switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PressureSwitchState {
    pub level_1: bool,
    pub level_2: bool,
    pub overflow: bool,
    /// Lid closed
    pub lid: bool,
}

impl PressureSwitchState {
    pub fn from_port(port: u8) -> Self {
        Self {
            level_1: port & Switch::Level1.port_bit() != 0,
            level_2: port & Switch::Level2.port_bit() != 0,
            overflow: port & Switch::Overflow.port_bit() != 0,
            lid: port & Switch::Lid.port_bit() != 0,
        }
    }

    /// Inverse of [`PressureSwitchState::from_port`]
    pub fn to_port(self) -> u8 {
        Switch::ALL
            .iter()
            .filter(|s| self.is_closed(**s))
            .fold(0, |acc, s| acc | s.port_bit())
    }

    pub fn is_closed(&self, switch: Switch) -> bool {
        match switch {
            Switch::Lid => self.lid,
            Switch::Overflow => self.overflow,
            Switch::Level1 => self.level_1,
            Switch::Level2 => self.level_2,
        }
    }
}

/// Single-writer, multi-reader switch snapshot
///
/// The whole state lives in one byte so every update is a single store.
#[derive(Debug, Default)]
pub struct SharedSwitchState {
    bits: AtomicU8,
}

impl SharedSwitchState {
    pub const fn new() -> Self {
        Self {
            bits: AtomicU8::new(0),
        }
    }

    pub fn store(&self, state: PressureSwitchState) {
        self.bits.store(state.to_port(), Ordering::Release);
    }

    pub fn load(&self) -> PressureSwitchState {
        PressureSwitchState::from_port(self.bits.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_layout() {
        let state = PressureSwitchState::from_port(0b0000_1101);
        assert!(state.lid);
        assert!(!state.overflow);
        assert!(state.level_1);
        assert!(state.level_2);
    }

    #[test]
    fn test_level_2_reads_its_own_bit() {
        let state = PressureSwitchState::from_port(Switch::Level1.port_bit());
        assert!(state.level_1);
        assert!(!state.level_2);
    }

    #[test]
    fn test_upper_bits_ignored() {
        assert_eq!(
            PressureSwitchState::from_port(0xF0),
            PressureSwitchState::default()
        );
    }

    #[test]
    fn test_shared_round_trip() {
        let shared = SharedSwitchState::new();
        assert_eq!(shared.load(), PressureSwitchState::default());
        let state = PressureSwitchState {
            level_1: true,
            lid: true,
            ..Default::default()
        };
        shared.store(state);
        assert_eq!(shared.load(), state);
    }
}
