//! Actuator outputs: drum motor, drain pump and inlet valves
//!
//! The motor and pump sit on one port expander, the valves on another one
//! that also carries the pressure switch inputs. All outputs are active-low:
//! a cleared port bit switches the load on.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Motor clockwise output bit on the motor/pump expander
pub const MOTOR_CW_BIT: u8 = 1 << 0;
/// Motor counter-clockwise output bit on the motor/pump expander
pub const MOTOR_CCW_BIT: u8 = 1 << 1;
/// Drain pump output bit on the motor/pump expander
pub const PUMP_BIT: u8 = 1 << 2;
/// All output bits owned by the motor/pump expander
pub const MOTOR_PUMP_OUTPUTS: u8 = MOTOR_CW_BIT | MOTOR_CCW_BIT | PUMP_BIT;

/// All output bits owned by the valve expander
pub const VALVE_OUTPUTS: u8 = Valve::Bleach.port_bit() | Valve::Soap.port_bit() | Valve::Softener.port_bit();

/// Drum motor direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MotorDirection {
    #[default]
    Off,
    Clockwise,
    CounterClockwise,
}

/// Water inlet valves, named after the detergent compartment they flush
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Valve {
    Soap,
    Bleach,
    Softener,
}

impl Valve {
    pub const ALL: [Valve; 3] = [Valve::Soap, Valve::Bleach, Valve::Softener];

    const fn index(self) -> usize {
        match self {
            Valve::Soap => 0,
            Valve::Bleach => 1,
            Valve::Softener => 2,
        }
    }

    /// Output bit on the valve expander
    pub const fn port_bit(self) -> u8 {
        match self {
            Valve::Bleach => 1 << 7,
            Valve::Soap => 1 << 6,
            Valve::Softener => 1 << 5,
        }
    }
}

/// Set/clear masks for one expander output register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortUpdate {
    pub set: u8,
    pub clear: u8,
}

impl PortUpdate {
    fn drive(&mut self, bit: u8, on: bool) {
        // Active-low
        if on {
            self.clear |= bit;
        } else {
            self.set |= bit;
        }
    }
}

/// Commanded state of every actuator
///
/// Owned by the sequencer and mirrored to the expanders by the firmware
/// inside the same lock, so the struct always matches what the hardware
/// was last told.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ActuatorState {
    pub motor: MotorDirection,
    pub pump: bool,
    valves: [bool; 3],
}

impl ActuatorState {
    /// Everything off: motor stopped, pump off, all valves closed
    pub const fn all_off() -> Self {
        Self {
            motor: MotorDirection::Off,
            pump: false,
            valves: [false; 3],
        }
    }

    pub fn is_all_off(&self) -> bool {
        *self == Self::all_off()
    }

    pub fn valve(&self, valve: Valve) -> bool {
        self.valves[valve.index()]
    }

    pub fn set_valve(&mut self, valve: Valve, open: bool) {
        self.valves[valve.index()] = open;
    }

    pub fn close_all_valves(&mut self) {
        self.valves = [false; 3];
    }

    /// Number of valves currently open
    pub fn open_valves(&self) -> usize {
        self.valves.iter().filter(|open| **open).count()
    }

    /// Output masks for the motor/pump expander
    pub fn motor_pump_update(&self) -> PortUpdate {
        let mut update = PortUpdate::default();
        update.drive(MOTOR_CW_BIT, self.motor == MotorDirection::Clockwise);
        update.drive(MOTOR_CCW_BIT, self.motor == MotorDirection::CounterClockwise);
        update.drive(PUMP_BIT, self.pump);
        update
    }

    /// Output masks for the valve expander
    pub fn valve_update(&self) -> PortUpdate {
        let mut update = PortUpdate::default();
        for valve in Valve::ALL {
            update.drive(valve.port_bit(), self.valve(valve));
        }
        update
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_off_drives_every_output_high() {
        let state = ActuatorState::all_off();
        assert_eq!(
            state.motor_pump_update(),
            PortUpdate {
                set: MOTOR_PUMP_OUTPUTS,
                clear: 0
            }
        );
        assert_eq!(
            state.valve_update(),
            PortUpdate {
                set: VALVE_OUTPUTS,
                clear: 0
            }
        );
    }

    #[test]
    fn test_active_low_mapping() {
        let mut state = ActuatorState::all_off();
        state.motor = MotorDirection::CounterClockwise;
        state.pump = true;
        state.set_valve(Valve::Soap, true);

        let mp = state.motor_pump_update();
        assert_eq!(mp.clear, MOTOR_CCW_BIT | PUMP_BIT);
        assert_eq!(mp.set, MOTOR_CW_BIT);

        let v = state.valve_update();
        assert_eq!(v.clear, 1 << 6);
        assert_eq!(v.set, (1 << 7) | (1 << 5));
    }

    #[test]
    fn test_masks_never_overlap() {
        for motor in [
            MotorDirection::Off,
            MotorDirection::Clockwise,
            MotorDirection::CounterClockwise,
        ] {
            let mut state = ActuatorState::all_off();
            state.motor = motor;
            let mp = state.motor_pump_update();
            assert_eq!(mp.set & mp.clear, 0);
            assert_eq!(mp.set | mp.clear, MOTOR_PUMP_OUTPUTS);
        }
    }

    #[test]
    fn test_valve_bookkeeping() {
        let mut state = ActuatorState::all_off();
        state.set_valve(Valve::Bleach, true);
        state.set_valve(Valve::Softener, true);
        assert_eq!(state.open_valves(), 2);
        assert!(!state.is_all_off());
        state.close_all_valves();
        assert!(state.is_all_off());
    }
}
