//! Actuator outputs
//!
//! Mirrors [`ActuatorState`] onto the motor/pump and valve expanders.

use defmt::*;

use tambor_core::actuators::{ActuatorState, MOTOR_PUMP_OUTPUTS, VALVE_OUTPUTS};
use tambor_hal::{ExpanderError, PortExpander};

/// Expanders carrying the washer's actuators
pub struct ActuatorBank<E: 'static> {
    motor_pump: &'static E,
    valves: &'static E,
    timeout_ms: u32,
}

impl<E: PortExpander> ActuatorBank<E> {
    pub fn new(motor_pump: &'static E, valves: &'static E, timeout_ms: u32) -> Self {
        Self {
            motor_pump,
            valves,
            timeout_ms,
        }
    }

    /// Configure pin directions and drive every actuator off
    pub async fn init(&self, state: &ActuatorState) -> Result<(), ExpanderError> {
        // Outputs are active-low, so set the latch before turning pins around
        self.commit(state).await?;
        self.motor_pump
            .write_config(!MOTOR_PUMP_OUTPUTS, self.timeout_ms)
            .await?;
        // Switch inputs stay inputs along with every unused pin
        self.valves
            .write_config(!VALVE_OUTPUTS, self.timeout_ms)
            .await?;
        debug!("Actuator expanders configured");
        Ok(())
    }

    /// Write `state` to both expanders, motor and pump first
    pub async fn commit(&self, state: &ActuatorState) -> Result<(), ExpanderError> {
        let motor_pump = state.motor_pump_update();
        self.motor_pump
            .set_and_clear_bits(motor_pump.set, motor_pump.clear, self.timeout_ms)
            .await?;
        let valves = state.valve_update();
        self.valves
            .set_and_clear_bits(valves.set, valves.clear, self.timeout_ms)
            .await
    }
}
