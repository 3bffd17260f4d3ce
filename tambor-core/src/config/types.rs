//! Configuration type definitions
//!
//! Defaults match the stock washer wiring and the timings the panel
//! programs were tuned with.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Timings used by the wash cycle sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct CycleTiming {
    /// Drain duration after each fill-and-shake phase (ms)
    pub dump_ms: u32,
    /// Clockwise drive pulse inside a shake period (ms)
    pub shake_cw_pulse_ms: u32,
    /// Counter-clockwise drive pulse inside a shake period (ms)
    pub shake_ccw_pulse_ms: u32,
    /// Short spin at the end of every rinse iteration (s)
    pub rinse_spin_s: u16,
    /// Pump-only soak before the drum starts spinning (ms)
    pub spin_soak_ms: u32,
    /// Interval between bleach spray pulses during each rinse spin (ms)
    pub spray_interval_ms: u32,
    /// Length of one spray pulse (ms)
    pub spray_pulse_ms: u32,
}

impl Default for CycleTiming {
    fn default() -> Self {
        Self {
            dump_ms: 6 * 60 * 1000,
            shake_cw_pulse_ms: 60,
            shake_ccw_pulse_ms: 50,
            rinse_spin_s: 90,
            spin_soak_ms: 1000,
            spray_interval_ms: 20_000,
            spray_pulse_ms: 2_000,
        }
    }
}

/// Durations and periods behind the panel selections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct ProgramPresets {
    /// Prewash shake duration (s)
    pub prewash_s: u16,
    /// Soak after prewash (s)
    pub prewash_break_s: u16,
    /// Short break preset (s)
    pub break_short_s: u16,
    /// Long break preset (s)
    pub break_long_s: u16,
    /// Main wash shake duration (s)
    pub wash_s: u16,
    /// Final spin duration (s)
    pub centrifuge_s: u16,
    /// Shake period for white and color loads (ms)
    pub shake_period_ms: u16,
    /// Shake period for delicate loads (ms)
    pub delicate_shake_period_ms: u16,
}

impl Default for ProgramPresets {
    fn default() -> Self {
        Self {
            prewash_s: 240,
            prewash_break_s: 900,
            break_short_s: 240,
            break_long_s: 720,
            wash_s: 300,
            centrifuge_s: 240,
            shake_period_ms: 882,
            delicate_shake_period_ms: 1200,
        }
    }
}

/// Front panel cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct PanelTiming {
    /// Power LED blink half-period while waiting or paused (ms)
    pub blink_ms: u32,
    /// All-LEDs-on lamp test after power-on (ms)
    pub self_test_ms: u32,
    /// Whole-panel blink half-period in the error state (ms)
    pub error_blink_ms: u32,
    /// Time each matrix row stays selected (ms)
    pub scan_row_ms: u32,
}

impl Default for PanelTiming {
    fn default() -> Self {
        Self {
            blink_ms: 700,
            self_test_ms: 1000,
            error_blink_ms: 500,
            scan_row_ms: 5,
        }
    }
}

/// Bus timeouts for expander traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct IoTiming {
    /// Pressure switch port read (ms)
    pub switch_read_timeout_ms: u32,
    /// Actuator output writes (ms)
    pub actuator_timeout_ms: u32,
    /// Panel row/column refresh (ms)
    pub panel_timeout_ms: u32,
}

impl Default for IoTiming {
    fn default() -> Self {
        Self {
            switch_read_timeout_ms: 100,
            actuator_timeout_ms: 100,
            panel_timeout_ms: 20,
        }
    }
}

/// Complete washer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct WasherConfig {
    pub cycle: CycleTiming,
    pub program: ProgramPresets,
    pub panel: PanelTiming,
    pub io: IoTiming,
}

impl WasherConfig {
    /// Create the stock configuration
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WasherConfig::new();
        assert_eq!(config.cycle.dump_ms, 360_000);
        assert_eq!(config.cycle.rinse_spin_s, 90);
        assert_eq!(config.program.shake_period_ms, 882);
        assert_eq!(config.program.delicate_shake_period_ms, 1200);
        assert_eq!(config.panel.blink_ms, 700);
        assert_eq!(config.io.switch_read_timeout_ms, 100);
    }

    #[test]
    fn test_pulses_fit_in_half_period() {
        let config = WasherConfig::new();
        let half = u32::from(config.program.shake_period_ms) / 2;
        assert!(config.cycle.shake_cw_pulse_ms < half);
        assert!(config.cycle.shake_ccw_pulse_ms < half);
    }
}
