//! Wash parameters chosen on the panel

use crate::config::ProgramPresets;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Upper bound on rinse iterations a cycle will accept
pub const MAX_RINSE_COUNT: u8 = 6;

/// Fill target, in increasing order of water
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum WaterLevel {
    #[default]
    Low,
    Mid,
    High,
}

impl WaterLevel {
    /// Next level in panel order, wrapping around
    pub fn next(self) -> Self {
        match self {
            WaterLevel::Low => WaterLevel::Mid,
            WaterLevel::Mid => WaterLevel::High,
            WaterLevel::High => WaterLevel::Low,
        }
    }
}

/// Cycle steps in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum WashStep {
    #[default]
    Prewash,
    Break,
    Wash,
    Rinse,
    Centrifuge,
}

impl WashStep {
    pub const ALL: [WashStep; 5] = [
        WashStep::Prewash,
        WashStep::Break,
        WashStep::Wash,
        WashStep::Rinse,
        WashStep::Centrifuge,
    ];

    /// Next step in panel order, wrapping around
    pub fn next(self) -> Self {
        match self {
            WashStep::Prewash => WashStep::Break,
            WashStep::Break => WashStep::Wash,
            WashStep::Wash => WashStep::Rinse,
            WashStep::Rinse => WashStep::Centrifuge,
            WashStep::Centrifuge => WashStep::Prewash,
        }
    }
}

/// Parameter validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParamError {
    /// More rinse iterations than [`MAX_RINSE_COUNT`]
    TooManyRinses,
    /// Shake period of zero would never advance
    ZeroShakePeriod,
}

/// Everything a cycle needs to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WashParams {
    pub water_level: WaterLevel,
    pub rinse_count: u8,
    /// Shake period during prewash (ms)
    pub prewash_shake_period_ms: u16,
    /// Shake period during wash and rinse (ms)
    pub wash_shake_period_ms: u16,
    /// Prewash shake duration (s), zero skips prewash
    pub prewash_s: u16,
    /// Soak after prewash (s)
    pub prewash_break_s: u16,
    /// Soak before the main wash (s)
    pub break_s: u16,
    /// Main wash shake duration (s)
    pub wash_s: u16,
    /// Final spin duration (s)
    pub centrifuge_s: u16,
    /// Step the cycle starts at; earlier steps are skipped
    pub first_step: WashStep,
}

impl WashParams {
    /// Parameters built from the configured presets, one rinse, low water
    pub fn from_presets(presets: &ProgramPresets) -> Self {
        Self {
            water_level: WaterLevel::Low,
            rinse_count: 1,
            prewash_shake_period_ms: presets.shake_period_ms,
            wash_shake_period_ms: presets.shake_period_ms,
            prewash_s: presets.prewash_s,
            prewash_break_s: presets.prewash_break_s,
            break_s: presets.break_short_s,
            wash_s: presets.wash_s,
            centrifuge_s: presets.centrifuge_s,
            first_step: WashStep::Prewash,
        }
    }

    pub fn validate(&self) -> Result<(), ParamError> {
        if self.rinse_count > MAX_RINSE_COUNT {
            return Err(ParamError::TooManyRinses);
        }
        if self.prewash_shake_period_ms == 0 || self.wash_shake_period_ms == 0 {
            return Err(ParamError::ZeroShakePeriod);
        }
        Ok(())
    }
}

impl Default for WashParams {
    fn default() -> Self {
        let mut params = Self::from_presets(&ProgramPresets::default());
        params.rinse_count = 3;
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let p = WashParams::default();
        assert_eq!(p.prewash_s, 240);
        assert_eq!(p.prewash_break_s, 900);
        assert_eq!(p.break_s, 240);
        assert_eq!(p.wash_s, 300);
        assert_eq!(p.centrifuge_s, 240);
        assert_eq!(p.rinse_count, 3);
        assert_eq!(p.wash_shake_period_ms, 882);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut p = WashParams::default();
        p.rinse_count = MAX_RINSE_COUNT + 1;
        assert_eq!(p.validate(), Err(ParamError::TooManyRinses));

        let mut p = WashParams::default();
        p.wash_shake_period_ms = 0;
        assert_eq!(p.validate(), Err(ParamError::ZeroShakePeriod));
    }

    #[test]
    fn test_cycling_wraps() {
        assert_eq!(WaterLevel::High.next(), WaterLevel::Low);
        assert_eq!(WashStep::Centrifuge.next(), WashStep::Prewash);
        let mut step = WashStep::Prewash;
        for _ in 0..WashStep::ALL.len() {
            step = step.next();
        }
        assert_eq!(step, WashStep::Prewash);
    }

    #[test]
    fn test_step_order() {
        assert!(WashStep::Prewash < WashStep::Break);
        assert!(WashStep::Rinse < WashStep::Centrifuge);
    }
}
