//! User selections made on the panel while waiting

use crate::config::ProgramPresets;
use crate::cycle::{WashParams, WashStep, WaterLevel};
use crate::panel::Button;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Highest rinse count the panel offers
pub const MAX_PANEL_RINSES: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ClothingType {
    #[default]
    Color,
    White,
    Delicate,
}

impl ClothingType {
    pub fn next(self) -> Self {
        match self {
            ClothingType::Color => ClothingType::White,
            ClothingType::White => ClothingType::Delicate,
            ClothingType::Delicate => ClothingType::Color,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BreakDuration {
    #[default]
    Short,
    Long,
}

impl BreakDuration {
    pub fn next(self) -> Self {
        match self {
            BreakDuration::Short => BreakDuration::Long,
            BreakDuration::Long => BreakDuration::Short,
        }
    }
}

/// Current panel selections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Selections {
    pub water_level: WaterLevel,
    pub clothing: ClothingType,
    /// Step the cycle will start at
    pub program: WashStep,
    /// 1..=MAX_PANEL_RINSES
    pub rinse_count: u8,
    pub break_duration: BreakDuration,
}

impl Default for Selections {
    fn default() -> Self {
        Self {
            water_level: WaterLevel::Low,
            clothing: ClothingType::Color,
            program: WashStep::Prewash,
            rinse_count: 1,
            break_duration: BreakDuration::Short,
        }
    }
}

impl Selections {
    /// Cycle the selection behind `button`
    ///
    /// Returns false for buttons that are not selections.
    pub fn apply(&mut self, button: Button) -> bool {
        match button {
            Button::WaterLevel => self.water_level = self.water_level.next(),
            Button::ClothingType => self.clothing = self.clothing.next(),
            Button::Program => self.program = self.program.next(),
            Button::RinseCount => {
                self.rinse_count = if self.rinse_count >= MAX_PANEL_RINSES {
                    1
                } else {
                    self.rinse_count + 1
                };
            }
            Button::BreakDuration => self.break_duration = self.break_duration.next(),
            Button::Power | Button::StartPause => return false,
        }
        true
    }

    /// Merge the selections into cycle parameters
    pub fn to_params(&self, presets: &ProgramPresets) -> WashParams {
        let period = match self.clothing {
            ClothingType::Delicate => presets.delicate_shake_period_ms,
            ClothingType::Color | ClothingType::White => presets.shake_period_ms,
        };
        let break_s = match self.break_duration {
            BreakDuration::Short => presets.break_short_s,
            BreakDuration::Long => presets.break_long_s,
        };
        WashParams {
            water_level: self.water_level,
            rinse_count: self.rinse_count,
            prewash_shake_period_ms: period,
            wash_shake_period_ms: period,
            break_s,
            first_step: self.program,
            ..WashParams::from_presets(presets)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rinse_count_wraps() {
        let mut s = Selections::default();
        let mut seen = [0u8; 4];
        for slot in seen.iter_mut() {
            *slot = s.rinse_count;
            s.apply(Button::RinseCount);
        }
        assert_eq!(seen, [1, 2, 3, 1]);
    }

    #[test]
    fn test_non_selection_buttons() {
        let mut s = Selections::default();
        assert!(!s.apply(Button::Power));
        assert!(!s.apply(Button::StartPause));
        assert_eq!(s, Selections::default());
    }

    #[test]
    fn test_to_params() {
        let presets = ProgramPresets::default();
        let s = Selections {
            water_level: WaterLevel::High,
            clothing: ClothingType::Delicate,
            program: WashStep::Wash,
            rinse_count: 2,
            break_duration: BreakDuration::Long,
        };
        let p = s.to_params(&presets);
        assert_eq!(p.water_level, WaterLevel::High);
        assert_eq!(p.wash_shake_period_ms, 1200);
        assert_eq!(p.prewash_shake_period_ms, 1200);
        assert_eq!(p.break_s, presets.break_long_s);
        assert_eq!(p.rinse_count, 2);
        assert_eq!(p.first_step, WashStep::Wash);
        assert_eq!(p.wash_s, presets.wash_s);

        let p = Selections::default().to_params(&presets);
        assert_eq!(p.wash_shake_period_ms, 882);
        assert_eq!(p.break_s, presets.break_short_s);
        assert!(p.validate().is_ok());
    }

    fn arb_button() -> impl Strategy<Value = Button> {
        prop_oneof![
            Just(Button::Power),
            Just(Button::StartPause),
            Just(Button::WaterLevel),
            Just(Button::ClothingType),
            Just(Button::Program),
            Just(Button::RinseCount),
            Just(Button::BreakDuration),
        ]
    }

    proptest! {
        #[test]
        fn prop_selections_stay_in_domain(buttons in prop::collection::vec(arb_button(), 0..64)) {
            let mut s = Selections::default();
            let mut rinse_presses = 0usize;
            for b in &buttons {
                s.apply(*b);
                if *b == Button::RinseCount {
                    rinse_presses += 1;
                }
            }
            prop_assert!((1..=MAX_PANEL_RINSES).contains(&s.rinse_count));
            prop_assert_eq!(usize::from(s.rinse_count), rinse_presses % 3 + 1);
            prop_assert!(s.to_params(&ProgramPresets::default()).validate().is_ok());
        }
    }
}
