//! Indicator LEDs and panel rendering

use portable_atomic::{AtomicU32, Ordering};

use crate::cycle::{WashStep, WaterLevel};
use crate::state::{BreakDuration, ClothingType, DeviceState, Selections};
use crate::traits::IndicatorPanel;

/// Bit mask over all panel LEDs
pub type LedMask = u32;

const fn led(row: u32, col: u32) -> LedMask {
    1 << (8 * row + col)
}

pub const WATER_LOW: LedMask = led(3, 1);
pub const WATER_MID: LedMask = led(3, 2);
pub const WATER_HIGH: LedMask = led(3, 3);
pub const CLOTHING_WHITE: LedMask = led(3, 4);
pub const CLOTHING_COLOR: LedMask = led(3, 5);
pub const CLOTHING_DELICATE: LedMask = led(3, 6);
pub const PROGRAM_PREWASH: LedMask = led(2, 6);
pub const PROGRAM_BREAK: LedMask = led(2, 5);
pub const PROGRAM_WASH: LedMask = led(2, 4);
pub const PROGRAM_RINSE: LedMask = led(2, 3);
pub const PROGRAM_CENTRIFUGE: LedMask = led(2, 2);
pub const RINSE_1: LedMask = led(1, 0);
pub const RINSE_2: LedMask = led(2, 0);
pub const RINSE_3: LedMask = led(2, 1);
pub const BREAK_SHORT: LedMask = led(1, 2);
pub const BREAK_LONG: LedMask = led(1, 1);
pub const POWER: LedMask = led(1, 3);

/// Every LED that [`render_panel`] owns
pub const RENDERED: LedMask = WATER_LOW
    | WATER_MID
    | WATER_HIGH
    | CLOTHING_WHITE
    | CLOTHING_COLOR
    | CLOTHING_DELICATE
    | PROGRAM_PREWASH
    | PROGRAM_BREAK
    | PROGRAM_WASH
    | PROGRAM_RINSE
    | PROGRAM_CENTRIFUGE
    | RINSE_1
    | RINSE_2
    | RINSE_3
    | BREAK_SHORT
    | BREAK_LONG;

/// Every LED on the panel
pub const ALL: LedMask = RENDERED | POWER;

fn water_led(level: WaterLevel) -> LedMask {
    match level {
        WaterLevel::Low => WATER_LOW,
        WaterLevel::Mid => WATER_MID,
        WaterLevel::High => WATER_HIGH,
    }
}

fn clothing_led(clothing: ClothingType) -> LedMask {
    match clothing {
        ClothingType::White => CLOTHING_WHITE,
        ClothingType::Color => CLOTHING_COLOR,
        ClothingType::Delicate => CLOTHING_DELICATE,
    }
}

fn step_led(step: WashStep) -> LedMask {
    match step {
        WashStep::Prewash => PROGRAM_PREWASH,
        WashStep::Break => PROGRAM_BREAK,
        WashStep::Wash => PROGRAM_WASH,
        WashStep::Rinse => PROGRAM_RINSE,
        WashStep::Centrifuge => PROGRAM_CENTRIFUGE,
    }
}

fn rinse_led(count: u8) -> LedMask {
    match count {
        1 => RINSE_1,
        2 => RINSE_2,
        3 => RINSE_3,
        _ => 0,
    }
}

fn break_led(duration: BreakDuration) -> LedMask {
    match duration {
        BreakDuration::Short => BREAK_SHORT,
        BreakDuration::Long => BREAK_LONG,
    }
}

/// Compute the lit subset of [`RENDERED`]
///
/// The program row lights every step from `shown` onward: the selected
/// program while waiting, the current step while a cycle is alive. The
/// power LED is never part of the result.
pub fn render_panel(state: DeviceState, selections: &Selections, current: WashStep) -> LedMask {
    let shown = match state {
        DeviceState::Waiting => selections.program,
        DeviceState::Running | DeviceState::Paused => current,
        DeviceState::Standby | DeviceState::Error => return 0,
    };

    let program = WashStep::ALL
        .iter()
        .filter(|step| **step >= shown)
        .fold(0, |acc, step| acc | step_led(*step));

    water_led(selections.water_level)
        | clothing_led(selections.clothing)
        | program
        | rinse_led(selections.rinse_count)
        | break_led(selections.break_duration)
}

/// LED mask shared between the state machine and the panel scanner
#[derive(Debug, Default)]
pub struct SharedIndicators {
    mask: AtomicU32,
}

impl SharedIndicators {
    pub const fn new() -> Self {
        Self {
            mask: AtomicU32::new(0),
        }
    }

    pub fn load(&self) -> LedMask {
        self.mask.load(Ordering::Acquire)
    }
}

impl IndicatorPanel for &SharedIndicators {
    fn set(&mut self, leds: LedMask) {
        self.mask.fetch_or(leds, Ordering::AcqRel);
    }

    fn clear(&mut self, leds: LedMask) {
        self.mask.fetch_and(!leds, Ordering::AcqRel);
    }

    fn toggle(&mut self, leds: LedMask) {
        self.mask.fetch_xor(leds, Ordering::AcqRel);
    }

    fn set_and_clear(&mut self, set: LedMask, clear: LedMask) {
        let _ = self
            .mask
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |m| {
                Some((m & !clear) | set)
            });
    }

    fn lit(&self) -> LedMask {
        self.load()
    }
}
