//! Indicator LED sink

use crate::panel::LedMask;

/// Bit-mask driven indicator output
pub trait IndicatorPanel {
    fn set(&mut self, leds: LedMask);

    fn clear(&mut self, leds: LedMask);

    fn toggle(&mut self, leds: LedMask);

    /// Clear then set in one update
    fn set_and_clear(&mut self, set: LedMask, clear: LedMask) {
        self.clear(clear);
        self.set(set);
    }

    /// Currently lit LEDs
    fn lit(&self) -> LedMask;
}
