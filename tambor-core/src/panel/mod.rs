//! Front panel model
//!
//! The panel is a 4-row matrix: each row select drives up to eight LED
//! columns and two button columns. LED positions are addressed as one
//! 32-bit mask with bit `8 * row + col`.

pub mod buttons;
pub mod leds;

pub use buttons::{Button, ButtonPresses, ButtonScanner, PANEL_ROWS};
pub use leds::{render_panel, LedMask, SharedIndicators, RENDERED};
