//! Panel buttons and matrix scanning

use heapless::Vec;

use super::leds::LedMask;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of matrix rows
pub const PANEL_ROWS: usize = 4;

/// Button columns sampled per row
const BUTTON_COLUMNS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Button {
    Power,
    StartPause,
    WaterLevel,
    ClothingType,
    Program,
    RinseCount,
    BreakDuration,
}

const MATRIX: [[Option<Button>; BUTTON_COLUMNS]; PANEL_ROWS] = [
    [Some(Button::BreakDuration), None],
    [Some(Button::ClothingType), Some(Button::StartPause)],
    [Some(Button::Program), Some(Button::RinseCount)],
    [Some(Button::Power), Some(Button::WaterLevel)],
];

pub type ButtonPresses = Vec<Button, BUTTON_COLUMNS>;

/// Row-by-row matrix scanner with press-edge detection
///
/// The caller selects [`ButtonScanner::row`], drives the LED columns from
/// [`ButtonScanner::row_leds`], samples the button columns and hands them to
/// [`ButtonScanner::scan`], which moves on to the next row.
#[derive(Debug, Clone, Default)]
pub struct ButtonScanner {
    row: usize,
    held: [u8; PANEL_ROWS],
}

impl ButtonScanner {
    pub const fn new() -> Self {
        Self {
            row: 0,
            held: [0; PANEL_ROWS],
        }
    }

    /// Row currently selected
    pub fn row(&self) -> usize {
        self.row
    }

    /// LED column byte for the selected row
    pub fn row_leds(&self, leds: LedMask) -> u8 {
        (leds >> (8 * self.row)) as u8
    }

    /// Record the button columns of the selected row (bit per column, set =
    /// pressed) and advance to the next row
    ///
    /// Returns buttons that went down since this row was last scanned.
    pub fn scan(&mut self, columns: u8) -> ButtonPresses {
        let row = self.row;
        let pressed = columns & ((1 << BUTTON_COLUMNS) - 1);
        let fresh = pressed & !self.held[row];
        self.held[row] = pressed;
        self.row = (row + 1) % PANEL_ROWS;

        let mut presses = ButtonPresses::new();
        for (col, button) in MATRIX[row].iter().enumerate() {
            if let Some(button) = button {
                if fresh & (1 << col) != 0 {
                    let _ = presses.push(*button);
                }
            }
        }
        presses
    }
}
