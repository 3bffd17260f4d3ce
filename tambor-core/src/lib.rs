//! Board-agnostic control logic for the washing machine firmware
//!
//! Everything in here is deterministic and driven by explicit millisecond
//! timestamps, so it runs unchanged on the target and on the host:
//!
//! - Pressure switch change detection
//! - Wash cycle sequencing (fill, shake, drain, spin)
//! - Device state machine behind the front panel
//! - Panel LED layout and button matrix scanning
//! - Configuration types and an embedded TOML reader

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod actuators;
pub mod config;
pub mod cycle;
pub mod events;
pub mod panel;
pub mod state;
pub mod switches;
pub mod traits;
