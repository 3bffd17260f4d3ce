//! Pressure switch and lid sensing
//!
//! The switches share an input port on the valve expander. The monitor
//! turns successive port reads into per-switch edge events and keeps a
//! shared snapshot the other components can read at any time.

pub mod monitor;
pub mod state;

pub use monitor::{SwitchEvent, SwitchEvents, SwitchMonitor, SwitchTransition};
pub use state::{PressureSwitchState, SharedSwitchState, Switch, SWITCH_INPUTS};
