//! Seams between the state machine and its collaborators
//!
//! The firmware implements these over its channels and shared statics;
//! tests implement them with plain recorders.

pub mod cycle;
pub mod panel;

pub use cycle::CycleControl;
pub use panel::IndicatorPanel;
