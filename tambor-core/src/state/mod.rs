//! Device state machine
//!
//! Top-level arbiter between the front panel, the lid switch and the wash
//! cycle. The machine is explicit, finite and deterministic: every call to
//! [`DeviceStateMachine::poll`] services the pending events for the current
//! state and advances its timers to the given time.

pub mod events;
pub mod machine;
pub mod selections;

pub use events::{DeviceEvent, PendingEvents};
pub use machine::{DeviceState, DeviceStateMachine};
pub use selections::{BreakDuration, ClothingType, Selections, MAX_PANEL_RINSES};
