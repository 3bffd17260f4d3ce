//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod device;
pub mod monitor;
pub mod panel;
pub mod sequencer;

pub use device::device_task;
pub use monitor::monitor_task;
pub use panel::panel_task;
pub use sequencer::sequencer_task;
