//! Sequencer lifecycle control

use crate::cycle::{StartError, WashParams};

/// Commands the device state machine issues to the wash cycle
pub trait CycleControl {
    /// Start a cycle; fails while a run or its cleanup is alive
    fn start(&mut self, params: WashParams) -> Result<(), StartError>;

    fn pause(&mut self);

    /// Continue a paused cycle; ignored when nothing is paused
    fn resume(&mut self);

    /// Stop the cycle and drain
    fn abort(&mut self);
}
