//! Cycle control over the command channel
//!
//! Start is decided here rather than in the sequencer task so the device
//! task learns synchronously whether a new run was accepted.

use defmt::*;

use tambor_core::cycle::{CycleCommand, StartError, WashParams};
use tambor_core::traits::CycleControl;

use crate::channels::{CYCLE_CMD, CYCLE_HANDLE};

/// [`CycleControl`] backed by [`CYCLE_CMD`] and [`CYCLE_HANDLE`]
pub struct CycleLink;

impl CycleLink {
    fn send(&self, command: CycleCommand) -> bool {
        if CYCLE_CMD.try_send(command).is_err() {
            warn!("Cycle command queue full, dropping {:?}", command);
            return false;
        }
        true
    }
}

impl CycleControl for CycleLink {
    fn start(&mut self, params: WashParams) -> Result<(), StartError> {
        params.validate().map_err(StartError::InvalidParams)?;
        if !CYCLE_HANDLE.try_claim() {
            return Err(StartError::AlreadyRunning);
        }
        if !self.send(CycleCommand::Start(params)) {
            CYCLE_HANDLE.release();
            return Err(StartError::AlreadyRunning);
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.send(CycleCommand::Pause);
    }

    fn resume(&mut self) {
        self.send(CycleCommand::Resume);
    }

    fn abort(&mut self) {
        self.send(CycleCommand::Abort);
    }
}
