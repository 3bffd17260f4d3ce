//! Events consumed by the device state machine

use crate::cycle::WashStep;
use crate::panel::Button;

/// Events that can trigger state machine activity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceEvent {
    /// Panel button pressed
    Button(Button),
    /// Cycle moved to a new step
    StepChanged(WashStep),
    /// Cycle completed
    CycleFinished,
    LidOpened,
    LidClosed,
}

impl DeviceEvent {
    pub fn flag(&self) -> u16 {
        match self {
            DeviceEvent::Button(Button::Power) => PendingEvents::POWER,
            DeviceEvent::Button(Button::StartPause) => PendingEvents::START_PAUSE,
            DeviceEvent::Button(Button::WaterLevel) => PendingEvents::WATER_LEVEL,
            DeviceEvent::Button(Button::ClothingType) => PendingEvents::CLOTHING_TYPE,
            DeviceEvent::Button(Button::Program) => PendingEvents::PROGRAM,
            DeviceEvent::Button(Button::RinseCount) => PendingEvents::RINSE_COUNT,
            DeviceEvent::Button(Button::BreakDuration) => PendingEvents::BREAK_DURATION,
            DeviceEvent::StepChanged(_) => PendingEvents::STEP_CHANGED,
            DeviceEvent::CycleFinished => PendingEvents::CYCLE_FINISHED,
            DeviceEvent::LidOpened => PendingEvents::LID_OPENED,
            DeviceEvent::LidClosed => PendingEvents::LID_CLOSED,
        }
    }
}

/// Coalesced set of events waiting to be serviced
///
/// Repeated events of one kind collapse into a single flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PendingEvents(u16);

impl PendingEvents {
    pub const POWER: u16 = 1 << 0;
    pub const START_PAUSE: u16 = 1 << 1;
    pub const WATER_LEVEL: u16 = 1 << 2;
    pub const CLOTHING_TYPE: u16 = 1 << 3;
    pub const PROGRAM: u16 = 1 << 4;
    pub const RINSE_COUNT: u16 = 1 << 5;
    pub const BREAK_DURATION: u16 = 1 << 6;
    pub const STEP_CHANGED: u16 = 1 << 7;
    pub const CYCLE_FINISHED: u16 = 1 << 8;
    pub const LID_OPENED: u16 = 1 << 9;
    pub const LID_CLOSED: u16 = 1 << 10;

    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, flags: u16) {
        self.0 |= flags;
    }

    /// Remove `flags`, returning whether any of them were pending
    pub fn take(&mut self, flags: u16) -> bool {
        let hit = self.0 & flags != 0;
        self.0 &= !flags;
        hit
    }

    /// Drop every flag outside `flags`
    pub fn retain(&mut self, flags: u16) {
        self.0 &= flags;
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    pub fn contains(&self, flags: u16) -> bool {
        self.0 & flags == flags
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}
