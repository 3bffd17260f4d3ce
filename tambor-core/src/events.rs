//! Event bus vocabulary
//!
//! Everything published on the firmware's event bus is a [`BusEvent`].
//! Subscribers filter on [`EventCategory`] and the per-category kind.

use crate::cycle::CycleEvent;
use crate::panel::Button;
use crate::state::DeviceEvent;
use crate::switches::{Switch, SwitchEvent, SwitchTransition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventCategory {
    /// Button presses from the panel scanner
    Panel,
    /// Progress reports from the sequencer
    Cycle,
    /// Pressure switch and lid edges from the monitor
    Switch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusEvent {
    Panel(Button),
    Cycle(CycleEvent),
    Switch(SwitchEvent),
}

impl BusEvent {
    pub fn category(&self) -> EventCategory {
        match self {
            BusEvent::Panel(_) => EventCategory::Panel,
            BusEvent::Cycle(_) => EventCategory::Cycle,
            BusEvent::Switch(_) => EventCategory::Switch,
        }
    }

    /// Kind within the category
    pub fn kind(&self) -> u8 {
        match self {
            BusEvent::Panel(button) => *button as u8,
            BusEvent::Cycle(CycleEvent::StepChanged(_)) => 0,
            BusEvent::Cycle(CycleEvent::Finished) => 1,
            BusEvent::Cycle(CycleEvent::CleanupComplete) => 2,
            BusEvent::Switch(ev) => {
                let closed = ev.transition == SwitchTransition::Closed;
                (ev.switch as u8) << 1 | u8::from(closed)
            }
        }
    }

    /// Translate into a state machine event, if the state machine cares
    pub fn device_event(&self) -> Option<DeviceEvent> {
        match *self {
            BusEvent::Panel(button) => Some(DeviceEvent::Button(button)),
            BusEvent::Cycle(CycleEvent::StepChanged(step)) => Some(DeviceEvent::StepChanged(step)),
            BusEvent::Cycle(CycleEvent::Finished) => Some(DeviceEvent::CycleFinished),
            BusEvent::Cycle(CycleEvent::CleanupComplete) => None,
            BusEvent::Switch(SwitchEvent {
                switch: Switch::Lid,
                transition,
            }) => Some(match transition {
                SwitchTransition::Opened => DeviceEvent::LidOpened,
                SwitchTransition::Closed => DeviceEvent::LidClosed,
            }),
            BusEvent::Switch(_) => None,
        }
    }
}

impl From<Button> for BusEvent {
    fn from(button: Button) -> Self {
        BusEvent::Panel(button)
    }
}

impl From<CycleEvent> for BusEvent {
    fn from(event: CycleEvent) -> Self {
        BusEvent::Cycle(event)
    }
}

impl From<SwitchEvent> for BusEvent {
    fn from(event: SwitchEvent) -> Self {
        BusEvent::Switch(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle::WashStep;

    #[test]
    fn test_lid_edges_reach_state_machine() {
        let opened = BusEvent::from(SwitchEvent {
            switch: Switch::Lid,
            transition: SwitchTransition::Opened,
        });
        assert_eq!(opened.category(), EventCategory::Switch);
        assert_eq!(opened.device_event(), Some(DeviceEvent::LidOpened));
    }

    #[test]
    fn test_level_edges_do_not() {
        let level = BusEvent::from(SwitchEvent {
            switch: Switch::Level1,
            transition: SwitchTransition::Closed,
        });
        assert_eq!(level.device_event(), None);
    }

    #[test]
    fn test_cycle_events() {
        assert_eq!(
            BusEvent::from(CycleEvent::StepChanged(WashStep::Rinse)).device_event(),
            Some(DeviceEvent::StepChanged(WashStep::Rinse))
        );
        assert_eq!(
            BusEvent::from(CycleEvent::Finished).device_event(),
            Some(DeviceEvent::CycleFinished)
        );
        assert_eq!(BusEvent::from(CycleEvent::CleanupComplete).device_event(), None);
    }

    #[test]
    fn test_switch_kinds_are_distinct() {
        let mut seen = 0u16;
        for switch in Switch::ALL {
            for transition in [SwitchTransition::Opened, SwitchTransition::Closed] {
                let kind = BusEvent::from(SwitchEvent { switch, transition }).kind();
                assert_eq!(seen & (1 << kind), 0);
                seen |= 1 << kind;
            }
        }
    }
}
