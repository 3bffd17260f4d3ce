//! Device state machine definition

use super::events::{DeviceEvent, PendingEvents};
use super::selections::Selections;
use crate::config::{PanelTiming, ProgramPresets, WasherConfig};
use crate::cycle::WashStep;
use crate::panel::leds::{ALL, POWER, RENDERED};
use crate::panel::{render_panel, Button};
use crate::traits::{CycleControl, IndicatorPanel};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Device states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DeviceState {
    /// Powered down, panel dark
    #[default]
    Standby,
    /// Powered, selections editable, power LED blinking
    Waiting,
    /// Cycle in progress
    Running,
    /// Cycle suspended by the user or an open lid
    Paused,
    /// Whole panel blinking; nothing enters or leaves this state
    Error,
}

impl DeviceState {
    /// Events this state reacts to
    fn qualifying(self) -> u16 {
        match self {
            DeviceState::Standby => PendingEvents::POWER,
            DeviceState::Waiting => {
                PendingEvents::POWER
                    | PendingEvents::START_PAUSE
                    | PendingEvents::WATER_LEVEL
                    | PendingEvents::CLOTHING_TYPE
                    | PendingEvents::PROGRAM
                    | PendingEvents::RINSE_COUNT
                    | PendingEvents::BREAK_DURATION
            }
            DeviceState::Running => {
                PendingEvents::STEP_CHANGED
                    | PendingEvents::CYCLE_FINISHED
                    | PendingEvents::START_PAUSE
                    | PendingEvents::LID_OPENED
            }
            DeviceState::Paused => {
                PendingEvents::POWER | PendingEvents::START_PAUSE | PendingEvents::LID_CLOSED
            }
            DeviceState::Error => 0,
        }
    }
}

/// Selection buttons in service order
const SELECTION_BUTTONS: [(u16, Button); 5] = [
    (PendingEvents::WATER_LEVEL, Button::WaterLevel),
    (PendingEvents::CLOTHING_TYPE, Button::ClothingType),
    (PendingEvents::PROGRAM, Button::Program),
    (PendingEvents::RINSE_COUNT, Button::RinseCount),
    (PendingEvents::BREAK_DURATION, Button::BreakDuration),
];

/// Device state machine
///
/// Events are posted into a coalescing pending set and serviced by
/// [`DeviceStateMachine::poll`] in a fixed priority order per state. Events
/// the current state does not react to are dropped, and a state change
/// drops whatever else was pending.
#[derive(Debug, Clone)]
pub struct DeviceStateMachine {
    state: DeviceState,
    selections: Selections,
    /// Step shown on the program row while a cycle is alive
    current_step: WashStep,
    /// Payload of the latest StepChanged event
    reported_step: WashStep,
    pending: PendingEvents,
    self_test_until: Option<u64>,
    blink_at: u64,
    panel: PanelTiming,
    presets: ProgramPresets,
}

impl DeviceStateMachine {
    pub fn new(config: &WasherConfig) -> Self {
        Self {
            state: DeviceState::Standby,
            selections: Selections::default(),
            current_step: WashStep::Prewash,
            reported_step: WashStep::Prewash,
            pending: PendingEvents::empty(),
            self_test_until: None,
            blink_at: 0,
            panel: config.panel,
            presets: config.program,
        }
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    pub fn selections(&self) -> &Selections {
        &self.selections
    }

    pub fn current_step(&self) -> WashStep {
        self.current_step
    }

    /// Queue an event for the next [`DeviceStateMachine::poll`]
    pub fn post(&mut self, event: DeviceEvent) {
        if let DeviceEvent::StepChanged(step) = event {
            self.reported_step = step;
        }
        self.pending.insert(event.flag());
    }

    /// Time the machine next needs polling without new events
    pub fn next_deadline(&self) -> Option<u64> {
        match self.state {
            DeviceState::Standby | DeviceState::Running => None,
            DeviceState::Waiting => Some(self.self_test_until.unwrap_or(self.blink_at)),
            DeviceState::Paused | DeviceState::Error => Some(self.blink_at),
        }
    }

    /// Service pending events and timers at time `now`
    ///
    /// `lid_closed` is the lid switch as currently sensed; resuming is only
    /// allowed with the lid closed.
    pub fn poll<C: CycleControl, P: IndicatorPanel>(
        &mut self,
        now: u64,
        lid_closed: bool,
        cycle: &mut C,
        panel: &mut P,
    ) {
        self.pending.retain(self.state.qualifying());
        let before = self.state;
        match self.state {
            DeviceState::Standby => self.standby(now, panel),
            DeviceState::Waiting => self.waiting(now, cycle, panel),
            DeviceState::Running => self.running(now, cycle, panel),
            DeviceState::Paused => self.paused(now, lid_closed, cycle, panel),
            DeviceState::Error => self.error(now, panel),
        }
        if self.state != before {
            self.pending.clear();
        }
    }

    fn render<P: IndicatorPanel>(&self, panel: &mut P) {
        let lit = render_panel(self.state, &self.selections, self.current_step);
        panel.set_and_clear(lit, RENDERED & !lit);
    }

    fn restart_blink(&mut self, now: u64) {
        self.blink_at = now + u64::from(self.panel.blink_ms);
    }

    fn blink_power<P: IndicatorPanel>(&mut self, now: u64, panel: &mut P) {
        if now >= self.blink_at {
            panel.toggle(POWER);
            self.restart_blink(now);
        }
    }

    fn standby<P: IndicatorPanel>(&mut self, now: u64, panel: &mut P) {
        if self.pending.take(PendingEvents::POWER) {
            // Lamp test
            panel.set(ALL);
            self.self_test_until = Some(now + u64::from(self.panel.self_test_ms));
            self.state = DeviceState::Waiting;
        }
    }

    fn waiting<C: CycleControl, P: IndicatorPanel>(&mut self, now: u64, cycle: &mut C, panel: &mut P) {
        if let Some(until) = self.self_test_until {
            if now < until {
                return;
            }
            self.self_test_until = None;
            panel.clear(ALL);
            self.restart_blink(now);
            self.render(panel);
        }

        if self.pending.take(PendingEvents::POWER) {
            panel.clear(ALL);
            self.state = DeviceState::Standby;
            return;
        }

        if self.pending.take(PendingEvents::START_PAUSE) {
            let params = self.selections.to_params(&self.presets);
            if cycle.start(params).is_ok() {
                self.current_step = self.selections.program;
                self.reported_step = self.current_step;
                self.state = DeviceState::Running;
                panel.set(POWER);
                self.render(panel);
                return;
            }
        }

        let mut changed = false;
        for (flag, button) in SELECTION_BUTTONS {
            if self.pending.take(flag) {
                changed |= self.selections.apply(button);
            }
        }
        if changed {
            self.render(panel);
        }

        self.blink_power(now, panel);
    }

    fn running<C: CycleControl, P: IndicatorPanel>(&mut self, now: u64, cycle: &mut C, panel: &mut P) {
        if self.pending.take(PendingEvents::STEP_CHANGED) {
            self.current_step = self.reported_step;
            self.render(panel);
        }

        if self.pending.take(PendingEvents::CYCLE_FINISHED) {
            panel.clear(ALL);
            self.state = DeviceState::Waiting;
            self.restart_blink(now);
            self.render(panel);
            return;
        }

        if self.pending.take(PendingEvents::START_PAUSE | PendingEvents::LID_OPENED) {
            cycle.pause();
            self.state = DeviceState::Paused;
            self.restart_blink(now);
        }
    }

    fn paused<C: CycleControl, P: IndicatorPanel>(
        &mut self,
        now: u64,
        lid_closed: bool,
        cycle: &mut C,
        panel: &mut P,
    ) {
        if self.pending.take(PendingEvents::POWER) {
            cycle.abort();
            panel.clear(ALL);
            self.state = DeviceState::Standby;
            return;
        }

        if self.pending.take(PendingEvents::START_PAUSE | PendingEvents::LID_CLOSED) && lid_closed {
            // A Finished that raced the pause was discarded here, so this
            // can resume into a cycle that is already over
            cycle.resume();
            panel.set(POWER);
            self.state = DeviceState::Running;
            // Steps reported while paused were not rendered
            self.current_step = self.reported_step;
            self.render(panel);
            return;
        }

        self.blink_power(now, panel);
    }

    fn error<P: IndicatorPanel>(&mut self, now: u64, panel: &mut P) {
        if now >= self.blink_at {
            if panel.lit() & ALL == ALL {
                panel.clear(ALL);
            } else {
                panel.set(ALL);
            }
            self.blink_at = now + u64::from(self.panel.error_blink_ms);
        }
    }
}
