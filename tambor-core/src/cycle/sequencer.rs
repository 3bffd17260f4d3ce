//! Wash cycle sequencer
//!
//! Walks a [`Recipe`] one operation at a time. The sequencer never sleeps on
//! its own: the caller invokes [`Sequencer::poll`] with the current time
//! whenever something may have changed (a command, a switch event or the
//! deadline returned by [`Sequencer::next_deadline`]).
//!
//! All countdowns run on a cycle clock that stands still while paused, so
//! a paused shake or soak resumes with exactly the time it had left.

use heapless::Vec;

use super::params::{ParamError, WashParams, WashStep, WaterLevel};
use super::recipe::{build_recipe, Op, Recipe};
use crate::actuators::{ActuatorState, MotorDirection, Valve};
use crate::config::CycleTiming;
use crate::switches::PressureSwitchState;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Events emitted by [`Sequencer::poll`]
pub type CycleEvents = Vec<CycleEvent, 8>;

/// Sequencer lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CyclePhase {
    /// No cycle, ready to start
    #[default]
    Idle,
    /// Walking the recipe
    Running,
    /// Suspended mid-operation with all actuators off
    Paused,
    /// Aborted, draining before going idle
    CleaningUp,
}

/// Observable cycle progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CycleEvent {
    /// The cycle moved on to a later step
    StepChanged(WashStep),
    /// The recipe ran to completion
    Finished,
    /// Post-abort drain completed
    CleanupComplete,
}

/// Commands accepted by the sequencer task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleCommand {
    Start(WashParams),
    Pause,
    Resume,
    Abort,
    SkipStep,
}

/// Start rejection reasons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StartError {
    /// A cycle (or its cleanup) is still alive
    AlreadyRunning,
    InvalidParams(ParamError),
}

/// Step skipping is reserved and not implemented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SkipStepError {
    Unsupported,
}

/// Result of advancing a blocking operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Progress {
    /// Still blocked; wake at the given cycle time, or on the next switch change
    Waiting(Option<u64>),
    Done,
}

/// Fill wait for one water level
#[derive(Debug, Clone, Copy)]
struct FillWait {
    level: WaterLevel,
    /// Cycle time level-1 closed (high fill only)
    level_1_at: Option<u64>,
    /// End of the extrapolated top-up (high fill only)
    extra_until: Option<u64>,
}

impl FillWait {
    fn new(level: WaterLevel) -> Self {
        Self {
            level,
            level_1_at: None,
            extra_until: None,
        }
    }

    fn advance(&mut self, now: u64, switches: &PressureSwitchState) -> Progress {
        match self.level {
            WaterLevel::Low if switches.level_1 => Progress::Done,
            WaterLevel::Mid if switches.level_2 => Progress::Done,
            WaterLevel::Low | WaterLevel::Mid => Progress::Waiting(None),
            WaterLevel::High => {
                // No high sensor: keep filling for as long as it took to get
                // from level-1 to level-2.
                if self.extra_until.is_none() {
                    if self.level_1_at.is_none() {
                        if !switches.level_1 {
                            return Progress::Waiting(None);
                        }
                        self.level_1_at = Some(now);
                    }
                    if !switches.level_2 {
                        return Progress::Waiting(None);
                    }
                    let level_1_at = self.level_1_at.unwrap_or(now);
                    self.extra_until = Some(now + (now - level_1_at));
                }
                match self.extra_until {
                    Some(until) if now < until => Progress::Waiting(Some(until)),
                    _ => Progress::Done,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShakePhase {
    Cw,
    CwRest,
    Ccw,
    CcwRest,
}

/// Alternating agitation: CW pulse, stop, CCW pulse at half period, stop
#[derive(Debug, Clone, Copy)]
struct Shake {
    end: u64,
    period: u64,
    cw_pulse: u64,
    ccw_pulse: u64,
    period_start: u64,
    phase: ShakePhase,
}

impl Shake {
    fn begin(
        now: u64,
        duration_ms: u32,
        period_ms: u32,
        timing: &CycleTiming,
        outputs: &mut ActuatorState,
    ) -> Self {
        if duration_ms > 0 {
            outputs.motor = MotorDirection::Clockwise;
        }
        Self {
            end: now + u64::from(duration_ms),
            period: u64::from(period_ms),
            cw_pulse: u64::from(timing.shake_cw_pulse_ms),
            ccw_pulse: u64::from(timing.shake_ccw_pulse_ms),
            period_start: now,
            phase: ShakePhase::Cw,
        }
    }

    fn advance(&mut self, now: u64, outputs: &mut ActuatorState) -> Progress {
        // Zero duration: never energised
        if self.end <= self.period_start {
            outputs.motor = MotorDirection::Off;
            return Progress::Done;
        }
        let half = self.period / 2;
        loop {
            let (at, next) = match self.phase {
                ShakePhase::Cw => (self.period_start + self.cw_pulse, ShakePhase::CwRest),
                ShakePhase::CwRest => (self.period_start + half, ShakePhase::Ccw),
                ShakePhase::Ccw => (self.period_start + half + self.ccw_pulse, ShakePhase::CcwRest),
                ShakePhase::CcwRest => (self.period_start + self.period, ShakePhase::Cw),
            };
            if now < at {
                return Progress::Waiting(Some(at));
            }
            match next {
                ShakePhase::CwRest | ShakePhase::CcwRest => outputs.motor = MotorDirection::Off,
                ShakePhase::Ccw => outputs.motor = MotorDirection::CounterClockwise,
                ShakePhase::Cw => {
                    // Countdown is checked once per period
                    if now >= self.end {
                        return Progress::Done;
                    }
                    self.period_start = now;
                    outputs.motor = MotorDirection::Clockwise;
                }
            }
            self.phase = next;
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Spray {
    next_at: u64,
    pulse_until: Option<u64>,
}

/// Pump soak followed by a CW spin, optionally with bleach spray pulses
#[derive(Debug, Clone, Copy)]
struct Spin {
    soak_until: u64,
    duration: u64,
    /// Set once the drum is spinning
    end: Option<u64>,
    spray: Option<Spray>,
    wants_spray: bool,
}

impl Spin {
    fn begin(
        now: u64,
        duration_ms: u32,
        spray: bool,
        timing: &CycleTiming,
        outputs: &mut ActuatorState,
    ) -> Self {
        outputs.pump = true;
        Self {
            soak_until: now + u64::from(timing.spin_soak_ms),
            duration: u64::from(duration_ms),
            end: None,
            spray: None,
            wants_spray: spray,
        }
    }

    fn countdown_end(&self) -> u64 {
        self.end.unwrap_or(self.soak_until + self.duration)
    }

    fn advance(&mut self, now: u64, timing: &CycleTiming, outputs: &mut ActuatorState) -> Progress {
        let end = match self.end {
            Some(end) => end,
            None => {
                if now < self.soak_until {
                    return Progress::Waiting(Some(self.soak_until));
                }
                outputs.motor = MotorDirection::Clockwise;
                let end = self.soak_until + self.duration;
                self.end = Some(end);
                if self.wants_spray {
                    self.spray = Some(Spray {
                        next_at: self.soak_until + u64::from(timing.spray_interval_ms),
                        pulse_until: None,
                    });
                }
                end
            }
        };

        if now >= end {
            outputs.motor = MotorDirection::Off;
            outputs.pump = false;
            if self.spray.is_some() {
                outputs.set_valve(Valve::Bleach, false);
            }
            return Progress::Done;
        }

        let mut wake = end;
        if let Some(spray) = self.spray.as_mut() {
            if let Some(until) = spray.pulse_until {
                if now >= until {
                    outputs.set_valve(Valve::Bleach, false);
                    spray.pulse_until = None;
                    spray.next_at += u64::from(timing.spray_interval_ms);
                }
            }
            if spray.pulse_until.is_none() && now >= spray.next_at {
                outputs.set_valve(Valve::Bleach, true);
                spray.pulse_until = Some(spray.next_at + u64::from(timing.spray_pulse_ms));
            }
            wake = wake.min(spray.pulse_until.unwrap_or(spray.next_at));
        }
        Progress::Waiting(Some(wake))
    }
}

/// The blocking operation currently in flight
#[derive(Debug, Clone, Copy)]
enum Activity {
    Fill(FillWait),
    Shake(Shake),
    Delay { until: u64 },
    Dump { until: u64 },
    Spin(Spin),
}

impl Activity {
    fn advance(
        &mut self,
        now: u64,
        switches: &PressureSwitchState,
        timing: &CycleTiming,
        outputs: &mut ActuatorState,
    ) -> Progress {
        match self {
            Activity::Fill(fill) => fill.advance(now, switches),
            Activity::Shake(shake) => shake.advance(now, outputs),
            Activity::Delay { until } => {
                if now < *until {
                    Progress::Waiting(Some(*until))
                } else {
                    Progress::Done
                }
            }
            Activity::Dump { until } => {
                if now < *until {
                    Progress::Waiting(Some(*until))
                } else {
                    outputs.pump = false;
                    Progress::Done
                }
            }
            Activity::Spin(spin) => spin.advance(now, timing, outputs),
        }
    }

    /// Cycle time the operation's countdown expires, if it has one
    fn countdown_end(&self) -> Option<u64> {
        match self {
            Activity::Fill(fill) => fill.extra_until,
            Activity::Shake(shake) => Some(shake.end),
            Activity::Delay { until } | Activity::Dump { until } => Some(*until),
            Activity::Spin(spin) => Some(spin.countdown_end()),
        }
    }
}

/// State owned by one cycle run
#[derive(Debug, Clone)]
struct Run {
    params: WashParams,
    recipe: Recipe,
    pc: usize,
    step: WashStep,
    activity: Option<Activity>,
    wake_at: Option<u64>,
    /// Actuators as they were when paused
    paused_outputs: Option<ActuatorState>,
}

impl Run {
    fn new(params: WashParams, recipe: Recipe) -> Self {
        Self {
            params,
            recipe,
            pc: 0,
            step: WashStep::Prewash,
            activity: None,
            wake_at: None,
            paused_outputs: None,
        }
    }

    fn start_op(
        &mut self,
        op: Op,
        now: u64,
        timing: &CycleTiming,
        outputs: &mut ActuatorState,
        events: &mut CycleEvents,
    ) -> Option<Activity> {
        match op {
            Op::EnterStep(step) => {
                if step > self.step {
                    self.step = step;
                    let _ = events.push(CycleEvent::StepChanged(step));
                }
                None
            }
            Op::OpenValve(valve) => {
                outputs.set_valve(valve, true);
                None
            }
            Op::CloseValve(valve) => {
                outputs.set_valve(valve, false);
                None
            }
            Op::WaitFill(level) => Some(Activity::Fill(FillWait::new(level))),
            Op::Shake {
                duration_ms,
                period_ms,
            } => Some(Activity::Shake(Shake::begin(
                now,
                duration_ms,
                period_ms,
                timing,
                outputs,
            ))),
            Op::Delay { duration_ms } => Some(Activity::Delay {
                until: now + u64::from(duration_ms),
            }),
            Op::Dump => {
                outputs.pump = true;
                Some(Activity::Dump {
                    until: now + u64::from(timing.dump_ms),
                })
            }
            Op::Spin { duration_ms, spray } => Some(Activity::Spin(Spin::begin(
                now,
                duration_ms,
                spray,
                timing,
                outputs,
            ))),
        }
    }
}

/// Wash cycle sequencer
///
/// Holds at most one run. The actuator state is passed in by the caller,
/// who is expected to hold its lock across the call and mirror the result
/// to hardware before releasing it.
#[derive(Debug, Clone)]
pub struct Sequencer {
    timing: CycleTiming,
    phase: CyclePhase,
    /// Cycle clock (ms), frozen while paused
    clock_ms: u64,
    last_now: Option<u64>,
    run: Option<Run>,
    cleanup_until: u64,
}

impl Sequencer {
    pub fn new(timing: CycleTiming) -> Self {
        Self {
            timing,
            phase: CyclePhase::Idle,
            clock_ms: 0,
            last_now: None,
            run: None,
            cleanup_until: 0,
        }
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// Current step, if a run is alive
    pub fn current_step(&self) -> Option<WashStep> {
        self.run.as_ref().map(|run| run.step)
    }

    /// Parameters of the live run
    pub fn params(&self) -> Option<&WashParams> {
        self.run.as_ref().map(|run| &run.params)
    }

    /// Whether switch changes matter right now
    ///
    /// The firmware keeps its switch subscription only while this is true.
    pub fn wants_switch_events(&self) -> bool {
        matches!(self.phase, CyclePhase::Running | CyclePhase::Paused)
    }

    /// Time left on the in-flight countdown (ms)
    pub fn remaining_ms(&self) -> Option<u64> {
        let end = match self.phase {
            CyclePhase::CleaningUp => Some(self.cleanup_until),
            _ => self.run.as_ref()?.activity.as_ref()?.countdown_end(),
        }?;
        Some(end.saturating_sub(self.clock_ms))
    }

    /// Wall time at which [`Sequencer::poll`] has timed work to do
    ///
    /// `None` while idle, paused, or blocked only on a switch change.
    pub fn next_deadline(&self) -> Option<u64> {
        let wake = match self.phase {
            CyclePhase::Idle | CyclePhase::Paused => None,
            CyclePhase::Running => self.run.as_ref().and_then(|run| run.wake_at),
            CyclePhase::CleaningUp => Some(self.cleanup_until),
        }?;
        let last_now = self.last_now.unwrap_or(0);
        Some(last_now + wake.saturating_sub(self.clock_ms))
    }

    fn sync_clock(&mut self, now: u64) {
        if let Some(last) = self.last_now {
            if self.phase != CyclePhase::Paused {
                self.clock_ms += now.saturating_sub(last);
            }
        }
        self.last_now = Some(now.max(self.last_now.unwrap_or(0)));
    }

    /// Start a new cycle
    ///
    /// Nothing moves until the next [`Sequencer::poll`].
    pub fn start(&mut self, now: u64, params: WashParams) -> Result<(), StartError> {
        if self.phase != CyclePhase::Idle {
            return Err(StartError::AlreadyRunning);
        }
        let recipe = build_recipe(&params, &self.timing).map_err(StartError::InvalidParams)?;
        self.sync_clock(now);
        self.run = Some(Run::new(params, recipe));
        self.phase = CyclePhase::Running;
        Ok(())
    }

    /// Suspend the run and switch every actuator off
    ///
    /// Returns false when there is nothing to pause.
    pub fn pause(&mut self, now: u64, outputs: &mut ActuatorState) -> bool {
        if self.phase != CyclePhase::Running {
            return false;
        }
        self.sync_clock(now);
        if let Some(run) = self.run.as_mut() {
            run.paused_outputs = Some(*outputs);
        }
        *outputs = ActuatorState::all_off();
        self.phase = CyclePhase::Paused;
        true
    }

    /// Restore the actuators saved by [`Sequencer::pause`] and carry on
    ///
    /// Returns false when no run is paused.
    pub fn resume(&mut self, now: u64, outputs: &mut ActuatorState) -> bool {
        if self.phase != CyclePhase::Paused {
            return false;
        }
        self.sync_clock(now);
        if let Some(saved) = self.run.as_mut().and_then(|run| run.paused_outputs.take()) {
            *outputs = saved;
        }
        self.phase = CyclePhase::Running;
        true
    }

    /// Terminate the run and drain
    ///
    /// Valves close and the motor stops immediately; the pump then runs for
    /// the dump time before the sequencer goes idle. Repeated aborts during
    /// cleanup are ignored. Returns false when there was nothing to abort.
    pub fn abort(&mut self, now: u64, outputs: &mut ActuatorState) -> bool {
        if !matches!(self.phase, CyclePhase::Running | CyclePhase::Paused) {
            return false;
        }
        self.sync_clock(now);
        self.run = None;
        self.phase = CyclePhase::CleaningUp;
        outputs.close_all_valves();
        outputs.motor = MotorDirection::Off;
        outputs.pump = true;
        self.cleanup_until = self.clock_ms + u64::from(self.timing.dump_ms);
        true
    }

    /// Reserved; always refused
    pub fn skip_step(&self) -> Result<(), SkipStepError> {
        Err(SkipStepError::Unsupported)
    }

    /// Advance the cycle to `now`
    pub fn poll(
        &mut self,
        now: u64,
        switches: &PressureSwitchState,
        outputs: &mut ActuatorState,
    ) -> CycleEvents {
        self.sync_clock(now);
        let mut events = CycleEvents::new();
        match self.phase {
            CyclePhase::Idle | CyclePhase::Paused => {}
            CyclePhase::Running => self.drive(switches, outputs, &mut events),
            CyclePhase::CleaningUp => {
                if self.clock_ms >= self.cleanup_until {
                    *outputs = ActuatorState::all_off();
                    self.phase = CyclePhase::Idle;
                    let _ = events.push(CycleEvent::CleanupComplete);
                }
            }
        }
        events
    }

    fn drive(
        &mut self,
        switches: &PressureSwitchState,
        outputs: &mut ActuatorState,
        events: &mut CycleEvents,
    ) {
        let now = self.clock_ms;
        let timing = self.timing;
        let Some(run) = self.run.as_mut() else {
            self.phase = CyclePhase::Idle;
            return;
        };

        loop {
            if let Some(activity) = run.activity.as_mut() {
                match activity.advance(now, switches, &timing, outputs) {
                    Progress::Waiting(wake) => {
                        run.wake_at = wake;
                        return;
                    }
                    Progress::Done => {
                        run.activity = None;
                        run.wake_at = None;
                    }
                }
            }
            let Some(op) = run.recipe.get(run.pc).copied() else {
                break;
            };
            run.pc += 1;
            run.activity = run.start_op(op, now, &timing, outputs, events);
        }

        *outputs = ActuatorState::all_off();
        self.run = None;
        self.phase = CyclePhase::Idle;
        let _ = events.push(CycleEvent::Finished);
    }
}
