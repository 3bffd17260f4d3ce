//! Inter-task communication channels
//!
//! Defines the static channels and shared state used between Embassy tasks.
//! Uses embassy-sync primitives for safe async communication.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;
use embassy_sync::pubsub::PubSubChannel;
use embassy_sync::signal::Signal;

use tambor_core::actuators::ActuatorState;
use tambor_core::cycle::{CycleCommand, CycleHandle};
use tambor_core::events::BusEvent;
use tambor_core::panel::SharedIndicators;
use tambor_core::switches::SharedSwitchState;

/// Queued bus events before publishers wait
const BUS_CAPACITY: usize = 16;

/// Device task
const BUS_SUBSCRIBERS: usize = 1;

/// Monitor, sequencer and panel tasks
const BUS_PUBLISHERS: usize = 3;

/// Channel capacity for cycle commands
const CYCLE_CMD_SIZE: usize = 4;

pub type EventBus =
    PubSubChannel<CriticalSectionRawMutex, BusEvent, BUS_CAPACITY, BUS_SUBSCRIBERS, BUS_PUBLISHERS>;

/// Panel, cycle and switch events, consumed by the device task
pub static EVENT_BUS: EventBus = PubSubChannel::new();

/// Commands from the device task to the sequencer task
pub static CYCLE_CMD: Channel<CriticalSectionRawMutex, CycleCommand, CYCLE_CMD_SIZE> =
    Channel::new();

/// Claimed by the device task on start, released by the sequencer task once
/// the run and its cleanup are over
pub static CYCLE_HANDLE: CycleHandle = CycleHandle::new();

/// Latest pressure switch snapshot (written by the monitor task only)
pub static SWITCH_STATE: SharedSwitchState = SharedSwitchState::new();

/// Raised by the monitor task whenever a switch changed
pub static SWITCHES_CHANGED: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Panel LEDs requested by the device task, drawn by the panel task
pub static INDICATORS: SharedIndicators = SharedIndicators::new();

/// Motor, pump and valve state. Held across the expander write so the
/// hardware never lags a released update.
pub static ACTUATORS: Mutex<CriticalSectionRawMutex, ActuatorState> =
    Mutex::new(ActuatorState::all_off());
