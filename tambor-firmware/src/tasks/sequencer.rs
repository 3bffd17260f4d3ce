//! Wash cycle sequencer task
//!
//! Owns the [`Sequencer`] and is the only writer of [`ACTUATORS`]. Wakes on
//! a cycle command, a switch change while a run is alive, or the next
//! sequencer deadline, then polls and mirrors the outputs to the expanders
//! while still holding the actuator lock.

use core::future::pending;

use defmt::*;
use embassy_futures::select::{select3, Either3};
use embassy_time::{Instant, Timer};

use tambor_core::actuators::ActuatorState;
use tambor_core::config::CycleTiming;
use tambor_core::cycle::{CycleCommand, CycleEvent, CyclePhase, Sequencer};

use crate::actuators::ActuatorBank;
use crate::board::Expander;
use crate::channels::{
    ACTUATORS, CYCLE_CMD, CYCLE_HANDLE, EVENT_BUS, SWITCHES_CHANGED, SWITCH_STATE,
};

/// Delay before rewriting the actuators after a failed expander write
const RESYNC_RETRY_MS: u64 = 100;

/// Sequencer task - runs wash cycles
#[embassy_executor::task]
pub async fn sequencer_task(bank: ActuatorBank<Expander>, timing: CycleTiming) {
    info!("Sequencer task started");

    let mut sequencer = Sequencer::new(timing);
    let publisher = unwrap!(EVENT_BUS.publisher());
    // Set when the last expander write failed, so the next wake rewrites
    // even if the state did not change
    let mut resync = false;

    loop {
        let mut deadline = sequencer.next_deadline();
        if resync {
            let retry = Instant::now().as_millis() + RESYNC_RETRY_MS;
            deadline = Some(deadline.map_or(retry, |at| at.min(retry)));
        }
        let listening = sequencer.wants_switch_events();

        let command = match select3(
            CYCLE_CMD.receive(),
            async {
                if listening {
                    SWITCHES_CHANGED.wait().await
                } else {
                    pending::<()>().await
                }
            },
            async {
                match deadline {
                    Some(at) => Timer::at(Instant::from_millis(at)).await,
                    None => pending::<()>().await,
                }
            },
        )
        .await
        {
            Either3::First(command) => Some(command),
            Either3::Second(()) | Either3::Third(()) => None,
        };

        let now = Instant::now().as_millis();
        let mut outputs = ACTUATORS.lock().await;
        let before = *outputs;

        if let Some(command) = command {
            apply_command(&mut sequencer, command, now, &mut outputs);
        }
        let events = sequencer.poll(now, &SWITCH_STATE.load(), &mut outputs);

        if resync || *outputs != before {
            resync = commit(&bank, &outputs).await.is_err();
        }
        drop(outputs);

        for event in events {
            match event {
                CycleEvent::StepChanged(step) => info!("Cycle step {:?}", step),
                CycleEvent::Finished => {
                    info!("Cycle finished");
                    CYCLE_HANDLE.release();
                }
                CycleEvent::CleanupComplete => {
                    info!("Cycle cleanup complete");
                    CYCLE_HANDLE.release();
                }
            }
            publisher.publish(event.into()).await;
        }
    }
}

fn apply_command(
    sequencer: &mut Sequencer,
    command: CycleCommand,
    now: u64,
    outputs: &mut ActuatorState,
) {
    match command {
        CycleCommand::Start(params) => {
            // Fill progress must come from edges seen after the start
            SWITCHES_CHANGED.reset();
            match sequencer.start(now, params) {
                Ok(()) => info!("Cycle started from {:?}", params.first_step),
                Err(e) => {
                    warn!("Cycle start rejected: {:?}", e);
                    if sequencer.phase() == CyclePhase::Idle {
                        CYCLE_HANDLE.release();
                    }
                }
            }
        }
        CycleCommand::Pause => {
            if sequencer.pause(now, outputs) {
                info!("Cycle paused, {:?} ms remaining", sequencer.remaining_ms());
            }
        }
        CycleCommand::Resume => {
            if sequencer.resume(now, outputs) {
                info!("Cycle resumed");
            }
        }
        CycleCommand::Abort => {
            if sequencer.abort(now, outputs) {
                info!("Cycle aborted, draining");
            }
        }
        CycleCommand::SkipStep => {
            if let Err(e) = sequencer.skip_step() {
                debug!("Skip step refused: {:?}", e);
            }
        }
    }
}

async fn commit(
    bank: &ActuatorBank<Expander>,
    outputs: &ActuatorState,
) -> Result<(), tambor_hal::ExpanderError> {
    bank.commit(outputs).await.map_err(|e| {
        warn!("Actuator write failed: {:?}", e);
        e
    })
}
