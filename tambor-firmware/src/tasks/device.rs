//! Device state machine task
//!
//! Feeds panel, cycle and lid events from the event bus into the
//! [`DeviceStateMachine`] and polls it on every event and timer expiry.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_sync::pubsub::WaitResult;
use embassy_time::{Instant, Timer};

use tambor_core::config::WasherConfig;
use tambor_core::events::BusEvent;
use tambor_core::state::DeviceStateMachine;

use crate::channels::{EVENT_BUS, INDICATORS, SWITCH_STATE};
use crate::cycle_link::CycleLink;

/// Device task - front panel and lid arbitration
#[embassy_executor::task]
pub async fn device_task(config: WasherConfig) {
    info!("Device task started");

    let mut machine = DeviceStateMachine::new(&config);
    let mut subscriber = unwrap!(EVENT_BUS.subscriber());
    let mut cycle = CycleLink;
    let mut panel = &INDICATORS;

    loop {
        let message = match machine.next_deadline() {
            Some(at) => match select(
                subscriber.next_message(),
                Timer::at(Instant::from_millis(at)),
            )
            .await
            {
                Either::First(message) => Some(message),
                Either::Second(()) => None,
            },
            None => Some(subscriber.next_message().await),
        };

        match message {
            Some(WaitResult::Message(event)) => post(&mut machine, event),
            Some(WaitResult::Lagged(missed)) => warn!("Device task missed {} events", missed),
            None => {}
        }
        // Everything already queued is serviced in the same poll
        while let Some(event) = subscriber.try_next_message_pure() {
            post(&mut machine, event);
        }

        let before = machine.state();
        machine.poll(
            Instant::now().as_millis(),
            SWITCH_STATE.load().lid,
            &mut cycle,
            &mut panel,
        );
        let after = machine.state();
        if after != before {
            info!("Device state {:?} -> {:?}", before, after);
        }
    }
}

fn post(machine: &mut DeviceStateMachine, event: BusEvent) {
    trace!("Bus event {:?}", event);
    if let Some(event) = event.device_event() {
        machine.post(event);
    }
}
