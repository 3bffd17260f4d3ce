//! Pressure switch monitor task
//!
//! Reads the switch port whenever the expander raises /INT and turns the
//! reads into switch edge events.

use defmt::*;
use embassy_time::{Instant, Timer};

use tambor_core::switches::SwitchMonitor;
use tambor_hal::{EdgeInterrupt, PortExpander};

use crate::board::{Expander, ExpanderIrq};
use crate::channels::{EVENT_BUS, SWITCHES_CHANGED, SWITCH_STATE};

/// Monitor task - pressure and lid switches
#[embassy_executor::task]
pub async fn monitor_task(irq: ExpanderIrq, expander: &'static Expander, timeout_ms: u32) {
    info!("Monitor task started");
    run_monitor(irq, expander, timeout_ms).await
}

async fn run_monitor<I: EdgeInterrupt, E: PortExpander>(
    mut irq: I,
    expander: &E,
    timeout_ms: u32,
) -> ! {
    let publisher = unwrap!(EVENT_BUS.publisher());
    let mut monitor = SwitchMonitor::new();

    // Seed without events so a lid that is already closed at boot is not
    // reported as a fresh close
    match expander.read_port(timeout_ms).await {
        Ok(port) => {
            let state = monitor.seed(port, &SWITCH_STATE);
            info!("Switches at boot: {:?}", state);
        }
        Err(e) => warn!("Initial switch read failed: {:?}", e),
    }

    loop {
        irq.wait_for_edge().await;

        let port = match expander.read_port(timeout_ms).await {
            Ok(port) => port,
            Err(e) => {
                let retry_at = monitor.read_failed(Instant::now().as_millis(), timeout_ms);
                debug!("Switch read failed: {:?}, retry at {} ms", e, retry_at);
                Timer::at(Instant::from_millis(retry_at)).await;
                continue;
            }
        };

        let events = monitor.update(port, &SWITCH_STATE);
        if events.is_empty() {
            continue;
        }
        SWITCHES_CHANGED.signal(());
        for event in events {
            debug!("Switch {:?} {:?}", event.switch, event.transition);
            publisher.publish(event.into()).await;
        }
    }
}
