//! Front panel scan task
//!
//! Steps the 4-row matrix: each row drives its LED columns through the
//! panel expander and samples the two button columns.

use defmt::*;
use embassy_time::{Duration, Ticker};

use tambor_core::config::{IoTiming, PanelTiming};
use tambor_core::panel::{ButtonScanner, PANEL_ROWS};
use tambor_hal::{InputPin, OutputPin, PortExpander};

use crate::board::{ButtonColumn, Expander, RowSelect};
use crate::channels::{EVENT_BUS, INDICATORS};

/// Panel task - LED refresh and button scan
#[embassy_executor::task]
pub async fn panel_task(
    mut rows: [RowSelect; PANEL_ROWS],
    columns: [ButtonColumn; 2],
    leds: &'static Expander,
    timing: PanelTiming,
    io: IoTiming,
) {
    info!("Panel task started");
    run_panel(&mut rows, &columns, leds, timing, io).await
}

async fn run_panel<O: OutputPin, I: InputPin, E: PortExpander>(
    rows: &mut [O],
    columns: &[I],
    leds: &E,
    timing: PanelTiming,
    io: IoTiming,
) -> ! {
    let publisher = unwrap!(EVENT_BUS.publisher());
    let mut scanner = ButtonScanner::new();
    let mut ticker = Ticker::every(Duration::from_millis(u64::from(timing.scan_row_ms)));

    loop {
        let row = scanner.row();

        // Deselect before changing columns so the old row does not ghost
        for pin in rows.iter_mut() {
            pin.set_low();
        }
        // LED columns are active-low
        let columns_out = !scanner.row_leds(INDICATORS.load());
        if let Err(e) = leds.write_output(columns_out, io.panel_timeout_ms).await {
            trace!("Panel LED write failed: {:?}", e);
        }
        rows[row].set_high();

        ticker.next().await;

        let sampled = columns
            .iter()
            .enumerate()
            .filter(|(_, pin)| pin.is_high())
            .fold(0u8, |acc, (col, _)| acc | (1 << col));
        for button in scanner.scan(sampled) {
            debug!("Button {:?}", button);
            publisher.publish(button.into()).await;
        }
    }
}
