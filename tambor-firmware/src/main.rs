//! Tambor - Washing Machine Controller Firmware
//!
//! Main firmware binary for the RP2040-based washer controller board.
//! Brings the expanders up with every actuator off, then hands over to the
//! monitor, sequencer, device and panel tasks.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::I2C0;
use embassy_sync::mutex::Mutex;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use tambor_core::actuators::ActuatorState;
use tambor_drivers::expander::Pca9554;
use tambor_hal::{I2cConfig, PortExpander};

use crate::actuators::ActuatorBank;
use crate::board::{ButtonColumn, Expander, ExpanderIrq, I2cBus, RowSelect};

mod actuators;
mod board;
mod channels;
mod config;
mod cycle_link;
mod tasks;

bind_interrupts!(struct Irqs {
    I2C0_IRQ => i2c::InterruptHandler<I2C0>;
});

// Static cells for the bus and expanders (must live forever for task references)
static I2C_BUS: StaticCell<I2cBus> = StaticCell::new();
static VALVE_EXPANDER: StaticCell<Expander> = StaticCell::new();
static MOTOR_EXPANDER: StaticCell<Expander> = StaticCell::new();
static PANEL_EXPANDER: StaticCell<Expander> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Tambor firmware starting...");

    let p = embassy_rp::init(Default::default());
    let config = config::load();

    let i2c = I2c::new_async(
        p.I2C0,
        p.PIN_5,
        p.PIN_4,
        Irqs,
        board::i2c_config(I2cConfig::STANDARD),
    );
    let bus: &'static I2cBus = I2C_BUS.init(Mutex::new(i2c));

    // Nothing else masters this bus, so every expander may cache
    let valves: &'static Expander =
        VALVE_EXPANDER.init(Pca9554::new(bus, board::VALVE_EXPANDER_ADDR, false));
    let motor_pump: &'static Expander =
        MOTOR_EXPANDER.init(Pca9554::new(bus, board::MOTOR_EXPANDER_ADDR, false));
    let panel_leds: &'static Expander =
        PANEL_EXPANDER.init(Pca9554::new(bus, board::PANEL_EXPANDER_ADDR, false));

    // Force every actuator off before any task can touch them
    let bank = ActuatorBank::new(motor_pump, valves, config.io.actuator_timeout_ms);
    {
        let mut outputs = channels::ACTUATORS.lock().await;
        *outputs = ActuatorState::all_off();
        match bank.init(&outputs).await {
            Ok(()) => info!("Actuators off"),
            Err(e) => error!("Actuator init failed: {:?}", e),
        }
    }

    // Panel: LEDs dark, every pin an output
    let panel_timeout = config.io.panel_timeout_ms;
    if let Err(e) = panel_leds.write_output(0xFF, panel_timeout).await {
        warn!("Panel LED init failed: {:?}", e);
    }
    if let Err(e) = panel_leds.write_config(0x00, panel_timeout).await {
        warn!("Panel expander config failed: {:?}", e);
    }

    let irq = ExpanderIrq::new(Input::new(p.PIN_6, Pull::Up));
    let rows = [
        RowSelect::new(Output::new(p.PIN_10, Level::Low)),
        RowSelect::new(Output::new(p.PIN_11, Level::Low)),
        RowSelect::new(Output::new(p.PIN_12, Level::Low)),
        RowSelect::new(Output::new(p.PIN_13, Level::Low)),
    ];
    let columns = [
        ButtonColumn::new(Input::new(p.PIN_14, Pull::Down)),
        ButtonColumn::new(Input::new(p.PIN_15, Pull::Down)),
    ];

    info!("Spawning tasks...");

    spawner
        .spawn(tasks::monitor_task(irq, valves, config.io.switch_read_timeout_ms))
        .unwrap();
    spawner
        .spawn(tasks::sequencer_task(bank, config.cycle))
        .unwrap();
    spawner.spawn(tasks::device_task(config)).unwrap();
    spawner
        .spawn(tasks::panel_task(rows, columns, panel_leds, config.panel, config.io))
        .unwrap();

    info!("All tasks spawned, firmware running");

    // Main task has nothing else to do - all work happens in spawned tasks
    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}
