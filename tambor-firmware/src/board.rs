//! Controller board wiring
//!
//! Three PCA9554A expanders share I2C0:
//!
//! | Part | Address | Pins                                              |
//! |------|---------|---------------------------------------------------|
//! | U4   | 0x38    | P0-P3 switches (in), P5-P7 softener/soap/bleach    |
//! | U5   | 0x3B    | P0 motor CW, P1 motor CCW, P2 pump                 |
//! | U3   | 0x3F    | P0-P7 panel LED columns                            |
//!
//! U4 /INT goes to GPIO6. Panel rows are GPIO10-13, button columns
//! GPIO14-15.

use embassy_rp::gpio::{Input, Output};
use embassy_rp::i2c::{self, Async, I2c};
use embassy_rp::peripherals::I2C0;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;

use tambor_drivers::expander::{address, Pca9554, Variant};
use tambor_hal::{EdgeInterrupt, I2cConfig, InputPin, OutputPin};

pub const VALVE_EXPANDER_ADDR: u8 = address(Variant::Pca9554A, 0);
pub const MOTOR_EXPANDER_ADDR: u8 = address(Variant::Pca9554A, 3);
pub const PANEL_EXPANDER_ADDR: u8 = address(Variant::Pca9554A, 7);

pub type I2cDevice = I2c<'static, I2C0, Async>;
pub type I2cBus = Mutex<CriticalSectionRawMutex, I2cDevice>;
pub type Expander = Pca9554<'static, CriticalSectionRawMutex, I2cDevice>;

pub fn i2c_config(config: I2cConfig) -> i2c::Config {
    let mut rp = i2c::Config::default();
    rp.frequency = config.frequency;
    rp
}

/// Open-drain /INT from the switch expander
pub struct ExpanderIrq(Input<'static>);

impl ExpanderIrq {
    pub fn new(pin: Input<'static>) -> Self {
        Self(pin)
    }
}

impl EdgeInterrupt for ExpanderIrq {
    async fn wait_for_edge(&mut self) {
        // /INT stays low until the input port is read
        self.0.wait_for_low().await;
    }
}

/// Panel matrix row select
pub struct RowSelect(Output<'static>);

impl RowSelect {
    pub fn new(pin: Output<'static>) -> Self {
        Self(pin)
    }
}

impl OutputPin for RowSelect {
    fn set_high(&mut self) {
        self.0.set_high();
    }

    fn set_low(&mut self) {
        self.0.set_low();
    }
}

/// Panel button column sense
pub struct ButtonColumn(Input<'static>);

impl ButtonColumn {
    pub fn new(pin: Input<'static>) -> Self {
        Self(pin)
    }
}

impl InputPin for ButtonColumn {
    fn is_high(&self) -> bool {
        self.0.is_high()
    }
}
