//! PCA9554 / PCA9554A 8-bit I/O expander
//!
//! # Protocol
//!
//! A write transfers a command byte (register index) followed by the data
//! byte. A read returns the register the last command byte selected, so
//! repeated reads of one register can skip the command byte.
//!
//! # Locking
//!
//! Each device has its own lock around its register bookkeeping; the I2C
//! bus has another shared by every device on it. The device lock is always
//! taken first and held across the bus transfer, so a read-modify-write of
//! the output register cannot interleave with another task's update.
//!
//! Devices marked `shared` may be touched by another bus master, so their
//! output register and command pointer are never trusted from cache.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embassy_time::{with_deadline, Duration, Instant};
use embedded_hal_async::i2c::I2c;
use tambor_hal::{ExpanderError, PortExpander};

/// Register indices
pub mod reg {
    /// Input port (read-only)
    pub const INPUT: u8 = 0x00;
    /// Output port
    pub const OUTPUT: u8 = 0x01;
    /// Polarity inversion
    pub const POLARITY: u8 = 0x02;
    /// Pin direction (set bit = input)
    pub const CONFIG: u8 = 0x03;
}

/// Part variant; the A part sits at a different base address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Variant {
    Pca9554,
    Pca9554A,
}

impl Variant {
    pub const fn base_address(self) -> u8 {
        match self {
            Variant::Pca9554 => 0x20,
            Variant::Pca9554A => 0x38,
        }
    }
}

/// 7-bit bus address from the variant and the A2..A0 strap pins
pub const fn address(variant: Variant, pins: u8) -> u8 {
    variant.base_address() | (pins & 0x07)
}

/// Register bookkeeping for one device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterCache {
    shared: bool,
    /// Unknown until the first successful write; a controller reset does
    /// not reset the expander
    output: Option<u8>,
    last_command: Option<u8>,
}

impl RegisterCache {
    pub const fn new(shared: bool) -> Self {
        Self {
            shared,
            output: None,
            last_command: None,
        }
    }

    /// Whether a read of `register` must send the command byte first
    pub fn needs_command(&self, register: u8) -> bool {
        self.shared || self.last_command != Some(register)
    }

    /// Cached output register, unless the device is shared
    pub fn cached_output(&self) -> Option<u8> {
        if self.shared {
            None
        } else {
            self.output
        }
    }

    /// Whether writing `value` to the output register would change anything
    pub fn output_differs(&self, value: u8) -> bool {
        self.cached_output() != Some(value)
    }

    /// Output value after setting then clearing bits
    pub fn merge(current: u8, set: u8, clear: u8) -> u8 {
        (current | set) & !clear
    }

    /// Record the outcome of a transfer that selected `register`
    ///
    /// `None` marks the command pointer unknown after a failed transfer.
    pub fn record_command(&mut self, register: Option<u8>) {
        self.last_command = register;
    }

    /// Record the output register after a write; `None` after a failed one
    pub fn record_output(&mut self, value: Option<u8>) {
        self.output = value;
    }
}

/// PCA9554 driver
pub struct Pca9554<'a, M: RawMutex, I2C> {
    bus: &'a Mutex<M, I2C>,
    address: u8,
    regs: Mutex<M, RegisterCache>,
}

impl<'a, M: RawMutex, I2C: I2c> Pca9554<'a, M, I2C> {
    pub fn new(bus: &'a Mutex<M, I2C>, address: u8, shared: bool) -> Self {
        Self {
            bus,
            address,
            regs: Mutex::new(RegisterCache::new(shared)),
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    async fn lock_regs(&self, deadline: Instant) -> Result<MutexGuard<'_, M, RegisterCache>, ExpanderError> {
        with_deadline(deadline, self.regs.lock())
            .await
            .map_err(|_| ExpanderError::Timeout)
    }

    async fn read_register(
        &self,
        regs: &mut RegisterCache,
        register: u8,
        deadline: Instant,
    ) -> Result<u8, ExpanderError> {
        let mut buf = [0u8; 1];
        let send_command = regs.needs_command(register);
        let result = with_deadline(deadline, async {
            let mut bus = self.bus.lock().await;
            if send_command {
                bus.write_read(self.address, &[register], &mut buf).await
            } else {
                bus.read(self.address, &mut buf).await
            }
        })
        .await;

        match result {
            Ok(Ok(())) => {
                regs.record_command(Some(register));
                Ok(buf[0])
            }
            Ok(Err(_)) => {
                regs.record_command(None);
                Err(ExpanderError::Bus)
            }
            Err(_) => {
                regs.record_command(None);
                Err(ExpanderError::Timeout)
            }
        }
    }

    async fn write_register(
        &self,
        regs: &mut RegisterCache,
        register: u8,
        value: u8,
        deadline: Instant,
    ) -> Result<(), ExpanderError> {
        let result = with_deadline(deadline, async {
            let mut bus = self.bus.lock().await;
            bus.write(self.address, &[register, value]).await
        })
        .await;

        match result {
            Ok(Ok(())) => {
                regs.record_command(Some(register));
                Ok(())
            }
            Ok(Err(_)) => {
                regs.record_command(None);
                Err(ExpanderError::Bus)
            }
            Err(_) => {
                regs.record_command(None);
                Err(ExpanderError::Timeout)
            }
        }
    }

    async fn write_output_locked(
        &self,
        regs: &mut RegisterCache,
        value: u8,
        deadline: Instant,
    ) -> Result<(), ExpanderError> {
        if !regs.output_differs(value) {
            return Ok(());
        }
        let result = self.write_register(regs, reg::OUTPUT, value, deadline).await;
        regs.record_output(result.is_ok().then_some(value));
        result
    }
}

fn deadline_after(timeout_ms: u32) -> Instant {
    Instant::now() + Duration::from_millis(u64::from(timeout_ms))
}

impl<M: RawMutex, I2C: I2c> PortExpander for Pca9554<'_, M, I2C> {
    async fn read_port(&self, timeout_ms: u32) -> Result<u8, ExpanderError> {
        let deadline = deadline_after(timeout_ms);
        let mut regs = self.lock_regs(deadline).await?;
        self.read_register(&mut regs, reg::INPUT, deadline).await
    }

    async fn write_output(&self, value: u8, timeout_ms: u32) -> Result<(), ExpanderError> {
        let deadline = deadline_after(timeout_ms);
        let mut regs = self.lock_regs(deadline).await?;
        self.write_output_locked(&mut regs, value, deadline).await
    }

    async fn set_and_clear_bits(&self, set: u8, clear: u8, timeout_ms: u32) -> Result<(), ExpanderError> {
        let deadline = deadline_after(timeout_ms);
        let mut regs = self.lock_regs(deadline).await?;
        let current = match regs.cached_output() {
            Some(value) => value,
            None => self.read_register(&mut regs, reg::OUTPUT, deadline).await?,
        };
        self.write_output_locked(&mut regs, RegisterCache::merge(current, set, clear), deadline)
            .await
    }

    async fn write_config(&self, inputs: u8, timeout_ms: u32) -> Result<(), ExpanderError> {
        let deadline = deadline_after(timeout_ms);
        let mut regs = self.lock_regs(deadline).await?;
        self.write_register(&mut regs, reg::CONFIG, inputs, deadline).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addresses() {
        assert_eq!(address(Variant::Pca9554, 0), 0x20);
        assert_eq!(address(Variant::Pca9554A, 0b111), 0x3F);
        assert_eq!(address(Variant::Pca9554A, 0b011), 0x3B);
        // Only three strap pins
        assert_eq!(address(Variant::Pca9554, 0xFF), 0x27);
    }

    #[test]
    fn test_command_byte_skipped_on_repeat_read() {
        let mut cache = RegisterCache::new(false);
        assert!(cache.needs_command(reg::INPUT));
        cache.record_command(Some(reg::INPUT));
        assert!(!cache.needs_command(reg::INPUT));
        assert!(cache.needs_command(reg::OUTPUT));
        cache.record_command(None);
        assert!(cache.needs_command(reg::INPUT));
    }

    #[test]
    fn test_shared_device_never_trusts_cache() {
        let mut cache = RegisterCache::new(true);
        cache.record_command(Some(reg::INPUT));
        assert!(cache.needs_command(reg::INPUT));
        cache.record_output(Some(0xFF));
        assert_eq!(cache.cached_output(), None);
        assert!(cache.output_differs(0xFF));
    }

    #[test]
    fn test_redundant_output_write_suppressed() {
        let mut cache = RegisterCache::new(false);
        // First write always goes out
        assert_eq!(cache.cached_output(), None);
        assert!(cache.output_differs(0xFF));
        cache.record_output(Some(0xFF));
        assert!(!cache.output_differs(0xFF));
        assert!(cache.output_differs(0xFE));
        cache.record_output(Some(0xFE));
        assert!(!cache.output_differs(0xFE));
    }

    #[test]
    fn test_failed_write_forgets_output() {
        let mut cache = RegisterCache::new(false);
        cache.record_output(Some(0x0F));
        cache.record_output(None);
        assert_eq!(cache.cached_output(), None);
        assert!(cache.output_differs(0x0F));
    }

    #[test]
    fn test_merge_clear_wins() {
        assert_eq!(RegisterCache::merge(0b0000_1111, 0b0011_0000, 0b0000_0011), 0b0011_1100);
        assert_eq!(RegisterCache::merge(0x00, 0x01, 0x01), 0x00);
    }
}

#[cfg(test)]
mod device_tests {
    use super::*;
    use core::pin::pin;
    use core::task::Poll;
    use embassy_futures::{block_on, poll_once};
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use embassy_time::MockDriver;
    use embedded_hal_async::i2c::{ErrorKind, ErrorType, Operation};
    use std::vec;
    use std::vec::Vec;

    const ADDR: u8 = 0x38;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Op {
        Write(Vec<u8>),
        Read(usize),
    }

    /// Register file behind a recording bus
    #[derive(Default)]
    struct FakeBus {
        regs: [u8; 4],
        pointer: usize,
        fail: bool,
        log: Vec<Vec<Op>>,
    }

    impl ErrorType for FakeBus {
        type Error = ErrorKind;
    }

    impl embedded_hal_async::i2c::I2c for FakeBus {
        async fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            assert_eq!(address, ADDR);
            if self.fail {
                return Err(ErrorKind::Other);
            }
            let mut record = Vec::new();
            for op in operations.iter_mut() {
                match op {
                    Operation::Write(bytes) => {
                        record.push(Op::Write(bytes.to_vec()));
                        if let Some((&command, data)) = bytes.split_first() {
                            self.pointer = usize::from(command);
                            if let Some(&value) = data.first() {
                                self.regs[self.pointer] = value;
                            }
                        }
                    }
                    Operation::Read(buf) => {
                        record.push(Op::Read(buf.len()));
                        buf.fill(self.regs[self.pointer]);
                    }
                }
            }
            self.log.push(record);
            Ok(())
        }
    }

    fn bus_with(regs: [u8; 4]) -> Mutex<NoopRawMutex, FakeBus> {
        Mutex::new(FakeBus {
            regs,
            ..FakeBus::default()
        })
    }

    fn take_log(bus: &Mutex<NoopRawMutex, FakeBus>) -> Vec<Vec<Op>> {
        core::mem::take(&mut bus.try_lock().unwrap().log)
    }

    #[test]
    fn test_repeat_input_read_skips_command_byte() {
        let bus = bus_with([0b0101, 0xFF, 0, 0xFF]);
        let dev = Pca9554::new(&bus, ADDR, false);

        assert_eq!(block_on(dev.read_port(100)), Ok(0b0101));
        assert_eq!(block_on(dev.read_port(100)), Ok(0b0101));
        assert_eq!(
            take_log(&bus),
            vec![
                vec![Op::Write(vec![reg::INPUT]), Op::Read(1)],
                vec![Op::Read(1)],
            ]
        );
    }

    #[test]
    fn test_shared_device_always_sends_command_byte() {
        let bus = bus_with([0, 0xFF, 0, 0xFF]);
        let dev = Pca9554::new(&bus, ADDR, true);

        block_on(dev.read_port(100)).unwrap();
        block_on(dev.read_port(100)).unwrap();
        let log = take_log(&bus);
        assert_eq!(log.len(), 2);
        assert!(log
            .iter()
            .all(|t| t == &vec![Op::Write(vec![reg::INPUT]), Op::Read(1)]));
    }

    #[test]
    fn test_set_and_clear_reads_output_while_cache_unknown() {
        let bus = bus_with([0, 0xF0, 0, 0xFF]);
        let dev = Pca9554::new(&bus, ADDR, false);

        block_on(dev.set_and_clear_bits(0x01, 0x10, 100)).unwrap();
        assert_eq!(
            take_log(&bus),
            vec![
                vec![Op::Write(vec![reg::OUTPUT]), Op::Read(1)],
                vec![Op::Write(vec![reg::OUTPUT, 0xE1])],
            ]
        );

        // Same request again: nothing changes, nothing is sent
        block_on(dev.set_and_clear_bits(0x01, 0x10, 100)).unwrap();
        assert!(take_log(&bus).is_empty());

        // Cached now, so no read-back before the write
        block_on(dev.clear_bits(0x01, 100)).unwrap();
        assert_eq!(take_log(&bus), vec![vec![Op::Write(vec![reg::OUTPUT, 0xE0])]]);
    }

    #[test]
    fn test_first_write_reaches_chip_even_at_reset_value() {
        let bus = bus_with([0, 0xFF, 0, 0xFF]);
        let dev = Pca9554::new(&bus, ADDR, false);

        block_on(dev.write_output(0xFF, 100)).unwrap();
        block_on(dev.write_output(0xFF, 100)).unwrap();
        assert_eq!(take_log(&bus), vec![vec![Op::Write(vec![reg::OUTPUT, 0xFF])]]);
    }

    #[test]
    fn test_bus_error_surfaces_and_forgets_output() {
        let bus = bus_with([0, 0xFF, 0, 0xFF]);
        let dev = Pca9554::new(&bus, ADDR, false);
        block_on(dev.write_output(0x0F, 100)).unwrap();
        take_log(&bus);

        bus.try_lock().unwrap().fail = true;
        assert_eq!(block_on(dev.write_output(0x00, 100)), Err(ExpanderError::Bus));
        bus.try_lock().unwrap().fail = false;

        // The failed write may or may not have landed, so rewrite the old value
        block_on(dev.write_output(0x0F, 100)).unwrap();
        assert_eq!(take_log(&bus), vec![vec![Op::Write(vec![reg::OUTPUT, 0x0F])]]);
    }

    #[test]
    fn test_busy_bus_times_out() {
        let bus = bus_with([0b0001, 0xFF, 0, 0xFF]);
        let dev = Pca9554::new(&bus, ADDR, false);
        let held = bus.try_lock().unwrap();

        let mut read = pin!(dev.read_port(50));
        assert!(matches!(poll_once(read.as_mut()), Poll::Pending));
        MockDriver::get().advance(Duration::from_millis(60));
        assert_eq!(
            poll_once(read.as_mut()),
            Poll::Ready(Err(ExpanderError::Timeout))
        );
        drop(held);

        // Command pointer is unknown after the timeout
        assert_eq!(block_on(dev.read_port(100)), Ok(0b0001));
        assert_eq!(
            take_log(&bus),
            vec![vec![Op::Write(vec![reg::INPUT]), Op::Read(1)]]
        );
    }

    #[test]
    fn test_write_config_sets_direction_register() {
        let bus = bus_with([0, 0xFF, 0, 0xFF]);
        let dev = Pca9554::new(&bus, ADDR, false);
        block_on(dev.write_config(0x0F, 100)).unwrap();
        assert_eq!(bus.try_lock().unwrap().regs[usize::from(reg::CONFIG)], 0x0F);
    }
}
