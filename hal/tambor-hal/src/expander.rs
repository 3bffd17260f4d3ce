//! 8-bit port expander abstraction
//!
//! Every call takes a timeout in milliseconds covering lock acquisition
//! and the bus transfer together.

/// Errors reported by port expanders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExpanderError {
    /// Device lock, bus lock or transfer did not complete in time
    Timeout,
    /// Bus reported an error (NACK, arbitration loss, ...)
    Bus,
}

/// 8-bit I/O port expander
///
/// Methods take `&self`: implementations serialise access internally so
/// one device can be shared between tasks.
#[allow(async_fn_in_trait)]
pub trait PortExpander {
    /// Read the input port
    async fn read_port(&self, timeout_ms: u32) -> Result<u8, ExpanderError>;

    /// Write the whole output register
    async fn write_output(&self, value: u8, timeout_ms: u32) -> Result<(), ExpanderError>;

    /// Set then clear output bits in one register write
    ///
    /// Bits in both masks end up cleared.
    async fn set_and_clear_bits(&self, set: u8, clear: u8, timeout_ms: u32) -> Result<(), ExpanderError>;

    /// Configure pin directions (set bit = input)
    async fn write_config(&self, inputs: u8, timeout_ms: u32) -> Result<(), ExpanderError>;

    async fn set_bits(&self, mask: u8, timeout_ms: u32) -> Result<(), ExpanderError> {
        self.set_and_clear_bits(mask, 0, timeout_ms).await
    }

    async fn clear_bits(&self, mask: u8, timeout_ms: u32) -> Result<(), ExpanderError> {
        self.set_and_clear_bits(0, mask, timeout_ms).await
    }
}
