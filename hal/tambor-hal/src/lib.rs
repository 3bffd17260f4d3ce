//! Tambor Hardware Abstraction Layer
//!
//! Traits the washer firmware and drivers are written against, so the
//! control tasks do not depend on a particular chip or expander part.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  tambor-firmware tasks                  │
//! └─────────────────────────────────────────┘
//!          │                      │
//!          ▼                      ▼
//! ┌──────────────────┐   ┌──────────────────┐
//! │ PortExpander     │   │ OutputPin        │
//! │ (tambor-drivers) │   │ InputPin         │
//! │                  │   │ EdgeInterrupt    │
//! └──────────────────┘   └──────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`expander::PortExpander`] - 8-bit I2C port expander with timeouts
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - Digital I/O
//! - [`gpio::EdgeInterrupt`] - Async wait for a pin edge

#![no_std]
#![deny(unsafe_code)]

pub mod expander;
pub mod gpio;
pub mod i2c;

pub use expander::{ExpanderError, PortExpander};
pub use gpio::{EdgeInterrupt, InputPin, OutputPin};
pub use i2c::I2cConfig;
