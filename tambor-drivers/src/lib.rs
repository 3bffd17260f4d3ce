//! Hardware driver implementations
//!
//! Concrete implementations of the traits in tambor-hal:
//!
//! - Port expanders (PCA9554 / PCA9554A over async I2C)

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod expander;
