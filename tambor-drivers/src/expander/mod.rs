//! I2C port expander drivers

pub mod pca9554;

pub use pca9554::{address, Pca9554, RegisterCache, Variant};
