//! Configuration types and parsing
//!
//! The firmware embeds a `washer.toml` file and reads it at boot with the
//! no_std reader in [`toml`]. Missing keys keep their defaults.

pub mod toml;
pub mod types;

pub use self::toml::{parse_config, ParseError};
pub use types::*;
