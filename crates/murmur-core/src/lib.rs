//! Murmur core crate - error taxonomy, configuration, and API key resolution.
//!
//! Shared foundation for the dictation subsystem crates. Nothing in here
//! touches audio hardware, the network, or the input tap.

pub mod auth;
pub mod config;
pub mod error;

pub use config::{HotkeyBinding, MurmurConfig};
pub use error::{MurmurError, Result};
