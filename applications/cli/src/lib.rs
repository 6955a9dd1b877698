//! Tapedeck command-line player
//!
//! Loads a playlist and settings, runs a simulated engine behind the
//! playback service and renders callbacks to the terminal.

pub mod config;
pub mod console;
pub mod error;
pub mod playlist;
pub mod session;
pub mod simulated;

pub use error::{CliError, Result};
