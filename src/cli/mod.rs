//! CLI-specific functionality for legalitea
//!
//! This module contains all CLI-related code including argument parsing,
//! input source selection, command execution and configuration discovery.

pub mod args;
pub mod config;
pub mod run;

pub use args::{Args, Commands, ConfigOverrides, ExecutionMode, InputSource};
pub use config::ConfigDiscovery;
pub use run::{CommandOutput, execute};
