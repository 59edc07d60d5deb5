//! CLI for submitting asset transactions.
//!
//! Provides:
//! - Flag and environment configuration for profile, wallet and identity
//! - The create-asset command: connect, submit, decode, report

pub mod commands;
pub mod config;

pub use commands::{Command, CommandResult};
pub use config::CliConfig;
