//! CLI module for apigw-sync.
//!
//! This module provides the command-line interface for validating,
//! planning, applying and deploying API definitions.

mod commands;
mod output;

pub use commands::{ApiArgs, Cli, Commands, DeploymentArgs, LogFormat, OutputFormat, SyncArgs};
pub use output::OutputFormatter;
