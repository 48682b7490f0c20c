//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{CheckVersionCommand, ProvisionCommand, ResolveCommand, ValidateCommand};
use std::ffi::OsString;

/// Provisions ephemeral search nodes
#[derive(Debug, Parser, Clone)]
#[command(name = "ephemeral")]
#[command(version)]
#[command(about = "Resolve, install and validate ephemeral search cluster nodes", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Parse a version and resolve its artifacts
    Resolve(ResolveCommand),

    /// Validate a cluster configuration
    Validate(ValidateCommand),

    /// Run the installation tasks against the configured home
    Provision(ProvisionCommand),

    /// Check the version reported by a running node
    CheckVersion(CheckVersionCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
