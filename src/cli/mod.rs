//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Vigil using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Vigil - encrypted, anonymizing audit log
#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(version, about, long_about = None)]
#[command(author = "Vigil Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "vigil.toml", env = "VIGIL_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "VIGIL_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new configuration file
    Init(commands::init::InitArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Record one audit event
    Log(commands::log::LogArgs),

    /// Print the entries of one partition
    Read(commands::read::ReadArgs),

    /// List partition dates
    Partitions(commands::partitions::PartitionsArgs),

    /// Delete partitions and key files past retention
    Purge(commands::purge::PurgeArgs),

    /// List persisted key files
    Keys(commands::keys::KeysArgs),
}
