//! CLI argument parsing and command dispatch

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rgbench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a distributed benchmark
    Run {
        /// Path to the run configuration file
        #[arg(short, long)]
        config: String,
        /// Path to the installation registry file
        #[arg(short, long, default_value = "installations.json")]
        installations: String,
    },
    /// Validate a run configuration file
    Validate {
        /// Path to the run configuration file
        #[arg(short, long)]
        config: String,
    },
}
