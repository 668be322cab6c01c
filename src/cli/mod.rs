//! CLI interface for Keysynth

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// A virtual keyboard synthesizer with a live oscilloscope
#[derive(Parser)]
#[command(name = "keysynth")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the keyboard and scope in the terminal
    Play {
        /// Configuration file path (defaults are used if it does not exist)
        #[arg(short, long, default_value = "keysynth.yaml")]
        config: PathBuf,
    },

    /// List available audio output devices
    Devices,

    /// Validate a configuration file
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "keysynth.yaml")]
        config: PathBuf,
    },

    /// Generate an example configuration file
    Init,

    /// Print the frequency of every key
    Notes {
        /// Pitch of the lowest key in Hz
        #[arg(short, long, default_value = "261.63")]
        base: f64,
    },
}
