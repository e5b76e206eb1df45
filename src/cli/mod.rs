//! CLI Module
//!
//! Command-line interface for the rigcheck diagnostic and effects tool.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// rigcheck - diagnostics and delay effects for a USB guitar interface rig
#[derive(Parser, Debug)]
#[command(name = "rigcheck")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full diagnostic sequence
    #[command(name = "doctor")]
    Doctor {
        /// Skip the audible playback check (headless benches)
        #[arg(long)]
        no_playback: bool,

        /// Configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List audio devices
    #[command(name = "devices")]
    Devices,

    /// Play a test tone, or write it to a WAV file
    #[command(name = "tone")]
    Tone {
        /// Tone frequency in Hz
        #[arg(long, default_value_t = 440.0)]
        freq: f32,

        /// Tone duration in seconds
        #[arg(long, default_value_t = 2.0)]
        duration: f32,

        /// Write to a WAV file instead of playing
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Initialize the processor and print its status
    #[command(name = "status")]
    Status {
        /// Configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Start live audio with optional effects
    #[command(name = "run")]
    Run {
        /// Configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Effects to activate at startup (repeatable)
        #[arg(short, long)]
        effect: Vec<String>,
    },
}
