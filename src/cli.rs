use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split a transcript into subtitle-sized sentences
    Split {
        /// Input transcript (.json ASR output or one token per line)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file, one sentence per line
        #[arg(short, long)]
        output: PathBuf,

        /// Transcript language (overrides config and detected language)
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Split all transcripts in a directory
    Batch {
        /// Input directory containing transcripts
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Output directory for sentence files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Transcript language (overrides config and detected language)
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Shorten subtitle lines that are too long for their time window
    Fit {
        /// Input SRT file
        #[arg(short, long)]
        input: PathBuf,

        /// Output SRT file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write the default configuration to a file
    InitConfig {
        /// Output configuration file
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,
    },
}
