use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mediaconv")]
#[command(author, version, about = "Upload media, convert it to MP3 or MP4, download the result")]
pub struct Cli {
    /// Path to a JSON config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Start {
        /// Host to bind to (overrides config and MEDIACONV_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check that the conversion engine is available
    CheckTools,

    /// Validate a configuration file
    Validate {
        /// Config file to validate (uses --config if not given)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
