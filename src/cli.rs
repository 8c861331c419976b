use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "videoladder")]
#[command(author, version, about = "Transcode uploaded videos into an H.264 rendition ladder")]
pub struct Cli {
    /// Path to config file
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
    /// Register a user who can own videos
    AddUser {
        /// Display name
        #[arg(long)]
        name: String,

        /// Email address (unique)
        #[arg(long)]
        email: String,
    },

    /// Copy a file into storage and register it as an uploaded video
    Ingest {
        /// File to ingest
        #[arg(required = true)]
        file: PathBuf,

        /// Owner, by email or user id
        #[arg(short, long)]
        user: String,

        /// Display name (defaults to the file stem)
        #[arg(long)]
        name: Option<String>,

        /// Storage disk (defaults to storage.default_disk)
        #[arg(long)]
        disk: Option<String>,

        /// Process the video right away
        #[arg(long)]
        process: bool,
    },

    /// Run the processing job for one uploaded video
    Process {
        /// Video id
        id: String,
    },

    /// Process every video that is waiting
    Work,

    /// Show a video and its renditions
    Show {
        /// Video id
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List videos
    List {
        /// Only videos with this status
        #[arg(long)]
        status: Option<String>,
    },

    /// Probe a media file and display its streams
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
