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

    /// Passage service base URL (overrides the configuration file)
    #[arg(short, long)]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that the passage service is reachable
    Check,

    /// Register a source site to be translated
    RegisterSite {
        /// Site URL
        #[arg(short, long)]
        url: String,
    },

    /// Fetch passages awaiting translation and print them
    Search {
        /// Site id filter; non-numeric input means no filter
        #[arg(short, long, default_value = "")]
        site_id: String,

        /// Fetch every pending passage of the site instead of a single one
        #[arg(short, long)]
        all: bool,
    },

    /// Start an interactive translation session
    Interpret {
        /// Site id filter; non-numeric input means no filter
        #[arg(short, long, default_value = "")]
        site_id: String,

        /// Fetch every pending passage of the site instead of a single one
        #[arg(short, long)]
        all: bool,

        /// Interpreter id used for submissions
        #[arg(short, long)]
        interpreter_id: Option<String>,
    },
}
