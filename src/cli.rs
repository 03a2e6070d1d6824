use clap::{Parser, Subcommand};
use std::path::PathBuf;

use tldw::config::{SummaryProviderKind, TranscriptProviderKind};

#[derive(Parser)]
#[command(
    name = "tldw",
    about = "Too long; didn't watch: summarize YouTube videos from their captions",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (default: ~/.config/tldw/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Transcript source
    #[arg(long, global = true, value_enum)]
    pub transcript_provider: Option<TranscriptProviderKind>,

    /// Summarization backend
    #[arg(long, global = true, value_enum)]
    pub summary_provider: Option<SummaryProviderKind>,

    /// Model for the summarization backend
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Preferred caption language
    #[arg(short, long, global = true)]
    pub lang: Option<String>,

    /// Transcript characters sent for summarization
    #[arg(long, global = true)]
    pub max_chars: Option<usize>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Serve the web form and the summarize API
    Serve {
        /// Address to bind
        #[arg(short, long)]
        bind: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Summarize one or more videos and print the result
    Summarize {
        /// YouTube video URL (reads one per line from stdin if omitted)
        url: Option<String>,
    },
}
