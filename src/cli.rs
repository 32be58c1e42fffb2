use clap::Parser;
use std::path::PathBuf;

use ytscribe::captions::Strategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "ytscribe", about = "YouTube transcript extractor", version)]
pub struct Cli {
    /// YouTube video URLs or video IDs (reads from stdin if omitted)
    pub urls: Vec<String>,

    /// How captions are fetched [default: direct]
    #[arg(long, value_enum)]
    pub strategy: Option<Strategy>,

    /// Preferred caption language, in priority order (repeatable) [default: vi, en]
    #[arg(short, long = "lang")]
    pub langs: Vec<String>,

    /// Forwarding proxy prefix for direct fetches (repeatable)
    #[arg(long = "proxy")]
    pub proxies: Vec<String>,

    /// Caption extractor command for the delegated strategy, e.g. "python3 transcript.py"
    #[arg(long)]
    pub extractor: Option<String>,

    /// Seconds to wait for the caption extractor
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Output format: text (default), json
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Write one file per video into this directory instead of stdout
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Show status transitions and metadata
    #[arg(short, long)]
    pub verbose: bool,
}
