use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "qadb", about = "Answer questions from a local FAQ corpus")]
pub struct Cli {
    /// Config file (defaults to ./config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Answer a question
    Ask(AskArgs),
    /// Show the closest documents for a question
    Search(SearchArgs),
    /// Print service status as JSON
    Status,
    /// Build the index and report its size
    Index,
}

#[derive(Debug, Args)]
pub struct AskArgs {
    pub question: String,
    /// Documents to retrieve (defaults to index.top_k)
    #[arg(short)]
    pub k: Option<usize>,
    /// Print the full answer record as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    pub question: String,
    #[arg(short)]
    pub k: Option<usize>,
    #[arg(long)]
    pub json: bool,
}
