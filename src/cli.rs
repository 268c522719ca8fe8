use std::path::PathBuf;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CliArgs {
    /// URL of the resource to download
    pub url: String,

    /// Output file, defaults to the last URL segment inside the download dir
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of concurrent ranges, overrides the config file
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Download over a single connection without Range requests
    #[arg(long, conflicts_with = "bench")]
    pub single: bool,

    /// Time a single-stream and a concurrent download into a scratch file next to the output, then delete it
    #[arg(long)]
    pub bench: bool,

    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[arg(short, long)]
    pub verbose: bool,
}
