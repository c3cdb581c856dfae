use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use moviemind::cli::{clean, report};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mm", version, about = "MovieMind catalog CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Clean the raw catalog CSV and write the canonical cleaned file
    Clean {
        /// Raw catalog CSV (defaults to MM_DATA_CSV or data/data.csv)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Cleaned output CSV (defaults to MM_CLEANED_CSV or data/cleaned.csv)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the aggregate report for a cleaned catalog
    Report {
        /// Cleaned catalog CSV (defaults to MM_CLEANED_CSV or data/cleaned.csv)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Restrict to one title type, e.g. movie or show
        #[arg(long)]
        title_type: Option<String>,
        /// Start decade label, e.g. 1990s (needs --decade-end)
        #[arg(long)]
        decade_start: Option<String>,
        /// End decade label, e.g. 2010s (needs --decade-start)
        #[arg(long)]
        decade_end: Option<String>,
        /// Comma-separated genre filter; any match keeps the row
        #[arg(long, value_delimiter = ',')]
        genres: Option<Vec<String>>,
        /// Row cap for the top-genres table (defaults to env/10)
        #[arg(long)]
        top_genres: Option<usize>,
        /// Row cap for the top-popularity table (defaults to env/20)
        #[arg(long)]
        top_popular: Option<usize>,
        /// Emit the report as JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .try_init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Clean { input, output } => clean::run(clean::CleanConfig { input, output }),
        Commands::Report {
            input,
            title_type,
            decade_start,
            decade_end,
            genres,
            top_genres,
            top_popular,
            json,
        } => report::run(report::ReportConfig {
            input,
            title_type,
            decade_start,
            decade_end,
            genres: genres.unwrap_or_default(),
            top_genres_limit: top_genres,
            top_popular_limit: top_popular,
            json,
        }),
    }
}
