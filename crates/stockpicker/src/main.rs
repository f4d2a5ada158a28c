//! StockPicker - stock analysis reports from a hosted agent

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{analyze_command, chaos_command, init_command, schema_command, status_command};

/// StockPicker - investment analysis from your code snippet index
#[derive(Parser)]
#[command(name = "stockpicker")]
#[command(about = "◆ Stock analysis reports from a hosted agent")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config and reports directory
    Init,
    /// Generate a stock analysis report
    Analyze {
        /// Analysis request
        #[arg(short, long)]
        query: Option<String>,
        /// File holding prior conversation to ground the analysis in
        #[arg(long, value_name = "FILE")]
        history: Option<PathBuf>,
        /// Write the report here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Also keep a timestamped copy in the reports directory
        #[arg(long)]
        save: bool,
    },
    /// Show the chaos settings the next run would use
    Chaos {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show system status
    Status,
    /// Print the analysis input schema
    Schema,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Init => init_command().await,
        Commands::Analyze {
            query,
            history,
            output,
            save,
        } => analyze_command(query, history, output, save).await,
        Commands::Chaos { json } => chaos_command(json),
        Commands::Status => status_command().await,
        Commands::Schema => schema_command(),
    };

    if let Err(e) = result {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}
