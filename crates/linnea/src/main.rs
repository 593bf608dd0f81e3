//! Linnea CLI - Vision-language model evaluation and label hierarchies.
//!
//! Linnea evaluates multimodal models on image classification benchmarks and
//! builds "is-a" hierarchies for class labels from external knowledge bases.
//!
//! # Usage
//!
//! ```bash
//! # Evaluate a local Ollama model on CUB-200
//! linnea eval cub200 --split test --provider ollama
//!
//! # Build a hierarchy for one label
//! linnea hierarchy "water lily" --source wikidata
//!
//! # Inspect a dataset
//! linnea datasets stats caltech101
//!
//! # View configuration
//! linnea config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Linnea - Vision-language model evaluation and label hierarchies.
#[derive(Parser, Debug)]
#[command(name = "linnea")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate a model on an image classification benchmark
    Eval(cli::eval::EvalArgs),

    /// Build label hierarchies from external knowledge sources
    Hierarchy(cli::hierarchy::HierarchyArgs),

    /// Download and inspect datasets
    Datasets(cli::datasets::DatasetsArgs),

    /// Merge and reshape evaluation results
    Report(cli::report::ReportArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging from config, with CLI verbose override.
    // Note: logging isn't initialized yet, so use eprintln for config warnings.
    let config = match linnea_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `linnea config path`."
            );
            linnea_core::Config::default()
        }
    };
    logging::init(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Linnea v{}", linnea_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Eval(args) => cli::eval::execute(args).await,
        Commands::Hierarchy(args) => cli::hierarchy::execute(args).await,
        Commands::Datasets(args) => cli::datasets::execute(args).await,
        Commands::Report(args) => cli::report::execute(args).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
