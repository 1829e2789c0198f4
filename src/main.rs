use clap::Parser;

mod logging;

use pipeflow::config::{load_config, validate_config};
use pipeflow::pipe::SyncPipe;
use pipeflow::pipeline::{build_pipeline, list_stage_types};

/// pipeflow - a composable toolkit for building batch and streaming data
/// pipelines from TOML configuration.
#[derive(Parser)]
#[command(name = "pipeflow")]
#[command(author = "Keith Bugeja <keith.bugeja@um.edu.mt>")]
#[command(version = "0.1.0")]
#[command(about = "pipeflow: a composable toolkit for batch and streaming data pipelines")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "./config/config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// List available stage types
    #[arg(short = 'L', long)]
    list_stages: bool,
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level);

    if cli.list_stages {
        println!("Available stage types:");
        for stage in list_stage_types() {
            println!("  - {stage}");
        }
        return;
    }

    let config = match load_config(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Failed to load config from '{}': {}", cli.config, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = validate_config(&config) {
        tracing::error!("Configuration error: {e}");
        std::process::exit(1);
    }

    tracing::info!("Configuration loaded and validated successfully.");

    let mut names: Vec<&String> = config.pipelines.keys().collect();
    names.sort();

    let mut failures = 0usize;
    for name in names {
        let pipeline_cfg = &config.pipelines[name];
        tracing::info!("Running pipeline '{name}': {}", pipeline_cfg.description);
        if let Err(e) = run_pipeline(pipeline_cfg) {
            tracing::error!("Pipeline '{name}' failed: {e}");
            failures += 1;
        }
    }

    if failures > 0 {
        std::process::exit(1);
    }
    tracing::info!("All pipelines have run to completion.");
}

fn run_pipeline(cfg: &pipeflow::config::PipelineConfig) -> Result<(), pipeflow::error::PipeError> {
    let mut pipe = build_pipeline(cfg)?;
    pipe.start()?;
    let mut count = 0u64;
    let result = loop {
        match pipe.next() {
            Ok(Some(_item)) => count += 1,
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        }
    };
    pipe.close()?;
    tracing::info!("processed {count} items");
    result
}
