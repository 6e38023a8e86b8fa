// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `train`   — trains on a JSONL file and saves the artifacts
//   2. `predict` — loads the artifacts and classifies texts
//   3. `serve`   — loads the artifacts and starts the HTTP server
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Commands, PredictArgs, ServeArgs, TrainArgs};

use crate::api::server::{self, AppState};
use crate::application::analyze_use_case::AnalyzeUseCase;
use crate::application::pipeline::DisasterPipeline;
use crate::application::train_use_case::TrainUseCase;

#[derive(Parser, Debug)]
#[command(
    name = "disaster-nlp",
    version,
    about = "Classify short posts as disaster-related, from training to serving."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case. The CLI only routes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => run_train(args),
            Commands::Predict(args) => run_predict(args),
            Commands::Serve(args) => run_serve(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    tracing::info!("Starting training on posts in: {}", args.data.display());

    let use_case = TrainUseCase::new(args.into());
    let history = use_case.execute()?;

    let last = history.epochs.last();
    println!(
        "Training complete after {} epochs (best epoch: {}, final train accuracy: {}).",
        history.epochs.len(),
        history
            .best_epoch
            .map_or_else(|| "-".to_string(), |e| e.to_string()),
        last.map_or_else(
            || "-".to_string(),
            |m| format!("{:.1}%", m.train_accuracy * 100.0)
        ),
    );
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    let artifacts = &args.artifacts;
    let use_case = AnalyzeUseCase::new(
        &artifacts.model_path,
        &artifacts.tokenizer_path,
        artifacts.max_words,
        artifacts.max_seq_len,
    )?;

    let analysis = use_case.analyze(&args.text, args.threshold)?;
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

fn run_serve(args: ServeArgs) -> Result<()> {
    let artifacts = &args.artifacts;
    let mut pipeline = DisasterPipeline::new(artifacts.max_words, artifacts.max_seq_len)
        .context("Invalid --max-words / --max-seq-len")?;

    match pipeline.load(&artifacts.model_path, &artifacts.tokenizer_path) {
        Ok(()) => tracing::info!("Model and tokenizer loaded"),
        Err(e) if args.allow_unloaded => {
            tracing::warn!("Starting without a model: {}", e);
        }
        Err(e) => {
            return Err(e).with_context(|| {
                format!(
                    "Cannot load model '{}' with tokenizer '{}' (use --allow-unloaded to start anyway)",
                    artifacts.model_path.display(),
                    artifacts.tokenizer_path.display()
                )
            });
        }
    }

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", args.host, args.port))?;

    let runtime = tokio::runtime::Runtime::new().context("Cannot start the async runtime")?;
    runtime.block_on(server::run(addr, AppState::new(pipeline)))
}
