//! Cough screening CLI.
//!
//! `analyze` runs one or more clips through the pipeline as a batch and
//! reports per-clip outcomes; `info` loads the model artifacts and prints
//! what the service would serve with.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use coughcheck_classifier::{
    Analyzer, CoughModel, OnnxModel, OnnxModelConfig, PipelineConfig, PredictionStats,
};

#[derive(Parser)]
#[command(name = "coughcheck")]
#[command(about = "Cough audio screening against a local ONNX model")]
#[command(version)]
struct Cli {
    /// Pipeline config file (JSON). Omit to use the deployed defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one or more audio clips as a single batch
    Analyze {
        /// Audio files to analyze
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// ONNX model weights
        #[arg(long, default_value = "models/cough.onnx")]
        model: PathBuf,

        /// Label-order file (JSON array of class names)
        #[arg(long, default_value = "models/labels.json")]
        labels: PathBuf,

        /// Output as JSON (for piping)
        #[arg(long)]
        json: bool,

        /// Print summary statistics after the per-clip results
        #[arg(long)]
        stats: bool,
    },

    /// Load the model artifacts and print the serving configuration
    Info {
        /// ONNX model weights
        #[arg(long, default_value = "models/cough.onnx")]
        model: PathBuf,

        /// Label-order file (JSON array of class names)
        #[arg(long, default_value = "models/labels.json")]
        labels: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let cfg = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze {
            files,
            model,
            labels,
            json,
            stats,
        } => run_analyze(cfg, &model, &labels, &files, json, stats),
        Commands::Info { model, labels } => run_info(cfg, &model, &labels),
    }
}

fn setup_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("failed to parse config {}", path.display()))
        }
        None => Ok(PipelineConfig::default()),
    }
}

fn build_analyzer(
    cfg: PipelineConfig,
    model: &Path,
    labels: &Path,
) -> anyhow::Result<Analyzer> {
    let model = OnnxModel::load(model, labels, OnnxModelConfig::default())
        .context("failed to load model artifacts")?;
    Analyzer::new(cfg, Arc::new(model)).context("failed to start the analyzer")
}

fn run_analyze(
    cfg: PipelineConfig,
    model: &Path,
    labels: &Path,
    files: &[PathBuf],
    json: bool,
    stats: bool,
) -> anyhow::Result<()> {
    let positive_label = cfg.positive_label.clone();
    let analyzer = build_analyzer(cfg, model, labels)?;

    let mut clips: Vec<(String, Vec<u8>)> = Vec::with_capacity(files.len());
    for path in files {
        let bytes = fs::read(path)
            .with_context(|| format!("failed to read clip {}", path.display()))?;
        clips.push((path.display().to_string(), bytes));
    }

    let outcomes = analyzer.analyze_batch(
        clips
            .iter()
            .map(|(name, bytes)| (name.as_str(), bytes.as_slice())),
    )?;

    let predictions: Vec<_> = outcomes
        .iter()
        .filter_map(|o| o.result.as_ref().ok().cloned())
        .collect();

    if json {
        let items: Vec<serde_json::Value> = outcomes
            .iter()
            .map(|o| match &o.result {
                Ok(prediction) => serde_json::json!({
                    "filename": o.filename,
                    "prediction": prediction,
                }),
                Err(e) => serde_json::json!({
                    "filename": o.filename,
                    "error": e.to_string(),
                }),
            })
            .collect();
        let mut report = serde_json::json!({ "results": items });
        if stats {
            report["stats"] =
                serde_json::to_value(PredictionStats::summarize(&predictions, &positive_label))?;
        }
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for outcome in &outcomes {
            match &outcome.result {
                Ok(p) => println!(
                    "{}: {} ({:.2}) risk={}",
                    outcome.filename, p.label, p.confidence, p.risk
                ),
                Err(e) => println!("{}: error: {}", outcome.filename, e),
            }
        }
        if stats {
            let s = PredictionStats::summarize(&predictions, &positive_label);
            println!(
                "total={} positive={} negative={} mean_confidence={:.2} risk high/medium/low={}/{}/{}",
                s.total, s.positive, s.negative, s.mean_confidence,
                s.high_risk, s.medium_risk, s.low_risk
            );
        }
    }

    if !outcomes.is_empty() && predictions.is_empty() {
        anyhow::bail!("every clip in the batch failed");
    }
    Ok(())
}

fn run_info(cfg: PipelineConfig, model: &Path, labels: &Path) -> anyhow::Result<()> {
    let runtime = OnnxModel::load(model, labels, OnnxModelConfig::default())
        .context("failed to load model artifacts")?;

    println!("model:        {}", model.display());
    println!("classes:      {:?}", runtime.labels());
    println!("sample rate:  {} Hz", cfg.sample_rate);
    println!("duration:     {} s", cfg.duration_secs);
    println!("mel bands:    {}", cfg.n_mels);
    println!("fft/hop:      {}/{}", cfg.n_fft, cfg.hop_length);
    println!("input shape:  {:?}", cfg.tensor_shape());
    println!("extensions:   {}", cfg.allowed_extensions.join(", "));
    Ok(())
}
