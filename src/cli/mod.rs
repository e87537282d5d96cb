//! Churn Pipeline CLI Module
//!
//! One subcommand per stage. Stage outputs are written to files so each
//! command can run in its own process.

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::PipelineConfig;
use crate::evaluation::EvaluationReport;
use crate::export::Blob;
use crate::pipeline::{Pipeline, DEFAULT_ARTIFACT_NAME};
use crate::training::CandidateResult;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn muted(s: &str) -> ColoredString { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString    { s.truecolor(100, 210, 120) }

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "churn-pipeline")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Batch churn prediction: load, preprocess, train, evaluate")]
#[command(long_about = None)]
pub struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding model artifacts
    #[arg(long, global = true)]
    pub model_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read the dataset and write a labeled blob
    Load {
        /// Input CSV file
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Output blob file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Engineer features, split and scale
    Preprocess {
        /// Blob written by `load`
        #[arg(short, long)]
        input: PathBuf,

        /// Output blob file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Grid-search the model and store the best one
    Train {
        /// Blob written by `preprocess`
        #[arg(short, long)]
        input: PathBuf,

        /// Artifact name inside the model directory
        #[arg(short, long, default_value = DEFAULT_ARTIFACT_NAME)]
        artifact: String,

        /// Output file for the per-candidate scores
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Score a stored model on the held-out rows
    Evaluate {
        /// Artifact name inside the model directory
        #[arg(short, long, default_value = DEFAULT_ARTIFACT_NAME)]
        artifact: String,

        /// Scores written by `train`
        #[arg(short, long)]
        results: PathBuf,

        /// Blob written by `preprocess`
        #[arg(short, long)]
        input: PathBuf,

        /// Output report file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run all four stages once
    Run {
        /// Input CSV file
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Artifact name inside the model directory
        #[arg(short, long, default_value = DEFAULT_ARTIFACT_NAME)]
        artifact: String,

        /// Output report file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

/// Build the configuration from `--config` and the overriding flags
pub fn resolve_config(config: Option<&Path>, model_dir: Option<&Path>, data: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    let mut cfg = match config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = model_dir {
        cfg.model_dir = dir.to_path_buf();
    }
    if let Some(path) = data {
        cfg.data_path = path.to_path_buf();
    }
    cfg.validate()?;
    Ok(cfg)
}

fn read_blob(path: &Path) -> anyhow::Result<Blob> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(Blob::from_bytes(&bytes)?)
}

fn write_file(path: &Path, contents: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("writing {}", path.display()))
}

fn print_results(results: &[CandidateResult]) {
    section("Grid search");
    for r in results {
        println!(
            "  {:>4} trees  depth {:>3}   {}",
            r.hyperparameters.n_estimators,
            r.hyperparameters.max_depth,
            format!("{:.4}", r.train_accuracy).white()
        );
    }
}

fn print_report(report: &EvaluationReport) {
    section("Evaluation");
    println!("  {}", kv("test accuracy", &format!("{:.4}", report.test_accuracy)));
    println!("  {}", kv("roc auc      ", &format!("{:.4}", report.roc_auc)));

    section("Feature importance");
    for (name, importance) in report.ranked_importances() {
        println!("  {}", kv(&format!("{:<28}", name), &format!("{:.4}", importance)));
    }

    let m = report.confusion_matrix;
    section("Confusion matrix");
    println!("  {}", dim("             pred 0   pred 1"));
    println!("  {} {:>8} {:>8}", muted("true 0    "), m[0][0], m[0][1]);
    println!("  {} {:>8} {:>8}", muted("true 1    "), m[1][0], m[1][1]);
}

pub fn cmd_load(pipeline: &Pipeline, output: &Path) -> anyhow::Result<()> {
    let blob = pipeline.load()?;
    write_file(output, blob.as_bytes())?;
    step_ok(&format!("Wrote labeled dataset to {}", output.display()));
    Ok(())
}

pub fn cmd_preprocess(pipeline: &Pipeline, input: &Path, output: &Path) -> anyhow::Result<()> {
    let blob = pipeline.preprocess(&read_blob(input)?)?;
    write_file(output, blob.as_bytes())?;
    step_ok(&format!("Wrote preprocessed dataset to {}", output.display()));
    Ok(())
}

pub fn cmd_train(pipeline: &Pipeline, input: &Path, artifact: &str, output: &Path) -> anyhow::Result<()> {
    let results = pipeline.train(&read_blob(input)?, artifact)?;
    write_file(output, serde_json::to_string_pretty(&results)?.as_bytes())?;
    print_results(&results);
    step_ok(&format!("Stored model as {}", artifact));
    Ok(())
}

pub fn cmd_evaluate(
    pipeline: &Pipeline,
    artifact: &str,
    results: &Path,
    input: &Path,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let text = fs::read_to_string(results).with_context(|| format!("reading {}", results.display()))?;
    let results: Vec<CandidateResult> = serde_json::from_str(&text)?;
    let blob = read_blob(input)?;

    let report = pipeline.evaluate(artifact, results, &blob)?;
    print_report(&report);
    section("Classification report");
    println!("{}", pipeline.classification_report(artifact, &blob)?);

    if let Some(path) = output {
        write_file(path, serde_json::to_string_pretty(&report)?.as_bytes())?;
        step_ok(&format!("Wrote report to {}", path.display()));
    }
    Ok(())
}

pub fn cmd_run(pipeline: &Pipeline, artifact: &str, output: Option<&Path>) -> anyhow::Result<()> {
    let raw = pipeline.load()?;
    let prepared = pipeline.preprocess(&raw)?;
    let results = pipeline.train(&prepared, artifact)?;
    print_results(&results);

    let report = pipeline.evaluate(artifact, results, &prepared)?;
    print_report(&report);
    section("Classification report");
    println!("{}", pipeline.classification_report(artifact, &prepared)?);

    if let Some(path) = output {
        write_file(path, serde_json::to_string_pretty(&report)?.as_bytes())?;
        step_ok(&format!("Wrote report to {}", path.display()));
    }
    Ok(())
}

/// Dispatch a parsed command line
pub fn run(cli: Cli) -> anyhow::Result<()> {
    let data = match &cli.command {
        Commands::Load { data, .. } | Commands::Run { data, .. } => data.as_deref(),
        _ => None,
    };
    let config = resolve_config(cli.config.as_deref(), cli.model_dir.as_deref(), data)?;
    let pipeline = Pipeline::new(config);

    match &cli.command {
        Commands::Load { output, .. } => cmd_load(&pipeline, output),
        Commands::Preprocess { input, output } => cmd_preprocess(&pipeline, input, output),
        Commands::Train { input, artifact, output } => cmd_train(&pipeline, input, artifact, output),
        Commands::Evaluate { artifact, results, input, output } => {
            cmd_evaluate(&pipeline, artifact, results, input, output.as_deref())
        }
        Commands::Run { artifact, output, .. } => cmd_run(&pipeline, artifact, output.as_deref()),
    }
}
