//! ink-oracle CLI: convert handwritten-math ink with ground truth into
//! oracle label graphs.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use clap::Parser;
use miette::{IntoDiagnostic, Result};

use ink_oracle::batch::{discover, run_batch};
use ink_oracle::config::{ConfigError, MissingGroundTruth, OracleConfig};
use ink_oracle::oracle::OracleMode;

#[derive(Parser)]
#[command(
    name = "ink-oracle",
    version,
    about = "Build oracle symbol/relationship graphs from InkML and ground truth"
)]
struct Cli {
    /// Directory of InkML files (searched recursively).
    ink_dir: PathBuf,

    /// Directory of ground-truth .lg files (searched recursively).
    gt_dir: PathBuf,

    /// Grouping granularity and topology: lr_stroke, lr_symbol, mst_stroke
    /// or mst_symbol.
    #[arg(value_parser = str::parse::<OracleMode>)]
    mode: OracleMode,

    /// Root for the per-mode output directories.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Worker threads (0 = available parallelism).
    #[arg(long)]
    workers: Option<usize>,

    /// TOML config file; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Abort if any ink file has no ground-truth file.
    #[arg(long)]
    strict: bool,

    /// Write the run report as JSON.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Disable the progress bar.
    #[arg(long)]
    no_progress: bool,
}

impl Cli {
    /// File config (or defaults) with command-line overrides applied.
    fn resolve_config(&self) -> Result<OracleConfig> {
        let mut config = match &self.config {
            Some(path) => OracleConfig::load(path)?,
            None => OracleConfig::default(),
        };
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if self.strict {
            config.missing_ground_truth = MissingGroundTruth::Fail;
        }
        if self.no_progress {
            config.progress = false;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mode = cli.mode;
    let config = cli.resolve_config()?;

    for (kind, path) in [("ink", &cli.ink_dir), ("ground-truth", &cli.gt_dir)] {
        if !path.is_dir() {
            return Err(ConfigError::MissingDirectory {
                kind,
                path: path.display().to_string(),
            }
            .into());
        }
    }

    let cancel = Arc::new(AtomicBool::new(false));
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(&cancel)).into_diagnostic()?;
    }

    let discovery = discover(&cli.ink_dir, &cli.gt_dir, config.missing_ground_truth)?;
    let report = run_batch(&discovery, mode, &config, &cancel)?;

    tracing::info!(
        mode = %mode,
        processed = report.processed,
        failed = report.failed.len(),
        skipped = report.skipped_missing.len(),
        cancelled = report.cancelled,
        "batch finished"
    );
    println!(
        "{mode}: {} written to {}, {} failed, {} without ground truth",
        report.processed,
        config.output_dir.join(mode.output_dir_name()).display(),
        report.failed.len(),
        report.skipped_missing.len(),
    );
    for failure in &report.failed {
        println!("  failed: {}: {}", failure.path.display(), failure.error);
    }
    for duplicate in &report.skipped_duplicate {
        println!("  skipped, duplicate name: {}", duplicate.display());
    }
    if report.cancelled > 0 {
        println!("  cancelled before start: {}", report.cancelled);
    }

    if let Some(path) = &cli.report {
        report.write_json(path)?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn mode_parses_through_oracle_mode() {
        for mode in OracleMode::ALL {
            let cli = Cli::try_parse_from(["ink-oracle", "ink", "gt", mode.name()]).unwrap();
            assert_eq!(cli.mode, mode);
        }
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let Err(err) = Cli::try_parse_from(["ink-oracle", "ink", "gt", "lr"]) else {
            panic!("mode \"lr\" was accepted");
        };
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        assert!(err.to_string().contains("unknown oracle mode"));
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "ink-oracle",
            "ink",
            "gt",
            "lr_symbol",
            "--strict",
            "--no-progress",
            "--workers",
            "3",
            "--output-dir",
            "out",
        ])
        .unwrap();
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.missing_ground_truth, MissingGroundTruth::Fail);
        assert!(!config.progress);
        assert_eq!(config.workers, 3);
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }
}
