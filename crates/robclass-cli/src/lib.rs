//! robclass-cli library
//!
//! Exports the CLI structures behind the `robclass` binary for testing and reuse.

use clap::{Parser, ValueEnum};
use robclass::config::ExperimentConfig;
use robclass::corpus::JsonCorpus;
use robclass::experiment::{run_experiment, ExperimentKind, ExperimentOutcome, Trainers};
use robclass::metrics::BinaryMetricsRecorder;
use robclass::text::sentence::RuleBasedSegmenter;
use std::path::{Path, PathBuf};
use tracing::info;

pub mod error;
mod output;

pub use error::{CliError, Result};

/// File name of the saved document masks inside the output directory.
pub const MASKS_FILENAME: &str = "masks.bin";

/// robclass - risk-of-bias text classification experiments
///
/// Trains on documents reviewed once, tests on documents reviewed twice and
/// writes model, baseline and human results tables to OUT_DIR.
#[derive(Parser, Debug)]
#[command(name = "robclass")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory receiving the results tables
    #[arg(value_name = "OUT_DIR", default_value = "results")]
    pub out_dir: PathBuf,

    /// JSON corpus of assessed documents
    #[arg(long, value_name = "FILE")]
    pub corpus: PathBuf,

    /// JSON experiment config (defaults apply when omitted)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Experiment to run
    #[arg(long, value_enum, default_value_t = Experiment::Hybrid)]
    pub experiment: Experiment,

    /// Also write the fitted document masks to OUT_DIR/masks.bin
    #[arg(long)]
    pub save_masks: bool,

    /// Verbose output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Experiment selector on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Experiment {
    /// Sentence cascade feeding a multitask document model
    Hybrid,
    /// One bigram model per category
    Basic,
}

impl From<Experiment> for ExperimentKind {
    fn from(e: Experiment) -> Self {
        match e {
            Experiment::Hybrid => Self::Hybrid,
            Experiment::Basic => Self::Basic,
        }
    }
}

impl Cli {
    /// Default log filter for the verbosity flags; `RUST_LOG` overrides it.
    #[must_use]
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "robclass=debug,robclass_cli=debug"
        } else {
            "robclass=info,robclass_cli=info"
        }
    }
}

fn check_inputs(cli: &Cli) -> Result<()> {
    if !cli.corpus.is_file() {
        return Err(CliError::FileNotFound(cli.corpus.clone()));
    }
    if let Some(config) = &cli.config {
        if !config.is_file() {
            return Err(CliError::FileNotFound(config.clone()));
        }
    }
    if cli.out_dir.exists() && !cli.out_dir.is_dir() {
        return Err(CliError::NotADirectory(cli.out_dir.clone()));
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ExperimentConfig> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            Ok(ExperimentConfig::from_path(path)?)
        }
        None => Ok(ExperimentConfig::default()),
    }
}

/// Runs the experiment selected by `cli` with grid-searched SGD trainers.
///
/// # Errors
///
/// Returns an error if an input is missing, or the experiment or mask
/// persistence fails.
pub fn execute(cli: &Cli) -> Result<ExperimentOutcome> {
    check_inputs(cli)?;
    let config = load_config(cli.config.as_deref())?;
    let corpus = JsonCorpus::from_path(&cli.corpus)?;
    let trainers = Trainers::grid_search(&config)?;

    let mut outcome = run_experiment(
        cli.experiment.into(),
        &corpus,
        &config,
        &trainers,
        Box::new(RuleBasedSegmenter::new()),
        &cli.out_dir,
    )?;

    if cli.save_masks {
        let path = cli.out_dir.join(MASKS_FILENAME);
        outcome.masks.save(&path)?;
        info!(path = %path.display(), prefixes = outcome.masks.len(), "saved masks");
        outcome.written.push(path);
    }

    if !cli.quiet {
        print_summary(cli, &config, &outcome);
    }
    Ok(outcome)
}

fn print_recorder(title: &str, recorder: &BinaryMetricsRecorder) {
    output::section(title);
    for record in recorder.records() {
        output::kv(&record.category, format!("F1 {}", output::ratio(record.f1)));
    }
    if let Some(mean) = recorder.mean() {
        output::kv(
            "mean",
            format!(
                "F1 {}  precision {}  recall {}",
                output::ratio(mean.f1),
                output::ratio(mean.precision),
                output::ratio(mean.recall)
            ),
        );
    }
}

fn print_summary(cli: &Cli, config: &ExperimentConfig, outcome: &ExperimentOutcome) {
    output::section(&format!("robclass {} experiment", ExperimentKind::from(cli.experiment)));
    output::kv("Corpus", cli.corpus.display());
    output::kv("Output", cli.out_dir.display());

    print_recorder("Model", &outcome.model);
    print_recorder("Baseline (always low risk)", &outcome.baseline);
    print_recorder("Second reviewer", &outcome.human);

    for category in &config.categories {
        if !outcome.model.records().iter().any(|r| &r.category == category) {
            output::warning(&format!("{category}: no double-assessed documents, not scored"));
        }
    }
    println!();
    for path in &outcome.written {
        output::success(&format!("wrote {}", path.display()));
    }
}

/// Prints `err` to stderr in the CLI's error style.
pub fn report_error(err: &CliError) {
    output::error(&err.to_string());
}
