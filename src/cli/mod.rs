//! Command-line parsing for the state-count selection tool.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the modeling/selection code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::SelectorKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "hmmtop", version, about = "HMM state-count selection over a synthetic vocabulary")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one selection strategy over the corpus and print per-word results.
    Select(SelectArgs),
    /// Run all four strategies and print the chosen state counts side by side.
    Compare(SelectArgs),
}

/// Common options for selection runs.
#[derive(Debug, Parser, Clone)]
pub struct SelectArgs {
    /// Which selection criterion to apply (ignored by `compare`).
    #[arg(short = 's', long, value_enum, default_value_t = SelectorKind::Bic)]
    pub strategy: SelectorKind,

    /// Lower bound of the state-count search range.
    #[arg(long, default_value_t = 2)]
    pub min_states: usize,

    /// Upper bound of the state-count search range
    /// (exclusive for BIC/DIC, inclusive for CV).
    #[arg(long, default_value_t = 10)]
    pub max_states: usize,

    /// Fixed state count used by the constant strategy.
    #[arg(long, default_value_t = 3)]
    pub constant_states: usize,

    /// Folds used by the CV strategy.
    #[arg(long, default_value_t = 3)]
    pub folds: usize,

    /// Seed forwarded to the fitter.
    #[arg(long, default_value_t = 14)]
    pub seed: u64,

    /// Log per-candidate fit success/failure to stderr.
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Number of synthetic vocabulary words.
    #[arg(long, default_value_t = 8)]
    pub words: usize,

    /// Utterances generated per word.
    #[arg(long, default_value_t = 6)]
    pub utterances: usize,

    /// Feature dimensionality of the synthetic observations.
    #[arg(long, default_value_t = 2)]
    pub features: usize,

    /// Hidden states each synthetic word is generated from.
    #[arg(long, default_value_t = 3)]
    pub true_states: usize,

    /// Frames emitted per generated state, before length jitter.
    #[arg(long, default_value_t = 4)]
    pub frames_per_state: usize,

    /// Noise level of the synthetic observations.
    #[arg(long, default_value_t = 0.3)]
    pub noise: f64,

    /// Seed for synthetic corpus generation (independent of the fit seed).
    #[arg(long, default_value_t = 42)]
    pub corpus_seed: u64,

    /// Write per-word results to a CSV file.
    #[arg(long)]
    pub export_csv: Option<PathBuf>,

    /// Write the full report to a JSON file.
    #[arg(long)]
    pub export_json: Option<PathBuf>,
}
