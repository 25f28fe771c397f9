//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - generates the synthetic corpus
//! - runs state-count selection
//! - prints reports
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, SelectArgs};
use crate::corpus::Corpus;
use crate::data::SyntheticConfig;
use crate::domain::{SelectConfig, SelectorKind};
use crate::error::AppError;
use crate::hmm::SegmentalFitter;

pub mod pipeline;

/// Entry point for the `hmmtop` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Select(args) => handle_select(args),
        Command::Compare(args) => handle_compare(args),
    }
}

fn handle_select(args: SelectArgs) -> Result<(), AppError> {
    let corpus = build_corpus(&args)?;
    let config = select_config_from_args(&args, args.strategy);
    let fitter = SegmentalFitter::default();

    let report = pipeline::run_selection(&corpus, &config, &fitter)?;
    println!("{}", crate::report::format_selection_summary(&report));

    if let Some(path) = &args.export_csv {
        crate::io::export::write_results_csv(path, &report)?;
    }
    if let Some(path) = &args.export_json {
        crate::io::export::write_report_json(path, &report)?;
    }

    Ok(())
}

fn handle_compare(args: SelectArgs) -> Result<(), AppError> {
    let corpus = build_corpus(&args)?;
    let fitter = SegmentalFitter::default();

    let mut runs = Vec::with_capacity(SelectorKind::ALL.len());
    for strategy in SelectorKind::ALL {
        let config = select_config_from_args(&args, strategy);
        runs.push(pipeline::run_selection(&corpus, &config, &fitter)?);
    }

    println!("{}", crate::report::format_comparison(&runs));
    Ok(())
}

fn build_corpus(args: &SelectArgs) -> Result<Corpus, AppError> {
    crate::data::generate_corpus(&SyntheticConfig {
        n_words: args.words,
        utterances_per_word: args.utterances,
        n_features: args.features,
        true_states: args.true_states,
        frames_per_state: args.frames_per_state,
        noise: args.noise,
        seed: args.corpus_seed,
    })
}

pub fn select_config_from_args(args: &SelectArgs, strategy: SelectorKind) -> SelectConfig {
    SelectConfig {
        strategy,
        n_constant: args.constant_states,
        min_n_components: args.min_states,
        max_n_components: args.max_states,
        n_folds: args.folds,
        random_state: args.seed,
        verbose: args.verbose,
    }
}
