//! Reporting utilities: formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the selection code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::domain::SelectionReport;

/// Format the summary of one selection run.
pub fn format_selection_summary(report: &SelectionReport) -> String {
    let mut out = String::new();

    out.push_str("=== hmmtop - HMM state-count selection ===\n");
    out.push_str(&format!(
        "Strategy: {}\n",
        report.config.strategy.display_name()
    ));
    out.push_str(&format!(
        "Search range: {}..{} (CV: ..={}), constant {}\n",
        report.config.min_n_components,
        report.config.max_n_components,
        report.config.max_n_components,
        report.config.n_constant
    ));
    out.push_str(&format!("Seed: {}\n\n", report.config.random_state));

    out.push_str(&format!(
        "{:<12} {:>6} {:>7} {:>7} {:>14}\n",
        "word", "utts", "frames", "states", "logL"
    ));
    for r in &report.results {
        let states = r
            .n_states
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        let log_l = r
            .log_likelihood
            .map(|v| format!("{v:.2}"))
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:<12} {:>6} {:>7} {:>7} {:>14}\n",
            r.word, r.n_sequences, r.n_frames, states, log_l
        ));
    }

    let selected = report.results.iter().filter(|r| r.n_states.is_some()).count();
    out.push_str(&format!(
        "\nSelected models for {selected} of {} words.\n",
        report.results.len()
    ));

    out
}

/// Format a side-by-side comparison of several strategies over one corpus.
///
/// All reports must come from the same corpus; rows are matched by word
/// order, which the pipeline keeps deterministic.
pub fn format_comparison(runs: &[SelectionReport]) -> String {
    let mut out = String::new();

    out.push_str("=== hmmtop - strategy comparison (selected state counts) ===\n\n");
    out.push_str(&format!("{:<12}", "word"));
    for run in runs {
        out.push_str(&format!(" {:>9}", run.config.strategy.display_name()));
    }
    out.push('\n');

    let n_words = runs.first().map_or(0, |run| run.results.len());
    for i in 0..n_words {
        out.push_str(&format!("{:<12}", runs[0].results[i].word));
        for run in runs {
            let states = run.results[i]
                .n_states
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string());
            out.push_str(&format!(" {:>9}", states));
        }
        out.push('\n');
    }

    out
}
