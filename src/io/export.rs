//! Export selection results to CSV or JSON.
//!
//! The CSV is meant to be easy to consume in spreadsheets or downstream
//! scripts; the JSON carries the full report including the configuration
//! that produced it, so runs can be reproduced later.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::SelectionReport;
use crate::error::AppError;

/// Write per-word selection results to a CSV file.
pub fn write_results_csv(path: &Path, report: &SelectionReport) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display()))
    })?;

    writeln!(file, "word,strategy,n_states,log_likelihood,n_sequences,n_frames")
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for r in &report.results {
        writeln!(
            file,
            "{},{},{},{},{},{}",
            r.word,
            r.strategy.display_name(),
            r.n_states.map(|n| n.to_string()).unwrap_or_default(),
            r.log_likelihood
                .map(|v| format!("{v:.6}"))
                .unwrap_or_default(),
            r.n_sequences,
            r.n_frames,
        )
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

/// Write the full selection report as pretty-printed JSON.
pub fn write_report_json(path: &Path, report: &SelectionReport) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(2, format!("Failed to create report JSON '{}': {e}", path.display()))
    })?;

    serde_json::to_writer_pretty(file, report)
        .map_err(|e| AppError::new(2, format!("Failed to write report JSON: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SelectConfig, SelectorKind, WordSelection};

    fn sample_report() -> SelectionReport {
        SelectionReport {
            config: SelectConfig::default(),
            results: vec![
                WordSelection {
                    word: "HELLO".to_string(),
                    strategy: SelectorKind::Bic,
                    n_states: Some(3),
                    log_likelihood: Some(-12.5),
                    n_sequences: 5,
                    n_frames: 40,
                },
                WordSelection {
                    word: "WORLD".to_string(),
                    strategy: SelectorKind::Bic,
                    n_states: None,
                    log_likelihood: None,
                    n_sequences: 1,
                    n_frames: 4,
                },
            ],
        }
    }

    #[test]
    fn csv_export_writes_one_row_per_word() {
        let path = std::env::temp_dir().join("hmmtop_export_test.csv");
        write_results_csv(&path, &sample_report()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("HELLO,BIC,3,"));
        // Missing selections export as empty fields, not placeholders.
        assert!(lines[2].starts_with("WORLD,BIC,,,"));
    }

    #[test]
    fn json_export_round_trips_the_word_list() {
        let path = std::env::temp_dir().join("hmmtop_export_test.json");
        write_report_json(&path, &sample_report()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["results"][0]["word"], "HELLO");
        assert_eq!(value["results"][1]["n_states"], serde_json::Value::Null);
    }
}
