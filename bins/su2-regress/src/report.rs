// Run summary and JSON report output
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use su2_regress_common::types::SuiteResult;

/// Summary lines in run order
pub fn summary_lines(suite: &SuiteResult) -> Vec<String> {
    let mut lines = vec![
        "==================================================================".to_string(),
        "Summary of the parallel tests".to_string(),
    ];
    for result in &suite.results {
        if result.passed() {
            lines.push(format!("  passed - {}", result.tag));
        } else {
            lines.push(format!("* FAILED - {} ({})", result.tag, result.status));
        }
    }
    lines.push(format!(
        "{} passed, {} failed, {} total",
        suite.passed_count(),
        suite.failed_count(),
        suite.results.len()
    ));
    lines
}

pub fn print_summary(suite: &SuiteResult) {
    for line in summary_lines(suite) {
        println!("{}", line);
    }
}

/// Process exit code for a finished run
pub fn exit_code(suite: &SuiteResult) -> i32 {
    if suite.all_passed() {
        0
    } else {
        1
    }
}

pub fn write_json(suite: &SuiteResult, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(suite).context("Failed to serialize report")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
