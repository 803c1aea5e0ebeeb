mod config;
mod engine;
#[cfg(test)]
mod engine_tests;
mod evaluator;
mod executor;
mod report;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::CatalogManager;
use engine::SolverEngine;
use std::path::PathBuf;
use su2_regress_common::config::HarnessConfig;
use su2_regress_common::types::Check;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "su2-regress")]
#[command(about = "Run the SU2 discrete-adjoint parallel regression suite", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the regression cases and compare against stored values
    Run {
        /// JSON catalog to use instead of the built-in suite
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// TestCases root directory (overrides SU2_TESTCASES_DIR)
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Only run cases whose tag contains this text (repeatable)
        #[arg(short, long)]
        filter: Vec<String>,

        /// Also run cases marked as disabled
        #[arg(long, default_value = "false")]
        include_disabled: bool,

        /// Solver command replacing every case's su2_exec (overrides SU2_EXEC_OVERRIDE)
        #[arg(short, long)]
        exec: Option<String>,

        /// Multiply every case timeout (overrides SU2_TIMEOUT_SCALE)
        #[arg(long, value_parser = parse_timeout_scale)]
        timeout_scale: Option<f64>,

        /// Write a JSON report of the run
        #[arg(long = "report")]
        report_path: Option<PathBuf>,

        /// Do not print the solver log of failing cases
        #[arg(long, default_value = "false")]
        quiet_logs: bool,
    },

    /// List the cases of a catalog
    List {
        /// JSON catalog to use instead of the built-in suite
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// Include cases marked as disabled
        #[arg(long, default_value = "false")]
        include_disabled: bool,
    },

    /// Write the built-in suite as a JSON catalog
    Export {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// A timeout scale must be a finite number above zero
fn parse_timeout_scale(s: &str) -> Result<f64, String> {
    let scale: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("`{}` is not a number", s))?;
    if !scale.is_finite() || scale <= 0.0 {
        return Err(format!("timeout scale must be a positive number, got {}", s));
    }
    Ok(scale)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_line_number(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            catalog,
            root,
            filter,
            include_disabled,
            exec,
            timeout_scale,
            report_path,
            quiet_logs,
        } => {
            let manager = CatalogManager::load_or_builtin(catalog.as_deref()).map_err(|e| {
                error!("Failed to load test catalog: {:#}", e);
                e
            })?;

            let mut harness = HarnessConfig::from_env();
            if let Some(root) = root {
                harness.testcases_root = root;
            }
            if let Some(exec) = exec {
                harness.exec_override = Some(exec);
            }
            if let Some(scale) = timeout_scale {
                harness.timeout_scale = scale;
            }
            harness.show_log = !quiet_logs;

            let cases = manager.select(&filter, include_disabled);
            info!(
                selected = cases.len(),
                catalog = manager.cases().len(),
                "Selected test cases"
            );
            if cases.is_empty() {
                info!(filters = ?filter, "No test cases selected");
            }

            let engine = SolverEngine::new(harness);
            let suite = executor::run_suite(&engine, &cases).await;

            report::print_summary(&suite);
            if let Some(path) = report_path {
                report::write_json(&suite, &path)?;
                info!(report = %path.display(), "Report written");
            }

            std::process::exit(report::exit_code(&suite));
        }
        Commands::List {
            catalog,
            include_disabled,
        } => {
            let manager = CatalogManager::load_or_builtin(catalog.as_deref())?;
            for case in manager.select(&[], include_disabled) {
                let kind = match &case.check {
                    Check::Values { test_vals, .. } => format!("{} values", test_vals.len()),
                    Check::FileDiff { test_file, .. } => format!("diff {}", test_file),
                };
                let flag = if case.disabled { " (disabled)" } else { "" };
                println!(
                    "{:<36} {:<46} iter={:<5} {}{}",
                    case.tag,
                    format!("{}/{}", case.cfg_dir, case.cfg_file),
                    case.test_iter,
                    kind,
                    flag
                );
            }
        }
        Commands::Export { output } => {
            CatalogManager::builtin().save(&output)?;
            println!("Wrote built-in catalog to {}", output.display());
        }
    }

    Ok(())
}
