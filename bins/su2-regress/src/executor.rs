/// Case Executor - High-Level Orchestration
///
/// **Responsibility:**
/// Coordinate the solver engine and the evaluator to produce test results.
///
/// **Architecture:**
/// 1. Use SolverEngine to run SU2 on the case (engine.rs)
/// 2. Use the evaluator to judge the log or the written files (evaluator.rs)
/// 3. Return one TestResult per case, a SuiteResult per run
///
/// This module is the glue layer - it knows nothing about:
/// - How the solver is launched (engine's job)
/// - How convergence output is parsed (evaluator's job)

use crate::engine::{SolverEngine, SolverRun};
use crate::evaluator::{self, SolverRunOutput};
use chrono::Utc;
use su2_regress_common::types::{Check, SuiteResult, TestCase, TestResult, TestStatus};
use tracing::{error, info, warn};
use uuid::Uuid;

fn format_vals(vals: &[f64]) -> String {
    vals.iter().map(|v| format!("{:.6}, ", v)).collect()
}

fn launch_failure(case: &TestCase, command: String, error: &anyhow::Error) -> TestResult {
    let test_vals = match &case.check {
        Check::Values { test_vals, .. } => test_vals.clone(),
        Check::FileDiff { .. } => Vec::new(),
    };
    TestResult {
        tag: case.tag.clone(),
        status: TestStatus::LaunchFailed,
        test_vals,
        sim_vals: Vec::new(),
        delta_vals: Vec::new(),
        tol: None,
        command,
        duration_secs: 0.0,
        exit_code: None,
        log_file: None,
        diff: None,
        error: Some(format!("{:#}", error)),
    }
}

async fn read_optional(path: &std::path::Path) -> Option<String> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            warn!(file = %path.display(), error = %e, "Could not read comparison file");
            None
        }
    }
}

/// Judge a finished run against the case's check
async fn judge(case: &TestCase, run: &SolverRun) -> TestResult {
    let output: &SolverRunOutput = &run.output;
    let mut result = TestResult {
        tag: case.tag.clone(),
        status: TestStatus::Passed,
        test_vals: Vec::new(),
        sim_vals: Vec::new(),
        delta_vals: Vec::new(),
        tol: None,
        command: run.command.clone(),
        duration_secs: output.elapsed_secs,
        exit_code: output.exit_code,
        log_file: Some(run.log_path.display().to_string()),
        diff: None,
        error: None,
    };

    match &case.check {
        Check::Values { test_vals, tol } => {
            let verdict =
                evaluator::evaluate_values(output, case.test_iter, case.unsteady, test_vals, *tol);
            result.status = verdict.status;
            result.test_vals = test_vals.clone();
            result.sim_vals = verdict.sim_vals;
            result.delta_vals = verdict.delta_vals;
            result.tol = Some(*tol);
            result.error = verdict.detail;
        }
        Check::FileDiff {
            reference_file,
            test_file,
        } => {
            let reference = read_optional(&run.case_dir.join(reference_file)).await;
            let test = read_optional(&run.case_dir.join(test_file)).await;
            let verdict = evaluator::evaluate_file_diff(
                output,
                reference_file,
                reference.as_deref(),
                test_file,
                test.as_deref(),
            );
            result.status = verdict.status;
            result.diff = verdict.diff;
        }
    }

    if output.timed_out {
        result.error = Some(format!(
            "execution timed out after {:.0}s",
            output.elapsed_secs
        ));
    }

    result
}

fn print_case_report(case: &TestCase, result: &TestResult, log: Option<&str>, show_log: bool) {
    if result.passed() {
        println!("{}: PASSED", case.tag);
    } else {
        println!("{}: FAILED", case.tag);
        if show_log {
            if let Some(log) = log {
                println!("Output for the failed case");
                println!("{}", log);
            }
        }
    }

    println!("execution command: {}", result.command);

    if !result.passed() {
        if let Some(err) = &result.error {
            println!("ERROR: {}", err);
        }
        if let Some(diff) = &result.diff {
            println!("{}", diff);
        }
    }

    if let Check::Values { .. } = case.check {
        println!("test_iter={}", case.test_iter);
        println!();
        println!("test_vals (stored): {}", format_vals(&result.test_vals));
        println!("sim_vals (computed): {}", format_vals(&result.sim_vals));
        println!("delta_vals: {}", format_vals(&result.delta_vals));
    }

    println!("test duration: {:.2} min", result.duration_secs / 60.0);
}

/// Run a single case end to end
///
/// Infrastructure failures (missing directory, unreadable config, spawn
/// error) become a `LaunchFailed` result instead of aborting the suite.
pub async fn run_case(engine: &SolverEngine, case: &TestCase) -> TestResult {
    println!("==================== Start Test: {} ====================", case.tag);

    let (result, log) = match engine.run(case).await {
        Ok(run) => {
            let result = judge(case, &run).await;
            (result, Some(run.output.log))
        }
        Err(e) => {
            error!(tag = %case.tag, error = %e, "Solver launch failed");
            (launch_failure(case, engine.command_for(case), &e), None)
        }
    };

    print_case_report(case, &result, log.as_deref(), engine.config().show_log);
    println!("==================== End Test: {} ====================", case.tag);
    println!();

    if result.passed() {
        info!(tag = %case.tag, duration_secs = result.duration_secs, "Test passed");
    } else {
        warn!(tag = %case.tag, status = %result.status, "Test failed");
    }

    result
}

/// Run every case in order and collect the results
pub async fn run_suite(engine: &SolverEngine, cases: &[TestCase]) -> SuiteResult {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();

    info!(
        run_id = %run_id,
        cases = cases.len(),
        root = %engine.config().testcases_root.display(),
        "Starting regression run"
    );

    let mut results = Vec::with_capacity(cases.len());
    for case in cases {
        results.push(run_case(engine, case).await);
    }

    let suite = SuiteResult {
        run_id,
        started_at,
        finished_at: Utc::now(),
        results,
    };

    info!(
        run_id = %run_id,
        passed = suite.passed_count(),
        failed = suite.failed_count(),
        "Regression run complete"
    );

    suite
}
