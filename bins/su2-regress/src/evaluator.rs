/// Output Evaluator - Solver-Agnostic Judging Logic
///
/// **Core Responsibility:**
/// Turn a raw solver run (log text, timeout flag) into a `TestStatus`.
///
/// **Critical Properties:**
/// - Knows nothing about processes or the filesystem layout of a case
/// - Pure functions: (run output, expectations) → verdict
///
/// **Value check rules:**
/// - Nothing before the first `Begin Solver` line is considered
/// - Tokens are split on whitespace and `|`
/// - Iteration number is token 0 (token 1 for unsteady runs)
/// - The last N tokens of the first line at `test_iter` are compared
/// - `|sim - expected| > tol` fails; a NaN delta fails too
///
/// **File check rules:**
/// - Line-by-line equality, `\r\n` treated as `\n`

use su2_regress_common::types::TestStatus;

pub const SOLVER_START_MARKER: &str = "Begin Solver";

/// Lines of diff kept in a `FileMismatch` verdict.
const MAX_DIFF_LINES: usize = 50;

/// Raw output of one solver run
/// Produced by the engine, consumed by the evaluator
#[derive(Debug, Clone)]
pub struct SolverRunOutput {
    pub log: String,
    pub exit_code: Option<i32>,
    pub elapsed_secs: f64,
    pub timed_out: bool,
}

/// Verdict of a value check
#[derive(Debug, Clone, PartialEq)]
pub struct ValueVerdict {
    pub status: TestStatus,
    pub sim_vals: Vec<f64>,
    pub delta_vals: Vec<f64>,
    pub detail: Option<String>,
}

impl ValueVerdict {
    fn status(status: TestStatus, detail: impl Into<String>) -> Self {
        Self {
            status,
            sim_vals: Vec::new(),
            delta_vals: Vec::new(),
            detail: Some(detail.into()),
        }
    }
}

/// Verdict of a file comparison
#[derive(Debug, Clone, PartialEq)]
pub struct FileVerdict {
    pub status: TestStatus,
    pub diff: Option<String>,
}

fn tokenize(line: &str) -> Vec<&str> {
    line.split(|c: char| c.is_whitespace() || c == '|')
        .filter(|t| !t.is_empty())
        .collect()
}

/// Iteration number of a convergence line, if the line is one
///
/// Unsteady lines carry the time iteration in column 1, but column 0 must
/// still be an integer (the inner iteration).
fn iteration_of(tokens: &[&str], unsteady: bool) -> Option<i64> {
    let first = tokens.first()?.parse::<i64>().ok()?;
    if unsteady {
        tokens.get(1)?.parse::<i64>().ok()
    } else {
        Some(first)
    }
}

/// Find the convergence line for `test_iter` and return its tokens
///
/// ## Returns
/// * `Err(SolverNotStarted)` - no `Begin Solver` marker in the log
/// * `Ok(None)` - marker found, iteration not reached
/// * `Ok(Some(tokens))` - tokens of the first matching line
fn find_iteration_line(
    log: &str,
    test_iter: u32,
    unsteady: bool,
) -> Result<Option<Vec<&str>>, TestStatus> {
    let mut lines = log.lines();
    if !lines.by_ref().any(|line| line.contains(SOLVER_START_MARKER)) {
        return Err(TestStatus::SolverNotStarted);
    }

    for line in lines {
        let tokens = tokenize(line);
        if iteration_of(&tokens, unsteady) == Some(i64::from(test_iter)) {
            return Ok(Some(tokens));
        }
    }

    Ok(None)
}

/// Compare computed values to stored ones
///
/// Returns the deltas and whether every delta is within `tol`.
pub fn compare_values(sim_vals: &[f64], test_vals: &[f64], tol: f64) -> (Vec<f64>, bool) {
    let delta_vals: Vec<f64> = sim_vals
        .iter()
        .zip(test_vals)
        .map(|(sim, expected)| (sim - expected).abs())
        .collect();
    let within = delta_vals.iter().all(|d| !d.is_nan() && *d <= tol);
    (delta_vals, within)
}

/// Evaluate a value-checked run
///
/// This function determines the TestStatus based on:
/// 1. Timeout (highest priority)
/// 2. Presence of the solver start marker
/// 3. Presence of the requested iteration
/// 4. Column count and parseability
/// 5. Tolerance comparison
pub fn evaluate_values(
    output: &SolverRunOutput,
    test_iter: u32,
    unsteady: bool,
    test_vals: &[f64],
    tol: f64,
) -> ValueVerdict {
    if output.timed_out {
        return ValueVerdict::status(TestStatus::TimedOut, "execution timed out");
    }

    let tokens = match find_iteration_line(&output.log, test_iter, unsteady) {
        Err(status) => {
            return ValueVerdict::status(
                status,
                format!("the solver never reached the \"{}\" section", SOLVER_START_MARKER),
            );
        }
        Ok(None) => {
            return ValueVerdict::status(
                TestStatus::IterationMissing,
                format!("iteration {} could not be found", test_iter),
            );
        }
        Ok(Some(tokens)) => tokens,
    };

    let n = test_vals.len();
    if tokens.len() < n {
        return ValueVerdict::status(
            TestStatus::ColumnMismatch,
            format!(
                "expected {} columns at iteration {}, found {}",
                n,
                test_iter,
                tokens.len()
            ),
        );
    }

    let mut sim_vals = Vec::with_capacity(n);
    for token in &tokens[tokens.len() - n..] {
        match token.parse::<f64>() {
            Ok(value) => sim_vals.push(value),
            Err(_) => {
                return ValueVerdict::status(
                    TestStatus::MalformedValue,
                    format!("could not parse \"{}\" as a number", token),
                );
            }
        }
    }

    let (delta_vals, within) = compare_values(&sim_vals, test_vals, tol);
    let (status, detail) = if within {
        (TestStatus::Passed, None)
    } else {
        (
            TestStatus::ToleranceExceeded,
            Some(format!(
                "difference between computed and stored values exceeded tolerance {}",
                tol
            )),
        )
    };

    ValueVerdict {
        status,
        sim_vals,
        delta_vals,
        detail,
    }
}

fn normalize_lines(content: &str) -> Vec<&str> {
    content.lines().map(|l| l.trim_end_matches('\r')).collect()
}

/// Render a compact `-`/`+` diff of two line lists
///
/// Lines are compared by position; output stops after `MAX_DIFF_LINES`.
pub fn line_diff(
    reference_name: &str,
    reference: &str,
    test_name: &str,
    test: &str,
) -> Option<String> {
    let from = normalize_lines(reference);
    let to = normalize_lines(test);
    if from == to {
        return None;
    }

    let mut out = vec![format!("--- {}", reference_name), format!("+++ {}", test_name)];
    let mut truncated = false;
    for i in 0..from.len().max(to.len()) {
        let (a, b) = (from.get(i), to.get(i));
        if a == b {
            continue;
        }
        if out.len() >= MAX_DIFF_LINES {
            truncated = true;
            break;
        }
        if let Some(a) = a {
            out.push(format!("-{:>5}: {}", i + 1, a));
        }
        if let Some(b) = b {
            out.push(format!("+{:>5}: {}", i + 1, b));
        }
    }
    if truncated {
        out.push("... (diff truncated)".to_string());
    }

    Some(out.join("\n"))
}

/// Evaluate a file-diff run
///
/// `reference` and `test` are `None` when the file could not be read.
pub fn evaluate_file_diff(
    output: &SolverRunOutput,
    reference_name: &str,
    reference: Option<&str>,
    test_name: &str,
    test: Option<&str>,
) -> FileVerdict {
    if output.timed_out {
        return FileVerdict {
            status: TestStatus::TimedOut,
            diff: None,
        };
    }

    match (reference, test) {
        (Some(reference), Some(test)) => match line_diff(reference_name, reference, test_name, test)
        {
            None => FileVerdict {
                status: TestStatus::Passed,
                diff: None,
            },
            Some(diff) => FileVerdict {
                status: TestStatus::FileMismatch,
                diff: Some(diff),
            },
        },
        (None, _) => FileVerdict {
            status: TestStatus::FileMissing,
            diff: Some(format!("ERROR: could not open {}", reference_name)),
        },
        (_, None) => FileVerdict {
            status: TestStatus::FileMissing,
            diff: Some(format!("ERROR: could not open {}", test_name)),
        },
    }
}
