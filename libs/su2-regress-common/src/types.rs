use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const DEFAULT_SU2_EXEC: &str = "parallel_computation.py -f";
pub const DEFAULT_TIMEOUT_SECS: u64 = 1600;
pub const DEFAULT_TOLERANCE: f64 = 0.00001;
pub const DEFAULT_ITER_KEY: &str = "EXT_ITER";

fn default_iter_key() -> String {
    DEFAULT_ITER_KEY.to_string()
}

/// A single solver run and the check applied to its output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub tag: String,
    pub cfg_dir: String,
    pub cfg_file: String,
    pub test_iter: u32,
    pub su2_exec: String,
    pub timeout_secs: u64,
    #[serde(default)]
    pub unsteady: bool,
    #[serde(default = "default_iter_key")]
    pub iter_key: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(flatten)]
    pub check: Check,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Check {
    /// Compare the trailing columns of the convergence line at `test_iter`.
    Values { test_vals: Vec<f64>, tol: f64 },
    /// Compare a file written by the solver against a stored reference.
    FileDiff {
        reference_file: String,
        test_file: String,
    },
}

impl TestCase {
    /// Value-checked case with the suite defaults for executable, timeout and tolerance.
    pub fn values(
        tag: &str,
        cfg_dir: &str,
        cfg_file: &str,
        test_iter: u32,
        test_vals: &[f64],
    ) -> Self {
        Self {
            tag: tag.to_string(),
            cfg_dir: cfg_dir.to_string(),
            cfg_file: cfg_file.to_string(),
            test_iter,
            su2_exec: DEFAULT_SU2_EXEC.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            unsteady: false,
            iter_key: default_iter_key(),
            disabled: false,
            check: Check::Values {
                test_vals: test_vals.to_vec(),
                tol: DEFAULT_TOLERANCE,
            },
        }
    }

    pub fn file_diff(
        tag: &str,
        cfg_dir: &str,
        cfg_file: &str,
        reference_file: &str,
        test_file: &str,
    ) -> Self {
        Self {
            tag: tag.to_string(),
            cfg_dir: cfg_dir.to_string(),
            cfg_file: cfg_file.to_string(),
            test_iter: 0,
            su2_exec: "parallel_computation.py".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            unsteady: false,
            iter_key: default_iter_key(),
            disabled: false,
            check: Check::FileDiff {
                reference_file: reference_file.to_string(),
                test_file: test_file.to_string(),
            },
        }
    }

    pub fn unsteady(mut self) -> Self {
        self.unsteady = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_exec(mut self, su2_exec: &str) -> Self {
        self.su2_exec = su2_exec.to_string();
        self
    }

    pub fn is_file_diff(&self) -> bool {
        matches!(self.check, Check::FileDiff { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestStatus {
    Passed,
    ToleranceExceeded,
    IterationMissing,
    SolverNotStarted,
    ColumnMismatch,
    MalformedValue,
    FileMismatch,
    FileMissing,
    TimedOut,
    LaunchFailed,
}

impl TestStatus {
    pub fn is_passed(self) -> bool {
        self == TestStatus::Passed
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TestStatus::Passed => "passed",
            TestStatus::ToleranceExceeded => "tolerance exceeded",
            TestStatus::IterationMissing => "iteration missing",
            TestStatus::SolverNotStarted => "solver not started",
            TestStatus::ColumnMismatch => "column mismatch",
            TestStatus::MalformedValue => "malformed value",
            TestStatus::FileMismatch => "file mismatch",
            TestStatus::FileMissing => "file missing",
            TestStatus::TimedOut => "timed out",
            TestStatus::LaunchFailed => "launch failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub tag: String,
    pub status: TestStatus,
    pub test_vals: Vec<f64>,
    pub sim_vals: Vec<f64>,
    pub delta_vals: Vec<f64>,
    pub tol: Option<f64>,
    pub command: String,
    pub duration_secs: f64,
    pub exit_code: Option<i32>,
    pub log_file: Option<String>,
    pub diff: Option<String>,
    pub error: Option<String>,
}

impl TestResult {
    pub fn passed(&self) -> bool {
        self.status.is_passed()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<TestResult>,
}

impl SuiteResult {
    /// An empty run counts as a pass.
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(TestResult::passed)
    }

    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.passed_count()
    }
}
