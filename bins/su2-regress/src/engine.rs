/// Execution Engine - Runs the External Solver
///
/// **Core Responsibility:**
/// Launch `su2_exec` on a case's configuration and capture its raw log.
///
/// **Critical Architectural Boundary:**
/// - Engine knows HOW to run the solver (shell, working directory, timeout)
/// - Engine does NOT parse convergence output
/// - Engine does NOT decide pass/fail
/// - Engine returns raw output for the Evaluator to judge
///
/// **Run sequence:**
/// 1. Write `<cfg_file>.autotest` with the iteration count forced to `test_iter + 1`
/// 2. `sh -c "<su2_exec> <cfg_file>.autotest > <log> 2>&1"` inside the case directory
/// 3. Kill the whole process group once the timeout expires
/// 4. Read back whatever the log holds, partial or not

use crate::evaluator::SolverRunOutput;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use su2_regress_common::config::HarnessConfig;
use su2_regress_common::types::{Check, TestCase};
use tokio::process::Command;
use tracing::{debug, info, warn};

pub const AUTOTEST_SUFFIX: &str = "autotest";
pub const FILE_DIFF_LOG: &str = "outputfile";

/// Everything the executor needs to know about one finished run
#[derive(Debug, Clone)]
pub struct SolverRun {
    pub output: SolverRunOutput,
    pub command: String,
    pub case_dir: PathBuf,
    pub log_path: PathBuf,
}

/// Rewrite the iteration setting of a config file
///
/// Every line that assigns `iter_key` is replaced by `<iter_key>= <iterations>`;
/// all other lines are kept verbatim. Two `%` comment lines are prepended.
pub fn rewrite_iterations(content: &str, iter_key: &str, iterations: u32) -> String {
    let mut out = String::with_capacity(content.len() + 128);
    out.push_str("% This file automatically generated by the regression script\n");
    out.push_str(&format!("% Number of iterations changed to {}\n", iterations));

    for line in content.lines() {
        let assigns_key = line
            .strip_prefix(iter_key)
            .map(|rest| rest.trim_start().starts_with('='))
            .unwrap_or(false);
        if assigns_key {
            out.push_str(&format!("{}= {}\n", iter_key, iterations));
        } else {
            out.push_str(line);
            out.push('\n');
        }
    }

    out
}

/// Log file name for a case: `<cfg stem>.log`, or `outputfile` for file-diff cases
pub fn log_file_name(case: &TestCase) -> String {
    if case.is_file_diff() {
        return FILE_DIFF_LOG.to_string();
    }
    let stem = Path::new(&case.cfg_file)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| case.cfg_file.clone());
    format!("{}.log", stem)
}

/// File name of the rewritten config for a case
pub fn autotest_file_name(case: &TestCase) -> String {
    format!("{}.{}", case.cfg_file, AUTOTEST_SUFFIX)
}

/// Iteration count written into the autotest config
pub fn iteration_count(case: &TestCase) -> Result<u32> {
    match case.test_iter.checked_add(1) {
        Some(iterations) => Ok(iterations),
        None => bail!("test_iter {} is out of range", case.test_iter),
    }
}

/// Files a run produces; removed before launch so old output is never judged
pub fn output_files(case: &TestCase) -> Vec<String> {
    let mut files = vec![log_file_name(case)];
    if let Check::FileDiff { test_file, .. } = &case.check {
        files.push(test_file.clone());
    }
    files
}

/// Quote a single word for `sh`
fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./+=:,@%".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Shell command line used to launch the solver
pub fn build_command(su2_exec: &str, cfg_file: &str, log_file: &str) -> String {
    format!(
        "{} {} > {} 2>&1",
        su2_exec.trim(),
        shell_quote(cfg_file),
        shell_quote(log_file)
    )
}

/// Kill the child's whole process group (mpirun and its ranks included)
#[cfg(unix)]
fn kill_process_group(child: &mut tokio::process::Child) {
    if let Some(pid) = child.id() {
        // SAFETY: killpg only sends a signal; the group was created by process_group(0).
        let rc = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
        if rc == 0 {
            return;
        }
        warn!(pid, "killpg failed, falling back to killing the shell only");
    }
    if let Err(e) = child.start_kill() {
        warn!(error = %e, "Failed to kill timed-out solver");
    }
}

#[cfg(not(unix))]
fn kill_process_group(child: &mut tokio::process::Child) {
    if let Err(e) = child.start_kill() {
        warn!(error = %e, "Failed to kill timed-out solver");
    }
}

/// Subprocess-based engine for the SU2 solver
pub struct SolverEngine {
    config: HarnessConfig,
}

impl SolverEngine {
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn case_dir(&self, case: &TestCase) -> PathBuf {
        self.config.testcases_root.join(&case.cfg_dir)
    }

    /// Shell command line a case runs with
    pub fn command_for(&self, case: &TestCase) -> String {
        build_command(
            self.config.effective_exec(&case.su2_exec),
            &autotest_file_name(case),
            &log_file_name(case),
        )
    }

    /// Write the `.autotest` config next to the original and return its file name
    pub async fn prepare_config(&self, case: &TestCase) -> Result<String> {
        let case_dir = self.case_dir(case);
        if !case_dir.is_dir() {
            bail!("Case directory not found: {}", case_dir.display());
        }

        let source = case_dir.join(&case.cfg_file);
        let content = tokio::fs::read_to_string(&source)
            .await
            .with_context(|| format!("Failed to read config {}", source.display()))?;

        let iterations = iteration_count(case)?;
        let autotest_name = autotest_file_name(case);
        let rewritten = rewrite_iterations(&content, &case.iter_key, iterations);
        tokio::fs::write(case_dir.join(&autotest_name), rewritten)
            .await
            .with_context(|| format!("Failed to write {}", autotest_name))?;

        debug!(
            tag = %case.tag,
            config = %autotest_name,
            iterations,
            "Prepared autotest config"
        );
        Ok(autotest_name)
    }

    /// Run the solver for one case with a hard timeout
    ///
    /// **Guarantees:**
    /// - The solver runs in its own process group, killed as a whole on timeout
    /// - Partial logs are returned after a timeout
    /// - A missing log reads as empty output
    #[tracing::instrument(skip(self, case), fields(tag = %case.tag))]
    pub async fn run(&self, case: &TestCase) -> Result<SolverRun> {
        self.prepare_config(case).await?;
        let case_dir = self.case_dir(case);
        let log_path = case_dir.join(log_file_name(case));

        for name in output_files(case) {
            let path = case_dir.join(&name);
            if path.exists() {
                tokio::fs::remove_file(&path)
                    .await
                    .with_context(|| format!("Failed to remove stale output {}", path.display()))?;
                debug!(file = %path.display(), "Removed stale output");
            }
        }

        let command = self.command_for(case);
        let timeout_secs = self.config.effective_timeout_secs(case.timeout_secs);

        info!(
            dir = %case_dir.display(),
            command = %command,
            timeout_secs,
            "Launching solver"
        );

        let mut std_cmd = std::process::Command::new("sh");
        std_cmd
            .arg("-c")
            .arg(&command)
            .current_dir(&case_dir)
            .stdin(Stdio::null());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            std_cmd.process_group(0);
        }
        let mut cmd = Command::from(std_cmd);
        cmd.kill_on_drop(true);

        let start = Instant::now();
        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn `{}`", command))?;

        let mut timed_out = false;
        let waited = tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait()).await;
        let exit_code = match waited {
            Ok(status) => {
                let status = status.context("Failed to wait for solver")?;
                debug!(exit_code = ?status.code(), "Solver exited");
                status.code()
            }
            Err(_) => {
                timed_out = true;
                warn!(timeout_secs, "Solver timed out - killing process group");
                kill_process_group(&mut child);
                // Reap so the shell does not linger as a zombie.
                let _ = child.wait().await;
                None
            }
        };
        let elapsed_secs = start.elapsed().as_secs_f64();

        let log = match tokio::fs::read(&log_path).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                warn!(log = %log_path.display(), error = %e, "Solver log not readable");
                String::new()
            }
        };

        info!(
            elapsed_ms = (elapsed_secs * 1000.0) as u64,
            exit_code = ?exit_code,
            timed_out,
            log_bytes = log.len(),
            "Solver finished"
        );

        Ok(SolverRun {
            output: SolverRunOutput {
                log,
                exit_code,
                elapsed_secs,
                timed_out,
            },
            command,
            case_dir,
            log_path,
        })
    }
}
