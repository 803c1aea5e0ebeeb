/// End-to-end tests for the engine + executor path
///
/// These tests spawn real `sh` children against scratch case directories.
/// `cat` stands in for the solver: it echoes the rewritten config into the
/// log, so convergence lines are planted directly in the config file.

#[cfg(all(test, unix))]
mod solver_run_tests {
    use crate::engine::SolverEngine;
    use crate::executor::{run_case, run_suite};
    use std::fs;
    use std::path::Path;
    use su2_regress_common::config::HarnessConfig;
    use su2_regress_common::types::{TestCase, TestStatus};
    use tempfile::TempDir;

    const CONVERGED_CFG: &str = "\
MATH_PROBLEM= DISCRETE_ADJOINT
EXT_ITER= 99999
------------------------------ Begin Solver -----------------------------
    9   -5.394766  -5.572142  -0.000364  -8.708681
";

    fn engine_for(root: &Path) -> SolverEngine {
        SolverEngine::new(HarnessConfig {
            testcases_root: root.to_path_buf(),
            exec_override: None,
            timeout_scale: 1.0,
            show_log: false,
        })
    }

    fn write_case(root: &Path, dir: &str, file: &str, content: &str) {
        let case_dir = root.join(dir);
        fs::create_dir_all(&case_dir).unwrap();
        fs::write(case_dir.join(file), content).unwrap();
    }

    fn fea_case() -> TestCase {
        TestCase::values(
            "discadj_fea",
            "disc_adj_fea",
            "configAD_fem.cfg",
            9,
            &[-5.394766, -5.572142, -0.000364, -8.708681],
        )
        .with_exec("cat")
        .with_timeout(30)
    }

    #[tokio::test]
    async fn test_passing_case_writes_autotest_and_log() {
        let root = TempDir::new().unwrap();
        write_case(root.path(), "disc_adj_fea", "configAD_fem.cfg", CONVERGED_CFG);

        let result = run_case(&engine_for(root.path()), &fea_case()).await;

        assert_eq!(result.status, TestStatus::Passed, "error: {:?}", result.error);
        assert_eq!(result.sim_vals.len(), 4);
        assert_eq!(result.command, "cat configAD_fem.cfg.autotest > configAD_fem.log 2>&1");

        let autotest = fs::read_to_string(root.path().join("disc_adj_fea/configAD_fem.cfg.autotest")).unwrap();
        assert!(autotest.contains("EXT_ITER= 10\n"));
        assert!(root.path().join("disc_adj_fea/configAD_fem.log").exists());
        // Original config untouched.
        let original = fs::read_to_string(root.path().join("disc_adj_fea/configAD_fem.cfg")).unwrap();
        assert_eq!(original, CONVERGED_CFG);
    }

    #[tokio::test]
    async fn test_tolerance_failure() {
        let root = TempDir::new().unwrap();
        write_case(
            root.path(),
            "disc_adj_fea",
            "configAD_fem.cfg",
            &CONVERGED_CFG.replace("-8.708681", "-8.708781"),
        );

        let result = run_case(&engine_for(root.path()), &fea_case()).await;

        assert_eq!(result.status, TestStatus::ToleranceExceeded);
        assert!(result.delta_vals[3] > 0.00001);
    }

    #[tokio::test]
    async fn test_missing_executable_reads_as_not_started() {
        let root = TempDir::new().unwrap();
        write_case(root.path(), "disc_adj_fea", "configAD_fem.cfg", CONVERGED_CFG);
        let case = fea_case().with_exec("definitely-not-an-su2-binary");

        let result = run_case(&engine_for(root.path()), &case).await;

        assert_eq!(result.status, TestStatus::SolverNotStarted);
    }

    #[tokio::test]
    async fn test_timeout_kills_solver() {
        let root = TempDir::new().unwrap();
        write_case(root.path(), "disc_adj_fea", "configAD_fem.cfg", CONVERGED_CFG);
        let case = fea_case().with_exec("sleep 30 && cat").with_timeout(1);

        let start = std::time::Instant::now();
        let result = run_case(&engine_for(root.path()), &case).await;

        assert_eq!(result.status, TestStatus::TimedOut);
        assert!(start.elapsed().as_secs() < 20, "timeout was not enforced");
    }

    #[tokio::test]
    async fn test_missing_case_dir_is_launch_failure() {
        let root = TempDir::new().unwrap();

        let result = run_case(&engine_for(root.path()), &fea_case()).await;

        assert_eq!(result.status, TestStatus::LaunchFailed);
        assert_eq!(result.command, "cat configAD_fem.cfg.autotest > configAD_fem.log 2>&1");
        assert!(result.error.unwrap().contains("Case directory not found"));
    }

    #[tokio::test]
    async fn test_iteration_overflow_is_launch_failure() {
        let root = TempDir::new().unwrap();
        write_case(root.path(), "disc_adj_fea", "configAD_fem.cfg", CONVERGED_CFG);
        let mut case = fea_case();
        case.test_iter = u32::MAX;

        let result = run_case(&engine_for(root.path()), &case).await;

        assert_eq!(result.status, TestStatus::LaunchFailed);
        assert!(result.error.unwrap().contains("out of range"));
        assert!(!root.path().join("disc_adj_fea/configAD_fem.cfg.autotest").exists());
    }

    #[tokio::test]
    async fn test_stale_diff_output_is_not_judged() {
        let root = TempDir::new().unwrap();
        write_case(root.path(), "fea_topology", "config.cfg", "EXT_ITER= 5\n");
        write_case(root.path(), "fea_topology", "grad_ref_node.dat.ref", "0 1.5\n1 2.5\n");
        // Left over from an earlier run and identical to the reference.
        write_case(root.path(), "fea_topology", "grad_ref_node.dat", "0 1.5\n1 2.5\n");
        let case = TestCase::file_diff(
            "discadj_topol_optim",
            "fea_topology",
            "config.cfg",
            "grad_ref_node.dat.ref",
            "grad_ref_node.dat",
        )
        .with_exec("cat");

        let result = run_case(&engine_for(root.path()), &case).await;

        assert_eq!(result.status, TestStatus::FileMissing);
        assert!(!root.path().join("fea_topology/grad_ref_node.dat").exists());
        assert!(root.path().join("fea_topology/grad_ref_node.dat.ref").exists());
    }

    #[tokio::test]
    async fn test_file_diff_case() {
        let root = TempDir::new().unwrap();
        write_case(root.path(), "fea_topology", "config.cfg", "EXT_ITER= 5\n");
        write_case(root.path(), "fea_topology", "grad_ref_node.dat.ref", "0 1.5\n1 2.5\n");
        // The "solver" copies the reference into the gradient file it is judged on.
        let case = TestCase::file_diff(
            "discadj_topol_optim",
            "fea_topology",
            "config.cfg",
            "grad_ref_node.dat.ref",
            "grad_ref_node.dat",
        )
        .with_exec("cp grad_ref_node.dat.ref grad_ref_node.dat; cat");

        let result = run_case(&engine_for(root.path()), &case).await;
        assert_eq!(result.status, TestStatus::Passed, "diff: {:?}", result.diff);

        let broken = case.with_exec("echo '0 1.5' > grad_ref_node.dat; cat");
        let result = run_case(&engine_for(root.path()), &broken).await;
        assert_eq!(result.status, TestStatus::FileMismatch);
        assert!(result.diff.unwrap().contains("-    2: 1 2.5"));
    }

    #[tokio::test]
    async fn test_suite_keeps_order_and_counts() {
        let root = TempDir::new().unwrap();
        write_case(root.path(), "disc_adj_fea", "configAD_fem.cfg", CONVERGED_CFG);
        let mut failing = fea_case();
        failing.tag = "fea_wrong_iter".to_string();
        failing.test_iter = 42;

        let suite = run_suite(&engine_for(root.path()), &[fea_case(), failing]).await;

        let tags: Vec<_> = suite.results.iter().map(|r| r.tag.as_str()).collect();
        assert_eq!(tags, vec!["discadj_fea", "fea_wrong_iter"]);
        assert_eq!(suite.results[1].status, TestStatus::IterationMissing);
        assert_eq!(suite.passed_count(), 1);
        assert!(!suite.all_passed());
        assert!(suite.finished_at >= suite.started_at);
    }
}
