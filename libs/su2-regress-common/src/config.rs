// Harness settings shared by every case in a run
use std::path::PathBuf;

pub const TESTCASES_DIR_ENV: &str = "SU2_TESTCASES_DIR";
pub const EXEC_OVERRIDE_ENV: &str = "SU2_EXEC_OVERRIDE";
pub const TIMEOUT_SCALE_ENV: &str = "SU2_TIMEOUT_SCALE";

#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    /// Directory holding the case directories (`cfg_dir` is relative to it).
    pub testcases_root: PathBuf,
    /// Replaces every case's `su2_exec` when set.
    pub exec_override: Option<String>,
    pub timeout_scale: f64,
    /// Dump the solver log for failing cases.
    pub show_log: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            testcases_root: PathBuf::from("."),
            exec_override: None,
            timeout_scale: 1.0,
            show_log: true,
        }
    }
}

impl HarnessConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source; unparsable or non-positive
    /// scales fall back to 1.0.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(root) = lookup(TESTCASES_DIR_ENV).filter(|s| !s.is_empty()) {
            config.testcases_root = PathBuf::from(root);
        }
        config.exec_override = lookup(EXEC_OVERRIDE_ENV).filter(|s| !s.trim().is_empty());
        if let Some(scale) = lookup(TIMEOUT_SCALE_ENV)
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|s| s.is_finite() && *s > 0.0)
        {
            config.timeout_scale = scale;
        }
        config
    }

    pub fn effective_exec<'a>(&'a self, su2_exec: &'a str) -> &'a str {
        self.exec_override.as_deref().unwrap_or(su2_exec)
    }

    /// Scaled timeout in seconds, never below one second.
    pub fn effective_timeout_secs(&self, timeout_secs: u64) -> u64 {
        ((timeout_secs as f64) * self.timeout_scale).ceil().max(1.0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = HarnessConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, HarnessConfig::default());
        assert_eq!(config.effective_exec("SU2_CFD"), "SU2_CFD");
        assert_eq!(config.effective_timeout_secs(1600), 1600);
    }

    #[test]
    fn test_env_values_applied() {
        let config = HarnessConfig::from_lookup(lookup_from(&[
            (TESTCASES_DIR_ENV, "/opt/su2/TestCases"),
            (EXEC_OVERRIDE_ENV, "mpirun -n 2 SU2_CFD_AD"),
            (TIMEOUT_SCALE_ENV, "0.5"),
        ]));
        assert_eq!(config.testcases_root, PathBuf::from("/opt/su2/TestCases"));
        assert_eq!(config.effective_exec("parallel_computation.py -f"), "mpirun -n 2 SU2_CFD_AD");
        assert_eq!(config.effective_timeout_secs(1600), 800);
        assert_eq!(config.effective_timeout_secs(1), 1);
    }

    #[test]
    fn test_bad_scale_ignored() {
        for bad in ["abc", "-2", "0", "NaN"] {
            let config = HarnessConfig::from_lookup(lookup_from(&[(TIMEOUT_SCALE_ENV, bad)]));
            assert_eq!(config.timeout_scale, 1.0, "scale {bad:?} should be rejected");
        }
    }

    #[test]
    fn test_blank_override_ignored() {
        let config = HarnessConfig::from_lookup(lookup_from(&[(EXEC_OVERRIDE_ENV, "  ")]));
        assert!(config.exec_override.is_none());
    }
}
