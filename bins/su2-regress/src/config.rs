// Test catalog management for the regression driver
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use su2_regress_common::catalog::discrete_adjoint_suite;
use su2_regress_common::types::{Check, TestCase};

#[derive(Debug, Serialize, Deserialize)]
struct CatalogJson {
    test_cases: Vec<TestCase>,
}

/// Ordered set of test cases, either built in or loaded from JSON
#[derive(Debug, Clone)]
pub struct CatalogManager {
    cases: Vec<TestCase>,
}

impl CatalogManager {
    /// Built-in discrete-adjoint suite
    pub fn builtin() -> Self {
        Self {
            cases: discrete_adjoint_suite(),
        }
    }

    pub fn from_cases(cases: Vec<TestCase>) -> Result<Self> {
        let mut seen = HashSet::new();
        for case in &cases {
            if case.tag.trim().is_empty() {
                bail!("Test case with empty tag in catalog");
            }
            if !seen.insert(case.tag.as_str()) {
                bail!("Duplicate test case tag: {}", case.tag);
            }
            if let Check::Values { test_vals, tol } = &case.check {
                if test_vals.is_empty() {
                    bail!("Test case {} has no test_vals", case.tag);
                }
                if !tol.is_finite() || *tol < 0.0 {
                    bail!("Test case {} has invalid tolerance {}", case.tag, tol);
                }
            }
        }
        Ok(Self { cases })
    }

    /// Load a catalog file of the form `{ "test_cases": [...] }`
    pub fn load(catalog_path: &Path) -> Result<Self> {
        if !catalog_path.exists() {
            bail!("Catalog file not found: {}", catalog_path.display());
        }

        let content = fs::read_to_string(catalog_path)
            .with_context(|| format!("Failed to read {}", catalog_path.display()))?;

        let catalog: CatalogJson = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", catalog_path.display()))?;

        Self::from_cases(catalog.test_cases)
    }

    /// Load from `path` when given, otherwise use the built-in suite
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin()),
        }
    }

    /// Write the catalog as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let catalog = CatalogJson {
            test_cases: self.cases.clone(),
        };
        let json = serde_json::to_string_pretty(&catalog).context("Failed to serialize catalog")?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    /// Cases to run, in declaration order
    ///
    /// A case is kept when its tag contains any of `filters` (all cases when
    /// `filters` is empty). Disabled cases need `include_disabled`.
    pub fn select(&self, filters: &[String], include_disabled: bool) -> Vec<TestCase> {
        self.cases
            .iter()
            .filter(|case| include_disabled || !case.disabled)
            .filter(|case| filters.is_empty() || filters.iter().any(|f| case.tag.contains(f.as_str())))
            .cloned()
            .collect()
    }
}
