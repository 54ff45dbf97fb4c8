//! Solver configuration: the built-in AmgX options, where the backend reads
//! its configuration from, and the framework-side solver controls.

use crate::error::{LsolverError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::str::FromStr;

/// Where a session's backend configuration comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Configuration string parsed by the backend.
    Inline(String),
    /// Path handed unparsed to the backend.
    File(PathBuf),
}

/// AmgX solver options rendered into a `config_version=2` string.
///
/// The defaults target elliptic (pressure-like) equations: AMG with an L1
/// Jacobi smoother, convergence relative to the initial residual.
#[derive(Debug, Clone, PartialEq)]
pub struct AmgxOptions {
    pub solver: String,
    pub preconditioner: String,
    pub convergence: String,
    pub max_iters: usize,
    pub tolerance: f64,
    pub norm: String,
    pub print_solve_stats: bool,
    pub preconditioner_max_iters: usize,
    /// Keep per-iteration residuals so they can be queried after a solve.
    pub store_res_history: bool,
}

impl Default for AmgxOptions {
    fn default() -> Self {
        Self {
            solver: "AMG".to_string(),
            preconditioner: "JACOBI_L1".to_string(),
            convergence: "RELATIVE_INI_CORE".to_string(),
            max_iters: 100,
            tolerance: 1e-6,
            norm: "L2".to_string(),
            print_solve_stats: true,
            preconditioner_max_iters: 2,
            store_res_history: false,
        }
    }
}

impl AmgxOptions {
    pub fn to_config_string(&self) -> String {
        let mut entries = vec![
            "config_version=2".to_string(),
            format!("solver(s)={}", self.solver),
            format!("s:preconditioner(p)={}", self.preconditioner),
            format!("s:convergence={}", self.convergence),
            format!("s:max_iters={}", self.max_iters),
            format!("s:tolerance={:e}", self.tolerance),
            format!("s:norm={}", self.norm),
            format!("s:print_solve_stats={}", u8::from(self.print_solve_stats)),
        ];
        if self.store_res_history {
            entries.push("s:store_res_history=1".to_string());
        }
        entries.push(format!("p:max_iters={}", self.preconditioner_max_iters));
        entries.join(", ")
    }
}

/// How residuals are reported back to the framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResidualMode {
    /// Two fixed values around the tolerance, chosen from the solve status.
    #[default]
    Placeholder,
    /// Residual norms read from the backend's history, falling back to the
    /// placeholder when the backend has none.
    Backend,
}

impl FromStr for ResidualMode {
    type Err = LsolverError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "placeholder" => Ok(ResidualMode::Placeholder),
            "backend" => Ok(ResidualMode::Backend),
            other => Err(LsolverError::InvalidControl {
                key: "residuals",
                value: other.to_string(),
            }),
        }
    }
}

/// Key/value lookup standing in for the framework's solver dictionary.
pub trait Dictionary {
    fn lookup(&self, key: &str) -> Option<String>;
}

impl Dictionary for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl Dictionary for BTreeMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl Dictionary for serde_json::Map<String, serde_json::Value> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).map(|value| match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// Solver entries of a field's solver dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SolverControls {
    /// External AmgX configuration file; the built-in options when absent.
    pub config_file: Option<PathBuf>,
    pub tolerance: f64,
    pub residuals: ResidualMode,
}

impl Default for SolverControls {
    fn default() -> Self {
        Self {
            config_file: None,
            tolerance: 1e-6,
            residuals: ResidualMode::Placeholder,
        }
    }
}

impl SolverControls {
    /// Reads `configFile`, `tolerance` and `residuals`, keeping defaults for
    /// missing keys. An empty `configFile` counts as missing.
    pub fn from_dictionary<D: Dictionary + ?Sized>(dict: &D) -> Result<Self> {
        let mut controls = Self::default();
        if let Some(path) = dict.lookup("configFile").filter(|p| !p.is_empty()) {
            controls.config_file = Some(PathBuf::from(path));
        }
        if let Some(value) = dict.lookup("tolerance") {
            controls.tolerance = value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|t| t.is_finite() && *t >= 0.0)
                .ok_or_else(|| LsolverError::InvalidControl {
                    key: "tolerance",
                    value: value.clone(),
                })?;
        }
        if let Some(value) = dict.lookup("residuals") {
            controls.residuals = value.trim().parse()?;
        }
        Ok(controls)
    }

    /// Backend options implied by these controls.
    pub fn amgx_options(&self) -> AmgxOptions {
        AmgxOptions {
            store_res_history: self.residuals == ResidualMode::Backend,
            ..AmgxOptions::default()
        }
    }

    pub fn config_source(&self) -> ConfigSource {
        match &self.config_file {
            Some(path) => ConfigSource::File(path.clone()),
            None => ConfigSource::Inline(self.amgx_options().to_config_string()),
        }
    }
}
