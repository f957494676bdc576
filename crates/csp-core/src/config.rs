//! Layered configuration resolution: defaults, then an optional config file,
//! then CLI overrides, merged deep-for-objects / overwrite-for-scalars.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::error::{Result, WorkflowError};

const VALID_SOLVERS: [&str; 3] = ["gurobi", "cbc", "highs"];

/// CLI-sourced overrides. `None` means "not provided on the command line";
/// only present fields participate in the merge.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub workspace: Option<String>,
    pub solver: Option<String>,
    pub max_iters: Option<u32>,
}

/// The fully resolved configuration consumed by the workflow engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub workspace: String,
    pub solver: String,
    pub policy: PolicyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyConfig {
    pub max_iters: u32,
    pub truth_accept_threshold: f64,
    pub relax_order: Vec<String>,
    pub tighten_order: Vec<String>,
}

fn default_config_value() -> Value {
    serde_json::json!({
        "workspace": ".",
        "solver": "highs",
        "policy": {
            "max_iters": 5,
            "truth_accept_threshold": 0.8,
            "relax_order": [
                "widen_lattice",
                "expand_prototypes",
                "increase_max_atoms"
            ],
            "tighten_order": [
                "increase_min_distance_scale",
                "narrow_density",
                "restrict_prototypes"
            ]
        }
    })
}

/// Deep merge: objects merge key-by-key recursively; arrays and scalars in
/// `overlay` replace the corresponding value in `base` wholesale.
fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base_slot, overlay_value) => {
            *base_slot = overlay_value.clone();
        }
    }
}

fn apply_cli_overrides(base: &mut Value, overrides: &CliOverrides) -> Result<()> {
    let mut patch = Map::new();
    if let Some(workspace) = &overrides.workspace {
        patch.insert("workspace".to_string(), Value::String(workspace.clone()));
    }
    if let Some(solver) = &overrides.solver {
        patch.insert("solver".to_string(), Value::String(solver.clone()));
    }
    if let Some(max_iters) = overrides.max_iters {
        patch.insert(
            "policy".to_string(),
            serde_json::json!({ "max_iters": max_iters }),
        );
    }
    deep_merge(base, &Value::Object(patch));
    Ok(())
}

fn validate_solver(value: &Value) -> Result<()> {
    let solver = value
        .get("solver")
        .and_then(Value::as_str)
        .ok_or_else(|| WorkflowError::InvalidConfig("solver must be a string".to_string()))?;
    if !VALID_SOLVERS.contains(&solver) {
        return Err(WorkflowError::InvalidConfig(format!(
            "invalid solver {solver:?}, expected one of {VALID_SOLVERS:?}"
        )));
    }
    Ok(())
}

/// `~/.claude-flow-csp/config.json`, the config-file path used when
/// `--config` is not passed. `None` if `$HOME` is unset.
fn default_config_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".claude-flow-csp/config.json"))
}

/// Resolves configuration from, in increasing precedence: built-in defaults,
/// an optional config-file path (defaulting to `~/.claude-flow-csp/config.json`
/// when `--config` is not passed; a missing file is not an error, a malformed
/// one is), and CLI overrides.
pub fn resolve(config_path: Option<&Path>, overrides: &CliOverrides) -> Result<Config> {
    let mut merged = default_config_value();

    let resolved_path = config_path.map(Path::to_path_buf).or_else(default_config_path);
    if let Some(path) = resolved_path {
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                let file_value: Value = serde_json::from_str(&contents)?;
                deep_merge(&mut merged, &file_value);
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(WorkflowError::Io(err)),
        }
    }

    apply_cli_overrides(&mut merged, overrides)?;
    validate_solver(&merged)?;

    serde_json::from_value(merged).map_err(WorkflowError::from)
}

impl Config {
    /// The full resolved configuration as a JSON value, snapshotted onto the
    /// run manifest at discover time.
    pub fn snapshot(&self) -> Value {
        serde_json::to_value(self).expect("Config always serializes")
    }
}
