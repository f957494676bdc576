//! The iteration policy: a pure decision function plus a pure constraint
//! mutation. Neither consumes the PRNG — the same `(summary, config,
//! iteration)` always yields the same `Decision`.

use serde::{Deserialize, Serialize};

use crate::config::PolicyConfig;
use crate::domain::constraints::{Adjustment, ConstraintsSpec, Mode};
use crate::domain::validation::ValidationSummary;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Decision {
    pub mode: Mode,
    pub action: String,
}

fn failure_count(summary: &ValidationSummary, check_name: &str) -> u32 {
    summary.failure_histogram.get(check_name).copied().unwrap_or(0)
}

fn default_action(mode: Mode) -> &'static str {
    match mode {
        Mode::Relax => "widen_lattice",
        Mode::Tighten => "increase_min_distance_scale",
    }
}

/// Decides `relax` or `tighten` from the failure histogram, then picks the
/// action at `iteration mod len(order)` from the matching order list.
pub fn decide(summary: &ValidationSummary, config: &PolicyConfig, iteration: u32) -> Decision {
    let r = failure_count(summary, "density_in_range")
        + failure_count(summary, "charge_neutrality_feasible")
        + failure_count(summary, "symmetry_match");
    let t = failure_count(summary, "min_distance") + failure_count(summary, "coordination_reasonable");

    let mode = if r >= t { Mode::Relax } else { Mode::Tighten };
    let order = match mode {
        Mode::Relax => &config.relax_order,
        Mode::Tighten => &config.tighten_order,
    };

    let action = if order.is_empty() {
        default_action(mode).to_string()
    } else {
        order[(iteration as usize) % order.len()].clone()
    };

    Decision { mode, action }
}

fn mutate_density_range(constraints: &mut ConstraintsSpec, action: &str) {
    let (lo, hi) = constraints.priors.density_range;
    match action {
        "widen_lattice" => {
            constraints.priors.density_range = ((lo * 0.9).max(0.1), hi * 1.1);
        }
        "narrow_density" => {
            let new_lo = lo * 1.05;
            constraints.priors.density_range = (new_lo, (new_lo * 1.1).max(hi * 0.95));
        }
        _ => {}
    }
}

fn mutate_overrides(constraints: &mut ConstraintsSpec, action: &str) {
    match action {
        "increase_max_atoms" => {
            let next = constraints
                .overrides
                .get("max_atoms")
                .and_then(serde_json::Value::as_f64)
                .map(|v| v + 5.0)
                .unwrap_or(150.0);
            constraints
                .overrides
                .insert("max_atoms".to_string(), serde_json::json!(next));
        }
        "increase_min_distance_scale" => {
            let next = constraints
                .overrides
                .get("min_distance_scale")
                .and_then(serde_json::Value::as_f64)
                .map(|v| v + 0.05)
                .unwrap_or(1.05);
            constraints
                .overrides
                .insert("min_distance_scale".to_string(), serde_json::json!(next));
        }
        _ => {}
    }
}

fn mutate_prototypes(constraints: &mut ConstraintsSpec, action: &str) {
    match action {
        "expand_prototypes" => {
            constraints.priors.prototypes.push("proto_extra".to_string());
        }
        "restrict_prototypes" => {
            if constraints.priors.prototypes.len() > 1 {
                constraints.priors.prototypes.pop();
            }
        }
        _ => {}
    }
}

/// Appends `{iteration, mode, action}` to `adjustments`, then applies the
/// action's effect (a no-op beyond the append for unrecognized actions).
pub fn apply(mut constraints: ConstraintsSpec, decision: &Decision, iteration: u32) -> ConstraintsSpec {
    constraints.adjustments.push(Adjustment {
        iteration,
        mode: decision.mode,
        action: decision.action.clone(),
    });
    mutate_density_range(&mut constraints, &decision.action);
    mutate_overrides(&mut constraints, &decision.action);
    mutate_prototypes(&mut constraints, &decision.action);
    constraints
}
