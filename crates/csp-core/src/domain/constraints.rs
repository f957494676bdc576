//! Constraint specification compiled for the MILP solver.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::chemistry::ChemistryPriors;

/// Policy mode: widen the search space, or narrow it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Relax,
    Tighten,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Relax => write!(f, "relax"),
            Mode::Tighten => write!(f, "tighten"),
        }
    }
}

/// A single append-only entry in `ConstraintsSpec::adjustments`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Adjustment {
    pub iteration: u32,
    pub mode: Mode,
    pub action: String,
}

/// The solver-facing constraint specification, rewritten in full each
/// iteration. History of policy decisions lives in `adjustments`, which is
/// append-only: `adjustments.len()` equals the current iteration count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConstraintsSpec {
    pub chem_system: String,
    pub priors: ChemistryPriors,
    pub overrides: BTreeMap<String, serde_json::Value>,
    pub adjustments: Vec<Adjustment>,
}

impl ConstraintsSpec {
    /// `true` iff `adjustments` is consistent with having completed
    /// `iteration` iterations (length equals the iteration count).
    pub fn adjustments_consistent(&self, iteration: u32) -> bool {
        self.adjustments.len() as u32 == iteration
    }
}

#[cfg(test)]
mod tests {
    use super::super::chemistry::LatticePrior;
    use super::*;

    fn sample() -> ConstraintsSpec {
        ConstraintsSpec {
            chem_system: "Li-Fe-P-O".to_string(),
            priors: ChemistryPriors {
                lattice_prior: LatticePrior {
                    symmetry: "orthorhombic".to_string(),
                },
                density_range: (3.0, 4.0),
                oxidation_state_constraints: BTreeMap::new(),
                prototypes: vec!["olivine".to_string()],
            },
            overrides: BTreeMap::new(),
            adjustments: Vec::new(),
        }
    }

    #[test]
    fn adjustments_consistent_for_fresh_spec() {
        assert!(sample().adjustments_consistent(0));
    }

    #[test]
    fn adjustments_consistent_after_append() {
        let mut spec = sample();
        spec.adjustments.push(Adjustment {
            iteration: 1,
            mode: Mode::Relax,
            action: "widen_lattice".to_string(),
        });
        assert!(spec.adjustments_consistent(1));
        assert!(!spec.adjustments_consistent(0));
    }

    #[test]
    fn mode_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Mode::Relax).unwrap(), "\"relax\"");
        assert_eq!(
            serde_json::to_string(&Mode::Tighten).unwrap(),
            "\"tighten\""
        );
    }

    #[test]
    fn mode_display_matches_serde() {
        assert_eq!(Mode::Relax.to_string(), "relax");
        assert_eq!(Mode::Tighten.to_string(), "tighten");
    }
}
