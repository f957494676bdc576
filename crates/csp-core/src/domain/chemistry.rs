//! Chemistry selection and prior types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A candidate chemistry system proposed by `materials-data-mcp.suggest_chemistries`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChemistrySuggestion {
    pub chem_system: String,
    pub rationale: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
}

/// Lattice symmetry prior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LatticePrior {
    pub symmetry: String,
}

/// Priors returned by `materials-data-mcp.fetch_priors` for a chosen chemistry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChemistryPriors {
    pub lattice_prior: LatticePrior,
    /// `(min, max)` with `min <= max` and both `> 0`.
    pub density_range: (f64, f64),
    /// Element symbol -> plausible oxidation states.
    pub oxidation_state_constraints: BTreeMap<String, Vec<i32>>,
    /// Ordered prototype structure names.
    pub prototypes: Vec<String>,
}

impl ChemistryPriors {
    /// Whether `density_range` satisfies `min <= max` and both `> 0`.
    pub fn density_range_valid(&self) -> bool {
        let (lo, hi) = self.density_range;
        lo > 0.0 && hi > 0.0 && lo <= hi
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ChemistryPriors {
        ChemistryPriors {
            lattice_prior: LatticePrior {
                symmetry: "orthorhombic".to_string(),
            },
            density_range: (3.0, 4.5),
            oxidation_state_constraints: BTreeMap::from([
                ("Li".to_string(), vec![1]),
                ("Fe".to_string(), vec![2, 3]),
            ]),
            prototypes: vec!["olivine".to_string()],
        }
    }

    #[test]
    fn density_range_valid_accepts_ordered_positive_range() {
        assert!(sample().density_range_valid());
    }

    #[test]
    fn density_range_valid_rejects_inverted_range() {
        let mut p = sample();
        p.density_range = (5.0, 1.0);
        assert!(!p.density_range_valid());
    }

    #[test]
    fn density_range_valid_rejects_nonpositive_bound() {
        let mut p = sample();
        p.density_range = (0.0, 1.0);
        assert!(!p.density_range_valid());
    }

    #[test]
    fn serde_roundtrip() {
        let p = sample();
        let json = serde_json::to_string(&p).unwrap();
        let back: ChemistryPriors = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }

    #[test]
    fn density_range_serializes_as_two_element_array() {
        let p = sample();
        let v = serde_json::to_value(&p).unwrap();
        assert!(v["density_range"].is_array());
        assert_eq!(v["density_range"].as_array().unwrap().len(), 2);
    }
}
