//! Per-candidate validation checks, reports, and the aggregated summary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The six fixed checks `csp-validators-mcp.batch_validate` always evaluates,
/// in the order they must appear on a `ValidationReport`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum CheckName {
    Parseable,
    MinDistance,
    DensityInRange,
    ChargeNeutralityFeasible,
    CoordinationReasonable,
    SymmetryMatch,
}

impl CheckName {
    pub const ALL: [CheckName; 6] = [
        CheckName::Parseable,
        CheckName::MinDistance,
        CheckName::DensityInRange,
        CheckName::ChargeNeutralityFeasible,
        CheckName::CoordinationReasonable,
        CheckName::SymmetryMatch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckName::Parseable => "parseable",
            CheckName::MinDistance => "min_distance",
            CheckName::DensityInRange => "density_in_range",
            CheckName::ChargeNeutralityFeasible => "charge_neutrality_feasible",
            CheckName::CoordinationReasonable => "coordination_reasonable",
            CheckName::SymmetryMatch => "symmetry_match",
        }
    }
}

impl std::fmt::Display for CheckName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationCheck {
    pub name: CheckName,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationReport {
    pub candidate_id: String,
    pub truth_score: f64,
    pub accept: bool,
    pub checks: Vec<ValidationCheck>,
}

impl ValidationReport {
    /// `accept` must equal `truth_score >= threshold`; used by tests and by
    /// the aggregator's debug assertions, never to repair a malformed report.
    pub fn accept_matches_threshold(&self, threshold: f64) -> bool {
        self.accept == (self.truth_score >= threshold)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopCandidate {
    pub candidate_id: String,
    pub truth_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationSummary {
    pub total: u32,
    pub accepted: u32,
    pub rejected: u32,
    pub best_candidate_id: String,
    pub truth_scores: BTreeMap<String, f64>,
    pub failure_histogram: BTreeMap<String, u32>,
    pub top_candidates: Vec<TopCandidate>,
}

impl ValidationSummary {
    pub fn counts_consistent(&self) -> bool {
        self.total == self.accepted + self.rejected
    }

    pub fn histogram_has_all_checks(&self) -> bool {
        CheckName::ALL
            .iter()
            .all(|c| self.failure_histogram.contains_key(c.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(name: CheckName, passed: bool) -> ValidationCheck {
        ValidationCheck {
            name,
            passed,
            value: None,
            message: None,
            severity: None,
        }
    }

    #[test]
    fn check_name_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&CheckName::DensityInRange).unwrap(),
            "\"density_in_range\""
        );
        assert_eq!(
            serde_json::to_string(&CheckName::ChargeNeutralityFeasible).unwrap(),
            "\"charge_neutrality_feasible\""
        );
    }

    #[test]
    fn accept_matches_threshold_true_case() {
        let r = ValidationReport {
            candidate_id: "cand_0001".to_string(),
            truth_score: 0.85,
            accept: true,
            checks: vec![check(CheckName::Parseable, true)],
        };
        assert!(r.accept_matches_threshold(0.8));
    }

    #[test]
    fn accept_matches_threshold_false_case() {
        let r = ValidationReport {
            candidate_id: "cand_0002".to_string(),
            truth_score: 0.5,
            accept: true,
            checks: vec![check(CheckName::Parseable, true)],
        };
        assert!(!r.accept_matches_threshold(0.8));
    }

    #[test]
    fn all_checks_len_is_six() {
        assert_eq!(CheckName::ALL.len(), 6);
    }

    #[test]
    fn summary_counts_consistent() {
        let s = ValidationSummary {
            total: 5,
            accepted: 2,
            rejected: 3,
            best_candidate_id: "cand_0001".to_string(),
            truth_scores: BTreeMap::new(),
            failure_histogram: CheckName::ALL
                .iter()
                .map(|c| (c.as_str().to_string(), 0))
                .collect(),
            top_candidates: Vec::new(),
        };
        assert!(s.counts_consistent());
        assert!(s.histogram_has_all_checks());
    }
}
