//! Candidate structures produced by `qlip-mcp.run_qlip`.

use serde::{Deserialize, Serialize};

/// A single candidate crystal structure. Immutable once written: a later
/// iteration with the same `candidate_id` overwrites the file on disk, but
/// within one `run_qlip` call the set is fixed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    /// Matches `^cand_\d{4}$`.
    pub candidate_id: String,
    /// Solver-reported score in `[0, 1]`. Distinct from `truth_score`, which
    /// the validators assign.
    pub score: f64,
    pub format: String,
    pub content: String,
}

impl Candidate {
    pub fn new(candidate_id: impl Into<String>, score: f64, content: impl Into<String>) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            score,
            format: "cif".to_string(),
            content: content.into(),
        }
    }

    /// Whether `candidate_id` matches `^cand_\d{4}$`.
    pub fn has_valid_id(&self) -> bool {
        is_valid_candidate_id(&self.candidate_id)
    }
}

/// Standalone validity check usable before a `Candidate` exists (e.g. when
/// parsing a filename from disk).
pub fn is_valid_candidate_id(id: &str) -> bool {
    id.strip_prefix("cand_")
        .map(|digits| digits.len() == 4 && digits.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_canonical_id() {
        assert!(is_valid_candidate_id("cand_0001"));
        assert!(is_valid_candidate_id("cand_9999"));
    }

    #[test]
    fn rejects_wrong_width() {
        assert!(!is_valid_candidate_id("cand_1"));
        assert!(!is_valid_candidate_id("cand_00001"));
    }

    #[test]
    fn rejects_non_digit_suffix() {
        assert!(!is_valid_candidate_id("cand_abcd"));
        assert!(!is_valid_candidate_id("candidate_0001"));
    }

    #[test]
    fn constructor_defaults_format_to_cif() {
        let c = Candidate::new("cand_0001", 0.5, "data_cand_0001\n");
        assert_eq!(c.format, "cif");
        assert!(c.has_valid_id());
    }
}
