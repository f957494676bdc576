//! The run manifest: the single mutable record of a run's lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a run. Transitions `running -> (ok | error)` and never back.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Ok,
    Error,
}

impl RunStatus {
    /// Whether moving from `self` to `next` is a legal one-way transition.
    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        match self {
            RunStatus::Running => matches!(next, RunStatus::Ok | RunStatus::Error),
            RunStatus::Ok | RunStatus::Error => false,
        }
    }
}

/// The single mutable record of a run's lifecycle, created on discover and
/// updated only by discover and iterate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunManifest {
    pub run_id: String,
    pub status: RunStatus,
    pub objective: String,
    pub chem_system: String,
    pub seed: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub iteration: u32,
    pub max_iters: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_candidate_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truth_score: Option<f64>,
    pub config_snapshot: serde_json::Value,
}

impl RunManifest {
    pub fn iteration_within_bounds(&self) -> bool {
        self.iteration <= self.max_iters
    }

    /// Marks the manifest `ok`, recording the selection and bumping
    /// `updated_at`. Panics (via the enum's invariant, checked by callers at
    /// the workflow boundary) are avoided here by leaving transition
    /// legality to `RunStatus::can_transition_to`.
    pub fn mark_ok(
        &mut self,
        now: DateTime<Utc>,
        selected_candidate_id: String,
        truth_score: f64,
    ) {
        self.status = RunStatus::Ok;
        self.updated_at = now;
        self.selected_candidate_id = Some(selected_candidate_id);
        self.truth_score = Some(truth_score);
    }

    pub fn mark_error(&mut self, now: DateTime<Utc>) {
        self.status = RunStatus::Error;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RunManifest {
        let now = Utc::now();
        RunManifest {
            run_id: "run_1_deadbeef".to_string(),
            status: RunStatus::Running,
            objective: "find a stable LiFePO4 polymorph".to_string(),
            chem_system: "Li-Fe-P-O".to_string(),
            seed: 1,
            created_at: now,
            updated_at: now,
            iteration: 0,
            max_iters: 5,
            selected_candidate_id: None,
            truth_score: None,
            config_snapshot: serde_json::json!({}),
        }
    }

    #[test]
    fn running_can_transition_to_ok_or_error() {
        assert!(RunStatus::Running.can_transition_to(RunStatus::Ok));
        assert!(RunStatus::Running.can_transition_to(RunStatus::Error));
    }

    #[test]
    fn terminal_statuses_cannot_transition() {
        assert!(!RunStatus::Ok.can_transition_to(RunStatus::Error));
        assert!(!RunStatus::Error.can_transition_to(RunStatus::Ok));
        assert!(!RunStatus::Ok.can_transition_to(RunStatus::Running));
    }

    #[test]
    fn iteration_within_bounds_true_when_equal_to_max() {
        let mut m = sample();
        m.iteration = 5;
        m.max_iters = 5;
        assert!(m.iteration_within_bounds());
    }

    #[test]
    fn iteration_within_bounds_false_when_exceeded() {
        let mut m = sample();
        m.iteration = 6;
        m.max_iters = 5;
        assert!(!m.iteration_within_bounds());
    }

    #[test]
    fn mark_ok_sets_selection_and_status() {
        let mut m = sample();
        let later = m.updated_at + chrono::Duration::seconds(1);
        m.mark_ok(later, "cand_0001".to_string(), 0.85);
        assert_eq!(m.status, RunStatus::Ok);
        assert_eq!(m.selected_candidate_id.as_deref(), Some("cand_0001"));
        assert_eq!(m.truth_score, Some(0.85));
        assert_eq!(m.updated_at, later);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&RunStatus::Running).unwrap(), "\"running\"");
        assert_eq!(serde_json::to_string(&RunStatus::Ok).unwrap(), "\"ok\"");
        assert_eq!(serde_json::to_string(&RunStatus::Error).unwrap(), "\"error\"");
    }
}
