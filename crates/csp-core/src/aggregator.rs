//! Pure reduction of per-candidate validation reports into a run-level
//! summary.

use std::collections::BTreeMap;

use crate::domain::validation::{CheckName, TopCandidate, ValidationReport, ValidationSummary};

/// Reduces `reports` into a `ValidationSummary`. Callers must pass a
/// non-empty `reports`; an empty slice degenerates to an empty
/// `best_candidate_id`, which is never produced by the workflow engine in
/// practice since `run_qlip` always yields candidates first.
pub fn aggregate(reports: &[ValidationReport]) -> ValidationSummary {
    let total = reports.len() as u32;
    let accepted = reports.iter().filter(|r| r.accept).count() as u32;
    let rejected = total - accepted;

    let truth_scores: BTreeMap<String, f64> = reports
        .iter()
        .map(|r| (r.candidate_id.clone(), r.truth_score))
        .collect();

    let mut failure_histogram: BTreeMap<String, u32> = CheckName::ALL
        .iter()
        .map(|c| (c.as_str().to_string(), 0))
        .collect();
    for report in reports {
        for check in &report.checks {
            if !check.passed {
                *failure_histogram.entry(check.name.as_str().to_string()).or_insert(0) += 1;
            }
        }
    }

    let mut top_candidates: Vec<TopCandidate> = reports
        .iter()
        .map(|r| TopCandidate {
            candidate_id: r.candidate_id.clone(),
            truth_score: r.truth_score,
        })
        .collect();
    top_candidates.sort_by(|a, b| {
        b.truth_score
            .partial_cmp(&a.truth_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.candidate_id.cmp(&b.candidate_id))
    });

    let best_candidate_id = top_candidates
        .first()
        .map(|c| c.candidate_id.clone())
        .unwrap_or_else(|| {
            reports
                .first()
                .map(|r| r.candidate_id.clone())
                .unwrap_or_default()
        });

    ValidationSummary {
        total,
        accepted,
        rejected,
        best_candidate_id,
        truth_scores,
        failure_histogram,
        top_candidates,
    }
}
