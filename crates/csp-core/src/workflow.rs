//! Sequences scout -> priors -> constraints -> solve -> validate -> iterate
//! over the tool-client seam, and owns every manifest mutation.
//!
//! The engine carries no ambient state of its own: the workspace root is a
//! constructor parameter, and every other piece of context (the tool client,
//! the resolved config) is passed into each call rather than stashed on
//! `self`, so nothing here prevents two engines from targeting different
//! workspaces in the same process.

use std::path::PathBuf;

use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::aggregator;
use crate::artifacts::RunDir;
use crate::canon;
use crate::config::Config;
use crate::domain::candidate::Candidate;
use crate::domain::chemistry::{ChemistryPriors, ChemistrySuggestion};
use crate::domain::constraints::ConstraintsSpec;
use crate::domain::error::{Result, WorkflowError};
use crate::domain::event::{Event, EventKind};
use crate::domain::manifest::{RunManifest, RunStatus};
use crate::domain::validation::{ValidationReport, ValidationSummary};
use crate::metrics::METRICS;
use crate::obs;
use crate::policy::{self, Decision};
use crate::prng::{hash_str, Prng};
use crate::tools::{
    ToolClient, BATCH_VALIDATE, BUILD_CONSTRAINTS, FETCH_PRIORS, RUN_QLIP, SUGGEST_CHEMISTRIES,
};

/// The numeric salt the engine forks its command-seeded PRNG with when
/// picking among `suggest_chemistries`'s returned table. Fixed so the choice
/// is reproducible independently of the stub client's own internal draws.
const CHEMISTRY_PICK_SALT: f64 = 0x3f1c2b as f64;

/// `run_<seed>_<8 lowercase hex digits>`, where the hex comes from a PRNG
/// seeded with `seed XOR hash(objective)`.
pub fn derive_run_id(seed: u64, objective: &str) -> String {
    let seed_state = Prng::new(seed as f64).raw_state();
    let combined = seed_state ^ hash_str(objective);
    let hex = Prng::from_raw_state(combined).next_hex(8);
    format!("run_{seed}_{hex}")
}

#[derive(Debug, Clone)]
pub struct DiscoverOptions {
    pub objective: String,
    pub chem_system: Option<String>,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscoverOutput {
    pub run_id: String,
    pub status: String,
    pub run_dir: String,
    pub selected_chemistry: String,
    pub chosen_candidate_id: String,
    pub truth_score: f64,
    pub candidate_ids: Vec<String>,
    pub summary_hash: String,
    pub iteration: u32,
}

#[derive(Debug, Clone)]
pub struct IterateOptions {
    pub run_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IterateOutput {
    pub run_id: String,
    pub status: String,
    pub iteration: u32,
    pub chosen_candidate_id: String,
    pub truth_score: f64,
    pub summary_hash: String,
}

#[derive(Debug, Clone)]
pub struct ValidateOptions {
    pub run_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidateOutput {
    pub run_id: String,
    pub status: String,
    pub best_candidate_id: String,
    pub truth_score: f64,
    pub summary_hash: String,
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub run_id: String,
    pub format: String,
    pub top_k: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportOutput {
    pub run_id: String,
    pub format: String,
    pub exported_candidate_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IterationRecord {
    iteration: u32,
    decision: Decision,
    summary_hash: String,
    chosen_candidate_id: String,
    truth_score: f64,
}

fn extract<T: DeserializeOwned>(output: &Value, field: &str, tool_name: &str) -> Result<T> {
    let value = output.get(field).ok_or_else(|| WorkflowError::MalformedToolOutput {
        tool_name: tool_name.to_string(),
        message: format!("missing field {field:?}"),
    })?;
    serde_json::from_value(value.clone()).map_err(|e| WorkflowError::MalformedToolOutput {
        tool_name: tool_name.to_string(),
        message: e.to_string(),
    })
}

async fn call_tool(
    run_dir: &RunDir,
    run_id: &str,
    client: &dyn ToolClient,
    tool_name: &str,
    input: Value,
) -> Result<Value> {
    obs::emit_tool_call_started(run_id, tool_name);
    run_dir.append_event(&Event::new(
        Utc::now(),
        EventKind::ToolCallStarted {
            tool_name: tool_name.to_string(),
        },
    ))?;
    METRICS.inc_tool_calls();

    match client.call(tool_name, input).await {
        Ok(output) => {
            obs::emit_tool_call_succeeded(run_id, tool_name);
            run_dir.append_event(&Event::new(
                Utc::now(),
                EventKind::ToolCallSucceeded {
                    tool_name: tool_name.to_string(),
                },
            ))?;
            Ok(output)
        }
        Err(err) => {
            METRICS.inc_tool_call_failures();
            obs::emit_tool_call_failed(run_id, tool_name, &err.to_string());
            run_dir.append_event(&Event::new(
                Utc::now(),
                EventKind::ToolCallFailed {
                    tool_name: tool_name.to_string(),
                    message: err.to_string(),
                },
            ))?;
            Err(WorkflowError::ToolFailure {
                tool_name: tool_name.to_string(),
                message: err.to_string(),
            })
        }
    }
}

/// Runs `run_qlip` against `constraints`, persists every candidate file, then
/// `batch_validate`s them and persists reports + the recomputed summary.
/// Shared by discover and iterate, which differ only in what happens before
/// and after this span.
async fn solve_and_validate(
    run_dir: &RunDir,
    run_id: &str,
    client: &dyn ToolClient,
    constraints: &ConstraintsSpec,
) -> Result<(Vec<String>, ValidationSummary, String)> {
    let candidates_output = call_tool(
        run_dir,
        run_id,
        client,
        RUN_QLIP,
        serde_json::json!({ "constraints": constraints }),
    )
    .await?;
    let candidates: Vec<Candidate> = extract(&candidates_output, "candidates", RUN_QLIP)?;
    for candidate in &candidates {
        run_dir.write_candidate_file(&candidate.candidate_id, &candidate.content)?;
    }
    let candidate_ids: Vec<String> = candidates.iter().map(|c| c.candidate_id.clone()).collect();

    let validate_output = call_tool(
        run_dir,
        run_id,
        client,
        BATCH_VALIDATE,
        serde_json::json!({ "candidate_ids": candidate_ids }),
    )
    .await?;
    let reports: Vec<ValidationReport> = extract(&validate_output, "reports", BATCH_VALIDATE)?;
    for report in &reports {
        run_dir.write_report(report)?;
    }

    // The stub also returns a diagnostic summary; it is never consulted.
    let summary = aggregator::aggregate(&reports);
    run_dir.write_summary(&summary)?;

    let summary_value = serde_json::to_value(&summary)?;
    let summary_hash = canon::summary_hash(&summary_value)?;

    Ok((candidate_ids, summary, summary_hash))
}

pub struct WorkflowEngine {
    workspace: PathBuf,
}

impl WorkflowEngine {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }

    async fn pick_chemistry(
        &self,
        run_dir: &RunDir,
        run_id: &str,
        client: &dyn ToolClient,
        opts: &DiscoverOptions,
        engine_prng: &Prng,
    ) -> Result<ChemistrySuggestion> {
        if let Some(chem_system) = &opts.chem_system {
            return Ok(ChemistrySuggestion {
                chem_system: chem_system.clone(),
                rationale: "provided".to_string(),
                confidence: 1.0,
            });
        }

        let output = call_tool(run_dir, run_id, client, SUGGEST_CHEMISTRIES, serde_json::json!({})).await?;
        let chemistries: Vec<ChemistrySuggestion> =
            extract(&output, "chemistries", SUGGEST_CHEMISTRIES)?;
        if chemistries.is_empty() {
            return Err(WorkflowError::MalformedToolOutput {
                tool_name: SUGGEST_CHEMISTRIES.to_string(),
                message: "suggest_chemistries returned an empty list".to_string(),
            });
        }
        let mut forked = engine_prng.fork_numeric(CHEMISTRY_PICK_SALT);
        let idx = forked.next_int(0, chemistries.len() as i64 - 1) as usize;
        Ok(chemistries[idx].clone())
    }

    async fn discover_attempt(
        &self,
        run_dir: &RunDir,
        client: &dyn ToolClient,
        opts: &DiscoverOptions,
        mut manifest: RunManifest,
    ) -> Result<(DiscoverOutput, RunManifest)> {
        let engine_prng = Prng::from_seed_u64(opts.seed);

        let chosen = self.pick_chemistry(run_dir, &manifest.run_id, client, opts, &engine_prng).await?;

        let priors_output = call_tool(
            run_dir,
            &manifest.run_id,
            client,
            FETCH_PRIORS,
            serde_json::json!({ "chem_system": chosen.chem_system }),
        )
        .await?;
        let priors: ChemistryPriors = extract(&priors_output, "priors", FETCH_PRIORS)?;

        let build_input = serde_json::json!({
            "chem_system": chosen.chem_system,
            "priors": priors,
            "overrides": {},
        });
        let constraints_output =
            call_tool(run_dir, &manifest.run_id, client, BUILD_CONSTRAINTS, build_input).await?;
        let constraints: ConstraintsSpec = extract(&constraints_output, "constraints", BUILD_CONSTRAINTS)?;
        run_dir.write_constraints(&constraints)?;

        let (candidate_ids, summary, summary_hash) =
            solve_and_validate(run_dir, &manifest.run_id, client, &constraints).await?;

        let truth_score = summary
            .truth_scores
            .get(&summary.best_candidate_id)
            .copied()
            .unwrap_or(0.0);

        manifest.chem_system = chosen.chem_system.clone();
        manifest.mark_ok(Utc::now(), summary.best_candidate_id.clone(), truth_score);
        run_dir.write_manifest(&manifest)?;
        run_dir.append_event(&Event::new(
            Utc::now(),
            EventKind::RunCompleted {
                status: RunStatus::Ok,
                selected_candidate_id: Some(summary.best_candidate_id.clone()),
            },
        ))?;
        METRICS.inc_iterations_run();

        let output = DiscoverOutput {
            run_id: manifest.run_id.clone(),
            status: "ok".to_string(),
            run_dir: run_dir.path().to_string_lossy().to_string(),
            selected_chemistry: chosen.chem_system,
            chosen_candidate_id: summary.best_candidate_id,
            truth_score,
            candidate_ids,
            summary_hash,
            iteration: 0,
        };
        Ok((output, manifest))
    }

    pub async fn discover(
        &self,
        client: &dyn ToolClient,
        opts: DiscoverOptions,
        config: &Config,
    ) -> Result<DiscoverOutput> {
        let run_id = derive_run_id(opts.seed, &opts.objective);
        let run_dir = RunDir::new(&self.workspace, &run_id);
        let now = Utc::now();

        let manifest = RunManifest {
            run_id: run_id.clone(),
            status: RunStatus::Running,
            objective: opts.objective.clone(),
            chem_system: opts.chem_system.clone().unwrap_or_default(),
            seed: opts.seed,
            created_at: now,
            updated_at: now,
            iteration: 0,
            max_iters: config.policy.max_iters,
            selected_candidate_id: None,
            truth_score: None,
            config_snapshot: config.snapshot(),
        };
        run_dir.write_manifest(&manifest)?;
        run_dir.append_event(&Event::new(
            now,
            EventKind::RunManifest {
                status: manifest.status,
                iteration: manifest.iteration,
            },
        ))?;
        run_dir.append_event(&Event::new(
            now,
            EventKind::RunStarted {
                objective: opts.objective.clone(),
                seed: opts.seed,
            },
        ))?;
        let _span = obs::RunSpan::enter(&run_id);
        obs::emit_run_started(&run_id, &opts.objective, opts.seed);

        match self.discover_attempt(&run_dir, client, &opts, manifest.clone()).await {
            Ok((output, _final)) => {
                obs::emit_run_finished(&run_id, "ok", 0);
                METRICS.inc_runs_completed();
                Ok(output)
            }
            Err(err) => {
                let mut failed = manifest;
                failed.mark_error(Utc::now());
                run_dir.write_manifest(&failed)?;
                run_dir.append_event(&Event::new(
                    Utc::now(),
                    EventKind::RunCompleted {
                        status: RunStatus::Error,
                        selected_candidate_id: None,
                    },
                ))?;
                obs::emit_run_finished(&run_id, "error", 0);
                METRICS.inc_runs_errored();
                Err(err)
            }
        }
    }

    async fn iterate_attempt(
        &self,
        run_dir: &RunDir,
        client: &dyn ToolClient,
        mut manifest: RunManifest,
        constraints: ConstraintsSpec,
        summary: ValidationSummary,
        config: &Config,
        next: u32,
    ) -> Result<(IterateOutput, RunManifest)> {
        let decision = policy::decide(&summary, &config.policy, next);
        let new_constraints = policy::apply(constraints, &decision, next);
        run_dir.write_constraints(&new_constraints)?;
        run_dir.append_event(&Event::new(
            Utc::now(),
            EventKind::IterationDecided {
                iteration: next,
                mode: decision.mode,
                action: decision.action.clone(),
            },
        ))?;
        obs::emit_iteration_decided(&manifest.run_id, next, &decision.mode.to_string(), &decision.action);
        METRICS.inc_iterations_run();

        let (_candidate_ids, new_summary, summary_hash) =
            solve_and_validate(run_dir, &manifest.run_id, client, &new_constraints).await?;

        let truth_score = new_summary
            .truth_scores
            .get(&new_summary.best_candidate_id)
            .copied()
            .unwrap_or(0.0);

        run_dir.write_iteration_record(
            next,
            &IterationRecord {
                iteration: next,
                decision,
                summary_hash: summary_hash.clone(),
                chosen_candidate_id: new_summary.best_candidate_id.clone(),
                truth_score,
            },
        )?;

        manifest.iteration = next;
        manifest.mark_ok(Utc::now(), new_summary.best_candidate_id.clone(), truth_score);
        run_dir.write_manifest(&manifest)?;

        let output = IterateOutput {
            run_id: manifest.run_id.clone(),
            status: "ok".to_string(),
            iteration: next,
            chosen_candidate_id: new_summary.best_candidate_id,
            truth_score,
            summary_hash,
        };
        Ok((output, manifest))
    }

    pub async fn iterate(
        &self,
        client: &dyn ToolClient,
        opts: IterateOptions,
        config: &Config,
    ) -> Result<IterateOutput> {
        let run_dir = RunDir::new(&self.workspace, &opts.run_id);
        let manifest = run_dir.read_manifest()?;
        let next = manifest.iteration + 1;
        if next > manifest.max_iters {
            return Err(WorkflowError::MaxIterationsReached {
                next,
                max_iters: manifest.max_iters,
            });
        }
        let constraints: ConstraintsSpec = run_dir.read_constraints()?;
        let summary: ValidationSummary = run_dir.read_summary()?;

        match self
            .iterate_attempt(&run_dir, client, manifest.clone(), constraints, summary, config, next)
            .await
        {
            Ok((output, _final)) => {
                METRICS.inc_runs_completed();
                Ok(output)
            }
            Err(err) => {
                let mut failed = manifest;
                failed.mark_error(Utc::now());
                run_dir.write_manifest(&failed)?;
                METRICS.inc_runs_errored();
                Err(err)
            }
        }
    }

    async fn validate_attempt(
        &self,
        run_dir: &RunDir,
        run_id: &str,
        client: &dyn ToolClient,
    ) -> Result<ValidateOutput> {
        let candidate_ids = run_dir.list_candidate_ids()?;
        let validate_output = call_tool(
            run_dir,
            run_id,
            client,
            BATCH_VALIDATE,
            serde_json::json!({ "candidate_ids": candidate_ids }),
        )
        .await?;
        let reports: Vec<ValidationReport> = extract(&validate_output, "reports", BATCH_VALIDATE)?;
        for report in &reports {
            run_dir.write_report(report)?;
        }
        let summary = aggregator::aggregate(&reports);
        run_dir.write_summary(&summary)?;
        let summary_value = serde_json::to_value(&summary)?;
        let summary_hash = canon::summary_hash(&summary_value)?;
        let truth_score = summary
            .truth_scores
            .get(&summary.best_candidate_id)
            .copied()
            .unwrap_or(0.0);

        Ok(ValidateOutput {
            run_id: run_id.to_string(),
            status: "ok".to_string(),
            best_candidate_id: summary.best_candidate_id,
            truth_score,
            summary_hash,
        })
    }

    /// Out-of-loop revalidation: rebuilds candidates from disk and calls
    /// `batch_validate` again without touching the run manifest, which per
    /// the lifecycle contract only discover and iterate may mutate.
    pub async fn validate(&self, client: &dyn ToolClient, opts: ValidateOptions) -> Result<ValidateOutput> {
        let run_dir = RunDir::new(&self.workspace, &opts.run_id);
        let manifest = run_dir.read_manifest()?;

        match self.validate_attempt(&run_dir, &opts.run_id, client).await {
            Ok(output) => Ok(output),
            Err(err) => {
                let mut failed = manifest;
                failed.mark_error(Utc::now());
                run_dir.write_manifest(&failed)?;
                Err(err)
            }
        }
    }

    pub async fn export(&self, opts: ExportOptions) -> Result<ExportOutput> {
        let run_dir = RunDir::new(&self.workspace, &opts.run_id);
        if !run_dir.exists() {
            return Err(WorkflowError::RunNotFound(opts.run_id.clone()));
        }

        let ordered_ids: Vec<String> = match run_dir.read_summary::<ValidationSummary>() {
            Ok(summary) => summary
                .top_candidates
                .into_iter()
                .map(|c| c.candidate_id)
                .collect(),
            Err(_) => run_dir.list_candidate_ids()?,
        };

        let selected: Vec<String> = ordered_ids.into_iter().take(opts.top_k).collect();
        for candidate_id in &selected {
            let content = run_dir.read_candidate_file(candidate_id)?;
            let export_content = match opts.format.as_str() {
                "poscar" => format!("# POSCAR placeholder for {candidate_id}\n{content}"),
                _ => content,
            };
            run_dir.write_export(candidate_id, &opts.format, &export_content)?;
        }

        Ok(ExportOutput {
            run_id: opts.run_id,
            format: opts.format,
            exported_candidate_ids: selected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PolicyConfig;
    use crate::tools::StubToolClient;

    fn test_config(max_iters: u32) -> Config {
        Config {
            workspace: ".".to_string(),
            solver: "highs".to_string(),
            policy: PolicyConfig {
                max_iters,
                truth_accept_threshold: 0.8,
                relax_order: vec![
                    "widen_lattice".to_string(),
                    "expand_prototypes".to_string(),
                    "increase_max_atoms".to_string(),
                ],
                tighten_order: vec![
                    "increase_min_distance_scale".to_string(),
                    "narrow_density".to_string(),
                    "restrict_prototypes".to_string(),
                ],
            },
        }
    }

    #[test]
    fn derive_run_id_is_deterministic_for_fixed_seed_and_objective() {
        let a = derive_run_id(7, "Determinism test");
        let b = derive_run_id(7, "Determinism test");
        assert_eq!(a, b);
        assert!(a.starts_with("run_7_"));
        assert_eq!(a.len(), "run_7_".len() + 8);
    }

    #[test]
    fn derive_run_id_differs_across_objectives() {
        let a = derive_run_id(7, "Determinism test");
        let b = derive_run_id(7, "A different objective");
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn discover_produces_five_candidates_and_ok_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = WorkflowEngine::new(tmp.path().to_path_buf());
        let client = StubToolClient::new(Prng::new(1.0), 0.8);
        let config = test_config(5);

        let output = engine
            .discover(
                &client,
                DiscoverOptions {
                    objective: "Discover stable oxide".to_string(),
                    chem_system: None,
                    seed: 1,
                },
                &config,
            )
            .await
            .unwrap();

        assert_eq!(output.status, "ok");
        assert_eq!(output.candidate_ids.len(), 5);
        assert_eq!(output.iteration, 0);

        let run_dir = RunDir::new(tmp.path(), &output.run_id);
        let manifest = run_dir.read_manifest().unwrap();
        assert_eq!(manifest.status, RunStatus::Ok);
        assert_eq!(manifest.iteration, 0);
    }

    #[tokio::test]
    async fn discover_is_deterministic_across_independent_workspaces() {
        let tmp_a = tempfile::tempdir().unwrap();
        let tmp_b = tempfile::tempdir().unwrap();

        let run_once = |workspace: PathBuf| async move {
            let engine = WorkflowEngine::new(workspace);
            let client = StubToolClient::new(Prng::new(7.0), 0.8);
            engine
                .discover(
                    &client,
                    DiscoverOptions {
                        objective: "Determinism test".to_string(),
                        chem_system: None,
                        seed: 7,
                    },
                    &test_config(5),
                )
                .await
                .unwrap()
        };

        let out_a = run_once(tmp_a.path().to_path_buf()).await;
        let out_b = run_once(tmp_b.path().to_path_buf()).await;

        assert_eq!(out_a.candidate_ids, out_b.candidate_ids);
        assert_eq!(out_a.summary_hash, out_b.summary_hash);
        assert_eq!(out_a.chosen_candidate_id, out_b.chosen_candidate_id);
    }

    #[tokio::test]
    async fn discover_with_explicit_chem_system_skips_suggest_chemistries() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = WorkflowEngine::new(tmp.path().to_path_buf());
        let client = StubToolClient::new(Prng::new(3.0), 0.8);
        let config = test_config(5);

        let output = engine
            .discover(
                &client,
                DiscoverOptions {
                    objective: "Iterate test".to_string(),
                    chem_system: Some("Li-Fe-P-O".to_string()),
                    seed: 3,
                },
                &config,
            )
            .await
            .unwrap();

        assert_eq!(output.selected_chemistry, "Li-Fe-P-O");
    }

    #[tokio::test]
    async fn iterate_bumps_iteration_and_writes_record() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = WorkflowEngine::new(tmp.path().to_path_buf());
        let config = test_config(5);

        let discover_client = StubToolClient::new(Prng::new(3.0), 0.8);
        let discovered = engine
            .discover(
                &discover_client,
                DiscoverOptions {
                    objective: "Iterate test".to_string(),
                    chem_system: None,
                    seed: 3,
                },
                &config,
            )
            .await
            .unwrap();

        let iterate_client = StubToolClient::new(Prng::new(3.0), 0.8);
        let iterated = engine
            .iterate(
                &iterate_client,
                IterateOptions {
                    run_id: discovered.run_id.clone(),
                },
                &config,
            )
            .await
            .unwrap();

        assert_eq!(iterated.iteration, 1);

        let run_dir = RunDir::new(tmp.path(), &discovered.run_id);
        let manifest = run_dir.read_manifest().unwrap();
        assert_eq!(manifest.iteration, 1);
        assert!(run_dir.path().join("iteration_1.json").is_file());
    }

    #[tokio::test]
    async fn iterate_past_max_iters_is_a_precondition_error_leaving_manifest_unchanged() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = WorkflowEngine::new(tmp.path().to_path_buf());
        let config = test_config(0);

        let discover_client = StubToolClient::new(Prng::new(3.0), 0.8);
        let discovered = engine
            .discover(
                &discover_client,
                DiscoverOptions {
                    objective: "Max iters test".to_string(),
                    chem_system: None,
                    seed: 3,
                },
                &config,
            )
            .await
            .unwrap();

        let run_dir = RunDir::new(tmp.path(), &discovered.run_id);
        let before = run_dir.read_manifest().unwrap();

        let iterate_client = StubToolClient::new(Prng::new(3.0), 0.8);
        let err = engine
            .iterate(
                &iterate_client,
                IterateOptions {
                    run_id: discovered.run_id.clone(),
                },
                &config,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::MaxIterationsReached { .. }));

        let after = run_dir.read_manifest().unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn validate_recomputes_a_summary_matching_discover_hash() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = WorkflowEngine::new(tmp.path().to_path_buf());
        let config = test_config(5);

        let discover_client = StubToolClient::new(Prng::new(1.0), 0.8);
        let discovered = engine
            .discover(
                &discover_client,
                DiscoverOptions {
                    objective: "Discover stable oxide".to_string(),
                    chem_system: None,
                    seed: 1,
                },
                &config,
            )
            .await
            .unwrap();

        let validate_client = StubToolClient::new(Prng::new(1.0), 0.8);
        let validated = engine
            .validate(
                &validate_client,
                ValidateOptions {
                    run_id: discovered.run_id.clone(),
                },
            )
            .await
            .unwrap();

        assert_eq!(validated.summary_hash, discovered.summary_hash);
    }

    #[tokio::test]
    async fn export_writes_poscar_files_in_top_candidate_order() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = WorkflowEngine::new(tmp.path().to_path_buf());
        let config = test_config(5);

        let discover_client = StubToolClient::new(Prng::new(1.0), 0.8);
        let discovered = engine
            .discover(
                &discover_client,
                DiscoverOptions {
                    objective: "Discover stable oxide".to_string(),
                    chem_system: None,
                    seed: 1,
                },
                &config,
            )
            .await
            .unwrap();

        let exported = engine
            .export(ExportOptions {
                run_id: discovered.run_id.clone(),
                format: "poscar".to_string(),
                top_k: 3,
            })
            .await
            .unwrap();

        assert_eq!(exported.exported_candidate_ids.len(), 3);

        let run_dir = RunDir::new(tmp.path(), &discovered.run_id);
        let summary: ValidationSummary = run_dir.read_summary().unwrap();
        let expected: Vec<String> = summary
            .top_candidates
            .iter()
            .take(3)
            .map(|c| c.candidate_id.clone())
            .collect();
        assert_eq!(exported.exported_candidate_ids, expected);

        for id in &exported.exported_candidate_ids {
            let path = run_dir.path().join("exports").join(format!("{id}.poscar"));
            let content = std::fs::read_to_string(path).unwrap();
            assert!(content.starts_with(&format!("# POSCAR placeholder for {id}\n")));
        }
    }

    #[tokio::test]
    async fn export_of_unknown_run_is_run_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let engine = WorkflowEngine::new(tmp.path().to_path_buf());
        let err = engine
            .export(ExportOptions {
                run_id: "run_1_deadbeef".to_string(),
                format: "cif".to_string(),
                top_k: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::RunNotFound(_)));
    }
}
