//! Deterministic closed-loop orchestration core for crystal structure
//! prediction: a PRNG-driven tool client seam, an append-only run-directory
//! artifact store, and the workflow engine that sequences them into
//! discover/iterate/validate/export.

pub mod aggregator;
pub mod artifacts;
pub mod canon;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod obs;
pub mod policy;
pub mod prng;
pub mod telemetry;
pub mod tools;
pub mod workflow;

pub use artifacts::RunDir;
pub use config::{CliOverrides, Config, PolicyConfig};
pub use domain::{
    is_valid_candidate_id, Adjustment, Candidate, CheckName, ChemistryPriors, ChemistrySuggestion,
    ConstraintsSpec, Event, EventKind, LatticePrior, Mode, Result, RunManifest, RunStatus,
    Severity, TopCandidate, ValidationCheck, ValidationReport, ValidationSummary, WorkflowError,
};
pub use policy::Decision;
pub use prng::Prng;
pub use tools::{RealToolClient, StubToolClient, ToolClient, ToolError};
pub use workflow::{
    derive_run_id, DiscoverOptions, DiscoverOutput, ExportOptions, ExportOutput, IterateOptions,
    IterateOutput, ValidateOptions, ValidateOutput, WorkflowEngine,
};
