//! Command-line dispatcher for the CSP orchestrator.
//!
//! Four subcommands, each a thin wrapper over `csp_core::workflow::WorkflowEngine`:
//! `csp:discover`, `csp:iterate`, `csp:validate`, `csp:export`. Output
//! discipline is strict: exactly one line of JSON on stdout, `status: "ok"`
//! (with command-specific fields) on success or `status: "error"` with an
//! `error` message on failure, exit code 0 or 1, never a panic.
//!
//! Forwarding of non-CSP argv to an external host CLI is a documented seam,
//! not built here: the target host CLI is unspecified.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing::Level;

use csp_core::config::{self, CliOverrides};
use csp_core::metrics::METRICS;
use csp_core::tools::{RealToolClient, StubToolClient, ToolClient};
use csp_core::workflow::{
    DiscoverOptions, ExportOptions, IterateOptions, ValidateOptions, WorkflowEngine,
};
use csp_core::{obs, telemetry, Prng};

#[derive(Parser)]
#[command(name = "csp")]
#[command(author = "Claude Flow CSP Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Deterministic closed-loop orchestrator for crystal structure prediction")]
struct Cli {
    /// Enable verbose (debug-level) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit newline-delimited JSON log lines instead of human-readable text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(name = "csp:discover")]
    Discover {
        #[arg(long)]
        objective: String,

        #[arg(long)]
        chem_system: Option<String>,

        #[arg(long)]
        workspace: PathBuf,

        #[arg(long, default_value_t = 1)]
        seed: u64,

        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        dry_run: bool,

        #[arg(long)]
        solver: Option<String>,

        #[arg(long)]
        max_iters: Option<u32>,
    },

    #[command(name = "csp:iterate")]
    Iterate {
        #[arg(long)]
        run_id: String,

        #[arg(long)]
        workspace: PathBuf,

        #[arg(long, default_value_t = 1)]
        seed: u64,

        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        dry_run: bool,
    },

    #[command(name = "csp:validate")]
    Validate {
        #[arg(long)]
        run_id: String,

        #[arg(long)]
        workspace: PathBuf,

        #[arg(long)]
        top_k: Option<usize>,

        #[arg(long, default_value_t = 1)]
        seed: u64,

        #[arg(long)]
        dry_run: bool,
    },

    #[command(name = "csp:export")]
    Export {
        #[arg(long)]
        run_id: String,

        #[arg(long)]
        workspace: PathBuf,

        #[arg(long, default_value = "cif")]
        format: String,

        #[arg(long, default_value_t = 5)]
        top_k: usize,
    },
}

fn tool_client(dry_run: bool, seed: u64, truth_accept_threshold: f64) -> Box<dyn ToolClient> {
    if dry_run {
        Box::new(StubToolClient::new(Prng::new(seed as f64), truth_accept_threshold))
    } else {
        Box::new(RealToolClient::new("https://tools.claude-flow-csp.dev"))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    telemetry::init_tracing(cli.json, level);

    let outcome = match cli.command {
        Commands::Discover {
            objective,
            chem_system,
            workspace,
            seed,
            config,
            dry_run,
            solver,
            max_iters,
        } => cmd_discover(objective, chem_system, workspace, seed, config, dry_run, solver, max_iters).await,
        Commands::Iterate {
            run_id,
            workspace,
            seed,
            config,
            dry_run,
        } => cmd_iterate(run_id, workspace, seed, config, dry_run).await,
        Commands::Validate {
            run_id,
            workspace,
            top_k,
            seed,
            dry_run,
        } => cmd_validate(run_id, workspace, top_k, seed, dry_run).await,
        Commands::Export {
            run_id,
            workspace,
            format,
            top_k,
        } => cmd_export(run_id, workspace, format, top_k).await,
    };

    METRICS.flush();

    let exit_code = match outcome {
        Ok(value) => {
            println!("{value}");
            0
        }
        Err(err) => {
            println!("{}", json!({ "status": "error", "error": format!("{err:#}") }));
            1
        }
    };
    std::process::exit(exit_code);
}

#[allow(clippy::too_many_arguments)]
async fn cmd_discover(
    objective: String,
    chem_system: Option<String>,
    workspace: PathBuf,
    seed: u64,
    config_path: Option<PathBuf>,
    dry_run: bool,
    solver: Option<String>,
    max_iters: Option<u32>,
) -> Result<Value> {
    let overrides = CliOverrides {
        workspace: Some(workspace.to_string_lossy().into_owned()),
        solver,
        max_iters,
    };
    let resolved = config::resolve(config_path.as_deref(), &overrides)
        .context("failed to resolve configuration")?;
    let client = tool_client(dry_run, seed, resolved.policy.truth_accept_threshold);
    let engine = WorkflowEngine::new(PathBuf::from(&resolved.workspace));

    let out = engine
        .discover(
            client.as_ref(),
            DiscoverOptions {
                objective,
                chem_system,
                seed,
            },
            &resolved,
        )
        .await
        .context("discover failed")?;

    obs::emit_run_finished(&out.run_id, &out.status, out.iteration);
    Ok(serde_json::to_value(out).expect("DiscoverOutput always serializes"))
}

async fn cmd_iterate(
    run_id: String,
    workspace: PathBuf,
    seed: u64,
    config_path: Option<PathBuf>,
    dry_run: bool,
) -> Result<Value> {
    let overrides = CliOverrides {
        workspace: Some(workspace.to_string_lossy().into_owned()),
        solver: None,
        max_iters: None,
    };
    let resolved = config::resolve(config_path.as_deref(), &overrides)
        .context("failed to resolve configuration")?;
    let client = tool_client(dry_run, seed, resolved.policy.truth_accept_threshold);
    let engine = WorkflowEngine::new(PathBuf::from(&resolved.workspace));

    let out = engine
        .iterate(client.as_ref(), IterateOptions { run_id }, &resolved)
        .await
        .context("iterate failed")?;

    obs::emit_run_finished(&out.run_id, &out.status, out.iteration);
    Ok(serde_json::to_value(out).expect("IterateOutput always serializes"))
}

async fn cmd_validate(
    run_id: String,
    workspace: PathBuf,
    top_k: Option<usize>,
    seed: u64,
    dry_run: bool,
) -> Result<Value> {
    let _ = top_k;
    let overrides = CliOverrides {
        workspace: Some(workspace.to_string_lossy().into_owned()),
        solver: None,
        max_iters: None,
    };
    let resolved =
        config::resolve(None, &overrides).context("failed to resolve configuration")?;
    let client = tool_client(dry_run, seed, resolved.policy.truth_accept_threshold);
    let engine = WorkflowEngine::new(PathBuf::from(&resolved.workspace));

    let out = engine
        .validate(client.as_ref(), ValidateOptions { run_id })
        .await
        .context("validate failed")?;

    Ok(serde_json::to_value(out).expect("ValidateOutput always serializes"))
}

async fn cmd_export(run_id: String, workspace: PathBuf, format: String, top_k: usize) -> Result<Value> {
    let engine = WorkflowEngine::new(workspace);

    let out = engine
        .export(ExportOptions { run_id, format, top_k })
        .await
        .context("export failed")?;

    Ok(serde_json::to_value(out).expect("ExportOutput always serializes"))
}
