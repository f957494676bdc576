//! Domain-level error taxonomy for the CSP orchestrator.

/// Errors surfaced by the workflow engine, tool client, artifact store, and
/// config resolver. The CLI layer maps every variant to `{status: "error",
/// error: <message>}` plus exit code 1.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("run not found: {0}")]
    RunNotFound(String),

    #[error("tool call failed: {tool_name}: {message}")]
    ToolFailure { tool_name: String, message: String },

    #[error("malformed tool output from {tool_name}: {message}")]
    MalformedToolOutput { tool_name: String, message: String },

    #[error("max iterations reached: iteration {next} exceeds max_iters {max_iters}")]
    MaxIterationsReached { next: u32, max_iters: u32 },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WorkflowError>;
