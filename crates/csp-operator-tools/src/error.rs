//! Error types for the operator tool set.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OperatorToolError {
    #[error("shell command failed to launch: {0}")]
    ShellLaunch(String),

    #[error("memory key not found: {0}")]
    MemoryKeyNotFound(String),

    #[error("research index root does not exist: {0}")]
    IndexRootNotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OperatorToolError>;
