//! Append-only run event log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One line of `events.jsonl`. Tagged by `event`, carrying `timestamp` plus
/// whatever fields are relevant to that event kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    RunStarted {
        objective: String,
        seed: u64,
    },
    RunManifest {
        status: super::manifest::RunStatus,
        iteration: u32,
    },
    ToolCallStarted {
        tool_name: String,
    },
    ToolCallSucceeded {
        tool_name: String,
    },
    ToolCallFailed {
        tool_name: String,
        message: String,
    },
    IterationDecided {
        iteration: u32,
        mode: super::constraints::Mode,
        action: String,
    },
    RunCompleted {
        status: super::manifest::RunStatus,
        selected_candidate_id: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    pub fn new(timestamp: DateTime<Utc>, kind: EventKind) -> Self {
        Self { timestamp, kind }
    }

    /// Renders as the single JSON line that gets appended to `events.jsonl`.
    pub fn to_jsonl_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
