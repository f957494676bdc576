//! Secondary runtime tool set for the CSP orchestrator: present in the repo
//! as operator tooling, never called by `csp-core`'s workflow engine, which
//! reaches external collaborators exclusively through `ToolClient`.

pub mod error;
pub mod memory;
pub mod research_index;
pub mod shell;

pub use error::{OperatorToolError, Result};
pub use memory::{MemoryConflict, MemoryDelta, MemoryEntry, MemoryStore};
pub use research_index::{ResearchIndex, SearchHit};
pub use shell::{run as run_shell, ShellOutput};
