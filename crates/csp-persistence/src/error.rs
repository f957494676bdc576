//! Error type for the persistence status probe.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("unsupported persistence backend: {0}")]
    UnsupportedBackend(String),
}
