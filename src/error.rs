//! Error taxonomy for sandbox operations.
//!
//! Every failure is terminal for the current command: the pipeline does not
//! retry, and already-completed artifacts are left in place for the next run.

use std::fmt;
use thiserror::Error;

/// Which artifact a build invocation was producing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildTarget {
    Kernel,
    Rootfs,
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kernel => write!(f, "kernel"),
            Self::Rootfs => write!(f, "rootfs"),
        }
    }
}

/// Errors surfaced by the sandbox pipeline and its collaborators.
#[derive(Debug, Error)]
pub enum Error {
    #[error("sandbox '{0}' already exists")]
    AlreadyExists(String),

    #[error("no such sandbox '{0}'")]
    NoSuchSandbox(String),

    #[error("sandbox spec is missing required field '{0}'")]
    MissingRequiredField(&'static str),

    #[error("invalid sandbox spec at {path}: {reason}")]
    SpecInvalid { path: String, reason: String },

    #[error("failed to fetch {kind} source: {reason}")]
    FetchFailed {
        kind: crate::fetch::SourceKind,
        reason: String,
    },

    #[error("kernel config rejected by '{pass}': {reason}")]
    ConfigConflict { pass: &'static str, reason: String },

    #[error("{target} build failed (exit status {status})")]
    BuildFailed { target: BuildTarget, status: i32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
