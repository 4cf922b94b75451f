use std::path::PathBuf;

use thiserror::Error;

/// Failures of the check-run and commit-status reporters.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("commit SHA must not be empty")]
    EmptyCommit,
    #[error("{operation} called before setup")]
    NotSetUp { operation: &'static str },
    #[error("cannot {operation} a {kind} that is {phase}")]
    InvalidTransition {
        operation: &'static str,
        kind: &'static str,
        phase: &'static str,
    },
    #[error("failed to create {kind}")]
    Creation {
        kind: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to update {kind}")]
    Update {
        kind: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

/// Failures loading a policy document.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("couldn't read policy file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("couldn't parse policy")]
    Parse(#[from] serde_yaml::Error),
}
