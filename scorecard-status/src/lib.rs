//! Report the outcome of a repository scan back to GitHub.
//!
//! Two independent channels are supported: a check run ([`CheckRunReporter`])
//! and a legacy commit status ([`CommitStatusReporter`]). An optional policy
//! document with per-check score thresholds is read by [`policy`].

pub mod check_run;
pub mod commit_status;
pub mod error;
pub mod github;
pub mod policy;
pub mod repository;

#[cfg(test)]
mod testing;

use chrono::{DateTime, Utc};

pub use check_run::{CheckRunPhase, CheckRunReporter, RunHandle};
pub use commit_status::{CommitStatusReporter, StatusPhase, StatusTrail};
pub use error::{PolicyError, ReportError};
pub use github::GitHubClient;
pub use policy::{Criterion, Policy, PolicyResult};
pub use repository::Repository;

/// Name of the check run and context label of the commit status.
pub const ACTION_IDENTIFIER: &str = "scorecard-action";

/// Source of timestamps for the remote objects.
pub type Clock = fn() -> DateTime<Utc>;
