use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::error::ReportError;
use crate::github::{CheckRunStatus, ChecksApi, Conclusion, CreateCheckRun, UpdateCheckRun};
use crate::repository::Repository;
use crate::{ACTION_IDENTIFIER, Clock};

const KIND: &str = "check run";

/// Identifies the remote check run created by [`CheckRunReporter::setup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHandle {
    pub repository: Repository,
    pub head_sha: String,
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckRunPhase {
    Uninitialized,
    Created(RunHandle),
    InProgress(RunHandle),
    Completed(RunHandle, Conclusion),
}

impl CheckRunPhase {
    pub fn name(&self) -> &'static str {
        match self {
            CheckRunPhase::Uninitialized => "uninitialized",
            CheckRunPhase::Created(_) => "created",
            CheckRunPhase::InProgress(_) => "in progress",
            CheckRunPhase::Completed(..) => "completed",
        }
    }

    pub fn handle(&self) -> Option<&RunHandle> {
        match self {
            CheckRunPhase::Uninitialized => None,
            CheckRunPhase::Created(h)
            | CheckRunPhase::InProgress(h)
            | CheckRunPhase::Completed(h, _) => Some(h),
        }
    }
}

/// Owns the lifecycle of one check run on one commit:
/// `queued -> in_progress -> completed(success|failure)`.
///
/// Every transition is a single synchronous round trip; nothing is retried.
/// The reporter is not meant to be shared between tasks.
pub struct CheckRunReporter<A> {
    api: A,
    clock: Clock,
    details_url: Option<String>,
    phase: CheckRunPhase,
}

impl<A: ChecksApi> CheckRunReporter<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            clock: Utc::now,
            details_url: None,
            phase: CheckRunPhase::Uninitialized,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Link shown by GitHub next to the check run.
    pub fn with_details_url(mut self, url: impl Into<String>) -> Self {
        self.details_url = Some(url.into());
        self
    }

    pub fn phase(&self) -> &CheckRunPhase {
        &self.phase
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Create the check run in the `queued` state.
    #[instrument(skip(self), fields(repo = %repository))]
    pub async fn setup(
        &mut self,
        commit: &str,
        repository: Repository,
    ) -> Result<RunHandle, ReportError> {
        if self.phase != CheckRunPhase::Uninitialized {
            return Err(ReportError::InvalidTransition {
                operation: "set up",
                kind: KIND,
                phase: self.phase.name(),
            });
        }
        if commit.is_empty() {
            return Err(ReportError::EmptyCommit);
        }

        let request = CreateCheckRun {
            name: ACTION_IDENTIFIER.to_string(),
            head_sha: commit.to_string(),
            status: CheckRunStatus::Queued,
            started_at: (self.clock)(),
            details_url: self.details_url.clone(),
        };
        let run = self
            .api
            .create_check_run(&repository, &request)
            .await
            .map_err(|source| ReportError::Creation { kind: KIND, source })?;

        info!(id = run.id, "check run created");
        let handle = RunHandle {
            repository,
            head_sha: request.head_sha,
            id: run.id,
        };
        self.phase = CheckRunPhase::Created(handle.clone());
        Ok(handle)
    }

    /// Mark the check run `in_progress`. Calling it again re-posts the status.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> Result<(), ReportError> {
        let handle = match &self.phase {
            CheckRunPhase::Uninitialized => {
                return Err(ReportError::NotSetUp { operation: "start" });
            }
            CheckRunPhase::Created(h) | CheckRunPhase::InProgress(h) => h.clone(),
            CheckRunPhase::Completed(..) => {
                return Err(ReportError::InvalidTransition {
                    operation: "start",
                    kind: KIND,
                    phase: self.phase.name(),
                });
            }
        };

        let request = UpdateCheckRun {
            status: Some(CheckRunStatus::InProgress),
            ..Default::default()
        };
        self.update(&handle, &request).await?;

        info!(id = handle.id, "check run in progress");
        self.phase = CheckRunPhase::InProgress(handle);
        Ok(())
    }

    pub async fn fail(&mut self) -> Result<(), ReportError> {
        self.complete(Conclusion::Failure, "fail").await
    }

    pub async fn success(&mut self) -> Result<(), ReportError> {
        self.complete(Conclusion::Success, "success").await
    }

    #[instrument(skip(self), fields(%conclusion))]
    async fn complete(
        &mut self,
        conclusion: Conclusion,
        operation: &'static str,
    ) -> Result<(), ReportError> {
        let handle = match &self.phase {
            CheckRunPhase::Uninitialized => return Err(ReportError::NotSetUp { operation }),
            CheckRunPhase::Created(h) | CheckRunPhase::InProgress(h) => h.clone(),
            CheckRunPhase::Completed(h, previous) => {
                // Not rejected: GitHub keeps whichever conclusion arrives last.
                warn!(id = h.id, %previous, "check run already completed");
                h.clone()
            }
        };

        let request = UpdateCheckRun {
            status: Some(CheckRunStatus::Completed),
            conclusion: Some(conclusion),
            completed_at: Some((self.clock)()),
        };
        self.update(&handle, &request).await?;

        info!(id = handle.id, "check run completed");
        self.phase = CheckRunPhase::Completed(handle, conclusion);
        Ok(())
    }

    async fn update(
        &self,
        handle: &RunHandle,
        request: &UpdateCheckRun,
    ) -> Result<(), ReportError> {
        self.api
            .update_check_run(&handle.repository, handle.id, request)
            .await
            .map(|_| ())
            .map_err(|source| ReportError::Update { kind: KIND, source })
    }
}
