use tracing::{debug, info, instrument, warn};

use crate::error::ReportError;
use crate::github::{CreateStatus, StatusState, StatusesApi};
use crate::repository::Repository;
use crate::ACTION_IDENTIFIER;

const KIND: &str = "commit status";

/// The records this reporter has appended to one commit under its context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTrail {
    pub repository: Repository,
    pub sha: String,
    /// Id of the `pending` record posted by setup.
    pub pending_id: u64,
    /// Id of the most recently appended record.
    pub latest_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusPhase {
    Uninitialized,
    Pending(StatusTrail),
    Completed(StatusTrail, StatusState),
}

impl StatusPhase {
    pub fn name(&self) -> &'static str {
        match self {
            StatusPhase::Uninitialized => "uninitialized",
            StatusPhase::Pending(_) => "pending",
            StatusPhase::Completed(..) => "completed",
        }
    }

    pub fn trail(&self) -> Option<&StatusTrail> {
        match self {
            StatusPhase::Uninitialized => None,
            StatusPhase::Pending(t) | StatusPhase::Completed(t, _) => Some(t),
        }
    }
}

/// Posts a `pending -> success|failure` trail of commit statuses.
///
/// GitHub's status API is append-only: [`fail`](Self::fail) and
/// [`success`](Self::success) never modify the pending record, they append a
/// new one under the same context. Consumers see the most recent record for
/// the `(commit, context)` pair as the current status.
pub struct CommitStatusReporter<A> {
    api: A,
    target_url: Option<String>,
    phase: StatusPhase,
}

impl<A: StatusesApi> CommitStatusReporter<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            target_url: None,
            phase: StatusPhase::Uninitialized,
        }
    }

    /// Link shown by GitHub next to each status record.
    pub fn with_target_url(mut self, url: impl Into<String>) -> Self {
        self.target_url = Some(url.into());
        self
    }

    pub fn phase(&self) -> &StatusPhase {
        &self.phase
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Append the initial `pending` record.
    #[instrument(skip(self), fields(repo = %repository))]
    pub async fn setup_and_start(
        &mut self,
        commit: &str,
        repository: Repository,
    ) -> Result<StatusTrail, ReportError> {
        if self.phase != StatusPhase::Uninitialized {
            return Err(ReportError::InvalidTransition {
                operation: "set up",
                kind: KIND,
                phase: self.phase.name(),
            });
        }
        if commit.is_empty() {
            return Err(ReportError::EmptyCommit);
        }

        let status = self
            .api
            .create_status(&repository, commit, &self.request(StatusState::Pending))
            .await
            .map_err(|source| ReportError::Creation { kind: KIND, source })?;

        info!(id = status.id, "pending commit status posted");
        let trail = StatusTrail {
            repository,
            sha: commit.to_string(),
            pending_id: status.id,
            latest_id: status.id,
        };
        self.phase = StatusPhase::Pending(trail.clone());
        Ok(trail)
    }

    /// Append a `failure` record.
    pub async fn fail(&mut self) -> Result<(), ReportError> {
        self.append(StatusState::Failure, "fail").await
    }

    /// Append a `success` record.
    pub async fn success(&mut self) -> Result<(), ReportError> {
        self.append(StatusState::Success, "success").await
    }

    #[instrument(skip(self), fields(%state))]
    async fn append(
        &mut self,
        state: StatusState,
        operation: &'static str,
    ) -> Result<(), ReportError> {
        let mut trail = match &self.phase {
            StatusPhase::Uninitialized => return Err(ReportError::NotSetUp { operation }),
            StatusPhase::Pending(t) => t.clone(),
            StatusPhase::Completed(t, previous) => {
                warn!(latest_id = t.latest_id, %previous, "commit status already completed");
                t.clone()
            }
        };

        debug!(
            supersedes = trail.latest_id,
            pending_id = trail.pending_id,
            "appending commit status"
        );
        let status = self
            .api
            .create_status(&trail.repository, &trail.sha, &self.request(state))
            .await
            .map_err(|source| ReportError::Update { kind: KIND, source })?;

        info!(id = status.id, "commit status posted");
        trail.latest_id = status.id;
        self.phase = StatusPhase::Completed(trail, state);
        Ok(())
    }

    fn request(&self, state: StatusState) -> CreateStatus {
        CreateStatus {
            state,
            context: ACTION_IDENTIFIER.to_string(),
            target_url: self.target_url.clone(),
        }
    }
}
