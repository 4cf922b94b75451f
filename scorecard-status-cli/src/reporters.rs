use anyhow::{Context, Result};
use tracing::{info, warn};

use scorecard_status::{
    CheckRunPhase, CheckRunReporter, CommitStatusReporter, GitHubClient, StatusPhase,
};

use crate::cli::{Outcome, ReporterKind, TargetArgs};

/// The channels selected on the command line, driven together.
pub struct Reporters {
    check_run: Option<CheckRunReporter<GitHubClient>>,
    status: Option<CommitStatusReporter<GitHubClient>>,
}

impl Reporters {
    pub fn new(target: &TargetArgs) -> Self {
        let client = GitHubClient::new(target.token.clone()).with_api_base(&target.api_url);
        if !client.has_token() {
            warn!("no GitHub token provided; reporting will fail");
        }

        let wants_check_run =
            matches!(target.reporter, ReporterKind::CheckRun | ReporterKind::Both);
        let wants_status = matches!(target.reporter, ReporterKind::Status | ReporterKind::Both);

        let check_run = wants_check_run.then(|| {
            let reporter = CheckRunReporter::new(client.clone());
            match &target.details_url {
                Some(url) => reporter.with_details_url(url),
                None => reporter,
            }
        });
        let status = wants_status.then(|| {
            let reporter = CommitStatusReporter::new(client.clone());
            match &target.details_url {
                Some(url) => reporter.with_target_url(url),
                None => reporter,
            }
        });

        Self { check_run, status }
    }

    /// Set up every channel. If any step fails, channels that were already
    /// created are completed as failures so none is left pending on GitHub.
    pub async fn start(&mut self, target: &TargetArgs) -> Result<()> {
        let Err(e) = self.try_start(target).await else {
            return Ok(());
        };

        if let Err(cleanup) = self.finish(Outcome::Failure).await {
            let detail = format!("{cleanup:#}");
            warn!(error = %detail, "failed to close channels after setup failure");
        }
        Err(e)
    }

    async fn try_start(&mut self, target: &TargetArgs) -> Result<()> {
        if let Some(check_run) = &mut self.check_run {
            check_run
                .setup(&target.commit, target.repository.clone())
                .await
                .context("check run setup failed")?;
            check_run.start().await.context("check run start failed")?;
        }
        if let Some(status) = &mut self.status {
            status
                .setup_and_start(&target.commit, target.repository.clone())
                .await
                .context("commit status setup failed")?;
        }
        Ok(())
    }

    /// Complete every channel that was set up, even when an earlier one fails.
    pub async fn finish(&mut self, outcome: Outcome) -> Result<()> {
        info!(?outcome, "reporting outcome");
        let mut first_error = None;

        if let Some(check_run) = self
            .check_run
            .as_mut()
            .filter(|r| *r.phase() != CheckRunPhase::Uninitialized)
        {
            let result = match outcome {
                Outcome::Success => check_run.success().await,
                Outcome::Failure => check_run.fail().await,
            };
            if let Err(e) = result {
                warn!(error = %e, "failed to complete check run");
                first_error = Some(anyhow::Error::from(e).context("check run completion failed"));
            }
        }

        if let Some(status) = self
            .status
            .as_mut()
            .filter(|r| *r.phase() != StatusPhase::Uninitialized)
        {
            let result = match outcome {
                Outcome::Success => status.success().await,
                Outcome::Failure => status.fail().await,
            };
            if let Err(e) = result {
                warn!(error = %e, "failed to post commit status");
                if first_error.is_none() {
                    first_error =
                        Some(anyhow::Error::from(e).context("commit status completion failed"));
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}
