//! Recording in-memory GitHub double for reporter tests.

use std::sync::Mutex;

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::github::{
    CheckRunStatus, ChecksApi, CreateCheckRun, CreateStatus, RemoteCheckRun, RemoteCommitStatus,
    StatusesApi, UpdateCheckRun,
};
use crate::repository::Repository;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateCheckRun(Repository, CreateCheckRun),
    UpdateCheckRun(Repository, u64, UpdateCheckRun),
    CreateStatus(Repository, String, CreateStatus),
}

#[derive(Default)]
pub struct RecordingApi {
    calls: Mutex<Vec<Call>>,
    fail_from: Option<usize>,
}

impl RecordingApi {
    /// Every call fails.
    pub fn failing() -> Self {
        Self::failing_after(0)
    }

    /// The first `n` calls succeed, every later one fails.
    pub fn failing_after(n: usize) -> Self {
        Self {
            calls: Mutex::new(vec![]),
            fail_from: Some(n),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> Result<u64> {
        let mut calls = self.calls.lock().unwrap();
        let index = calls.len();
        calls.push(call);
        if self.fail_from.is_some_and(|n| index >= n) {
            bail!("HTTP 502 Bad Gateway");
        }
        Ok(100 + calls.len() as u64)
    }
}

#[async_trait]
impl ChecksApi for RecordingApi {
    async fn create_check_run(
        &self,
        repo: &Repository,
        request: &CreateCheckRun,
    ) -> Result<RemoteCheckRun> {
        self.record(Call::CreateCheckRun(repo.clone(), request.clone()))?;
        Ok(RemoteCheckRun {
            id: 7,
            head_sha: request.head_sha.clone(),
            status: wire_name(request.status),
            conclusion: None,
            started_at: Some(request.started_at),
            completed_at: None,
        })
    }

    async fn update_check_run(
        &self,
        repo: &Repository,
        id: u64,
        request: &UpdateCheckRun,
    ) -> Result<RemoteCheckRun> {
        self.record(Call::UpdateCheckRun(repo.clone(), id, request.clone()))?;
        Ok(RemoteCheckRun {
            id,
            head_sha: String::new(),
            status: wire_name(request.status.unwrap_or(CheckRunStatus::Queued)),
            conclusion: request.conclusion.map(wire_name),
            started_at: None,
            completed_at: request.completed_at,
        })
    }
}

#[async_trait]
impl StatusesApi for RecordingApi {
    async fn create_status(
        &self,
        repo: &Repository,
        sha: &str,
        request: &CreateStatus,
    ) -> Result<RemoteCommitStatus> {
        let id = self.record(Call::CreateStatus(repo.clone(), sha.to_string(), request.clone()))?;
        Ok(RemoteCommitStatus {
            id,
            state: request.state,
            context: request.context.clone(),
            created_at: Some(fixed_now()),
            updated_at: Some(fixed_now()),
        })
    }
}

/// The string GitHub uses for an enum value, e.g. `in_progress`.
fn wire_name(value: impl Serialize) -> String {
    serde_json::to_value(value).unwrap().as_str().unwrap().to_string()
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub fn repo() -> Repository {
    "ossf/scorecard".parse().unwrap()
}

pub const SHA: &str = "b4ffde65f46336ab88eb53be808477a3936bae11";
