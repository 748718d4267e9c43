//! Migration Status Tracker and the background runner for one-off data migrations.
//!
//! At most one migration runs per process. The tracker is an injected handle (held in
//! `AppState`), not a global: every state change goes through a single
//! `watch::Sender::send_if_modified` call, which checks and writes under the channel's lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::watch;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::repository::{RepoError, RepositoryState};

/// MigrationState
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum MigrationState {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

/// MigrationStatus
///
/// Snapshot of the tracker. Absent fields are omitted, so a fresh tracker serializes to
/// `{"status":"idle"}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MigrationStatus {
    pub status: MigrationState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Job-specific summary of a completed run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "unknown")]
    #[schema(value_type = Object)]
    pub results: Option<Value>,
    /// Failure detail of a failed run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    #[error("a migration is already running")]
    AlreadyRunning,
    #[error("no migration is running")]
    NotRunning,
    #[error("migration rollback is not implemented")]
    RollbackUnsupported,
}

/// MigrationTracker
///
/// Cloneable handle to the process-wide migration status. Clones share one state.
#[derive(Clone)]
pub struct MigrationTracker {
    state: Arc<watch::Sender<MigrationStatus>>,
}

impl Default for MigrationTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl MigrationTracker {
    pub fn new() -> Self {
        let (state, _) = watch::channel(MigrationStatus::default());
        Self {
            state: Arc::new(state),
        }
    }

    /// Current status. Never blocks on a running job and never mutates.
    pub fn status(&self) -> MigrationStatus {
        self.state.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().status == MigrationState::Running
    }

    /// Receiver that observes every transition.
    pub fn subscribe(&self) -> watch::Receiver<MigrationStatus> {
        self.state.subscribe()
    }

    /// Applies `change` atomically. The state is only written (and watchers notified) when
    /// `change` accepts the transition.
    fn transition<F>(&self, change: F) -> Result<MigrationStatus, TrackerError>
    where
        F: FnOnce(&mut MigrationStatus) -> Result<(), TrackerError>,
    {
        let mut outcome = Err(TrackerError::NotRunning);
        self.state.send_if_modified(|status| match change(status) {
            Ok(()) => {
                outcome = Ok(status.clone());
                true
            }
            Err(e) => {
                outcome = Err(e);
                false
            }
        });
        outcome
    }

    /// idle | completed | failed -> running. Previous results and errors are cleared.
    pub fn try_start(&self) -> Result<MigrationStatus, TrackerError> {
        self.transition(|status| {
            if status.status == MigrationState::Running {
                return Err(TrackerError::AlreadyRunning);
            }
            *status = MigrationStatus {
                status: MigrationState::Running,
                started_at: Some(Utc::now()),
                ..MigrationStatus::default()
            };
            Ok(())
        })
    }

    /// running -> completed.
    pub fn complete(&self, results: Value) -> Result<MigrationStatus, TrackerError> {
        self.transition(|status| {
            if status.status != MigrationState::Running {
                return Err(TrackerError::NotRunning);
            }
            status.status = MigrationState::Completed;
            status.finished_at = Some(Utc::now());
            status.results = Some(results);
            Ok(())
        })
    }

    /// running -> failed.
    pub fn fail(&self, detail: impl Into<String>) -> Result<MigrationStatus, TrackerError> {
        let detail = detail.into();
        self.transition(|status| {
            if status.status != MigrationState::Running {
                return Err(TrackerError::NotRunning);
            }
            status.status = MigrationState::Failed;
            status.finished_at = Some(Utc::now());
            status.error = Some(detail);
            Ok(())
        })
    }

    /// Back to idle from any settled state.
    pub fn reset(&self) -> Result<MigrationStatus, TrackerError> {
        self.transition(|status| {
            if status.status == MigrationState::Running {
                return Err(TrackerError::AlreadyRunning);
            }
            *status = MigrationStatus::default();
            Ok(())
        })
    }

    /// Rollback of applied migrations is not supported; the state is left untouched.
    pub fn rollback(&self) -> Result<MigrationStatus, TrackerError> {
        Err(TrackerError::RollbackUnsupported)
    }
}

/// MigrationJob
///
/// A one-off data migration. `run` returns the JSON summary stored as the run's `results`.
#[async_trait]
pub trait MigrationJob: Send + Sync {
    fn name(&self) -> &'static str;
    async fn run(&self) -> Result<Value, RepoError>;
}

/// NormalizeLeadEmails
///
/// Lower-cases and trims every stored lead e-mail address.
pub struct NormalizeLeadEmails {
    repo: RepositoryState,
}

impl NormalizeLeadEmails {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl MigrationJob for NormalizeLeadEmails {
    fn name(&self) -> &'static str {
        "normalize-lead-emails"
    }

    async fn run(&self) -> Result<Value, RepoError> {
        let updated = self.repo.normalize_lead_emails().await?;
        Ok(json!({ "job": self.name(), "leadsUpdated": updated }))
    }
}

/// start_migration
///
/// Marks the tracker as running and spawns `job` in the background. Returns the `running`
/// snapshot immediately, or `AlreadyRunning` without spawning anything.
///
/// The job runs in its own task so that a panic surfaces as a `JoinError` and is recorded as
/// a failure instead of leaving the tracker stuck in `running`.
pub fn start_migration(
    tracker: &MigrationTracker,
    job: Arc<dyn MigrationJob>,
) -> Result<MigrationStatus, TrackerError> {
    let started = tracker.try_start()?;
    let name = job.name();
    tracing::info!(job = name, "migration started");

    let tracker = tracker.clone();
    tokio::spawn(async move {
        let outcome = tokio::spawn(async move { job.run().await }).await;

        let settled = match outcome {
            Ok(Ok(results)) => {
                tracing::info!(job = name, results = %results, "migration completed");
                tracker.complete(results)
            }
            Ok(Err(e)) => {
                tracing::error!(job = name, error = %e, "migration failed");
                tracker.fail(e.to_string())
            }
            Err(join_err) => {
                tracing::error!(job = name, error = %join_err, "migration task aborted");
                tracker.fail(format!("migration task aborted: {}", join_err))
            }
        };

        if let Err(e) = settled {
            tracing::warn!(job = name, error = %e, "could not record migration outcome");
        }
    });

    Ok(started)
}
