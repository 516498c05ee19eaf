// Pause/resume store for runs parked at the approval gate.
//
// Each pending run is written to its own record, keyed by the source file
// it covers, so concurrent runs never clobber each other's state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

use crate::workflows::state::{RunState, RunStatus};

/// Current on-disk record format.
pub const RECORD_VERSION: u32 = 1;

/// Errors that can occur during state persistence operations
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unsupported pending record version {found} (expected {expected})")]
    VersionMismatch { expected: u32, found: u32 },
}

#[derive(Debug, Error)]
pub enum ResumeError {
    #[error("This workflow is not awaiting approval (status: {status})")]
    NotAwaitingApproval { status: RunStatus },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Self-describing snapshot of a suspended run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingRecord {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub state: RunState,
}

impl PendingRecord {
    pub fn new(state: RunState) -> Self {
        Self {
            version: RECORD_VERSION,
            saved_at: Utc::now(),
            state,
        }
    }
}

/// Trait for pending-state persistence operations
#[async_trait]
pub trait PendingStore: Send + Sync {
    /// Persist a run awaiting approval; returns where it was written.
    async fn save(&self, state: &RunState) -> Result<PathBuf, PersistenceError>;

    /// Load a record previously written by `save`.
    async fn load(&self, path: &Path) -> Result<PendingRecord, PersistenceError>;

    /// Remove a record once its run no longer needs it.
    async fn remove(&self, path: &Path) -> Result<(), PersistenceError>;

    /// Location of the record for a given source file.
    fn record_path(&self, file_path: &str) -> PathBuf;
}

/// File system implementation of the pending store
#[derive(Debug, Clone)]
pub struct FileSystemPendingStore {
    directory: PathBuf,
}

impl FileSystemPendingStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

/// Deterministic record file name for a source file path.
pub fn record_file_name(file_path: &str) -> String {
    let key: String = file_path
        .trim_start_matches(['/', '\\'])
        .replace(['/', '\\'], "__")
        .chars()
        .map(|c| if c == ':' { '_' } else { c })
        .collect();
    format!("pending_state_{key}.json")
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> PersistenceError + '_ {
    move |source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[async_trait]
impl PendingStore for FileSystemPendingStore {
    async fn save(&self, state: &RunState) -> Result<PathBuf, PersistenceError> {
        fs::create_dir_all(&self.directory)
            .await
            .map_err(io_error(&self.directory))?;

        let path = self.record_path(&state.file_path);
        let record = PendingRecord::new(state.clone());
        let json = serde_json::to_string_pretty(&record)?;

        // Write then rename so a crash never leaves a torn record behind
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).await.map_err(io_error(&tmp))?;
        fs::rename(&tmp, &path).await.map_err(io_error(&path))?;

        info!(file = %state.file_path, record = %path.display(), "Pending state saved");
        Ok(path)
    }

    async fn load(&self, path: &Path) -> Result<PendingRecord, PersistenceError> {
        let content = fs::read_to_string(path).await.map_err(io_error(path))?;
        let record: PendingRecord = serde_json::from_str(&content)?;
        if record.version != RECORD_VERSION {
            return Err(PersistenceError::VersionMismatch {
                expected: RECORD_VERSION,
                found: record.version,
            });
        }
        debug!(record = %path.display(), "Pending state loaded");
        Ok(record)
    }

    async fn remove(&self, path: &Path) -> Result<(), PersistenceError> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(path)(e)),
        }
    }

    fn record_path(&self, file_path: &str) -> PathBuf {
        self.directory.join(record_file_name(file_path))
    }
}

/// Turn a loaded record into an entry state for the generation workflow.
///
/// Fails, leaving the record untouched, unless the run is awaiting approval.
/// The returned state is approved, so graph entry routing sends it straight
/// to the save step.
pub fn prepare_resume(
    record: PendingRecord,
    webhook_override: Option<String>,
) -> Result<RunState, ResumeError> {
    let state = record.state;
    if state.status != RunStatus::AwaitingApproval {
        return Err(ResumeError::NotAwaitingApproval {
            status: state.status,
        });
    }

    let slack_webhook = webhook_override.or(state.slack_webhook.clone());
    Ok(RunState {
        approved: true,
        status: RunStatus::Approved,
        slack_webhook,
        ..state
    })
}
