// Concurrency driver - runs one workflow per file with a bounded number of
// runs in flight.
//
// Each run owns its RunState; a failure or panic in one run is reported for
// that file and never disturbs the others.

use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info};

use super::executor::{GraphExecutor, RunOutcome, StepEvent};
use super::state::RunState;

/// Final disposition of a single file's run.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Completed(RunState),
    AwaitingApproval(RunState),
    Failed { file_path: String, error: String },
}

impl FileOutcome {
    pub fn file_path(&self) -> &str {
        match self {
            FileOutcome::Completed(state) | FileOutcome::AwaitingApproval(state) => &state.file_path,
            FileOutcome::Failed { file_path, .. } => file_path,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn completed(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Completed(_)))
    }

    pub fn awaiting_approval(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::AwaitingApproval(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

/// Progress hooks for a batch of runs.
pub trait RunObserver: Send + Sync {
    /// Called from the run's task after every applied step.
    fn on_step(&self, _event: &StepEvent) {}

    /// Called as each file's run settles, in input order.
    fn on_outcome(&self, _outcome: &FileOutcome) {}
}

/// Observer that does nothing.
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

#[derive(Debug, Clone, Copy)]
pub struct ConcurrencyDriver {
    max_workers: usize,
}

impl ConcurrencyDriver {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Files are taken in batches of twice the worker count; within a batch
    /// the semaphore keeps at most `max_workers` runs executing at once.
    pub async fn run_all(
        &self,
        executor: Arc<GraphExecutor>,
        entries: Vec<RunState>,
        observer: Arc<dyn RunObserver>,
    ) -> BatchReport {
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let batch_size = self.max_workers * 2;
        let mut report = BatchReport::default();

        info!(
            files = entries.len(),
            max_workers = self.max_workers,
            "Starting workflow runs"
        );

        for batch in entries.chunks(batch_size) {
            let handles = batch.iter().cloned().map(|entry| {
                let semaphore = semaphore.clone();
                let executor = executor.clone();
                let step_observer = observer.clone();
                let file_path = entry.file_path.clone();
                let handle = tokio::spawn(async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|e| format!("worker pool closed: {e}"))?;
                    executor
                        .run_observed(entry, |event| step_observer.on_step(event))
                        .await
                        .map_err(|e| e.to_string())
                });
                async move { (file_path, handle.await) }
            });

            for (file_path, joined) in join_all(handles).await {
                let outcome = match joined {
                    Ok(Ok(RunOutcome::Completed(state))) => FileOutcome::Completed(state),
                    Ok(Ok(RunOutcome::AwaitingApproval(state))) => FileOutcome::AwaitingApproval(state),
                    Ok(Err(error)) => FileOutcome::Failed { file_path, error },
                    Err(join_error) => {
                        error!(file = %file_path, error = %join_error, "Workflow task aborted");
                        FileOutcome::Failed {
                            file_path,
                            error: format!("task aborted: {join_error}"),
                        }
                    }
                };
                observer.on_outcome(&outcome);
                report.outcomes.push(outcome);
            }
        }

        info!(
            completed = report.completed(),
            awaiting_approval = report.awaiting_approval(),
            failed = report.failed(),
            "All workflow runs settled"
        );
        report
    }
}
