// Fake collaborators for testing - no model calls, subprocesses or network

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::external::{CommandError, CommandExecutor, CommandOutput, Invocation};
use crate::llm::{GenerationRequest, GeneratorError, RepairRequest, TestGenerator};
use crate::notify::{Notifier, NotifyError, NotifyOutcome};
use crate::persistence::{record_file_name, PendingRecord, PendingStore, PersistenceError};
use crate::workflows::state::{Framework, RunState};

/// Owned copy of a repair request as seen by the fake generator.
#[derive(Debug, Clone)]
pub struct RecordedRepair {
    pub framework: Framework,
    pub source_code: String,
    pub failing_tests: String,
    pub failure_output: String,
}

/// Generator that returns canned text and records what it was asked.
#[derive(Debug, Default)]
pub struct FakeGenerator {
    pub response: Mutex<String>,
    pub generate_count: AtomicUsize,
    pub repairs: Mutex<Vec<RecordedRepair>>,
    pub fail_generate: Mutex<bool>,
    pub fail_repair: Mutex<bool>,
}

impl FakeGenerator {
    pub fn new(response: &str) -> Self {
        Self {
            response: Mutex::new(response.to_string()),
            ..Default::default()
        }
    }

    pub fn fail_next_generate(&self) {
        *self.fail_generate.lock().unwrap() = true;
    }

    pub fn fail_next_repair(&self) {
        *self.fail_repair.lock().unwrap() = true;
    }

    pub fn generate_calls(&self) -> usize {
        self.generate_count.load(Ordering::SeqCst)
    }

    pub fn last_repair(&self) -> Option<RecordedRepair> {
        self.repairs.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TestGenerator for FakeGenerator {
    async fn generate(&self, _request: GenerationRequest<'_>) -> Result<String, GeneratorError> {
        self.generate_count.fetch_add(1, Ordering::SeqCst);
        if std::mem::take(&mut *self.fail_generate.lock().unwrap()) {
            return Err(GeneratorError::EmptyResponse);
        }
        Ok(self.response.lock().unwrap().clone())
    }

    async fn repair(&self, request: RepairRequest<'_>) -> Result<String, GeneratorError> {
        self.repairs.lock().unwrap().push(RecordedRepair {
            framework: request.framework,
            source_code: request.source_code.to_string(),
            failing_tests: request.failing_tests.to_string(),
            failure_output: request.failure_output.to_string(),
        });
        if std::mem::take(&mut *self.fail_repair.lock().unwrap()) {
            return Err(GeneratorError::EmptyResponse);
        }
        Ok(self.response.lock().unwrap().clone())
    }
}

/// Command executor with a canned response and concurrency tracking.
#[derive(Debug)]
pub struct FakeCommandExecutor {
    pub default_response: Mutex<Result<CommandOutput, CommandError>>,
    pub invocations: Mutex<Vec<Invocation>>,
    pub delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeCommandExecutor {
    pub fn passing(stdout: &str) -> Self {
        Self::with_default(Ok(CommandOutput {
            status_code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }))
    }

    pub fn failing(stderr: &str) -> Self {
        Self::with_default(Ok(CommandOutput {
            status_code: 1,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }))
    }

    fn with_default(response: Result<CommandOutput, CommandError>) -> Self {
        Self {
            default_response: Mutex::new(response),
            invocations: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn respond_with(&self, response: Result<CommandOutput, CommandError>) {
        *self.default_response.lock().unwrap() = response;
    }

    pub fn calls(&self) -> usize {
        self.invocations.lock().unwrap().len()
    }

    pub fn last_invocation(&self) -> Option<Invocation> {
        self.invocations.lock().unwrap().last().cloned()
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommandExecutor for FakeCommandExecutor {
    async fn execute(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError> {
        self.invocations.lock().unwrap().push(invocation.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.default_response.lock().unwrap().clone()
    }
}

/// Notifier that records messages instead of sending them.
#[derive(Debug, Default)]
pub struct FakeNotifier {
    pub messages: Mutex<Vec<(String, Option<String>)>>,
    pub fail: Mutex<bool>,
}

impl FakeNotifier {
    pub fn fail_all(&self) {
        *self.fail.lock().unwrap() = true;
    }

    pub fn sent(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    pub fn last_webhook(&self) -> Option<String> {
        self.messages
            .lock()
            .unwrap()
            .last()
            .and_then(|(_, webhook)| webhook.clone())
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn notify(
        &self,
        text: &str,
        webhook_override: Option<&str>,
    ) -> Result<NotifyOutcome, NotifyError> {
        self.messages
            .lock()
            .unwrap()
            .push((text.to_string(), webhook_override.map(str::to_string)));
        if *self.fail.lock().unwrap() {
            return Err(NotifyError::Rejected {
                status: 500,
                body: "boom".to_string(),
            });
        }
        Ok(NotifyOutcome::Sent)
    }
}

/// In-memory pending store keyed the same way as the file system store.
#[derive(Debug, Default)]
pub struct FakePendingStore {
    pub records: Mutex<HashMap<PathBuf, PendingRecord>>,
    pub history: Mutex<Vec<RunState>>,
}

impl FakePendingStore {
    pub fn saves(&self) -> usize {
        self.history.lock().unwrap().len()
    }

    pub fn saved_states(&self) -> Vec<RunState> {
        self.history.lock().unwrap().clone()
    }
}

#[async_trait]
impl PendingStore for FakePendingStore {
    async fn save(&self, state: &RunState) -> Result<PathBuf, PersistenceError> {
        let path = self.record_path(&state.file_path);
        self.history.lock().unwrap().push(state.clone());
        self.records
            .lock()
            .unwrap()
            .insert(path.clone(), PendingRecord::new(state.clone()));
        Ok(path)
    }

    async fn load(&self, path: &Path) -> Result<PendingRecord, PersistenceError> {
        self.records
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| PersistenceError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
    }

    async fn remove(&self, path: &Path) -> Result<(), PersistenceError> {
        self.records.lock().unwrap().remove(path);
        Ok(())
    }

    fn record_path(&self, file_path: &str) -> PathBuf {
        PathBuf::from("pending").join(record_file_name(file_path))
    }
}
