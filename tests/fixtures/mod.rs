//! Shared fakes and builders for workflow integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use autoqa::config::RunnerConfig;
use autoqa::external::{CommandError, CommandExecutor, CommandOutput, Invocation};
use autoqa::llm::{GenerationRequest, GeneratorError, RepairRequest, TestGenerator};
use autoqa::notify::{Notifier, NotifyError, NotifyOutcome};
use autoqa::persistence::PendingStore;
use autoqa::workflows::{Framework, RunState, TestType, WorkflowSteps};

pub const GOOD_TESTS: &str = "def test_add():\n    assert add(1, 2) == 3";

/// Generator returning the same text for every generate and repair call.
#[derive(Default)]
pub struct CannedGenerator {
    pub text: String,
    pub generate_calls: AtomicUsize,
    pub repair_calls: AtomicUsize,
}

impl CannedGenerator {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl TestGenerator for CannedGenerator {
    async fn generate(&self, _request: GenerationRequest<'_>) -> Result<String, GeneratorError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }

    async fn repair(&self, _request: RepairRequest<'_>) -> Result<String, GeneratorError> {
        self.repair_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }
}

/// Runner whose exit codes are scripted per call; once the script runs out
/// every further call uses `fallback`.
pub struct ScriptedRunner {
    script: Mutex<VecDeque<i32>>,
    fallback: i32,
    delay: Duration,
    pub calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedRunner {
    pub fn new(script: &[i32], fallback: i32) -> Self {
        Self {
            script: Mutex::new(script.iter().copied().collect()),
            fallback,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn always(code: i32) -> Self {
        Self::new(&[], code)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommandExecutor for ScriptedRunner {
    async fn execute(&self, _invocation: &Invocation) -> Result<CommandOutput, CommandError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let code = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);
        Ok(CommandOutput {
            status_code: code,
            stdout: if code == 0 { "1 passed".into() } else { String::new() },
            stderr: if code == 0 { String::new() } else { "1 failed".into() },
        })
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        text: &str,
        _webhook_override: Option<&str>,
    ) -> Result<NotifyOutcome, NotifyError> {
        self.messages.lock().unwrap().push(text.to_string());
        Ok(NotifyOutcome::Sent)
    }
}

pub fn workflow_steps(
    generator: Arc<dyn TestGenerator>,
    runner: Arc<dyn CommandExecutor>,
    notifier: Arc<dyn Notifier>,
    pending: Arc<dyn PendingStore>,
) -> Arc<WorkflowSteps> {
    Arc::new(WorkflowSteps::new(
        generator,
        runner,
        notifier,
        pending,
        RunnerConfig::default(),
    ))
}

/// Fresh entry state rooted in `dir`.
pub fn entry_state(dir: &Path, file: &str, test_type: TestType, framework: Framework) -> RunState {
    let output_dir = dir.join("out");
    RunState::new("def add(a, b):\n    return a + b", file, test_type, framework)
        .with_roots(dir.display().to_string(), output_dir.display().to_string())
        .with_output_path(output_dir.join(format!("test_{}", file.replace('/', "_"))).display().to_string())
}
