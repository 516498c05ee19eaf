use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

use crate::workflows::state_machine::Step;

/// Workflow run counters
#[derive(Debug, Default)]
pub struct WorkflowMetrics {
    pub steps_executed: AtomicU64,
    pub repairs: AtomicU64,
    pub runs_completed: AtomicU64,
    pub runs_suspended: AtomicU64,
    pub runs_failed: AtomicU64,
}

impl WorkflowMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_step(&self) {
        self.steps_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_repair(&self) {
        self.repairs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_completed(&self) {
        self.runs_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_suspended(&self) {
        self.runs_suspended.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.runs_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> WorkflowStats {
        WorkflowStats {
            steps_executed: self.steps_executed.load(Ordering::Relaxed),
            repairs: self.repairs.load(Ordering::Relaxed),
            runs_completed: self.runs_completed.load(Ordering::Relaxed),
            runs_suspended: self.runs_suspended.load(Ordering::Relaxed),
            runs_failed: self.runs_failed.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Workflow metrics: steps={}, repairs={}, completed={}, suspended={}, failed={}",
            stats.steps_executed,
            stats.repairs,
            stats.runs_completed,
            stats.runs_suspended,
            stats.runs_failed
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowStats {
    pub steps_executed: u64,
    pub repairs: u64,
    pub runs_completed: u64,
    pub runs_suspended: u64,
    pub runs_failed: u64,
}

/// Global metrics instance
static WORKFLOW_METRICS: std::sync::LazyLock<WorkflowMetrics> =
    std::sync::LazyLock::new(WorkflowMetrics::new);

pub fn workflow_metrics() -> &'static WorkflowMetrics {
    &WORKFLOW_METRICS
}

/// Time a single step and log its duration
pub struct StepTimer {
    step: Step,
    file_path: String,
    start: Instant,
}

impl StepTimer {
    pub fn new(step: Step, file_path: &str) -> Self {
        Self {
            step,
            file_path: file_path.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) {
        debug!(
            step = %self.step,
            file = %self.file_path,
            duration_ms = self.start.elapsed().as_millis(),
            "Step completed"
        );
    }
}
