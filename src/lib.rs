// AutoQA Library - test generation, execution and repair workflows
// This exposes the core components for testing and integration

pub mod cli;
pub mod config;
pub mod discovery;
pub mod external;
pub mod llm;
pub mod notify;
pub mod observability;
pub mod persistence;
pub mod telemetry;
pub mod workflows;

// Re-export key types for easy access
pub use config::AutoQaConfig;
pub use external::{CommandExecutor, ProcessCommandExecutor};
pub use llm::{ChatModelClient, TestGenerator};
pub use notify::{Notifier, SlackNotifier};
pub use observability::{workflow_metrics, StepTimer, WorkflowMetrics};
pub use persistence::{prepare_resume, FileSystemPendingStore, PendingRecord, PendingStore};
pub use telemetry::{create_run_span, generate_run_id, init_telemetry};
pub use workflows::{
    ConcurrencyDriver, GraphExecutor, RunOutcome, RunState, RunStatus, Step, WorkflowError,
    WorkflowGraph, WorkflowSteps,
};
