use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::AutoQaConfig;
use crate::external::ProcessCommandExecutor;
use crate::llm::ChatModelClient;
use crate::notify::SlackNotifier;
use crate::persistence::FileSystemPendingStore;
use crate::workflows::{
    FileOutcome, GraphExecutor, RunObserver, Step, StepEvent, WorkflowGraph, WorkflowSteps,
};

pub mod generate;
pub mod repair;
pub mod resume;
pub mod version;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

/// Wire the production collaborators from configuration.
pub fn build_steps(config: &AutoQaConfig) -> Result<WorkflowSteps> {
    let generator = ChatModelClient::new(config.generation.clone())
        .context("Failed to build the model client")?;
    let notifier = SlackNotifier::new(
        config.notifications.slack_webhook.clone(),
        config.notifications.timeout(),
    )
    .context("Failed to build the Slack notifier")?;
    let pending = FileSystemPendingStore::new(&config.workflow.pending_dir);

    Ok(WorkflowSteps::new(
        Arc::new(generator),
        Arc::new(ProcessCommandExecutor),
        Arc::new(notifier),
        Arc::new(pending),
        config.runner.clone(),
    ))
}

pub fn build_executor(config: &AutoQaConfig, graph: WorkflowGraph, max_steps: usize) -> Result<GraphExecutor> {
    let steps = build_steps(config)?;
    Ok(GraphExecutor::new(graph, Arc::new(steps)).with_max_steps(max_steps))
}

/// Prints step progress and per-file outcomes to stdout.
pub struct ConsoleObserver;

impl RunObserver for ConsoleObserver {
    fn on_step(&self, event: &StepEvent) {
        let state = &event.state;
        println!(
            "[AutoQA] [{}] Step ({}): {}",
            state.file_path, event.step, state.status
        );
        if event.step == Step::Execute {
            if let Some(results) = &state.test_results {
                println!("=== Test Results ===");
                println!("{results}");
            }
        }
    }

    fn on_outcome(&self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Completed(state) => {
                println!("[AutoQA] [{}] Workflow completed.", state.file_path)
            }
            FileOutcome::AwaitingApproval(state) => {
                println!("[AutoQA] [{}] Workflow awaiting approval.", state.file_path)
            }
            FileOutcome::Failed { file_path, error } => {
                println!("[AutoQA] [{file_path}] Workflow failed: {error}")
            }
        }
    }
}
