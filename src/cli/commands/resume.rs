use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use super::{build_steps, Command, ConsoleObserver};
use crate::config::AutoQaConfig;
use crate::observability::workflow_metrics;
use crate::persistence::prepare_resume;
use crate::workflows::{FileOutcome, GraphExecutor, RunObserver, RunOutcome, WorkflowGraph};

pub struct ResumeCommand {
    state: PathBuf,
    slack_webhook: Option<String>,
    config: AutoQaConfig,
}

impl ResumeCommand {
    pub fn new(state: PathBuf, slack_webhook: Option<String>, config: AutoQaConfig) -> Self {
        Self {
            state,
            slack_webhook,
            config,
        }
    }
}

impl Command for ResumeCommand {
    async fn execute(&self) -> Result<()> {
        println!("Loading pending state: {}", self.state.display());

        let steps = Arc::new(build_steps(&self.config)?);
        let store = steps.pending_store().clone();
        let record = store
            .load(&self.state)
            .await
            .with_context(|| format!("Failed to load {}", self.state.display()))?;
        let entry = prepare_resume(record, self.slack_webhook.clone())?;

        let graph = WorkflowGraph::generation().with_max_repairs(self.config.workflow.max_repairs);
        let executor =
            GraphExecutor::new(graph, steps).with_max_steps(self.config.workflow.max_steps);
        let observer = ConsoleObserver;

        let outcome = executor
            .run_observed(entry, |event| observer.on_step(event))
            .await?;

        match outcome {
            RunOutcome::AwaitingApproval(state) => {
                observer.on_outcome(&FileOutcome::AwaitingApproval(state));
                println!("Workflow is awaiting further approval. State saved again.");
            }
            RunOutcome::Completed(state) => {
                observer.on_outcome(&FileOutcome::Completed(state));
                store
                    .remove(&self.state)
                    .await
                    .with_context(|| format!("Failed to remove {}", self.state.display()))?;
            }
        }

        workflow_metrics().log_stats();
        Ok(())
    }
}
