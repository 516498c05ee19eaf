use anyhow::{anyhow, bail, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{build_steps, Command, ConsoleObserver};
use crate::config::AutoQaConfig;
use crate::observability::workflow_metrics;
use crate::workflows::{
    Framework, GraphExecutor, RunObserver, RunState, RunStatus, Step, WorkflowGraph,
};

pub struct RepairCommand {
    pub source_file: PathBuf,
    pub test_file: PathBuf,
    pub project_root: PathBuf,
    pub framework: String,
    pub max_retries: Option<u32>,
    pub slack_webhook: Option<String>,
    pub config: AutoQaConfig,
}

impl RepairCommand {
    fn framework(&self) -> Result<Framework> {
        let framework: Framework = self.framework.parse().map_err(|e: String| anyhow!(e))?;
        if framework == Framework::Unspecified {
            bail!("--framework must name a test framework");
        }
        Ok(framework)
    }

    /// Repair topology bounded by `--max-retries`, or the configured budget.
    fn graph(&self) -> WorkflowGraph {
        let max_repairs = self
            .max_retries
            .unwrap_or(self.config.workflow.max_repairs);
        WorkflowGraph::repair().with_max_repairs(max_repairs)
    }

    async fn entry_state(&self) -> Result<RunState> {
        let framework = self.framework()?;
        let input_code = read(&self.source_file).await?;
        let test_code = read(&self.test_file).await?;

        let file_path = self
            .test_file
            .strip_prefix(&self.project_root)
            .unwrap_or(&self.test_file)
            .display()
            .to_string();
        let root = self.project_root.display().to_string();

        Ok(RunState::new(
            input_code,
            file_path,
            framework.default_test_type(),
            framework,
        )
        .with_roots(root.clone(), root)
        .with_output_path(self.test_file.display().to_string())
        .with_generated_tests(test_code)
        .with_slack_webhook(self.slack_webhook.clone()))
    }
}

async fn read(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

impl Command for RepairCommand {
    async fn execute(&self) -> Result<()> {
        println!(
            "Repairing test: {} against source: {}",
            self.test_file.display(),
            self.source_file.display()
        );

        let entry = self.entry_state().await?;
        let steps = Arc::new(build_steps(&self.config)?);
        let graph = self.graph();
        let executor =
            GraphExecutor::new(graph, steps).with_max_steps(self.config.workflow.max_steps);

        let observer = ConsoleObserver;
        let mut last_run = None;
        let outcome = executor
            .run_observed(entry, |event| {
                observer.on_step(event);
                if event.step == Step::Execute {
                    last_run = Some(event.state.status);
                }
            })
            .await?;

        let state = outcome.into_state();
        if last_run == Some(RunStatus::Passed) {
            println!("✅ Test repaired successfully: {}", self.test_file.display());
        } else {
            println!("⚠️ Repair incomplete after {} retries.", state.retry_count);
        }

        workflow_metrics().log_stats();
        Ok(())
    }
}
