// Step functions - each takes a RunState and returns a new one.
//
// Side effects (model calls, subprocesses, file writes, notifications) live
// inside individual steps behind injected collaborators.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};

use super::state::{RunState, RunStatus, TestType};
use super::state_machine::Step;
use crate::config::RunnerConfig;
use crate::external::{runner_invocation, CommandExecutor};
use crate::llm::{GenerationRequest, GeneratorError, RepairRequest, TestGenerator};
use crate::notify::{approval_pending_message, completion_message, Notifier, NotifyOutcome};
use crate::observability::{workflow_metrics, StepTimer};
use crate::persistence::{PendingStore, PersistenceError};

/// Minimum trimmed length of generated content before it is trusted.
pub const MIN_TEST_CONTENT_CHARS: usize = 10;

#[derive(Debug, Error)]
pub enum StepError {
    #[error("Validation failed: {reason}")]
    Validation { reason: String },

    #[error("No generated tests available for the {step} step")]
    MissingContent { step: Step },

    #[error("Test generation failed: {0}")]
    Generation(#[from] GeneratorError),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to persist pending state: {0}")]
    Persistence(#[from] PersistenceError),
}

/// The seven workflow steps with their collaborators.
pub struct WorkflowSteps {
    generator: Arc<dyn TestGenerator>,
    runner: Arc<dyn CommandExecutor>,
    notifier: Arc<dyn Notifier>,
    pending: Arc<dyn PendingStore>,
    runner_config: RunnerConfig,
}

impl WorkflowSteps {
    pub fn new(
        generator: Arc<dyn TestGenerator>,
        runner: Arc<dyn CommandExecutor>,
        notifier: Arc<dyn Notifier>,
        pending: Arc<dyn PendingStore>,
        runner_config: RunnerConfig,
    ) -> Self {
        Self {
            generator,
            runner,
            notifier,
            pending,
            runner_config,
        }
    }

    pub fn pending_store(&self) -> &Arc<dyn PendingStore> {
        &self.pending
    }

    /// Apply one named step.
    pub async fn apply(&self, step: Step, state: &RunState) -> Result<RunState, StepError> {
        let timer = StepTimer::new(step, &state.file_path);
        let result = match step {
            Step::Generate => self.generate(state).await,
            Step::Validate => validate(state),
            Step::Approve => self.approve(state).await,
            Step::Save => save(state).await,
            Step::Execute => Ok(self.execute(state).await),
            Step::Repair => self.repair(state).await,
            Step::Notify => Ok(self.notify(state).await),
        };
        timer.finish();
        workflow_metrics().record_step();
        result
    }

    pub async fn generate(&self, state: &RunState) -> Result<RunState, StepError> {
        let request = GenerationRequest {
            test_type: state.test_type,
            framework: state.framework,
            source_code: &state.input_code,
            file_path: &state.file_path,
        };
        let generated = self.generator.generate(request).await?;
        debug!(file = %state.file_path, chars = generated.len(), "Generated candidate tests");

        Ok(RunState {
            generated_tests: Some(generated),
            validated: false,
            status: RunStatus::Generating,
            ..state.clone()
        })
    }

    /// Gate between validation and saving.
    ///
    /// Automated test types are approved on the spot. Manual runs that have
    /// not been approved yet are announced, persisted, and parked.
    pub async fn approve(&self, state: &RunState) -> Result<RunState, StepError> {
        if state.test_type != TestType::Manual {
            return Ok(RunState {
                approved: true,
                status: RunStatus::Approved,
                ..state.clone()
            });
        }

        if state.approved {
            return Ok(RunState {
                status: RunStatus::Approved,
                ..state.clone()
            });
        }

        let text = approval_pending_message(state);
        self.send_notification(&text, state).await;

        let parked = RunState {
            status: RunStatus::AwaitingApproval,
            ..state.clone()
        };
        let record = self.pending.save(&parked).await?;
        info!(file = %state.file_path, record = %record.display(), "Run awaiting approval");
        Ok(parked)
    }

    /// Run the framework's test runner against the saved file.
    ///
    /// Never fails: launch errors, timeouts and unsupported pairings all
    /// become a `failed` status with the reason in `test_results`.
    pub async fn execute(&self, state: &RunState) -> RunState {
        if state.test_type == TestType::Manual {
            return RunState {
                status: RunStatus::Skipped,
                ..state.clone()
            };
        }

        let (status, output) = match self.run_tests(state).await {
            Ok((passed, output)) => {
                let status = if passed { RunStatus::Passed } else { RunStatus::Failed };
                (status, output)
            }
            Err(message) => (RunStatus::Failed, format!("Error running tests: {message}")),
        };
        info!(file = %state.file_path, status = %status, "Test run finished");

        RunState {
            status,
            test_results: Some(output),
            ..state.clone()
        }
    }

    async fn run_tests(&self, state: &RunState) -> Result<(bool, String), String> {
        let resolved = std::path::absolute(&state.output_path).map_err(|e| e.to_string())?;
        let mut invocation = runner_invocation(
            state.test_type,
            state.framework,
            &resolved,
            &self.runner_config,
        )
        .ok_or_else(|| {
            format!(
                "unsupported test type/framework: {}/{}",
                state.test_type, state.framework
            )
        })?;
        if !state.project_root.is_empty() {
            invocation = invocation.current_dir(&state.project_root);
        }

        debug!(file = %state.file_path, command = %invocation.display(), "Launching test runner");
        let output = self
            .runner
            .execute(&invocation)
            .await
            .map_err(|e| e.to_string())?;
        Ok((output.success(), output.merged()))
    }

    pub async fn repair(&self, state: &RunState) -> Result<RunState, StepError> {
        let failing_tests = state
            .generated_tests
            .as_deref()
            .ok_or(StepError::MissingContent { step: Step::Repair })?;

        let request = RepairRequest {
            framework: state.framework,
            source_code: &state.input_code,
            failing_tests,
            failure_output: state.test_results.as_deref().unwrap_or_default(),
        };
        let repaired = self.generator.repair(request).await?;

        let retry_count = state.retry_count + 1;
        workflow_metrics().record_repair();
        info!(file = %state.file_path, retry_count, "Repaired failing tests");

        Ok(RunState {
            generated_tests: Some(repaired),
            validated: false,
            retry_count,
            ..state.clone()
        })
    }

    pub async fn notify(&self, state: &RunState) -> RunState {
        info!(
            file = %state.file_path,
            test_type = %state.test_type,
            framework = %state.framework,
            output = %state.output_path,
            status = %state.status,
            retries = state.retry_count,
            "Test generation workflow completed"
        );

        let text = completion_message(state);
        self.send_notification(&text, state).await;

        RunState {
            status: RunStatus::Completed,
            ..state.clone()
        }
    }

    async fn send_notification(&self, text: &str, state: &RunState) {
        match self
            .notifier
            .notify(text, state.slack_webhook.as_deref())
            .await
        {
            Ok(NotifyOutcome::Sent) => debug!(file = %state.file_path, "Notification sent"),
            Ok(NotifyOutcome::Skipped) => debug!(file = %state.file_path, "Notification skipped"),
            Err(e) => warn!(file = %state.file_path, error = %e, "Notification failed"),
        }
    }
}

/// Minimal well-formedness gate for generated content.
pub fn validate(state: &RunState) -> Result<RunState, StepError> {
    let long_enough = state
        .generated_tests
        .as_deref()
        .is_some_and(|tests| tests.trim().chars().count() >= MIN_TEST_CONTENT_CHARS);

    if !long_enough {
        return Err(StepError::Validation {
            reason: "Generated tests too short.".to_string(),
        });
    }

    Ok(RunState {
        validated: true,
        status: RunStatus::Validating,
        ..state.clone()
    })
}

/// Write the cleaned generated content to the run's output path.
pub async fn save(state: &RunState) -> Result<RunState, StepError> {
    let content = state
        .generated_tests
        .as_deref()
        .ok_or(StepError::MissingContent { step: Step::Save })?;
    let cleaned = clean_code_fences(content);

    let output_path = Path::new(&state.output_path);
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|source| StepError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
    }
    fs::write(output_path, cleaned)
        .await
        .map_err(|source| StepError::Io {
            path: output_path.to_path_buf(),
            source,
        })?;
    debug!(file = %state.file_path, output = %output_path.display(), "Saved generated tests");

    Ok(RunState {
        status: RunStatus::Saving,
        output_path: output_path.display().to_string(),
        ..state.clone()
    })
}

/// Strip markdown code fence lines from model output.
pub fn clean_code_fences(text: &str) -> String {
    text.trim()
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}
