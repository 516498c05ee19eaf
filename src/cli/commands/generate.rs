use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

use super::{build_executor, Command, ConsoleObserver};
use crate::cli::GenerateArgs;
use crate::config::AutoQaConfig;
use crate::discovery::{discover_source_files, resolve_output_path, DiscoveryOptions};
use crate::observability::workflow_metrics;
use crate::persistence::{FileSystemPendingStore, PendingStore};
use crate::workflows::{
    ConcurrencyDriver, FileOutcome, Framework, RunState, TestType, WorkflowGraph,
};

/// Test type, framework and output project after CLI/config fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateSettings {
    pub test_type: TestType,
    pub framework: Framework,
    pub output_project: Option<PathBuf>,
}

pub struct GenerateCommand {
    args: GenerateArgs,
    config: AutoQaConfig,
}

impl GenerateCommand {
    pub fn new(args: GenerateArgs, config: AutoQaConfig) -> Self {
        Self { args, config }
    }

    /// Command-line values win; `[defaults]` fills the gaps.
    pub fn resolve_settings(&self) -> Result<GenerateSettings> {
        let defaults = &self.config.defaults;

        let test_type: TestType = self
            .args
            .test_type
            .as_deref()
            .or(defaults.test_type.as_deref())
            .ok_or_else(|| anyhow!("--type is required (unit, e2e or manual)"))?
            .parse()
            .map_err(|e: String| anyhow!(e))?;

        let framework_arg = self
            .args
            .framework
            .as_deref()
            .or(defaults.framework.as_deref());

        let framework = match (test_type, framework_arg) {
            (TestType::Manual, Some(name)) if !name.is_empty() => {
                warn!(framework = %name, "Ignoring framework for manual tests");
                Framework::Unspecified
            }
            (TestType::Manual, _) => Framework::Unspecified,
            (_, None) | (_, Some("")) => bail!("--framework is required for {test_type} tests."),
            (_, Some(name)) => name.parse().map_err(|e: String| anyhow!(e))?,
        };

        if !framework.supports(test_type) {
            bail!("Framework {framework} cannot generate {test_type} tests.");
        }

        let output_project = self
            .args
            .output_project
            .clone()
            .or_else(|| defaults.output_project.as_ref().map(PathBuf::from));

        Ok(GenerateSettings {
            test_type,
            framework,
            output_project,
        })
    }

    async fn build_entries(
        &self,
        settings: &GenerateSettings,
        files: Vec<PathBuf>,
    ) -> Result<Vec<RunState>> {
        let project = &self.args.project;
        let output_root = settings.output_project.as_deref().unwrap_or(project);
        let mut entries = Vec::with_capacity(files.len());

        for source_file in files {
            let input_code = match tokio::fs::read_to_string(&source_file).await {
                Ok(code) => code,
                Err(e) => {
                    warn!(file = %source_file.display(), error = %e, "Skipping unreadable file");
                    continue;
                }
            };

            let output_path = match resolve_output_path(
                project,
                settings.output_project.as_deref(),
                &source_file,
                settings.test_type,
                settings.framework,
                self.args.strip_prefix.as_deref(),
            ) {
                Ok(path) => path,
                Err(e) => {
                    warn!(file = %source_file.display(), error = %e, "Skipping file with no output path");
                    continue;
                }
            };
            let relative = source_file
                .strip_prefix(project)
                .unwrap_or(&source_file)
                .display()
                .to_string();

            entries.push(
                RunState::new(input_code, relative, settings.test_type, settings.framework)
                    .with_roots(project.display().to_string(), output_root.display().to_string())
                    .with_output_path(output_path.display().to_string())
                    .with_slack_webhook(self.args.slack_webhook.clone()),
            );
        }
        Ok(entries)
    }
}

impl Command for GenerateCommand {
    async fn execute(&self) -> Result<()> {
        let settings = self.resolve_settings()?;
        let project = &self.args.project;
        if !project.is_dir() {
            bail!("Project directory not found: {}", project.display());
        }

        println!("Scanning project: {}", project.display());
        if let Some(output) = &settings.output_project {
            println!("Output project: {}", output.display());
        }

        let options = DiscoveryOptions {
            include_dirs: self.args.include_dirs.clone(),
            exclude_dirs: self.args.exclude_dirs.clone(),
            file_glob: self.args.file_glob.clone(),
        };
        let files = discover_source_files(project, settings.test_type, &options)
            .with_context(|| format!("Failed to scan {}", project.display()))?;
        if files.is_empty() {
            println!("No source files found.");
            return Ok(());
        }
        println!("Discovered {} files to process.", files.len());

        let entries = self.build_entries(&settings, files).await?;

        let workflow = &self.config.workflow;
        let graph = WorkflowGraph::generation().with_max_repairs(workflow.max_repairs);
        let max_steps = self.args.max_steps.unwrap_or(workflow.max_steps);
        let executor = Arc::new(build_executor(&self.config, graph, max_steps)?);
        let driver = ConcurrencyDriver::new(self.args.max_workers.unwrap_or(workflow.max_workers));

        let report = driver
            .run_all(executor, entries, Arc::new(ConsoleObserver))
            .await;

        println!();
        println!(
            "Processed {} files: {} completed, {} awaiting approval, {} failed.",
            report.outcomes.len(),
            report.completed(),
            report.awaiting_approval(),
            report.failed()
        );

        let store = FileSystemPendingStore::new(&workflow.pending_dir);
        for outcome in &report.outcomes {
            if let FileOutcome::AwaitingApproval(state) = outcome {
                println!(
                    "  Resume {} with: autoqa resume --state {}",
                    state.file_path,
                    store.record_path(&state.file_path).display()
                );
            }
        }

        workflow_metrics().log_stats();
        Ok(())
    }
}
