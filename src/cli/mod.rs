use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "autoqa")]
#[command(about = "Generate, run and repair tests with a language model")]
#[command(long_about = "AutoQA walks a project, generates tests for each source file, runs them, \
                       and repairs failing tests until they pass or the repair budget runs out. \
                       Manual checklists pause for approval and continue with 'autoqa resume'.")]
pub struct Cli {
    /// Configuration file to read instead of .autoqa.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate tests for every matching source file in a project
    Generate(GenerateArgs),
    /// Approve a run that is awaiting approval and finish it
    Resume {
        /// Pending state record written when the run paused
        #[arg(long = "state")]
        state: PathBuf,
        /// Slack webhook URL overriding the one stored with the run
        #[arg(long)]
        slack_webhook: Option<String>,
    },
    /// Run an existing test file and repair it until it passes
    RepairTest {
        /// Source file the tests exercise
        #[arg(long)]
        source_file: PathBuf,
        /// Test file to run and repair in place
        #[arg(long)]
        test_file: PathBuf,
        /// Directory the test runner is launched from
        #[arg(long)]
        project_root: PathBuf,
        /// Test framework (pytest, jest, playwright, cypress)
        #[arg(long)]
        framework: String,
        /// Maximum number of repair attempts [default: workflow.max_repairs, 10]
        #[arg(long)]
        max_retries: Option<u32>,
        /// Slack webhook URL for the completion notification
        #[arg(long)]
        slack_webhook: Option<String>,
    },
    /// Print the AutoQA version
    Version,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GenerateArgs {
    /// Project to scan for source files
    #[arg(long, default_value = ".")]
    pub project: PathBuf,
    /// Project the generated tests are written into
    #[arg(long)]
    pub output_project: Option<PathBuf>,
    /// Test type (unit, e2e, manual)
    #[arg(long = "type")]
    pub test_type: Option<String>,
    /// Test framework (pytest, jest, playwright, cypress); not needed for manual
    #[arg(long)]
    pub framework: Option<String>,
    /// Number of files processed concurrently
    #[arg(long)]
    pub max_workers: Option<usize>,
    /// Only scan these subdirectories
    #[arg(long, value_delimiter = ',')]
    pub include_dirs: Vec<String>,
    /// Skip these subdirectories
    #[arg(long, value_delimiter = ',')]
    pub exclude_dirs: Vec<String>,
    /// Glob selecting files instead of the per-type extensions
    #[arg(long)]
    pub file_glob: Option<String>,
    /// Leading directory removed from source paths when mirroring output
    #[arg(long)]
    pub strip_prefix: Option<String>,
    /// Slack webhook URL for notifications
    #[arg(long)]
    pub slack_webhook: Option<String>,
    /// Hard ceiling on steps per run
    #[arg(long)]
    pub max_steps: Option<usize>,
}
