use anyhow::{Context, Result};
use clap::Parser;

use autoqa::cli::commands::generate::GenerateCommand;
use autoqa::cli::commands::repair::RepairCommand;
use autoqa::cli::commands::resume::ResumeCommand;
use autoqa::cli::commands::version::VersionCommand;
use autoqa::cli::commands::Command;
use autoqa::cli::{Cli, Commands};
use autoqa::config::{AutoQaConfig, CONFIG_FILE};
use autoqa::telemetry::init_telemetry;

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Version = cli.command {
        return tokio::runtime::Runtime::new()?.block_on(VersionCommand.execute());
    }

    AutoQaConfig::load_env_file()?;
    let config_path = cli.config.unwrap_or_else(|| CONFIG_FILE.into());
    let config = AutoQaConfig::load_from(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;
    init_telemetry(config.observability.log_format)?;

    let runtime = tokio::runtime::Runtime::new()?;
    match cli.command {
        Commands::Generate(args) => {
            runtime.block_on(async { GenerateCommand::new(args, config).execute().await })
        }
        Commands::Resume {
            state,
            slack_webhook,
        } => runtime.block_on(async {
            ResumeCommand::new(state, slack_webhook, config)
                .execute()
                .await
        }),
        Commands::RepairTest {
            source_file,
            test_file,
            project_root,
            framework,
            max_retries,
            slack_webhook,
        } => runtime.block_on(async {
            RepairCommand {
                source_file,
                test_file,
                project_root,
                framework,
                max_retries,
                slack_webhook,
                config,
            }
            .execute()
            .await
        }),
        Commands::Version => runtime.block_on(VersionCommand.execute()),
    }
}
