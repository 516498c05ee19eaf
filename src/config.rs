use anyhow::Result;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::workflows::state_machine::DEFAULT_MAX_REPAIRS;

/// Name of the per-project configuration file.
pub const CONFIG_FILE: &str = ".autoqa.toml";

/// Main configuration structure for AutoQA
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AutoQaConfig {
    /// Fallback values for the generate command
    pub defaults: ProjectDefaults,
    /// Model provider used to generate and repair tests
    pub generation: GenerationConfig,
    /// Test runner invocation settings
    pub runner: RunnerConfig,
    /// Graph execution and concurrency settings
    pub workflow: WorkflowConfig,
    /// Outbound notification settings
    pub notifications: NotificationConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProjectDefaults {
    pub test_type: Option<String>,
    pub framework: Option<String>,
    pub output_project: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAi,
    Anthropic,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub provider: Provider,
    pub model: String,
    /// API key (falls back to OPENAI_API_KEY / ANTHROPIC_API_KEY)
    pub api_key: Option<String>,
    /// Override for the provider's API base URL
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub request_timeout_seconds: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: Provider::OpenAi,
            model: "o3-mini".to_string(),
            api_key: None,
            base_url: None,
            max_tokens: 8000,
            request_timeout_seconds: 120,
        }
    }
}

impl GenerationConfig {
    pub fn default_base_url(&self) -> &'static str {
        match self.provider {
            Provider::OpenAi => "https://api.openai.com",
            Provider::Anthropic => "https://api.anthropic.com",
        }
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.default_base_url())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Hard ceiling on one test-runner invocation
    pub timeout_seconds: u64,
    /// Binary used for pytest and playwright suites
    pub pytest_program: String,
    /// Package-runner shim used for jest and cypress
    pub npx_program: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 300,
            pytest_program: "pytest".to_string(),
            npx_program: "npx".to_string(),
        }
    }
}

impl RunnerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Repair cycles allowed per run
    pub max_repairs: u32,
    /// Ceiling on steps a single run may take
    pub max_steps: usize,
    /// Concurrent graph executions
    pub max_workers: usize,
    /// Directory receiving approval-pending records
    pub pending_dir: PathBuf,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_repairs: DEFAULT_MAX_REPAIRS,
            max_steps: 100,
            max_workers: 4,
            pending_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Default Slack webhook (falls back to SLACK_WEBHOOK_URL)
    pub slack_webhook: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            slack_webhook: None,
            timeout_seconds: 10,
        }
    }
}

impl NotificationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,
}

impl AutoQaConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. The TOML file at `path`, if it exists
    /// 3. Environment variables (prefixed with AUTOQA__)
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut builder = Config::builder();

        if path.exists() {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("AUTOQA")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let mut autoqa_config: AutoQaConfig = builder.build()?.try_deserialize()?;
        autoqa_config.apply_env_fallbacks();
        Ok(autoqa_config)
    }

    /// Well-known provider variables fill in anything the layers left unset
    fn apply_env_fallbacks(&mut self) {
        if self.generation.api_key.is_none() {
            let var = match self.generation.provider {
                Provider::OpenAi => "OPENAI_API_KEY",
                Provider::Anthropic => "ANTHROPIC_API_KEY",
            };
            self.generation.api_key = std::env::var(var).ok();
        }

        if self.notifications.slack_webhook.is_none() {
            self.notifications.slack_webhook = std::env::var("SLACK_WEBHOOK_URL").ok();
        }
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}
