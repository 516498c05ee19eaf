//! Generation and repair collaborator
//!
//! The workflow only sees the [`TestGenerator`] trait. Whatever it returns is
//! treated as untrusted text and must pass validation before it is saved.

pub mod client;
pub mod prompts;

use async_trait::async_trait;
use thiserror::Error;

use crate::workflows::state::{Framework, TestType};

pub use client::ChatModelClient;

#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub test_type: TestType,
    pub framework: Framework,
    pub source_code: &'a str,
    pub file_path: &'a str,
}

#[derive(Debug, Clone, Copy)]
pub struct RepairRequest<'a> {
    pub framework: Framework,
    pub source_code: &'a str,
    pub failing_tests: &'a str,
    pub failure_output: &'a str,
}

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("unsupported combination: {test_type}/{framework}")]
    UnsupportedCombination { test_type: String, framework: String },
    #[error("unsupported framework for repair: '{0}'")]
    UnsupportedRepair(Framework),
    #[error("no API key configured for the model provider")]
    MissingApiKey,
    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("model API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("model returned no content")]
    EmptyResponse,
}

#[async_trait]
pub trait TestGenerator: Send + Sync {
    /// Produce candidate test text for a source file.
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<String, GeneratorError>;

    /// Produce a corrected version of failing test text.
    async fn repair(&self, request: RepairRequest<'_>) -> Result<String, GeneratorError>;
}
