// Run state threaded through one file's workflow execution.
//
// Steps never mutate a RunState in place; each one builds a new value with
// struct update syntax so earlier snapshots stay valid for the trace.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of test produced for a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestType {
    Unit,
    E2e,
    Manual,
}

impl TestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestType::Unit => "unit",
            TestType::E2e => "e2e",
            TestType::Manual => "manual",
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unit" => Ok(TestType::Unit),
            "e2e" => Ok(TestType::E2e),
            "manual" => Ok(TestType::Manual),
            other => Err(format!("unknown test type: {other}")),
        }
    }
}

/// Test framework used to generate, run and repair a file's tests.
///
/// `Unspecified` serializes as the empty string and is only valid for
/// manual runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framework {
    Pytest,
    Jest,
    Playwright,
    Cypress,
    #[default]
    #[serde(rename = "")]
    Unspecified,
}

impl Framework {
    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::Pytest => "pytest",
            Framework::Jest => "jest",
            Framework::Playwright => "playwright",
            Framework::Cypress => "cypress",
            Framework::Unspecified => "",
        }
    }

    /// Test type a framework naturally runs under, used when only the
    /// framework is known (e.g. repairing an existing test file).
    pub fn default_test_type(&self) -> TestType {
        match self {
            Framework::Pytest | Framework::Jest => TestType::Unit,
            Framework::Playwright | Framework::Cypress => TestType::E2e,
            Framework::Unspecified => TestType::Manual,
        }
    }

    /// Whether this framework can be paired with the given test type.
    pub fn supports(&self, test_type: TestType) -> bool {
        matches!(
            (test_type, self),
            (TestType::Unit, Framework::Pytest)
                | (TestType::Unit, Framework::Jest)
                | (TestType::E2e, Framework::Playwright)
                | (TestType::E2e, Framework::Cypress)
                | (TestType::Manual, Framework::Unspecified)
        )
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Framework {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pytest" => Ok(Framework::Pytest),
            "jest" => Ok(Framework::Jest),
            "playwright" => Ok(Framework::Playwright),
            "cypress" => Ok(Framework::Cypress),
            "" => Ok(Framework::Unspecified),
            other => Err(format!("unknown framework: {other}")),
        }
    }
}

/// Progress marker for a run. This is the only field observers should rely
/// on to tell where a run stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Pending,
    Generating,
    Validating,
    AwaitingApproval,
    Approved,
    Saving,
    Passed,
    Failed,
    Skipped,
    Completed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Generating => "generating",
            RunStatus::Validating => "validating",
            RunStatus::AwaitingApproval => "awaiting_approval",
            RunStatus::Approved => "approved",
            RunStatus::Saving => "saving",
            RunStatus::Passed => "passed",
            RunStatus::Failed => "failed",
            RunStatus::Skipped => "skipped",
            RunStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file's journey through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    pub input_code: String,
    /// Path of the source file relative to `project_root`.
    pub file_path: String,
    pub test_type: TestType,
    pub framework: Framework,
    pub project_root: String,
    pub output_project_root: String,
    pub output_path: String,
    #[serde(default)]
    pub generated_tests: Option<String>,
    #[serde(default)]
    pub validated: bool,
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub status: RunStatus,
    #[serde(default)]
    pub test_results: Option<String>,
    #[serde(default)]
    pub slack_webhook: Option<String>,
    #[serde(default)]
    pub retry_count: u32,
}

impl RunState {
    /// Entry state for a fresh run: nothing generated, nothing approved.
    pub fn new(
        input_code: impl Into<String>,
        file_path: impl Into<String>,
        test_type: TestType,
        framework: Framework,
    ) -> Self {
        Self {
            input_code: input_code.into(),
            file_path: file_path.into(),
            test_type,
            framework,
            project_root: String::new(),
            output_project_root: String::new(),
            output_path: String::new(),
            generated_tests: None,
            validated: false,
            approved: false,
            status: RunStatus::Pending,
            test_results: None,
            slack_webhook: None,
            retry_count: 0,
        }
    }

    pub fn with_roots(
        self,
        project_root: impl Into<String>,
        output_project_root: impl Into<String>,
    ) -> Self {
        Self {
            project_root: project_root.into(),
            output_project_root: output_project_root.into(),
            ..self
        }
    }

    pub fn with_output_path(self, output_path: impl Into<String>) -> Self {
        Self {
            output_path: output_path.into(),
            ..self
        }
    }

    pub fn with_generated_tests(self, tests: impl Into<String>) -> Self {
        Self {
            generated_tests: Some(tests.into()),
            ..self
        }
    }

    pub fn with_slack_webhook(self, webhook: Option<String>) -> Self {
        Self {
            slack_webhook: webhook,
            ..self
        }
    }

    pub fn is_awaiting_approval(&self) -> bool {
        self.status == RunStatus::AwaitingApproval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RunState {
        RunState::new("def hello():\n    return 'world'", "src/hello.py", TestType::Unit, Framework::Pytest)
            .with_roots("/tmp/proj", "/tmp/proj/output")
            .with_output_path("/tmp/proj/output/test_hello.py")
    }

    #[test]
    fn test_new_state_starts_pending() {
        let state = sample();
        assert_eq!(state.status, RunStatus::Pending);
        assert_eq!(state.retry_count, 0);
        assert!(!state.validated);
        assert!(!state.approved);
        assert!(state.generated_tests.is_none());
    }

    #[test]
    fn test_status_serializes_to_fixed_vocabulary() {
        let all = [
            (RunStatus::Pending, "pending"),
            (RunStatus::Generating, "generating"),
            (RunStatus::Validating, "validating"),
            (RunStatus::AwaitingApproval, "awaiting_approval"),
            (RunStatus::Approved, "approved"),
            (RunStatus::Saving, "saving"),
            (RunStatus::Passed, "passed"),
            (RunStatus::Failed, "failed"),
            (RunStatus::Skipped, "skipped"),
            (RunStatus::Completed, "completed"),
        ];
        for (status, text) in all {
            assert_eq!(serde_json::to_string(&status).unwrap(), format!("\"{text}\""));
            assert_eq!(status.to_string(), text);
        }
    }

    #[test]
    fn test_unspecified_framework_is_empty_string() {
        assert_eq!(serde_json::to_string(&Framework::Unspecified).unwrap(), "\"\"");
        let parsed: Framework = serde_json::from_str("\"\"").unwrap();
        assert_eq!(parsed, Framework::Unspecified);
        assert_eq!("".parse::<Framework>().unwrap(), Framework::Unspecified);
    }

    #[test]
    fn test_state_json_round_trip() {
        let state = RunState {
            approved: true,
            status: RunStatus::AwaitingApproval,
            retry_count: 3,
            test_results: Some("1 failed".to_string()),
            ..sample().with_generated_tests("def test_x(): assert True")
        };
        let json = serde_json::to_string(&state).unwrap();
        let back: RunState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_framework_pairings() {
        assert!(Framework::Pytest.supports(TestType::Unit));
        assert!(Framework::Jest.supports(TestType::Unit));
        assert!(Framework::Playwright.supports(TestType::E2e));
        assert!(Framework::Cypress.supports(TestType::E2e));
        assert!(Framework::Unspecified.supports(TestType::Manual));
        assert!(!Framework::Cypress.supports(TestType::Unit));
        assert!(!Framework::Pytest.supports(TestType::Manual));
        assert_eq!(Framework::Cypress.default_test_type(), TestType::E2e);
        assert_eq!(Framework::Jest.default_test_type(), TestType::Unit);
    }
}
