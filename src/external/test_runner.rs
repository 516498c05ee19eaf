//! Framework-specific test runner command lines

use std::path::Path;

use super::command::Invocation;
use crate::config::RunnerConfig;
use crate::workflows::state::{Framework, TestType};

/// Build the runner invocation for a test file, or `None` when the
/// test type / framework pairing has no runner.
///
/// The returned invocation carries the configured timeout and the CI
/// marker; the caller sets the working directory.
pub fn runner_invocation(
    test_type: TestType,
    framework: Framework,
    resolved_path: &Path,
    config: &RunnerConfig,
) -> Option<Invocation> {
    let path = resolved_path.to_string_lossy().to_string();

    let (program, args) = match (test_type, framework) {
        (TestType::Unit, Framework::Pytest) | (TestType::E2e, Framework::Playwright) => {
            (config.pytest_program.clone(), vec![path])
        }
        (TestType::Unit, Framework::Jest) => (
            config.npx_program.clone(),
            vec!["--yes".to_string(), "jest".to_string(), path],
        ),
        (TestType::E2e, Framework::Cypress) => (
            config.npx_program.clone(),
            vec![
                "cypress".to_string(),
                "run".to_string(),
                "--spec".to_string(),
                path,
            ],
        ),
        _ => return None,
    };

    Some(Invocation::new(program, args, config.timeout()).env("CI", "1"))
}
