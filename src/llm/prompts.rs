// Prompt text for each supported test type / framework pairing.

use super::{GenerationRequest, GeneratorError, RepairRequest};
use crate::workflows::state::{Framework, TestType};

const CODE_ONLY: &str = "Include comments where they explain the test logic, \
but do not add any text or explanations outside the code.";

const NO_TYPESCRIPT: &str = "Important:\n\
- Output ONLY valid JavaScript, no TypeScript syntax.\n\
- Do not use \"as\" type assertions or type imports.\n\
- Do not include explanations or markdown.";

pub fn generation_prompt(request: &GenerationRequest<'_>) -> Result<String, GeneratorError> {
    let GenerationRequest {
        test_type,
        framework,
        source_code,
        file_path,
    } = *request;

    let prompt = match (test_type, framework) {
        (TestType::Unit, Framework::Pytest) => format!(
            "You are an expert QA engineer.\n\
             Generate Python unit tests using pytest for this file:\n\n{file_path}\n\n\
             The contents of the file are:\n\n{source_code}\n\n\
             Return only valid Python code and make sure imports are correct. {CODE_ONLY}\n"
        ),
        (TestType::Unit, Framework::Jest) => format!(
            "You are an expert QA engineer.\n\
             Generate JavaScript unit tests using Jest for this file:\n\n{file_path}\n\n\
             The contents of the file are:\n\n{source_code}\n\n\
             Return only valid JavaScript code and make sure imports are correct. {CODE_ONLY}\n\n\
             {NO_TYPESCRIPT}\n"
        ),
        (TestType::E2e, Framework::Playwright) => format!(
            "You are an expert QA engineer.\n\
             Generate end-to-end tests using Playwright for Python for this web application code:\n\n\
             {source_code}\n\n\
             Return only valid Python code. {CODE_ONLY}\n"
        ),
        (TestType::E2e, Framework::Cypress) => format!(
            "You are an expert QA engineer.\n\
             Generate end-to-end tests using Cypress (JavaScript) for this web application code:\n\n\
             {source_code}\n\n\
             Return only valid JavaScript code. {CODE_ONLY}\n"
        ),
        (TestType::Manual, _) => format!(
            "You are a senior QA analyst.\n\
             Given this PRD and its user stories, write a detailed manual QA checklist:\n\n\
             {source_code}\n\n\
             Title the document \"Manual Testing Checklist\". Return a numbered list of \
             checklist steps written as `1. [ ] ...`, followed by the related user stories \
             written as `As a <role>, I want <goal> so that <benefit>`.\n"
        ),
        _ => {
            return Err(GeneratorError::UnsupportedCombination {
                test_type: test_type.to_string(),
                framework: framework.to_string(),
            })
        }
    };
    Ok(prompt)
}

pub fn repair_prompt(request: &RepairRequest<'_>) -> Result<String, GeneratorError> {
    let RepairRequest {
        framework,
        source_code,
        failing_tests,
        failure_output,
    } = *request;

    let context = format!(
        "Here is the code under test:\n\n{source_code}\n\n\
         Here is the failing test code:\n\n{failing_tests}\n\n\
         Please correct the tests so they pass."
    );

    let prompt = match framework {
        Framework::Pytest => format!(
            "You are an expert Python QA engineer.\n\n\
             The following tests failed when executed:\n\n{failure_output}\n\n{context}\n\n\
             Return ONLY valid Python code. Do not include explanations or markdown.\n"
        ),
        Framework::Playwright => format!(
            "You are an expert Python QA engineer.\n\n\
             The following Playwright tests failed:\n\n{failure_output}\n\n{context}\n\n\
             Return ONLY valid Python code. Do not include explanations or markdown.\n"
        ),
        Framework::Jest => format!(
            "You are an expert JavaScript QA engineer.\n\n\
             The following Jest tests failed:\n\n{failure_output}\n\n{context}\n\n\
             Important:\n\
             - Output ONLY valid JavaScript, no TypeScript syntax.\n\
             - Use correct Jest imports and mocks.\n\
             - Do not repeat the same failing patterns.\n\
             - Return ONLY the full corrected test file.\n"
        ),
        Framework::Cypress => format!(
            "You are an expert QA engineer.\n\n\
             The following Cypress tests failed:\n\n{failure_output}\n\n{context}\n\n\
             Return ONLY valid JavaScript code. Do not include explanations or markdown.\n"
        ),
        Framework::Unspecified => return Err(GeneratorError::UnsupportedRepair(framework)),
    };
    Ok(prompt)
}
