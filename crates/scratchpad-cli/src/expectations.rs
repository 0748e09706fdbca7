//! Expectation files.
//!
//! ```text
//! # test: greeting
//! print('hi')
//! # expect: "hi\n"
//! ```
//!
//! The expected value is a JSON string compared with the selected output.
//! A case without `# expect:` only has to run without a fault.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use scratchpad::platform::cli::python::PythonRuntime;
use scratchpad::{Outcome, Runtime};

const TEST_MARKER: &str = "# test:";
const EXPECT_MARKER: &str = "# expect:";

#[derive(Debug, PartialEq, Eq)]
struct TestCase {
    name: String,
    code: String,
    expected: Option<String>,
}

pub async fn run_files(files: &[PathBuf]) -> Result<ExitCode> {
    let mut total = 0;
    let mut passed = 0;
    let mut failed = 0;

    for file in files {
        match fs::read_to_string(file) {
            Ok(content) => {
                eprintln!("{}", file.display());
                for case in parse_cases(&content) {
                    total += 1;
                    if run_case(file, &case).await {
                        passed += 1;
                    } else {
                        failed += 1;
                    }
                }
            }
            Err(e) => {
                eprintln!("Error reading {}: {}", file.display(), e);
                failed += 1;
            }
        }
    }

    eprintln!("\n{total} tests: {passed} passed, {failed} failed");
    Ok(if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn parse_cases(content: &str) -> Vec<TestCase> {
    let mut cases = Vec::new();
    let mut current: Option<TestCase> = None;

    for line in content.lines() {
        if let Some(name) = line.strip_prefix(TEST_MARKER) {
            cases.extend(current.take());
            current = Some(TestCase {
                name: name.trim().to_string(),
                code: String::new(),
                expected: None,
            });
        } else if let Some(expected) = line.strip_prefix(EXPECT_MARKER) {
            if let Some(mut case) = current.take() {
                case.expected = Some(expected.trim().to_string());
                cases.push(case);
            }
        } else if let Some(case) = current.as_mut() {
            if !case.code.is_empty() {
                case.code.push('\n');
            }
            case.code.push_str(line);
        }
    }
    cases.extend(current);
    cases
}

/// Each case gets a fresh interpreter so cases cannot see each other's globals.
async fn run_case(file: &Path, case: &TestCase) -> bool {
    eprint!("  {} ... ", case.name);

    let capture = match PythonRuntime::new().run_captured(&case.code).await {
        Ok(capture) => capture,
        Err(e) => {
            eprintln!("FAILED: {e}");
            return false;
        }
    };
    let raised = matches!(capture.outcome, Outcome::Raised { .. });
    let actual = capture.into_output();

    let Some(expected) = &case.expected else {
        if raised {
            eprintln!("FAILED");
            eprintln!("{actual}");
            return false;
        }
        eprintln!("ok");
        return true;
    };

    match serde_json::from_str::<String>(expected) {
        Ok(expected) if expected == actual => {
            eprintln!("ok");
            true
        }
        Ok(_) => {
            eprintln!("FAILED");
            eprintln!("    expected: {expected}");
            eprintln!(
                "    actual:   {}",
                serde_json::Value::String(actual)
            );
            false
        }
        Err(e) => {
            eprintln!(
                "FAILED (invalid expected JSON in {}: {e})",
                file.display()
            );
            false
        }
    }
}
