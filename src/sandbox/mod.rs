// src/sandbox/mod.rs
//! Code execution sandbox
//!
//! Runs one candidate solution against a task's test cases. Each test case
//! executes in a fresh interpreter subprocess: isolated mode (`-I`), scrubbed
//! environment, no stdin, and a hard wall-clock timeout with forced
//! termination (`kill_on_drop`). Stdout is the sole structured output channel;
//! stderr is opaque diagnostic text, truncated to a bounded length.
//!
//! This executor sits on the hot path of untrusted-input execution and never
//! raises past its boundary: every failure mode is captured as data in the
//! returned [`TestResult`].

use crate::game::model::{FailedTest, TestCase, TestResult};
use crate::utils::config::SandboxConfig;
use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Bound on recorded stderr diagnostics, in characters (tail kept)
const STDERR_CHAR_LIMIT: usize = 500;

/// Bound on recorded unparseable stdout, in characters (head kept)
const STDOUT_CHAR_LIMIT: usize = 200;

enum CaseOutcome {
    Passed,
    Failed { actual: Option<Value>, error: Option<String> },
}

pub struct SandboxExecutor {
    python_bin: String,
    timeout: Duration,
}

impl SandboxExecutor {
    pub fn new(config: &SandboxConfig) -> Self {
        Self {
            python_bin: config.python_bin.clone(),
            timeout: Duration::from_secs(config.test_timeout_secs),
        }
    }

    /// Run `code` against every test case in index order, invoking
    /// `entry_point(*args)` and comparing the JSON-serialized return value
    /// structurally against the expected value.
    pub async fn run_tests(
        &self,
        code: &str,
        entry_point: &str,
        test_cases: &[TestCase],
    ) -> TestResult {
        let mut passed_tests = 0;
        let mut failed_tests = Vec::new();

        for (test_index, test) in test_cases.iter().enumerate() {
            match self.run_case(code, entry_point, test).await {
                CaseOutcome::Passed => passed_tests += 1,
                CaseOutcome::Failed { actual, error } => failed_tests.push(FailedTest {
                    test_index,
                    input: test.input.clone(),
                    expected: test.expected.clone(),
                    actual,
                    error,
                }),
            }
        }

        let result = TestResult {
            passed: passed_tests == test_cases.len(),
            total_tests: test_cases.len(),
            passed_tests,
            failed_tests,
        };
        debug!(
            entry_point,
            passed = result.passed,
            "{}/{} tests passed",
            result.passed_tests,
            result.total_tests
        );
        result
    }

    async fn run_case(&self, code: &str, entry_point: &str, test: &TestCase) -> CaseOutcome {
        let script = match harness_script(code, entry_point, test) {
            Ok(script) => script,
            Err(e) => return fail_with_error(e),
        };

        let mut command = Command::new(&self.python_bin);
        command
            .arg("-I")
            .arg("-c")
            .arg(&script)
            .env_clear()
            .env("PATH", "/usr/local/bin:/usr/bin:/bin")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = match command.spawn() {
            Ok(child) => child,
            Err(e) => return fail_with_error(format!("failed to spawn interpreter: {e}")),
        };

        // Dropping the timed-out future kills the interpreter via kill_on_drop
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Err(_) => {
                return fail_with_error(format!("TIMEOUT (>{}s)", self.timeout.as_secs()));
            }
            Ok(Err(e)) => return fail_with_error(format!("{e}")),
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return fail_with_error(tail_chars(stderr.trim(), STDERR_CHAR_LIMIT));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        match serde_json::from_str::<Value>(stdout.trim()) {
            Err(_) => fail_with_error(format!(
                "Invalid output: {}",
                head_chars(stdout.trim(), STDOUT_CHAR_LIMIT)
            )),
            Ok(actual) if actual == test.expected => CaseOutcome::Passed,
            Ok(actual) => CaseOutcome::Failed { actual: Some(actual), error: None },
        }
    }
}

/// Combine candidate code with the fixed invocation harness. Args are passed
/// through `json.loads` of a quoted literal, so any JSON value survives the
/// trip into Python.
fn harness_script(code: &str, entry_point: &str, test: &TestCase) -> Result<String, String> {
    let args_json =
        serde_json::to_string(&test.input).map_err(|e| format!("unserializable args: {e}"))?;
    let args_literal =
        serde_json::to_string(&args_json).map_err(|e| format!("unserializable args: {e}"))?;

    Ok(format!(
        "import json\n{code}\nargs = json.loads({args_literal})\nresult = {entry_point}(*args)\nprint(json.dumps(result))\n"
    ))
}

fn fail_with_error(error: String) -> CaseOutcome {
    CaseOutcome::Failed { actual: None, error: Some(error) }
}

fn head_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

fn tail_chars(s: &str, n: usize) -> String {
    let len = s.chars().count();
    s.chars().skip(len.saturating_sub(n)).collect()
}
