//! Command execution abstraction for testability
//!
//! This module provides a trait-based abstraction for command execution,
//! enabling dependency injection and mocking for tests.

use anyhow::Result;
use std::path::Path;
use std::process::Output;
use std::time::Duration;

/// Abstraction for command execution, enabling mocking in tests
pub trait CommandExecutor: Send + Sync {
    /// Run a command with optional timeout
    fn run_command(
        &self,
        program: &str,
        args: &[&str],
        working_dir: Option<&Path>,
        timeout: Option<Duration>,
    ) -> Result<Output>;

    /// Run a command and return stdout as string
    fn run_command_stdout(
        &self,
        program: &str,
        args: &[&str],
        working_dir: Option<&Path>,
        timeout: Option<Duration>,
    ) -> Result<String> {
        let output = self.run_command(program, args, working_dir, timeout)?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Default implementation using real subprocess calls
#[derive(Debug, Clone, Default)]
pub struct RealExecutor;

impl RealExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for RealExecutor {
    fn run_command(
        &self,
        program: &str,
        args: &[&str],
        working_dir: Option<&Path>,
        timeout: Option<Duration>,
    ) -> Result<Output> {
        super::command::run_command(program, args, working_dir, timeout)
    }

    fn run_command_stdout(
        &self,
        program: &str,
        args: &[&str],
        working_dir: Option<&Path>,
        timeout: Option<Duration>,
    ) -> Result<String> {
        super::command::run_command_stdout(program, args, working_dir, timeout)
    }
}

/// A mock executor for testing that records calls and returns configured responses
/// Available for use in external test crates
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Recorded command invocation
    #[derive(Clone, Debug)]
    pub struct CommandCall {
        pub program: String,
        pub args: Vec<String>,
        pub working_dir: Option<String>,
    }

    impl CommandCall {
        /// Whether any argument equals `needle`
        pub fn has_arg(&self, needle: &str) -> bool {
            self.args.iter().any(|a| a == needle)
        }
    }

    /// Response configuration for mock
    #[derive(Clone, Debug)]
    pub enum MockResponse {
        Success { stdout: String, stderr: String },
        Failure { stderr: String, exit_code: i32 },
        Timeout,
    }

    impl MockResponse {
        pub fn stdout(stdout: &str) -> Self {
            MockResponse::Success {
                stdout: stdout.to_string(),
                stderr: String::new(),
            }
        }

        pub fn failure(stderr: &str) -> Self {
            MockResponse::Failure {
                stderr: stderr.to_string(),
                exit_code: 1,
            }
        }
    }

    impl Default for MockResponse {
        fn default() -> Self {
            MockResponse::Success {
                stdout: String::new(),
                stderr: String::new(),
            }
        }
    }

    /// Response override for calls to `program` carrying a specific argument
    #[derive(Clone, Debug)]
    struct ArgRule {
        program: String,
        arg: String,
        response: MockResponse,
    }

    /// Mock executor for testing
    #[derive(Clone, Default)]
    pub struct MockExecutor {
        /// Recorded command invocations
        pub calls: Arc<Mutex<Vec<CommandCall>>>,
        /// Pre-configured responses: program name -> response
        responses: Arc<Mutex<HashMap<String, MockResponse>>>,
        /// Argument-specific responses, checked before `responses`
        arg_rules: Arc<Mutex<Vec<ArgRule>>>,
        /// Default response when no specific response is configured
        default_response: Arc<Mutex<MockResponse>>,
        /// Create the `tar czf <archive>` output file on success
        touch_archives: Arc<Mutex<bool>>,
    }

    impl MockExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        /// Configure a response for a specific program
        pub fn expect(self, program: &str, response: MockResponse) -> Self {
            self.responses
                .lock()
                .unwrap()
                .insert(program.to_string(), response);
            self
        }

        /// Configure a response for calls to `program` that include `arg`
        pub fn expect_with_arg(self, program: &str, arg: &str, response: MockResponse) -> Self {
            self.arg_rules.lock().unwrap().push(ArgRule {
                program: program.to_string(),
                arg: arg.to_string(),
                response,
            });
            self
        }

        /// Set the default response for unconfigured programs
        pub fn with_default_response(self, response: MockResponse) -> Self {
            *self.default_response.lock().unwrap() = response;
            self
        }

        /// Write an empty file at the archive path of successful `tar` calls
        pub fn touching_archives(self) -> Self {
            *self.touch_archives.lock().unwrap() = true;
            self
        }

        /// Get all recorded calls
        pub fn get_calls(&self) -> Vec<CommandCall> {
            self.calls.lock().unwrap().clone()
        }

        /// Get recorded calls to a specific program
        pub fn calls_to(&self, program: &str) -> Vec<CommandCall> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.program == program)
                .cloned()
                .collect()
        }

        /// Check if a program was called
        pub fn was_called(&self, program: &str) -> bool {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .any(|c| c.program == program)
        }

        /// Get number of calls to a specific program
        pub fn call_count(&self, program: &str) -> usize {
            self.calls_to(program).len()
        }

        fn record_call(&self, program: &str, args: &[&str], working_dir: Option<&Path>) {
            self.calls.lock().unwrap().push(CommandCall {
                program: program.to_string(),
                args: args.iter().map(|s| s.to_string()).collect(),
                working_dir: working_dir.map(|p| p.display().to_string()),
            });
        }

        fn get_response(&self, program: &str, args: &[&str]) -> MockResponse {
            let rule = self
                .arg_rules
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.program == program && args.contains(&r.arg.as_str()))
                .map(|r| r.response.clone());

            if let Some(response) = rule {
                return response;
            }

            self.responses
                .lock()
                .unwrap()
                .get(program)
                .cloned()
                .unwrap_or_else(|| self.default_response.lock().unwrap().clone())
        }

        fn touch_archive(&self, program: &str, args: &[&str]) {
            if program != "tar" || !*self.touch_archives.lock().unwrap() {
                return;
            }
            if let Some(archive) = args.get(1) {
                let _ = std::fs::write(archive, b"");
            }
        }

        fn execute_response(&self, response: MockResponse) -> Result<Output> {
            match response {
                MockResponse::Success { stdout, stderr } => Ok(Output {
                    status: std::process::ExitStatus::default(),
                    stdout: stdout.into_bytes(),
                    stderr: stderr.into_bytes(),
                }),
                MockResponse::Failure { stderr, exit_code } => {
                    anyhow::bail!("Command failed with exit code {:?}: {}", exit_code, stderr)
                }
                MockResponse::Timeout => {
                    anyhow::bail!("Command timed out")
                }
            }
        }
    }

    impl CommandExecutor for MockExecutor {
        fn run_command(
            &self,
            program: &str,
            args: &[&str],
            working_dir: Option<&Path>,
            _timeout: Option<Duration>,
        ) -> Result<Output> {
            self.record_call(program, args, working_dir);
            let response = self.get_response(program, args);
            if matches!(response, MockResponse::Success { .. }) {
                self.touch_archive(program, args);
            }
            self.execute_response(response)
        }
    }
}
