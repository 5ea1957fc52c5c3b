//! Utilities for running commands with proper error handling and timeouts

use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::time::Duration;
use tracing::{debug, error};

/// Flags whose following argument is never written to logs
const SECRET_FLAGS: &[&str] = &["--password", "-p"];

/// Render a command line for logging, masking secret flag values
pub fn display_command(program: &str, args: &[&str]) -> String {
    let mut rendered = vec![program.to_string()];
    let mut mask_next = false;

    for arg in args {
        if mask_next {
            rendered.push("****".to_string());
            mask_next = false;
            continue;
        }
        mask_next = SECRET_FLAGS.contains(arg);
        rendered.push(arg.to_string());
    }

    rendered.join(" ")
}

/// Run a command with optional timeout
pub fn run_command(
    program: &str,
    args: &[&str],
    working_dir: Option<&Path>,
    timeout: Option<Duration>,
) -> Result<Output> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    let shown = display_command(program, args);
    debug!("Running command: {}", shown);

    let output = if let Some(timeout_duration) = timeout {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to build runtime for command timeout")?;

        runtime.block_on(async {
            let mut cmd = tokio::process::Command::from(cmd);
            cmd.kill_on_drop(true);
            let result = tokio::time::timeout(timeout_duration, cmd.output()).await;

            match result {
                Ok(output) => output.context(format!("Failed to execute {}", program)),
                Err(_) => Err(anyhow::anyhow!("Command timed out after {:?}", timeout_duration)),
            }
        })?
    } else {
        cmd.output()
            .context(format!("Failed to execute {}", program))?
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!("Command failed: {}", shown);
        error!("Stderr: {}", stderr.trim());
        anyhow::bail!(
            "Command failed with exit code {:?}: {}",
            output.status.code(),
            stderr.trim()
        );
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.is_empty() {
        debug!("Command output: {}", stdout.trim());
    }

    Ok(output)
}

/// Run a command and return stdout as string
pub fn run_command_stdout(
    program: &str,
    args: &[&str],
    working_dir: Option<&Path>,
    timeout: Option<Duration>,
) -> Result<String> {
    let output = run_command(program, args, working_dir, timeout)?;
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
