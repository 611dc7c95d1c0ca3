use anyhow::{Context, Result};
use std::io::Write;
use std::process::{Command, Output, Stdio};

/// Run a command and capture its raw output, whatever the exit status
pub fn output(cmd: &str, args: &[&str]) -> Result<Output> {
    Command::new(cmd)
        .args(args)
        .output()
        .with_context(|| format!("Failed to execute: {} {}", cmd, args.join(" ")))
}

/// Run a command and capture output
pub fn run_capture(cmd: &str, args: &[&str]) -> Result<String> {
    let output = output(cmd, args)?;
    check(cmd, args, &output)?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Run a command with `input` on stdin, failing on a non-zero exit
pub fn run_with_input(cmd: &str, args: &[&str], input: &[u8]) -> Result<()> {
    let mut child = Command::new(cmd)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to execute: {} {}", cmd, args.join(" ")))?;

    child
        .stdin
        .take()
        .context("Child process has no stdin")?
        .write_all(input)
        .with_context(|| format!("Failed to write stdin of {}", cmd))?;

    let output = child
        .wait_with_output()
        .with_context(|| format!("Failed to wait for {}", cmd))?;
    check(cmd, args, &output)
}

/// Check if a command exists
pub fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn check(cmd: &str, args: &[&str], output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!(
        "Command failed: {} {} ({}): {}",
        cmd,
        args.join(" "),
        output.status,
        stderr.trim()
    )
}
