//! Helpers for the external audio tools (TTS engines, players, yt-dlp)

use std::{io::ErrorKind, process::Stdio, time::Duration};
use tokio::process::{Child, Command};
use tracing::debug;

/// Run a tool to completion with its output discarded.
pub async fn run_quiet(program: &str, args: &[&str], timeout: Duration) -> Result<(), String> {
    debug!("Running {} {:?}", program, args);

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| format!("Failed to execute {}: {}", program, e))?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| format!("{} timed out after {:?}", program, timeout))?
        .map_err(|e| format!("Failed to wait for {}: {}", program, e))?;

    if !output.status.success() {
        return Err(format!(
            "{} failed (exit code: {})",
            program,
            output.status.code().unwrap_or(-1)
        ));
    }
    Ok(())
}

/// Run a tool and return its trimmed stdout.
pub async fn run_capture(program: &str, args: &[&str], timeout: Duration) -> Result<String, String> {
    debug!("Running {} {:?}", program, args);

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| format!("Failed to execute {}: {}", program, e))?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| format!("{} timed out after {:?}", program, timeout))?
        .map_err(|e| format!("Failed to wait for {}: {}", program, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("{} failed: {}", program, stderr.trim()));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Spawn the first candidate that exists on this system.
///
/// Each candidate is a program plus its arguments. Candidates that are not
/// installed are skipped; any other spawn error is returned immediately.
pub fn spawn_first(candidates: &[(&str, Vec<String>)]) -> Result<Child, String> {
    for (program, args) in candidates {
        let spawned = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();

        match spawned {
            Ok(child) => {
                debug!("Spawned {}", program);
                return Ok(child);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(format!("Failed to execute {}: {}", program, e)),
        }
    }

    let names: Vec<&str> = candidates.iter().map(|(program, _)| *program).collect();
    Err(format!("None of {:?} is installed", names))
}
