// Helper functions for backend implementations

use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

use super::errors::BackendError;

/// Run command with timeout, killing the child when the deadline passes
pub async fn run_output_with_timeout(
    program: &str,
    args: &[String],
    timeout_secs: u64,
) -> Result<Output, BackendError> {
    let mut child = TokioCommand::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BackendError::ToolNotFound(program.to_string())
            } else {
                BackendError::ExecutionError(format!("Failed to start {}: {}", program, e))
            }
        })?;

    let mut stdout_pipe = child.stdout.take().ok_or_else(|| {
        BackendError::ExecutionError(format!("Failed to capture stdout from {}", program))
    })?;
    let mut stderr_pipe = child.stderr.take().ok_or_else(|| {
        BackendError::ExecutionError(format!("Failed to capture stderr from {}", program))
    })?;

    // Drain both pipes concurrently so a chatty child can't fill one and stall
    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });

    match timeout(Duration::from_secs(timeout_secs), child.wait()).await {
        Ok(status) => {
            let status = status.map_err(|e| {
                BackendError::ExecutionError(format!("Failed to wait for {}: {}", program, e))
            })?;
            let stdout = join_pipe(stdout_task, "stdout").await?;
            let stderr = join_pipe(stderr_task, "stderr").await?;
            Ok(Output {
                status,
                stdout,
                stderr,
            })
        }
        Err(_) => {
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            tracing::warn!(program, timeout_secs, "child process timed out");
            Err(BackendError::NetworkTimeout)
        }
    }
}

async fn join_pipe(
    task: tokio::task::JoinHandle<std::io::Result<Vec<u8>>>,
    pipe: &str,
) -> Result<Vec<u8>, BackendError> {
    task.await
        .map_err(|e| BackendError::ExecutionError(format!("{} task failed: {}", pipe, e)))?
        .map_err(|e| BackendError::ExecutionError(format!("Failed to read {}: {}", pipe, e)))
}

/// First existing path among well-known install locations, else the bare name
pub fn locate_binary(name: &str, candidates: &[&str]) -> String {
    candidates
        .iter()
        .find(|path| Path::new(path).exists())
        .map(|path| path.to_string())
        .unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_program_is_tool_not_found() {
        let result = run_output_with_timeout("definitely-not-a-real-binary-xyz", &[], 5).await;
        assert!(matches!(result, Err(BackendError::ToolNotFound(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_stdout() {
        let output = run_output_with_timeout("sh", &["-c".to_string(), "echo hi".to_string()], 5)
            .await
            .unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hi");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_program_times_out() {
        let result =
            run_output_with_timeout("sh", &["-c".to_string(), "sleep 5".to_string()], 1).await;
        assert!(matches!(result, Err(BackendError::NetworkTimeout)));
    }

    #[test]
    fn locate_binary_falls_back_to_name() {
        assert_eq!(locate_binary("yt-dlp", &["/nonexistent/yt-dlp"]), "yt-dlp");
    }
}
