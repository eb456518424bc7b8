// Helper functions for backend and transcoder implementations

use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;
use tracing::debug;

use super::errors::ProcessError;

/// Run command with timeout (shared utility)
///
/// The child is killed when the timeout fires or when the returned future is
/// dropped.
pub async fn run_output_with_timeout(
    program: &str,
    args: &[String],
    limit: Duration,
) -> Result<Output, ProcessError> {
    debug!(program, args = %args.join(" "), "spawning");

    let mut child = TokioCommand::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ProcessError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let io_err = |source| ProcessError::Io {
        program: program.to_string(),
        source,
    };

    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| io_err(std::io::Error::other("stdout not captured")))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| io_err(std::io::Error::other("stderr not captured")))?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });

    match timeout(limit, child.wait()).await {
        Ok(status_res) => {
            let status = status_res.map_err(io_err)?;
            let stdout = join_pipe(stdout_task).await.map_err(io_err)?;
            let stderr = join_pipe(stderr_task).await.map_err(io_err)?;
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
            Err(ProcessError::Timeout {
                program: program.to_string(),
                secs: limit.as_secs(),
            })
        }
    }
}

async fn join_pipe(
    task: tokio::task::JoinHandle<std::io::Result<Vec<u8>>>,
) -> std::io::Result<Vec<u8>> {
    task.await.map_err(std::io::Error::other)?
}

/// Last non-empty line of process output, trimmed
pub fn last_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Format a byte count as megabytes for user-facing messages ("12.3MB")
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.1}MB", bytes as f64 / 1_048_576.0)
}

/// Cut `text` to at most `max_chars` characters, ending in "…" when cut
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(1);
    let end = text.char_indices().nth(keep).map_or(text.len(), |(idx, _)| idx);
    format!("{}…", &text[..end])
}
