//! Drive one extractor child process to completion or termination.

use std::collections::VecDeque;
use std::io;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::oneshot;

use crate::extractor::ExtractorError;

/// Lines of stderr kept for failure messages.
const STDERR_TAIL_LINES: usize = 50;

/// How the child ended.
pub(super) enum ChildExit {
    Exited { status: ExitStatus, stderr: String },
    /// Terminated through the kill channel (or because the supervisor went away).
    Killed,
}

/// Spawns `command`, feeds every stdout line to `on_line`, and waits for exit.
///
/// A message on `kill_rx`, or the sender being dropped, kills the child and
/// returns [`ChildExit::Killed`] without reading further output.
pub(super) async fn drive_child(
    mut command: Command,
    program: &str,
    mut kill_rx: oneshot::Receiver<()>,
    mut on_line: impl FnMut(&str),
) -> Result<ChildExit, ExtractorError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(|source| ExtractorError::Spawn {
        program: program.to_string(),
        source,
    })?;
    tracing::debug!(program, pid = ?child.id(), "worker process started");

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::other("child stdout not captured"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| io::Error::other("child stderr not captured"))?;
    let stderr_task = tokio::spawn(collect_tail(stderr));

    let mut lines = BufReader::new(stdout).lines();
    let status = loop {
        tokio::select! {
            _ = &mut kill_rx => {
                if let Err(e) = child.start_kill() {
                    tracing::debug!("kill worker process: {}", e);
                }
                let _ = child.wait().await;
                stderr_task.abort();
                return Ok(ChildExit::Killed);
            }
            line = lines.next_line() => match line? {
                Some(line) => on_line(&line),
                None => break child.wait().await?,
            },
        }
    };

    let stderr = stderr_task.await.unwrap_or_default();
    Ok(ChildExit::Exited { status, stderr })
}

async fn collect_tail(stream: impl AsyncRead + Unpin) -> String {
    let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        tracing::trace!(target: "mqd_core::worker::stderr", "{}", line);
        if tail.len() == STDERR_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    tail.into_iter().collect::<Vec<_>>().join("\n")
}
