//! Worker processes: one per info fetch and one per download.
//!
//! A worker is a tokio task owning one extractor child process. It reports
//! through the shared event channel only; failures of any kind become events
//! and never propagate to the supervisor.

mod child;
mod guard;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::event::{EventPayload, WorkerEvent, WorkerId};
use crate::extractor::{DownloadRequest, Extractor, ExtractorError};
use crate::task::TaskIndex;

use child::{drive_child, ChildExit};
use guard::ReportGuard;

pub(crate) const DOWNLOAD_STARTING: &str = "Download starting";
pub(crate) const DOWNLOAD_COMPLETE: &str = "Download complete";

/// Supervisor-side reference to a running worker.
#[derive(Debug)]
pub(crate) struct WorkerHandle {
    id: WorkerId,
    kill_tx: Option<oneshot::Sender<()>>,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    pub(crate) fn id(&self) -> WorkerId {
        self.id
    }

    /// True once the worker task has returned (its final event, if any, is queued).
    pub(crate) fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Kill the child process and wait at most `wait` for the worker to exit.
    pub(crate) async fn terminate(mut self, wait: Duration) -> bool {
        if let Some(tx) = self.kill_tx.take() {
            let _ = tx.send(());
        }
        self.join_within(wait).await
    }

    /// Wait at most `wait` for the worker task; abort it if it is still running.
    /// Returns whether it exited in time.
    pub(crate) async fn join_within(mut self, wait: Duration) -> bool {
        let joined = tokio::time::timeout(wait, &mut self.join).await;
        match joined {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!(worker = self.id.0, "worker task failed: {}", e);
                true
            }
            Err(_) => {
                tracing::warn!(worker = self.id.0, "worker did not exit within {:?}", wait);
                self.join.abort();
                false
            }
        }
    }
}

/// Start an info-fetch worker for `url`.
pub(crate) fn spawn_info<E: Extractor>(
    extractor: Arc<E>,
    index: TaskIndex,
    id: WorkerId,
    url: String,
    events: UnboundedSender<WorkerEvent>,
) -> WorkerHandle {
    let (kill_tx, kill_rx) = oneshot::channel();
    let join = tokio::spawn(async move {
        let guard = ReportGuard::new(
            events,
            index,
            id,
            EventPayload::InfoErr {
                message: "info worker exited unexpectedly".to_string(),
            },
        );
        match fetch_info(extractor.as_ref(), &url, kill_rx).await {
            Ok(Some(info)) => guard.finish(EventPayload::InfoOk {
                info: Box::new(info),
            }),
            Ok(None) => guard.disarm(),
            Err(e) => {
                tracing::info!(index, "info fetch failed: {}", e);
                guard.finish(EventPayload::InfoErr {
                    message: e.to_string(),
                });
            }
        }
    });
    WorkerHandle {
        id,
        kill_tx: Some(kill_tx),
        join,
    }
}

async fn fetch_info<E: Extractor>(
    extractor: &E,
    url: &str,
    kill_rx: oneshot::Receiver<()>,
) -> Result<Option<crate::media::MediaInfo>, ExtractorError> {
    let mut stdout = String::new();
    let exit = drive_child(extractor.info_command(url), extractor.program(), kill_rx, |line| {
        stdout.push_str(line);
        stdout.push('\n');
    })
    .await?;

    match exit {
        ChildExit::Killed => Ok(None),
        ChildExit::Exited { status, stderr } if !status.success() => Err(ExtractorError::Failed {
            code: status.code(),
            message: extractor.failure_message(&stderr, status),
        }),
        ChildExit::Exited { .. } => extractor.parse_info(&stdout).map(Some),
    }
}

/// Start a download worker for `url`.
pub(crate) fn spawn_download<E: Extractor>(
    extractor: Arc<E>,
    index: TaskIndex,
    id: WorkerId,
    url: String,
    request: DownloadRequest,
    events: UnboundedSender<WorkerEvent>,
) -> WorkerHandle {
    let (kill_tx, kill_rx) = oneshot::channel();
    let join = tokio::spawn(async move {
        let guard = ReportGuard::new(
            events,
            index,
            id,
            EventPayload::Done {
                ok: false,
                message: "download worker exited unexpectedly".to_string(),
            },
        );
        guard.send(EventPayload::Status {
            text: DOWNLOAD_STARTING.to_string(),
        });

        let command = extractor.download_command(&url, &request);
        let result = drive_child(command, extractor.program(), kill_rx, |line| {
            match extractor.parse_progress(line) {
                Some(report) => guard.send(EventPayload::Progress { report }),
                None => tracing::trace!(index, "extractor: {}", line),
            }
        })
        .await;

        match result {
            Ok(ChildExit::Killed) => guard.disarm(),
            Ok(ChildExit::Exited { status, .. }) if status.success() => {
                guard.finish(EventPayload::Done {
                    ok: true,
                    message: DOWNLOAD_COMPLETE.to_string(),
                });
            }
            Ok(ChildExit::Exited { status, stderr }) => {
                let message = extractor.failure_message(&stderr, status);
                tracing::info!(index, %status, "download failed: {}", message);
                guard.finish(EventPayload::Done { ok: false, message });
            }
            Err(e) => {
                tracing::info!(index, "download worker error: {}", e);
                guard.finish(EventPayload::Done {
                    ok: false,
                    message: e.to_string(),
                });
            }
        }
    });
    WorkerHandle {
        id,
        kill_tx: Some(kill_tx),
        join,
    }
}
