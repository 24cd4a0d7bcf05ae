//! Event pump: drain worker events and apply them to task state.

use std::collections::HashMap;

use tokio::sync::mpsc::error::TryRecvError;

use super::{Supervisor, STATUS_DOWNLOADED_PREFIX};
use crate::event::{
    EventPayload, FinishOutcome, Notification, ProgressReport, ProgressStatus, WorkerEvent,
    WorkerId,
};
use crate::extractor::Extractor;
use crate::media::MediaInfo;
use crate::task::{TaskIndex, TaskStatus};
use crate::worker::WorkerHandle;

/// Fallback message for an info failure that came without one.
const INFO_ERROR: &str = "Error";

impl<E: Extractor> Supervisor<E> {
    /// Drain every event currently queued, without waiting for more.
    /// Returns the number of events consumed.
    ///
    /// Call this on a fixed interval (see [`SupervisorOptions::poll_interval`]).
    /// Events from workers that were already stopped are consumed and dropped.
    ///
    /// [`SupervisorOptions::poll_interval`]: super::SupervisorOptions::poll_interval
    pub async fn poll(&mut self) -> usize {
        let mut handled = 0;
        loop {
            match self.events_rx.try_recv() {
                Ok(event) => {
                    self.apply(event).await;
                    handled += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        handled
    }

    /// A `tokio::time::Interval` ticking at the configured poll interval.
    pub fn poll_timer(&self) -> tokio::time::Interval {
        let mut timer = tokio::time::interval(self.options.poll_interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        timer
    }

    async fn apply(&mut self, event: WorkerEvent) {
        let WorkerEvent {
            index,
            worker,
            payload,
        } = event;
        let kind = payload.kind();
        let current = match &payload {
            EventPayload::InfoOk { .. } | EventPayload::InfoErr { .. } => {
                is_current(&self.info_workers, index, worker)
            }
            _ => is_current(&self.download_workers, index, worker),
        };
        if !current {
            tracing::debug!(index, worker = worker.0, kind, "dropping event from stale worker");
            return;
        }

        match payload {
            EventPayload::InfoOk { info } => {
                self.cleanup_info(index).await;
                self.apply_info(index, &info);
                self.notify(Notification::InfoReceived { index, info });
            }
            EventPayload::InfoErr { message } => {
                self.cleanup_info(index).await;
                let message = if message.is_empty() {
                    INFO_ERROR.to_string()
                } else {
                    message
                };
                self.notify(Notification::InfoFailed { index, message });
            }
            EventPayload::Status { text } => {
                self.notify(Notification::StatusChanged { index, text });
            }
            EventPayload::Progress { report } => self.apply_progress(index, &report),
            EventPayload::Done { ok, message } => {
                self.cleanup_download(index).await;
                self.apply_done(index, ok, message);
            }
        }
    }

    pub(super) fn apply_info(&mut self, index: TaskIndex, info: &MediaInfo) {
        let filename = info.destination_filename(self.extractor.output_extension());
        let output_path = self.options.out_dir.join(&filename);
        if let Some(task) = self.tasks.get_mut(index) {
            task.title = Some(info.title_or_default().to_string());
            task.filename = Some(filename);
            task.output_path = Some(output_path);
            task.info = Some(info.clone());
        }
    }

    pub(super) fn apply_progress(&mut self, index: TaskIndex, report: &ProgressReport) {
        let Some(task) = self.tasks.get_mut(index) else {
            return;
        };
        let text = match report.status {
            ProgressStatus::Downloading => {
                // Multi-file downloads restart at 0 per file; never report a drop.
                task.progress = report.percent().max(task.progress);
                format!("{STATUS_DOWNLOADED_PREFIX} {:.2}%", task.progress)
            }
            ProgressStatus::Finished => {
                task.progress = 100.0;
                match &report.filename {
                    Some(f) => format!("File ready: {f}"),
                    None => "File ready".to_string(),
                }
            }
            ProgressStatus::Error | ProgressStatus::Other => return,
        };
        let percent = task.progress;
        self.notify(Notification::ProgressChanged { index, percent });
        self.notify(Notification::StatusChanged { index, text });
    }

    fn apply_done(&mut self, index: TaskIndex, ok: bool, message: String) {
        let Some(task) = self.tasks.get_mut(index) else {
            return;
        };
        if !ok && task.status == TaskStatus::Stopped {
            // Exit caused by a stop; already reported as stopped.
            return;
        }
        let reached_full = task.progress >= 100.0;
        let outcome = if ok {
            task.status = TaskStatus::Done;
            task.progress = 100.0;
            tracing::info!(index, "download completed");
            FinishOutcome::Completed { message }
        } else {
            task.status = TaskStatus::Stopped;
            tracing::warn!(index, "download failed: {}", message);
            FinishOutcome::Failed { message }
        };
        if ok && !reached_full {
            self.notify(Notification::ProgressChanged {
                index,
                percent: 100.0,
            });
        }
        self.notify(Notification::Finished { index, outcome });
    }

    async fn cleanup_info(&mut self, index: TaskIndex) {
        if let Some(handle) = self.info_workers.remove(&index) {
            handle.join_within(self.options.cleanup_timeout).await;
        }
    }

    async fn cleanup_download(&mut self, index: TaskIndex) {
        if let Some(handle) = self.download_workers.remove(&index) {
            handle.join_within(self.options.cleanup_timeout).await;
        }
    }
}

fn is_current(workers: &HashMap<TaskIndex, WorkerHandle>, index: TaskIndex, worker: WorkerId) -> bool {
    workers.get(&index).is_some_and(|h| h.id() == worker)
}
