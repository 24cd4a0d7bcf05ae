//! Task supervisor.
//!
//! Owns the task list and the worker handles. Starting an info fetch or a
//! download spawns an isolated worker process; workers report through a
//! shared event channel which the owner drains with [`Supervisor::poll`] on a
//! fixed interval. The supervisor never blocks on a worker except for the
//! bounded join after a stop or during cleanup.
//!
//! The supervisor is single-owner (`&mut self` everywhere) and must be used
//! inside a tokio runtime.

mod error;
mod options;
mod pump;

pub use error::SupervisorError;
pub use options::SupervisorOptions;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::event::{FinishOutcome, Notification, WorkerEvent, WorkerId};
use crate::extractor::{DownloadRequest, Extractor};
use crate::task::{Enqueued, Task, TaskIndex, TaskList, TaskStatus};
use crate::worker::{self, WorkerHandle};

pub const STATUS_STARTED: &str = "Started";
pub const STATUS_STOPPED: &str = "Stopped";
/// Start of the status text sent with each download percent, e.g. `Downloaded: 42.00%`.
pub const STATUS_DOWNLOADED_PREFIX: &str = "Downloaded:";

pub struct Supervisor<E: Extractor> {
    extractor: Arc<E>,
    options: SupervisorOptions,
    tasks: TaskList,
    events_tx: UnboundedSender<WorkerEvent>,
    events_rx: UnboundedReceiver<WorkerEvent>,
    notify_tx: UnboundedSender<Notification>,
    info_workers: HashMap<TaskIndex, WorkerHandle>,
    download_workers: HashMap<TaskIndex, WorkerHandle>,
    next_worker: u64,
}

impl<E: Extractor> Supervisor<E> {
    /// Create a supervisor and the receiver its notifications are delivered to.
    pub fn new(extractor: E, options: SupervisorOptions) -> (Self, UnboundedReceiver<Notification>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let supervisor = Self {
            extractor: Arc::new(extractor),
            options,
            tasks: TaskList::new(),
            events_tx,
            events_rx,
            notify_tx,
            info_workers: HashMap::new(),
            download_workers: HashMap::new(),
            next_worker: 0,
        };
        (supervisor, notify_rx)
    }

    pub fn options(&self) -> &SupervisorOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut SupervisorOptions {
        &mut self.options
    }

    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    pub fn task(&self, index: TaskIndex) -> Option<&Task> {
        self.tasks.get(index)
    }

    /// Queue `url`. Idempotent: an already queued URL returns its original index.
    pub fn enqueue(&mut self, url: &str) -> Enqueued {
        let enqueued = self.tasks.enqueue(url);
        if enqueued.is_new {
            tracing::debug!(index = enqueued.index, url, "task queued");
        }
        enqueued
    }

    /// Start fetching metadata for a task. No-op if a fetch is already running.
    pub fn fetch_info(&mut self, index: TaskIndex) -> Result<(), SupervisorError> {
        let url = self.checked(index)?.url.clone();
        if self.info_workers.contains_key(&index) {
            tracing::debug!(index, "info fetch already running");
            return Ok(());
        }
        let id = self.next_worker_id();
        let handle = worker::spawn_info(
            Arc::clone(&self.extractor),
            index,
            id,
            url,
            self.events_tx.clone(),
        );
        self.info_workers.insert(index, handle);
        tracing::debug!(index, worker = id.0, "info worker started");
        Ok(())
    }

    /// Start downloading a task. No-op if a download is already running.
    ///
    /// Uses the output directory and proxy rules current at this call, and the
    /// destination name derived from fetched metadata when available. A removed
    /// task is refused until it is enqueued again.
    pub fn start_download(&mut self, index: TaskIndex) -> Result<(), SupervisorError> {
        if self.checked(index)?.status == TaskStatus::Removed {
            return Err(SupervisorError::Removed { index });
        }
        if self.download_workers.contains_key(&index) {
            tracing::debug!(index, "download already running");
            return Ok(());
        }
        let id = self.next_worker_id();
        let len = self.tasks.len();
        let Some(task) = self.tasks.get_mut(index) else {
            return Err(SupervisorError::IndexOutOfRange { index, len });
        };
        let request = DownloadRequest {
            out_dir: self.options.out_dir.clone(),
            filename: task.filename.clone(),
            proxy: self.options.proxy.resolve(&task.url),
        };
        task.status = TaskStatus::Downloading;
        task.progress = 0.0;
        if let Some(path) = request.output_path() {
            task.output_path = Some(path);
        }
        let url = task.url.clone();
        tracing::info!(
            index,
            worker = id.0,
            out_dir = %request.out_dir.display(),
            proxy = request.proxy.is_some(),
            "download started"
        );

        let handle = worker::spawn_download(
            Arc::clone(&self.extractor),
            index,
            id,
            url,
            request,
            self.events_tx.clone(),
        );
        self.download_workers.insert(index, handle);
        self.notify(Notification::StatusChanged {
            index,
            text: STATUS_STARTED.to_string(),
        });
        Ok(())
    }

    /// Forcefully stop a running download. Returns false (and notifies
    /// nothing) when no download is running for `index`.
    ///
    /// A stop finishes the task as [`FinishOutcome::Stopped`], never as a failure.
    pub async fn stop_download(&mut self, index: TaskIndex) -> bool {
        let Some(handle) = self.download_workers.remove(&index) else {
            return false;
        };
        if handle.is_finished() {
            // Already exited; its final event is waiting in the channel.
            self.download_workers.insert(index, handle);
            return false;
        }

        let worker = handle.id();
        if !handle.terminate(self.options.stop_timeout).await {
            tracing::warn!(index, worker = worker.0, "stopped worker did not exit in time");
        }
        if let Some(task) = self.tasks.get_mut(index) {
            task.status = TaskStatus::Stopped;
        }
        tracing::info!(index, "download stopped by user");
        self.notify(Notification::StatusChanged {
            index,
            text: STATUS_STOPPED.to_string(),
        });
        self.notify(Notification::Finished {
            index,
            outcome: FinishOutcome::Stopped,
        });
        true
    }

    /// Mark a task removed. Refused while its download is running.
    pub fn remove(&mut self, index: TaskIndex) -> Result<(), SupervisorError> {
        self.checked(index)?;
        if self.download_workers.contains_key(&index) {
            return Err(SupervisorError::Busy { index });
        }
        self.tasks.mark_removed(index);
        Ok(())
    }

    /// Whether a task can be (re)started: metadata fetched, not running,
    /// not removed or done, and the destination not already on disk.
    pub fn is_startable(&self, index: TaskIndex) -> bool {
        let Some(task) = self.tasks.get(index) else {
            return false;
        };
        matches!(task.status, TaskStatus::Queued | TaskStatus::Stopped)
            && task.info.is_some()
            && !self.download_workers.contains_key(&index)
            && !self.output_exists(index)
    }

    /// Start every startable task. Returns how many downloads were started.
    pub fn start_all(&mut self) -> usize {
        let startable: Vec<TaskIndex> = self
            .tasks
            .iter()
            .map(|(i, _)| i)
            .filter(|i| self.is_startable(*i))
            .collect();
        startable
            .into_iter()
            .filter(|i| self.start_download(*i).is_ok())
            .count()
    }

    /// Stop every running download. Returns how many were stopped.
    pub async fn stop_all(&mut self) -> usize {
        let mut running: Vec<TaskIndex> = self.download_workers.keys().copied().collect();
        running.sort_unstable();
        let mut stopped = 0;
        for index in running {
            if self.stop_download(index).await {
                stopped += 1;
            }
        }
        stopped
    }

    /// True if the task's destination file already exists in the output directory.
    pub fn output_exists(&self, index: TaskIndex) -> bool {
        self.tasks
            .get(index)
            .and_then(|t| t.filename.as_ref())
            .map(|f| self.options.out_dir.join(f).exists())
            .unwrap_or(false)
    }

    pub fn is_info_running(&self, index: TaskIndex) -> bool {
        self.info_workers.contains_key(&index)
    }

    pub fn is_download_running(&self, index: TaskIndex) -> bool {
        self.download_workers.contains_key(&index)
    }

    pub fn active_downloads(&self) -> usize {
        self.download_workers.len()
    }

    /// No worker of either kind is active.
    pub fn is_idle(&self) -> bool {
        self.info_workers.is_empty() && self.download_workers.is_empty()
    }

    /// Terminate every worker (bounded join each) without notifications.
    /// Running downloads are left in `stopped` state.
    pub async fn shutdown(&mut self) {
        let timeout = self.options.stop_timeout;
        for (_, handle) in self.info_workers.drain() {
            handle.terminate(timeout).await;
        }
        let downloads: Vec<(TaskIndex, WorkerHandle)> = self.download_workers.drain().collect();
        for (index, handle) in downloads {
            handle.terminate(timeout).await;
            if let Some(task) = self.tasks.get_mut(index) {
                task.status = TaskStatus::Stopped;
            }
        }
        tracing::debug!("supervisor shut down");
    }

    fn checked(&self, index: TaskIndex) -> Result<&Task, SupervisorError> {
        self.tasks.get(index).ok_or(SupervisorError::IndexOutOfRange {
            index,
            len: self.tasks.len(),
        })
    }

    fn next_worker_id(&mut self) -> WorkerId {
        self.next_worker += 1;
        WorkerId(self.next_worker)
    }

    fn notify(&self, notification: Notification) {
        let _ = self.notify_tx.send(notification);
    }
}
