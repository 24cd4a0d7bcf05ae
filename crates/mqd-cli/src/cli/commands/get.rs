//! `mqd get <url>...` – queue URLs, fetch metadata, download, and report progress.
//!
//! Runs the supervisor's event pump on its poll interval until no worker is
//! left. Ctrl-C stops every download; `mqd stop`/`start`/`stop-all` reach this
//! loop through the control socket.

use anyhow::{bail, Context, Result};
use mqd_core::config::MqdConfig;
use mqd_core::control::{self, ControlCommand};
use mqd_core::history::HistoryDb;
use mqd_core::media::ensure_http_url;
use mqd_core::proxy::ProxyConfig;
use mqd_core::supervisor::{Supervisor, SupervisorOptions, STATUS_DOWNLOADED_PREFIX};
use mqd_core::{FinishOutcome, Notification, TaskIndex, YtDlp};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::mpsc;

use crate::cli::control_socket;

#[derive(Debug, Clone)]
pub struct GetArgs {
    pub urls: Vec<String>,
    pub out_dir: Option<PathBuf>,
    pub proxy: Option<String>,
    pub info_only: bool,
}

#[derive(Debug, Default)]
struct Summary {
    completed: usize,
    failed: usize,
    stopped: usize,
    skipped: usize,
    info_failed: usize,
}

/// Everything the pump loop mutates besides the supervisor.
struct Session {
    history: Option<HistoryDb>,
    history_limit: u32,
    info_only: bool,
    interrupted: bool,
    /// Last whole percent printed per task.
    shown: HashMap<TaskIndex, u32>,
    summary: Summary,
}

pub async fn run_get(cfg: &MqdConfig, args: GetArgs) -> Result<()> {
    let mut options = SupervisorOptions::from_config(cfg);
    if let Some(dir) = args.out_dir {
        options.out_dir = dir;
    }
    if let Some(proxy) = args.proxy {
        options.proxy = ProxyConfig::custom(proxy);
    }
    if !args.info_only {
        tokio::fs::create_dir_all(&options.out_dir)
            .await
            .with_context(|| format!("create output dir {}", options.out_dir.display()))?;
    }

    let history = match HistoryDb::open_default().await {
        Ok(db) => Some(db),
        Err(e) => {
            tracing::warn!("history disabled: {:#}", e);
            None
        }
    };

    let (mut sup, mut notify_rx) = Supervisor::new(YtDlp::new(&cfg.extractor), options);
    for raw in &args.urls {
        let url = match ensure_http_url(raw) {
            Ok(u) => u,
            Err(e) => {
                eprintln!("skipping {raw}: {e:#}");
                continue;
            }
        };
        let queued = sup.enqueue(url.as_str());
        if queued.is_new {
            println!("[{}] queued {}", queued.index, url);
            sup.fetch_info(queued.index)?;
        }
    }
    if sup.tasks().is_empty() {
        bail!("no valid URLs given");
    }

    let (control_tx, mut control_rx) = mpsc::unbounded_channel::<ControlCommand>();
    let listener = match control::default_control_socket_path()
        .and_then(|path| control_socket::spawn_control_listener(control_tx, path))
    {
        Ok(listener) => {
            tracing::debug!(path = %listener.path().display(), "control socket listening");
            Some(listener)
        }
        Err(e) => {
            tracing::warn!("control socket unavailable: {:#}", e);
            None
        }
    };

    let mut session = Session {
        history,
        history_limit: cfg.history_limit,
        info_only: args.info_only,
        interrupted: false,
        shown: HashMap::new(),
        summary: Summary::default(),
    };

    let mut timer = sup.poll_timer();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = timer.tick() => {
                sup.poll().await;
                while let Ok(n) = notify_rx.try_recv() {
                    session.handle(&mut sup, n).await;
                }
                if sup.is_idle() {
                    break;
                }
            }
            Some(cmd) = control_rx.recv() => session.control(&mut sup, cmd).await,
            _ = &mut ctrl_c, if !session.interrupted => {
                session.interrupted = true;
                let stopped = sup.stop_all().await;
                sup.shutdown().await;
                eprintln!("interrupted, stopped {stopped} download(s)");
            }
        }
    }

    // Unlinks the socket so `mqd stop` reports that nothing is running.
    drop(listener);
    let s = &session.summary;
    println!(
        "done: {} completed, {} failed, {} stopped, {} skipped, {} without metadata",
        s.completed, s.failed, s.stopped, s.skipped, s.info_failed
    );
    if s.failed + s.info_failed > 0 {
        bail!("{} task(s) failed", s.failed + s.info_failed);
    }
    Ok(())
}

impl Session {
    async fn handle(&mut self, sup: &mut Supervisor<YtDlp>, notification: Notification) {
        match notification {
            Notification::InfoReceived { index, info } => {
                println!("[{index}] {}", info.title_or_default());
                self.record_history(sup, index, &info).await;
                if self.info_only || self.interrupted {
                    return;
                }
                if sup.output_exists(index) {
                    println!("[{index}] already downloaded, skipping");
                    self.summary.skipped += 1;
                    return;
                }
                if let Err(e) = sup.start_download(index) {
                    tracing::warn!(index, "start download: {}", e);
                }
            }
            Notification::InfoFailed { index, message } => {
                eprintln!("[{index}] info failed: {message}");
                self.summary.info_failed += 1;
            }
            Notification::StatusChanged { index, text } => {
                // Percent lines are printed from ProgressChanged.
                if !text.starts_with(STATUS_DOWNLOADED_PREFIX) {
                    println!("[{index}] {text}");
                }
            }
            Notification::ProgressChanged { index, percent } => {
                let whole = percent.floor() as u32;
                if self.shown.get(&index) != Some(&whole) {
                    self.shown.insert(index, whole);
                    println!("[{index}] {percent:.1}%");
                }
            }
            Notification::Finished { index, outcome } => {
                match &outcome {
                    FinishOutcome::Completed { .. } => self.summary.completed += 1,
                    FinishOutcome::Failed { .. } => self.summary.failed += 1,
                    FinishOutcome::Stopped => self.summary.stopped += 1,
                }
                let path = sup
                    .task(index)
                    .and_then(|t| t.output_path.as_ref())
                    .map(|p| format!(" ({})", p.display()))
                    .unwrap_or_default();
                println!("[{index}] {}{path}", outcome.message());
            }
        }
    }

    async fn control(&mut self, sup: &mut Supervisor<YtDlp>, command: ControlCommand) {
        tracing::info!("control: {}", command);
        match command {
            ControlCommand::Stop(index) => {
                if !sup.stop_download(index).await {
                    tracing::debug!(index, "stop: no download running");
                }
            }
            ControlCommand::Start(index) => {
                if self.interrupted || !sup.is_startable(index) {
                    tracing::info!(index, "start: task is not startable");
                } else if let Err(e) = sup.start_download(index) {
                    tracing::warn!(index, "start download: {}", e);
                }
            }
            ControlCommand::StopAll => {
                let stopped = sup.stop_all().await;
                tracing::info!("stop-all: stopped {}", stopped);
            }
        }
    }

    async fn record_history(
        &self,
        sup: &Supervisor<YtDlp>,
        index: TaskIndex,
        info: &mqd_core::media::MediaInfo,
    ) {
        let Some(db) = &self.history else {
            return;
        };
        let url = match info.webpage_url.as_deref() {
            Some(u) => u.to_string(),
            None => match sup.task(index) {
                Some(t) => t.url.clone(),
                None => return,
            },
        };
        if let Err(e) = db.record(info.title_or_default(), &url, self.history_limit).await {
            tracing::warn!(index, "record history: {:#}", e);
        }
    }
}
