//! `mqd info <url>` – fetch metadata through one info worker and print it as JSON.

use anyhow::{bail, Context, Result};
use mqd_core::config::MqdConfig;
use mqd_core::history::HistoryDb;
use mqd_core::media::ensure_http_url;
use mqd_core::supervisor::{Supervisor, SupervisorOptions};
use mqd_core::{Notification, YtDlp};

pub async fn run_info(cfg: &MqdConfig, url: &str) -> Result<()> {
    let url = ensure_http_url(url)?;
    let (mut sup, mut notify_rx) =
        Supervisor::new(YtDlp::new(&cfg.extractor), SupervisorOptions::from_config(cfg));
    let index = sup.enqueue(url.as_str()).index;
    sup.fetch_info(index)?;

    let mut timer = sup.poll_timer();
    let info = 'pump: loop {
        timer.tick().await;
        sup.poll().await;
        while let Ok(n) = notify_rx.try_recv() {
            match n {
                Notification::InfoReceived { info, .. } => break 'pump info,
                Notification::InfoFailed { message, .. } => bail!("info fetch failed: {message}"),
                other => tracing::debug!("ignoring {:?}", other),
            }
        }
    };

    match HistoryDb::open_default().await {
        Ok(db) => {
            let source = info.webpage_url.as_deref().unwrap_or(url.as_str());
            if let Err(e) = db.record(info.title_or_default(), source, cfg.history_limit).await {
                tracing::warn!("record history: {:#}", e);
            }
        }
        Err(e) => tracing::warn!("open history: {:#}", e),
    }

    let json = serde_json::to_string_pretty(&info).context("serialize metadata")?;
    println!("{json}");
    Ok(())
}
