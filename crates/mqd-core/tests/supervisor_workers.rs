//! Integration tests: the supervisor driving real worker processes.
//!
//! The extractor is replaced by small `sh` scripts (see `common::script`) so
//! the tests exercise process spawning, output parsing, stop and the event
//! pump without network access or yt-dlp installed.

#![cfg(unix)]

mod common;

use std::path::Path;
use std::time::{Duration, Instant};

use common::script::{info_json, progress_line, ScriptExtractor};
use mqd_core::event::{FinishOutcome, Notification};
use mqd_core::extractor::Extractor;
use mqd_core::proxy::ProxyConfig;
use mqd_core::supervisor::{Supervisor, SupervisorOptions};
use mqd_core::task::TaskStatus;
use tempfile::tempdir;
use tokio::sync::mpsc::UnboundedReceiver;

const URL: &str = "https://media.example/watch?v=abc";

fn supervisor(
    extractor: ScriptExtractor,
    out_dir: &Path,
) -> (Supervisor<ScriptExtractor>, UnboundedReceiver<Notification>) {
    let options = SupervisorOptions {
        out_dir: out_dir.to_path_buf(),
        ..SupervisorOptions::default()
    };
    Supervisor::new(extractor, options)
}

/// Poll the supervisor until `done` holds for the notifications seen so far.
async fn pump_until<E: Extractor>(
    sup: &mut Supervisor<E>,
    rx: &mut UnboundedReceiver<Notification>,
    done: impl Fn(&[Notification]) -> bool,
) -> Vec<Notification> {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut seen = Vec::new();
    loop {
        sup.poll().await;
        while let Ok(n) = rx.try_recv() {
            seen.push(n);
        }
        if done(&seen) {
            return seen;
        }
        assert!(Instant::now() < deadline, "timed out, seen: {seen:?}");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

fn has_finished(seen: &[Notification]) -> bool {
    seen.iter().any(|n| matches!(n, Notification::Finished { .. }))
}

fn finished_outcome(seen: &[Notification]) -> Option<&FinishOutcome> {
    seen.iter().find_map(|n| match n {
        Notification::Finished { outcome, .. } => Some(outcome),
        _ => None,
    })
}

fn percents(seen: &[Notification]) -> Vec<f64> {
    seen.iter()
        .filter_map(|n| match n {
            Notification::ProgressChanged { percent, .. } => Some(*percent),
            _ => None,
        })
        .collect()
}

fn status_texts(seen: &[Notification]) -> Vec<&str> {
    seen.iter()
        .filter_map(|n| match n {
            Notification::StatusChanged { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn info_fetch_sets_title_and_destination() {
    let dir = tempdir().unwrap();
    let (mut sup, mut rx) = supervisor(ScriptExtractor::new(&info_json("My Clip"), "true"), dir.path());
    let idx = sup.enqueue(URL).index;

    sup.fetch_info(idx).unwrap();
    assert!(sup.is_info_running(idx));
    let seen = pump_until(&mut sup, &mut rx, |s| !s.is_empty()).await;

    match &seen[0] {
        Notification::InfoReceived { index, info } => {
            assert_eq!(*index, idx);
            assert_eq!(info.title.as_deref(), Some("My Clip"));
        }
        other => panic!("expected InfoReceived, got {other:?}"),
    }
    let task = sup.task(idx).unwrap();
    assert_eq!(task.title.as_deref(), Some("My Clip"));
    assert_eq!(task.filename.as_deref(), Some("My Clip.webm"));
    assert_eq!(task.output_path.as_deref(), Some(dir.path().join("My Clip.webm").as_path()));
    assert!(!sup.is_info_running(idx));
    assert!(sup.is_startable(idx));
}

#[tokio::test]
async fn info_failure_reports_extractor_error() {
    let dir = tempdir().unwrap();
    let script = r#"echo "WARNING: ignored" >&2; echo "ERROR: Unsupported URL: $1" >&2; exit 1"#;
    let (mut sup, mut rx) = supervisor(ScriptExtractor::new(script, "true"), dir.path());
    let idx = sup.enqueue(URL).index;

    sup.fetch_info(idx).unwrap();
    let seen = pump_until(&mut sup, &mut rx, |s| !s.is_empty()).await;

    assert_eq!(
        seen[0],
        Notification::InfoFailed {
            index: idx,
            message: format!("Unsupported URL: {URL}"),
        }
    );
    assert!(sup.task(idx).unwrap().info.is_none());
    assert!(sup.is_idle());
}

#[tokio::test]
async fn missing_extractor_program_is_an_info_failure() {
    let dir = tempdir().unwrap();
    let mut extractor = ScriptExtractor::new("true", "true");
    extractor.program = dir.path().join("no-such-extractor").to_string_lossy().into_owned();
    let (mut sup, mut rx) = supervisor(extractor, dir.path());
    let idx = sup.enqueue(URL).index;

    sup.fetch_info(idx).unwrap();
    let seen = pump_until(&mut sup, &mut rx, |s| !s.is_empty()).await;

    match &seen[0] {
        Notification::InfoFailed { message, .. } => {
            assert!(message.contains("failed to start"), "message: {message}")
        }
        other => panic!("expected InfoFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn repeated_fetch_and_start_spawn_one_worker_each() {
    let dir = tempdir().unwrap();
    let info_count = dir.path().join("info-count");
    let dl_count = dir.path().join("dl-count");
    let info_script = format!(
        "echo x >> '{}'; sleep 0.3; {}",
        info_count.display(),
        info_json("Clip")
    );
    let dl_script = format!("echo x >> '{}'; sleep 0.3", dl_count.display());
    let (mut sup, mut rx) = supervisor(ScriptExtractor::new(&info_script, &dl_script), dir.path());
    let idx = sup.enqueue(URL).index;

    sup.fetch_info(idx).unwrap();
    sup.fetch_info(idx).unwrap();
    let seen = pump_until(&mut sup, &mut rx, |s| !s.is_empty()).await;
    assert!(matches!(seen[0], Notification::InfoReceived { .. }));

    sup.start_download(idx).unwrap();
    sup.start_download(idx).unwrap();
    let seen = pump_until(&mut sup, &mut rx, has_finished).await;
    assert!(finished_outcome(&seen).unwrap().is_ok());
    assert_eq!(status_texts(&seen).iter().filter(|t| **t == "Started").count(), 1);

    assert_eq!(std::fs::read_to_string(&info_count).unwrap().lines().count(), 1);
    assert_eq!(std::fs::read_to_string(&dl_count).unwrap().lines().count(), 1);
}

#[tokio::test]
async fn stop_terminates_download_without_failure() {
    let dir = tempdir().unwrap();
    let (mut sup, mut rx) = supervisor(ScriptExtractor::new("true", "exec sleep 30"), dir.path());
    let idx = sup.enqueue(URL).index;

    sup.start_download(idx).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(sup.is_download_running(idx));

    let started = Instant::now();
    assert!(sup.stop_download(idx).await);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(sup.task(idx).unwrap().status, TaskStatus::Stopped);
    assert!(!sup.is_download_running(idx));

    let mut seen = Vec::new();
    while let Ok(n) = rx.try_recv() {
        seen.push(n);
    }
    assert_eq!(status_texts(&seen), vec!["Started", "Stopped"]);
    assert_eq!(finished_outcome(&seen), Some(&FinishOutcome::Stopped));

    // Anything the killed worker queued is stale and dropped.
    tokio::time::sleep(Duration::from_millis(200)).await;
    sup.poll().await;
    assert!(rx.try_recv().is_err());
    assert_eq!(sup.task(idx).unwrap().status, TaskStatus::Stopped);

    // A second stop is a silent no-op.
    assert!(!sup.stop_download(idx).await);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn download_progress_is_monotonic_and_completes() {
    let dir = tempdir().unwrap();
    let script = [
        progress_line(50, 100),
        "echo 'unrelated yt-dlp output'".to_string(),
        progress_line(30, 100),
        r#"echo '[mqd-progress] {"status":"finished","filename":"Clip.webm"}'"#.to_string(),
    ]
    .join("; ");
    let (mut sup, mut rx) = supervisor(ScriptExtractor::new("true", &script), dir.path());
    let idx = sup.enqueue(URL).index;

    sup.start_download(idx).unwrap();
    let seen = pump_until(&mut sup, &mut rx, has_finished).await;

    assert_eq!(percents(&seen), vec![50.0, 50.0, 100.0]);
    let texts = status_texts(&seen);
    assert_eq!(texts[0], "Started");
    assert_eq!(texts[1], "Download starting");
    assert!(texts.contains(&"Downloaded: 50.00%"));
    assert!(texts.contains(&"File ready: Clip.webm"));
    assert_eq!(
        finished_outcome(&seen),
        Some(&FinishOutcome::Completed {
            message: "Download complete".to_string()
        })
    );
    let task = sup.task(idx).unwrap();
    assert_eq!(task.status, TaskStatus::Done);
    assert_eq!(task.progress, 100.0);
    assert!(sup.is_idle());
}

#[tokio::test]
async fn completion_without_finished_report_still_reaches_full_progress() {
    let dir = tempdir().unwrap();
    let (mut sup, mut rx) = supervisor(ScriptExtractor::new("true", &progress_line(10, 100)), dir.path());
    let idx = sup.enqueue(URL).index;

    sup.start_download(idx).unwrap();
    let seen = pump_until(&mut sup, &mut rx, has_finished).await;

    assert_eq!(percents(&seen), vec![10.0, 100.0]);
    assert!(finished_outcome(&seen).unwrap().is_ok());
}

#[tokio::test]
async fn failed_download_reports_error_and_can_restart() {
    let dir = tempdir().unwrap();
    let script = "echo 'ERROR: HTTP Error 403: Forbidden' >&2; exit 1";
    let (mut sup, mut rx) = supervisor(ScriptExtractor::new("true", script), dir.path());
    let idx = sup.enqueue(URL).index;

    sup.start_download(idx).unwrap();
    let seen = pump_until(&mut sup, &mut rx, has_finished).await;

    let outcome = finished_outcome(&seen).unwrap();
    assert!(outcome.is_error());
    assert_eq!(outcome.message(), "HTTP Error 403: Forbidden");
    assert_eq!(sup.task(idx).unwrap().status, TaskStatus::Stopped);
    assert!(!sup.is_download_running(idx));

    sup.start_download(idx).unwrap();
    assert!(sup.is_download_running(idx));
    sup.shutdown().await;
}

#[tokio::test]
async fn download_receives_url_destination_and_proxy() {
    let dir = tempdir().unwrap();
    let args_file = dir.path().join("args");
    let dl_script = format!("printf '%s\\n' \"$1\" \"$2\" \"$3\" > '{}'", args_file.display());
    let (mut sup, mut rx) = supervisor(ScriptExtractor::new(&info_json("Clip"), &dl_script), dir.path());
    let idx = sup.enqueue(URL).index;

    sup.fetch_info(idx).unwrap();
    pump_until(&mut sup, &mut rx, |s| !s.is_empty()).await;

    sup.options_mut().proxy = ProxyConfig::custom("socks5://127.0.0.1:9050");
    sup.start_download(idx).unwrap();
    pump_until(&mut sup, &mut rx, has_finished).await;

    let args = std::fs::read_to_string(&args_file).unwrap();
    let args: Vec<&str> = args.lines().collect();
    let dest = dir.path().join("Clip.webm");
    assert_eq!(args, vec![URL, dest.to_str().unwrap(), "socks5://127.0.0.1:9050"]);
}

#[tokio::test]
async fn start_all_skips_tasks_whose_output_exists() {
    let dir = tempdir().unwrap();
    let (mut sup, mut rx) = supervisor(ScriptExtractor::new(&info_json("Clip"), "true"), dir.path());
    let idx = sup.enqueue(URL).index;
    sup.fetch_info(idx).unwrap();
    pump_until(&mut sup, &mut rx, |s| !s.is_empty()).await;

    std::fs::write(dir.path().join("Clip.webm"), b"done").unwrap();
    assert!(sup.output_exists(idx));
    assert_eq!(sup.start_all(), 0);
    assert!(sup.is_idle());
}
