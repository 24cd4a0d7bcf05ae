//! RAII guard that reports a worker failure if the worker never reported.

use tokio::sync::mpsc::UnboundedSender;

use crate::event::{EventPayload, WorkerEvent, WorkerId};
use crate::task::TaskIndex;

/// Sends `fallback` when dropped while still armed (e.g. the worker task
/// panicked). Disarm it before sending the worker's own final event.
pub(super) struct ReportGuard {
    events: UnboundedSender<WorkerEvent>,
    index: TaskIndex,
    worker: WorkerId,
    fallback: Option<EventPayload>,
}

impl ReportGuard {
    pub(super) fn new(
        events: UnboundedSender<WorkerEvent>,
        index: TaskIndex,
        worker: WorkerId,
        fallback: EventPayload,
    ) -> Self {
        Self {
            events,
            index,
            worker,
            fallback: Some(fallback),
        }
    }

    pub(super) fn send(&self, payload: EventPayload) {
        let _ = self.events.send(WorkerEvent {
            index: self.index,
            worker: self.worker,
            payload,
        });
    }

    /// Send the worker's final event and disarm.
    pub(super) fn finish(mut self, payload: EventPayload) {
        self.fallback = None;
        self.send(payload);
    }

    /// Disarm without sending anything (worker was terminated on request).
    pub(super) fn disarm(mut self) {
        self.fallback = None;
    }
}

impl Drop for ReportGuard {
    fn drop(&mut self) {
        if let Some(payload) = self.fallback.take() {
            tracing::warn!(index = self.index, worker = self.worker.0, "worker ended without reporting");
            self.send(payload);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn guard() -> (ReportGuard, mpsc::UnboundedReceiver<WorkerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let fallback = EventPayload::InfoErr {
            message: "lost".to_string(),
        };
        (ReportGuard::new(tx, 4, WorkerId(9), fallback), rx)
    }

    #[test]
    fn dropped_guard_sends_fallback() {
        let (g, mut rx) = guard();
        drop(g);
        let ev = rx.try_recv().unwrap();
        assert_eq!(ev.index, 4);
        assert_eq!(ev.worker, WorkerId(9));
        assert_eq!(ev.payload.kind(), "info_err");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn finish_sends_only_final_event() {
        let (g, mut rx) = guard();
        g.send(EventPayload::Status {
            text: "working".to_string(),
        });
        g.finish(EventPayload::Done {
            ok: true,
            message: "ok".to_string(),
        });
        assert_eq!(rx.try_recv().unwrap().payload.kind(), "status");
        assert_eq!(rx.try_recv().unwrap().payload.kind(), "done");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn disarm_sends_nothing() {
        let (g, mut rx) = guard();
        g.disarm();
        assert!(rx.try_recv().is_err());
    }
}
