//! Messages flowing through the supervisor.
//!
//! Workers produce [`WorkerEvent`]s on a shared channel; the supervisor's event
//! pump consumes each exactly once and turns it into task-state changes and
//! outward [`Notification`]s.

mod notification;
mod progress;

pub use notification::{FinishOutcome, Notification};
pub use progress::{ProgressReport, ProgressStatus};

use serde::{Deserialize, Serialize};

use crate::media::MediaInfo;
use crate::task::TaskIndex;

/// Identifies one worker over the lifetime of a supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkerId(pub u64);

/// A tagged message produced by a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerEvent {
    pub index: TaskIndex,
    pub worker: WorkerId,
    #[serde(flatten)]
    pub payload: EventPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    InfoOk { info: Box<MediaInfo> },
    InfoErr { message: String },
    Status { text: String },
    Progress { report: ProgressReport },
    Done { ok: bool, message: String },
}

impl EventPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            EventPayload::InfoOk { .. } => "info_ok",
            EventPayload::InfoErr { .. } => "info_err",
            EventPayload::Status { .. } => "status",
            EventPayload::Progress { .. } => "progress",
            EventPayload::Done { .. } => "done",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_kind_tag() {
        let ev = WorkerEvent {
            index: 3,
            worker: WorkerId(7),
            payload: EventPayload::Done {
                ok: false,
                message: "HTTP Error 403".to_string(),
            },
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["kind"], "done");
        assert_eq!(json["index"], 3);
        assert_eq!(json["worker"], 7);
        assert_eq!(json["ok"], false);

        let back: WorkerEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, ev);
    }

    #[test]
    fn kind_names_match_wire_tags() {
        let status = EventPayload::Status {
            text: "x".to_string(),
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["kind"], status.kind());
        assert_eq!(
            EventPayload::InfoErr {
                message: String::new()
            }
            .kind(),
            "info_err"
        );
    }
}
