pub mod config;
pub mod logging;
pub mod paths;

pub mod control;
pub mod event;
pub mod extractor;
pub mod history;
pub mod media;
pub mod proxy;
pub mod supervisor;
pub mod task;

mod worker;

pub use event::{FinishOutcome, Notification};
pub use extractor::{Extractor, YtDlp};
pub use supervisor::{Supervisor, SupervisorError, SupervisorOptions};
pub use task::{TaskIndex, TaskStatus};
