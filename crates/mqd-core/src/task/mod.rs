//! In-memory task list owned by the supervisor.
//!
//! Tasks are addressed by their position in the list. They are never deleted,
//! only marked removed, so an index stays valid for the lifetime of the list.

mod list;
mod types;

pub use list::{Enqueued, TaskList};
pub use types::*;
