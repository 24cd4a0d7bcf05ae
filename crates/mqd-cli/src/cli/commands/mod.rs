//! CLI command handlers. Each command is in its own file.

mod control;
mod get;
mod history;
mod info;

pub use control::run_control;
pub use get::{run_get, GetArgs};
pub use history::run_history;
pub use info::run_info;
