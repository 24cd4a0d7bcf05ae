//! Control protocol for a running `mqd get`.
//!
//! One command per line on a Unix socket: `stop <index>`, `start <index>`,
//! `stop-all`. The CLI listener forwards parsed commands to the loop that owns
//! the supervisor; malformed lines are ignored.

use std::fmt;
use std::path::PathBuf;

use crate::task::TaskIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Stop(TaskIndex),
    Start(TaskIndex),
    StopAll,
}

impl ControlCommand {
    /// Parse one protocol line. Returns `None` for anything malformed.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let cmd = parts.next()?;
        let arg = parts.next();
        if parts.next().is_some() {
            return None;
        }
        match (cmd, arg) {
            ("stop-all", None) => Some(ControlCommand::StopAll),
            ("stop", Some(idx)) => idx.parse().ok().map(ControlCommand::Stop),
            ("start", Some(idx)) => idx.parse().ok().map(ControlCommand::Start),
            _ => None,
        }
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlCommand::Stop(i) => write!(f, "stop {i}"),
            ControlCommand::Start(i) => write!(f, "start {i}"),
            ControlCommand::StopAll => f.write_str("stop-all"),
        }
    }
}

/// Default path for the control socket (same XDG state dir as the history DB).
pub fn default_control_socket_path() -> anyhow::Result<PathBuf> {
    crate::paths::control_socket()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(ControlCommand::parse_line("stop 3"), Some(ControlCommand::Stop(3)));
        assert_eq!(ControlCommand::parse_line("  start 0 "), Some(ControlCommand::Start(0)));
        assert_eq!(ControlCommand::parse_line("stop-all"), Some(ControlCommand::StopAll));
    }

    #[test]
    fn rejects_malformed_lines() {
        for line in ["", "stop", "stop x", "stop -1", "stop 1 2", "pause 1", "stop-all 1"] {
            assert_eq!(ControlCommand::parse_line(line), None, "line {line:?}");
        }
    }

    #[test]
    fn display_is_parseable() {
        for cmd in [
            ControlCommand::Stop(7),
            ControlCommand::Start(2),
            ControlCommand::StopAll,
        ] {
            assert_eq!(ControlCommand::parse_line(&cmd.to_string()), Some(cmd));
        }
    }
}
