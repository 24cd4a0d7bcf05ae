//! XDG locations shared by logging, history and the control socket.

use anyhow::Result;
use std::path::PathBuf;

const PREFIX: &str = "mqd";

/// `~/.local/state/mqd` on Debian. Not created here.
pub fn state_dir() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix(PREFIX)?;
    Ok(xdg_dirs.get_state_home().join(PREFIX))
}

pub fn log_file() -> Result<PathBuf> {
    Ok(state_dir()?.join("mqd.log"))
}

pub fn history_db() -> Result<PathBuf> {
    Ok(state_dir()?.join("history.db"))
}

pub fn control_socket() -> Result<PathBuf> {
    Ok(state_dir()?.join("control.sock"))
}
