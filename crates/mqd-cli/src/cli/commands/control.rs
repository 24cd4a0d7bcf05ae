//! `mqd stop <index>`, `mqd start <index>`, `mqd stop-all` – control a running `mqd get`.

use anyhow::{bail, Result};
use mqd_core::control::{self, ControlCommand};

use crate::cli::control_socket;

pub async fn run_control(command: ControlCommand) -> Result<()> {
    let path = control::default_control_socket_path()?;
    if !control_socket::send_command(&path, command).await? {
        bail!("no running `mqd get` (control socket {} not found)", path.display());
    }
    println!("Sent: {command}");
    Ok(())
}
