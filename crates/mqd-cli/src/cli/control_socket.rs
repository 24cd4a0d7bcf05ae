//! Control socket: server (during `mqd get`) and client (for `mqd stop`).
//! Protocol: one line per command, see [`ControlCommand`].

use anyhow::{bail, Context, Result};
use mqd_core::control::ControlCommand;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// A bound control socket. Dropping it stops the listener and unlinks the
/// socket file, so clients can tell that no `mqd get` is running.
#[derive(Debug)]
pub struct ControlListener {
    path: PathBuf,
    handle: JoinHandle<()>,
}

impl ControlListener {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ControlListener {
    fn drop(&mut self) {
        self.handle.abort();
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::debug!(path = %self.path.display(), "remove control socket: {}", e);
            }
        }
    }
}

/// Binds `path` and forwards every well-formed command line to `commands`.
/// Ignores malformed lines.
///
/// Fails if another process is already listening on `path`. A leftover socket
/// file nobody listens on is replaced.
pub fn spawn_control_listener(
    commands: UnboundedSender<ControlCommand>,
    path: impl AsRef<Path>,
) -> Result<ControlListener> {
    let path = path.as_ref().to_path_buf();
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create control socket dir {}", dir.display()))?;
    }
    if path.exists() {
        if std::os::unix::net::UnixStream::connect(&path).is_ok() {
            bail!("another `mqd get` is listening on {}", path.display());
        }
        std::fs::remove_file(&path)
            .with_context(|| format!("remove stale control socket {}", path.display()))?;
    }
    let listener = UnixListener::bind(&path)
        .with_context(|| format!("bind control socket {}", path.display()))?;

    let handle = tokio::spawn(async move {
        loop {
            let accepted = tokio::select! {
                accepted = listener.accept() => accepted,
                _ = commands.closed() => break,
            };
            match accepted {
                Ok((stream, _)) => {
                    let commands = commands.clone();
                    tokio::spawn(async move {
                        let mut reader = BufReader::new(stream).lines();
                        while let Ok(Some(line)) = reader.next_line().await {
                            match ControlCommand::parse_line(&line) {
                                Some(cmd) => {
                                    if commands.send(cmd).is_err() {
                                        break;
                                    }
                                }
                                None => tracing::debug!("control socket: ignoring {:?}", line),
                            }
                        }
                    });
                }
                Err(e) => tracing::debug!("control socket accept: {}", e),
            }
        }
    });
    Ok(ControlListener { path, handle })
}

/// Sends one command line to the control socket. Returns false if no
/// `mqd get` is listening (socket missing or left over from a dead process).
pub async fn send_command(socket_path: &Path, command: ControlCommand) -> Result<bool> {
    let mut stream = match UnixStream::connect(socket_path).await {
        Ok(stream) => stream,
        Err(e)
            if matches!(
                e.kind(),
                io::ErrorKind::NotFound | io::ErrorKind::ConnectionRefused
            ) =>
        {
            tracing::debug!(path = %socket_path.display(), "no control socket listener: {}", e);
            return Ok(false);
        }
        Err(e) => {
            return Err(e).with_context(|| format!("connect to {}", socket_path.display()))
        }
    };
    let msg = format!("{}\n", command);
    stream.write_all(msg.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(true)
}
