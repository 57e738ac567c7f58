//! PID file bookkeeping for the scheduling process.
//!
//! At most one scheduling process owns the socket path. A new instance reads
//! the recorded pid and validates it before touching it: the process must be
//! alive, owned by this user, and still serving the socket. Only then is it
//! interrupted and waited for. Our own pid is recorded afterwards.

use std::{
    io,
    path::{Path, PathBuf},
    time::Duration,
};

use tokio::net::UnixStream;
use tracing::{debug, info, warn};

use crate::error::ServerError;

/// How long to wait for a previous instance to exit after SIGINT.
pub const STOP_WAIT: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(50);
const PROBE_TIMEOUT: Duration = Duration::from_millis(500);

/// Owns the PID file for the lifetime of the scheduling process. The file is
/// removed on drop.
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Stop the live instance recorded at `path` if it still serves
    /// `socket_path`, then write our own pid.
    pub async fn acquire(
        path: &Path,
        socket_path: &Path,
        wait: Duration,
    ) -> Result<Self, ServerError> {
        let pid_error = |source: io::Error| ServerError::PidFile {
            path: path.to_path_buf(),
            source,
        };

        if let Some(pid) = read_pid(path).map_err(pid_error)? {
            stop_previous(pid, socket_path, wait).await?;
        }

        std::fs::write(path, std::process::id().to_string()).map_err(pid_error)?;
        debug!(path = %path.display(), "pid file written");
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        // Only remove the file if it still names this process.
        if let Ok(Some(pid)) = read_pid(&self.path) {
            if pid as u32 == std::process::id() {
                let _ = std::fs::remove_file(&self.path);
            }
        }
    }
}

/// Read the pid recorded at `path`. A missing file or unparseable content
/// yields `None`.
pub fn read_pid(path: &Path) -> io::Result<Option<i32>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    match raw.trim().parse::<i32>() {
        Ok(pid) if pid > 0 => Ok(Some(pid)),
        _ => {
            warn!(path = %path.display(), "ignoring malformed pid file");
            Ok(None)
        }
    }
}

/// Result of probing a pid with signal 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Dead,
    /// Alive and signalable by this user.
    Running,
    /// Alive but owned by another user (`EPERM`).
    Foreign,
}

pub fn liveness(pid: i32) -> Liveness {
    if pid <= 0 {
        return Liveness::Dead;
    }
    // Safety: signal 0 performs the permission and existence checks only.
    if unsafe { libc::kill(pid as libc::pid_t, 0) } == 0 {
        return Liveness::Running;
    }
    match io::Error::last_os_error().raw_os_error() {
        Some(libc::EPERM) => Liveness::Foreign,
        _ => Liveness::Dead,
    }
}

pub fn is_alive(pid: i32) -> bool {
    liveness(pid) != Liveness::Dead
}

/// Whether something still accepts connections on `socket_path`. A pid left
/// behind by a killed instance may have been reused; a dead socket tells the
/// two apart.
pub async fn socket_answers(socket_path: &Path) -> bool {
    matches!(
        tokio::time::timeout(PROBE_TIMEOUT, UnixStream::connect(socket_path)).await,
        Ok(Ok(_))
    )
}

async fn stop_previous(pid: i32, socket_path: &Path, wait: Duration) -> Result<(), ServerError> {
    if pid as u32 == std::process::id() {
        return Ok(());
    }
    match liveness(pid) {
        Liveness::Dead => {
            debug!(pid, "recorded instance is not running");
            return Ok(());
        }
        Liveness::Foreign => {
            return Err(ServerError::PreviousInstance {
                pid,
                reason: "is owned by another user".to_string(),
            });
        }
        Liveness::Running => {}
    }

    if !socket_answers(socket_path).await {
        warn!(
            pid,
            socket = %socket_path.display(),
            "recorded pid is alive but the socket is dead; treating pid file as stale"
        );
        return Ok(());
    }

    info!(pid, "stopping previous instance");
    // Safety: liveness() returned Running, so pid > 0 and this never
    // targets a process group.
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGINT) };
    if rc != 0 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ESRCH) {
            return Ok(());
        }
        warn!(pid, "cannot signal previous instance: {err}");
    }

    let deadline = tokio::time::Instant::now() + wait;
    while is_alive(pid) {
        if tokio::time::Instant::now() >= deadline {
            return Err(ServerError::PreviousInstance {
                pid,
                reason: format!("did not exit within {}ms", wait.as_millis()),
            });
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    info!(pid, "previous instance exited");
    Ok(())
}
