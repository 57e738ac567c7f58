//! Submission channel: a Unix domain stream socket carrying one descriptor
//! per connection.

use std::{
    io,
    path::{Path, PathBuf},
    time::Duration,
};

use remindme_core::RemindmeError;
use tokio::{
    io::AsyncReadExt,
    net::{UnixListener, UnixStream},
};
use tracing::{debug, info};

use crate::error::ServerError;

/// Listening side of the channel. Removes its socket file on drop so a later
/// instance can bind the same path.
#[derive(Debug)]
pub struct ChannelListener {
    listener: UnixListener,
    path: PathBuf,
}

impl ChannelListener {
    /// Bind `path`, first removing whatever stale file is there.
    pub fn bind(path: &Path) -> Result<Self, ServerError> {
        let bind_error = |source: io::Error| ServerError::Bind {
            path: path.to_path_buf(),
            source,
        };

        match std::fs::remove_file(path) {
            Ok(()) => debug!(path = %path.display(), "removed stale socket"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(bind_error(e)),
        }

        let listener = UnixListener::bind(path).map_err(bind_error)?;
        info!(path = %path.display(), "submission channel listening");
        Ok(Self {
            listener,
            path: path.to_path_buf(),
        })
    }

    pub async fn accept(&self) -> io::Result<UnixStream> {
        let (stream, _addr) = self.listener.accept().await?;
        Ok(stream)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ChannelListener {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Read one payload: every byte until the peer closes its end.
///
/// Anything above `max_bytes`, a peer that stays open past `timeout`, or
/// non-UTF-8 content is rejected.
pub async fn read_payload(
    stream: UnixStream,
    max_bytes: usize,
    timeout: Duration,
) -> Result<String, RemindmeError> {
    let mut buf = Vec::new();
    let mut limited = stream.take(max_bytes as u64 + 1);
    match tokio::time::timeout(timeout, limited.read_to_end(&mut buf)).await {
        Ok(read) => {
            read?;
        }
        Err(_) => {
            return Err(RemindmeError::Timeout {
                ms: timeout.as_millis() as u64,
            })
        }
    }

    if buf.len() > max_bytes {
        return Err(RemindmeError::PayloadTooLarge {
            size: buf.len(),
            max: max_bytes,
        });
    }
    String::from_utf8(buf).map_err(|e| RemindmeError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}
