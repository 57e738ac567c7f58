use std::{io, path::PathBuf};

use remindme_core::{ParseError, RemindmeError};
use thiserror::Error;

/// Failure on the submitting side. Either one exits the CLI with status 1.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("error: {0}")]
    Validation(#[from] ParseError),

    #[error("error: cannot reach the scheduling process at {}: {source}", path.display())]
    Transmission {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Faults that stop the scheduling process.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] RemindmeError),

    #[error("previous instance (pid {pid}) {reason}")]
    PreviousInstance { pid: i32, reason: String },

    #[error("pid file {}: {source}", path.display())]
    PidFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot bind {}: {source}", path.display())]
    Bind {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    #[error("scheduler engine stopped: {0}")]
    EngineStopped(String),
}

impl ServerError {
    pub fn code(&self) -> &'static str {
        match self {
            ServerError::Config(e) => e.code(),
            ServerError::PreviousInstance { .. } => "PREVIOUS_INSTANCE",
            ServerError::PidFile { .. } => "PID_FILE",
            ServerError::Bind { .. } => "BIND_FAILED",
            ServerError::Accept(_) => "ACCEPT_FAILED",
            ServerError::EngineStopped(_) => "ENGINE_STOPPED",
        }
    }
}
