use thiserror::Error;

/// Why a raw descriptor string was rejected.
///
/// Produced by [`crate::descriptor::parse`] both in the submitting process
/// (pre-flight) and in the scheduling process (authoritative parse).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The payload or a timespec does not have the expected shape.
    #[error("invalid format for '{destination}': {reason}")]
    InvalidFormat { destination: String, reason: String },

    /// The magnitude of an `in` duration is missing, malformed or overflows.
    #[error("invalid duration '{0}'")]
    InvalidDuration(String),

    /// An `in` duration uses a unit other than `m` or `h`.
    #[error("unsupported duration unit '{0}': only 'm' or 'h' currently supported")]
    UnsupportedUnit(String),

    /// The destination is not one of `at`, `in`, `on`.
    #[error("unknown destination '{0}': expected one of at, in, on")]
    UnknownDestination(String),
}

impl ParseError {
    pub(crate) fn format(destination: &str, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            destination: destination.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RemindmeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid descriptor: {0}")]
    Parse(#[from] ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Request timeout after {ms}ms")]
    Timeout { ms: u64 },
}

impl RemindmeError {
    /// Short stable code used in log fields.
    pub fn code(&self) -> &'static str {
        match self {
            RemindmeError::Config(_) => "CONFIG_ERROR",
            RemindmeError::Parse(_) => "PARSE_ERROR",
            RemindmeError::Io(_) => "IO_ERROR",
            RemindmeError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            RemindmeError::Timeout { .. } => "TIMEOUT",
        }
    }
}

pub type Result<T> = std::result::Result<T, RemindmeError>;
