use thiserror::Error;

/// Errors that can occur within the scheduler subsystem.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The recurring-trigger evaluator rejected the expression.
    #[error("Invalid trigger expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },

    /// The expression parses but has no future occurrence (e.g. February 30th).
    #[error("Trigger expression '{expression}' never fires")]
    NeverFires { expression: String },

    /// The computed fire time cannot be represented.
    #[error("Fire time out of range: {0}")]
    OutOfRange(String),

    /// The delivery sink failed to emit a fired reminder.
    #[error("Delivery failed ({sink}): {reason}")]
    Delivery { sink: String, reason: String },
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
