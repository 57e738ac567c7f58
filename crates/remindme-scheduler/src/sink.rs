//! Delivery sinks: where a fired reminder ends up.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tracing::info;

use crate::{error::Result, types::Reminder};

/// Emits fired reminders. Delivery is fire-and-forget from the engine's point
/// of view: an error is logged and the job is removed anyway.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    /// Stable lowercase identifier used in log fields.
    fn name(&self) -> &str;

    async fn deliver(&self, reminder: &Reminder) -> Result<()>;
}

/// Writes each reminder as a log line and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl DeliverySink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, reminder: &Reminder) -> Result<()> {
        info!(job_id = %reminder.job_id, message = %reminder.message, "reminder");
        Ok(())
    }
}

/// Keeps every delivered reminder in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    delivered: Mutex<Vec<Reminder>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<Reminder> {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.delivered().into_iter().map(|r| r.message).collect()
    }
}

#[async_trait]
impl DeliverySink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn deliver(&self, reminder: &Reminder) -> Result<()> {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(reminder.clone());
        Ok(())
    }
}
