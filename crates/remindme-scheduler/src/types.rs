use std::fmt;

use chrono::{DateTime, Local};

/// Process-local job identifier.
///
/// Allocated by [`JobRegistry`](crate::registry::JobRegistry) from a
/// monotonically increasing counter, so an id is never handed out twice
/// within one process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(u64);

impl JobId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a registered job.
///
/// `Removed` is not represented: a removed job is simply absent from the
/// registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Waiting for its fire time.
    Scheduled,
    /// Claimed by a timer or evaluator tick; delivery is in progress.
    Fired,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Scheduled => "scheduled",
            JobState::Fired => "fired",
        };
        write!(f, "{s}")
    }
}

/// A compiled recurring-trigger expression and its first occurrence.
#[derive(Debug, Clone)]
pub struct RecurringTrigger {
    pub(crate) expression: String,
    pub(crate) schedule: cron::Schedule,
    pub(crate) next_fire: DateTime<Local>,
}

impl RecurringTrigger {
    /// Six-field, seconds-first cron expression.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn next_fire(&self) -> DateTime<Local> {
        self.next_fire
    }

    /// Occurrences of the underlying expression strictly after `after`,
    /// ignoring the at-most-once removal the engine applies on first fire.
    pub fn upcoming(&self, after: DateTime<Local>) -> impl Iterator<Item = DateTime<Local>> + '_ {
        self.schedule.after(&after)
    }
}

/// How a job reaches its fire time.
#[derive(Debug, Clone)]
pub enum Mechanism {
    /// Evaluated on every engine tick; removed after its first fire.
    RecurringTrigger(RecurringTrigger),
    /// Independent timer task that sleeps until `fire_at`.
    OneShotTimer { fire_at: DateTime<Local> },
}

impl Mechanism {
    pub fn next_fire(&self) -> DateTime<Local> {
        match self {
            Mechanism::RecurringTrigger(trigger) => trigger.next_fire,
            Mechanism::OneShotTimer { fire_at } => *fire_at,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Mechanism::RecurringTrigger(_) => "recurring_trigger",
            Mechanism::OneShotTimer { .. } => "one_shot_timer",
        }
    }
}

/// A registered reminder.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    /// Text handed to the delivery sink.
    pub message: String,
    pub mechanism: Mechanism,
    pub state: JobState,
    pub created_at: DateTime<Local>,
}

/// A fired reminder, passed to the delivery sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    /// Originating job ID, used for logging.
    pub job_id: JobId,
    pub message: String,
    pub fired_at: DateTime<Local>,
}
