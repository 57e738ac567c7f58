//! Trigger policy selection: which firing mechanism serves a descriptor.
//!
//! Clock times and calendar dates become recurring cron expressions because
//! the evaluator has no "once at instant X" primitive. The engine turns them
//! back into at-most-once reminders by removing the job on its first fire.
//! Relative durations become a single timer.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use remindme_core::When;

use crate::{
    error::{Result, SchedulerError},
    types::{Mechanism, RecurringTrigger},
};

/// Scheduling decision for a descriptor, before anything is compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerPolicy {
    Recurring { expression: String, anchor: Anchor },
    OneShot { delay: Duration },
}

/// Where the search for a recurring trigger's first occurrence starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Strictly after submission.
    Now,
    /// Start of the submission day: an occurrence that already began today
    /// is due on the next tick instead of rolling over to next year.
    StartOfDay,
}

/// Map a descriptor's timing to a trigger policy.
pub fn select(when: &When) -> TriggerPolicy {
    match *when {
        When::AbsoluteClockTime { hour, minute } => TriggerPolicy::Recurring {
            expression: daily_expression(hour, minute),
            anchor: Anchor::Now,
        },
        When::CalendarDate { month, day } => TriggerPolicy::Recurring {
            expression: annual_expression(month, day),
            anchor: Anchor::StartOfDay,
        },
        When::RelativeDuration { .. } => TriggerPolicy::OneShot {
            delay: when.delay().unwrap_or_default(),
        },
    }
}

/// Every day at `hour:minute:00`.
pub fn daily_expression(hour: u8, minute: u8) -> String {
    format!("0 {minute} {hour} * * *")
}

/// Every minute of `month/day`, every year. The first evaluated minute of
/// that date fires; removal on first fire suppresses the rest.
pub fn annual_expression(month: u8, day: u8) -> String {
    format!("0 * * {day} {month} *")
}

impl TriggerPolicy {
    /// Compile the policy into a concrete mechanism relative to `now`.
    pub fn build(&self, now: DateTime<Local>) -> Result<Mechanism> {
        match self {
            TriggerPolicy::Recurring { expression, anchor } => {
                let after = match anchor {
                    Anchor::Now => now,
                    Anchor::StartOfDay => day_start(now),
                };
                compile(expression, after).map(Mechanism::RecurringTrigger)
            }
            TriggerPolicy::OneShot { delay } => {
                let offset = chrono::Duration::from_std(*delay)
                    .map_err(|e| SchedulerError::OutOfRange(e.to_string()))?;
                let fire_at = now.checked_add_signed(offset).ok_or_else(|| {
                    SchedulerError::OutOfRange(format!("{}s from {now}", delay.as_secs()))
                })?;
                Ok(Mechanism::OneShotTimer { fire_at })
            }
        }
    }
}

/// Just before local midnight of `now`'s day, so a strictly-after search
/// includes 00:00:00. Falls back to `now` when midnight does not exist locally.
fn day_start(now: DateTime<Local>) -> DateTime<Local> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| Local.from_local_datetime(&midnight).earliest())
        .map(|midnight| midnight - chrono::Duration::seconds(1))
        .unwrap_or(now)
}

/// Parse `expression` and find its first occurrence strictly after `after`.
pub fn compile(expression: &str, after: DateTime<Local>) -> Result<RecurringTrigger> {
    let schedule =
        cron::Schedule::from_str(expression).map_err(|e| SchedulerError::InvalidExpression {
            expression: expression.to_string(),
            reason: e.to_string(),
        })?;
    let next_fire = schedule
        .after(&after)
        .next()
        .ok_or_else(|| SchedulerError::NeverFires {
            expression: expression.to_string(),
        })?;
    Ok(RecurringTrigger {
        expression: expression.to_string(),
        schedule,
        next_fire,
    })
}
