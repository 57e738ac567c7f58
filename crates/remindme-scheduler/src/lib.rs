//! `remindme-scheduler`: at-most-once reminder scheduling on Tokio.
//!
//! # Overview
//!
//! Every submitted [`Descriptor`](remindme_core::Descriptor) becomes a job in
//! the [`JobRegistry`]. The [`Scheduler`] fires it once through a
//! [`DeliverySink`] and the job removes itself from the registry.
//!
//! # Mechanisms
//!
//! | Descriptor          | Mechanism                        | Expression        |
//! |---------------------|----------------------------------|-------------------|
//! | `at HH:MM`          | recurring trigger, tick-evaluated | `0 MM HH * * *`  |
//! | `on MM/DD`          | recurring trigger, tick-evaluated | `0 * * DD MM *`  |
//! | `in <n>m` / `<n>h`  | one-shot timer task              | none              |
//!
//! Recurring expressions would fire again the next day (or year); removal on
//! first fire is what makes them one-shot.

pub mod engine;
pub mod error;
pub mod registry;
pub mod sink;
pub mod trigger;
pub mod types;

pub use engine::Scheduler;
pub use error::{Result, SchedulerError};
pub use registry::{FireHandle, JobRegistry};
pub use sink::{DeliverySink, LogSink, MemorySink};
pub use trigger::{Anchor, TriggerPolicy};
pub use types::{Job, JobId, JobState, Mechanism, RecurringTrigger, Reminder};
