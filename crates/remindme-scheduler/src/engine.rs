use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Local};
use remindme_core::Descriptor;
use tokio::{sync::watch, time::MissedTickBehavior};
use tracing::{debug, info};

use crate::{
    error::Result,
    registry::JobRegistry,
    sink::DeliverySink,
    trigger::{self, TriggerPolicy},
    types::JobId,
};

/// Core scheduler: owns the job registry, evaluates recurring triggers on a
/// fixed tick and spawns one timer task per one-shot job.
pub struct Scheduler {
    registry: Arc<JobRegistry>,
    sink: Arc<dyn DeliverySink>,
    tick_interval: Duration,
}

impl Scheduler {
    pub fn new(sink: Arc<dyn DeliverySink>, tick_interval: Duration) -> Self {
        Self {
            registry: Arc::new(JobRegistry::new()),
            sink,
            tick_interval,
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Schedule `descriptor` relative to the current local time.
    ///
    /// Must be called from within a Tokio runtime: one-shot jobs spawn their
    /// timer task here.
    pub fn register(&self, descriptor: &Descriptor) -> Result<JobId> {
        self.register_at(descriptor, Local::now())
    }

    /// Schedule `descriptor` as if submitted at `now`.
    ///
    /// Fails with a [`SchedulerError`](crate::SchedulerError) when the
    /// trigger expression is rejected or can never fire; the registry is left
    /// untouched in that case.
    pub fn register_at(&self, descriptor: &Descriptor, now: DateTime<Local>) -> Result<JobId> {
        let policy = trigger::select(descriptor.when());
        let mechanism = policy.build(now)?;
        let kind = mechanism.kind();
        let next_fire = mechanism.next_fire();

        let id = self
            .registry
            .insert(descriptor.message().to_string(), mechanism, now);

        if let TriggerPolicy::OneShot { delay } = policy {
            self.spawn_timer(id, delay);
        }

        info!(
            job_id = %id,
            kind = descriptor.when().kind(),
            mechanism = kind,
            next_fire = %next_fire.to_rfc3339(),
            "new reminder scheduled"
        );
        Ok(id)
    }

    fn spawn_timer(&self, id: JobId, delay: Duration) {
        let handle = self.registry.handle(id);
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            handle.fire(sink.as_ref(), Local::now()).await;
        });
    }

    /// Fire every recurring job due at `now`. Returns how many fired.
    pub async fn tick(&self, now: DateTime<Local>) -> usize {
        let mut fired = 0;
        for id in self.registry.due(now) {
            if self.registry.handle(id).fire(self.sink.as_ref(), now).await {
                fired += 1;
            }
        }
        fired
    }

    /// Main evaluation loop. Ticks every `tick_interval` until `shutdown`
    /// broadcasts `true` or its sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(tick_ms = self.tick_interval.as_millis() as u64, "scheduler engine started");

        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let fired = self.tick(Local::now()).await;
                    if fired > 0 {
                        debug!(fired, remaining = self.registry.len(), "tick");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!(pending = self.registry.len(), "scheduler engine shutting down");
                        break;
                    }
                }
            }
        }
    }
}
