use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::{
    sink::DeliverySink,
    types::{Job, JobId, JobState, Mechanism, Reminder},
};

/// The set of live jobs, shared between the submission path (inserts) and the
/// firing path (claims and removals).
///
/// All access goes through one mutex. Registration and firing run on
/// different tasks with no ordering between them.
#[derive(Debug, Default)]
pub struct JobRegistry {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    /// Last id handed out; ids start at 1.
    last_id: u64,
    jobs: HashMap<JobId, Job>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock leaves the map itself consistent, since
    // every mutation is a single insert/remove/field write.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new job and return its freshly allocated id.
    pub fn insert(&self, message: String, mechanism: Mechanism, now: DateTime<Local>) -> JobId {
        let mut inner = self.lock();
        inner.last_id += 1;
        let id = JobId::new(inner.last_id);
        inner.jobs.insert(
            id,
            Job {
                id,
                message,
                mechanism,
                state: JobState::Scheduled,
                created_at: now,
            },
        );
        id
    }

    /// Move a job from `Scheduled` to `Fired` and return a copy of it.
    ///
    /// Returns `None` if the job is absent or already claimed, which is what
    /// keeps two coincident fires of the same id from both delivering.
    pub fn claim(&self, id: JobId) -> Option<Job> {
        let mut inner = self.lock();
        let job = inner.jobs.get_mut(&id)?;
        if job.state != JobState::Scheduled {
            return None;
        }
        job.state = JobState::Fired;
        Some(job.clone())
    }

    pub fn remove(&self, id: JobId) -> Option<Job> {
        self.lock().jobs.remove(&id)
    }

    pub fn get(&self, id: JobId) -> Option<Job> {
        self.lock().jobs.get(&id).cloned()
    }

    pub fn contains(&self, id: JobId) -> bool {
        self.lock().jobs.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().jobs.is_empty()
    }

    /// All live jobs ordered by id.
    pub fn list(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.lock().jobs.values().cloned().collect();
        jobs.sort_by_key(|j| j.id);
        jobs
    }

    /// Ids of scheduled recurring jobs whose fire time is at or before `now`.
    ///
    /// One-shot jobs are never returned; their own timers fire them.
    pub fn due(&self, now: DateTime<Local>) -> Vec<JobId> {
        let inner = self.lock();
        let mut due: Vec<JobId> = inner
            .jobs
            .values()
            .filter(|j| j.state == JobState::Scheduled)
            .filter(|j| match &j.mechanism {
                Mechanism::RecurringTrigger(trigger) => trigger.next_fire <= now,
                Mechanism::OneShotTimer { .. } => false,
            })
            .map(|j| j.id)
            .collect();
        due.sort();
        due
    }

    /// Capability handle a timer or evaluator uses to fire and remove `id`.
    pub fn handle(self: &Arc<Self>, id: JobId) -> FireHandle {
        FireHandle {
            id,
            registry: Arc::downgrade(self),
        }
    }
}

/// An id plus a weak reference to the owning registry.
///
/// Timer tasks hold one of these instead of the job itself, so a timer
/// outliving the engine cannot keep the registry alive.
#[derive(Debug, Clone)]
pub struct FireHandle {
    id: JobId,
    registry: Weak<JobRegistry>,
}

impl FireHandle {
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Claim the job, hand it to `sink`, then remove it.
    ///
    /// Returns `true` if this call delivered the reminder; `false` if the job
    /// was already claimed or removed, or the registry is gone. Delivery
    /// failures are logged and the job is removed regardless.
    pub async fn fire(&self, sink: &dyn DeliverySink, now: DateTime<Local>) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            debug!(job_id = %self.id, "registry dropped before fire");
            return false;
        };
        let Some(job) = registry.claim(self.id) else {
            debug!(job_id = %self.id, "job already fired or removed");
            return false;
        };

        let reminder = Reminder {
            job_id: job.id,
            message: job.message,
            fired_at: now,
        };
        if let Err(e) = sink.deliver(&reminder).await {
            warn!(job_id = %self.id, sink = sink.name(), "delivery failed: {e}");
        }

        registry.remove(self.id);
        info!(job_id = %self.id, mechanism = job.mechanism.kind(), "reminder fired");
        true
    }
}
