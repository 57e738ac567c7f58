//! End-to-end scheduling scenarios against an in-memory sink.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use remindme_core::descriptor::parse;
use remindme_scheduler::{
    DeliverySink, MemorySink, Mechanism, Reminder, Result, Scheduler, SchedulerError,
};

fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Local> {
    Local
        .with_ymd_and_hms(y, mo, d, h, mi, s)
        .single()
        .expect("unambiguous local time")
}

fn engine() -> (Scheduler, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let scheduler = Scheduler::new(sink.clone(), Duration::from_secs(1));
    (scheduler, sink)
}

#[tokio::test]
async fn clock_time_fires_once_then_is_gone() {
    let (s, sink) = engine();
    let submitted = local(2026, 1, 10, 8, 0, 0);
    let id = s
        .register_at(&parse("at|09:16|call the handyman").unwrap(), submitted)
        .unwrap();

    assert_eq!(s.tick(submitted).await, 0);
    assert_eq!(s.tick(local(2026, 1, 10, 9, 15, 59)).await, 0);
    assert!(s.registry().contains(id));

    assert_eq!(s.tick(local(2026, 1, 10, 9, 16, 0)).await, 1);
    assert!(!s.registry().contains(id));

    // Tomorrow's 09:16 would match the expression again; the job is gone.
    assert_eq!(s.tick(local(2026, 1, 11, 9, 16, 0)).await, 0);
    assert_eq!(sink.messages(), vec!["call the handyman".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn relative_duration_fires_once_after_delay() {
    let (s, sink) = engine();
    let before = Local::now();
    let id = s.register(&parse("in|5m|login to the meeting").unwrap()).unwrap();

    match s.registry().get(id).unwrap().mechanism {
        Mechanism::OneShotTimer { fire_at } => {
            let offset = fire_at - before;
            assert!(offset >= chrono::Duration::minutes(5));
            assert!(offset < chrono::Duration::minutes(5) + chrono::Duration::seconds(1));
        }
        other => panic!("expected one-shot timer, got {other:?}"),
    }

    tokio::time::sleep(Duration::from_secs(299)).await;
    assert!(sink.delivered().is_empty());
    assert!(s.registry().contains(id));

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(sink.messages(), vec!["login to the meeting".to_string()]);
    assert!(s.registry().is_empty());

    // Nothing left to fire later either.
    tokio::time::sleep(Duration::from_secs(3_600)).await;
    assert_eq!(sink.delivered().len(), 1);
}

#[tokio::test]
async fn calendar_date_fires_once_on_that_day() {
    let (s, sink) = engine();
    let submitted = local(2026, 6, 1, 12, 0, 0);
    let id = s
        .register_at(&parse("on|08/17|buy a birthday card").unwrap(), submitted)
        .unwrap();

    assert_eq!(s.registry().get(id).unwrap().mechanism.next_fire(), local(2026, 8, 17, 0, 0, 0));

    assert_eq!(s.tick(local(2026, 8, 16, 23, 59, 59)).await, 0);
    assert_eq!(s.tick(local(2026, 8, 17, 0, 0, 0)).await, 1);
    // Every further minute of the day matches the expression.
    assert_eq!(s.tick(local(2026, 8, 17, 0, 1, 0)).await, 0);
    assert_eq!(s.tick(local(2027, 8, 17, 0, 0, 0)).await, 0);

    assert_eq!(sink.messages(), vec!["buy a birthday card".to_string()]);
    assert!(s.registry().is_empty());
}

#[tokio::test]
async fn calendar_date_submitted_in_its_last_minute_fires_today() {
    let (s, sink) = engine();
    let submitted = local(2026, 1, 10, 23, 59, 30);
    s.register_at(&parse("on|01/10|pay rent").unwrap(), submitted)
        .unwrap();

    assert_eq!(s.tick(local(2026, 1, 10, 23, 59, 31)).await, 1);
    assert_eq!(sink.messages(), vec!["pay rent".to_string()]);
    assert!(s.registry().is_empty());
}

#[tokio::test]
async fn coincident_ticks_fire_once() {
    let (s, sink) = engine();
    let submitted = local(2026, 1, 10, 8, 0, 0);
    s.register_at(&parse("at|09:00|stand up").unwrap(), submitted)
        .unwrap();

    let at = local(2026, 1, 10, 9, 0, 0);
    let (a, b) = tokio::join!(s.tick(at), s.tick(at));
    assert_eq!(a + b, 1);
    assert_eq!(sink.delivered().len(), 1);
}

/// Yields before recording so two concurrent fires interleave.
#[derive(Default)]
struct SlowSink {
    inner: MemorySink,
}

#[async_trait]
impl DeliverySink for SlowSink {
    fn name(&self) -> &str {
        "slow"
    }

    async fn deliver(&self, reminder: &Reminder) -> Result<()> {
        tokio::task::yield_now().await;
        self.inner.deliver(reminder).await
    }
}

#[tokio::test]
async fn racing_handles_deliver_once() {
    let sink = Arc::new(SlowSink::default());
    let s = Scheduler::new(sink.clone(), Duration::from_secs(1));
    let submitted = local(2026, 1, 10, 8, 0, 0);
    s.register_at(&parse("at|09:00|once").unwrap(), submitted)
        .unwrap();

    // Both evaluators see the job as due before either fires it.
    let at = local(2026, 1, 10, 9, 0, 0);
    let first = s.registry().due(at);
    let second = s.registry().due(at);
    assert_eq!(first, second);

    let h1 = s.registry().handle(first[0]);
    let h2 = s.registry().handle(second[0]);
    let (a, b) = tokio::join!(h1.fire(sink.as_ref(), at), h2.fire(sink.as_ref(), at));
    assert!(a ^ b);
    assert_eq!(sink.inner.messages(), vec!["once".to_string()]);
    assert!(s.registry().is_empty());
}

struct FailingSink;

#[async_trait]
impl DeliverySink for FailingSink {
    fn name(&self) -> &str {
        "failing"
    }

    async fn deliver(&self, _reminder: &Reminder) -> Result<()> {
        Err(SchedulerError::Delivery {
            sink: "failing".to_string(),
            reason: "unavailable".to_string(),
        })
    }
}

#[tokio::test]
async fn failed_delivery_still_removes_job() {
    let s = Scheduler::new(Arc::new(FailingSink), Duration::from_secs(1));
    let submitted = local(2026, 1, 10, 8, 0, 0);
    s.register_at(&parse("at|09:00|lost").unwrap(), submitted)
        .unwrap();

    assert_eq!(s.tick(local(2026, 1, 10, 9, 0, 0)).await, 1);
    assert!(s.registry().is_empty());
}

#[tokio::test]
async fn impossible_date_is_dropped_and_engine_continues() {
    let (s, sink) = engine();
    let submitted = local(2026, 1, 10, 8, 0, 0);

    let err = s
        .register_at(&parse("on|02/30|never").unwrap(), submitted)
        .unwrap_err();
    assert!(matches!(err, SchedulerError::NeverFires { .. }));
    assert!(s.registry().is_empty());

    s.register_at(&parse("at|09:00|fine").unwrap(), submitted)
        .unwrap();
    assert_eq!(s.tick(local(2026, 1, 10, 9, 0, 0)).await, 1);
    assert_eq!(sink.messages(), vec!["fine".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn ids_are_shared_across_mechanisms_and_never_reused() {
    let (s, _sink) = engine();
    let a = s.register(&parse("in|1m|first").unwrap()).unwrap();
    let b = s.register(&parse("at|09:00|second").unwrap()).unwrap();
    assert_eq!((a.get(), b.get()), (1, 2));

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert!(!s.registry().contains(a));

    let c = s.register(&parse("in|1h|third").unwrap()).unwrap();
    assert_eq!(c.get(), 3);
    let ids: Vec<u64> = s.registry().list().iter().map(|j| j.id.get()).collect();
    assert_eq!(ids, vec![2, 3]);
}

#[tokio::test(start_paused = true)]
async fn dropping_scheduler_disarms_pending_timers() {
    let sink = Arc::new(MemorySink::new());
    {
        let s = Scheduler::new(sink.clone(), Duration::from_secs(1));
        s.register(&parse("in|1m|orphan").unwrap()).unwrap();
    }
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert!(sink.delivered().is_empty());
}
