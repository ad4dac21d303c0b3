//! Scheduler engine — the due-check-and-dispatch pass run on every tick.
//! Uses tokio::interval for the in-process timer; anything else that can
//! call `on_tick(now)` (cron, CLI, tests) works the same way.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use recurbot_core::error::Result;
use recurbot_core::types::DeliveryResult;
use serde::Serialize;

use crate::dispatch::DispatchExecutor;
use crate::due::is_due;

/// Entry point for whatever drives the timer.
#[async_trait]
pub trait TickHandler: Send + Sync {
    async fn on_tick(&self, now: DateTime<Utc>) -> Result<TickReport>;
}

/// What one tick did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TickReport {
    /// Index entries that resolved to a record.
    pub examined: usize,
    pub dispatched: Vec<Dispatched>,
}

/// One dispatch performed during a tick.
#[derive(Debug, Clone, Serialize)]
pub struct Dispatched {
    pub id: String,
    pub name: String,
    pub result: DeliveryResult,
}

/// Walks the index and sends every due template, one at a time.
pub struct Scheduler {
    executor: DispatchExecutor,
}

impl Scheduler {
    pub fn new(executor: DispatchExecutor) -> Self {
        Self { executor }
    }

    /// Run one pass at `now`.
    ///
    /// Each dispatch, including its save, finishes before the next
    /// template is looked at. The first fault stops the pass; templates
    /// handled before it keep their updated `last_sent_time`.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<TickReport> {
        let registry = self.executor.registry();
        let ids = registry.index().await?;
        let mut report = TickReport::default();

        for id in &ids {
            let Some(template) = registry.get(id).await? else {
                continue;
            };
            report.examined += 1;

            if !is_due(&template, now) {
                continue;
            }

            tracing::info!("🔔 Template due: '{}'", template.name);
            let name = template.name.clone();
            let result = self.executor.dispatch_and_record(template, now).await?;
            report.dispatched.push(Dispatched {
                id: id.clone(),
                name,
                result,
            });
        }

        Ok(report)
    }
}

#[async_trait]
impl TickHandler for Scheduler {
    async fn on_tick(&self, now: DateTime<Utc>) -> Result<TickReport> {
        self.run(now).await
    }
}

/// Drive `handler` every `tick_secs` seconds, forever.
/// A failed tick is logged and the next one runs as usual.
pub async fn spawn_scheduler(handler: Arc<dyn TickHandler>, tick_secs: u64) {
    let tick_secs = tick_secs.max(1);
    tracing::info!("⏰ Scheduler started (check every {}s)", tick_secs);

    let mut interval = tokio::time::interval(std::time::Duration::from_secs(tick_secs));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        match handler.on_tick(Utc::now()).await {
            Ok(report) => {
                if !report.dispatched.is_empty() {
                    tracing::info!(
                        "📣 Tick sent {} of {} template(s)",
                        report.dispatched.len(),
                        report.examined
                    );
                }
            }
            Err(e) => tracing::error!("❌ Error in scheduled tick: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::tests::{Mode, RecordingGateway, Sent};
    use crate::registry::{INDEX_KEY, TemplateRegistry};
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone};
    use recurbot_core::error::RecurbotError;
    use recurbot_core::traits::KvStore;
    use recurbot_core::types::{NewTemplate, Template};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap()
    }

    fn every_minute(name: &str) -> NewTemplate {
        NewTemplate {
            name: Some(name.into()),
            message: Some(format!("msg {name}")),
            interval_value: Some("1".into()),
            interval_unit: Some("minutes".into()),
            ..NewTemplate::default()
        }
    }

    fn setup(mode: Mode) -> (Arc<MemoryStore>, Arc<RecordingGateway>, Scheduler) {
        let store = Arc::new(MemoryStore::new());
        let gateway = Arc::new(RecordingGateway::new(mode));
        let registry = TemplateRegistry::new(store.clone());
        let scheduler = Scheduler::new(DispatchExecutor::new(gateway.clone(), registry));
        (store, gateway, scheduler)
    }

    async fn stored(scheduler: &Scheduler, id: &str) -> Template {
        scheduler.executor.registry().require(id).await.unwrap()
    }

    #[tokio::test]
    async fn test_first_tick_sends_everything_once() {
        let (_store, gateway, scheduler) = setup(Mode::Accept);
        let reg = scheduler.executor.registry().clone();
        let a = reg.create(every_minute("a"), t0()).await.unwrap();
        let b = reg.create(every_minute("b"), t0()).await.unwrap();

        let report = scheduler.on_tick(t0()).await.unwrap();
        assert_eq!(report.examined, 2);
        assert_eq!(report.dispatched.len(), 2);
        assert_eq!(report.dispatched[0].id, a.id);
        assert_eq!(report.dispatched[1].id, b.id);
        assert_eq!(stored(&scheduler, &a.id).await.last_sent_time, Some(t0()));

        let again = scheduler.on_tick(t0() + Duration::seconds(30)).await.unwrap();
        assert!(again.dispatched.is_empty());
        assert_eq!(gateway.sent().len(), 2);

        let next = scheduler.on_tick(t0() + Duration::minutes(1)).await.unwrap();
        assert_eq!(next.dispatched.len(), 2);
    }

    #[tokio::test]
    async fn test_dormant_template_fires_once_without_catch_up() {
        let (_store, gateway, scheduler) = setup(Mode::Accept);
        let reg = scheduler.executor.registry().clone();
        let mut t = reg.create(every_minute("late"), t0()).await.unwrap();
        t.last_sent_time = Some(t0());
        reg.save(&t).await.unwrap();

        let now = t0() + Duration::minutes(10) + Duration::seconds(20);
        let report = scheduler.on_tick(now).await.unwrap();
        assert_eq!(report.dispatched.len(), 1);
        assert_eq!(stored(&scheduler, &t.id).await.last_sent_time, Some(now));

        let report = scheduler.on_tick(now + Duration::seconds(1)).await.unwrap();
        assert!(report.dispatched.is_empty());
        assert_eq!(gateway.sent(), vec![Sent::Text("msg late".into())]);
    }

    #[tokio::test]
    async fn test_rejection_is_reported_and_not_retried_early() {
        let (_store, gateway, scheduler) = setup(Mode::Reject);
        let reg = scheduler.executor.registry().clone();
        let t = reg.create(every_minute("x"), t0()).await.unwrap();

        let report = scheduler.on_tick(t0()).await.unwrap();
        assert!(!report.dispatched[0].result.ok);
        assert_eq!(stored(&scheduler, &t.id).await.last_sent_time, Some(t0()));

        gateway.set_mode(Mode::Accept);
        let report = scheduler.on_tick(t0() + Duration::seconds(59)).await.unwrap();
        assert!(report.dispatched.is_empty());
    }

    #[tokio::test]
    async fn test_fault_aborts_rest_of_tick() {
        let (_store, gateway, scheduler) = setup(Mode::Unreachable);
        let reg = scheduler.executor.registry().clone();
        let a = reg.create(every_minute("a"), t0()).await.unwrap();
        let b = reg.create(every_minute("b"), t0()).await.unwrap();

        let err = scheduler.on_tick(t0()).await.unwrap_err();
        assert!(matches!(err, RecurbotError::Gateway(_)));
        assert_eq!(gateway.sent().len(), 1);
        assert_eq!(stored(&scheduler, &a.id).await.last_sent_time, Some(t0()));
        assert!(stored(&scheduler, &b.id).await.last_sent_time.is_none());

        // next tick picks up the untouched template on its own
        gateway.set_mode(Mode::Accept);
        let report = scheduler.on_tick(t0() + Duration::seconds(5)).await.unwrap();
        assert_eq!(report.dispatched.len(), 1);
        assert_eq!(report.dispatched[0].id, b.id);
    }

    #[tokio::test]
    async fn test_dangling_index_entries_are_skipped() {
        let (store, gateway, scheduler) = setup(Mode::Accept);
        let reg = scheduler.executor.registry().clone();
        let t = reg.create(every_minute("real"), t0()).await.unwrap();
        store
            .put(INDEX_KEY, serde_json::json!(["template_gone", t.id.clone()]))
            .await
            .unwrap();

        let report = scheduler.on_tick(t0()).await.unwrap();
        assert_eq!(report.examined, 1);
        assert_eq!(report.dispatched.len(), 1);
        assert_eq!(gateway.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_record_without_unit_runs_daily() {
        let (store, gateway, scheduler) = setup(Mode::Accept);
        let reg = scheduler.executor.registry().clone();
        let later = reg.create(every_minute("later"), t0()).await.unwrap();
        store
            .put(
                "t1",
                serde_json::json!({
                    "id": "t1",
                    "name": "Old",
                    "message": "hi",
                    "intervalValue": 5,
                    "createdAt": t0().timestamp_millis(),
                    "lastSentTime": t0().timestamp_millis()
                }),
            )
            .await
            .unwrap();
        store
            .put(INDEX_KEY, serde_json::json!(["t1", later.id.clone()]))
            .await
            .unwrap();

        let listed = reg.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(
            crate::due::interval_ms(listed[0].interval_value, &listed[0].interval_unit),
            86_400_000
        );

        // templates indexed after it still go out
        let report = scheduler.on_tick(t0() + Duration::hours(23)).await.unwrap();
        assert_eq!(report.examined, 2);
        assert_eq!(report.dispatched.len(), 1);
        assert_eq!(report.dispatched[0].id, later.id);

        let report = scheduler.on_tick(t0() + Duration::hours(24)).await.unwrap();
        assert_eq!(report.dispatched[0].id, "t1");
        assert_eq!(gateway.sent()[1], Sent::Text("hi".into()));
    }

    #[tokio::test]
    async fn test_empty_store_tick() {
        let (_store, gateway, scheduler) = setup(Mode::Accept);
        let report = scheduler.on_tick(t0()).await.unwrap();
        assert_eq!(report.examined, 0);
        assert!(gateway.sent().is_empty());
    }

    struct CountingHandler {
        ticks: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl TickHandler for CountingHandler {
        async fn on_tick(&self, _now: DateTime<Utc>) -> Result<TickReport> {
            self.ticks.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RecurbotError::Store("boom".into()));
            }
            Ok(TickReport::default())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_scheduler_survives_failed_ticks() {
        let handler = Arc::new(CountingHandler {
            ticks: AtomicUsize::new(0),
            fail: true,
        });
        let task = tokio::spawn(spawn_scheduler(handler.clone(), 1));
        // paused clock: ticks at 0s, 1s and 2s fire before this wakes
        tokio::time::sleep(std::time::Duration::from_millis(2500)).await;
        task.abort();
        assert_eq!(handler.ticks.load(Ordering::SeqCst), 3);
    }
}
