use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use storage::models::{ActiveSubscriber, DispatchOutcome, DispatchTask, NewDispatchLog};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::Result;
use crate::traits::{DispatchStore, OutboundChannel};

/// Lease row shared by every scheduler instance.
pub const TICK_LEASE: &str = "dispatch_tick";

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub interval: Duration,
    pub lease_ttl: Duration,
    /// Send attempts per recipient before giving up. 1 keeps single-attempt
    /// semantics: failures are logged as `failure`, never `failed_permanent`.
    pub max_attempts: u32,
    pub retry_backoff: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            lease_ttl: Duration::from_secs(300),
            max_attempts: 3,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

/// What a single tick did, for the loop's logs and the operator tool.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub lease_held_elsewhere: bool,
    pub tasks_processed: u32,
    pub delivered: u32,
    pub failed: u32,
}

/// Polls for due dispatch tasks and fans them out to the active subscribers
/// of their project, one send per recipient per run.
pub struct DispatchScheduler<S, C> {
    store: S,
    channel: C,
    config: SchedulerConfig,
    owner: String,
}

impl<S: DispatchStore, C: OutboundChannel> DispatchScheduler<S, C> {
    pub fn new(store: S, channel: C, config: SchedulerConfig) -> Self {
        Self {
            store,
            channel,
            config,
            owner: format!("dispatch-{}", Uuid::new_v4()),
        }
    }

    /// Periodic entry point. A failed tick is logged and retried on the
    /// next period.
    pub async fn run(self: Arc<Self>) {
        info!(
            interval = ?self.config.interval,
            owner = %self.owner,
            "starting dispatch scheduler"
        );

        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            match self.tick().await {
                Ok(report) if report.lease_held_elsewhere => {
                    debug!("dispatch lease held elsewhere, skipping tick");
                }
                Ok(report) => {
                    if report.tasks_processed > 0 {
                        info!(
                            tasks = report.tasks_processed,
                            delivered = report.delivered,
                            failed = report.failed,
                            "dispatch tick finished"
                        );
                    }
                }
                Err(e) => error!(error = %e, "dispatch tick failed"),
            }
        }
    }

    /// Process all due tasks under the tick lease. A tick that cannot take
    /// the lease is a no-op.
    pub async fn tick(&self) -> Result<TickReport> {
        if !self
            .store
            .acquire_lease(TICK_LEASE, &self.owner, self.config.lease_ttl)
            .await?
        {
            return Ok(TickReport {
                lease_held_elsewhere: true,
                ..TickReport::default()
            });
        }

        let outcome = self.process_due_tasks().await;

        // Released on the error path too; otherwise a failed tick would
        // block dispatch everywhere until the lease expires.
        if let Err(e) = self.store.release_lease(TICK_LEASE, &self.owner).await {
            warn!(error = %e, "failed to release dispatch lease");
        }

        outcome
    }

    async fn process_due_tasks(&self) -> Result<TickReport> {
        let mut report = TickReport::default();

        let due = self.store.due_tasks(Utc::now()).await?;

        for task in due {
            // Claiming before any send closes most of the double-send window.
            if !self.store.mark_sending(task.task_id).await? {
                debug!(task_id = %task.task_id, "task already claimed by another run");
                continue;
            }

            self.fan_out(&task, &mut report).await?;

            // Done unconditionally: delivery is best-effort, and failures
            // live in the per-recipient logs, not in the task status.
            self.store.mark_done(task.task_id).await?;
            report.tasks_processed += 1;
        }

        Ok(report)
    }

    async fn fan_out(&self, task: &DispatchTask, report: &mut TickReport) -> Result<()> {
        let subscribers = self.store.active_subscribers(task.project_id).await?;

        for subscriber in subscribers {
            let log = self.deliver(task, &subscriber).await;

            match log.outcome {
                DispatchOutcome::Success => report.delivered += 1,
                DispatchOutcome::Failure | DispatchOutcome::FailedPermanent => report.failed += 1,
            }

            self.store.append_log(&log).await?;
        }

        Ok(())
    }

    /// Deliver to one recipient. Channel errors never escape this method:
    /// every exit path is a log row, so one bad recipient cannot abort its
    /// siblings or the task.
    async fn deliver(&self, task: &DispatchTask, subscriber: &ActiveSubscriber) -> NewDispatchLog {
        let Some(recipient) = subscriber.channel_user_id.as_deref() else {
            return NewDispatchLog {
                task_id: task.task_id,
                user_id: subscriber.user_id,
                recipient: None,
                outcome: DispatchOutcome::Failure,
                error: Some("recipient not connected".to_string()),
                attempts: 0,
            };
        };

        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            match self
                .channel
                .send(task.project_id, recipient, &task.content)
                .await
            {
                Ok(()) => {
                    return NewDispatchLog {
                        task_id: task.task_id,
                        user_id: subscriber.user_id,
                        recipient: Some(recipient.to_string()),
                        outcome: DispatchOutcome::Success,
                        error: None,
                        attempts: attempt as i32,
                    };
                }
                Err(e) => {
                    last_error = e.to_string();
                    warn!(
                        task_id = %task.task_id,
                        recipient,
                        attempt,
                        error = %last_error,
                        "channel send failed"
                    );

                    if attempt < max_attempts {
                        tokio::time::sleep(self.config.retry_backoff * attempt).await;
                    }
                }
            }
        }

        let outcome = if max_attempts == 1 {
            DispatchOutcome::Failure
        } else {
            DispatchOutcome::FailedPermanent
        };

        NewDispatchLog {
            task_id: task.task_id,
            user_id: subscriber.user_id,
            recipient: Some(recipient.to_string()),
            outcome,
            error: Some(last_error),
            attempts: max_attempts as i32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DispatcherError;
    use chrono::{DateTime, Duration as ChronoDuration, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use storage::models::DispatchTaskStatus;

    #[derive(Default)]
    struct StoreState {
        tasks: Vec<DispatchTask>,
        subscribers: HashMap<Uuid, Vec<ActiveSubscriber>>,
        logs: Vec<NewDispatchLog>,
        lease: Option<(String, String, DateTime<Utc>)>,
    }

    #[derive(Default)]
    struct InMemoryStore {
        state: Mutex<StoreState>,
    }

    impl InMemoryStore {
        fn with_task(task: DispatchTask, subscribers: Vec<ActiveSubscriber>) -> Self {
            let store = Self::default();
            {
                let mut state = store.state.lock().unwrap();
                state.subscribers.insert(task.project_id, subscribers);
                state.tasks.push(task);
            }
            store
        }

        fn logs(&self) -> Vec<NewDispatchLog> {
            self.state.lock().unwrap().logs.clone()
        }

        fn task_status(&self, task_id: Uuid) -> DispatchTaskStatus {
            self.state
                .lock()
                .unwrap()
                .tasks
                .iter()
                .find(|t| t.task_id == task_id)
                .map(|t| t.status)
                .unwrap()
        }

        fn hold_lease(&self, owner: &str, expires_at: DateTime<Utc>) {
            self.state.lock().unwrap().lease =
                Some((TICK_LEASE.to_string(), owner.to_string(), expires_at));
        }
    }

    #[async_trait::async_trait]
    impl DispatchStore for InMemoryStore {
        async fn acquire_lease(&self, name: &str, owner: &str, ttl: Duration) -> Result<bool> {
            let mut state = self.state.lock().unwrap();
            let now = Utc::now();

            // Mirrors the conditional upsert: any live lease blocks, the
            // holder's own included.
            if let Some((held_name, _, expires_at)) = &state.lease
                && held_name == name
                && *expires_at > now
            {
                return Ok(false);
            }

            let expires_at = now
                + ChronoDuration::from_std(ttl).unwrap_or_else(|_| ChronoDuration::seconds(300));
            state.lease = Some((name.to_string(), owner.to_string(), expires_at));
            Ok(true)
        }

        async fn release_lease(&self, name: &str, owner: &str) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            if let Some((held_name, held_owner, _)) = &state.lease
                && held_name == name
                && held_owner == owner
            {
                state.lease = None;
            }
            Ok(())
        }

        async fn due_tasks(&self, now: DateTime<Utc>) -> Result<Vec<DispatchTask>> {
            let state = self.state.lock().unwrap();
            Ok(state
                .tasks
                .iter()
                .filter(|t| t.status == DispatchTaskStatus::Scheduled && t.scheduled_at <= now)
                .cloned()
                .collect())
        }

        async fn mark_sending(&self, task_id: Uuid) -> Result<bool> {
            let mut state = self.state.lock().unwrap();
            let task = state
                .tasks
                .iter_mut()
                .find(|t| t.task_id == task_id)
                .ok_or(DispatcherError::ChannelError("unknown task".to_string()))?;

            if task.status != DispatchTaskStatus::Scheduled {
                return Ok(false);
            }
            task.status = DispatchTaskStatus::Sending;
            Ok(true)
        }

        async fn mark_done(&self, task_id: Uuid) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            if let Some(task) = state.tasks.iter_mut().find(|t| t.task_id == task_id) {
                task.status = DispatchTaskStatus::Done;
            }
            Ok(())
        }

        async fn active_subscribers(&self, project_id: Uuid) -> Result<Vec<ActiveSubscriber>> {
            let state = self.state.lock().unwrap();
            Ok(state
                .subscribers
                .get(&project_id)
                .cloned()
                .unwrap_or_default())
        }

        async fn append_log(&self, log: &NewDispatchLog) -> Result<()> {
            self.state.lock().unwrap().logs.push(log.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockChannel {
        delay: Option<Duration>,
        /// recipient -> number of calls that should fail before succeeding
        failures: Mutex<HashMap<String, u32>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockChannel {
        fn failing(recipient: &str, times: u32) -> Self {
            let channel = Self::default();
            channel
                .failures
                .lock()
                .unwrap()
                .insert(recipient.to_string(), times);
            channel
        }

        fn with_delay(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl OutboundChannel for MockChannel {
        async fn send(&self, _project_id: Uuid, recipient: &str, _content: &str) -> Result<()> {
            self.calls.lock().unwrap().push(recipient.to_string());

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            let should_fail = {
                let mut failures = self.failures.lock().unwrap();
                match failures.get_mut(recipient) {
                    Some(remaining) if *remaining > 0 => {
                        *remaining -= 1;
                        true
                    }
                    _ => false,
                }
            };

            if should_fail {
                return Err(DispatcherError::ChannelError(
                    "provider unavailable".to_string(),
                ));
            }
            Ok(())
        }
    }

    fn due_task() -> DispatchTask {
        DispatchTask {
            task_id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            content: "Day 7: share your progress photo!".to_string(),
            scheduled_at: Utc::now() - ChronoDuration::minutes(1),
            status: DispatchTaskStatus::Scheduled,
            created_at: Utc::now(),
        }
    }

    fn subscriber(name: &str, channel_user_id: Option<&str>) -> ActiveSubscriber {
        ActiveSubscriber {
            user_id: Uuid::new_v4(),
            display_name: name.to_string(),
            channel_user_id: channel_user_id.map(String::from),
        }
    }

    fn single_attempt_config() -> SchedulerConfig {
        SchedulerConfig {
            max_attempts: 1,
            retry_backoff: Duration::from_millis(1),
            ..SchedulerConfig::default()
        }
    }

    #[tokio::test]
    async fn delivers_to_every_connected_subscriber() {
        let task = due_task();
        let task_id = task.task_id;
        let store = InMemoryStore::with_task(
            task,
            vec![
                subscriber("Ana", Some("ext-ana")),
                subscriber("Ben", Some("ext-ben")),
            ],
        );

        let scheduler =
            DispatchScheduler::new(store, MockChannel::default(), single_attempt_config());
        let report = scheduler.tick().await.unwrap();

        assert_eq!(report.tasks_processed, 1);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(scheduler.store.task_status(task_id), DispatchTaskStatus::Done);

        let logs = scheduler.store.logs();
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().all(|l| l.outcome == DispatchOutcome::Success));
    }

    #[tokio::test]
    async fn disconnected_recipient_is_logged_and_skipped() {
        let task = due_task();
        let task_id = task.task_id;
        let store = InMemoryStore::with_task(
            task,
            vec![
                subscriber("Ana", Some("ext-ana")),
                subscriber("Ben", None),
            ],
        );

        let scheduler =
            DispatchScheduler::new(store, MockChannel::default(), single_attempt_config());
        let report = scheduler.tick().await.unwrap();

        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(scheduler.store.task_status(task_id), DispatchTaskStatus::Done);

        let logs = scheduler.store.logs();
        let failure = logs
            .iter()
            .find(|l| l.outcome == DispatchOutcome::Failure)
            .unwrap();
        assert_eq!(failure.error.as_deref(), Some("recipient not connected"));
        assert_eq!(failure.recipient, None);
        assert_eq!(failure.attempts, 0);
    }

    #[tokio::test]
    async fn one_failing_recipient_does_not_abort_the_others() {
        let task = due_task();
        let task_id = task.task_id;
        let store = InMemoryStore::with_task(
            task,
            vec![
                subscriber("Ana", Some("ext-ana")),
                subscriber("Ben", Some("ext-ben")),
                subscriber("Cleo", Some("ext-cleo")),
            ],
        );

        let scheduler = DispatchScheduler::new(
            store,
            MockChannel::failing("ext-ben", u32::MAX),
            single_attempt_config(),
        );
        let report = scheduler.tick().await.unwrap();

        assert_eq!(report.delivered, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(scheduler.store.task_status(task_id), DispatchTaskStatus::Done);

        let logs = scheduler.store.logs();
        assert_eq!(logs.len(), 3);
        let failure = logs
            .iter()
            .find(|l| l.recipient.as_deref() == Some("ext-ben"))
            .unwrap();
        assert_eq!(failure.outcome, DispatchOutcome::Failure);
        assert!(failure.error.as_deref().unwrap().contains("provider unavailable"));
    }

    #[tokio::test]
    async fn transient_failures_are_retried_to_success() {
        let task = due_task();
        let store =
            InMemoryStore::with_task(task, vec![subscriber("Ana", Some("ext-ana"))]);

        let config = SchedulerConfig {
            max_attempts: 3,
            retry_backoff: Duration::from_millis(1),
            ..SchedulerConfig::default()
        };
        let scheduler =
            DispatchScheduler::new(store, MockChannel::failing("ext-ana", 2), config);
        let report = scheduler.tick().await.unwrap();

        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, 0);

        let logs = scheduler.store.logs();
        assert_eq!(logs[0].outcome, DispatchOutcome::Success);
        assert_eq!(logs[0].attempts, 3);
    }

    #[tokio::test]
    async fn exhausted_retries_become_permanent_failures() {
        let task = due_task();
        let store =
            InMemoryStore::with_task(task, vec![subscriber("Ana", Some("ext-ana"))]);

        let config = SchedulerConfig {
            max_attempts: 3,
            retry_backoff: Duration::from_millis(1),
            ..SchedulerConfig::default()
        };
        let scheduler =
            DispatchScheduler::new(store, MockChannel::failing("ext-ana", u32::MAX), config);
        let report = scheduler.tick().await.unwrap();

        assert_eq!(report.failed, 1);

        let logs = scheduler.store.logs();
        assert_eq!(logs[0].outcome, DispatchOutcome::FailedPermanent);
        assert_eq!(logs[0].attempts, 3);
        assert_eq!(scheduler.channel.calls().len(), 3);
    }

    #[tokio::test]
    async fn overlapping_tick_is_a_noop() {
        let task = due_task();
        let store = InMemoryStore::with_task(task, vec![subscriber("Ana", Some("ext-ana"))]);

        let scheduler = Arc::new(DispatchScheduler::new(
            store,
            MockChannel::with_delay(Duration::from_millis(100)),
            single_attempt_config(),
        ));

        let first = {
            let scheduler = Arc::clone(&scheduler);
            tokio::spawn(async move { scheduler.tick().await })
        };

        // Let the first tick take the lease and start its slow send.
        tokio::time::sleep(Duration::from_millis(20)).await;

        let second = scheduler.tick().await.unwrap();
        assert!(second.lease_held_elsewhere);
        assert_eq!(second.tasks_processed, 0);

        let first = first.await.unwrap().unwrap();
        assert_eq!(first.tasks_processed, 1);
        assert_eq!(scheduler.channel.calls().len(), 1);
        assert_eq!(scheduler.store.logs().len(), 1);
    }

    #[tokio::test]
    async fn second_tick_does_not_resend_a_done_task() {
        let task = due_task();
        let store = InMemoryStore::with_task(task, vec![subscriber("Ana", Some("ext-ana"))]);

        let scheduler =
            DispatchScheduler::new(store, MockChannel::default(), single_attempt_config());

        let first = scheduler.tick().await.unwrap();
        assert_eq!(first.tasks_processed, 1);

        let second = scheduler.tick().await.unwrap();
        assert_eq!(second.tasks_processed, 0);
        assert_eq!(scheduler.channel.calls().len(), 1);
    }

    #[tokio::test]
    async fn expired_lease_is_taken_over() {
        let task = due_task();
        let store = InMemoryStore::with_task(task, vec![subscriber("Ana", Some("ext-ana"))]);
        store.hold_lease("dispatch-crashed", Utc::now() - ChronoDuration::minutes(10));

        let scheduler =
            DispatchScheduler::new(store, MockChannel::default(), single_attempt_config());
        let report = scheduler.tick().await.unwrap();

        assert!(!report.lease_held_elsewhere);
        assert_eq!(report.tasks_processed, 1);
    }

    #[tokio::test]
    async fn live_foreign_lease_blocks_the_tick() {
        let task = due_task();
        let store = InMemoryStore::with_task(task, vec![subscriber("Ana", Some("ext-ana"))]);
        store.hold_lease("dispatch-other", Utc::now() + ChronoDuration::minutes(5));

        let scheduler =
            DispatchScheduler::new(store, MockChannel::default(), single_attempt_config());
        let report = scheduler.tick().await.unwrap();

        assert!(report.lease_held_elsewhere);
        assert!(scheduler.store.logs().is_empty());
    }
}
