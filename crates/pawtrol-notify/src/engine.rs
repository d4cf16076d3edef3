use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use pawtrol_core::channel::{DeliveryChannel, SendOutcome};
use pawtrol_core::config::EngineConfig;
use pawtrol_store::{ReminderStore, Result as StoreResult};

use crate::fire_time::compute_fire_time;
use crate::message;

/// Scan horizon for the primary path. Must exceed the largest supported
/// lead time (1 day) plus scheduler jitter so every reminder appears in at
/// least one scan before its fire time.
const LOOKAHEAD_HOURS: i64 = 25;

/// How far back the overdue sweep looks.
const OVERDUE_WINDOW_HOURS: i64 = 24;

/// A reminder counts as due when its fire time is within this many seconds —
/// one polling period, so nothing falls between two ticks.
const GRACE_SECS: i64 = 60;

/// Upper bound on a single delivery call; a hung send must not stall the
/// rest of the cycle's reminders past this.
const SEND_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Per-cycle counters, logged when any candidate was seen.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    /// Rows returned by the scan (includes not-yet-due ones).
    pub candidates: usize,
    pub delivered: usize,
    pub failed: usize,
    /// Marked notified without a send because no recipient id exists.
    pub skipped: usize,
}

/// Polls the store on a fixed period and pushes due reminders through the
/// delivery channel. Constructed with injected dependencies; no ambient
/// globals. Cycles never overlap: the run loop awaits each cycle before the
/// interval yields the next tick.
pub struct NotifierEngine {
    store: ReminderStore,
    channel: Arc<dyn DeliveryChannel>,
    poll_secs: u64,
}

impl NotifierEngine {
    pub fn new(store: ReminderStore, channel: Arc<dyn DeliveryChannel>, config: &EngineConfig) -> Self {
        Self {
            store,
            channel,
            poll_secs: config.poll_secs,
        }
    }

    /// Read access to the underlying store (status changes, fixtures).
    pub fn store(&self) -> &ReminderStore {
        &self.store
    }

    /// Main loop. Polls every `poll_secs` until `shutdown` broadcasts true;
    /// an in-flight cycle finishes before the shutdown is honoured.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            poll_secs = self.poll_secs,
            channel = self.channel.name(),
            "notifier engine started"
        );

        let mut interval = tokio::time::interval(StdDuration::from_secs(self.poll_secs));
        // An overrunning cycle delays the next tick instead of bursting.
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    // A store failure kills this cycle only; the loop keeps
                    // ticking.
                    match self.run_cycle(Utc::now()).await {
                        Ok(stats) if stats.candidates > 0 => {
                            info!(
                                candidates = stats.candidates,
                                delivered = stats.delivered,
                                failed = stats.failed,
                                skipped = stats.skipped,
                                "notification cycle"
                            );
                        }
                        Ok(_) => {}
                        Err(e) => error!("notification cycle error: {e}"),
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("notifier engine shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// One scan-and-deliver pass over the primary path.
    ///
    /// Per candidate: not yet due → leave for a later cycle; no recipient →
    /// mark notified WITHOUT a send (a reminder with nowhere to go must not
    /// be rescanned forever); channel unavailable → leave untouched so it
    /// retries once credentials appear; otherwise send and set the guard
    /// only on success.
    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> StoreResult<CycleStats> {
        let candidates = self
            .store
            .list_due_candidates(now, Duration::hours(LOOKAHEAD_HOURS))?;
        let mut stats = CycleStats {
            candidates: candidates.len(),
            ..CycleStats::default()
        };

        for cand in candidates {
            let fire_time =
                compute_fire_time(cand.reminder.event_time, cand.reminder.notify_config.as_ref());
            if fire_time - now > Duration::seconds(GRACE_SECS) {
                continue; // not yet due — stays a candidate
            }

            let Some(recipient) = cand.recipient.clone() else {
                if self.store.mark_notified(&cand.reminder.id)? {
                    debug!(
                        reminder_id = %cand.reminder.id,
                        "no recipient id — marked notified without delivery"
                    );
                }
                stats.skipped += 1;
                continue;
            };

            if !self.channel.is_available() {
                // No credentials at startup; retried every cycle until the
                // channel comes back.
                continue;
            }

            let text = message::render(&cand, now);
            match Self::send_with_timeout(self.channel.as_ref(), &recipient, &text).await {
                SendOutcome::Delivered => {
                    self.store.mark_notified(&cand.reminder.id)?;
                    stats.delivered += 1;
                }
                SendOutcome::Failed(reason) => {
                    warn!(
                        reminder_id = %cand.reminder.id,
                        %reason,
                        "delivery failed; retrying next cycle"
                    );
                    stats.failed += 1;
                }
            }
        }

        Ok(stats)
    }

    /// Catch-up pass over recently passed reminders, re-sending regardless
    /// of `notification_sent` and never mutating it. Re-invoking re-sends —
    /// that is why this is only run when explicitly asked for. Returns the
    /// number of deliveries that went through.
    pub async fn sweep_overdue(&mut self, now: DateTime<Utc>) -> StoreResult<usize> {
        if !self.channel.is_available() {
            warn!("overdue sweep skipped: delivery channel unavailable");
            return Ok(0);
        }

        let matches = self
            .store
            .list_overdue(now, Duration::hours(OVERDUE_WINDOW_HOURS))?;
        let total = matches.len();
        let mut sent = 0;

        for cand in matches {
            let Some(recipient) = cand.recipient.clone() else {
                debug!(reminder_id = %cand.reminder.id, "overdue sweep: no recipient id");
                continue;
            };
            let text = message::render(&cand, now);
            match Self::send_with_timeout(self.channel.as_ref(), &recipient, &text).await {
                SendOutcome::Delivered => sent += 1,
                SendOutcome::Failed(reason) => {
                    warn!(reminder_id = %cand.reminder.id, %reason, "overdue sweep delivery failed");
                }
            }
        }

        if total > 0 {
            info!(matches = total, sent, "overdue sweep complete");
        }
        Ok(sent)
    }

    // Takes the channel rather than `&self`: a `&self` captured across the
    // await would require the engine (and its SQLite connection) to be
    // `Sync`, which it is not.
    async fn send_with_timeout(
        channel: &dyn DeliveryChannel,
        recipient: &str,
        text: &str,
    ) -> SendOutcome {
        match tokio::time::timeout(SEND_TIMEOUT, channel.send(recipient, text)).await {
            Ok(outcome) => outcome,
            Err(_) => SendOutcome::Failed(format!(
                "send timed out after {}s",
                SEND_TIMEOUT.as_secs()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pawtrol_store::{LeadPreset, NotifyConfig, ReminderStatus};
    use rusqlite::Connection;
    use std::sync::Mutex;

    struct MockChannel {
        available: bool,
        fail: Mutex<bool>,
        sends: Mutex<Vec<(String, String)>>,
    }

    impl MockChannel {
        fn new(available: bool) -> Arc<Self> {
            Arc::new(Self {
                available,
                fail: Mutex::new(false),
                sends: Mutex::new(Vec::new()),
            })
        }

        fn set_fail(&self, fail: bool) {
            *self.fail.lock().unwrap() = fail;
        }

        fn sends(&self) -> Vec<(String, String)> {
            self.sends.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl DeliveryChannel for MockChannel {
        fn name(&self) -> &str {
            "mock"
        }

        fn is_available(&self) -> bool {
            self.available
        }

        async fn send(&self, recipient: &str, text: &str) -> SendOutcome {
            self.sends
                .lock()
                .unwrap()
                .push((recipient.to_string(), text.to_string()));
            if *self.fail.lock().unwrap() {
                SendOutcome::Failed("mock failure".into())
            } else {
                SendOutcome::Delivered
            }
        }
    }

    /// Engine over an in-memory store with one owner/pet/type fixture.
    fn engine_with(
        chat_id: Option<&str>,
        available: bool,
    ) -> (NotifierEngine, Arc<MockChannel>, String, String) {
        let store = ReminderStore::new(Connection::open_in_memory().unwrap()).unwrap();
        let owner = store.add_owner("Dana", chat_id).unwrap();
        let pet = store.add_pet(&owner, "Rex").unwrap();
        let kind = store.add_reminder_type("Vaccination").unwrap();
        let channel = MockChannel::new(available);
        let engine = NotifierEngine::new(store, channel.clone(), &EngineConfig::default());
        (engine, channel, pet, kind)
    }

    #[tokio::test]
    async fn delivers_at_most_once_under_success() {
        let (mut engine, channel, pet, kind) = engine_with(Some("42"), true);
        let now = Utc::now();
        let r = engine
            .store()
            .create_reminder(&pet, &kind, now, None, None, None)
            .unwrap();

        let stats = engine.run_cycle(now).await.unwrap();
        assert_eq!(stats.delivered, 1);
        assert_eq!(channel.sends().len(), 1);
        assert_eq!(channel.sends()[0].0, "42");
        assert!(engine.store().get_reminder(&r.id).unwrap().unwrap().notification_sent);

        // Second immediate cycle: the guard keeps it out of the scan.
        let stats = engine.run_cycle(now).await.unwrap();
        assert_eq!(stats.candidates, 0);
        assert_eq!(channel.sends().len(), 1);
    }

    #[tokio::test]
    async fn failed_delivery_retries_next_cycle() {
        let (mut engine, channel, pet, kind) = engine_with(Some("42"), true);
        let now = Utc::now();
        let r = engine
            .store()
            .create_reminder(&pet, &kind, now, None, None, None)
            .unwrap();

        channel.set_fail(true);
        let stats = engine.run_cycle(now).await.unwrap();
        assert_eq!(stats.failed, 1);
        assert!(!engine.store().get_reminder(&r.id).unwrap().unwrap().notification_sent);

        channel.set_fail(false);
        let stats = engine.run_cycle(now).await.unwrap();
        assert_eq!(stats.delivered, 1);
        assert_eq!(channel.sends().len(), 2);
        assert!(engine.store().get_reminder(&r.id).unwrap().unwrap().notification_sent);
    }

    #[tokio::test]
    async fn no_recipient_short_circuits_without_send() {
        let (mut engine, channel, pet, kind) = engine_with(None, true);
        let now = Utc::now();
        let r = engine
            .store()
            .create_reminder(&pet, &kind, now, None, None, None)
            .unwrap();

        let stats = engine.run_cycle(now).await.unwrap();
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.delivered, 0);
        assert!(channel.sends().is_empty());
        assert!(engine.store().get_reminder(&r.id).unwrap().unwrap().notification_sent);
    }

    #[tokio::test]
    async fn unavailable_channel_leaves_candidate_untouched() {
        let (mut engine, channel, pet, kind) = engine_with(Some("42"), false);
        let now = Utc::now();
        let r = engine
            .store()
            .create_reminder(&pet, &kind, now, None, None, None)
            .unwrap();

        let stats = engine.run_cycle(now).await.unwrap();
        assert_eq!(stats.candidates, 1);
        assert_eq!(stats.delivered + stats.failed + stats.skipped, 0);
        assert!(channel.sends().is_empty());
        assert!(!engine.store().get_reminder(&r.id).unwrap().unwrap().notification_sent);
    }

    #[tokio::test]
    async fn not_yet_due_is_left_for_later_cycles() {
        let (mut engine, channel, pet, kind) = engine_with(Some("42"), true);
        let now = Utc::now();
        let r = engine
            .store()
            .create_reminder(&pet, &kind, now + Duration::hours(2), None, None, None)
            .unwrap();

        let stats = engine.run_cycle(now).await.unwrap();
        assert_eq!(stats.candidates, 1);
        assert_eq!(stats.delivered, 0);
        assert!(channel.sends().is_empty());
        assert!(!engine.store().get_reminder(&r.id).unwrap().unwrap().notification_sent);
    }

    #[tokio::test]
    async fn lead_time_pulls_fire_time_forward() {
        let (mut engine, channel, pet, kind) = engine_with(Some("42"), true);
        let now = Utc::now();
        // Event in 2 h with a 2 h lead: fire time is now.
        engine
            .store()
            .create_reminder(
                &pet,
                &kind,
                now + Duration::hours(2),
                None,
                Some(NotifyConfig::Preset {
                    preset: LeadPreset::Hour2,
                }),
                None,
            )
            .unwrap();

        let stats = engine.run_cycle(now).await.unwrap();
        assert_eq!(stats.delivered, 1);
        assert_eq!(channel.sends().len(), 1);
        assert!(!channel.sends()[0].1.contains("overdue"));
    }

    #[tokio::test]
    async fn overdue_event_is_flagged_in_message() {
        let (mut engine, channel, pet, kind) = engine_with(Some("42"), true);
        let now = Utc::now();
        engine
            .store()
            .create_reminder(&pet, &kind, now - Duration::minutes(30), None, None, None)
            .unwrap();

        engine.run_cycle(now).await.unwrap();
        assert!(channel.sends()[0].1.contains("overdue"));
    }

    #[tokio::test]
    async fn sweep_resends_and_never_touches_the_guard() {
        let (mut engine, channel, pet, kind) = engine_with(Some("42"), true);
        let now = Utc::now();
        let r = engine
            .store()
            .create_reminder(&pet, &kind, now - Duration::hours(1), None, None, None)
            .unwrap();
        assert!(engine.store().mark_notified(&r.id).unwrap());

        assert_eq!(engine.sweep_overdue(now).await.unwrap(), 1);
        assert_eq!(engine.sweep_overdue(now).await.unwrap(), 1);
        assert_eq!(channel.sends().len(), 2, "sweep re-sends on every invocation");
        assert!(engine.store().get_reminder(&r.id).unwrap().unwrap().notification_sent);
    }

    #[tokio::test]
    async fn sweep_ignores_completed_reminders() {
        let (mut engine, channel, pet, kind) = engine_with(Some("42"), true);
        let now = Utc::now();
        let r = engine
            .store()
            .create_reminder(&pet, &kind, now - Duration::hours(1), None, None, None)
            .unwrap();
        engine.store().set_status(&r.id, ReminderStatus::Completed).unwrap();

        assert_eq!(engine.sweep_overdue(now).await.unwrap(), 0);
        assert!(channel.sends().is_empty());
    }
}
