//! Clock construction and the scheduler loop

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::event::Event;

use super::alarm::Alarm;
use super::config::ClockConfig;
use super::queue::ScheduleQueue;
use super::reload::ReloadSlot;
use super::subscription::{Registry, Subscription};

/// Source of the current time.
///
/// Injected at construction so scheduling decisions are deterministic under
/// simulated or accelerated clocks; nothing in the library reads the system
/// clock directly.
pub type NowFn = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// A single-loop alarm scheduler.
///
/// Exactly one scheduling loop runs per clock; it is the sole owner of the
/// priority queue and the timer, so queue operations need no external
/// synchronization. The clock starts idle: [`Clock::run`] spawns the loop,
/// [`Clock::reload`] hands it an event set, and [`Clock::subscribe`]
/// attaches a consumer mailbox.
pub struct Clock {
    config: ClockConfig,
    now: NowFn,
    pending: Arc<ReloadSlot>,
    registry: Arc<Registry>,
    cancel: CancellationToken,
}

impl Clock {
    /// Create a clock bound to the given now-function, with defaults.
    pub fn new(now: NowFn) -> Self {
        Self::with_config(now, ClockConfig::default())
    }

    /// Create a clock bound to the given now-function and configuration.
    pub fn with_config(now: NowFn, config: ClockConfig) -> Self {
        Self {
            config,
            now,
            pending: Arc::new(ReloadSlot::default()),
            registry: Arc::new(Registry::default()),
            cancel: CancellationToken::new(),
        }
    }

    /// Create a clock driven by the system UTC clock.
    pub fn system() -> Self {
        Self::new(Arc::new(Utc::now))
    }

    /// Start the scheduler loop. Returns immediately; the loop runs until
    /// [`Clock::interrupt`]. Intended to be called once per clock.
    pub fn run(&self) -> JoinHandle<()> {
        let scheduler = SchedulerLoop {
            now: Arc::clone(&self.now),
            pending: Arc::clone(&self.pending),
            registry: Arc::clone(&self.registry),
            cancel: self.cancel.clone(),
        };
        tokio::spawn(scheduler.run())
    }

    /// Request shutdown. Idempotent; the loop stops its timer, closes every
    /// live subscription mailbox, and exits.
    pub fn interrupt(&self) {
        self.cancel.cancel();
    }

    /// Replace the entire tracked event set.
    ///
    /// Non-blocking handoff: a reload submitted while a previous one is
    /// still pending for the loop replaces it, so only the most recent set
    /// survives. Events must have passed [`Event::validate`]; the loop
    /// trusts its input. An empty set is a valid transition to idle.
    pub fn reload(&self, events: Vec<Event>) {
        self.pending.put(events);
    }

    /// Attach a consumer. Alarms arrive in fire order on a bounded mailbox;
    /// see [`Subscription`] for the saturation policy.
    pub fn subscribe(&self) -> Subscription {
        self.registry.subscribe(self.config.mailbox_capacity)
    }
}

/// State captured by the spawned loop task.
struct SchedulerLoop {
    now: NowFn,
    pending: Arc<ReloadSlot>,
    registry: Arc<Registry>,
    cancel: CancellationToken,
}

impl SchedulerLoop {
    async fn run(self) {
        let mut queue = ScheduleQueue::default();
        info!("clock started");

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    self.registry.close_all();
                    info!("clock stopped");
                    return;
                }

                _ = self.pending.notified() => {
                    if let Some(events) = self.pending.take() {
                        queue = self.rebuild(events);
                    }
                }

                _ = self.sleep_until(queue.next_at()) => {
                    self.fire_due(&mut queue);
                }
            }
        }
    }

    /// Build a fresh queue from a reloaded event set. Finished events are
    /// omitted; any previously tracked set is discarded wholesale, so a
    /// replaced event can never fire from a stale timer.
    fn rebuild(&self, events: Vec<Event>) -> ScheduleQueue {
        let now = self.time();
        let mut queue = ScheduleQueue::with_capacity(events.len());
        for event in events {
            if let Some(next) = event.next(now) {
                queue.push(next, event);
            }
        }
        debug!(tracked = queue.len(), "event set reloaded");
        queue
    }

    /// Handle timer expiry: fire the minimum entry if it is actually due,
    /// then reschedule or retire it. The next loop iteration re-arms from
    /// the new queue head.
    fn fire_due(&self, queue: &mut ScheduleQueue) {
        let Some(entry) = queue.peek() else {
            return;
        };
        let at = entry.at;
        if self.time() < at {
            // Early wake from timer coalescing or clock imprecision; the
            // next iteration re-arms for the remaining delta.
            return;
        }

        // Stamp the alarm with the scheduled fire time, not the wall time,
        // so the recurrence chain does not compound drift.
        let alarm = Alarm {
            event: entry.event.name.clone(),
            at,
            data: entry.event.data.clone(),
        };
        debug!(event = %alarm.event, at = %alarm.at, "alarm fired");
        self.registry.publish(&alarm);

        match entry.event.next(at) {
            Some(next) => queue.reschedule_min(next),
            None => {
                queue.pop_min();
                debug!(event = %alarm.event, "event retired");
            }
        }
    }

    /// Sleep until `at` against the injected clock, or forever when the
    /// queue is empty (an idle clock disarms rather than polls). Returns
    /// immediately for entries already due.
    async fn sleep_until(&self, at: Option<DateTime<Utc>>) {
        match at {
            Some(at) => {
                let delta = at - self.time();
                if let Ok(delay) = delta.to_std() {
                    tokio::time::sleep(delay).await;
                }
            }
            None => std::future::pending::<()>().await,
        }
    }

    fn time(&self) -> DateTime<Utc> {
        (*self.now)()
    }
}
