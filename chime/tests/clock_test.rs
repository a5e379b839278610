//! End-to-end scheduler scenarios.
//!
//! Every test runs under a paused tokio clock with the clock's now-function
//! derived from it, so firings are deterministic and instant.

use std::sync::Arc;
use std::time::Duration;

use chime::{Clock, ClockConfig, Event, NowFn};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use serde_json::json;

/// A now-function derived from the (paused) tokio clock.
fn simulated_now() -> (NowFn, DateTime<Utc>) {
    let base = Utc.with_ymd_and_hms(2012, 12, 21, 0, 0, 0).unwrap();
    let start = tokio::time::Instant::now();
    let now: NowFn =
        Arc::new(move || base + TimeDelta::from_std(start.elapsed()).expect("short test span"));
    (now, base)
}

fn validated(event: Event) -> Event {
    event.validate().expect("valid event");
    event
}

// Consumers build events as struct-update literals over `Default`; every
// field has to be nameable from outside the crate.
#[test]
fn test_event_literal_builds_across_crate_boundary() {
    let base = Utc.with_ymd_and_hms(2012, 12, 21, 0, 0, 0).unwrap();
    let event = Event {
        name: "brew".to_string(),
        at: base,
        every: TimeDelta::minutes(10),
        count: Some(2),
        ..Default::default()
    };
    event.validate().expect("valid event");
    assert_eq!(event.terminal(), Some(base + TimeDelta::minutes(10)));
}

// =============================================================================
// Firing semantics
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_one_shot_delivers_matching_alarm() {
    let (now, base) = simulated_now();
    let clock = Clock::new(now);
    let mut sub = clock.subscribe();
    let handle = clock.run();

    let mut data = serde_json::Map::new();
    data.insert("zone".to_string(), json!("kitchen"));
    clock.reload(vec![validated(Event {
        name: "brew".to_string(),
        at: base + TimeDelta::seconds(3),
        data: data.clone(),
        ..Default::default()
    })]);

    let alarm = sub.recv().await.expect("one alarm");
    assert_eq!(alarm.event, "brew");
    assert_eq!(alarm.at, base + TimeDelta::seconds(3));
    assert_eq!(alarm.data, data);

    // Exactly once.
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(sub.try_recv().is_none());

    clock.interrupt();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_recurring_event_fires_at_exact_occurrences() {
    let (now, base) = simulated_now();
    let clock = Clock::new(Arc::clone(&now));
    let mut sub = clock.subscribe();
    let handle = clock.run();

    clock.reload(vec![validated(Event {
        name: "tick".to_string(),
        at: base + TimeDelta::seconds(1),
        every: TimeDelta::seconds(2),
        count: Some(3),
        ..Default::default()
    })]);

    for i in 0..3 {
        let alarm = sub.recv().await.expect("alarm");
        let expected = base + TimeDelta::seconds(1) + TimeDelta::seconds(2) * i;
        assert_eq!(alarm.at, expected);
        // Never early, measured against the injected clock.
        assert!(alarm.at <= now());
    }

    // Count exhausted; the event retired.
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(sub.try_recv().is_none());

    clock.interrupt();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_simultaneous_events_fire_in_insertion_order() {
    let (now, base) = simulated_now();
    let clock = Clock::new(now);
    let mut sub = clock.subscribe();
    let handle = clock.run();

    let due = base + TimeDelta::seconds(5);
    clock.reload(vec![
        validated(Event {
            name: "first".to_string(),
            at: due,
            ..Default::default()
        }),
        validated(Event {
            name: "second".to_string(),
            at: due,
            ..Default::default()
        }),
    ]);

    assert_eq!(sub.recv().await.unwrap().event, "first");
    assert_eq!(sub.recv().await.unwrap().event, "second");

    clock.interrupt();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_already_started_event_fires_at_future_occurrence_only() {
    let (now, base) = simulated_now();
    let clock = Clock::new(now);
    let mut sub = clock.subscribe();
    let handle = clock.run();

    // Started an hour "ago": only occurrences after the reload fire, and the
    // first is the next one on the original grid.
    clock.reload(vec![validated(Event {
        name: "grid".to_string(),
        at: base - TimeDelta::hours(1),
        every: TimeDelta::minutes(10),
        ..Default::default()
    })]);

    let alarm = sub.recv().await.unwrap();
    assert_eq!(alarm.at, base + TimeDelta::minutes(10));

    clock.interrupt();
    handle.await.unwrap();
}

// =============================================================================
// Reload semantics
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_reload_replaces_armed_event() {
    let (now, base) = simulated_now();
    let clock = Clock::new(now);
    let mut sub = clock.subscribe();
    let handle = clock.run();

    clock.reload(vec![validated(Event {
        name: "stale".to_string(),
        at: base + TimeDelta::seconds(5),
        ..Default::default()
    })]);

    // Let the loop arm the stale timer, then replace the set.
    tokio::time::sleep(Duration::from_secs(1)).await;
    clock.reload(vec![validated(Event {
        name: "fresh".to_string(),
        at: base + TimeDelta::seconds(10),
        ..Default::default()
    })]);

    // The stale event must never fire, even past its due time.
    let alarm = sub.recv().await.unwrap();
    assert_eq!(alarm.event, "fresh");
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(sub.try_recv().is_none());

    clock.interrupt();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_back_to_back_reloads_coalesce_to_latest() {
    let (now, base) = simulated_now();
    let clock = Clock::new(now);
    let mut sub = clock.subscribe();
    let handle = clock.run();

    // Submitted before the loop can consume either; only the latest set
    // survives the one-slot handoff.
    clock.reload(vec![validated(Event {
        name: "overwritten".to_string(),
        at: base + TimeDelta::seconds(1),
        ..Default::default()
    })]);
    clock.reload(vec![validated(Event {
        name: "kept".to_string(),
        at: base + TimeDelta::seconds(2),
        ..Default::default()
    })]);

    assert_eq!(sub.recv().await.unwrap().event, "kept");
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(sub.try_recv().is_none());

    clock.interrupt();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_reload_omits_finished_events() {
    let (now, base) = simulated_now();
    let clock = Clock::new(now);
    let mut sub = clock.subscribe();
    let handle = clock.run();

    // Terminal occurrence already in the past relative to the reload.
    clock.reload(vec![
        validated(Event {
            name: "finished".to_string(),
            at: base - TimeDelta::hours(2),
            every: TimeDelta::minutes(10),
            count: Some(2),
            ..Default::default()
        }),
        validated(Event {
            name: "live".to_string(),
            at: base + TimeDelta::seconds(3),
            ..Default::default()
        }),
    ]);

    assert_eq!(sub.recv().await.unwrap().event, "live");
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(sub.try_recv().is_none());

    clock.interrupt();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_empty_reload_transitions_to_idle() {
    let (now, base) = simulated_now();
    let clock = Clock::new(now);
    let mut sub = clock.subscribe();
    let handle = clock.run();

    clock.reload(vec![validated(Event {
        name: "doomed".to_string(),
        at: base + TimeDelta::seconds(5),
        ..Default::default()
    })]);
    tokio::time::sleep(Duration::from_secs(1)).await;
    clock.reload(Vec::new());

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(sub.try_recv().is_none());
    assert!(!handle.is_finished());

    clock.interrupt();
    handle.await.unwrap();
}

// =============================================================================
// Delivery and shutdown
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_saturated_subscriber_is_closed_until_resubscribe() {
    let (now, base) = simulated_now();
    let clock = Clock::with_config(now, ClockConfig {
        mailbox_capacity: 1,
    });
    let mut sub = clock.subscribe();
    let handle = clock.run();

    // Two firings with nobody draining: the second overflows the mailbox
    // and drops the subscription.
    clock.reload(vec![validated(Event {
        name: "flood".to_string(),
        at: base + TimeDelta::seconds(1),
        every: TimeDelta::seconds(1),
        count: Some(2),
        ..Default::default()
    })]);
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(sub.recv().await.unwrap().event, "flood");
    // Closed channel: the consumer can detect the forced drop.
    assert!(sub.recv().await.is_none());

    // Re-registering resumes delivery; alarms fired during the gap are lost.
    let mut sub = clock.subscribe();
    clock.reload(vec![validated(Event {
        name: "after".to_string(),
        at: base + TimeDelta::seconds(30),
        ..Default::default()
    })]);
    assert_eq!(sub.recv().await.unwrap().event, "after");

    clock.interrupt();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_interrupt_closes_all_mailboxes() {
    let (now, base) = simulated_now();
    let clock = Clock::new(now);
    let mut first = clock.subscribe();
    let mut second = clock.subscribe();
    let handle = clock.run();

    clock.reload(vec![validated(Event {
        name: "pending".to_string(),
        at: base + TimeDelta::hours(1),
        ..Default::default()
    })]);
    tokio::time::sleep(Duration::from_secs(1)).await;

    clock.interrupt();
    handle.await.unwrap();

    assert!(first.recv().await.is_none());
    assert!(second.recv().await.is_none());
}
