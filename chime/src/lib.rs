//! # Chime
//!
//! Chime computes recurring or one-shot timed events and delivers each
//! firing ("alarm") to interested consumers. An [`Event`] declares when
//! something should happen; a [`Clock`] runs a single scheduling loop that
//! fires each event at its computed occurrences and fans the alarms out to
//! bounded-mailbox [`Subscription`]s.
//!
//! # Core Concepts
//!
//! - **Pure recurrence arithmetic**: [`Event::current`] and [`Event::next`]
//!   are side-effect-free queries over a validated specification
//! - **Single loop, no shared queue**: one async task owns the schedule
//!   queue and the timer; reloads are a coalescing, non-blocking handoff
//! - **Injected time**: the clock reads time through a [`NowFn`] supplied at
//!   construction, so schedules are testable under simulated clocks
//! - **Bounded delivery**: a subscriber that stops draining its mailbox is
//!   dropped rather than allowed to stall the scheduler
//!
//! # Example
//!
//! ```no_run
//! use chime::{Clock, Event};
//! use chrono::{TimeDelta, Utc};
//!
//! # async fn demo() -> chime::Result<()> {
//! let event = Event {
//!     name: "pour-coffee".into(),
//!     at: Utc::now() + TimeDelta::seconds(3),
//!     every: TimeDelta::milliseconds(200),
//!     count: Some(10),
//!     ..Default::default()
//! };
//! event.validate()?;
//!
//! let clock = Clock::system();
//! let mut sub = clock.subscribe();
//! clock.run();
//! clock.reload(vec![event]);
//!
//! while let Some(alarm) = sub.recv().await {
//!     println!("run {} at {}", alarm.event, alarm.at);
//! }
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod error;
pub mod event;

pub use clock::{Alarm, Clock, ClockConfig, NowFn, Subscription};
pub use error::{Error, ErrorCode, Result};
pub use event::Event;
