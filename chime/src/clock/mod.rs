//! The scheduling engine
//!
//! A [`Clock`] runs a single async loop that owns a timestamp-ordered queue
//! of pending events and one timer. Three signals drive it:
//! - **Reload:** replace the entire tracked event set (coalescing handoff)
//! - **Timer expiry:** fire the due event, reschedule or retire it
//! - **Cancellation:** close every subscriber mailbox and exit
//!
//! Fired alarms fan out to [`Subscription`] mailboxes with a
//! drop-on-saturation backpressure policy.

mod alarm;
mod config;
mod core;
mod queue;
mod reload;
mod subscription;

pub use self::alarm::Alarm;
pub use self::config::ClockConfig;
pub use self::core::{Clock, NowFn};
pub use self::subscription::Subscription;
