//! Declarative recurrence model
//!
//! An [`Event`] describes when something should happen: a start time, an
//! optional fixed repeat interval, and an optional end bound (a deadline or
//! an occurrence count). All queries are pure arithmetic over the validated
//! specification; the scheduler never mutates an event's declared fields.

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// A declarative recurrence specification.
///
/// Call [`Event::validate`] before handing the event to a clock: it checks
/// the field invariants that [`Event::current`] and [`Event::next`] rely on.
/// The queries themselves are derived from the fields alone, so mutating an
/// event and re-validating is always safe.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Identifier carried on every alarm fired for this event.
    pub name: String,

    /// First occurrence.
    pub at: DateTime<Utc>,

    /// Interval between occurrences; zero means a single occurrence.
    pub every: TimeDelta,

    /// Optional end bound. The last occurrence is at or before this time.
    /// Mutually exclusive with `count` when `every` is positive.
    pub until: Option<DateTime<Utc>>,

    /// Optional total number of occurrences.
    pub count: Option<u32>,

    /// Opaque payload copied onto every alarm.
    pub data: Map<String, Value>,
}

impl Default for Event {
    fn default() -> Self {
        Self {
            name: String::new(),
            at: DateTime::UNIX_EPOCH,
            every: TimeDelta::zero(),
            until: None,
            count: None,
            data: Map::new(),
        }
    }
}

impl Event {
    /// Check the field invariants.
    ///
    /// Fails with [`Error::Invalid`] when the period is negative, when both
    /// end bounds are set on a recurring event, when the deadline is not
    /// strictly after the start, or when the occurrence count is zero.
    pub fn validate(&self) -> Result<()> {
        if self.every < TimeDelta::zero() {
            return Err(Error::invalid("every must be non-negative"));
        }
        if self.every > TimeDelta::zero() && self.until.is_some() && self.count.is_some() {
            return Err(Error::invalid("until and count are mutually exclusive"));
        }
        if let Some(until) = self.until
            && until <= self.at
        {
            return Err(Error::invalid("until must happen after at"));
        }
        if self.count == Some(0) {
            return Err(Error::invalid("count must be positive"));
        }

        Ok(())
    }

    /// The terminal occurrence, if the event has a defined end.
    pub fn terminal(&self) -> Option<DateTime<Utc>> {
        if self.every.is_zero() {
            Some(self.at)
        } else if let Some(until) = self.until {
            Some(self.occurrence(self.index(until)))
        } else if let Some(count) = self.count {
            Some(self.occurrence(i64::from(count) - 1))
        } else {
            // Unbounded: the event never terminates.
            None
        }
    }

    /// The latest occurrence at or before `from`.
    ///
    /// Returns `None` when the event has not started yet. Once `from`
    /// reaches the terminal occurrence the event is finished, but its last
    /// instance is still reported as current.
    pub fn current(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if from < self.at {
            return None;
        }
        if let Some(last) = self.terminal()
            && from >= last
        {
            return Some(last);
        }
        Some(self.occurrence(self.index(from)))
    }

    /// The occurrence strictly after the one containing `from`.
    ///
    /// Returns the start time when the event has not started yet, and `None`
    /// once `from` reaches the terminal occurrence.
    pub fn next(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if from < self.at {
            return Some(self.at);
        }
        if let Some(last) = self.terminal()
            && from >= last
        {
            return None;
        }
        Some(self.occurrence(self.index(from) + 1))
    }

    /// Zero-based ordinal of the occurrence containing `from`, by truncating
    /// division. Call sites guarantee `from >= self.at`. A non-positive
    /// period only reaches here on an unvalidated event; it is treated as a
    /// single occurrence so the damage stays confined to this event.
    fn index(&self, from: DateTime<Utc>) -> i64 {
        let step = self.every.num_nanoseconds().unwrap_or(i64::MAX);
        if step <= 0 {
            return 0;
        }
        let span = (from - self.at).num_nanoseconds().unwrap_or(i64::MAX);
        span / step
    }

    /// Timestamp of the `index`-th occurrence.
    fn occurrence(&self, index: i64) -> DateTime<Utc> {
        let step = self.every.num_nanoseconds().unwrap_or(i64::MAX);
        self.at + TimeDelta::nanoseconds(step.saturating_mul(index))
    }
}
