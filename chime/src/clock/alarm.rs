//! Alarm value object

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One realized firing of an event.
///
/// Produced at delivery time and handed to every live subscriber; never
/// retained by the clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    /// Name of the event that fired.
    pub event: String,

    /// Scheduled fire time. This is the computed occurrence timestamp, not
    /// the wall time the loop woke at, so recurrence chains do not compound
    /// timer drift.
    pub at: DateTime<Utc>,

    /// Payload copied from the event.
    pub data: Map<String, Value>,
}
