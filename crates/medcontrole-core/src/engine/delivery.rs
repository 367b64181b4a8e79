//! Delivery port: the platform capability that presents reminders.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Notification permission state reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
    /// Not yet asked.
    Default,
}

/// User action carried back from a delivered reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderAction {
    /// Dose taken; record it.
    Taken,
    /// Remind again in 15 minutes.
    Snooze,
}

/// Action event delivered asynchronously to the engine's handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEvent {
    pub tag: String,
    pub action: ReminderAction,
}

/// One pending reminder handed to the delivery port.
#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    /// Unique key; scheduling the same tag twice overwrites, never duplicates.
    pub tag: String,
    pub medicine_id: String,
    pub fire_at: NaiveDateTime,
    pub title: String,
    pub body: String,
    pub actions: Vec<ReminderAction>,
}

/// Platform notification capability consumed by the engine.
///
/// `schedule` is fire-and-forget: the port owns deferred firing and must not
/// block. Cancellation latency on the platform side is unbounded; the
/// engine's own bookkeeping is the source of truth.
pub trait DeliveryPort {
    fn request_permission(&mut self) -> Permission;

    /// Register a pending reminder. Idempotent per tag.
    fn schedule(&mut self, reminder: Reminder);

    /// Cancel a pending reminder by tag. Unknown tags are ignored.
    fn cancel(&mut self, tag: &str);
}

/// Build the reminder tag for a medicine occurrence: `medicine-{id}-{millis}`.
pub fn reminder_tag(medicine_id: &str, fire_at: NaiveDateTime) -> String {
    format!(
        "medicine-{}-{}",
        medicine_id,
        fire_at.and_utc().timestamp_millis()
    )
}

/// Tag for a one-off snoozed reminder, kept distinct from schedule tags.
pub fn snooze_tag(medicine_id: &str, fire_at: NaiveDateTime) -> String {
    format!(
        "snooze-{}-{}",
        medicine_id,
        fire_at.and_utc().timestamp_millis()
    )
}

/// Recover the medicine id from a reminder or snooze tag.
///
/// Splits on the trailing millis component, so ids containing `-` (UUIDs)
/// round-trip.
pub fn medicine_id_from_tag(tag: &str) -> Option<&str> {
    let rest = tag
        .strip_prefix("medicine-")
        .or_else(|| tag.strip_prefix("snooze-"))?;
    let (id, millis) = rest.rsplit_once('-')?;
    if id.is_empty() || millis.parse::<i64>().is_err() {
        return None;
    }
    Some(id)
}
