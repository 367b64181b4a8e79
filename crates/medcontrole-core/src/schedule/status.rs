//! Status classifier: derives the display status from temporal facts.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{is_dose_taken_on, is_scheduled_on};
use crate::models::Medicine;

/// Mutually exclusive medicine status for a given reference instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MedicineStatus {
    /// No dose due yet (or today is not a scheduled day).
    Active,
    /// Today's anchor instant has passed on a scheduled day and no dose was
    /// recorded today.
    Overdue,
    /// A dose was recorded today.
    Completed,
}

/// Classify a medicine against `now`. Pure total function; exactly one
/// status holds for any `(medicine, now)`.
///
/// Overdue requires today to actually be a scheduled, in-course day; a
/// specific-days or weekly medicine is never overdue on its off days.
pub fn status_at(medicine: &Medicine, now: NaiveDateTime) -> MedicineStatus {
    let today = now.date();
    if is_dose_taken_on(medicine, today) {
        return MedicineStatus::Completed;
    }
    let anchor = today.and_time(medicine.time);
    if anchor < now && is_scheduled_on(medicine, today) {
        return MedicineStatus::Overdue;
    }
    MedicineStatus::Active
}
