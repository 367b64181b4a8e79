//! Occurrence expander: lazy sequence of scheduled-dose instants over a
//! course of treatment.

use chrono::{Datelike, Duration, NaiveDateTime};

use super::end_date;
use crate::models::{Frequency, Medicine};

/// Expand a medicine's schedule into its full, finite sequence of
/// scheduled-dose instants, covering `[start_date, end_date)`.
///
/// The sequence is a pure function of the medicine: iterating twice yields
/// identical instants.
///
/// - daily: one instant per day at the anchor time.
/// - specific-days: days whose weekday is listed, at the anchor time.
/// - weekly: a fixed 7-day stride from the start anchor,
///   `ceil(duration_days / 7)` occurrences.
/// - custom: every `interval_hours` hours from the start anchor, while the
///   instant still falls on an in-course date.
pub fn occurrences(medicine: &Medicine) -> Occurrences<'_> {
    Occurrences {
        medicine,
        cursor: 0,
    }
}

/// Occurrences strictly after `now`. Past instants are skipped, never
/// backfilled.
pub fn future_occurrences(
    medicine: &Medicine,
    now: NaiveDateTime,
) -> impl Iterator<Item = NaiveDateTime> + '_ {
    occurrences(medicine).filter(move |instant| *instant > now)
}

/// Lazy iterator over a medicine's scheduled-dose instants.
pub struct Occurrences<'a> {
    medicine: &'a Medicine,
    cursor: u32,
}

impl Occurrences<'_> {
    fn anchor(&self) -> NaiveDateTime {
        self.medicine.start_date.and_time(self.medicine.time)
    }
}

impl Iterator for Occurrences<'_> {
    type Item = NaiveDateTime;

    fn next(&mut self) -> Option<NaiveDateTime> {
        let medicine = self.medicine;
        match &medicine.frequency {
            Frequency::Daily | Frequency::SpecificDays { .. } => loop {
                if self.cursor >= medicine.duration_days {
                    return None;
                }
                let day = medicine.start_date + Duration::days(i64::from(self.cursor));
                self.cursor += 1;
                let matches = match &medicine.frequency {
                    Frequency::SpecificDays { days } => {
                        days.contains(&(day.weekday().num_days_from_sunday() as u8))
                    }
                    _ => true,
                };
                if matches {
                    return Some(day.and_time(medicine.time));
                }
            },
            Frequency::Weekly => {
                let weeks = medicine.duration_days.div_ceil(7);
                if self.cursor >= weeks {
                    return None;
                }
                let instant = self.anchor() + Duration::days(7 * i64::from(self.cursor));
                self.cursor += 1;
                Some(instant)
            }
            Frequency::Custom { interval_hours } => {
                let offset = i64::from(*interval_hours) * i64::from(self.cursor);
                let instant = self.anchor() + Duration::hours(offset);
                if instant.date() >= end_date(medicine) {
                    return None;
                }
                self.cursor += 1;
                Some(instant)
            }
        }
    }
}
