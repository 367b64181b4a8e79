//! Temporal calculator: next-due instants, taken-today checks, course dates.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::models::{Frequency, Medicine};

/// Course end date: `start_date + duration_days` calendar days.
pub fn end_date(medicine: &Medicine) -> NaiveDate {
    medicine.start_date + Duration::days(i64::from(medicine.duration_days))
}

/// Next due instant relative to `now`: today at the anchor time, rolled to
/// tomorrow when that instant is already strictly past.
///
/// Deliberately frequency-agnostic; it is a same-day/next-day rollover rule,
/// not an occurrence lookup.
pub fn next_due_instant(medicine: &Medicine, now: NaiveDateTime) -> NaiveDateTime {
    let today_anchor = now.date().and_time(medicine.time);
    if today_anchor < now {
        today_anchor + Duration::days(1)
    } else {
        today_anchor
    }
}

/// Whether any dose record falls on the given calendar day. Date-only
/// comparison; "today" resets at local midnight, not 24h after a dose.
pub fn is_dose_taken_on(medicine: &Medicine, day: NaiveDate) -> bool {
    medicine
        .doses_taken
        .iter()
        .any(|dose| dose.taken_at.date() == day)
}

/// Whether the frequency rule schedules a dose on the given day.
///
/// False outside the course range `[start_date, end_date)`. Custom
/// (hourly-interval) schedules count every in-course day as scheduled.
pub fn is_scheduled_on(medicine: &Medicine, day: NaiveDate) -> bool {
    if day < medicine.start_date || day >= end_date(medicine) {
        return false;
    }
    match &medicine.frequency {
        Frequency::Daily | Frequency::Custom { .. } => true,
        Frequency::SpecificDays { days } => {
            days.contains(&(day.weekday().num_days_from_sunday() as u8))
        }
        Frequency::Weekly => (day - medicine.start_date).num_days() % 7 == 0,
    }
}

/// Whether the course covers the given day on the dashboard sense
/// (inclusive of the end date).
pub fn is_in_course_on(medicine: &Medicine, day: NaiveDate) -> bool {
    day >= medicine.start_date && day <= end_date(medicine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewMedicine;
    use chrono::NaiveTime;

    fn make_medicine(frequency: Frequency) -> Medicine {
        let input = NewMedicine {
            name: "Amoxicillin".into(),
            dosage: "500mg".into(),
            frequency,
            time: "08:00".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            duration_days: 10,
        };
        let created = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Medicine::new(input, created).unwrap()
    }

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_end_date() {
        let medicine = make_medicine(Frequency::Daily);
        assert_eq!(
            end_date(&medicine),
            NaiveDate::from_ymd_opt(2024, 1, 11).unwrap()
        );
    }

    #[test]
    fn test_next_due_same_day_before_anchor() {
        let medicine = make_medicine(Frequency::Daily);
        assert_eq!(next_due_instant(&medicine, at(5, 7, 30)), at(5, 8, 0));
    }

    #[test]
    fn test_next_due_rolls_to_tomorrow_after_anchor() {
        let medicine = make_medicine(Frequency::Daily);
        assert_eq!(next_due_instant(&medicine, at(5, 8, 30)), at(6, 8, 0));
    }

    #[test]
    fn test_next_due_exactly_at_anchor_is_today() {
        let medicine = make_medicine(Frequency::Daily);
        assert_eq!(next_due_instant(&medicine, at(5, 8, 0)), at(5, 8, 0));
    }

    #[test]
    fn test_dose_taken_on_is_calendar_day_only() {
        let mut medicine = make_medicine(Frequency::Daily);
        medicine.record_dose(at(5, 23, 50));

        assert!(is_dose_taken_on(
            &medicine,
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        ));
        // Ten minutes later is a new calendar day, regardless of the 24h gap.
        assert!(!is_dose_taken_on(
            &medicine,
            NaiveDate::from_ymd_opt(2024, 1, 6).unwrap()
        ));
    }

    #[test]
    fn test_scheduled_on_respects_course_range() {
        let medicine = make_medicine(Frequency::Daily);
        assert!(!is_scheduled_on(
            &medicine,
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()
        ));
        assert!(is_scheduled_on(
            &medicine,
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
        ));
        // End date itself is outside the dosing range.
        assert!(!is_scheduled_on(
            &medicine,
            NaiveDate::from_ymd_opt(2024, 1, 11).unwrap()
        ));
    }

    #[test]
    fn test_scheduled_on_specific_days() {
        // 2024-01-01 is a Monday (weekday 1).
        let medicine = make_medicine(Frequency::SpecificDays { days: vec![1, 3] });
        assert!(is_scheduled_on(
            &medicine,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        ));
        assert!(!is_scheduled_on(
            &medicine,
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        ));
        assert!(is_scheduled_on(
            &medicine,
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()
        ));
    }

    #[test]
    fn test_scheduled_on_weekly_stride() {
        let medicine = make_medicine(Frequency::Weekly);
        assert!(is_scheduled_on(
            &medicine,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        ));
        assert!(!is_scheduled_on(
            &medicine,
            NaiveDate::from_ymd_opt(2024, 1, 4).unwrap()
        ));
        assert!(is_scheduled_on(
            &medicine,
            NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()
        ));
    }

    #[test]
    fn test_in_course_includes_end_date() {
        let medicine = make_medicine(Frequency::Daily);
        assert!(is_in_course_on(
            &medicine,
            NaiveDate::from_ymd_opt(2024, 1, 11).unwrap()
        ));
        assert!(!is_in_course_on(
            &medicine,
            NaiveDate::from_ymd_opt(2024, 1, 12).unwrap()
        ));
    }

    #[test]
    fn test_anchor_time_comes_from_medicine() {
        let mut medicine = make_medicine(Frequency::Daily);
        medicine.time = NaiveTime::from_hms_opt(22, 15, 0).unwrap();
        assert_eq!(next_due_instant(&medicine, at(5, 9, 0)), at(5, 22, 15));
    }
}
