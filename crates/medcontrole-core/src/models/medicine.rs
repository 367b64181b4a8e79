//! Medicine schedule model: dosing rule, course dates, and taken-dose history.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for medicine input.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Required field is empty: {0}")]
    EmptyField(&'static str),

    #[error("Invalid dose time (expected HH:MM): {0}")]
    BadTime(String),

    #[error("Duration must be at least 1 day, got {0}")]
    BadDuration(u32),

    #[error("Specific-days schedule needs at least one weekday")]
    EmptyDays,

    #[error("Weekday out of range (0=Sunday..6=Saturday): {0}")]
    BadWeekday(u8),

    #[error("Custom interval must be at least 1 hour, got {0}")]
    BadInterval(u32),

    #[error("Duplicate medicine id: {0}")]
    DuplicateId(String),
}

/// Dosing frequency rule.
///
/// Serializes with the `frequencyType` discriminant and sibling parameter
/// fields, matching the persisted record shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "frequencyType")]
pub enum Frequency {
    /// One dose per calendar day at the anchor time.
    #[serde(rename = "daily")]
    Daily,
    /// One dose on each listed weekday (0=Sunday..6=Saturday).
    #[serde(rename = "specific-days")]
    SpecificDays {
        #[serde(rename = "specificDays")]
        days: Vec<u8>,
    },
    /// One dose every 7 days from the start-date anchor.
    #[serde(rename = "weekly")]
    Weekly,
    /// One dose every `interval_hours` hours from the start-date anchor.
    #[serde(rename = "custom")]
    Custom {
        #[serde(rename = "customInterval")]
        interval_hours: u32,
    },
}

impl Frequency {
    /// Validate rule parameters.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Frequency::Daily | Frequency::Weekly => Ok(()),
            Frequency::SpecificDays { days } => {
                if days.is_empty() {
                    return Err(ValidationError::EmptyDays);
                }
                if let Some(&bad) = days.iter().find(|&&d| d > 6) {
                    return Err(ValidationError::BadWeekday(bad));
                }
                Ok(())
            }
            Frequency::Custom { interval_hours } => {
                if *interval_hours < 1 {
                    return Err(ValidationError::BadInterval(*interval_hours));
                }
                Ok(())
            }
        }
    }
}

/// A single taken-dose record. Append-only; cleared only with the medicine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoseRecord {
    /// Instant the dose was recorded (naive local time).
    pub taken_at: NaiveDateTime,
}

/// A registered medicine: dosing schedule plus taken-dose history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medicine {
    /// Unique id, assigned at creation, immutable.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Display dosage (e.g. "500mg").
    pub dosage: String,
    /// Dosing frequency rule.
    #[serde(flatten)]
    pub frequency: Frequency,
    /// Anchor time-of-day for daily/specific-days/weekly schedules.
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    /// Calendar date the course begins.
    pub start_date: NaiveDate,
    /// Course length in calendar days.
    pub duration_days: u32,
    /// Taken-dose history in recording order.
    #[serde(default)]
    pub doses_taken: Vec<DoseRecord>,
    /// Creation instant, set once.
    pub created_at: NaiveDateTime,
}

/// Input for creating or editing a medicine. Carries everything except the
/// fields the system assigns (`id`, `created_at`) or preserves
/// (`doses_taken`).
#[derive(Debug, Clone, PartialEq)]
pub struct NewMedicine {
    pub name: String,
    pub dosage: String,
    pub frequency: Frequency,
    /// Anchor time as "HH:MM".
    pub time: String,
    pub start_date: NaiveDate,
    pub duration_days: u32,
}

impl Medicine {
    /// Create a new medicine from validated input, assigning id and
    /// creation timestamp.
    pub fn new(input: NewMedicine, created_at: NaiveDateTime) -> Result<Self, ValidationError> {
        let mut medicine = Medicine {
            id: uuid::Uuid::new_v4().to_string(),
            name: String::new(),
            dosage: String::new(),
            frequency: Frequency::Daily,
            time: NaiveTime::MIN,
            start_date: input.start_date,
            duration_days: 1,
            doses_taken: Vec::new(),
            created_at,
        };
        medicine.apply_edit(input)?;
        Ok(medicine)
    }

    /// Replace all fields except `id`, `created_at`, and `doses_taken`.
    pub fn apply_edit(&mut self, input: NewMedicine) -> Result<(), ValidationError> {
        if input.name.trim().is_empty() {
            return Err(ValidationError::EmptyField("name"));
        }
        if input.dosage.trim().is_empty() {
            return Err(ValidationError::EmptyField("dosage"));
        }
        if input.duration_days < 1 {
            return Err(ValidationError::BadDuration(input.duration_days));
        }
        input.frequency.validate()?;

        self.name = input.name;
        self.dosage = input.dosage;
        self.frequency = normalized(input.frequency);
        self.time = parse_dose_time(&input.time)?;
        self.start_date = input.start_date;
        self.duration_days = input.duration_days;
        Ok(())
    }

    /// Validate an already-built medicine (used on import).
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyField("id"));
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyField("name"));
        }
        if self.dosage.trim().is_empty() {
            return Err(ValidationError::EmptyField("dosage"));
        }
        if self.duration_days < 1 {
            return Err(ValidationError::BadDuration(self.duration_days));
        }
        self.frequency.validate()
    }

    /// Append a taken-dose record.
    pub fn record_dose(&mut self, taken_at: NaiveDateTime) {
        self.doses_taken.push(DoseRecord { taken_at });
    }
}

/// Sort and dedupe specific-days weekday lists so equality and storage are
/// order-independent.
fn normalized(frequency: Frequency) -> Frequency {
    match frequency {
        Frequency::SpecificDays { mut days } => {
            days.sort_unstable();
            days.dedup();
            Frequency::SpecificDays { days }
        }
        other => other,
    }
}

/// Parse an anchor dose time in "HH:MM" form.
pub fn parse_dose_time(s: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| ValidationError::BadTime(s.to_string()))
}

/// Serde helpers for "HH:MM" anchor times.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, "%H:%M").map_err(serde::de::Error::custom)
    }
}
