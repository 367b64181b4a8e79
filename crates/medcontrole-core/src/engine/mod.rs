//! Scheduling engine: arms reminders from expanded occurrences and reacts
//! to dose/edit/delete events.
//!
//! The engine owns no timers. Arming is derived state: hosts call
//! [`ReminderEngine::arm_all`] on startup and the engine replays the
//! occurrence expander filtered to the future, handing each instant to the
//! [`DeliveryPort`] as an independent deferred unit.

mod delivery;

pub use delivery::*;

use std::collections::{BTreeSet, HashMap};

use chrono::{Duration, NaiveDateTime};
use log::{debug, info};
use serde::Serialize;
use thiserror::Error;

use crate::db::{DbError, MedicineStore};
use crate::export;
use crate::models::{Medicine, NewMedicine, ValidationError};
use crate::schedule::{
    future_occurrences, is_in_course_on, next_due_instant, status_at, MedicineStatus,
};

/// Engine errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(DbError),

    #[error("Medicine not found: {0}")]
    NotFound(String),

    #[error("Unrecognized reminder tag: {0}")]
    UnknownTag(String),

    #[error("Import failed: {0}")]
    Import(#[from] export::ExportError),
}

impl From<DbError> for EngineError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(id) => EngineError::NotFound(id),
            other => EngineError::Storage(other),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Result of an arming pass.
///
/// `Unavailable` (permission missing) is a degraded mode, distinct from a
/// granted pass that found nothing left to arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmOutcome {
    Armed { reminders: usize },
    Unavailable,
}

/// Dashboard counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    /// Registered medicines.
    pub total_medicines: usize,
    /// Medicines whose course covers today.
    pub today_doses: usize,
    /// Medicines currently overdue.
    pub pending_doses: usize,
}

/// One entry of the "next doses" listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpcomingDose {
    pub medicine_id: String,
    pub name: String,
    pub due_at: NaiveDateTime,
}

/// Orchestrates storage, pure scheduling, and the delivery port.
pub struct ReminderEngine<S: MedicineStore, D: DeliveryPort> {
    store: S,
    delivery: D,
    permission: Permission,
    /// Armed tags per medicine id. Dropped immediately on cancellation,
    /// regardless of delivery-side latency.
    armed: HashMap<String, BTreeSet<String>>,
}

impl<S: MedicineStore, D: DeliveryPort> ReminderEngine<S, D> {
    pub fn new(store: S, delivery: D) -> Self {
        Self {
            store,
            delivery,
            permission: Permission::Default,
            armed: HashMap::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn delivery(&self) -> &D {
        &self.delivery
    }

    pub fn delivery_mut(&mut self) -> &mut D {
        &mut self.delivery
    }

    /// Tags currently armed for a medicine (engine bookkeeping).
    pub fn armed_tags(&self, medicine_id: &str) -> Vec<String> {
        self.armed
            .get(medicine_id)
            .map(|tags| tags.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Arm reminders for every future occurrence of every medicine.
    ///
    /// Idempotent: re-running with the same inputs produces the same tag set
    /// (same-tag scheduling overwrites at the port). Without permission this
    /// is a no-op and state computation elsewhere is unaffected.
    pub fn arm_all(&mut self, now: NaiveDateTime) -> EngineResult<ArmOutcome> {
        self.permission = self.delivery.request_permission();
        if self.permission != Permission::Granted {
            info!("notification permission not granted; reminders disabled");
            return Ok(ArmOutcome::Unavailable);
        }

        let medicines = self.store.list_medicines()?;
        let mut reminders = 0;
        for medicine in &medicines {
            reminders += self.arm_medicine(medicine, now);
        }
        info!(
            "armed {} reminders across {} medicines",
            reminders,
            medicines.len()
        );
        Ok(ArmOutcome::Armed { reminders })
    }

    /// Register a new medicine and arm its future reminders.
    pub fn add_medicine(
        &mut self,
        input: NewMedicine,
        now: NaiveDateTime,
    ) -> EngineResult<Medicine> {
        let medicine = Medicine::new(input, now)?;
        self.store.upsert_medicine(&medicine)?;
        if self.permission == Permission::Granted {
            self.arm_medicine(&medicine, now);
        }
        info!("registered medicine {} ({})", medicine.name, medicine.id);
        Ok(medicine)
    }

    /// Replace a medicine's schedule, cancel its old reminders, and re-arm
    /// from scratch. Identity, creation time, and dose history are kept.
    pub fn edit_medicine(
        &mut self,
        id: &str,
        input: NewMedicine,
        now: NaiveDateTime,
    ) -> EngineResult<Medicine> {
        let mut medicine = self
            .store
            .get_medicine(id)?
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        medicine.apply_edit(input)?;
        self.store.upsert_medicine(&medicine)?;

        self.cancel_armed(id);
        if self.permission == Permission::Granted {
            self.arm_medicine(&medicine, now);
        }
        Ok(medicine)
    }

    /// Record a taken dose. Already-armed reminders for other days stay put.
    pub fn take_dose(&mut self, id: &str, now: NaiveDateTime) -> EngineResult<()> {
        self.store.append_dose(id, now)?;
        debug!("dose recorded for {} at {}", id, now);
        Ok(())
    }

    /// Delete a medicine and cancel all of its pending reminders.
    pub fn delete_medicine(&mut self, id: &str) -> EngineResult<()> {
        if !self.store.delete_medicine(id)? {
            return Err(EngineError::NotFound(id.to_string()));
        }
        self.cancel_armed(id);
        info!("deleted medicine {}", id);
        Ok(())
    }

    /// Handle a user action coming back from a delivered reminder.
    ///
    /// `Taken` records a dose at the delivery instant. `Snooze` arms a single
    /// one-off reminder 15 minutes out; it is never persisted as part of the
    /// schedule.
    pub fn handle_action(&mut self, event: ActionEvent, now: NaiveDateTime) -> EngineResult<()> {
        let id = medicine_id_from_tag(&event.tag)
            .ok_or_else(|| EngineError::UnknownTag(event.tag.clone()))?
            .to_string();

        match event.action {
            ReminderAction::Taken => self.take_dose(&id, now),
            ReminderAction::Snooze => {
                let medicine = self
                    .store
                    .get_medicine(&id)?
                    .ok_or_else(|| EngineError::NotFound(id.clone()))?;
                let fire_at = now + Duration::minutes(15);
                let tag = snooze_tag(&id, fire_at);
                self.delivery.schedule(Reminder {
                    tag: tag.clone(),
                    medicine_id: id.clone(),
                    fire_at,
                    title: reminder_title(&medicine),
                    body: reminder_body(&medicine),
                    actions: vec![ReminderAction::Taken, ReminderAction::Snooze],
                });
                self.armed.entry(id).or_default().insert(tag);
                Ok(())
            }
        }
    }

    /// Dashboard counters for a reference instant.
    pub fn dashboard(&self, now: NaiveDateTime) -> EngineResult<Dashboard> {
        let medicines = self.store.list_medicines()?;
        let today = now.date();
        Ok(Dashboard {
            total_medicines: medicines.len(),
            today_doses: medicines
                .iter()
                .filter(|m| is_in_course_on(m, today))
                .count(),
            pending_doses: medicines
                .iter()
                .filter(|m| status_at(m, now) == MedicineStatus::Overdue)
                .count(),
        })
    }

    /// The next due instants across all medicines, soonest first.
    pub fn upcoming_doses(
        &self,
        now: NaiveDateTime,
        limit: usize,
    ) -> EngineResult<Vec<UpcomingDose>> {
        let mut upcoming: Vec<UpcomingDose> = self
            .store
            .list_medicines()?
            .into_iter()
            .map(|m| UpcomingDose {
                due_at: next_due_instant(&m, now),
                medicine_id: m.id,
                name: m.name,
            })
            .filter(|dose| dose.due_at > now)
            .collect();
        upcoming.sort_by_key(|dose| dose.due_at);
        upcoming.truncate(limit);
        Ok(upcoming)
    }

    /// Export the whole collection as pretty-printed JSON.
    pub fn export_json(&self) -> EngineResult<String> {
        Ok(export::export_medicines(&self.store)?)
    }

    /// Replace the whole collection from a JSON payload and re-arm.
    ///
    /// A malformed or invalid payload aborts before any storage change and
    /// leaves armed reminders untouched.
    pub fn import_json(&mut self, payload: &str, now: NaiveDateTime) -> EngineResult<usize> {
        let count = export::import_medicines(&mut self.store, payload)?;

        let ids: Vec<String> = self.armed.keys().cloned().collect();
        for id in ids {
            self.cancel_armed(&id);
        }
        if self.permission == Permission::Granted {
            let medicines = self.store.list_medicines()?;
            for medicine in &medicines {
                self.arm_medicine(medicine, now);
            }
        }
        info!("imported {} medicines", count);
        Ok(count)
    }

    /// Arm one reminder per future occurrence of a medicine.
    fn arm_medicine(&mut self, medicine: &Medicine, now: NaiveDateTime) -> usize {
        let instants: Vec<NaiveDateTime> = future_occurrences(medicine, now).collect();
        let tags = self.armed.entry(medicine.id.clone()).or_default();
        for fire_at in &instants {
            let tag = reminder_tag(&medicine.id, *fire_at);
            self.delivery.schedule(Reminder {
                tag: tag.clone(),
                medicine_id: medicine.id.clone(),
                fire_at: *fire_at,
                title: reminder_title(medicine),
                body: reminder_body(medicine),
                actions: vec![ReminderAction::Taken, ReminderAction::Snooze],
            });
            tags.insert(tag);
        }
        debug!("armed {} reminders for {}", instants.len(), medicine.id);
        instants.len()
    }

    /// Drop bookkeeping and request port-side cancellation for a medicine.
    fn cancel_armed(&mut self, medicine_id: &str) {
        if let Some(tags) = self.armed.remove(medicine_id) {
            for tag in &tags {
                self.delivery.cancel(tag);
            }
            debug!("cancelled {} reminders for {}", tags.len(), medicine_id);
        }
    }
}

fn reminder_title(medicine: &Medicine) -> String {
    format!("Hora de tomar {}", medicine.name)
}

fn reminder_body(medicine: &Medicine) -> String {
    format!("Dosagem: {}", medicine.dosage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::Frequency;
    use chrono::NaiveDate;

    /// Recording delivery double.
    #[derive(Default)]
    struct RecordingDelivery {
        permission: Option<Permission>,
        scheduled: Vec<Reminder>,
        cancelled: Vec<String>,
    }

    impl DeliveryPort for RecordingDelivery {
        fn request_permission(&mut self) -> Permission {
            self.permission.unwrap_or(Permission::Granted)
        }

        fn schedule(&mut self, reminder: Reminder) {
            // Idempotent per tag: same tag overwrites.
            self.scheduled.retain(|r| r.tag != reminder.tag);
            self.scheduled.push(reminder);
        }

        fn cancel(&mut self, tag: &str) {
            self.scheduled.retain(|r| r.tag != tag);
            self.cancelled.push(tag.to_string());
        }
    }

    fn make_engine() -> ReminderEngine<Database, RecordingDelivery> {
        ReminderEngine::new(
            Database::open_in_memory().unwrap(),
            RecordingDelivery::default(),
        )
    }

    fn make_input() -> NewMedicine {
        NewMedicine {
            name: "Amoxicillin".into(),
            dosage: "500mg".into(),
            frequency: Frequency::Daily,
            time: "08:00".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            duration_days: 7,
        }
    }

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_arm_all_without_permission_is_unavailable() {
        let mut engine = make_engine();
        engine.delivery.permission = Some(Permission::Denied);
        engine.add_medicine(make_input(), at(1, 6, 0)).unwrap();

        let outcome = engine.arm_all(at(1, 6, 0)).unwrap();
        assert_eq!(outcome, ArmOutcome::Unavailable);
        assert!(engine.delivery.scheduled.is_empty());

        // Status computation keeps working in the degraded mode.
        let dashboard = engine.dashboard(at(1, 9, 0)).unwrap();
        assert_eq!(dashboard.pending_doses, 1);
    }

    #[test]
    fn test_arm_all_distinguishes_zero_occurrences() {
        let mut engine = make_engine();
        engine.add_medicine(make_input(), at(1, 6, 0)).unwrap();

        // Course fully in the past: granted, but nothing to arm.
        let outcome = engine.arm_all(at(31, 0, 0)).unwrap();
        assert_eq!(outcome, ArmOutcome::Armed { reminders: 0 });
    }

    #[test]
    fn test_take_dose_unknown_id() {
        let mut engine = make_engine();
        let result = engine.take_dose("no-such-id", at(1, 8, 0));
        assert!(matches!(result, Err(EngineError::NotFound(_))));
    }

    #[test]
    fn test_edit_cancels_and_rearms() {
        let mut engine = make_engine();
        engine.arm_all(at(1, 6, 0)).unwrap();
        let medicine = engine.add_medicine(make_input(), at(1, 6, 0)).unwrap();
        assert_eq!(engine.delivery.scheduled.len(), 7);

        let mut input = make_input();
        input.duration_days = 2;
        engine.edit_medicine(&medicine.id, input, at(1, 6, 0)).unwrap();

        assert_eq!(engine.delivery.scheduled.len(), 2);
        assert_eq!(engine.armed_tags(&medicine.id).len(), 2);
    }

    #[test]
    fn test_snooze_schedules_one_off() {
        let mut engine = make_engine();
        engine.arm_all(at(1, 6, 0)).unwrap();
        let medicine = engine.add_medicine(make_input(), at(1, 6, 0)).unwrap();
        let tag = reminder_tag(&medicine.id, at(1, 8, 0));

        engine
            .handle_action(
                ActionEvent {
                    tag,
                    action: ReminderAction::Snooze,
                },
                at(1, 8, 0),
            )
            .unwrap();

        let snoozed = engine
            .delivery
            .scheduled
            .iter()
            .find(|r| r.tag.starts_with("snooze-"))
            .expect("snooze reminder armed");
        assert_eq!(snoozed.fire_at, at(1, 8, 15));
        // Not persisted into the schedule.
        let stored = engine.store().get_medicine(&medicine.id).unwrap().unwrap();
        assert!(stored.doses_taken.is_empty());
    }

    #[test]
    fn test_taken_action_records_dose_at_delivery_instant() {
        let mut engine = make_engine();
        engine.arm_all(at(1, 6, 0)).unwrap();
        let medicine = engine.add_medicine(make_input(), at(1, 6, 0)).unwrap();

        engine
            .handle_action(
                ActionEvent {
                    tag: reminder_tag(&medicine.id, at(2, 8, 0)),
                    action: ReminderAction::Taken,
                },
                at(2, 8, 3),
            )
            .unwrap();

        let stored = engine.store().get_medicine(&medicine.id).unwrap().unwrap();
        assert_eq!(stored.doses_taken.len(), 1);
        assert_eq!(stored.doses_taken[0].taken_at, at(2, 8, 3));
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let mut engine = make_engine();
        let result = engine.handle_action(
            ActionEvent {
                tag: "garbage".into(),
                action: ReminderAction::Taken,
            },
            at(1, 8, 0),
        );
        assert!(matches!(result, Err(EngineError::UnknownTag(_))));
    }

    #[test]
    fn test_upcoming_doses_sorted() {
        let mut engine = make_engine();
        engine.add_medicine(make_input(), at(1, 6, 0)).unwrap();
        let mut evening = make_input();
        evening.name = "Ibuprofen".into();
        evening.time = "20:00".into();
        engine.add_medicine(evening, at(1, 6, 0)).unwrap();

        let upcoming = engine.upcoming_doses(at(1, 9, 0), 5).unwrap();
        assert_eq!(upcoming.len(), 2);
        // 08:00 already passed, so Amoxicillin rolls to tomorrow.
        assert_eq!(upcoming[0].name, "Ibuprofen");
        assert_eq!(upcoming[0].due_at, at(1, 20, 0));
        assert_eq!(upcoming[1].due_at, at(2, 8, 0));
    }
}
