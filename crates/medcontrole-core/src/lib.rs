//! MedControle Core Library
//!
//! Local-first medication reminder engine: users register medicines with a
//! dosing schedule, the system tracks adherence and arms local reminders.
//! All state lives on the device; there is no server.
//!
//! # Architecture
//!
//! ```text
//!  Storage (SQLite) ──▶ Medicine records
//!                            │
//!              ┌─────────────┼──────────────┐
//!              ▼             ▼              ▼
//!       Temporal         Status        Occurrence
//!       Calculator      Classifier      Expander
//!              │             │              │
//!              └──────┬──────┘              │ future instants
//!                     ▼                     ▼
//!               Dashboard /        ┌─────────────────┐
//!               card status        │ Reminder Engine │──▶ Delivery port
//!                                  └─────────────────┘      (platform
//!                     dose taken / edit / delete ▲           notifications)
//!                        {tag, action} events ───┘
//! ```
//!
//! All scheduling logic is pure: the engine recomputes arming from the
//! occurrence expander instead of holding timers, so a restart only needs
//! one [`ReminderEngine::arm_all`] call.
//!
//! # Modules
//!
//! - [`models`]: domain types (Medicine, Frequency, DoseRecord) and validation
//! - [`schedule`]: pure temporal logic (next due, status, occurrence expansion)
//! - [`db`]: SQLite storage and the [`MedicineStore`] port
//! - [`engine`]: reminder orchestration over a [`DeliveryPort`]
//! - [`export`]: JSON backup export/import

pub mod db;
pub mod engine;
pub mod export;
pub mod models;
pub mod schedule;

// Re-export commonly used types
pub use db::{Database, DbError, MedicineStore};
pub use engine::{
    ActionEvent, ArmOutcome, Dashboard, DeliveryPort, EngineError, Permission, Reminder,
    ReminderAction, ReminderEngine, UpcomingDose,
};
pub use export::{export_medicines, import_medicines, ExportError};
pub use models::{DoseRecord, Frequency, Medicine, NewMedicine, ValidationError};
pub use schedule::{
    end_date, future_occurrences, is_dose_taken_on, is_in_course_on, is_scheduled_on,
    next_due_instant, occurrences, status_at, MedicineStatus,
};
