//! Database layer for MedControle.

mod medicines;
mod schema;

pub use schema::*;

use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

use crate::models::Medicine;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Medicine not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Storage port for medicine records.
///
/// Abstracts the persistence backend so the scheduling engine can run
/// against the SQLite [`Database`] or an in-memory double in tests.
pub trait MedicineStore {
    /// List all medicines, oldest registration first.
    fn list_medicines(&self) -> DbResult<Vec<Medicine>>;

    /// Get a medicine by id.
    fn get_medicine(&self, id: &str) -> DbResult<Option<Medicine>>;

    /// Insert or replace a medicine by id.
    fn upsert_medicine(&mut self, medicine: &Medicine) -> DbResult<()>;

    /// Delete a medicine. Returns true if it existed.
    fn delete_medicine(&mut self, id: &str) -> DbResult<bool>;

    /// Append a taken-dose record, read-modify-write atomic per record.
    fn append_dose(&mut self, id: &str, taken_at: chrono::NaiveDateTime) -> DbResult<()>;

    /// Replace the entire collection wholesale (import).
    fn replace_all(&mut self, medicines: &[Medicine]) -> DbResult<()>;
}

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn transaction(&mut self) -> DbResult<rusqlite::Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }
}
