//! Backup export and import of the medicine collection.
//!
//! The payload is a pretty-printed JSON array of medicine records, exactly
//! the in-memory serde shape. Import replaces the whole collection; there is
//! no merge.

use thiserror::Error;

use crate::db::{DbError, MedicineStore};
use crate::models::{Medicine, ValidationError};

/// Export/import errors.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Malformed payload: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Invalid medicine record: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] DbError),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Serialize the whole collection as pretty-printed JSON.
pub fn export_medicines<S: MedicineStore>(store: &S) -> ExportResult<String> {
    let medicines = store.list_medicines()?;
    Ok(serde_json::to_string_pretty(&medicines)?)
}

/// Replace the collection from a JSON payload.
///
/// The entire payload is parsed and validated before any storage change, so
/// a malformed or invalid backup leaves the existing data untouched.
pub fn import_medicines<S: MedicineStore>(store: &mut S, payload: &str) -> ExportResult<usize> {
    let medicines: Vec<Medicine> = serde_json::from_str(payload)?;

    let mut seen = std::collections::HashSet::new();
    for medicine in &medicines {
        medicine.validate()?;
        if !seen.insert(medicine.id.as_str()) {
            return Err(ValidationError::DuplicateId(medicine.id.clone()).into());
        }
    }

    store.replace_all(&medicines)?;
    Ok(medicines.len())
}
