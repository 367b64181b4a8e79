//! Medicine record database operations.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult, MedicineStore};
use crate::models::{DoseRecord, Frequency, Medicine};

const SELECT_COLUMNS: &str = "id, name, dosage, frequency_type, specific_days, \
     custom_interval_hours, dose_time, start_date, duration_days, doses_taken, created_at";

impl MedicineStore for Database {
    fn list_medicines(&self) -> DbResult<Vec<Medicine>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM medicines ORDER BY created_at, id"
        ))?;
        let rows = stmt.query_map([], MedicineRow::from_row)?;

        let mut medicines = Vec::new();
        for row in rows {
            medicines.push(row?.try_into()?);
        }
        Ok(medicines)
    }

    fn get_medicine(&self, id: &str) -> DbResult<Option<Medicine>> {
        self.conn()
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM medicines WHERE id = ?"),
                [id],
                MedicineRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    fn upsert_medicine(&mut self, medicine: &Medicine) -> DbResult<()> {
        insert_medicine(self.conn(), medicine)
    }

    fn delete_medicine(&mut self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn()
            .execute("DELETE FROM medicines WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    fn append_dose(&mut self, id: &str, taken_at: NaiveDateTime) -> DbResult<()> {
        // Read-modify-write under one transaction so a concurrent edit cannot
        // drop the appended record.
        let tx = self.transaction()?;
        let doses_json: String = tx
            .query_row("SELECT doses_taken FROM medicines WHERE id = ?", [id], |row| {
                row.get(0)
            })
            .optional()?
            .ok_or_else(|| DbError::NotFound(id.to_string()))?;

        let mut doses: Vec<DoseRecord> = serde_json::from_str(&doses_json)?;
        doses.push(DoseRecord { taken_at });

        tx.execute(
            "UPDATE medicines SET doses_taken = ?2 WHERE id = ?1",
            params![id, serde_json::to_string(&doses)?],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn replace_all(&mut self, medicines: &[Medicine]) -> DbResult<()> {
        let tx = self.transaction()?;
        tx.execute("DELETE FROM medicines", [])?;
        for medicine in medicines {
            insert_medicine(&tx, medicine)?;
        }
        tx.commit()?;
        Ok(())
    }
}

// Takes &Connection so it also runs inside a transaction via deref.
fn insert_medicine(conn: &rusqlite::Connection, medicine: &Medicine) -> DbResult<()> {
    let (frequency_type, specific_days, custom_interval) = match &medicine.frequency {
        Frequency::Daily => ("daily", None, None),
        Frequency::SpecificDays { days } => {
            ("specific-days", Some(serde_json::to_string(days)?), None)
        }
        Frequency::Weekly => ("weekly", None, None),
        Frequency::Custom { interval_hours } => ("custom", None, Some(*interval_hours)),
    };

    conn.execute(
        r#"
        INSERT INTO medicines (
            id, name, dosage, frequency_type, specific_days,
            custom_interval_hours, dose_time, start_date, duration_days,
            doses_taken, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            dosage = excluded.dosage,
            frequency_type = excluded.frequency_type,
            specific_days = excluded.specific_days,
            custom_interval_hours = excluded.custom_interval_hours,
            dose_time = excluded.dose_time,
            start_date = excluded.start_date,
            duration_days = excluded.duration_days,
            doses_taken = excluded.doses_taken,
            created_at = excluded.created_at
        "#,
        params![
            medicine.id,
            medicine.name,
            medicine.dosage,
            frequency_type,
            specific_days,
            custom_interval,
            medicine.time.format("%H:%M").to_string(),
            medicine.start_date.format("%Y-%m-%d").to_string(),
            medicine.duration_days,
            serde_json::to_string(&medicine.doses_taken)?,
            medicine.created_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
        ],
    )?;
    Ok(())
}

/// Intermediate row struct for database mapping.
struct MedicineRow {
    id: String,
    name: String,
    dosage: String,
    frequency_type: String,
    specific_days: Option<String>,
    custom_interval_hours: Option<u32>,
    dose_time: String,
    start_date: String,
    duration_days: u32,
    doses_taken: String,
    created_at: String,
}

impl MedicineRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(MedicineRow {
            id: row.get(0)?,
            name: row.get(1)?,
            dosage: row.get(2)?,
            frequency_type: row.get(3)?,
            specific_days: row.get(4)?,
            custom_interval_hours: row.get(5)?,
            dose_time: row.get(6)?,
            start_date: row.get(7)?,
            duration_days: row.get(8)?,
            doses_taken: row.get(9)?,
            created_at: row.get(10)?,
        })
    }
}

impl TryFrom<MedicineRow> for Medicine {
    type Error = DbError;

    fn try_from(row: MedicineRow) -> Result<Self, Self::Error> {
        let frequency = match row.frequency_type.as_str() {
            "daily" => Frequency::Daily,
            "weekly" => Frequency::Weekly,
            "specific-days" => {
                let json = row.specific_days.ok_or_else(|| {
                    DbError::Constraint(format!("{}: specific-days without day list", row.id))
                })?;
                Frequency::SpecificDays {
                    days: serde_json::from_str(&json)?,
                }
            }
            "custom" => {
                let interval_hours = row.custom_interval_hours.ok_or_else(|| {
                    DbError::Constraint(format!("{}: custom frequency without interval", row.id))
                })?;
                Frequency::Custom { interval_hours }
            }
            other => {
                return Err(DbError::Constraint(format!(
                    "Unknown frequency type: {}",
                    other
                )))
            }
        };

        Ok(Medicine {
            frequency,
            time: parse_column(&row.id, "dose_time", &row.dose_time, "%H:%M", NaiveTime::parse_from_str)?,
            start_date: parse_column(
                &row.id,
                "start_date",
                &row.start_date,
                "%Y-%m-%d",
                NaiveDate::parse_from_str,
            )?,
            created_at: parse_column(
                &row.id,
                "created_at",
                &row.created_at,
                "%Y-%m-%dT%H:%M:%S",
                NaiveDateTime::parse_from_str,
            )?,
            doses_taken: serde_json::from_str(&row.doses_taken)?,
            id: row.id,
            name: row.name,
            dosage: row.dosage,
            duration_days: row.duration_days,
        })
    }
}

fn parse_column<T>(
    id: &str,
    column: &str,
    value: &str,
    format: &str,
    parse: impl Fn(&str, &str) -> chrono::ParseResult<T>,
) -> DbResult<T> {
    parse(value, format)
        .map_err(|e| DbError::Constraint(format!("{}: bad {} '{}': {}", id, column, value, e)))
}
