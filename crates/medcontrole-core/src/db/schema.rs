//! SQLite schema definition.

/// Complete database schema for MedControle.
pub const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Medicines
-- ============================================================================

CREATE TABLE IF NOT EXISTS medicines (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    dosage TEXT NOT NULL,
    frequency_type TEXT NOT NULL
        CHECK (frequency_type IN ('daily', 'specific-days', 'weekly', 'custom')),
    specific_days TEXT,                           -- JSON array of weekday ints (specific-days only)
    custom_interval_hours INTEGER,                -- custom only
    dose_time TEXT NOT NULL,                      -- HH:MM anchor time
    start_date TEXT NOT NULL,                     -- YYYY-MM-DD
    duration_days INTEGER NOT NULL CHECK (duration_days >= 1),
    doses_taken TEXT NOT NULL DEFAULT '[]',       -- JSON array of DoseRecord
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_medicines_start_date ON medicines(start_date);
CREATE INDEX IF NOT EXISTS idx_medicines_created_at ON medicines(created_at);
"#;
