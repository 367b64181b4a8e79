//! Domain models for the MedControle system.

mod medicine;

pub use medicine::*;
