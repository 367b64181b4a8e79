//! Pure scheduling logic.
//!
//! Pipeline: Schedule Model → Temporal Calculator → Status Classifier,
//! with the Occurrence Expander producing reminder instants for the engine.
//! Everything here is a pure function of a [`Medicine`](crate::models::Medicine)
//! and a reference `now`; no stored state, no clocks.

mod calculator;
mod occurrences;
mod status;

pub use calculator::*;
pub use occurrences::*;
pub use status::*;
