//! Date/time collaborators and the recurrence engine.
//!
//! # Responsibility
//! - Parse user-facing `DD/MM/YYYY` + `HH:MM` input into chrono values.
//! - Provide the clock abstraction used to evaluate "now".
//! - Validate chronological constraints and expand recurrence rules into
//!   occurrence dates.
//!
//! # Invariants
//! - Nothing in this module touches storage or performs I/O.

pub mod clock;
pub mod parse;
pub mod recurrence;
pub mod validation;
