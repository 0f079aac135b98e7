//! Domain model for contacts and appointments.
//!
//! # Responsibility
//! - Define the canonical records shared by repositories, services and the
//!   console.
//! - Define the list envelope used to tell "nothing stored" apart from
//!   "nothing matched".
//!
//! # Invariants
//! - Record ids are positive integers assigned as `max(id) + 1` and are
//!   never changed after assignment.

pub mod appointment;
pub mod contact;
pub mod listing;
