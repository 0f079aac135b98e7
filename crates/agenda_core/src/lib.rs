//! Core domain logic for the agenda: contacts, appointments and the
//! recurrence engine.
//! This crate is the single source of truth for scheduling invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod schedule;
pub mod service;

pub use config::{AgendaConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::appointment::{Appointment, AppointmentId, RecurrenceKind, RecurrenceTag};
pub use model::contact::{Contact, ContactId};
pub use model::listing::Listing;
pub use repo::appointment_repo::{AppointmentRepository, SqliteAppointmentRepository};
pub use repo::contact_repo::{ContactRepository, SqliteContactRepository};
pub use repo::{RepoError, RepoResult};
pub use schedule::clock::{Clock, FixedClock, SystemClock};
pub use schedule::parse::{format_date, format_time, FormatError};
pub use schedule::recurrence::{RecurrenceRule, MAX_OCCURRENCES};
pub use schedule::validation::ValidationError;
pub use service::appointment_service::{
    AppointmentPatch, AppointmentService, NewAppointment, Period, RecurrenceRequest,
    ScheduleError, SeriesScope,
};
pub use service::contact_service::{ContactPatch, ContactService, ContactServiceError, NewContact};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
