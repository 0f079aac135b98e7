//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep the console decoupled from storage details.
//!
//! # Invariants
//! - Validation and lookups finish before any repository write.
//! - Services never prompt; ambiguity such as series scope is a parameter.

pub mod appointment_service;
pub mod contact_service;

/// Maps blank optional input to `None`.
pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
