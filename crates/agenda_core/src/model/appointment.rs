//! Appointment domain model.
//!
//! # Responsibility
//! - Define the stored appointment record and its recurrence tag.
//! - Provide the `(date, start_time, id)` ordering used by every list.
//!
//! # Invariants
//! - `end_time`, when set, is strictly later than `start_time`.
//! - Instances sharing `RecurrenceTag::group_id` were produced by one
//!   recurrence expansion.
//! - A removed tag is never re-attached.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// Integer identity of a stored appointment.
pub type AppointmentId = i64;

/// Rule used to step from one occurrence date to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceKind {
    /// Every calendar day.
    Daily,
    /// Every seventh day.
    Weekly,
    /// Every day whose weekday belongs to a configured set.
    Weekdays,
    /// Same day of month, clamped to the month length.
    Monthly,
}

impl RecurrenceKind {
    pub const ALL: [RecurrenceKind; 4] = [Self::Daily, Self::Weekly, Self::Weekdays, Self::Monthly];

    /// Stable lowercase label used in storage and console input.
    pub fn label(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Weekdays => "weekdays",
            Self::Monthly => "monthly",
        }
    }

    /// Parses a label produced by [`RecurrenceKind::label`], ignoring case
    /// and surrounding whitespace.
    pub fn from_label(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.label() == normalized)
    }
}

impl Display for RecurrenceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Series membership carried by every instance of an expanded recurrence.
///
/// Only the kind and the group identity survive expansion; the end bound
/// and weekday set are not needed once dates are materialized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecurrenceTag {
    pub kind: RecurrenceKind,
    pub group_id: String,
}

/// Stored appointment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub title: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: Option<NaiveTime>,
    pub description: Option<String>,
    /// Participant names in entry order. May be empty.
    pub participants: Vec<String>,
    /// Local time at which the appointment (or its series) was created.
    pub created_at: NaiveDateTime,
    /// `Some` only for instances still attached to a series.
    pub recurrence: Option<RecurrenceTag>,
}

impl Appointment {
    /// Date-time at which the appointment starts.
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// Group identity of the series this instance belongs to.
    pub fn group_id(&self) -> Option<&str> {
        self.recurrence.as_ref().map(|tag| tag.group_id.as_str())
    }

    /// Returns whether title or description contains `term`, ignoring case.
    ///
    /// An empty term matches every appointment.
    pub fn matches(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self
                .description
                .as_deref()
                .is_some_and(|text| text.to_lowercase().contains(&needle))
    }

    /// Chronological ordering with `id` as the tie breaker.
    pub fn schedule_order(&self, other: &Self) -> Ordering {
        (self.date, self.start_time, self.id).cmp(&(other.date, other.start_time, other.id))
    }
}
