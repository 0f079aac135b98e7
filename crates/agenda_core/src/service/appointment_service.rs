//! Appointment use-case service (the scheduling engine).
//!
//! # Responsibility
//! - Validate and create standalone appointments or whole recurrence series.
//! - Filter and search the schedule.
//! - Apply edits and deletes to one instance or to a whole series.
//!
//! # Invariants
//! - Format, validation and not-found errors are raised before any write.
//! - A new appointment never starts before `Clock::now()`.
//! - Every series created by one call shares one unique group id.
//! - A single-instance edit detaches the instance from its series; siblings
//!   are left untouched.
//! - Returned collections are in `(date, start_time, id)` order.

use crate::model::appointment::{Appointment, AppointmentId, RecurrenceKind, RecurrenceTag};
use crate::model::listing::Listing;
use crate::repo::appointment_repo::AppointmentRepository;
use crate::repo::RepoError;
use crate::schedule::clock::{Clock, SystemClock};
use crate::schedule::parse::{parse_date, parse_time, FormatError};
use crate::schedule::recurrence::{group_id_for, RecurrenceRule};
use crate::schedule::validation::{ensure_end_after_start, ensure_not_past, ValidationError};
use crate::service::non_blank;
use chrono::{Days, NaiveDate, NaiveTime};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for appointment use-cases.
#[derive(Debug)]
pub enum ScheduleError {
    /// Date or time input is malformed.
    Format(FormatError),
    /// Input is well formed but breaks a scheduling rule.
    Validation(ValidationError),
    /// No appointment has this id.
    NotFound(AppointmentId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ScheduleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Format(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "appointment not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ScheduleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Format(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<FormatError> for ScheduleError {
    fn from(value: FormatError) -> Self {
        Self::Format(value)
    }
}

impl From<ValidationError> for ScheduleError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ScheduleError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { id, .. } => Self::NotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Recurrence part of a create request, in console/wire shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRequest {
    pub kind: RecurrenceKind,
    /// Inclusive end bound, `DD/MM/YYYY`.
    pub until: String,
    /// Weekday indices (0=Monday .. 6=Sunday). Used by `Weekdays` only.
    pub weekdays: Vec<u8>,
}

/// Input for [`AppointmentService::create`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewAppointment {
    pub title: String,
    /// `DD/MM/YYYY`.
    pub date: String,
    /// `HH:MM`.
    pub start_time: String,
    /// `HH:MM`, blank treated as absent.
    pub end_time: Option<String>,
    pub description: Option<String>,
    pub participants: Vec<String>,
    pub recurrence: Option<RecurrenceRequest>,
}

/// Field-level appointment update.
///
/// `None` or a blank value keeps the stored value. For optional fields
/// `Some(None)` clears it. `date` is neither parsed nor applied for
/// whole-series edits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentPatch {
    pub title: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub participants: Option<Vec<String>>,
}

/// Which instances an edit or delete targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesScope {
    /// Only the addressed instance.
    Single,
    /// Every instance sharing the addressed instance's group id. Behaves
    /// like `Single` for standalone appointments.
    Series,
}

/// List filter for [`AppointmentService::list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    All,
    /// Appointments dated on the current day.
    Today,
    /// Appointments dated up to 7 days from now, past ones included.
    Next7Days,
    /// Appointments dated up to 30 days from now, past ones included.
    Next30Days,
}

impl Period {
    /// Parses `all|today|week|month`, ignoring case.
    pub fn from_label(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Some(Self::All),
            "today" => Some(Self::Today),
            "week" => Some(Self::Next7Days),
            "month" => Some(Self::Next30Days),
            _ => None,
        }
    }

    fn includes(self, date: NaiveDate, today: NaiveDate) -> bool {
        match self {
            Self::All => true,
            Self::Today => date == today,
            // No lower bound: past appointments stay in the window.
            Self::Next7Days => within_days(date, today, 7),
            Self::Next30Days => within_days(date, today, 30),
        }
    }
}

fn within_days(date: NaiveDate, today: NaiveDate, days: u64) -> bool {
    match today.checked_add_days(Days::new(days)) {
        Some(limit) => date <= limit,
        None => true,
    }
}

/// Patch with every string parsed, ready to apply.
struct ParsedPatch {
    title: Option<String>,
    date: Option<NaiveDate>,
    start_time: Option<NaiveTime>,
    end_time: Option<Option<NaiveTime>>,
    description: Option<Option<String>>,
    participants: Option<Vec<String>>,
}

impl ParsedPatch {
    /// Parses the supplied fields. Blank required fields count as absent,
    /// and the date is skipped unless `include_date` is set.
    fn parse(patch: &AppointmentPatch, include_date: bool) -> Result<Self, FormatError> {
        let date = match non_blank(patch.date.as_deref()) {
            Some(value) if include_date => Some(parse_date("date", &value)?),
            _ => None,
        };
        let start_time = non_blank(patch.start_time.as_deref())
            .map(|value| parse_time("start_time", &value))
            .transpose()?;
        let end_time = match &patch.end_time {
            None => None,
            Some(value) => Some(parse_optional_time("end_time", value.as_deref())?),
        };

        Ok(Self {
            title: non_blank(patch.title.as_deref()),
            date,
            start_time,
            end_time,
            description: patch
                .description
                .as_ref()
                .map(|description| non_blank(description.as_deref())),
            participants: patch
                .participants
                .as_ref()
                .map(|names| normalize_participants(names)),
        })
    }

    /// Applies the patch and re-checks the time range of the result.
    fn apply(&self, appointment: &mut Appointment) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            appointment.title = title.clone();
        }
        if let Some(date) = self.date {
            appointment.date = date;
        }
        if let Some(start_time) = self.start_time {
            appointment.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            appointment.end_time = end_time;
        }
        if let Some(description) = &self.description {
            appointment.description = description.clone();
        }
        if let Some(participants) = &self.participants {
            appointment.participants = participants.clone();
        }
        ensure_end_after_start(appointment.start_time, appointment.end_time)
    }
}

/// Scheduling facade over repository implementations.
pub struct AppointmentService<R: AppointmentRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
}

impl<R: AppointmentRepository> AppointmentService<R> {
    /// Creates a service evaluating "now" with the system clock.
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, SystemClock)
    }
}

impl<R: AppointmentRepository, C: Clock> AppointmentService<R, C> {
    pub fn with_clock(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    /// Creates one appointment, or every instance of a recurrence series.
    ///
    /// Returns the created instances in schedule order; the length is the
    /// number of occurrences.
    pub fn create(&self, request: &NewAppointment) -> Result<Vec<Appointment>, ScheduleError> {
        let date = parse_date("date", &request.date)?;
        let start_time = parse_time("start_time", &request.start_time)?;
        let end_time = parse_optional_time("end_time", request.end_time.as_deref())?;
        ensure_end_after_start(start_time, end_time)?;

        let now = self.clock.now();
        let template = Appointment {
            id: 0,
            title: request.title.trim().to_string(),
            date,
            start_time,
            end_time,
            description: non_blank(request.description.as_deref()),
            participants: normalize_participants(&request.participants),
            created_at: now,
            recurrence: None,
        };
        ensure_not_past(template.starts_at(), now)?;

        let rule = match &request.recurrence {
            Some(recurrence) => Some(RecurrenceRule::new(
                recurrence.kind,
                parse_date("recurrence_until", &recurrence.until)?,
                recurrence.weekdays.iter().copied(),
            )?),
            None => None,
        };

        let first_id = self.repo.next_appointment_id()?;
        let created = match rule {
            None => vec![Appointment {
                id: first_id,
                ..template
            }],
            Some(rule) => {
                let dates = rule.expand(date)?;
                let tag = RecurrenceTag {
                    kind: rule.kind(),
                    group_id: self.unique_group_id(&group_id_for(template.starts_at()))?,
                };
                dates
                    .into_iter()
                    .zip(first_id..)
                    .map(|(occurrence, id)| Appointment {
                        id,
                        date: occurrence,
                        recurrence: Some(tag.clone()),
                        ..template.clone()
                    })
                    .collect()
            }
        };

        self.repo.insert_appointments(&created)?;
        info!(
            "event=appointment_create module=service status=ok first_id={} count={} recurring={}",
            first_id,
            created.len(),
            request.recurrence.is_some()
        );
        Ok(created)
    }

    pub fn get(&self, id: AppointmentId) -> Result<Appointment, ScheduleError> {
        self.repo
            .get_appointment(id)?
            .ok_or(ScheduleError::NotFound(id))
    }

    /// Lists appointments for a period in schedule order.
    ///
    /// Returns `NoRecords` when nothing is stored and `NoMatches` when the
    /// period filters everything out.
    pub fn list(&self, period: Period) -> Result<Listing<Appointment>, ScheduleError> {
        let appointments = self.repo.list_appointments()?;
        let total = appointments.len();
        let today = self.clock.today();
        let selected = appointments
            .into_iter()
            .filter(|appointment| period.includes(appointment.date, today))
            .collect::<Vec<_>>();
        Ok(Listing::from_filtered(total, selected))
    }

    /// Finds appointments whose title or description contains `term`,
    /// ignoring case. An empty term matches every appointment.
    pub fn search(&self, term: &str) -> Result<Listing<Appointment>, ScheduleError> {
        let matches = self
            .repo
            .list_appointments()?
            .into_iter()
            .filter(|appointment| appointment.matches(term))
            .collect::<Vec<_>>();
        if matches.is_empty() {
            return Ok(Listing::NoMatches);
        }
        Ok(Listing::Found(matches))
    }

    /// Edits one instance or a whole series and returns the updated records.
    ///
    /// A single-instance edit may move the date and always detaches the
    /// instance from its series. A series edit never changes dates.
    pub fn edit(
        &self,
        id: AppointmentId,
        patch: &AppointmentPatch,
        scope: SeriesScope,
    ) -> Result<Vec<Appointment>, ScheduleError> {
        let target = self.get(id)?;
        let series_group = match scope {
            SeriesScope::Series => target.group_id().map(str::to_string),
            SeriesScope::Single => None,
        };
        let changes = ParsedPatch::parse(patch, series_group.is_none())?;

        let mut updated = match series_group {
            Some(group_id) => {
                let mut series = self.repo.list_series(&group_id)?;
                for appointment in &mut series {
                    changes.apply(appointment)?;
                }
                if non_blank(patch.date.as_deref()).is_some() {
                    warn!(
                        "event=appointment_edit module=service status=ignored_field field=date group_size={}",
                        series.len()
                    );
                }
                series
            }
            None => {
                let mut appointment = target;
                changes.apply(&mut appointment)?;
                appointment.recurrence = None;
                vec![appointment]
            }
        };

        self.repo.update_appointments(&updated)?;
        info!(
            "event=appointment_edit module=service status=ok appointment_id={} scope={:?} count={}",
            id,
            scope,
            updated.len()
        );

        updated.sort_by(Appointment::schedule_order);
        Ok(updated)
    }

    /// Deletes one instance or a whole series and returns the removed ids.
    pub fn delete(
        &self,
        id: AppointmentId,
        scope: SeriesScope,
    ) -> Result<Vec<AppointmentId>, ScheduleError> {
        let target = self.get(id)?;
        let ids = match (scope, target.group_id()) {
            (SeriesScope::Series, Some(group_id)) => self
                .repo
                .list_series(group_id)?
                .into_iter()
                .map(|appointment| appointment.id)
                .collect(),
            _ => vec![target.id],
        };

        self.repo.delete_appointments(&ids)?;
        info!(
            "event=appointment_delete module=service status=ok appointment_id={} scope={:?} count={}",
            id,
            scope,
            ids.len()
        );
        Ok(ids)
    }

    /// Returns `base`, suffixed with `#2`, `#3`, ... if already taken.
    fn unique_group_id(&self, base: &str) -> Result<String, RepoError> {
        if !self.repo.series_exists(base)? {
            return Ok(base.to_string());
        }
        let mut suffix = 2_u32;
        loop {
            let candidate = format!("{base}#{suffix}");
            if !self.repo.series_exists(&candidate)? {
                return Ok(candidate);
            }
            suffix += 1;
        }
    }
}

fn parse_optional_time(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<NaiveTime>, FormatError> {
    match value.map(str::trim).filter(|text| !text.is_empty()) {
        Some(text) => parse_time(field, text).map(Some),
        None => Ok(None),
    }
}

fn normalize_participants(names: &[String]) -> Vec<String> {
    names
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{within_days, Period};
    use chrono::NaiveDate;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn period_labels_parse() {
        assert_eq!(Period::from_label(""), Some(Period::All));
        assert_eq!(Period::from_label("Today"), Some(Period::Today));
        assert_eq!(Period::from_label("week"), Some(Period::Next7Days));
        assert_eq!(Period::from_label("month"), Some(Period::Next30Days));
        assert_eq!(Period::from_label("year"), None);
    }

    #[test]
    fn window_upper_bound_is_inclusive() {
        let today = date(2024, 6, 1);
        assert!(within_days(date(2024, 6, 8), today, 7));
        assert!(!within_days(date(2024, 6, 9), today, 7));
    }

    #[test]
    fn window_has_no_lower_bound() {
        assert!(Period::Next7Days.includes(date(2020, 1, 1), date(2024, 6, 1)));
        assert!(!Period::Today.includes(date(2020, 1, 1), date(2024, 6, 1)));
    }
}
