//! Recurrence rule expansion.
//!
//! # Responsibility
//! - Step occurrence dates forward according to a `RecurrenceKind`.
//! - Derive the group identity shared by every instance of one series.
//!
//! # Invariants
//! - The start date is always the first occurrence.
//! - The end bound is inclusive.
//! - Expansion is capped at `MAX_OCCURRENCES` dates.

use crate::model::appointment::RecurrenceKind;
use crate::schedule::validation::ValidationError;
use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime};
use std::collections::BTreeSet;

/// Upper bound on dates produced by one expansion.
pub const MAX_OCCURRENCES: usize = 1000;

const GROUP_ID_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Validated recurrence descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    kind: RecurrenceKind,
    until: NaiveDate,
    /// Weekday indices, 0=Monday .. 6=Sunday. Empty unless `kind` is
    /// `Weekdays`.
    weekdays: BTreeSet<u8>,
}

impl RecurrenceRule {
    /// Builds a rule, validating the weekday set for `Weekdays`.
    ///
    /// Weekdays passed for other kinds are ignored.
    pub fn new(
        kind: RecurrenceKind,
        until: NaiveDate,
        weekdays: impl IntoIterator<Item = u8>,
    ) -> Result<Self, ValidationError> {
        let weekdays = if kind == RecurrenceKind::Weekdays {
            let days = weekdays.into_iter().collect::<BTreeSet<_>>();
            if days.is_empty() {
                return Err(ValidationError::EmptyWeekdaySet);
            }
            if let Some(&out_of_range) = days.iter().find(|&&day| day > 6) {
                return Err(ValidationError::WeekdayOutOfRange(out_of_range));
            }
            days
        } else {
            BTreeSet::new()
        };

        Ok(Self {
            kind,
            until,
            weekdays,
        })
    }

    pub fn kind(&self) -> RecurrenceKind {
        self.kind
    }

    /// Returns the occurrence following `date`, or `None` past chrono's
    /// representable range.
    pub fn next_after(&self, date: NaiveDate) -> Option<NaiveDate> {
        match self.kind {
            RecurrenceKind::Daily => date.checked_add_days(Days::new(1)),
            RecurrenceKind::Weekly => date.checked_add_days(Days::new(7)),
            RecurrenceKind::Weekdays => {
                let mut next = date.succ_opt()?;
                while !self.weekdays.contains(&weekday_index(next)) {
                    next = next.succ_opt()?;
                }
                Some(next)
            }
            // chrono clamps to the last day of the target month.
            RecurrenceKind::Monthly => date.checked_add_months(Months::new(1)),
        }
    }

    /// Expands the rule into occurrence dates beginning at `start`.
    pub fn expand(&self, start: NaiveDate) -> Result<Vec<NaiveDate>, ValidationError> {
        if self.until < start {
            return Err(ValidationError::RecurrenceEndsBeforeStart {
                start,
                until: self.until,
            });
        }

        let mut dates = Vec::new();
        let mut current = start;
        while current <= self.until {
            if dates.len() == MAX_OCCURRENCES {
                return Err(ValidationError::TooManyOccurrences {
                    limit: MAX_OCCURRENCES,
                });
            }
            dates.push(current);
            match self.next_after(current) {
                Some(next) => current = next,
                None => break,
            }
        }
        Ok(dates)
    }
}

/// Canonical group identity for a series starting at `start`.
pub fn group_id_for(start: NaiveDateTime) -> String {
    start.format(GROUP_ID_FORMAT).to_string()
}

fn weekday_index(date: NaiveDate) -> u8 {
    // num_days_from_monday is always 0..=6
    date.weekday().num_days_from_monday() as u8
}

#[cfg(test)]
mod tests {
    use super::{group_id_for, RecurrenceRule, MAX_OCCURRENCES};
    use crate::model::appointment::RecurrenceKind;
    use crate::schedule::validation::ValidationError;
    use chrono::NaiveDate;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn rule(kind: RecurrenceKind, until: NaiveDate) -> RecurrenceRule {
        RecurrenceRule::new(kind, until, []).unwrap()
    }

    #[test]
    fn daily_includes_end_bound() {
        let dates = rule(RecurrenceKind::Daily, date(2024, 1, 3))
            .expand(date(2024, 1, 1))
            .unwrap();
        assert_eq!(dates, vec![date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3)]);
    }

    #[test]
    fn single_occurrence_when_end_equals_start() {
        let dates = rule(RecurrenceKind::Weekly, date(2024, 1, 1))
            .expand(date(2024, 1, 1))
            .unwrap();
        assert_eq!(dates, vec![date(2024, 1, 1)]);
    }

    #[test]
    fn weekly_steps_seven_days_and_stops_before_bound() {
        let dates = rule(RecurrenceKind::Weekly, date(2024, 1, 21))
            .expand(date(2024, 1, 1))
            .unwrap();
        assert_eq!(dates, vec![date(2024, 1, 1), date(2024, 1, 8), date(2024, 1, 15)]);
    }

    #[test]
    fn monthly_clamps_to_leap_february() {
        let dates = rule(RecurrenceKind::Monthly, date(2024, 3, 31))
            .expand(date(2024, 1, 31))
            .unwrap();
        assert_eq!(dates, vec![date(2024, 1, 31), date(2024, 2, 29), date(2024, 3, 29)]);
    }

    #[test]
    fn monthly_clamps_to_common_february() {
        let dates = rule(RecurrenceKind::Monthly, date(2023, 2, 28))
            .expand(date(2023, 1, 31))
            .unwrap();
        assert_eq!(dates, vec![date(2023, 1, 31), date(2023, 2, 28)]);
    }

    #[test]
    fn monthly_crosses_year_boundary() {
        let dates = rule(RecurrenceKind::Monthly, date(2025, 1, 15))
            .expand(date(2024, 12, 15))
            .unwrap();
        assert_eq!(dates, vec![date(2024, 12, 15), date(2025, 1, 15)]);
    }

    #[test]
    fn weekdays_start_date_is_first_occurrence_even_off_set() {
        // 2024-01-01 is a Monday; set is Wednesday + Friday.
        let weekdays = RecurrenceRule::new(RecurrenceKind::Weekdays, date(2024, 1, 10), [2, 4])
            .unwrap();
        let dates = weekdays.expand(date(2024, 1, 1)).unwrap();
        assert_eq!(
            dates,
            vec![date(2024, 1, 1), date(2024, 1, 3), date(2024, 1, 5), date(2024, 1, 10)]
        );
    }

    #[test]
    fn weekdays_requires_non_empty_set_in_range() {
        assert_eq!(
            RecurrenceRule::new(RecurrenceKind::Weekdays, date(2024, 1, 10), []),
            Err(ValidationError::EmptyWeekdaySet)
        );
        assert_eq!(
            RecurrenceRule::new(RecurrenceKind::Weekdays, date(2024, 1, 10), [1, 7]),
            Err(ValidationError::WeekdayOutOfRange(7))
        );
    }

    #[test]
    fn weekdays_are_ignored_for_other_kinds() {
        let daily = RecurrenceRule::new(RecurrenceKind::Daily, date(2024, 1, 10), [9]).unwrap();
        assert!(daily.weekdays.is_empty());
    }

    #[test]
    fn end_before_start_is_rejected() {
        let err = rule(RecurrenceKind::Daily, date(2023, 12, 31))
            .expand(date(2024, 1, 1))
            .unwrap_err();
        assert!(matches!(err, ValidationError::RecurrenceEndsBeforeStart { .. }));
    }

    #[test]
    fn expansion_is_capped() {
        let err = rule(RecurrenceKind::Daily, date(2030, 1, 1))
            .expand(date(2024, 1, 1))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::TooManyOccurrences {
                limit: MAX_OCCURRENCES
            }
        );
    }

    #[test]
    fn group_id_is_canonical_start_timestamp() {
        let start = date(2024, 1, 1).and_hms_opt(14, 30, 0).unwrap();
        assert_eq!(group_id_for(start), "2024-01-01T14:30");
    }
}
