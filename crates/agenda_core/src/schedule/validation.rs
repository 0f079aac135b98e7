//! Chronological validation rules.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Input parsed correctly but breaks a scheduling rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// End time equal to or earlier than start time.
    EndNotAfterStart { start: NaiveTime, end: NaiveTime },
    /// New appointment would start before the current moment.
    StartInPast {
        start: NaiveDateTime,
        now: NaiveDateTime,
    },
    /// Weekday recurrence without any weekday selected.
    EmptyWeekdaySet,
    /// Weekday index outside `0..=6`.
    WeekdayOutOfRange(u8),
    /// Recurrence end bound earlier than the first occurrence.
    RecurrenceEndsBeforeStart { start: NaiveDate, until: NaiveDate },
    /// Expansion would exceed the occurrence cap.
    TooManyOccurrences { limit: usize },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EndNotAfterStart { start, end } => write!(
                f,
                "end time {} must be later than start time {}",
                end.format("%H:%M"),
                start.format("%H:%M")
            ),
            Self::StartInPast { start, .. } => write!(
                f,
                "cannot schedule an appointment in the past ({})",
                start.format("%d/%m/%Y %H:%M")
            ),
            Self::EmptyWeekdaySet => {
                write!(f, "weekday recurrence requires at least one weekday")
            }
            Self::WeekdayOutOfRange(index) => {
                write!(f, "weekday index {index} is out of range (0=Monday .. 6=Sunday)")
            }
            Self::RecurrenceEndsBeforeStart { start, until } => write!(
                f,
                "recurrence end {} is before the first occurrence {}",
                until.format("%d/%m/%Y"),
                start.format("%d/%m/%Y")
            ),
            Self::TooManyOccurrences { limit } => {
                write!(f, "recurrence would create more than {limit} occurrences")
            }
        }
    }
}

impl Error for ValidationError {}

/// Checks that `end`, when present, is strictly later than `start`.
pub fn ensure_end_after_start(
    start: NaiveTime,
    end: Option<NaiveTime>,
) -> Result<(), ValidationError> {
    match end {
        Some(end) if end <= start => Err(ValidationError::EndNotAfterStart { start, end }),
        _ => Ok(()),
    }
}

/// Checks that `start` is not strictly before `now`.
pub fn ensure_not_past(start: NaiveDateTime, now: NaiveDateTime) -> Result<(), ValidationError> {
    if start < now {
        return Err(ValidationError::StartInPast { start, now });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ensure_end_after_start, ensure_not_past, ValidationError};
    use chrono::{NaiveDate, NaiveTime};

    fn time(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn end_must_be_strictly_after_start() {
        assert!(ensure_end_after_start(time(9, 0), None).is_ok());
        assert!(ensure_end_after_start(time(9, 0), Some(time(9, 1))).is_ok());
        assert_eq!(
            ensure_end_after_start(time(9, 0), Some(time(9, 0))),
            Err(ValidationError::EndNotAfterStart {
                start: time(9, 0),
                end: time(9, 0),
            })
        );
        assert!(ensure_end_after_start(time(9, 0), Some(time(8, 0))).is_err());
    }

    #[test]
    fn start_equal_to_now_is_allowed() {
        let now = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert!(ensure_not_past(now, now).is_ok());
        assert!(ensure_not_past(now - chrono::Duration::minutes(1), now).is_err());
    }
}
