//! Year-independent description of a daylight saving time boundary.

use crate::datetime::{days_in_month, DateTime, DateTimeKind, DayOfWeek, TimeSpan, TICKS_PER_DAY, TICKS_PER_MILLISECOND};
use crate::error::InvalidRuleError;

/// Day selection of a transition time
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
enum TransitionDay {
    /// Fixed month day
    Fixed {
        /// Day of the month in `[1, 31]`
        day: u8,
    },
    /// Week day in a week of the month
    Floating {
        /// Week of the month in `[1, 5]`, with `5` representing the last occurrence of the week day
        week: u8,
        /// Day of the week
        day_of_week: DayOfWeek,
    },
}

/// Moment of a year at which daylight saving time starts or ends.
///
/// The [`Default`] value is the empty transition time, used by adjustment rules without daylight transitions.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TransitionTime {
    /// Local time of the transition, on 0001-01-01
    time_of_day: DateTime,
    /// Month in `[1, 12]`
    month: u8,
    /// Day selection
    transition_day: TransitionDay,
}

impl Default for TransitionTime {
    fn default() -> Self {
        Self { time_of_day: DateTime::MIN, month: 0, transition_day: TransitionDay::Floating { week: 0, day_of_week: DayOfWeek::Sunday } }
    }
}

impl TransitionTime {
    /// Construct a transition time occurring on a fixed day of a month.
    ///
    /// Days past the end of the month are clamped to the last day when resolved for a year.
    pub fn create_fixed_date_rule(time_of_day: DateTime, month: u8, day: u8) -> Result<Self, InvalidRuleError> {
        validate(time_of_day, month)?;

        if !(1..=31).contains(&day) {
            return Err(InvalidRuleError("invalid transition time day"));
        }

        Ok(Self { time_of_day, month, transition_day: TransitionDay::Fixed { day } })
    }

    /// Construct a transition time occurring on a week day of a week of a month.
    ///
    /// Week `5` denotes the last occurrence of the week day in the month.
    pub fn create_floating_date_rule(time_of_day: DateTime, month: u8, week: u8, day_of_week: DayOfWeek) -> Result<Self, InvalidRuleError> {
        validate(time_of_day, month)?;

        if !(1..=5).contains(&week) {
            return Err(InvalidRuleError("invalid transition time week"));
        }

        Ok(Self { time_of_day, month, transition_day: TransitionDay::Floating { week, day_of_week } })
    }

    /// Returns the local time of the transition, on 0001-01-01
    pub fn time_of_day(&self) -> DateTime {
        self.time_of_day
    }

    /// Returns the month, or `0` for the default transition time
    pub fn month(&self) -> u8 {
        self.month
    }

    /// Returns the month day of a fixed date rule, `1` otherwise
    pub fn day(&self) -> u8 {
        match self.transition_day {
            TransitionDay::Fixed { day } => day,
            TransitionDay::Floating { .. } => 1,
        }
    }

    /// Returns the week of a floating date rule, `1` otherwise
    pub fn week(&self) -> u8 {
        match self.transition_day {
            TransitionDay::Fixed { .. } => 1,
            TransitionDay::Floating { week, .. } => week,
        }
    }

    /// Returns the week day of a floating date rule, Sunday otherwise
    pub fn day_of_week(&self) -> DayOfWeek {
        match self.transition_day {
            TransitionDay::Fixed { .. } => DayOfWeek::Sunday,
            TransitionDay::Floating { day_of_week, .. } => day_of_week,
        }
    }

    /// Returns `true` if the transition occurs on a fixed month day
    pub fn is_fixed_date_rule(&self) -> bool {
        matches!(self.transition_day, TransitionDay::Fixed { .. })
    }

    /// Resolve the transition to a local date time of the specified year
    pub(crate) fn to_date_time(&self, year: i32) -> DateTime {
        let year = year.clamp(1, 9999);
        let month = self.month.clamp(1, 12);
        let time_of_day = self.time_of_day.time_of_day();

        let date = match self.transition_day {
            TransitionDay::Fixed { day } => {
                let day = day.min(days_in_month(year, month));
                DateTime::from_ymd(year, month, day)
            }
            TransitionDay::Floating { week, day_of_week } if week <= 4 => DateTime::from_ymd(year, month, 1).map(|first_day| {
                let delta = (7 + i64::from(day_of_week.num_days_from_sunday()) - i64::from(first_day.day_of_week().num_days_from_sunday())) % 7;
                first_day.saturating_add(TimeSpan::from_ticks((delta + 7 * (i64::from(week) - 1)) * TICKS_PER_DAY))
            }),
            TransitionDay::Floating { day_of_week, .. } => DateTime::from_ymd(year, month, days_in_month(year, month)).map(|last_day| {
                let delta = (7 + i64::from(last_day.day_of_week().num_days_from_sunday()) - i64::from(day_of_week.num_days_from_sunday())) % 7;
                last_day.saturating_sub(TimeSpan::from_ticks(delta * TICKS_PER_DAY))
            }),
        };

        date.unwrap_or(DateTime::MIN).saturating_add(time_of_day)
    }
}

/// Check the parameters shared by fixed and floating date rules
fn validate(time_of_day: DateTime, month: u8) -> Result<(), InvalidRuleError> {
    if !(1..=12).contains(&month) {
        return Err(InvalidRuleError("invalid transition time month"));
    }
    if time_of_day.kind() != DateTimeKind::Unspecified {
        return Err(InvalidRuleError("transition time of day must have an unspecified kind"));
    }
    if time_of_day.ticks() >= TICKS_PER_DAY {
        return Err(InvalidRuleError("transition time of day must be on 0001-01-01"));
    }
    if time_of_day.ticks() % TICKS_PER_MILLISECOND != 0 {
        return Err(InvalidRuleError("transition time of day must be a whole number of milliseconds"));
    }
    Ok(())
}
