//! Adjustment rules, describing the offset policy of a time zone over a range of dates.

use super::TransitionTime;
use crate::datetime::{DateTime, DateTimeKind, TimeSpan, TICKS_PER_MILLISECOND, TICKS_PER_SECOND};
use crate::error::InvalidRuleError;

/// Largest offset from UTC
pub(crate) const MAX_OFFSET: TimeSpan = TimeSpan::from_hours(14);
/// Smallest offset from UTC
pub(crate) const MIN_OFFSET: TimeSpan = TimeSpan::from_hours(-14);

/// Returns `true` if the offset is outside of `[-14h, 14h]`
pub(crate) fn utc_offset_out_of_range(offset: TimeSpan) -> bool {
    offset < MIN_OFFSET || offset > MAX_OFFSET
}

/// Offset policy of a time zone over an inclusive range of dates.
///
/// Range boundaries with a [`DateTimeKind::Utc`] kind are UTC instants, otherwise they are local dates.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct AdjustmentRule {
    /// First date of the range
    date_start: DateTime,
    /// Last date of the range
    date_end: DateTime,
    /// Offset added to the standard offset during daylight saving time
    daylight_delta: TimeSpan,
    /// Start of daylight saving time in each year
    daylight_transition_start: TransitionTime,
    /// End of daylight saving time in each year
    daylight_transition_end: TransitionTime,
    /// Offset added to the base offset of the time zone over the range
    base_utc_offset_delta: TimeSpan,
    /// `true` if the range has a constant offset, the daylight transitions being unused
    no_daylight_transitions: bool,
}

impl AdjustmentRule {
    /// Construct an adjustment rule with a yearly daylight saving time window
    ///
    /// ## Inputs
    ///
    /// * `date_start`: First date of the range
    /// * `date_end`: Last date of the range
    /// * `daylight_delta`: Offset added during daylight saving time, in whole minutes
    /// * `daylight_transition_start`: Start of daylight saving time in each year
    /// * `daylight_transition_end`: End of daylight saving time in each year
    ///
    pub fn create(
        date_start: DateTime,
        date_end: DateTime,
        daylight_delta: TimeSpan,
        daylight_transition_start: TransitionTime,
        daylight_transition_end: TransitionTime,
    ) -> Result<Self, InvalidRuleError> {
        Self::new(date_start, date_end, daylight_delta, daylight_transition_start, daylight_transition_end, TimeSpan::ZERO, false)
    }

    /// Construct an adjustment rule with a yearly daylight saving time window, changing the base offset of the time zone over its range
    pub fn create_with_base_utc_offset_delta(
        date_start: DateTime,
        date_end: DateTime,
        daylight_delta: TimeSpan,
        daylight_transition_start: TransitionTime,
        daylight_transition_end: TransitionTime,
        base_utc_offset_delta: TimeSpan,
    ) -> Result<Self, InvalidRuleError> {
        Self::new(date_start, date_end, daylight_delta, daylight_transition_start, daylight_transition_end, base_utc_offset_delta, false)
    }

    pub(crate) fn new(
        date_start: DateTime,
        date_end: DateTime,
        daylight_delta: TimeSpan,
        daylight_transition_start: TransitionTime,
        daylight_transition_end: TransitionTime,
        base_utc_offset_delta: TimeSpan,
        no_daylight_transitions: bool,
    ) -> Result<Self, InvalidRuleError> {
        if date_start.kind() == DateTimeKind::Local || date_end.kind() == DateTimeKind::Local {
            return Err(InvalidRuleError("adjustment rule dates must not have a local kind"));
        }
        if daylight_transition_start == daylight_transition_end && !no_daylight_transitions {
            return Err(InvalidRuleError("daylight transitions must differ"));
        }
        if date_start > date_end {
            return Err(InvalidRuleError("adjustment rule start date must not be after its end date"));
        }
        if utc_offset_out_of_range(daylight_delta) {
            return Err(InvalidRuleError("daylight delta out of range"));
        }
        if !daylight_delta.is_whole_minutes() {
            return Err(InvalidRuleError("daylight delta must be a whole number of minutes"));
        }
        if !base_utc_offset_delta.is_whole_minutes() {
            return Err(InvalidRuleError("base offset delta must be a whole number of minutes"));
        }
        if date_start != DateTime::MIN && date_start.kind() == DateTimeKind::Unspecified && date_start.time_of_day() != TimeSpan::ZERO {
            return Err(InvalidRuleError("adjustment rule start date must not have a time of day"));
        }
        if date_end != DateTime::MAX && date_end.kind() == DateTimeKind::Unspecified && date_end.time_of_day() != TimeSpan::ZERO {
            return Err(InvalidRuleError("adjustment rule end date must not have a time of day"));
        }

        Ok(Self { date_start, date_end, daylight_delta, daylight_transition_start, daylight_transition_end, base_utc_offset_delta, no_daylight_transitions })
    }

    /// Returns the first date of the range
    pub fn date_start(&self) -> DateTime {
        self.date_start
    }

    /// Returns the last date of the range
    pub fn date_end(&self) -> DateTime {
        self.date_end
    }

    /// Returns the offset added during daylight saving time
    pub fn daylight_delta(&self) -> TimeSpan {
        self.daylight_delta
    }

    /// Returns the start of daylight saving time in each year
    pub fn daylight_transition_start(&self) -> TransitionTime {
        self.daylight_transition_start
    }

    /// Returns the end of daylight saving time in each year
    pub fn daylight_transition_end(&self) -> TransitionTime {
        self.daylight_transition_end
    }

    /// Returns the offset added to the base offset of the time zone over the range
    pub fn base_utc_offset_delta(&self) -> TimeSpan {
        self.base_utc_offset_delta
    }

    /// Returns `true` if the range has a constant offset
    pub fn no_daylight_transitions(&self) -> bool {
        self.no_daylight_transitions
    }

    /// Returns a copy of the rule with another base offset delta
    pub(crate) fn with_base_utc_offset_delta(&self, base_utc_offset_delta: TimeSpan) -> Self {
        Self { base_utc_offset_delta, ..*self }
    }

    /// Returns `true` if the rule applies a daylight delta at some point of its range
    pub(crate) fn has_daylight_saving(&self) -> bool {
        let start = self.daylight_transition_start;
        let end = self.daylight_transition_end;

        self.daylight_delta != TimeSpan::ZERO
            || (start != TransitionTime::default() && start.time_of_day() != DateTime::MIN)
            || (end != TransitionTime::default() && end.time_of_day().ticks() != TICKS_PER_MILLISECOND)
    }

    /// Returns `true` if daylight saving time is already in effect when the year of the rule begins
    pub(crate) fn is_start_date_marker_for_beginning_of_year(&self) -> bool {
        !self.no_daylight_transitions && is_new_year_marker(&self.daylight_transition_start) && self.date_start.year() == self.date_end.year()
    }

    /// Returns `true` if daylight saving time is still in effect when the year of the rule ends
    pub(crate) fn is_end_date_marker_for_end_of_year(&self) -> bool {
        !self.no_daylight_transitions && is_new_year_marker(&self.daylight_transition_end) && self.date_start.year() == self.date_end.year()
    }
}

/// Returns `true` if the transition occurs during the first second of January 1st
fn is_new_year_marker(transition_time: &TransitionTime) -> bool {
    transition_time.month() == 1 && transition_time.day() == 1 && transition_time.time_of_day().ticks() < TICKS_PER_SECOND
}
