//! Adjustment rule lookup and daylight saving time classification.

use std::cmp::Ordering;

use super::{AdjustmentRule, TimeZoneInfo};
use crate::datetime::{DateTime, DateTimeKind, TimeSpan, MAX_TICKS, TICKS_PER_DAY};

/// Daylight saving time window of an adjustment rule, resolved for one year
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct DaylightTime {
    /// Start of the window
    pub(crate) start: DateTime,
    /// End of the window
    pub(crate) end: DateTime,
    /// Daylight delta of the rule
    pub(crate) delta: TimeSpan,
}

/// Result of an offset computation from a UTC date time
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct UtcOffsetInfo {
    /// Offset from UTC
    pub(crate) offset: TimeSpan,
    /// `true` if daylight saving time is in effect
    pub(crate) is_daylight_saving: bool,
    /// `true` if the corresponding local time is the daylight saving occurrence of a repeated interval
    pub(crate) is_ambiguous_local_dst: bool,
}

/// Tick count of 9999-12-31, after which shifting a UTC date time by an offset may overflow
const MAX_DATE_ONLY_TICKS: i64 = MAX_TICKS - TICKS_PER_DAY + 1;
/// Tick count of 0001-01-02, before which shifting a UTC date time by an offset may underflow
const MIN_DATE_ONLY_TICKS: i64 = TICKS_PER_DAY;

/// Returns January 1st of a year, at midnight
fn beginning_of_year(year: i32) -> DateTime {
    DateTime::from_ymd(year.clamp(1, 9999), 1, 1).unwrap_or(DateTime::MIN)
}

/// Returns the last tick of a year
fn end_of_year(year: i32) -> DateTime {
    match year >= 9999 {
        true => DateTime::MAX,
        false => beginning_of_year(year + 1).saturating_sub(TimeSpan::from_ticks(1)),
    }
}

/// Shift a date time by an offset, dropping its kind
fn shift(date_time: DateTime, offset: TimeSpan) -> DateTime {
    date_time.with_kind(DateTimeKind::Unspecified).saturating_add(offset)
}

/// Returns `true` if `time` is in `[start, end)`, also trying the interval shifted by one year in each direction when it spans a year boundary
fn in_interval_around_year_boundary(time: DateTime, start: DateTime, end: DateTime) -> bool {
    if start <= time && time < end {
        return true;
    }

    if start.year() == end.year() {
        return false;
    }

    [1, -1].iter().any(|&years| match (start.checked_add_years(years), end.checked_add_years(years)) {
        (Some(start), Some(end)) => start <= time && time < end,
        _ => false,
    })
}

/// Check if a time lies in a daylight saving time window.
///
/// Unless `ignore_year_adjustment` is set, the time and the window end are first moved to the year of the window start.
/// A window whose start is after its end wraps around the end of the year.
pub(crate) fn check_is_dst(start: DateTime, time: DateTime, end: DateTime, ignore_year_adjustment: bool, rule: &AdjustmentRule) -> bool {
    let (mut time, mut end) = (time, end);

    if !ignore_year_adjustment && !rule.no_daylight_transitions() {
        let start_year = start.year();

        if end.year() != start_year {
            end = end.saturating_add_years(start_year - end.year());
        }
        if time.year() != start_year {
            time = time.saturating_add_years(start_year - time.year());
        }
    }

    if start > end {
        time < end || time >= start
    } else if rule.no_daylight_transitions() {
        start <= time && time <= end
    } else {
        start <= time && time < end
    }
}

/// Check if a local time is in daylight saving time.
///
/// Local date times in a repeated interval are resolved with their ambiguity flag.
pub(crate) fn is_daylight_saving(time: DateTime, rule: &AdjustmentRule, daylight_time: &DaylightTime) -> bool {
    let (start_delta, end_delta) = match time.kind() {
        DateTimeKind::Local => (daylight_time.delta, TimeSpan::ZERO),
        _ if rule.daylight_delta() > TimeSpan::ZERO => (rule.daylight_delta(), -rule.daylight_delta()),
        _ => (TimeSpan::ZERO, TimeSpan::ZERO),
    };

    let start = match rule.is_start_date_marker_for_beginning_of_year() {
        true => beginning_of_year(daylight_time.start.year()),
        false => daylight_time.start.saturating_add(start_delta),
    };

    let end = match rule.is_end_date_marker_for_end_of_year() {
        true => end_of_year(daylight_time.end.year()),
        false => daylight_time.end.saturating_add(end_delta),
    };

    let is_dst = check_is_dst(start, time, end, false, rule);

    if is_dst && time.kind() == DateTimeKind::Local && is_ambiguous(time, rule, daylight_time) {
        return time.is_ambiguous_daylight_saving_time();
    }

    is_dst
}

/// Check if a local time is in the repeated interval following the end of daylight saving time
pub(crate) fn is_ambiguous(time: DateTime, rule: &AdjustmentRule, daylight_time: &DaylightTime) -> bool {
    let delta = rule.daylight_delta();

    let (start, end) = match delta.cmp(&TimeSpan::ZERO) {
        Ordering::Equal => return false,
        Ordering::Greater if rule.is_end_date_marker_for_end_of_year() => return false,
        Ordering::Greater => (daylight_time.end.saturating_sub(delta), daylight_time.end),
        Ordering::Less if rule.is_start_date_marker_for_beginning_of_year() => return false,
        Ordering::Less => (daylight_time.start.saturating_add(delta), daylight_time.start),
    };

    in_interval_around_year_boundary(time, start, end)
}

/// Check if a local time is in the skipped interval following the start of daylight saving time
pub(crate) fn is_invalid(time: DateTime, rule: &AdjustmentRule, daylight_time: &DaylightTime) -> bool {
    let delta = rule.daylight_delta();

    let (start, end) = match delta.cmp(&TimeSpan::ZERO) {
        Ordering::Equal => return false,
        Ordering::Less if rule.is_end_date_marker_for_end_of_year() => return false,
        Ordering::Less => (daylight_time.end, daylight_time.end.saturating_sub(delta)),
        Ordering::Greater if rule.is_start_date_marker_for_beginning_of_year() => return false,
        Ordering::Greater => (daylight_time.start, daylight_time.start.saturating_add(delta)),
    };

    in_interval_around_year_boundary(time, start, end)
}

impl TimeZoneInfo {
    /// Convert a local time to UTC with the deltas of a rule
    fn convert_to_utc(&self, date_time: DateTime, daylight_delta: TimeSpan, base_utc_offset_delta: TimeSpan) -> DateTime {
        shift(date_time, -(self.base_utc_offset + daylight_delta + base_utc_offset_delta))
    }

    /// Convert a UTC time to local time with the deltas of a rule
    fn convert_from_utc(&self, date_time: DateTime, daylight_delta: TimeSpan, base_utc_offset_delta: TimeSpan) -> DateTime {
        shift(date_time, self.base_utc_offset + daylight_delta + base_utc_offset_delta)
    }

    /// Returns the rule preceding the rule of the specified index, or the rule itself for the first one
    pub(crate) fn previous_rule<'a>(&'a self, rule: &'a AdjustmentRule, rule_index: usize) -> &'a AdjustmentRule {
        match rule_index.checked_sub(1).and_then(|index| self.adjustment_rules.get(index)) {
            Some(previous) => previous,
            None => rule,
        }
    }

    /// Compare a rule to a date time, returning [`Ordering::Greater`] if the rule starts after it and [`Ordering::Less`] if the rule ends before it.
    ///
    /// Rule boundaries with a UTC kind are compared to the date time converted to UTC,
    /// using the deltas of the previous rule for the start boundary.
    fn compare_rule(&self, rule: &AdjustmentRule, previous: &AdjustmentRule, date_time: DateTime, date_only: DateTime, is_utc: bool) -> Ordering {
        let is_after_start = match rule.date_start().kind() {
            DateTimeKind::Utc => {
                let date_time = match is_utc {
                    true => date_time,
                    false => self.convert_to_utc(date_time, previous.daylight_delta(), previous.base_utc_offset_delta()),
                };
                date_time >= rule.date_start()
            }
            _ => date_only >= rule.date_start(),
        };

        if !is_after_start {
            return Ordering::Greater;
        }

        let is_before_end = match rule.date_end().kind() {
            DateTimeKind::Utc => {
                let date_time = match is_utc {
                    true => date_time,
                    false => self.convert_to_utc(date_time, rule.daylight_delta(), rule.base_utc_offset_delta()),
                };
                date_time <= rule.date_end()
            }
            _ => date_only <= rule.date_end(),
        };

        match is_before_end {
            true => Ordering::Equal,
            false => Ordering::Less,
        }
    }

    /// Find the adjustment rule covering a date time, with its index.
    ///
    /// A UTC date time is compared by its local date for rule boundaries without a UTC kind.
    pub(crate) fn adjustment_rule_for_time(&self, date_time: DateTime, is_utc: bool) -> Option<(usize, &AdjustmentRule)> {
        let rules = &*self.adjustment_rules;
        if rules.is_empty() {
            return None;
        }

        let date_only = match is_utc {
            true => date_time.saturating_add(self.base_utc_offset).date(),
            false => date_time.date(),
        };

        let (mut low, mut high) = (0, rules.len() - 1);
        while low <= high {
            let median = low + (high - low) / 2;
            let rule = &rules[median];
            let previous = self.previous_rule(rule, median);

            match self.compare_rule(rule, previous, date_time, date_only, is_utc) {
                Ordering::Equal => return Some((median, rule)),
                Ordering::Less => low = median + 1,
                Ordering::Greater => match median.checked_sub(1) {
                    Some(index) => high = index,
                    None => break,
                },
            }
        }

        None
    }

    /// Resolve the daylight saving time window of a rule for a year.
    ///
    /// Rules without daylight transitions span their whole date range, converted from UTC to local time.
    pub(crate) fn daylight_time(&self, year: i32, rule: &AdjustmentRule, rule_index: usize) -> DaylightTime {
        let (start, end) = match rule.no_daylight_transitions() {
            true => {
                let previous = self.previous_rule(rule, rule_index);
                (
                    self.convert_from_utc(rule.date_start(), previous.daylight_delta(), previous.base_utc_offset_delta()),
                    self.convert_from_utc(rule.date_end(), rule.daylight_delta(), rule.base_utc_offset_delta()),
                )
            }
            false => (rule.daylight_transition_start().to_date_time(year), rule.daylight_transition_end().to_date_time(year)),
        };

        DaylightTime { start, end, delta: rule.daylight_delta() }
    }

    /// Returns the rule covering a local time with its daylight saving time window for the year of the time
    pub(crate) fn rule_and_daylight_time(&self, time: DateTime) -> Option<(&AdjustmentRule, DaylightTime)> {
        let (index, rule) = self.adjustment_rule_for_time(time, false)?;
        Some((rule, self.daylight_time(time.year(), rule, index)))
    }

    /// Compute the offset from UTC of a local time.
    ///
    /// Invalid local times get the daylight offset of their rule.
    pub(crate) fn utc_offset_from_local(&self, time: DateTime) -> TimeSpan {
        let (rule, daylight_time) = match self.rule_and_daylight_time(time) {
            Some(found) => found,
            None => return self.base_utc_offset,
        };

        let offset = self.base_utc_offset + rule.base_utc_offset_delta();
        let in_daylight = is_daylight_saving(time, rule, &daylight_time) || is_invalid(time, rule, &daylight_time);
        match rule.has_daylight_saving() && in_daylight {
            true => offset + rule.daylight_delta(),
            false => offset,
        }
    }

    /// Compute the offset from UTC of a UTC time
    pub(crate) fn utc_offset_from_utc(&self, time: DateTime) -> UtcOffsetInfo {
        let (found, year) = if time.ticks() > MAX_DATE_ONLY_TICKS {
            (self.adjustment_rule_for_time(DateTime::MAX, false), 9999)
        } else if time.ticks() < MIN_DATE_ONLY_TICKS {
            (self.adjustment_rule_for_time(DateTime::MIN, false), 1)
        } else {
            (self.adjustment_rule_for_time(time, true), time.saturating_add(self.base_utc_offset).year())
        };

        let mut info = UtcOffsetInfo { offset: self.base_utc_offset, is_daylight_saving: false, is_ambiguous_local_dst: false };

        if let Some((index, rule)) = found {
            info.offset = info.offset + rule.base_utc_offset_delta();

            if rule.has_daylight_saving() {
                let (is_daylight_saving, is_ambiguous_local_dst) = self.is_daylight_saving_from_utc(time, year, rule, index);
                info.is_daylight_saving = is_daylight_saving;
                info.is_ambiguous_local_dst = is_ambiguous_local_dst;

                if is_daylight_saving {
                    info.offset = info.offset + rule.daylight_delta();
                }
            }
        }

        info
    }

    /// Check if a UTC time is in daylight saving time, and if its local time is the daylight saving occurrence of a repeated interval
    fn is_daylight_saving_from_utc(&self, time: DateTime, year: i32, rule: &AdjustmentRule, rule_index: usize) -> (bool, bool) {
        let daylight_time = self.daylight_time(year, rule, rule_index);
        let mut ignore_year_adjustment = false;

        let start_offset = match rule.no_daylight_transitions() {
            true => {
                let previous = self.previous_rule(rule, rule_index);
                self.base_utc_offset + previous.base_utc_offset_delta() + previous.daylight_delta()
            }
            false => self.base_utc_offset + rule.base_utc_offset_delta(),
        };

        let start = if rule.is_start_date_marker_for_beginning_of_year() && daylight_time.start.year() > 1 {
            match self.start_of_dst_if_year_ends_with_dst(daylight_time.start.year() - 1) {
                Some(start) => {
                    ignore_year_adjustment = true;
                    start
                }
                None => beginning_of_year(daylight_time.start.year()).saturating_sub(start_offset),
            }
        } else {
            daylight_time.start.saturating_sub(start_offset)
        };

        let end_offset = self.base_utc_offset + rule.base_utc_offset_delta() + rule.daylight_delta();

        let end = if rule.is_end_date_marker_for_end_of_year() && daylight_time.end.year() < 9999 {
            match self.end_of_dst_if_year_starts_with_dst(daylight_time.end.year() + 1) {
                Some(end) => {
                    ignore_year_adjustment = true;
                    end
                }
                None => end_of_year(daylight_time.end.year()).saturating_sub(end_offset),
            }
        } else {
            daylight_time.end.saturating_sub(end_offset)
        };

        let (ambiguous_start, ambiguous_end) = match daylight_time.delta > TimeSpan::ZERO {
            true => (end.saturating_sub(daylight_time.delta), end),
            false => (start, start.saturating_sub(daylight_time.delta)),
        };

        let is_dst = check_is_dst(start, time, end, ignore_year_adjustment, rule);
        let is_ambiguous_local_dst = is_dst && in_interval_around_year_boundary(time, ambiguous_start, ambiguous_end);

        (is_dst, is_ambiguous_local_dst)
    }

    /// Returns the UTC start of daylight saving time of a year, if daylight saving time lasts until the end of that year
    fn start_of_dst_if_year_ends_with_dst(&self, year: i32) -> Option<DateTime> {
        let end_of_year = DateTime::from_ymd(year, 12, 31).ok()?;
        let (index, rule) = self.adjustment_rule_for_time(end_of_year, false)?;

        match rule.is_end_date_marker_for_end_of_year() {
            true => {
                let daylight_time = self.daylight_time(year, rule, index);
                Some(daylight_time.start.saturating_sub(self.base_utc_offset + rule.base_utc_offset_delta()))
            }
            false => None,
        }
    }

    /// Returns the UTC end of daylight saving time of a year, if daylight saving time is in effect at the beginning of that year
    fn end_of_dst_if_year_starts_with_dst(&self, year: i32) -> Option<DateTime> {
        let start_of_year = DateTime::from_ymd(year, 1, 1).ok()?;
        let (index, rule) = self.adjustment_rule_for_time(start_of_year, false)?;

        match rule.is_start_date_marker_for_beginning_of_year() {
            true => {
                let daylight_time = self.daylight_time(year, rule, index);
                Some(daylight_time.end.saturating_sub(self.base_utc_offset + rule.base_utc_offset_delta() + rule.daylight_delta()))
            }
            false => None,
        }
    }
}
