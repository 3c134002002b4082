//! Construction of adjustment rules from the content of a TZif file.

use super::adjustment_rule::{utc_offset_out_of_range, MAX_OFFSET, MIN_OFFSET};
use super::{AdjustmentRule, TransitionTime};
use crate::datetime::{DateTime, TimeSpan, TICKS_PER_MILLISECOND};
use crate::error::{InvalidRuleError, InvalidTimeZoneError, TzStringError};
use crate::parse::{parse_offset, parse_posix_tz, transition_time, LocalTimeType, TzFile};

/// Returns the offset of a local time type relative to the base offset of the time zone, truncated to whole minutes
pub(crate) fn relative_offset(offset: TimeSpan, base_utc_offset: TimeSpan) -> TimeSpan {
    (offset - base_utc_offset).truncate_to_minutes()
}

/// Convert a UT offset in seconds to a time span
pub(crate) fn ut_offset(local_time_type: &LocalTimeType) -> TimeSpan {
    TimeSpan::from_seconds(local_time_type.ut_offset().into())
}

/// Generate the ordered adjustment rules of a TZif file, covering the whole date range after the first transition.
///
/// A file without transitions has no adjustment rules.
pub(crate) fn generate_adjustment_rules(tz_file: &TzFile, base_utc_offset: TimeSpan) -> Result<Vec<AdjustmentRule>, InvalidTimeZoneError> {
    let transition_times = tz_file.transition_times();
    let mut rules = Vec::with_capacity(transition_times.len() + 1);

    let mut index = 0;
    while index <= transition_times.len() && !transition_times.is_empty() {
        // Transitions clamped to the smallest date time carry no information
        while index < transition_times.len() && transition_times[index] == DateTime::MIN {
            index += 1;
        }

        let rule = if index == 0 {
            let local_time_type = early_local_time_type(tz_file.local_time_types());
            let date_end = transition_times[0].saturating_sub(TimeSpan::from_ticks(1));
            flat_rule(DateTime::MIN, date_end, local_time_type, base_utc_offset, false)?
        } else if index < transition_times.len() {
            let local_time_type = span_local_time_type(tz_file, index - 1)?;
            let date_end = transition_times[index].saturating_sub(TimeSpan::from_ticks(1));
            flat_rule(transition_times[index - 1], date_end, local_time_type, base_utc_offset, true)?
        } else {
            let date_start = transition_times[index - 1];
            match tz_file.footer() {
                Some(footer) => posix_rule(footer, date_start, base_utc_offset)?,
                None => flat_rule(date_start, DateTime::MAX, span_local_time_type(tz_file, index - 1)?, base_utc_offset, true)?,
            }
        };

        rules.push(normalize_rule_offset(base_utc_offset, rule));

        index += 1;
    }

    Ok(rules)
}

/// Returns the local time type in effect before the first transition, which is the first standard time type if any
fn early_local_time_type(local_time_types: &[LocalTimeType]) -> &LocalTimeType {
    local_time_types.iter().find(|x| !x.is_dst()).unwrap_or(&local_time_types[0])
}

/// Returns the local time type of the span starting at a transition
fn span_local_time_type(tz_file: &TzFile, transition_index: usize) -> Result<&LocalTimeType, InvalidTimeZoneError> {
    tz_file.transition_local_time_type(transition_index).ok_or(InvalidTimeZoneError::InvalidRule(InvalidRuleError("invalid local time type index")))
}

/// Construct a rule with a constant offset over a span.
///
/// When `mark_daylight` is set, a daylight saving span is marked with a start transition just after the beginning of the year,
/// so that the rule is recognized as observing daylight saving time.
fn flat_rule(
    date_start: DateTime,
    date_end: DateTime,
    local_time_type: &LocalTimeType,
    base_utc_offset: TimeSpan,
    mark_daylight: bool,
) -> Result<AdjustmentRule, InvalidTimeZoneError> {
    let offset = relative_offset(ut_offset(local_time_type), base_utc_offset);

    let (daylight_delta, base_utc_offset_delta) = match local_time_type.is_dst() {
        true => (offset, TimeSpan::ZERO),
        false => (TimeSpan::ZERO, offset),
    };

    let daylight_transition_start = match local_time_type.is_dst() && mark_daylight {
        true => TransitionTime::create_fixed_date_rule(DateTime::MIN.saturating_add(TimeSpan::from_ticks(2 * TICKS_PER_MILLISECOND)), 1, 1)?,
        false => TransitionTime::default(),
    };

    Ok(AdjustmentRule::new(date_start, date_end, daylight_delta, daylight_transition_start, TransitionTime::default(), base_utc_offset_delta, true)?)
}

/// Construct the rule describing the transitions after the last one, from the POSIX TZ string footer.
///
/// Daylight saving time without usable transition dates is ignored.
fn posix_rule(footer: &str, date_start: DateTime, base_utc_offset: TimeSpan) -> Result<AdjustmentRule, InvalidTimeZoneError> {
    let posix_tz = parse_posix_tz(footer)?;

    let std_offset = parse_offset(posix_tz.std_offset).ok_or(TzStringError::InvalidTzString("invalid standard time offset"))?;
    let base_utc_offset_delta = relative_offset(-std_offset, base_utc_offset);

    let flat = || AdjustmentRule::new(date_start, DateTime::MAX, TimeSpan::ZERO, TransitionTime::default(), TransitionTime::default(), base_utc_offset_delta, true);

    if posix_tz.dst_name.is_none() {
        return Ok(flat()?);
    }

    let daylight_delta = match posix_tz.dst_offset {
        Some(dst_offset) => {
            let dst_offset = parse_offset(dst_offset).ok_or(TzStringError::InvalidTzString("invalid daylight saving time offset"))?;
            relative_offset(relative_offset(-dst_offset, base_utc_offset), base_utc_offset_delta)
        }
        None => TimeSpan::from_hours(1),
    };

    let start = transition_time(posix_tz.start, posix_tz.start_time)?;
    let end = transition_time(posix_tz.end, posix_tz.end_time)?;

    let rule = match (start, end) {
        (Some(start), Some(end)) => AdjustmentRule::new(date_start, DateTime::MAX, daylight_delta, start, end, base_utc_offset_delta, false)?,
        _ => {
            warn!("ignoring daylight saving time of TZ string {:?} without usable transition dates", footer);
            flat()?
        }
    };

    Ok(rule)
}

/// Returns the total offset of a rule, including its daylight delta if it observes daylight saving time
pub(crate) fn rule_utc_offset(base_utc_offset: TimeSpan, rule: &AdjustmentRule) -> TimeSpan {
    let daylight_delta = match rule.has_daylight_saving() {
        true => rule.daylight_delta(),
        false => TimeSpan::ZERO,
    };
    base_utc_offset + rule.base_utc_offset_delta() + daylight_delta
}

/// Bring the total offset of a rule back in `[-14h, 14h]` by adjusting its base offset delta
pub(crate) fn normalize_rule_offset(base_utc_offset: TimeSpan, rule: AdjustmentRule) -> AdjustmentRule {
    let utc_offset = rule_utc_offset(base_utc_offset, &rule);
    if !utc_offset_out_of_range(utc_offset) {
        return rule;
    }

    let adjustment = match utc_offset > MAX_OFFSET {
        true => MAX_OFFSET - utc_offset,
        false => MIN_OFFSET - utc_offset,
    };

    debug!("normalizing rule offset {} by {}", utc_offset, adjustment);
    rule.with_base_utc_offset_delta(rule.base_utc_offset_delta() + adjustment)
}
