//! Functions used for parsing a TZ string.

use std::str;

use super::Cursor;
use crate::datetime::{DateTime, DateTimeKind, DayOfWeek, TimeSpan, TICKS_PER_DAY, TICKS_PER_HOUR, TICKS_PER_SECOND};
use crate::error::{InvalidRuleError, TzStringError};
use crate::timezone::TransitionTime;
use crate::CUMUL_DAY_IN_MONTHS_NORMAL_YEAR;

/// Fields of a POSIX TZ string, as written in the string.
///
/// Offsets and times are kept as text, they are interpreted when building adjustment rules.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct PosixTz<'a> {
    /// Standard time designation
    pub(crate) std_name: &'a str,
    /// Standard time offset, positive west of Greenwich
    pub(crate) std_offset: &'a str,
    /// Daylight saving time designation
    pub(crate) dst_name: Option<&'a str>,
    /// Daylight saving time offset, positive west of Greenwich
    pub(crate) dst_offset: Option<&'a str>,
    /// Date of the daylight saving time start
    pub(crate) start: Option<&'a str>,
    /// Local time of the daylight saving time start
    pub(crate) start_time: Option<&'a str>,
    /// Date of the daylight saving time end
    pub(crate) end: Option<&'a str>,
    /// Local time of the daylight saving time end
    pub(crate) end_time: Option<&'a str>,
}

/// Transition rule day
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum RuleDay {
    /// Julian day in `[1, 365]`, without taking occasional Feb 29 into account, which is not referenceable
    Julian1WithoutLeap(u16),
    /// Zero-based Julian day in `[0, 365]`, taking occasional Feb 29 into account
    Julian0WithLeap(u16),
    /// Day represented by a month, a month week and a week day
    MonthWeekDay {
        /// Month in `[1, 12]`
        month: u8,
        /// Week of the month in `[1, 5]`, with `5` representing the last week of the month
        week: u8,
        /// Day of the week in `[0, 6]` from Sunday
        week_day: u8,
    },
}

impl RuleDay {
    /// Parse a transition rule day
    pub(crate) fn parse(date: &str) -> Result<Self, TzStringError> {
        let mut cursor = Cursor::new(date.as_bytes());

        let rule_day = match cursor.peek() {
            Some(b'M') => {
                cursor.read_exact(1)?;
                let month = cursor.read_int()?;
                cursor.read_tag(b".")?;
                let week = cursor.read_int()?;
                cursor.read_tag(b".")?;
                let week_day = cursor.read_int()?;
                Self::MonthWeekDay { month, week, week_day }
            }
            Some(b'J') => {
                cursor.read_exact(1)?;
                let julian_day_1 = cursor.read_int()?;
                if !(1..=365).contains(&julian_day_1) {
                    return Err(TzStringError::InvalidTzString("invalid rule day julian day"));
                }
                Self::Julian1WithoutLeap(julian_day_1)
            }
            _ => {
                let julian_day_0 = cursor.read_int()?;
                if julian_day_0 > 365 {
                    return Err(TzStringError::InvalidTzString("invalid rule day julian day"));
                }
                Self::Julian0WithLeap(julian_day_0)
            }
        };

        if !cursor.is_empty() {
            return Err(TzStringError::InvalidTzString("remaining data after parsing rule day"));
        }

        Ok(rule_day)
    }

    /// Construct the transition time occurring on this rule day.
    ///
    /// Returns `None` for a zero-based Julian day after February, since its month and day depend on the year.
    pub(crate) fn transition_time(&self, time_of_day: DateTime) -> Result<Option<TransitionTime>, InvalidRuleError> {
        match *self {
            Self::MonthWeekDay { month, week, week_day } => {
                let day_of_week = DayOfWeek::from_num_days_from_sunday(week_day).ok_or(InvalidRuleError("invalid rule day week day"))?;
                TransitionTime::create_floating_date_rule(time_of_day, month, week, day_of_week).map(Some)
            }
            Self::Julian1WithoutLeap(julian_day_1) => {
                let (month, day) = julian_day_to_month_day(julian_day_1);
                TransitionTime::create_fixed_date_rule(time_of_day, month, day).map(Some)
            }
            Self::Julian0WithLeap(julian_day_0) if julian_day_0 < 59 => {
                let (month, day) = julian_day_to_month_day(julian_day_0 + 1);
                TransitionTime::create_fixed_date_rule(time_of_day, month, day).map(Some)
            }
            Self::Julian0WithLeap(_) => Ok(None),
        }
    }
}

/// Convert a one-based day of a non-leap year to a month and a month day
fn julian_day_to_month_day(julian_day_1: u16) -> (u8, u8) {
    let julian_day_1 = i64::from(julian_day_1);
    let month_index = CUMUL_DAY_IN_MONTHS_NORMAL_YEAR.iter().rposition(|&days| days < julian_day_1).unwrap_or(0);
    let day = julian_day_1 - CUMUL_DAY_IN_MONTHS_NORMAL_YEAR[month_index];
    (month_index as u8 + 1, day as u8)
}

/// Parse a time zone designation, which is either quoted with `<...>` or alphabetic
fn parse_name<'a>(cursor: &mut Cursor<'a>) -> Result<&'a str, TzStringError> {
    let name = if cursor.read_optional_tag(b"<")? {
        let quoted = cursor.read_until(|&x| x == b'>')?;
        cursor.read_optional_tag(b">")?;
        quoted
    } else {
        cursor.read_until(|&x| x.is_ascii_digit() || x == b'+' || x == b'-' || x == b',')?
    };

    Ok(str::from_utf8(name)?)
}

/// Read the text of an offset
fn parse_offset_str<'a>(cursor: &mut Cursor<'a>) -> Result<&'a str, TzStringError> {
    let offset = cursor.read_while(|&x| x.is_ascii_digit() || x == b'+' || x == b'-' || x == b':')?;
    Ok(str::from_utf8(offset)?)
}

/// Read the text of a rule date and its optional time
fn parse_date_time<'a>(cursor: &mut Cursor<'a>) -> Result<(&'a str, Option<&'a str>), TzStringError> {
    let date = str::from_utf8(cursor.read_until(|&x| x == b'/' || x == b',')?)?;

    let time = match cursor.read_optional_tag(b"/")? {
        true => Some(str::from_utf8(cursor.read_until(|&x| x == b',')?)?),
        false => None,
    };

    Ok((date, time))
}

fn non_empty(value: &str) -> Option<&str> {
    match value.is_empty() {
        true => None,
        false => Some(value),
    }
}

/// Split a POSIX TZ string, as found in the footer of a TZif file, into its fields.
///
/// The standard time designation and offset are mandatory.
pub(crate) fn parse_posix_tz(tz_string: &str) -> Result<PosixTz<'_>, TzStringError> {
    let mut cursor = Cursor::new(tz_string.as_bytes());

    let std_name = parse_name(&mut cursor)?;
    let std_offset = parse_offset_str(&mut cursor)?;

    if std_name.is_empty() {
        return Err(TzStringError::InvalidTzString("missing standard time designation"));
    }
    if std_offset.is_empty() {
        return Err(TzStringError::InvalidTzString("missing standard time offset"));
    }

    let mut posix_tz = PosixTz { std_name, std_offset, dst_name: None, dst_offset: None, start: None, start_time: None, end: None, end_time: None };

    let dst_name = parse_name(&mut cursor)?;
    if dst_name.is_empty() {
        return Ok(posix_tz);
    }

    posix_tz.dst_name = Some(dst_name);
    posix_tz.dst_offset = non_empty(parse_offset_str(&mut cursor)?);

    if cursor.read_optional_tag(b",")? {
        let (start, start_time) = parse_date_time(&mut cursor)?;
        posix_tz.start = non_empty(start);
        posix_tz.start_time = start_time;

        if cursor.read_optional_tag(b",")? {
            let (end, end_time) = parse_date_time(&mut cursor)?;
            posix_tz.end = non_empty(end);
            posix_tz.end_time = end_time;
        }
    }

    Ok(posix_tz)
}

/// Largest number of hours of an offset or a rule time
const MAX_HOURS: i64 = 167;

/// Parse an offset or a time of the form `[+|-]h`, `[+|-]h:mm` or `[+|-]h:mm:ss`.
///
/// Plain hours may exceed a day, as in `M3.4.4/26`, but not a week.
pub(crate) fn parse_offset(offset: &str) -> Option<TimeSpan> {
    let (negative, unsigned) = match offset.as_bytes().first()? {
        b'-' => (true, &offset[1..]),
        b'+' => (false, &offset[1..]),
        _ => (false, offset),
    };

    let span = match unsigned.parse::<u32>() {
        Ok(hours) if i64::from(hours) > MAX_HOURS => return None,
        Ok(hours) => TimeSpan::from_hours(hours.into()),
        Err(_) => parse_clock_time(unsigned)?,
    };

    Some(if negative { -span } else { span })
}

/// Parse a clock time `h:mm[:ss[.fffffff]]`, optionally prefixed by a number of days `d:`
fn parse_clock_time(value: &str) -> Option<TimeSpan> {
    let fields: Vec<&str> = value.split(':').collect();

    let (days, hours, minutes, seconds) = match fields[..] {
        [hours, minutes] => ("0", hours, minutes, "0"),
        [hours, minutes, seconds] => ("0", hours, minutes, seconds),
        [days, hours, minutes, seconds] => (days, hours, minutes, seconds),
        _ => return None,
    };

    let parse_field = |field: &str| match !field.is_empty() && field.bytes().all(|x| x.is_ascii_digit()) {
        true => field.parse::<i64>().ok(),
        false => None,
    };

    let (seconds, fraction) = match seconds.split_once('.') {
        Some((seconds, fraction)) if (1..=7).contains(&fraction.len()) => (seconds, format!("{:0<7}", fraction)),
        Some(_) => return None,
        None => (seconds, "0".to_owned()),
    };

    let days = parse_field(days)?;
    let hours = parse_field(hours)?;
    let minutes = parse_field(minutes)?;
    let seconds = parse_field(seconds)?;
    let fraction = parse_field(fraction.as_str())?;

    if hours > 23 || minutes > 59 || seconds > 59 {
        return None;
    }

    let ticks = days.checked_mul(TICKS_PER_DAY)?.checked_add(TimeSpan::new(hours, minutes, seconds).ticks())?.checked_add(fraction)?;
    match ticks / TICKS_PER_HOUR <= MAX_HOURS {
        true => Some(TimeSpan::from_ticks(ticks)),
        false => None,
    }
}

/// Convert the time of a rule to a time of day on 0001-01-01.
///
/// Days are dropped and negative times wrap to the previous day. Missing or unparsable times default to 02:00.
pub(crate) fn parse_time_of_day(time: Option<&str>) -> DateTime {
    match time.and_then(parse_offset) {
        Some(offset) => {
            let ticks = offset.ticks() % TICKS_PER_DAY;
            let ticks = ticks - ticks % TICKS_PER_SECOND;
            let ticks = if ticks < 0 { TICKS_PER_DAY + ticks } else { ticks };
            DateTime::from_ticks_clamped(ticks, DateTimeKind::Unspecified)
        }
        None => DateTime::from_ticks_clamped(2 * TICKS_PER_HOUR, DateTimeKind::Unspecified),
    }
}

/// Construct the transition time described by a rule date and its optional time.
///
/// Returns `None` when the date is missing or not representable as a transition time.
pub(crate) fn transition_time(date: Option<&str>, time: Option<&str>) -> Result<Option<TransitionTime>, TzStringError> {
    let date = match date {
        Some(date) => date,
        None => return Ok(None),
    };

    Ok(RuleDay::parse(date)?.transition_time(parse_time_of_day(time))?)
}
