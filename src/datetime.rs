//! Types related to a date time.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Neg, Sub};
use std::time::SystemTime;
use std::fmt;

use crate::error::DateTimeError;
use crate::{CUMUL_DAY_IN_MONTHS_NORMAL_YEAR, DAY_IN_MONTHS_NORMAL_YEAR};

/// Number of ticks in one millisecond, a tick being 100 nanoseconds
pub(crate) const TICKS_PER_MILLISECOND: i64 = 10_000;
/// Number of ticks in one second
pub(crate) const TICKS_PER_SECOND: i64 = TICKS_PER_MILLISECOND * 1000;
/// Number of ticks in one minute
pub(crate) const TICKS_PER_MINUTE: i64 = TICKS_PER_SECOND * 60;
/// Number of ticks in one hour
pub(crate) const TICKS_PER_HOUR: i64 = TICKS_PER_MINUTE * 60;
/// Number of ticks in one day
pub(crate) const TICKS_PER_DAY: i64 = TICKS_PER_HOUR * 24;

/// Number of days in a normal year
const DAYS_PER_NORMAL_YEAR: i64 = 365;
/// Number of days in 4 years (including 1 leap year)
const DAYS_PER_4_YEARS: i64 = 4 * DAYS_PER_NORMAL_YEAR + 1;
/// Number of days in 100 years (including 24 leap years)
const DAYS_PER_100_YEARS: i64 = 25 * DAYS_PER_4_YEARS - 1;
/// Number of days in 400 years (including 97 leap years)
const DAYS_PER_400_YEARS: i64 = 4 * DAYS_PER_100_YEARS + 1;
/// Number of days from 0001-01-01 to 10000-01-01
const DAYS_TO_10000: i64 = 25 * DAYS_PER_400_YEARS - 366;
/// Number of days from 0001-01-01 to 1970-01-01
const DAYS_TO_1970: i64 = 4 * DAYS_PER_400_YEARS + 3 * DAYS_PER_100_YEARS + 17 * DAYS_PER_4_YEARS + DAYS_PER_NORMAL_YEAR;

/// Largest tick count, corresponding to 9999-12-31T23:59:59.9999999
pub(crate) const MAX_TICKS: i64 = DAYS_TO_10000 * TICKS_PER_DAY - 1;
/// Tick count of the Unix epoch
const UNIX_EPOCH_TICKS: i64 = DAYS_TO_1970 * TICKS_PER_DAY;

/// Kind of a date time, telling which time scale its ticks are expressed in
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DateTimeKind {
    /// Wall clock time of an unspecified time zone
    Unspecified,
    /// Coordinated Universal Time
    Utc,
    /// Wall clock time of the local time zone
    Local,
}

/// Day of the week
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DayOfWeek {
    /// Sunday
    Sunday,
    /// Monday
    Monday,
    /// Tuesday
    Tuesday,
    /// Wednesday
    Wednesday,
    /// Thursday
    Thursday,
    /// Friday
    Friday,
    /// Saturday
    Saturday,
}

impl DayOfWeek {
    /// Construct a day of the week from a number of days since Sunday in `[0, 6]`
    pub fn from_num_days_from_sunday(days: u8) -> Option<Self> {
        Some(match days {
            0 => Self::Sunday,
            1 => Self::Monday,
            2 => Self::Tuesday,
            3 => Self::Wednesday,
            4 => Self::Thursday,
            5 => Self::Friday,
            6 => Self::Saturday,
            _ => return None,
        })
    }

    /// Returns the number of days since Sunday, in `[0, 6]`
    pub fn num_days_from_sunday(self) -> u8 {
        self as u8
    }
}

/// Signed time interval, stored as a number of 100-nanosecond ticks
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TimeSpan {
    ticks: i64,
}

impl TimeSpan {
    /// Zero-length time interval
    pub const ZERO: Self = Self { ticks: 0 };

    /// Construct a time interval from a number of ticks
    pub const fn from_ticks(ticks: i64) -> Self {
        Self { ticks }
    }

    /// Construct a time interval from hours, minutes and seconds
    pub const fn new(hours: i64, minutes: i64, seconds: i64) -> Self {
        Self::from_ticks(hours * TICKS_PER_HOUR + minutes * TICKS_PER_MINUTE + seconds * TICKS_PER_SECOND)
    }

    /// Construct a time interval from a number of hours
    pub const fn from_hours(hours: i64) -> Self {
        Self::from_ticks(hours * TICKS_PER_HOUR)
    }

    /// Construct a time interval from a number of minutes
    pub const fn from_minutes(minutes: i64) -> Self {
        Self::from_ticks(minutes * TICKS_PER_MINUTE)
    }

    /// Construct a time interval from a number of seconds
    pub const fn from_seconds(seconds: i64) -> Self {
        Self::from_ticks(seconds * TICKS_PER_SECOND)
    }

    /// Construct a time interval from a number of milliseconds
    pub const fn from_milliseconds(milliseconds: i64) -> Self {
        Self::from_ticks(milliseconds * TICKS_PER_MILLISECOND)
    }

    /// Returns the number of ticks
    pub const fn ticks(&self) -> i64 {
        self.ticks
    }

    /// Returns the whole days component
    pub const fn days(&self) -> i64 {
        self.ticks / TICKS_PER_DAY
    }

    /// Returns the hours component, in `[-23, 23]`
    pub const fn hours(&self) -> i64 {
        (self.ticks / TICKS_PER_HOUR) % 24
    }

    /// Returns the minutes component, in `[-59, 59]`
    pub const fn minutes(&self) -> i64 {
        (self.ticks / TICKS_PER_MINUTE) % 60
    }

    /// Returns the seconds component, in `[-59, 59]`
    pub const fn seconds(&self) -> i64 {
        (self.ticks / TICKS_PER_SECOND) % 60
    }

    /// Returns the milliseconds component, in `[-999, 999]`
    pub const fn milliseconds(&self) -> i64 {
        (self.ticks / TICKS_PER_MILLISECOND) % 1000
    }

    /// Returns the interval length in whole minutes, truncated toward zero
    pub const fn total_minutes(&self) -> i64 {
        self.ticks / TICKS_PER_MINUTE
    }

    /// Returns `true` if the interval has no component below the minute
    pub const fn is_whole_minutes(&self) -> bool {
        self.ticks % TICKS_PER_MINUTE == 0
    }

    /// Drops the sub-minute part of the interval, truncating toward zero
    pub const fn truncate_to_minutes(&self) -> Self {
        Self::from_ticks(self.ticks - self.ticks % TICKS_PER_MINUTE)
    }
}

impl Neg for TimeSpan {
    type Output = Self;

    fn neg(self) -> Self {
        Self::from_ticks(-self.ticks)
    }
}

impl Add for TimeSpan {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_ticks(self.ticks + rhs.ticks)
    }
}

impl Sub for TimeSpan {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::from_ticks(self.ticks - rhs.ticks)
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let ticks = self.ticks.unsigned_abs();
        let sign = if self.ticks < 0 { "-" } else { "" };

        let days = ticks / TICKS_PER_DAY as u64;
        let hours = (ticks / TICKS_PER_HOUR as u64) % 24;
        let minutes = (ticks / TICKS_PER_MINUTE as u64) % 60;
        let seconds = (ticks / TICKS_PER_SECOND as u64) % 60;
        let fraction = ticks % TICKS_PER_SECOND as u64;

        f.write_str(sign)?;
        if days != 0 {
            write!(f, "{}.", days)?;
        }
        write!(f, "{:02}:{:02}:{:02}", hours, minutes, seconds)?;
        if fraction != 0 {
            write!(f, ".{:07}", fraction)?;
        }
        Ok(())
    }
}

/// Date time in the proleptic gregorian calendar, between 0001-01-01 and 9999-12-31, with a precision of 100 nanoseconds.
///
/// Date times are compared and hashed by their tick count only, the kind is not taken into account.
#[derive(Debug, Copy, Clone)]
pub struct DateTime {
    /// Number of ticks since 0001-01-01T00:00:00
    ticks: i64,
    /// Time scale of the ticks
    kind: DateTimeKind,
    /// For a local date time in a repeated interval, `true` if it refers to the daylight saving occurrence
    is_ambiguous_dst: bool,
}

impl DateTime {
    /// Smallest date time, 0001-01-01T00:00:00
    pub const MIN: Self = Self { ticks: 0, kind: DateTimeKind::Unspecified, is_ambiguous_dst: false };
    /// Largest date time, 9999-12-31T23:59:59.9999999
    pub const MAX: Self = Self { ticks: MAX_TICKS, kind: DateTimeKind::Unspecified, is_ambiguous_dst: false };

    /// Construct a date time
    ///
    /// ## Inputs
    ///
    /// * `year`: Year in `[1, 9999]`
    /// * `month`: Month in `[1, 12]`
    /// * `day`: Day of the month in `[1, 31]`
    /// * `hour`: Hours since midnight in `[0, 23]`
    /// * `minute`: Minutes in `[0, 59]`
    /// * `second`: Seconds in `[0, 59]`
    /// * `kind`: Time scale of the date time
    ///
    pub fn new(year: i32, month: u8, day: u8, hour: u8, minute: u8, second: u8, kind: DateTimeKind) -> Result<Self, DateTimeError> {
        if !(1..=9999).contains(&year) {
            return Err(DateTimeError("invalid year"));
        }
        if !(1..=12).contains(&month) {
            return Err(DateTimeError("invalid month"));
        }
        if !(1..=days_in_month(year, month)).contains(&day) {
            return Err(DateTimeError("invalid month day"));
        }
        if hour > 23 {
            return Err(DateTimeError("invalid hour"));
        }
        if minute > 59 {
            return Err(DateTimeError("invalid minute"));
        }
        if second > 59 {
            return Err(DateTimeError("invalid second"));
        }

        let time = i64::from(hour) * TICKS_PER_HOUR + i64::from(minute) * TICKS_PER_MINUTE + i64::from(second) * TICKS_PER_SECOND;
        Ok(Self::from_ticks_unchecked(date_to_days(year, month, day) * TICKS_PER_DAY + time, kind))
    }

    /// Construct a date time at midnight with an unspecified kind
    pub fn from_ymd(year: i32, month: u8, day: u8) -> Result<Self, DateTimeError> {
        Self::new(year, month, day, 0, 0, 0, DateTimeKind::Unspecified)
    }

    /// Construct a date time from a number of ticks since 0001-01-01T00:00:00
    pub fn from_ticks(ticks: i64, kind: DateTimeKind) -> Result<Self, DateTimeError> {
        if !(0..=MAX_TICKS).contains(&ticks) {
            return Err(DateTimeError("ticks out of range"));
        }
        Ok(Self::from_ticks_unchecked(ticks, kind))
    }

    /// Construct a date time from a number of ticks, clamping it to the supported range
    pub(crate) fn from_ticks_clamped(ticks: i64, kind: DateTimeKind) -> Self {
        Self::from_ticks_unchecked(ticks.clamp(0, MAX_TICKS), kind)
    }

    /// Construct a local date time, remembering if it is the daylight saving occurrence of a repeated interval
    pub(crate) fn local(ticks: i64, is_ambiguous_dst: bool) -> Self {
        Self { ticks: ticks.clamp(0, MAX_TICKS), kind: DateTimeKind::Local, is_ambiguous_dst }
    }

    const fn from_ticks_unchecked(ticks: i64, kind: DateTimeKind) -> Self {
        Self { ticks, kind, is_ambiguous_dst: false }
    }

    /// Construct a UTC date time from a Unix time in seconds
    pub fn from_unix_time(unix_time: i64) -> Result<Self, DateTimeError> {
        let ticks = unix_time
            .checked_mul(TICKS_PER_SECOND)
            .and_then(|ticks| ticks.checked_add(UNIX_EPOCH_TICKS))
            .ok_or(DateTimeError("out of range Unix time"))?;

        Self::from_ticks(ticks, DateTimeKind::Utc)
    }

    /// Returns the current UTC date time
    pub fn utc_now() -> Self {
        let ticks = match SystemTime::now().duration_since(SystemTime::UNIX_EPOCH) {
            Ok(duration) => UNIX_EPOCH_TICKS.saturating_add((duration.as_nanos() / 100).min(MAX_TICKS as u128) as i64),
            Err(error) => UNIX_EPOCH_TICKS.saturating_sub((error.duration().as_nanos() / 100).min(MAX_TICKS as u128) as i64),
        };
        Self::from_ticks_clamped(ticks, DateTimeKind::Utc)
    }

    /// Returns the number of ticks since 0001-01-01T00:00:00
    pub fn ticks(&self) -> i64 {
        self.ticks
    }

    /// Returns the kind
    pub fn kind(&self) -> DateTimeKind {
        self.kind
    }

    /// Returns a copy of the date time with the specified kind
    pub fn with_kind(&self, kind: DateTimeKind) -> Self {
        Self::from_ticks_unchecked(self.ticks, kind)
    }

    /// Returns `true` if this local date time lies in a repeated interval and refers to its daylight saving occurrence
    pub fn is_ambiguous_daylight_saving_time(&self) -> bool {
        self.kind == DateTimeKind::Local && self.is_ambiguous_dst
    }

    /// Returns the year
    pub fn year(&self) -> i32 {
        days_to_date(self.days()).0
    }

    /// Returns the month in `[1, 12]`
    pub fn month(&self) -> u8 {
        days_to_date(self.days()).1
    }

    /// Returns the day of the month in `[1, 31]`
    pub fn day(&self) -> u8 {
        days_to_date(self.days()).2
    }

    /// Returns the hours since midnight
    pub fn hour(&self) -> u8 {
        ((self.ticks / TICKS_PER_HOUR) % 24) as u8
    }

    /// Returns the minutes
    pub fn minute(&self) -> u8 {
        ((self.ticks / TICKS_PER_MINUTE) % 60) as u8
    }

    /// Returns the seconds
    pub fn second(&self) -> u8 {
        ((self.ticks / TICKS_PER_SECOND) % 60) as u8
    }

    /// Returns the milliseconds
    pub fn millisecond(&self) -> u16 {
        ((self.ticks / TICKS_PER_MILLISECOND) % 1000) as u16
    }

    /// Returns the day of the week
    pub fn day_of_week(&self) -> DayOfWeek {
        // 0001-01-01 is a Monday
        match DayOfWeek::from_num_days_from_sunday(((self.days() + 1) % 7) as u8) {
            Some(day_of_week) => day_of_week,
            None => DayOfWeek::Sunday,
        }
    }

    /// Returns the date part, at midnight, with the same kind
    pub fn date(&self) -> Self {
        Self::from_ticks_unchecked(self.ticks - self.ticks % TICKS_PER_DAY, self.kind)
    }

    /// Returns the time elapsed since midnight
    pub fn time_of_day(&self) -> TimeSpan {
        TimeSpan::from_ticks(self.ticks % TICKS_PER_DAY)
    }

    /// Add a time interval, returning `None` if the result is out of range
    pub fn checked_add(&self, span: TimeSpan) -> Option<Self> {
        let ticks = self.ticks.checked_add(span.ticks())?;
        match (0..=MAX_TICKS).contains(&ticks) {
            true => Some(Self { ticks, ..*self }),
            false => None,
        }
    }

    /// Subtract a time interval, returning `None` if the result is out of range
    pub fn checked_sub(&self, span: TimeSpan) -> Option<Self> {
        self.checked_add(-span)
    }

    /// Add a time interval, clamping the result to [`DateTime::MIN`] and [`DateTime::MAX`]
    pub fn saturating_add(&self, span: TimeSpan) -> Self {
        Self { ticks: self.ticks.saturating_add(span.ticks()).clamp(0, MAX_TICKS), ..*self }
    }

    /// Subtract a time interval, clamping the result to [`DateTime::MIN`] and [`DateTime::MAX`]
    pub fn saturating_sub(&self, span: TimeSpan) -> Self {
        self.saturating_add(-span)
    }

    /// Add a number of days, returning `None` if the result is out of range
    pub fn checked_add_days(&self, days: i64) -> Option<Self> {
        self.checked_add(TimeSpan::from_ticks(days.checked_mul(TICKS_PER_DAY)?))
    }

    /// Add a number of years, returning `None` if the result is out of range.
    ///
    /// February 29 is mapped to February 28 when the resulting year is not a leap year.
    pub fn checked_add_years(&self, years: i32) -> Option<Self> {
        let (year, month, day) = days_to_date(self.days());
        let year = year.checked_add(years)?;
        if !(1..=9999).contains(&year) {
            return None;
        }

        let day = day.min(days_in_month(year, month));
        let ticks = date_to_days(year, month, day) * TICKS_PER_DAY + self.ticks % TICKS_PER_DAY;
        Some(Self { ticks, ..*self })
    }

    /// Add a number of years, clamping the result to [`DateTime::MIN`] and [`DateTime::MAX`]
    pub(crate) fn saturating_add_years(&self, years: i32) -> Self {
        match self.checked_add_years(years) {
            Some(date_time) => date_time,
            None if years < 0 => Self { ticks: 0, ..*self },
            None => Self { ticks: MAX_TICKS, ..*self },
        }
    }

    /// Returns the time interval elapsed since another date time, ignoring kinds
    pub fn since(&self, other: &Self) -> TimeSpan {
        TimeSpan::from_ticks(self.ticks - other.ticks)
    }

    /// Returns the number of days since 0001-01-01
    fn days(&self) -> i64 {
        self.ticks / TICKS_PER_DAY
    }
}

impl PartialEq for DateTime {
    fn eq(&self, other: &Self) -> bool {
        self.ticks == other.ticks
    }
}

impl Eq for DateTime {}

impl PartialOrd for DateTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DateTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ticks.cmp(&other.ticks)
    }
}

impl Hash for DateTime {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ticks.hash(state);
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (year, month, day) = days_to_date(self.days());
        write!(f, "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}", year, month, day, self.hour(), self.minute(), self.second())?;

        let fraction = self.ticks % TICKS_PER_SECOND;
        if fraction != 0 {
            write!(f, ".{:07}", fraction)?;
        }

        match self.kind {
            DateTimeKind::Utc => f.write_str("Z"),
            _ => Ok(()),
        }
    }
}

/// Check if a year is a leap year
pub(crate) fn is_leap_year(year: i32) -> bool {
    year % 400 == 0 || (year % 4 == 0 && year % 100 != 0)
}

/// Returns the number of days in a month, with `month` in `[1, 12]`
pub(crate) fn days_in_month(year: i32, month: u8) -> u8 {
    let index = usize::from(month.clamp(1, 12)) - 1;
    let days = DAY_IN_MONTHS_NORMAL_YEAR[index] as u8;
    match month == 2 && is_leap_year(year) {
        true => days + 1,
        false => days,
    }
}

/// Compute the number of days since 0001-01-01 of a valid date
fn date_to_days(year: i32, month: u8, day: u8) -> i64 {
    let previous_years = i64::from(year) - 1;
    let mut days = previous_years * DAYS_PER_NORMAL_YEAR + previous_years / 4 - previous_years / 100 + previous_years / 400;

    days += CUMUL_DAY_IN_MONTHS_NORMAL_YEAR[usize::from(month) - 1] + i64::from(day) - 1;
    if month > 2 && is_leap_year(year) {
        days += 1;
    }

    days
}

/// Compute the year, month and day of a number of days since 0001-01-01
fn days_to_date(days: i64) -> (i32, u8, u8) {
    let mut remaining_days = days;

    let cycles_400_years = remaining_days / DAYS_PER_400_YEARS;
    remaining_days -= cycles_400_years * DAYS_PER_400_YEARS;

    let cycles_100_years = (remaining_days / DAYS_PER_100_YEARS).min(3);
    remaining_days -= cycles_100_years * DAYS_PER_100_YEARS;

    let cycles_4_years = remaining_days / DAYS_PER_4_YEARS;
    remaining_days -= cycles_4_years * DAYS_PER_4_YEARS;

    let remaining_years = (remaining_days / DAYS_PER_NORMAL_YEAR).min(3);
    remaining_days -= remaining_years * DAYS_PER_NORMAL_YEAR;

    let year = (1 + cycles_400_years * 400 + cycles_100_years * 100 + cycles_4_years * 4 + remaining_years) as i32;

    let mut month = 1;
    while month < 12 {
        let next_month_start = CUMUL_DAY_IN_MONTHS_NORMAL_YEAR[month]
            + if month >= 2 && is_leap_year(year) { 1 } else { 0 };
        if remaining_days < next_month_start {
            break;
        }
        month += 1;
    }

    let month_start = CUMUL_DAY_IN_MONTHS_NORMAL_YEAR[month - 1] + if month > 2 && is_leap_year(year) { 1 } else { 0 };
    (year, month as u8, (remaining_days - month_start + 1) as u8)
}
