//! Types related to a time zone.

mod adjustment_rule;
mod builder;
mod convert;
mod daylight;
mod serialization;
mod transition_time;

#[cfg(test)]
pub(crate) mod tests;

use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};
use std::{fmt, ptr};

use crate::datetime::{DateTime, DateTimeKind, TimeSpan};
use crate::error::{Error, InvalidRuleError, InvalidTimeZoneError};
use crate::parse::TzFile;

pub use adjustment_rule::AdjustmentRule;
pub use convert::ConversionMode;
pub use transition_time::TransitionTime;

pub(crate) use convert::{convert_time, convert_time_unchecked};

/// Id of the UTC time zone
pub(crate) const UTC_ID: &str = "UTC";
/// Standard name of the UTC time zone
const UTC_STANDARD_NAME: &str = "Coordinated Universal Time";
/// Display name of the UTC time zone
const UTC_DISPLAY_NAME: &str = "(UTC) Coordinated Universal Time";

/// Ids of time zone files describing UTC
const UTC_ALIASES: [&str; 8] = ["Etc/UTC", "Etc/UCT", "Etc/Universal", "Etc/Zulu", "UCT", "UTC", "Universal", "Zulu"];

/// Time zone, made of a base offset from UTC and of the adjustment rules describing its offset changes over time.
///
/// Adjustment rules are ordered and do not overlap. They are shared between clones of the time zone.
#[derive(Debug, Clone)]
pub struct TimeZoneInfo {
    /// Time zone id
    id: String,
    /// Standard offset from UTC
    base_utc_offset: TimeSpan,
    /// Display name
    display_name: String,
    /// Standard time name
    standard_name: String,
    /// Daylight saving time name, empty if daylight saving time is disabled
    daylight_name: String,
    /// `true` if the adjustment rules are used
    supports_daylight_saving_time: bool,
    /// Ordered adjustment rules
    adjustment_rules: Arc<[AdjustmentRule]>,
}

impl TimeZoneInfo {
    /// Construct a custom time zone without daylight saving time
    pub fn create_custom_time_zone(id: &str, base_utc_offset: TimeSpan, display_name: &str, standard_name: &str) -> Result<Self, Error> {
        Self::new(id, base_utc_offset, display_name, standard_name, standard_name, Vec::new(), false)
    }

    /// Construct a custom time zone with adjustment rules
    ///
    /// ## Inputs
    ///
    /// * `id`: Time zone id, which must not be empty
    /// * `base_utc_offset`: Standard offset from UTC, in whole minutes in `[-14h, 14h]`
    /// * `display_name`: Display name
    /// * `standard_name`: Standard time name
    /// * `daylight_name`: Daylight saving time name
    /// * `adjustment_rules`: Adjustment rules, in ascending order of their date range
    ///
    pub fn create_custom_time_zone_with_rules(
        id: &str,
        base_utc_offset: TimeSpan,
        display_name: &str,
        standard_name: &str,
        daylight_name: &str,
        adjustment_rules: &[AdjustmentRule],
    ) -> Result<Self, Error> {
        Self::new(id, base_utc_offset, display_name, standard_name, daylight_name, adjustment_rules.to_vec(), false)
    }

    /// Construct a custom time zone with adjustment rules, optionally disabling daylight saving time.
    ///
    /// When daylight saving time is disabled, the adjustment rules are kept but never applied.
    pub fn create_custom_time_zone_with_options(
        id: &str,
        base_utc_offset: TimeSpan,
        display_name: &str,
        standard_name: &str,
        daylight_name: &str,
        adjustment_rules: &[AdjustmentRule],
        disable_daylight_saving_time: bool,
    ) -> Result<Self, Error> {
        Self::new(id, base_utc_offset, display_name, standard_name, daylight_name, adjustment_rules.to_vec(), disable_daylight_saving_time)
    }

    pub(crate) fn new(
        id: &str,
        base_utc_offset: TimeSpan,
        display_name: &str,
        standard_name: &str,
        daylight_name: &str,
        adjustment_rules: Vec<AdjustmentRule>,
        disable_daylight_saving_time: bool,
    ) -> Result<Self, Error> {
        let rules_support_dst = validate(id, base_utc_offset, &adjustment_rules)?;

        Ok(Self {
            id: id.to_owned(),
            base_utc_offset,
            display_name: display_name.to_owned(),
            standard_name: standard_name.to_owned(),
            daylight_name: if disable_daylight_saving_time { String::new() } else { daylight_name.to_owned() },
            supports_daylight_saving_time: rules_support_dst && !disable_daylight_saving_time,
            adjustment_rules: adjustment_rules.into(),
        })
    }

    /// Construct the UTC time zone
    fn new_utc(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            base_utc_offset: TimeSpan::ZERO,
            display_name: UTC_DISPLAY_NAME.to_owned(),
            standard_name: UTC_STANDARD_NAME.to_owned(),
            daylight_name: UTC_STANDARD_NAME.to_owned(),
            supports_daylight_saving_time: false,
            adjustment_rules: Arc::new([]),
        }
    }

    /// Returns the process-wide UTC time zone
    pub fn utc() -> Arc<Self> {
        Arc::clone(utc_time_zone())
    }

    /// Returns `true` if this is the process-wide UTC time zone
    pub(crate) fn is_utc(&self) -> bool {
        ptr::eq(self, &**utc_time_zone())
    }

    /// Construct a time zone from the contents of a TZif file.
    ///
    /// If adjustment rules cannot be generated from the file, the time zone is constructed again with daylight saving time disabled.
    pub fn from_tz_data(id: &str, bytes: &[u8]) -> Result<Self, Error> {
        let now = DateTime::utc_now();

        match Self::from_tz_data_at(id, bytes, false, now) {
            Err(Error::InvalidTimeZone(error)) => {
                warn!("disabling daylight saving time of time zone {:?}: {}", id, error);
                Self::from_tz_data_at(id, bytes, true, now).map_err(|_| Error::InvalidTimeZone(error))
            }
            result => result,
        }
    }

    /// Construct a time zone from the contents of a TZif file, optionally disabling daylight saving time
    pub fn from_tz_data_with_options(id: &str, bytes: &[u8], disable_daylight_saving_time: bool) -> Result<Self, Error> {
        Self::from_tz_data_at(id, bytes, disable_daylight_saving_time, DateTime::utc_now())
    }

    /// Construct a time zone from the contents of a TZif file, taking names and base offset from the local time types in effect at `now`
    pub(crate) fn from_tz_data_at(id: &str, bytes: &[u8], disable_daylight_saving_time: bool, now: DateTime) -> Result<Self, Error> {
        if UTC_ALIASES.iter().any(|alias| alias.eq_ignore_ascii_case(id)) {
            return Ok(Self::new_utc(id));
        }

        let tz_file = TzFile::parse(bytes)?;

        let mut standard: Option<(TimeSpan, &str)> = None;
        let mut daylight_name: Option<&str> = None;

        for (index, &time) in tz_file.transition_times().iter().enumerate() {
            if time > now {
                break;
            }

            if let Some(local_time_type) = tz_file.transition_local_time_type(index) {
                match local_time_type.is_dst() {
                    true => daylight_name = Some(tz_file.designation(local_time_type)),
                    false => standard = Some((builder::ut_offset(local_time_type), tz_file.designation(local_time_type))),
                }
            }
        }

        let (base_utc_offset, standard_name) = match standard {
            Some(standard) => standard,
            None => {
                let local_time_type = &tz_file.local_time_types()[0];
                (builder::ut_offset(local_time_type), tz_file.designation(local_time_type))
            }
        };

        let daylight_name = daylight_name.unwrap_or(standard_name);
        let base_utc_offset = base_utc_offset.truncate_to_minutes();

        let adjustment_rules = match disable_daylight_saving_time {
            true => Vec::new(),
            false => builder::generate_adjustment_rules(&tz_file, base_utc_offset)?,
        };

        trace!("generated {} adjustment rules for time zone {:?}", adjustment_rules.len(), id);

        Self::new(id, base_utc_offset, &display_name(id, base_utc_offset), standard_name, daylight_name, adjustment_rules, disable_daylight_saving_time)
            .map_err(|error| match error {
                Error::InvalidRule(error) => Error::InvalidTimeZone(InvalidTimeZoneError::InvalidRule(error)),
                error => error,
            })
    }

    /// Returns time zone id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns standard offset from UTC
    pub fn base_utc_offset(&self) -> TimeSpan {
        self.base_utc_offset
    }

    /// Returns display name
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns standard time name
    pub fn standard_name(&self) -> &str {
        &self.standard_name
    }

    /// Returns daylight saving time name
    pub fn daylight_name(&self) -> &str {
        &self.daylight_name
    }

    /// Returns `true` if the time zone observes daylight saving time at some point
    pub fn supports_daylight_saving_time(&self) -> bool {
        self.supports_daylight_saving_time
    }

    /// Returns adjustment rules
    pub fn adjustment_rules(&self) -> &[AdjustmentRule] {
        &self.adjustment_rules
    }

    /// Returns `true` if both time zones have the same base offset and adjustment rules, regardless of their ids and names
    pub fn has_same_rules(&self, other: &Self) -> bool {
        self.base_utc_offset == other.base_utc_offset
            && self.supports_daylight_saving_time == other.supports_daylight_saving_time
            && self.adjustment_rules == other.adjustment_rules
    }
}

/// Returns the lazily constructed process-wide UTC time zone
fn utc_time_zone() -> &'static Arc<TimeZoneInfo> {
    static UTC: OnceLock<Arc<TimeZoneInfo>> = OnceLock::new();
    UTC.get_or_init(|| Arc::new(TimeZoneInfo::new_utc(UTC_ID)))
}

/// Format the display name of a time zone read from a TZif file
fn display_name(id: &str, base_utc_offset: TimeSpan) -> String {
    if base_utc_offset == TimeSpan::ZERO {
        return format!("(UTC) {}", id);
    }

    let sign = if base_utc_offset < TimeSpan::ZERO { '-' } else { '+' };
    format!("(UTC{}{:02}:{:02}) {}", sign, base_utc_offset.hours().abs(), base_utc_offset.minutes().abs(), id)
}

/// Check the parameters of a time zone, returning `true` if its adjustment rules can provide daylight saving time
fn validate(id: &str, base_utc_offset: TimeSpan, adjustment_rules: &[AdjustmentRule]) -> Result<bool, Error> {
    if id.is_empty() {
        return Err(Error::Argument("empty time zone id"));
    }
    if adjustment_rule::utc_offset_out_of_range(base_utc_offset) {
        return Err(InvalidRuleError("base offset out of range").into());
    }
    if !base_utc_offset.is_whole_minutes() {
        return Err(InvalidRuleError("base offset must be a whole number of minutes").into());
    }

    for (index, rule) in adjustment_rules.iter().enumerate() {
        if adjustment_rule::utc_offset_out_of_range(builder::rule_utc_offset(base_utc_offset, rule)) {
            return Err(InvalidRuleError("offset of adjustment rule out of range").into());
        }

        if let Some(previous) = index.checked_sub(1).map(|index| &adjustment_rules[index]) {
            if rule.date_start() <= previous.date_end() {
                return Err(InvalidRuleError("adjustment rules out of order").into());
            }
        }
    }

    Ok(!adjustment_rules.is_empty())
}

impl PartialEq for TimeZoneInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id.eq_ignore_ascii_case(&other.id) && self.has_same_rules(other)
    }
}

impl Eq for TimeZoneInfo {}

impl Hash for TimeZoneInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.id.bytes() {
            byte.to_ascii_lowercase().hash(state);
        }
    }
}

impl fmt::Display for TimeZoneInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}

/// Returns the kind of date times expressed in a time zone
pub(crate) fn corresponding_kind(time_zone: &TimeZoneInfo, local: &TimeZoneInfo) -> DateTimeKind {
    if time_zone.is_utc() {
        DateTimeKind::Utc
    } else if ptr::eq(time_zone, local) {
        DateTimeKind::Local
    } else {
        DateTimeKind::Unspecified
    }
}
