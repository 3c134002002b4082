//! Offset queries and conversions between time zones.

use super::daylight::{is_ambiguous, is_daylight_saving, is_invalid};
use super::{corresponding_kind, AdjustmentRule, TimeZoneInfo};
use crate::cache::ZoneCache;
use crate::datetime::{DateTime, DateTimeKind, TimeSpan};
use crate::error::Error;

/// Behavior of a conversion when the date time does not fit its source time zone
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum ConversionMode {
    /// Fail if the kind of the date time does not match the source time zone, or if the local time is invalid
    #[default]
    Strict,
    /// Convert invalid local times with their daylight offset, and ignore the kind of the date time
    NoThrowOnInvalidTime,
}

/// Convert a date time from a source time zone to a destination time zone.
///
/// `local` is the local time zone, used for date times with a [`DateTimeKind::Local`] kind.
pub(crate) fn convert_time(
    date_time: DateTime,
    source: &TimeZoneInfo,
    destination: &TimeZoneInfo,
    mode: ConversionMode,
    local: &TimeZoneInfo,
) -> Result<DateTime, Error> {
    if mode == ConversionMode::Strict {
        let source_kind = corresponding_kind(source, local);
        if date_time.kind() != DateTimeKind::Unspecified && date_time.kind() != source_kind {
            return Err(Error::Argument("kind of the date time does not match the source time zone"));
        }

        if source.is_invalid_local_time(date_time) {
            return Err(Error::InvalidTime("local time is skipped in the source time zone"));
        }
    }

    Ok(convert_time_unchecked(date_time, source, destination, local))
}

/// Convert a date time from a source time zone to a destination time zone, without checking it against the source time zone
pub(crate) fn convert_time_unchecked(date_time: DateTime, source: &TimeZoneInfo, destination: &TimeZoneInfo, local: &TimeZoneInfo) -> DateTime {
    let source_kind = corresponding_kind(source, local);
    let destination_kind = corresponding_kind(destination, local);

    if date_time.kind() != DateTimeKind::Unspecified && source_kind != DateTimeKind::Unspecified && source_kind == destination_kind {
        return date_time;
    }

    let utc_ticks = date_time.ticks().saturating_sub(source.utc_offset_from_local(date_time).ticks());
    let utc = DateTime::from_ticks_clamped(utc_ticks, DateTimeKind::Utc);

    let info = destination.utc_offset_from_utc(utc);
    let ticks = utc_ticks.saturating_add(info.offset.ticks());

    match destination_kind {
        DateTimeKind::Local => DateTime::local(ticks, info.is_ambiguous_local_dst),
        kind => DateTime::from_ticks_clamped(ticks, kind),
    }
}

impl TimeZoneInfo {
    /// Returns the rule covering a local time, for the ambiguous offsets computation.
    ///
    /// A rule with a constant standard offset is replaced by the previous rule, which holds the daylight saving offset.
    fn adjustment_rule_for_ambiguous_offsets(&self, time: DateTime) -> Option<(usize, &AdjustmentRule)> {
        let (index, rule) = self.adjustment_rule_for_time(time, false)?;

        match rule.no_daylight_transitions() && !rule.has_daylight_saving() {
            true => Some((index, self.previous_rule(rule, index))),
            false => Some((index, rule)),
        }
    }

    /// Check if a local time is invalid in this time zone, ignoring its kind
    pub(crate) fn is_invalid_local_time(&self, time: DateTime) -> bool {
        match self.rule_and_daylight_time(time) {
            Some((rule, daylight_time)) => rule.has_daylight_saving() && is_invalid(time, rule, &daylight_time),
            None => false,
        }
    }

    /// Returns the offset from UTC of a date time.
    ///
    /// Local and UTC date times are first converted to this time zone.
    /// Invalid local times get their daylight offset, and ambiguous local times get their standard offset unless flagged as daylight saving.
    pub fn get_utc_offset(&self, date_time: DateTime, cache: &ZoneCache) -> TimeSpan {
        match date_time.kind() {
            DateTimeKind::Local => {
                let local = cache.local();
                if corresponding_kind(self, &local) == DateTimeKind::Local {
                    return self.utc_offset_from_local(date_time);
                }

                let utc = convert_time_unchecked(date_time, &local, &TimeZoneInfo::utc(), &local);
                self.utc_offset_from_utc(utc).offset
            }
            DateTimeKind::Utc if self.is_utc() => self.base_utc_offset,
            DateTimeKind::Utc => self.utc_offset_from_utc(date_time).offset,
            DateTimeKind::Unspecified => self.utc_offset_from_local(date_time),
        }
    }

    /// Check if a date time is in daylight saving time in this time zone
    pub fn is_daylight_saving_time(&self, date_time: DateTime, cache: &ZoneCache) -> bool {
        if !self.supports_daylight_saving_time || self.adjustment_rules.is_empty() {
            return false;
        }

        let time = match date_time.kind() {
            DateTimeKind::Local => {
                let local = cache.local();
                convert_time_unchecked(date_time, &local, self, &local)
            }
            DateTimeKind::Utc if self.is_utc() => return false,
            DateTimeKind::Utc => return self.utc_offset_from_utc(date_time).is_daylight_saving,
            DateTimeKind::Unspecified => date_time,
        };

        match self.rule_and_daylight_time(time) {
            Some((rule, daylight_time)) => rule.has_daylight_saving() && is_daylight_saving(time, rule, &daylight_time),
            None => false,
        }
    }

    /// Check if a date time corresponds to a repeated local time in this time zone.
    ///
    /// Local and UTC date times are first converted to this time zone.
    pub fn is_ambiguous_time(&self, date_time: DateTime, cache: &ZoneCache) -> bool {
        if !self.supports_daylight_saving_time {
            return false;
        }

        let time = self.to_local_time(date_time, cache, ConversionMode::NoThrowOnInvalidTime).unwrap_or(date_time);

        match self.rule_and_daylight_time(time) {
            Some((rule, daylight_time)) => rule.has_daylight_saving() && is_ambiguous(time, rule, &daylight_time),
            None => false,
        }
    }

    /// Check if a date time is a skipped local time in this time zone.
    ///
    /// Only unspecified date times, and local date times when this is the local time zone, can be invalid.
    pub fn is_invalid_time(&self, date_time: DateTime, cache: &ZoneCache) -> bool {
        let applies = match date_time.kind() {
            DateTimeKind::Unspecified => true,
            DateTimeKind::Local => corresponding_kind(self, &cache.local()) == DateTimeKind::Local,
            DateTimeKind::Utc => false,
        };

        applies && self.is_invalid_local_time(date_time)
    }

    /// Returns the two possible offsets from UTC of an ambiguous date time, in ascending order.
    ///
    /// Fails if daylight saving time is not supported or if the date time is not ambiguous.
    pub fn get_ambiguous_time_offsets(&self, date_time: DateTime, cache: &ZoneCache) -> Result<[TimeSpan; 2], Error> {
        if !self.supports_daylight_saving_time {
            return Err(Error::Argument("date time is not ambiguous"));
        }

        let time = self.to_local_time(date_time, cache, ConversionMode::Strict)?;

        let rule = match self.adjustment_rule_for_ambiguous_offsets(time) {
            Some((index, rule)) if rule.has_daylight_saving() && is_ambiguous(time, rule, &self.daylight_time(time.year(), rule, index)) => rule,
            _ => return Err(Error::Argument("date time is not ambiguous")),
        };

        let standard_offset = self.base_utc_offset + rule.base_utc_offset_delta();
        let daylight_offset = standard_offset + rule.daylight_delta();

        match rule.daylight_delta() > TimeSpan::ZERO {
            true => Ok([standard_offset, daylight_offset]),
            false => Ok([daylight_offset, standard_offset]),
        }
    }

    /// Convert a local or UTC date time to this time zone, leaving unspecified date times unchanged
    fn to_local_time(&self, date_time: DateTime, cache: &ZoneCache, mode: ConversionMode) -> Result<DateTime, Error> {
        match date_time.kind() {
            DateTimeKind::Local => {
                let local = cache.local();
                convert_time(date_time, &local, self, mode, &local)
            }
            DateTimeKind::Utc => convert_time(date_time, &TimeZoneInfo::utc(), self, mode, &cache.local()),
            DateTimeKind::Unspecified => Ok(date_time),
        }
    }
}
