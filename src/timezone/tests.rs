use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::*;
use crate::cache::ZoneCache;
use crate::datetime::DayOfWeek;
use crate::system::Config;

/// TZif file of Pacific/Honolulu
pub(crate) const HONOLULU_TZ_DATA: &[u8] = b"TZif2\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\x06\0\0\0\x06\0\0\0\0\0\0\0\x07\0\0\0\x06\0\0\0\x14\x80\0\0\0\xbb\x05\x43\x48\xbb\x21\x71\x58\xcb\x89\x3d\xc8\xd2\x23\xf4\x70\xd2\x61\x49\x38\xd5\x8d\x73\x48\x01\x02\x01\x03\x04\x01\x05\xff\xff\x6c\x02\0\0\xff\xff\x6c\x58\0\x04\xff\xff\x7a\x68\x01\x08\xff\xff\x7a\x68\x01\x0c\xff\xff\x7a\x68\x01\x10\xff\xff\x73\x60\0\x04LMT\0HST\0HDT\0HWT\0HPT\0\0\0\0\0\x01\0\0\0\0\0\x01\0TZif2\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\x06\0\0\0\x06\0\0\0\0\0\0\0\x07\0\0\0\x06\0\0\0\x14\xff\xff\xff\xff\x74\xe0\x70\xbe\xff\xff\xff\xff\xbb\x05\x43\x48\xff\xff\xff\xff\xbb\x21\x71\x58\xff\xff\xff\xff\xcb\x89\x3d\xc8\xff\xff\xff\xff\xd2\x23\xf4\x70\xff\xff\xff\xff\xd2\x61\x49\x38\xff\xff\xff\xff\xd5\x8d\x73\x48\x01\x02\x01\x03\x04\x01\x05\xff\xff\x6c\x02\0\0\xff\xff\x6c\x58\0\x04\xff\xff\x7a\x68\x01\x08\xff\xff\x7a\x68\x01\x0c\xff\xff\x7a\x68\x01\x10\xff\xff\x73\x60\0\x04LMT\0HST\0HDT\0HWT\0HPT\0\0\0\0\0\x01\0\0\0\0\0\x01\0\x0aHST10\x0a";

/// `America/Caracas`, whose standard offset moved from -04:00 to -04:30 in 2007 and back in 2016
const CARACAS_TZ_DATA: &[u8] = b"TZif2\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\x06\0\0\0\x04\0\0\0\x12\x80\0\0\0\x93\x1e\x2c\x3c\xf6\x98\xecHG\x5b\x92pW\x25\xa9p\x7f\xff\xff\xff\x01\x02\x03\x02\x03\x03\xff\xff\xc1\x40\0\0\xff\xff\xc1D\0\x04\xff\xff\xc0\xb8\0\x08\xff\xff\xc7\xc0\0\x0eLMT\0CMT\0\x2d0430\0\x2d04\0TZif2\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\x06\0\0\0\x04\0\0\0\x12\xff\xff\xff\xffi\x87\x1a\x40\xff\xff\xff\xff\x93\x1e\x2c\x3c\xff\xff\xff\xff\xf6\x98\xecH\0\0\0\0G\x5b\x92p\0\0\0\0W\x25\xa9p\0\0\0\0\x7f\xff\xff\xff\x01\x02\x03\x02\x03\x03\xff\xff\xc1\x40\0\0\xff\xff\xc1D\0\x04\xff\xff\xc0\xb8\0\x08\xff\xff\xc7\xc0\0\x0eLMT\0CMT\0\x2d0430\0\x2d04\0\x0a\x3c\x2d04\x3e4\x0a";

/// Build a version 2 TZif file from its transitions, as Unix times with local time type indices, and from its local time types
pub(crate) fn tz_data(transitions: &[(i64, u8)], local_time_types: &[(i32, bool, &str)], footer: &str) -> Vec<u8> {
    fn write_header(bytes: &mut Vec<u8>, counts: [usize; 6]) {
        bytes.extend_from_slice(b"TZif2");
        bytes.extend_from_slice(&[0; 15]);
        for count in counts {
            bytes.extend_from_slice(&(count as u32).to_be_bytes());
        }
    }

    let mut types = Vec::new();
    let mut designations = Vec::new();
    for &(ut_offset, is_dst, designation) in local_time_types {
        types.extend_from_slice(&ut_offset.to_be_bytes());
        types.push(u8::from(is_dst));
        types.push(designations.len() as u8);
        designations.extend_from_slice(designation.as_bytes());
        designations.push(0);
    }

    let mut bytes = Vec::new();

    // Minimal 32-bit data block
    write_header(&mut bytes, [0, 0, 0, 0, 1, 1]);
    bytes.extend_from_slice(&[0; 7]);

    write_header(&mut bytes, [0, 0, 0, transitions.len(), local_time_types.len(), designations.len()]);
    for &(unix_time, _) in transitions {
        bytes.extend_from_slice(&unix_time.to_be_bytes());
    }
    for &(_, index) in transitions {
        bytes.push(index);
    }
    bytes.extend_from_slice(&types);
    bytes.extend_from_slice(&designations);

    bytes.push(b'\n');
    bytes.extend_from_slice(footer.as_bytes());
    bytes.push(b'\n');

    bytes
}

/// Build a TZif file with a single local time type
pub(crate) fn fixed_tz_data(ut_offset: i32) -> Vec<u8> {
    tz_data(&[], &[(ut_offset, false, "FIX")], "")
}

/// TZif file of a New York time zone starting in 2006, with the 2007 rules as footer
fn new_york_tz_data() -> Vec<u8> {
    tz_data(
        &[(1162101600, 0), (1173596400, 1), (1194156000, 0)],
        &[(-18000, false, "EST"), (-14400, true, "EDT")],
        "EST5EDT,M3.2.0,M11.1.0",
    )
}

fn now() -> Result<DateTime, Error> {
    Ok(DateTime::new(2024, 1, 1, 0, 0, 0, DateTimeKind::Utc)?)
}

fn local(year: i32, month: u8, day: u8, hour: u8, minute: u8) -> Result<DateTime, Error> {
    Ok(DateTime::new(year, month, day, hour, minute, 0, DateTimeKind::Unspecified)?)
}

fn utc(year: i32, month: u8, day: u8, hour: u8, minute: u8) -> Result<DateTime, Error> {
    Ok(DateTime::new(year, month, day, hour, minute, 0, DateTimeKind::Utc)?)
}

fn at(hour: u8) -> Result<DateTime, Error> {
    Ok(DateTime::new(1, 1, 1, hour, 0, 0, DateTimeKind::Unspecified)?)
}

fn cache() -> ZoneCache {
    ZoneCache::new(Config::new("/nonexistent").with_tz(Some("")))
}

fn to_utc(time_zone: &TimeZoneInfo, date_time: DateTime) -> Result<DateTime, Error> {
    convert_time(date_time, time_zone, &TimeZoneInfo::utc(), ConversionMode::Strict, &TimeZoneInfo::utc())
}

fn from_utc(time_zone: &TimeZoneInfo, date_time: DateTime) -> Result<DateTime, Error> {
    convert_time(date_time, &TimeZoneInfo::utc(), time_zone, ConversionMode::Strict, &TimeZoneInfo::utc())
}

/// US rules since 2007, as a custom time zone
fn us_eastern() -> Result<TimeZoneInfo, Error> {
    let rule = AdjustmentRule::create(
        DateTime::from_ymd(2007, 1, 1)?,
        DateTime::MAX,
        TimeSpan::from_hours(1),
        TransitionTime::create_floating_date_rule(at(2)?, 3, 2, DayOfWeek::Sunday)?,
        TransitionTime::create_floating_date_rule(at(2)?, 11, 1, DayOfWeek::Sunday)?,
    )?;

    TimeZoneInfo::create_custom_time_zone_with_rules("Test/Eastern", TimeSpan::from_hours(-5), "(UTC-05:00) Eastern", "EST", "EDT", &[rule])
}

/// Southern hemisphere rules, with daylight saving time across the end of the year
fn australia_eastern() -> Result<TimeZoneInfo, Error> {
    let rule = AdjustmentRule::create(
        DateTime::from_ymd(2008, 1, 1)?,
        DateTime::MAX.date(),
        TimeSpan::from_hours(1),
        TransitionTime::create_floating_date_rule(at(2)?, 10, 1, DayOfWeek::Sunday)?,
        TransitionTime::create_floating_date_rule(at(3)?, 4, 1, DayOfWeek::Sunday)?,
    )?;

    TimeZoneInfo::create_custom_time_zone_with_rules("Test/Sydney", TimeSpan::from_hours(10), "(UTC+10:00) Sydney", "AEST", "AEDT", &[rule])
}

/// Check that converting local times to UTC and back is the identity, outside of invalid and ambiguous times
fn assert_round_trip(time_zone: &TimeZoneInfo, start: DateTime, end: DateTime, step: TimeSpan) -> Result<(), Error> {
    let cache = cache();
    let mut time = start;

    while time < end {
        if !time_zone.is_invalid_time(time, &cache) && !time_zone.is_ambiguous_time(time, &cache) {
            let utc = to_utc(time_zone, time)?;
            assert_eq!(utc.kind(), DateTimeKind::Utc);
            assert_eq!(from_utc(time_zone, utc)?, time, "{}", time);
        }
        time = time.saturating_add(step);
    }

    Ok(())
}

/// Find the rule covering a UTC time by scanning every rule
fn linear_rule_for_utc(time_zone: &TimeZoneInfo, time: DateTime) -> Option<usize> {
    let date_only = time.saturating_add(time_zone.base_utc_offset()).date();
    let compared = |boundary: DateTime| match boundary.kind() {
        DateTimeKind::Utc => time,
        _ => date_only,
    };

    let found: Vec<_> = time_zone
        .adjustment_rules()
        .iter()
        .enumerate()
        .filter(|(_, rule)| compared(rule.date_start()) >= rule.date_start() && compared(rule.date_end()) <= rule.date_end())
        .map(|(index, _)| index)
        .collect();

    assert!(found.len() <= 1);
    found.first().copied()
}

#[test]
fn test_honolulu() -> Result<(), Error> {
    let time_zone = TimeZoneInfo::from_tz_data_at("Pacific/Honolulu", HONOLULU_TZ_DATA, false, now()?)?;

    assert_eq!(time_zone.id(), "Pacific/Honolulu");
    assert_eq!(time_zone.base_utc_offset(), TimeSpan::from_hours(-10));
    assert_eq!(time_zone.standard_name(), "HST");
    assert_eq!(time_zone.daylight_name(), "HPT");
    assert_eq!(time_zone.display_name(), "(UTC-10:00) Pacific/Honolulu");
    assert_eq!(time_zone.to_string(), "(UTC-10:00) Pacific/Honolulu");
    assert!(time_zone.supports_daylight_saving_time());

    let rules = time_zone.adjustment_rules();
    assert_eq!(rules.len(), 8);

    assert_eq!(rules[0].date_start(), DateTime::MIN);
    assert_eq!(rules[0].base_utc_offset_delta(), TimeSpan::from_minutes(-31));
    assert_eq!(rules[0].daylight_delta(), TimeSpan::ZERO);
    assert!(rules[0].no_daylight_transitions());

    assert_eq!(rules[2].date_start(), utc(1933, 4, 30, 12, 30)?);
    assert_eq!(rules[2].daylight_delta(), TimeSpan::from_minutes(30));

    assert_eq!(rules[7].date_start(), utc(1947, 6, 8, 12, 30)?);
    assert_eq!(rules[7].date_end(), DateTime::MAX);
    assert_eq!(rules[7].base_utc_offset_delta(), TimeSpan::ZERO);
    assert!(rules[7].no_daylight_transitions());

    let cache = cache();
    assert_eq!(time_zone.get_utc_offset(local(1900, 1, 1, 0, 0)?, &cache), TimeSpan::new(-10, -30, 0));
    assert_eq!(time_zone.get_utc_offset(local(1933, 5, 10, 0, 0)?, &cache), TimeSpan::new(-9, -30, 0));
    assert_eq!(time_zone.get_utc_offset(local(1940, 1, 1, 0, 0)?, &cache), TimeSpan::new(-10, -30, 0));
    assert_eq!(time_zone.get_utc_offset(local(1943, 6, 1, 0, 0)?, &cache), TimeSpan::new(-9, -30, 0));
    assert_eq!(time_zone.get_utc_offset(local(2024, 7, 1, 0, 0)?, &cache), TimeSpan::from_hours(-10));
    assert_eq!(time_zone.get_utc_offset(local(1850, 1, 1, 0, 0)?, &cache), TimeSpan::new(-10, -31, 0));

    assert!(time_zone.is_daylight_saving_time(local(1933, 5, 10, 0, 0)?, &cache));
    assert!(!time_zone.is_daylight_saving_time(local(2024, 7, 1, 0, 0)?, &cache));

    assert_eq!(from_utc(&time_zone, utc(1933, 5, 10, 12, 0)?)?, local(1933, 5, 10, 2, 30)?);
    assert_eq!(from_utc(&time_zone, utc(2024, 7, 1, 12, 0)?)?, local(2024, 7, 1, 2, 0)?);

    Ok(())
}

#[test]
fn test_caracas() -> Result<(), Error> {
    let time_zone = TimeZoneInfo::from_tz_data_at("America/Caracas", CARACAS_TZ_DATA, false, now()?)?;

    assert_eq!(time_zone.base_utc_offset(), TimeSpan::from_hours(-4));
    assert_eq!(time_zone.standard_name(), "-04");
    assert_eq!(time_zone.daylight_name(), "-04");
    assert_eq!(time_zone.display_name(), "(UTC-04:00) America/Caracas");

    let rules = time_zone.adjustment_rules();
    assert_eq!(rules.len(), 7);

    let base_utc_offset_deltas: Vec<_> = rules.iter().map(|rule| rule.base_utc_offset_delta()).collect();
    let minutes = TimeSpan::from_minutes;
    assert_eq!(base_utc_offset_deltas, [minutes(-27), minutes(-27), minutes(-30), TimeSpan::ZERO, minutes(-30), TimeSpan::ZERO, TimeSpan::ZERO]);
    assert!(rules.iter().all(|rule| rule.no_daylight_transitions() && !rule.has_daylight_saving()));

    assert_eq!(rules[0].date_start(), DateTime::MIN);
    assert_eq!(rules[3].date_start(), utc(1965, 1, 1, 4, 30)?);
    assert_eq!(rules[4].date_start(), utc(2007, 12, 9, 7, 0)?);
    assert_eq!(rules[4].date_start().kind(), DateTimeKind::Utc);
    assert_eq!(rules[5].date_start(), utc(2016, 5, 1, 7, 0)?);
    assert_eq!(rules[6].date_end(), DateTime::MAX);

    let cache = cache();
    assert_eq!(time_zone.get_utc_offset(local(1900, 1, 1, 0, 0)?, &cache), TimeSpan::new(-4, -27, 0));
    assert_eq!(time_zone.get_utc_offset(local(1950, 1, 1, 0, 0)?, &cache), TimeSpan::new(-4, -30, 0));
    assert_eq!(time_zone.get_utc_offset(local(2000, 1, 1, 0, 0)?, &cache), TimeSpan::from_hours(-4));
    assert_eq!(time_zone.get_utc_offset(local(2007, 12, 8, 12, 0)?, &cache), TimeSpan::from_hours(-4));
    assert_eq!(time_zone.get_utc_offset(local(2007, 12, 9, 12, 0)?, &cache), TimeSpan::new(-4, -30, 0));
    assert_eq!(time_zone.get_utc_offset(local(2016, 4, 30, 12, 0)?, &cache), TimeSpan::new(-4, -30, 0));
    assert_eq!(time_zone.get_utc_offset(local(2016, 5, 2, 12, 0)?, &cache), TimeSpan::from_hours(-4));
    assert_eq!(time_zone.get_utc_offset(utc(2010, 1, 1, 0, 0)?, &cache), TimeSpan::new(-4, -30, 0));
    assert!(!time_zone.is_daylight_saving_time(local(2010, 1, 1, 0, 0)?, &cache));

    // Clocks moved back by 30 minutes, then forward by 30 minutes
    assert_eq!(from_utc(&time_zone, utc(2007, 12, 9, 6, 59)?)?, local(2007, 12, 9, 2, 59)?);
    assert_eq!(from_utc(&time_zone, utc(2007, 12, 9, 7, 0)?)?, local(2007, 12, 9, 2, 30)?);
    assert_eq!(from_utc(&time_zone, utc(2016, 5, 1, 6, 59)?)?, local(2016, 5, 1, 2, 29)?);
    assert_eq!(from_utc(&time_zone, utc(2016, 5, 1, 7, 0)?)?, local(2016, 5, 1, 3, 0)?);
    assert_eq!(to_utc(&time_zone, local(2010, 6, 1, 12, 0)?)?, utc(2010, 6, 1, 16, 30)?);

    assert_round_trip(&time_zone, local(2006, 1, 1, 0, 0)?, local(2018, 1, 1, 0, 0)?, TimeSpan::from_hours(7))
}

#[test]
fn test_parse_idempotence() -> Result<(), Error> {
    let first = TimeZoneInfo::from_tz_data_at("Pacific/Honolulu", HONOLULU_TZ_DATA, false, now()?)?;
    let second = TimeZoneInfo::from_tz_data_at("Pacific/Honolulu", HONOLULU_TZ_DATA, false, now()?)?;

    assert_eq!(first.adjustment_rules(), second.adjustment_rules());
    assert_eq!(first, second);

    let first = TimeZoneInfo::from_tz_data("America/New_York", &new_york_tz_data())?;
    let second = TimeZoneInfo::from_tz_data("America/New_York", &new_york_tz_data())?;
    assert_eq!(first.adjustment_rules(), second.adjustment_rules());

    Ok(())
}

#[test]
fn test_new_york_tz_data() -> Result<(), Error> {
    let time_zone = TimeZoneInfo::from_tz_data_at("America/New_York", &new_york_tz_data(), false, now()?)?;
    let cache = cache();

    assert_eq!(time_zone.base_utc_offset(), TimeSpan::from_hours(-5));
    assert_eq!(time_zone.standard_name(), "EST");
    assert_eq!(time_zone.daylight_name(), "EDT");
    assert_eq!(time_zone.adjustment_rules().len(), 4);

    let last_rule = time_zone.adjustment_rules()[3];
    assert!(!last_rule.no_daylight_transitions());
    assert_eq!(last_rule.daylight_transition_start(), TransitionTime::create_floating_date_rule(at(2)?, 3, 2, DayOfWeek::Sunday)?);

    // Rule generated from the transitions
    assert_eq!(time_zone.get_utc_offset(local(2007, 7, 1, 12, 0)?, &cache), TimeSpan::from_hours(-4));
    assert!(time_zone.is_invalid_time(local(2007, 3, 11, 2, 30)?, &cache));
    assert!(time_zone.is_ambiguous_time(local(2007, 11, 4, 1, 30)?, &cache));
    assert_eq!(time_zone.get_ambiguous_time_offsets(local(2007, 11, 4, 1, 30)?, &cache)?, [TimeSpan::from_hours(-5), TimeSpan::from_hours(-4)]);
    assert_eq!(from_utc(&time_zone, utc(2007, 11, 4, 5, 30)?)?, local(2007, 11, 4, 1, 30)?);
    assert_eq!(from_utc(&time_zone, utc(2007, 11, 4, 6, 30)?)?, local(2007, 11, 4, 1, 30)?);

    // Rule generated from the footer
    assert!(time_zone.is_invalid_time(local(2008, 3, 9, 2, 30)?, &cache));
    assert!(time_zone.is_invalid_time(local(2024, 3, 10, 2, 30)?, &cache));
    assert!(time_zone.is_ambiguous_time(local(2024, 11, 3, 1, 30)?, &cache));
    assert_eq!(time_zone.get_utc_offset(local(2024, 7, 1, 12, 0)?, &cache), TimeSpan::from_hours(-4));
    assert_eq!(time_zone.get_utc_offset(utc(2024, 11, 3, 5, 30)?, &cache), TimeSpan::from_hours(-4));
    assert_eq!(time_zone.get_utc_offset(utc(2024, 11, 3, 6, 30)?, &cache), TimeSpan::from_hours(-5));

    assert_round_trip(&time_zone, local(2006, 10, 1, 0, 0)?, local(2009, 1, 1, 0, 0)?, TimeSpan::from_hours(5))
}

#[test]
fn test_us_invalid_time() -> Result<(), Error> {
    let time_zone = us_eastern()?;
    let cache = cache();

    let invalid = local(2024, 3, 10, 2, 30)?;
    assert!(time_zone.is_invalid_time(invalid, &cache));
    assert!(!time_zone.is_invalid_time(local(2024, 3, 10, 1, 59)?, &cache));
    assert!(!time_zone.is_invalid_time(local(2024, 3, 10, 3, 0)?, &cache));
    assert!(!time_zone.is_invalid_time(invalid.with_kind(DateTimeKind::Utc), &cache));

    // Invalid times get the daylight offset, without being in daylight saving time
    assert_eq!(time_zone.get_utc_offset(invalid, &cache), TimeSpan::from_hours(-4));
    assert_eq!(time_zone.get_utc_offset(local(2024, 3, 10, 2, 0)?, &cache), TimeSpan::from_hours(-4));
    assert_eq!(time_zone.get_utc_offset(local(2024, 3, 10, 1, 59)?, &cache), TimeSpan::from_hours(-5));
    assert!(!time_zone.is_daylight_saving_time(invalid, &cache));

    assert!(matches!(to_utc(&time_zone, invalid), Err(Error::InvalidTime(_))));
    assert!(matches!(cache.convert_time_to_utc_from(invalid, &time_zone), Err(Error::InvalidTime(_))));

    let lenient = cache.convert_time_with_mode(invalid, &time_zone, &TimeZoneInfo::utc(), ConversionMode::NoThrowOnInvalidTime)?;
    assert_eq!(lenient, utc(2024, 3, 10, 6, 30)?);

    Ok(())
}

#[test]
fn test_us_ambiguous_time() -> Result<(), Error> {
    let time_zone = us_eastern()?;
    let cache = cache();

    let ambiguous = local(2024, 11, 3, 1, 30)?;
    assert!(time_zone.is_ambiguous_time(ambiguous, &cache));
    assert!(!time_zone.is_ambiguous_time(local(2024, 11, 3, 2, 0)?, &cache));
    assert!(!time_zone.is_ambiguous_time(local(2024, 11, 3, 0, 59)?, &cache));

    assert_eq!(time_zone.get_ambiguous_time_offsets(ambiguous, &cache)?, [TimeSpan::from_hours(-5), TimeSpan::from_hours(-4)]);
    assert!(matches!(time_zone.get_ambiguous_time_offsets(local(2024, 7, 1, 12, 0)?, &cache), Err(Error::Argument(_))));

    // Ambiguous times get the standard offset
    assert_eq!(time_zone.get_utc_offset(ambiguous, &cache), TimeSpan::from_hours(-5));
    assert_eq!(time_zone.get_utc_offset(local(2024, 11, 3, 0, 30)?, &cache), TimeSpan::from_hours(-4));

    // Both occurrences map to the same local time
    assert_eq!(from_utc(&time_zone, utc(2024, 11, 3, 5, 30)?)?, ambiguous);
    assert_eq!(from_utc(&time_zone, utc(2024, 11, 3, 6, 30)?)?, ambiguous);

    // A UTC date time is ambiguous if its local time is
    assert!(time_zone.is_ambiguous_time(utc(2024, 11, 3, 5, 30)?, &cache));
    assert!(!time_zone.is_ambiguous_time(utc(2024, 11, 3, 7, 30)?, &cache));

    Ok(())
}

#[test]
fn test_us_daylight_saving_time() -> Result<(), Error> {
    let time_zone = us_eastern()?;
    let cache = cache();

    assert!(time_zone.is_daylight_saving_time(local(2024, 7, 1, 12, 0)?, &cache));
    assert!(!time_zone.is_daylight_saving_time(local(2024, 12, 1, 12, 0)?, &cache));
    assert!(!time_zone.is_daylight_saving_time(local(2006, 7, 1, 12, 0)?, &cache));
    assert!(time_zone.is_daylight_saving_time(utc(2024, 7, 1, 12, 0)?, &cache));

    assert_eq!(time_zone.get_utc_offset(local(2006, 7, 1, 12, 0)?, &cache), TimeSpan::from_hours(-5));
    assert_eq!(time_zone.get_utc_offset(local(2024, 7, 1, 12, 0)?, &cache), TimeSpan::from_hours(-4));

    assert_round_trip(&time_zone, local(2023, 1, 1, 0, 0)?, local(2025, 1, 1, 0, 0)?, TimeSpan::from_hours(7))
}

#[test]
fn test_southern_hemisphere() -> Result<(), Error> {
    let time_zone = australia_eastern()?;
    let cache = cache();

    assert_eq!(time_zone.get_utc_offset(local(2024, 1, 15, 12, 0)?, &cache), TimeSpan::from_hours(11));
    assert_eq!(time_zone.get_utc_offset(local(2024, 7, 1, 12, 0)?, &cache), TimeSpan::from_hours(10));
    assert_eq!(time_zone.get_utc_offset(local(2024, 12, 31, 23, 0)?, &cache), TimeSpan::from_hours(11));

    assert!(time_zone.is_invalid_time(local(2024, 10, 6, 2, 30)?, &cache));
    assert!(time_zone.is_ambiguous_time(local(2024, 4, 7, 2, 30)?, &cache));
    assert_eq!(time_zone.get_ambiguous_time_offsets(local(2024, 4, 7, 2, 30)?, &cache)?, [TimeSpan::from_hours(10), TimeSpan::from_hours(11)]);

    assert_eq!(from_utc(&time_zone, utc(2024, 1, 15, 0, 0)?)?, local(2024, 1, 15, 11, 0)?);
    assert_eq!(from_utc(&time_zone, utc(2024, 12, 31, 18, 0)?)?, local(2025, 1, 1, 5, 0)?);
    assert_eq!(to_utc(&time_zone, local(2025, 1, 1, 5, 0)?)?, utc(2024, 12, 31, 18, 0)?);

    assert_round_trip(&time_zone, local(2024, 1, 1, 0, 0)?, local(2026, 1, 1, 0, 0)?, TimeSpan::from_hours(7))
}

#[test]
fn test_negative_daylight_delta() -> Result<(), Error> {
    let rule = AdjustmentRule::create(
        DateTime::from_ymd(2000, 1, 1)?,
        DateTime::MAX.date(),
        TimeSpan::from_hours(-1),
        TransitionTime::create_floating_date_rule(at(2)?, 10, 5, DayOfWeek::Sunday)?,
        TransitionTime::create_floating_date_rule(at(1)?, 3, 5, DayOfWeek::Sunday)?,
    )?;
    let time_zone = TimeZoneInfo::create_custom_time_zone_with_rules("Test/Dublin", TimeSpan::from_hours(1), "(UTC+01:00) Dublin", "IST", "GMT", &[rule])?;
    let cache = cache();

    assert_eq!(time_zone.get_utc_offset(local(2024, 7, 1, 12, 0)?, &cache), TimeSpan::from_hours(1));
    assert_eq!(time_zone.get_utc_offset(local(2024, 1, 15, 12, 0)?, &cache), TimeSpan::ZERO);

    assert!(time_zone.is_ambiguous_time(local(2024, 10, 27, 1, 30)?, &cache));
    assert_eq!(time_zone.get_ambiguous_time_offsets(local(2024, 10, 27, 1, 30)?, &cache)?, [TimeSpan::ZERO, TimeSpan::from_hours(1)]);
    assert!(time_zone.is_invalid_time(local(2024, 3, 31, 1, 30)?, &cache));
    assert_eq!(time_zone.get_utc_offset(local(2024, 3, 31, 1, 30)?, &cache), TimeSpan::ZERO);

    assert_round_trip(&time_zone, local(2024, 1, 1, 0, 0)?, local(2025, 1, 1, 0, 0)?, TimeSpan::from_hours(7))
}

#[test]
fn test_year_markers() -> Result<(), Error> {
    let start = TransitionTime::create_fixed_date_rule(at(0)?, 1, 1)?;
    let end = TransitionTime::create_fixed_date_rule(DateTime::from_ticks(TimeSpan::from_milliseconds(1).ticks(), DateTimeKind::Unspecified)?, 1, 1)?;
    let rule = AdjustmentRule::create(DateTime::from_ymd(2020, 1, 1)?, DateTime::from_ymd(2020, 12, 31)?, TimeSpan::from_hours(1), start, end)?;

    assert!(rule.is_start_date_marker_for_beginning_of_year());
    assert!(rule.is_end_date_marker_for_end_of_year());

    let time_zone = TimeZoneInfo::create_custom_time_zone_with_rules("Test/Markers", TimeSpan::from_hours(1), "", "STD", "DST", &[rule])?;
    let cache = cache();

    assert_eq!(time_zone.get_utc_offset(local(2020, 1, 1, 0, 30)?, &cache), TimeSpan::from_hours(2));
    assert_eq!(time_zone.get_utc_offset(local(2020, 7, 1, 0, 0)?, &cache), TimeSpan::from_hours(2));
    assert_eq!(time_zone.get_utc_offset(local(2020, 12, 31, 23, 30)?, &cache), TimeSpan::from_hours(2));
    assert_eq!(time_zone.get_utc_offset(local(2021, 6, 1, 0, 0)?, &cache), TimeSpan::from_hours(1));

    assert!(!time_zone.is_invalid_time(local(2020, 1, 1, 0, 30)?, &cache));
    assert!(!time_zone.is_ambiguous_time(local(2020, 12, 31, 23, 30)?, &cache));

    assert_eq!(from_utc(&time_zone, utc(2020, 7, 1, 0, 0)?)?, local(2020, 7, 1, 2, 0)?);

    Ok(())
}

#[test]
fn test_rule_lookup() -> Result<(), Error> {
    let time_zone = TimeZoneInfo::from_tz_data_at("America/New_York", &new_york_tz_data(), false, now()?)?;
    let honolulu = TimeZoneInfo::from_tz_data_at("Pacific/Honolulu", HONOLULU_TZ_DATA, false, now()?)?;

    for time_zone in [&time_zone, &honolulu] {
        let mut times = vec![DateTime::MIN.with_kind(DateTimeKind::Utc), DateTime::MAX.with_kind(DateTimeKind::Utc)];
        for rule in time_zone.adjustment_rules() {
            for boundary in [rule.date_start(), rule.date_end()] {
                times.push(boundary.saturating_sub(TimeSpan::from_ticks(1)).with_kind(DateTimeKind::Utc));
                times.push(boundary.with_kind(DateTimeKind::Utc));
                times.push(boundary.saturating_add(TimeSpan::from_ticks(1)).with_kind(DateTimeKind::Utc));
            }
        }

        let mut time = utc(1880, 1, 1, 0, 0)?;
        while time < utc(2030, 1, 1, 0, 0)? {
            times.push(time);
            time = time.saturating_add(TimeSpan::new(24 * 13 + 5, 0, 0));
        }

        for time in times {
            let found = time_zone.adjustment_rule_for_time(time, true).map(|(index, _)| index);
            assert_eq!(found, linear_rule_for_utc(time_zone, time), "{}", time);
        }
    }

    // Rules with gaps between them
    let default = TransitionTime::default();
    let rules = [
        AdjustmentRule::new(DateTime::from_ymd(2000, 1, 1)?, DateTime::from_ymd(2004, 12, 31)?, TimeSpan::ZERO, default, default, TimeSpan::from_hours(1), true)?,
        AdjustmentRule::new(DateTime::from_ymd(2005, 1, 1)?, DateTime::from_ymd(2009, 12, 31)?, TimeSpan::ZERO, default, default, TimeSpan::from_minutes(30), true)?,
        AdjustmentRule::new(DateTime::from_ymd(2012, 1, 1)?, DateTime::MAX.date(), TimeSpan::ZERO, default, default, TimeSpan::from_minutes(-30), true)?,
    ];
    let time_zone = TimeZoneInfo::create_custom_time_zone_with_rules("Test/Gaps", TimeSpan::from_hours(2), "", "STD", "STD", &rules)?;

    let mut time = local(1995, 1, 1, 0, 0)?;
    while time < local(2030, 1, 1, 0, 0)? {
        for time in [time, time.saturating_sub(TimeSpan::from_ticks(1))] {
            let found = time_zone.adjustment_rule_for_time(time, false).map(|(index, _)| index);
            let expected = rules.iter().position(|rule| rule.date_start() <= time.date() && time.date() <= rule.date_end());
            assert_eq!(found, expected, "{}", time);
        }
        time = time.saturating_add(TimeSpan::new(24, 0, 0));
    }

    let cache = cache();
    assert_eq!(time_zone.get_utc_offset(local(2003, 1, 1, 0, 0)?, &cache), TimeSpan::from_hours(3));
    assert_eq!(time_zone.get_utc_offset(local(2011, 1, 1, 0, 0)?, &cache), TimeSpan::from_hours(2));
    assert_eq!(time_zone.get_utc_offset(local(2020, 1, 1, 0, 0)?, &cache), TimeSpan::new(1, 30, 0));

    Ok(())
}

#[test]
fn test_offset_normalization() -> Result<(), Error> {
    let bytes = tz_data(&[(-2229321600, 1)], &[(-57360, false, "LMT"), (28800, false, "PST")], "PST-8");
    let time_zone = TimeZoneInfo::from_tz_data_at("Asia/Manila", &bytes, false, now()?)?;

    assert_eq!(time_zone.base_utc_offset(), TimeSpan::from_hours(8));
    assert_eq!(time_zone.adjustment_rules()[0].base_utc_offset_delta(), TimeSpan::from_hours(-22));

    for time_zone in [time_zone, TimeZoneInfo::from_tz_data_at("Pacific/Honolulu", HONOLULU_TZ_DATA, false, now()?)?] {
        for rule in time_zone.adjustment_rules() {
            let offset = time_zone.base_utc_offset() + rule.base_utc_offset_delta() + rule.daylight_delta();
            assert!((TimeSpan::from_hours(-14)..=TimeSpan::from_hours(14)).contains(&offset));
        }
    }

    Ok(())
}

#[test]
fn test_from_tz_data_fallback() -> Result<(), Error> {
    let bytes = tz_data(&[(1173596400, 1), (1194156000, 0)], &[(-18000, false, "EST"), (-14400, true, "EDT")], "EST");

    assert!(matches!(TimeZoneInfo::from_tz_data_with_options("Test/Broken", &bytes, false), Err(Error::InvalidTimeZone(_))));

    let time_zone = TimeZoneInfo::from_tz_data("Test/Broken", &bytes)?;
    assert!(!time_zone.supports_daylight_saving_time());
    assert!(time_zone.adjustment_rules().is_empty());
    assert_eq!(time_zone.daylight_name(), "");
    assert_eq!(time_zone.base_utc_offset(), TimeSpan::from_hours(-5));

    assert!(matches!(TimeZoneInfo::from_tz_data("Test/Garbage", b"TZif2"), Err(Error::InvalidTimeZone(_))));

    // Out of range footer offsets are format errors
    for footer in ["EST999999999", "EST-99999999999999999999", "EST5EDT999999999,M3.2.0,M11.1.0", "EST999999:00"] {
        let bytes = tz_data(&[(1173596400, 1), (1194156000, 0)], &[(-18000, false, "EST"), (-14400, true, "EDT")], footer);
        assert!(matches!(TimeZoneInfo::from_tz_data_with_options("Test/Overflow", &bytes, false), Err(Error::InvalidTimeZone(_))));

        let time_zone = TimeZoneInfo::from_tz_data("Test/Overflow", &bytes)?;
        assert!(time_zone.adjustment_rules().is_empty());
    }

    Ok(())
}

#[test]
fn test_utc() -> Result<(), Error> {
    let utc_time_zone = TimeZoneInfo::utc();
    assert!(utc_time_zone.is_utc());
    assert_eq!(utc_time_zone.id(), "UTC");
    assert_eq!(utc_time_zone.display_name(), "(UTC) Coordinated Universal Time");
    assert_eq!(utc_time_zone.standard_name(), "Coordinated Universal Time");
    assert!(!utc_time_zone.supports_daylight_saving_time());

    // Alias files are not parsed
    let alias = TimeZoneInfo::from_tz_data("Etc/UTC", b"not a TZif file")?;
    assert_eq!(alias.id(), "Etc/UTC");
    assert_eq!(alias.standard_name(), "Coordinated Universal Time");
    assert!(!alias.is_utc());
    assert!(alias.has_same_rules(&utc_time_zone));

    let fixed = TimeZoneInfo::from_tz_data("Etc/Fixed", &fixed_tz_data(0))?;
    assert_eq!(fixed.display_name(), "(UTC) Etc/Fixed");
    assert_eq!(fixed.standard_name(), "FIX");

    let cache = cache();
    assert_eq!(utc_time_zone.get_utc_offset(utc(2024, 1, 1, 0, 0)?, &cache), TimeSpan::ZERO);

    Ok(())
}

#[test]
fn test_custom_time_zone() -> Result<(), Error> {
    let time_zone = TimeZoneInfo::create_custom_time_zone("Test/Fixed", TimeSpan::new(5, 45, 0), "(UTC+05:45) Fixed", "NPT")?;
    assert_eq!(time_zone.daylight_name(), "NPT");
    assert!(!time_zone.supports_daylight_saving_time());
    assert_eq!(time_zone.to_string(), "(UTC+05:45) Fixed");

    assert!(matches!(TimeZoneInfo::create_custom_time_zone("", TimeSpan::ZERO, "", ""), Err(Error::Argument(_))));
    assert!(matches!(TimeZoneInfo::create_custom_time_zone("X", TimeSpan::new(14, 1, 0), "", ""), Err(Error::InvalidRule(_))));
    assert!(matches!(TimeZoneInfo::create_custom_time_zone("X", TimeSpan::new(1, 0, 30), "", ""), Err(Error::InvalidRule(_))));

    let rule = us_eastern()?.adjustment_rules()[0];
    assert!(matches!(
        TimeZoneInfo::create_custom_time_zone_with_rules("X", TimeSpan::ZERO, "", "", "", &[rule, rule]),
        Err(Error::InvalidRule(_))
    ));
    assert!(matches!(
        TimeZoneInfo::create_custom_time_zone_with_rules("X", TimeSpan::from_hours(14), "", "", "", &[rule]),
        Err(Error::InvalidRule(_))
    ));

    let disabled = TimeZoneInfo::create_custom_time_zone_with_options("Test/Eastern", TimeSpan::from_hours(-5), "", "EST", "EDT", &[rule], true)?;
    assert!(!disabled.supports_daylight_saving_time());
    assert_eq!(disabled.daylight_name(), "");
    assert_eq!(disabled.adjustment_rules().len(), 1);
    assert!(!disabled.is_daylight_saving_time(local(2024, 7, 1, 12, 0)?, &cache()));

    Ok(())
}

#[test]
fn test_equality() -> Result<(), Error> {
    let time_zone = us_eastern()?;
    let renamed = TimeZoneInfo::create_custom_time_zone_with_rules("TEST/EASTERN", TimeSpan::from_hours(-5), "Other", "Other", "Other", time_zone.adjustment_rules())?;
    let other = TimeZoneInfo::create_custom_time_zone_with_rules("Test/Other", TimeSpan::from_hours(-5), "", "", "", time_zone.adjustment_rules())?;

    assert_eq!(time_zone, renamed);
    assert_ne!(time_zone, other);
    assert!(time_zone.has_same_rules(&other));
    assert!(!time_zone.has_same_rules(&TimeZoneInfo::create_custom_time_zone("Test/Eastern", TimeSpan::from_hours(-5), "", "")?));

    let hash = |time_zone: &TimeZoneInfo| {
        let mut hasher = DefaultHasher::new();
        time_zone.hash(&mut hasher);
        hasher.finish()
    };
    assert_eq!(hash(&time_zone), hash(&renamed));

    Ok(())
}
