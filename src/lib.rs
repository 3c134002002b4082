#![deny(missing_docs)]
#![warn(unreachable_pub)]

//! This crate provides the [`TimeZoneInfo`] type, which describes a time zone as a base offset from UTC and a sequence of [`AdjustmentRule`]s.
//!
//! Adjustment rules are generated from [TZif files](https://datatracker.ietf.org/doc/html/rfc8536),
//! including the [POSIX `TZ` string](https://pubs.opengroup.org/onlinepubs/9699919799/basedefs/V1_chap08.html) footer describing the offset changes after the last transition,
//! or they can be provided directly to build a custom time zone.
//!
//! Date times are represented by the [`DateTime`] type, a count of 100-nanosecond ticks since 0001-01-01T00:00:00 with a [`DateTimeKind`]
//! telling if the ticks are a UTC time, a local time of the system time zone, or a wall clock time of an unspecified time zone.
//!
//! Local times skipped at the start of daylight saving time are *invalid*, and local times repeated at its end are *ambiguous*.
//!
//! System time zones are read from the time zone database directory, given by the `TZDIR` environment variable or defaulting to `/usr/share/zoneinfo/`,
//! and the local time zone is read from the `TZ` environment variable or from `/etc/localtime`. They are cached by a [`ZoneCache`].
//!
//! # Usage
//!
//! ## Custom time zone
//!
//! ```rust
//! # fn main() -> Result<(), tzinfo::Error> {
//! use tzinfo::{AdjustmentRule, Config, DateTime, DateTimeKind, DayOfWeek, TimeSpan, TimeZoneInfo, TransitionTime, ZoneCache};
//!
//! // Daylight saving time from the second Sunday of March to the first Sunday of November, at 02:00
//! let two_am = DateTime::new(1, 1, 1, 2, 0, 0, DateTimeKind::Unspecified)?;
//! let rule = AdjustmentRule::create(
//!     DateTime::from_ymd(2007, 1, 1)?,
//!     DateTime::MAX.date(),
//!     TimeSpan::from_hours(1),
//!     TransitionTime::create_floating_date_rule(two_am, 3, 2, DayOfWeek::Sunday)?,
//!     TransitionTime::create_floating_date_rule(two_am, 11, 1, DayOfWeek::Sunday)?,
//! )?;
//!
//! let eastern = TimeZoneInfo::create_custom_time_zone_with_rules("Eastern", TimeSpan::from_hours(-5), "(UTC-05:00) Eastern", "EST", "EDT", &[rule])?;
//!
//! // Cache without any system time zone, using UTC as local time zone
//! let cache = ZoneCache::new(Config::new("/nonexistent").with_tz(Some("")));
//!
//! let summer = DateTime::new(2024, 7, 1, 12, 0, 0, DateTimeKind::Unspecified)?;
//! assert_eq!(eastern.get_utc_offset(summer, &cache), TimeSpan::from_hours(-4));
//! assert!(eastern.is_daylight_saving_time(summer, &cache));
//!
//! // Skipped local time
//! let skipped = DateTime::new(2024, 3, 10, 2, 30, 0, DateTimeKind::Unspecified)?;
//! assert!(eastern.is_invalid_time(skipped, &cache));
//!
//! // Repeated local time
//! let repeated = DateTime::new(2024, 11, 3, 1, 30, 0, DateTimeKind::Unspecified)?;
//! assert!(eastern.is_ambiguous_time(repeated, &cache));
//! assert_eq!(eastern.get_ambiguous_time_offsets(repeated, &cache)?, [TimeSpan::from_hours(-5), TimeSpan::from_hours(-4)]);
//!
//! // Conversion to UTC
//! let utc = cache.convert_time_to_utc_from(summer, &eastern)?;
//! assert_eq!(utc, DateTime::new(2024, 7, 1, 16, 0, 0, DateTimeKind::Utc)?);
//! assert_eq!(utc.kind(), DateTimeKind::Utc);
//!
//! // Time zones can be exchanged as serialized strings
//! let serialized = eastern.to_serialized_string();
//! assert_eq!(eastern, TimeZoneInfo::from_serialized_string(&serialized)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## System time zones
//!
//! ```rust
//! # fn main() -> Result<(), tzinfo::Error> {
//! use tzinfo::{DateTime, DateTimeKind, ZoneCache};
//!
//! let cache = ZoneCache::from_env();
//!
//! // Local time zone, falling back to UTC
//! let local = cache.local();
//! let _now = cache.now();
//!
//! // Time zone from the time zone database
//! if let Ok(auckland) = cache.find_system_time_zone_by_id("Pacific/Auckland") {
//!     let utc = DateTime::new(2024, 1, 1, 0, 0, 0, DateTimeKind::Utc)?;
//!     let _local_time = cache.convert_time(utc, &auckland)?;
//! }
//!
//! // All time zones listed by the time zone database
//! for time_zone in cache.get_system_time_zones() {
//!     let _ = (time_zone.id(), time_zone.display_name(), local.has_same_rules(&time_zone));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Logging
//!
//! With the `logging` feature, time zone discovery and loading emit records through the [`log`](https://docs.rs/log) crate.

#[macro_use]
mod logging;

mod cache;
mod datetime;
mod error;
mod parse;
mod system;
mod timezone;

pub use cache::ZoneCache;
pub use datetime::{DateTime, DateTimeKind, DayOfWeek, TimeSpan};
pub use error::{DateTimeError, Error, InvalidRuleError, InvalidTimeZoneError, SerializationError, TzFileError, TzStringError};
pub use parse::{LocalTimeType, TzFile, TzFileHeader, TzFileVersion};
pub use system::Config;
pub use timezone::{AdjustmentRule, ConversionMode, TimeZoneInfo, TransitionTime};

/// Month days in a normal year
const DAY_IN_MONTHS_NORMAL_YEAR: [i64; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
/// Cumulated month days in a normal year
const CUMUL_DAY_IN_MONTHS_NORMAL_YEAR: [i64; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];
