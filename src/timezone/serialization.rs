//! Textual serialization of time zones.
//!
//! A serialized time zone is a list of fields terminated by `;`:
//! `id;base_offset;display_name;standard_name;daylight_name;[rule][rule]...;`
//!
//! Each adjustment rule is written as
//! `[MM:dd:yyyy;MM:dd:yyyy;daylight_delta;[transition];[transition];(base_offset_delta;)(1;)]`,
//! and each transition time as `[1;HH:mm:ss.FFF;month;day;]` or `[0;HH:mm:ss.FFF;month;week;day_of_week;]`.
//! Rule boundaries which are not plain dates are written as `MM:dd:yyyy HH:mm:ss.FFFFFFF`, with a `Z` suffix for UTC boundaries.
//! Offsets are written in minutes, and the characters `\`, `;`, `[` and `]` are escaped with `\` in strings.

use super::{AdjustmentRule, TimeZoneInfo, TransitionTime};
use crate::datetime::{DateTime, DateTimeKind, DayOfWeek, TimeSpan, TICKS_PER_SECOND};
use crate::error::{Error, SerializationError};
use crate::parse::Cursor;

/// Escape character
const ESCAPE: u8 = b'\\';
/// Field separator
const SEPARATOR: u8 = b';';
/// Start of a nested block
const BLOCK_START: u8 = b'[';
/// End of a nested block
const BLOCK_END: u8 = b']';

impl TimeZoneInfo {
    /// Serialize the time zone to a string, which can be read back with [`TimeZoneInfo::from_serialized_string`]
    pub fn to_serialized_string(&self) -> String {
        let mut serialized = String::new();

        write_escaped(&mut serialized, &self.id);
        serialized.push(';');
        serialized.push_str(&format!("{};", self.base_utc_offset.total_minutes()));
        write_escaped(&mut serialized, &self.display_name);
        serialized.push(';');
        write_escaped(&mut serialized, &self.standard_name);
        serialized.push(';');
        write_escaped(&mut serialized, &self.daylight_name);
        serialized.push(';');

        for rule in self.adjustment_rules.iter() {
            write_adjustment_rule(&mut serialized, rule);
        }

        serialized.push(';');
        serialized
    }

    /// Deserialize a time zone from a string produced by [`TimeZoneInfo::to_serialized_string`]
    pub fn from_serialized_string(source: &str) -> Result<Self, Error> {
        if source.is_empty() {
            return Err(SerializationError("empty serialized string").into());
        }

        let mut deserializer = Deserializer::new(source);

        let id = deserializer.next_string()?;
        let base_utc_offset = deserializer.next_minutes()?;
        let display_name = deserializer.next_string()?;
        let standard_name = deserializer.next_string()?;
        let daylight_name = deserializer.next_string()?;
        let adjustment_rules = deserializer.next_adjustment_rules()?;

        Self::new(&id, base_utc_offset, &display_name, &standard_name, &daylight_name, adjustment_rules, false).map_err(|_error| {
            debug!("rejecting deserialized time zone {:?}: {}", id, _error);
            SerializationError("invalid time zone parameters").into()
        })
    }
}

/// Write a string, escaping special characters
fn write_escaped(serialized: &mut String, value: &str) {
    for c in value.chars() {
        if matches!(c, '\\' | ';' | '[' | ']') {
            serialized.push('\\');
        }
        serialized.push(c);
    }
}

/// Write a rule boundary as `MM:dd:yyyy`, adding its time of day and a `Z` suffix if it is not a plain date
fn write_date(serialized: &mut String, date_time: DateTime) {
    serialized.push_str(&format!("{:02}:{:02}:{:04}", date_time.month(), date_time.day(), date_time.year()));

    let is_utc = date_time.kind() == DateTimeKind::Utc;
    if is_utc || date_time.time_of_day() != TimeSpan::ZERO {
        serialized.push(' ');
        write_time(serialized, date_time);
    }
    if is_utc {
        serialized.push('Z');
    }

    serialized.push(';');
}

/// Write a time of day as `HH:mm:ss.FFFFFFF`, without trailing zeros in the fraction
fn write_time(serialized: &mut String, time: DateTime) {
    serialized.push_str(&format!("{:02}:{:02}:{:02}", time.hour(), time.minute(), time.second()));

    let fraction = time.ticks() % TICKS_PER_SECOND;
    if fraction != 0 {
        let fraction = format!("{:07}", fraction);
        serialized.push('.');
        serialized.push_str(fraction.trim_end_matches('0'));
    }
}

/// Write the time of day of a transition time, with at most millisecond precision
fn write_time_of_day(serialized: &mut String, time: DateTime) {
    write_time(serialized, time);
    serialized.push(';');
}

fn write_transition_time(serialized: &mut String, transition_time: &TransitionTime) {
    serialized.push('[');

    serialized.push_str(if transition_time.is_fixed_date_rule() { "1;" } else { "0;" });
    write_time_of_day(serialized, transition_time.time_of_day());
    serialized.push_str(&format!("{};", transition_time.month()));

    if transition_time.is_fixed_date_rule() {
        serialized.push_str(&format!("{};", transition_time.day()));
    } else {
        serialized.push_str(&format!("{};{};", transition_time.week(), transition_time.day_of_week().num_days_from_sunday()));
    }

    serialized.push_str("];");
}

fn write_adjustment_rule(serialized: &mut String, rule: &AdjustmentRule) {
    serialized.push('[');

    write_date(serialized, rule.date_start());
    write_date(serialized, rule.date_end());
    serialized.push_str(&format!("{};", rule.daylight_delta().total_minutes()));
    write_transition_time(serialized, &rule.daylight_transition_start());
    write_transition_time(serialized, &rule.daylight_transition_end());

    // A lone `1` would be read back as a base offset delta
    if rule.base_utc_offset_delta() != TimeSpan::ZERO || rule.no_daylight_transitions() {
        serialized.push_str(&format!("{};", rule.base_utc_offset_delta().total_minutes()));
    }
    if rule.no_daylight_transitions() {
        serialized.push_str("1;");
    }

    serialized.push(']');
}

/// Reader of a serialized time zone
struct Deserializer<'a> {
    /// Remaining serialized data
    cursor: Cursor<'a>,
}

impl<'a> Deserializer<'a> {
    fn new(source: &'a str) -> Self {
        Self { cursor: Cursor::new(source.as_bytes()) }
    }

    fn peek(&self) -> Option<u8> {
        self.cursor.peek().copied()
    }

    fn next_byte(&mut self) -> Option<u8> {
        self.cursor.read_exact(1).ok().map(|bytes| bytes[0])
    }

    /// Read the character following an escape character
    fn next_escaped(&mut self) -> Result<u8, SerializationError> {
        match self.next_byte() {
            Some(byte @ (ESCAPE | SEPARATOR | BLOCK_START | BLOCK_END)) => Ok(byte),
            Some(_) => Err(SerializationError("invalid escaped character")),
            None => Err(SerializationError("unterminated escape sequence")),
        }
    }

    /// Read an unescaped string terminated by a separator
    fn next_string(&mut self) -> Result<String, SerializationError> {
        let mut token = Vec::new();

        loop {
            match self.next_byte() {
                Some(ESCAPE) => token.push(self.next_escaped()?),
                Some(BLOCK_START) | Some(BLOCK_END) => return Err(SerializationError("unexpected block delimiter")),
                Some(SEPARATOR) => break,
                Some(b'\0') => return Err(SerializationError("unexpected NUL character")),
                Some(byte) => token.push(byte),
                None => return Err(SerializationError("missing field separator")),
            }
        }

        String::from_utf8(token).map_err(|_| SerializationError("invalid UTF-8 string"))
    }

    /// Read a signed integer
    fn next_int(&mut self) -> Result<i32, SerializationError> {
        let token = self.next_string()?;

        match token.bytes().skip_while(|&x| x == b'+' || x == b'-').all(|x| x.is_ascii_digit()) {
            true => token.parse().map_err(|_| SerializationError("invalid integer")),
            false => Err(SerializationError("invalid integer")),
        }
    }

    /// Read a number of minutes
    fn next_minutes(&mut self) -> Result<TimeSpan, SerializationError> {
        Ok(TimeSpan::from_minutes(self.next_int()?.into()))
    }

    /// Read a `MM:dd:yyyy` date, optionally followed by a `HH:mm:ss.FFFFFFF` time of day and a `Z` suffix for UTC
    fn next_date(&mut self) -> Result<DateTime, SerializationError> {
        let token = self.next_string()?;

        let (date, time) = match token.split_once(' ') {
            Some((date, time)) => (date, Some(time)),
            None => (token.as_str(), None),
        };

        let fields = parse_fields(date, ':').ok_or(SerializationError("invalid date"))?;
        let date = match fields[..] {
            [month, day, year] => {
                let month = u8::try_from(month).map_err(|_| SerializationError("invalid date month"))?;
                let day = u8::try_from(day).map_err(|_| SerializationError("invalid date day"))?;
                let year = i32::try_from(year).map_err(|_| SerializationError("invalid date year"))?;
                DateTime::from_ymd(year, month, day).map_err(|_| SerializationError("invalid date"))?
            }
            _ => return Err(SerializationError("invalid date")),
        };

        let (time, kind) = match time {
            None => return Ok(date),
            Some(time) => match time.strip_suffix('Z') {
                Some(time) => (time, DateTimeKind::Utc),
                None => (time, DateTimeKind::Unspecified),
            },
        };

        let time = parse_time(time, 7).ok_or(SerializationError("invalid date time of day"))?;
        DateTime::from_ticks(date.ticks() + time.ticks(), kind).map_err(|_| SerializationError("invalid date"))
    }

    /// Read a `HH:mm:ss.FFF` time of day, returned on 0001-01-01
    fn next_time_of_day(&mut self) -> Result<DateTime, SerializationError> {
        let token = self.next_string()?;

        let time = parse_time(&token, 3).ok_or(SerializationError("invalid time of day"))?;
        DateTime::from_ticks(time.ticks(), DateTimeKind::Unspecified).map_err(|_| SerializationError("invalid time of day"))
    }

    /// Skip the unknown fields at the end of a block, up to and including its closing delimiter
    fn skip_unknown_fields(&mut self) -> Result<(), SerializationError> {
        let mut depth = 1;

        loop {
            match self.next_byte() {
                Some(ESCAPE) => {
                    self.next_escaped()?;
                }
                Some(BLOCK_START) => depth += 1,
                Some(BLOCK_END) => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Some(b'\0') => return Err(SerializationError("unexpected NUL character")),
                Some(_) => (),
                None => return Err(SerializationError("unterminated block")),
            }
        }
    }

    /// Read the end of a block, skipping unknown fields
    fn end_block(&mut self) -> Result<(), SerializationError> {
        match self.peek() {
            Some(BLOCK_END) => {
                self.next_byte();
                Ok(())
            }
            Some(_) => self.skip_unknown_fields(),
            None => Err(SerializationError("unterminated block")),
        }
    }

    /// Read a transition time block, which must be followed by a separator
    fn next_transition_time(&mut self) -> Result<TransitionTime, SerializationError> {
        if self.next_byte() != Some(BLOCK_START) {
            return Err(SerializationError("expected transition time"));
        }

        let is_fixed_date_rule = match self.next_int()? {
            0 => false,
            1 => true,
            _ => return Err(SerializationError("invalid transition time kind")),
        };

        let time_of_day = self.next_time_of_day()?;
        let month = self.next_int()?;

        let transition_time = if is_fixed_date_rule {
            let day = self.next_int()?;
            TransitionTime::create_fixed_date_rule(time_of_day, to_u8(month)?, to_u8(day)?)
        } else {
            let week = self.next_int()?;
            let day_of_week = self.next_int()?;

            if month == 0 && week == 0 && day_of_week == 0 && time_of_day == DateTime::MIN {
                Ok(TransitionTime::default())
            } else {
                let day_of_week = DayOfWeek::from_num_days_from_sunday(to_u8(day_of_week)?).ok_or(SerializationError("invalid transition time day of week"))?;
                TransitionTime::create_floating_date_rule(time_of_day, to_u8(month)?, to_u8(week)?, day_of_week)
            }
        }
        .map_err(|_| SerializationError("invalid transition time"))?;

        self.end_block()?;

        if self.next_byte() != Some(SEPARATOR) {
            return Err(SerializationError("missing separator after transition time"));
        }

        Ok(transition_time)
    }

    /// Read an adjustment rule block, returning `None` at the end of the rule list
    fn next_adjustment_rule(&mut self) -> Result<Option<AdjustmentRule>, SerializationError> {
        match self.peek() {
            None | Some(SEPARATOR) => return Ok(None),
            Some(BLOCK_START) => self.next_byte(),
            Some(_) => return Err(SerializationError("expected adjustment rule")),
        };

        let date_start = self.next_date()?;
        let date_end = self.next_date()?;
        let daylight_delta = self.next_minutes()?;
        let daylight_transition_start = self.next_transition_time()?;
        let daylight_transition_end = self.next_transition_time()?;

        let base_utc_offset_delta = match self.peek() {
            Some(b'0'..=b'9' | b'+' | b'-') => self.next_minutes()?,
            Some(_) => TimeSpan::ZERO,
            None => return Err(SerializationError("unterminated adjustment rule")),
        };

        let no_daylight_transitions = match self.peek() {
            Some(b'0'..=b'1') => self.next_int()? > 0,
            _ => false,
        };

        self.end_block()?;

        AdjustmentRule::new(date_start, date_end, daylight_delta, daylight_transition_start, daylight_transition_end, base_utc_offset_delta, no_daylight_transitions)
            .map(Some)
            .map_err(|_| SerializationError("invalid adjustment rule"))
    }

    /// Read the list of adjustment rules, which must be followed by a separator
    fn next_adjustment_rules(&mut self) -> Result<Vec<AdjustmentRule>, SerializationError> {
        let mut adjustment_rules = Vec::new();
        while let Some(rule) = self.next_adjustment_rule()? {
            adjustment_rules.push(rule);
        }

        if self.cursor.is_empty() {
            return Err(SerializationError("missing separator after adjustment rules"));
        }

        Ok(adjustment_rules)
    }
}

/// Split a string into unsigned decimal fields
fn parse_fields(value: &str, separator: char) -> Option<Vec<u32>> {
    value
        .split(separator)
        .map(|field| match !field.is_empty() && field.bytes().all(|x| x.is_ascii_digit()) {
            true => field.parse().ok(),
            false => None,
        })
        .collect()
}

/// Parse a `HH:mm:ss` time of day with up to `max_fraction_digits` fraction digits
fn parse_time(value: &str, max_fraction_digits: usize) -> Option<TimeSpan> {
    let (time, fraction) = match value.split_once('.') {
        Some((time, fraction)) if (1..=max_fraction_digits).contains(&fraction.len()) => (time, fraction),
        Some(_) => return None,
        None => (value, "0"),
    };

    let fraction = match fraction.bytes().all(|x| x.is_ascii_digit()) {
        true => format!("{:0<7}", fraction).parse::<i64>().ok()?,
        false => return None,
    };

    match parse_fields(time, ':')?[..] {
        [hours, minutes, seconds] if hours < 24 && minutes < 60 && seconds < 60 => {
            Some(TimeSpan::new(hours.into(), minutes.into(), seconds.into()) + TimeSpan::from_ticks(fraction))
        }
        _ => None,
    }
}

fn to_u8(value: i32) -> Result<u8, SerializationError> {
    u8::try_from(value).map_err(|_| SerializationError("value out of range"))
}
