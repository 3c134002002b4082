//! Error types.

use std::array::TryFromSliceError;
use std::num::ParseIntError;
use std::str::Utf8Error;
use std::{error, fmt, io};

/// Unified error type for everything in the crate
#[non_exhaustive]
#[derive(Debug)]
pub enum Error {
    /// Time zone data is corrupt or malformed
    InvalidTimeZone(InvalidTimeZoneError),
    /// No time zone exists with the requested id
    TimeZoneNotFound(String),
    /// Time zone, adjustment rule or transition time parameters are out of range
    InvalidRule(InvalidRuleError),
    /// Local time is invalid in the source time zone of a strict conversion
    InvalidTime(&'static str),
    /// Argument is not valid for the requested operation
    Argument(&'static str),
    /// Date time error
    DateTime(DateTimeError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidTimeZone(error) => write!(f, "invalid time zone data: {}", error),
            Self::TimeZoneNotFound(id) => write!(f, "time zone not found: {:?}", id),
            Self::InvalidRule(error) => error.fmt(f),
            Self::InvalidTime(error) => write!(f, "invalid time: {}", error),
            Self::Argument(error) => error.fmt(f),
            Self::DateTime(error) => error.fmt(f),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::InvalidTimeZone(error) => Some(error),
            Self::InvalidRule(error) => Some(error),
            Self::DateTime(error) => Some(error),
            _ => None,
        }
    }
}

impl From<InvalidTimeZoneError> for Error {
    fn from(error: InvalidTimeZoneError) -> Self {
        Self::InvalidTimeZone(error)
    }
}

impl From<TzFileError> for Error {
    fn from(error: TzFileError) -> Self {
        Self::InvalidTimeZone(InvalidTimeZoneError::TzFile(error))
    }
}

impl From<TzStringError> for Error {
    fn from(error: TzStringError) -> Self {
        Self::InvalidTimeZone(InvalidTimeZoneError::TzString(error))
    }
}

impl From<SerializationError> for Error {
    fn from(error: SerializationError) -> Self {
        Self::InvalidTimeZone(InvalidTimeZoneError::Serialization(error))
    }
}

impl From<InvalidRuleError> for Error {
    fn from(error: InvalidRuleError) -> Self {
        Self::InvalidRule(error)
    }
}

impl From<DateTimeError> for Error {
    fn from(error: DateTimeError) -> Self {
        Self::DateTime(error)
    }
}

/// Corrupt or malformed time zone data
#[non_exhaustive]
#[derive(Debug)]
pub enum InvalidTimeZoneError {
    /// Invalid TZif file
    TzFile(TzFileError),
    /// Invalid POSIX TZ string
    TzString(TzStringError),
    /// Invalid serialized time zone string
    Serialization(SerializationError),
    /// Time zone data produced out of range rules
    InvalidRule(InvalidRuleError),
    /// Time zone file could not be read
    Io(io::Error),
}

impl fmt::Display for InvalidTimeZoneError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::TzFile(error) => error.fmt(f),
            Self::TzString(error) => error.fmt(f),
            Self::Serialization(error) => error.fmt(f),
            Self::InvalidRule(error) => error.fmt(f),
            Self::Io(error) => error.fmt(f),
        }
    }
}

impl error::Error for InvalidTimeZoneError {}

impl From<TzFileError> for InvalidTimeZoneError {
    fn from(error: TzFileError) -> Self {
        Self::TzFile(error)
    }
}

impl From<TzStringError> for InvalidTimeZoneError {
    fn from(error: TzStringError) -> Self {
        Self::TzString(error)
    }
}

impl From<InvalidRuleError> for InvalidTimeZoneError {
    fn from(error: InvalidRuleError) -> Self {
        Self::InvalidRule(error)
    }
}

/// Parsing error for a TZif file
#[non_exhaustive]
#[derive(Debug)]
pub enum TzFileError {
    /// Conversion from slice to array error
    TryFromSlice(TryFromSliceError),
    /// I/O error
    Io(io::Error),
    /// UTF-8 error
    Utf8(Utf8Error),
    /// Invalid TZif file
    InvalidTzFile(&'static str),
    /// Unsupported TZif file
    UnsupportedTzFile(&'static str),
}

impl fmt::Display for TzFileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::TryFromSlice(error) => error.fmt(f),
            Self::Io(error) => write!(f, "truncated TZif file: {}", error),
            Self::Utf8(error) => error.fmt(f),
            Self::InvalidTzFile(error) => write!(f, "invalid TZif file: {}", error),
            Self::UnsupportedTzFile(error) => write!(f, "unsupported TZif file: {}", error),
        }
    }
}

impl error::Error for TzFileError {}

impl From<TryFromSliceError> for TzFileError {
    fn from(error: TryFromSliceError) -> Self {
        Self::TryFromSlice(error)
    }
}

impl From<io::Error> for TzFileError {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<Utf8Error> for TzFileError {
    fn from(error: Utf8Error) -> Self {
        Self::Utf8(error)
    }
}

/// Parsing error for a POSIX TZ string
#[non_exhaustive]
#[derive(Debug)]
pub enum TzStringError {
    /// I/O error
    Io(io::Error),
    /// Integer parsing error
    ParseInt(ParseIntError),
    /// UTF-8 error
    Utf8(Utf8Error),
    /// Invalid TZ string
    InvalidTzString(&'static str),
    /// Transition time built from the TZ string is out of range
    InvalidRule(InvalidRuleError),
}

impl fmt::Display for TzStringError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(error) => error.fmt(f),
            Self::ParseInt(error) => error.fmt(f),
            Self::Utf8(error) => error.fmt(f),
            Self::InvalidTzString(error) => write!(f, "invalid TZ string: {}", error),
            Self::InvalidRule(error) => write!(f, "invalid TZ string: {}", error),
        }
    }
}

impl error::Error for TzStringError {}

impl From<io::Error> for TzStringError {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<ParseIntError> for TzStringError {
    fn from(error: ParseIntError) -> Self {
        Self::ParseInt(error)
    }
}

impl From<Utf8Error> for TzStringError {
    fn from(error: Utf8Error) -> Self {
        Self::Utf8(error)
    }
}

impl From<InvalidRuleError> for TzStringError {
    fn from(error: InvalidRuleError) -> Self {
        Self::InvalidRule(error)
    }
}

/// Parsing error for a serialized time zone string
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SerializationError(pub &'static str);

impl fmt::Display for SerializationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid serialized time zone: {}", self.0)
    }
}

impl error::Error for SerializationError {}

/// Out of range time zone, adjustment rule or transition time parameters
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct InvalidRuleError(pub &'static str);

impl fmt::Display for InvalidRuleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid adjustment rule: {}", self.0)
    }
}

impl error::Error for InvalidRuleError {}

/// Date time error
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DateTimeError(pub &'static str);

impl fmt::Display for DateTimeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid date time: {}", self.0)
    }
}

impl error::Error for DateTimeError {}
