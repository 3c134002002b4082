//! Functions used for parsing a TZif file.

use std::str;

use super::Cursor;
use crate::datetime::{DateTime, DateTimeKind};
use crate::error::TzFileError;

/// Smallest Unix time representable by a [`DateTime`]
const UNIX_TIME_MIN: i64 = -62_135_596_800;
/// Largest Unix time representable by a [`DateTime`]
const UNIX_TIME_MAX: i64 = 253_402_300_799;

/// TZif version
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TzFileVersion {
    /// Version 1, with 32-bit transition times
    V1,
    /// Version 2, with an additional 64-bit data block and a TZ string footer
    V2,
    /// Version 3, allowing TZ string extensions
    V3,
    /// Version 4, allowing leap second table truncation
    V4,
}

/// TZif header
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TzFileHeader {
    /// TZif version
    version: TzFileVersion,
    /// Number of UT/local indicators
    ut_local_count: usize,
    /// Number of standard/wall indicators
    std_wall_count: usize,
    /// Number of leap-second records
    leap_count: usize,
    /// Number of transition times
    transition_count: usize,
    /// Number of local time type records
    type_count: usize,
    /// Number of time zone designations bytes
    char_count: usize,
}

impl TzFileHeader {
    /// Parse a TZif header
    fn parse(cursor: &mut Cursor) -> Result<Self, TzFileError> {
        let magic = cursor.read_exact(4)?;
        if magic != *b"TZif" {
            return Err(TzFileError::InvalidTzFile("invalid magic number"));
        }

        let version = match cursor.read_exact(1)? {
            [0x00] => TzFileVersion::V1,
            [0x32] => TzFileVersion::V2,
            [0x33] => TzFileVersion::V3,
            [0x34] => TzFileVersion::V4,
            _ => return Err(TzFileError::UnsupportedTzFile("unsupported TZif version")),
        };

        cursor.read_exact(15)?;
        let ut_local_count = cursor.read_be_u32()?;
        let std_wall_count = cursor.read_be_u32()?;
        let leap_count = cursor.read_be_u32()?;
        let transition_count = cursor.read_be_u32()?;
        let type_count = cursor.read_be_u32()?;
        let char_count = cursor.read_be_u32()?;

        if type_count == 0 {
            return Err(TzFileError::InvalidTzFile("invalid header: no local time type"));
        }

        Ok(Self {
            version,
            ut_local_count: ut_local_count as usize,
            std_wall_count: std_wall_count as usize,
            leap_count: leap_count as usize,
            transition_count: transition_count as usize,
            type_count: type_count as usize,
            char_count: char_count as usize,
        })
    }

    /// Returns the size in bytes of the data block following the header
    fn data_block_len(&self, time_size: usize) -> Result<usize, TzFileError> {
        let lengths = [
            self.transition_count.checked_mul(time_size),
            Some(self.transition_count),
            self.type_count.checked_mul(6),
            Some(self.char_count),
            self.leap_count.checked_mul(time_size + 4),
            Some(self.std_wall_count),
            Some(self.ut_local_count),
        ];

        lengths
            .iter()
            .try_fold(0usize, |total, length| total.checked_add((*length)?))
            .ok_or(TzFileError::InvalidTzFile("invalid header: data block too large"))
    }

    /// Returns TZif version
    pub fn version(&self) -> TzFileVersion {
        self.version
    }

    /// Returns number of transition times
    pub fn transition_count(&self) -> usize {
        self.transition_count
    }

    /// Returns number of local time type records
    pub fn type_count(&self) -> usize {
        self.type_count
    }

    /// Returns number of leap-second records
    pub fn leap_count(&self) -> usize {
        self.leap_count
    }

    /// Returns number of time zone designations bytes
    pub fn char_count(&self) -> usize {
        self.char_count
    }
}

/// Local time type record of a TZif file
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct LocalTimeType {
    /// Offset from UTC in seconds
    ut_offset: i32,
    /// Daylight Saving Time indicator
    is_dst: bool,
    /// Index of the time zone designation in the designation table
    designation_index: usize,
}

impl LocalTimeType {
    /// Construct a local time type record
    pub fn new(ut_offset: i32, is_dst: bool, designation_index: usize) -> Self {
        Self { ut_offset, is_dst, designation_index }
    }

    /// Returns offset from UTC in seconds
    pub fn ut_offset(&self) -> i32 {
        self.ut_offset
    }

    /// Returns daylight saving time indicator
    pub fn is_dst(&self) -> bool {
        self.is_dst
    }

    /// Returns index of the time zone designation
    pub fn designation_index(&self) -> usize {
        self.designation_index
    }
}

/// Raw content of a TZif file.
///
/// For version 2 and later files, only the 64-bit data block is kept.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TzFile {
    /// Header of the kept data block
    header: TzFileHeader,
    /// Transition instants, in UTC
    transition_times: Vec<DateTime>,
    /// Index of the local time type starting at each transition
    transition_types: Vec<u8>,
    /// Local time types
    local_time_types: Vec<LocalTimeType>,
    /// NUL-separated time zone designations
    time_zone_designations: String,
    /// Standard/wall indicators
    std_walls: Vec<bool>,
    /// UT/local indicators
    ut_locals: Vec<bool>,
    /// POSIX TZ string describing transitions after the last one
    footer: Option<String>,
}

impl TzFile {
    /// Parse a TZif file
    pub fn parse(bytes: &[u8]) -> Result<Self, TzFileError> {
        let mut cursor = Cursor::new(bytes);

        let mut header = TzFileHeader::parse(&mut cursor)?;
        let mut time_size = 4;

        if header.version != TzFileVersion::V1 {
            // Skip the 32-bit data block, the 64-bit one follows with its own header
            cursor.read_exact(header.data_block_len(time_size)?)?;
            header = TzFileHeader::parse(&mut cursor)?;
            time_size = 8;
        }

        let mut transition_times = Vec::with_capacity(header.transition_count);
        for _ in 0..header.transition_count {
            let unix_time = match time_size {
                4 => i64::from(cursor.read_be_i32()?),
                _ => cursor.read_be_i64()?,
            };
            transition_times.push(unix_time_to_date_time(unix_time));
        }

        let transition_types = cursor.read_exact(header.transition_count)?.to_vec();
        if transition_types.iter().any(|&index| usize::from(index) >= header.type_count) {
            return Err(TzFileError::InvalidTzFile("invalid local time type index"));
        }

        let mut local_time_types = Vec::with_capacity(header.type_count);
        for _ in 0..header.type_count {
            let ut_offset = cursor.read_be_i32()?;
            let is_dst = cursor.read_exact(1)?[0] != 0;
            let designation_index = usize::from(cursor.read_exact(1)?[0]);

            if designation_index > header.char_count {
                return Err(TzFileError::InvalidTzFile("invalid time zone designation char index"));
            }

            local_time_types.push(LocalTimeType::new(ut_offset, is_dst, designation_index));
        }

        let time_zone_designations = String::from_utf8_lossy(cursor.read_exact(header.char_count)?).into_owned();

        // Leap seconds are not used for time zone conversions
        cursor.read_exact(header.leap_count * (time_size + 4))?;

        let std_walls = cursor.read_exact(header.std_wall_count)?.iter().map(|&x| x != 0).collect();
        let ut_locals = cursor.read_exact(header.ut_local_count)?.iter().map(|&x| x != 0).collect();

        let footer = match header.version {
            TzFileVersion::V1 => None,
            _ => parse_footer(cursor.remaining())?,
        };

        Ok(Self { header, transition_times, transition_types, local_time_types, time_zone_designations, std_walls, ut_locals, footer })
    }

    /// Returns header of the kept data block
    pub fn header(&self) -> &TzFileHeader {
        &self.header
    }

    /// Returns transition instants
    pub fn transition_times(&self) -> &[DateTime] {
        &self.transition_times
    }

    /// Returns the local time type index of each transition
    pub fn transition_types(&self) -> &[u8] {
        &self.transition_types
    }

    /// Returns local time types
    pub fn local_time_types(&self) -> &[LocalTimeType] {
        &self.local_time_types
    }

    /// Returns the local time type starting at the transition of the specified index
    pub fn transition_local_time_type(&self, transition_index: usize) -> Option<&LocalTimeType> {
        let type_index = *self.transition_types.get(transition_index)?;
        self.local_time_types.get(usize::from(type_index))
    }

    /// Returns the designation table
    pub fn time_zone_designations(&self) -> &str {
        &self.time_zone_designations
    }

    /// Returns the time zone designation of a local time type
    pub fn designation(&self, local_time_type: &LocalTimeType) -> &str {
        let designations = self.time_zone_designations.as_bytes();
        let tail = designations.get(local_time_type.designation_index..).unwrap_or_default();
        let end = tail.iter().position(|&c| c == b'\0').unwrap_or(tail.len());
        str::from_utf8(&tail[..end]).unwrap_or_default()
    }

    /// Returns standard/wall indicators
    pub fn std_walls(&self) -> &[bool] {
        &self.std_walls
    }

    /// Returns UT/local indicators
    pub fn ut_locals(&self) -> &[bool] {
        &self.ut_locals
    }

    /// Returns the POSIX TZ string footer, if any
    pub fn footer(&self) -> Option<&str> {
        self.footer.as_deref()
    }
}

/// Parse the newline-enclosed POSIX TZ string following the 64-bit data block
fn parse_footer(footer: &[u8]) -> Result<Option<String>, TzFileError> {
    match footer {
        [b'\n', tz_string @ .., b'\n'] => {
            let tz_string = str::from_utf8(tz_string)?;
            match tz_string.is_empty() {
                true => Ok(None),
                false => Ok(Some(tz_string.to_owned())),
            }
        }
        _ => Ok(None),
    }
}

/// Convert a Unix time to a UTC date time, clamping it to [`DateTime::MIN`] and [`DateTime::MAX`]
fn unix_time_to_date_time(unix_time: i64) -> DateTime {
    if unix_time < UNIX_TIME_MIN {
        DateTime::MIN.with_kind(DateTimeKind::Utc)
    } else if unix_time > UNIX_TIME_MAX {
        DateTime::MAX.with_kind(DateTimeKind::Utc)
    } else {
        DateTime::from_unix_time(unix_time).unwrap_or(DateTime::MIN)
    }
}
