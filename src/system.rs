//! Discovery of the system time zone files and of the local time zone.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, InvalidTimeZoneError};
use crate::timezone::TimeZoneInfo;

/// Default system time zone directory
const DEFAULT_TIME_ZONE_DIRECTORY: &str = "/usr/share/zoneinfo/";
/// Default local time zone file
const DEFAULT_LOCALTIME_PATH: &str = "/etc/localtime";
/// File listing the canonical time zone ids, relative to the time zone directory
const ZONE_TAB: &str = "zone.tab";
/// Id of a local time zone whose file cannot be matched to a system time zone
const LOCAL_ID: &str = "Local";

/// Location of the system time zone files and selection of the local time zone.
///
/// [`Config::from_env`] reads the `TZDIR` and `TZ` environment variables.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Config {
    /// Directory containing the TZif files
    time_zone_directory: PathBuf,
    /// Value of the `TZ` environment variable, if set
    tz: Option<String>,
    /// Local time zone file used when `TZ` is not set
    localtime_path: PathBuf,
}

impl Config {
    /// Construct a configuration reading time zone files from a directory, with the local time zone read from `/etc/localtime`
    pub fn new(time_zone_directory: impl Into<PathBuf>) -> Self {
        Self { time_zone_directory: time_zone_directory.into(), tz: None, localtime_path: PathBuf::from(DEFAULT_LOCALTIME_PATH) }
    }

    /// Construct a configuration from the `TZDIR` and `TZ` environment variables.
    ///
    /// An unset or empty `TZDIR` selects `/usr/share/zoneinfo/`.
    pub fn from_env() -> Self {
        let time_zone_directory = match std::env::var_os("TZDIR") {
            Some(tzdir) if !tzdir.is_empty() => PathBuf::from(tzdir),
            _ => PathBuf::from(DEFAULT_TIME_ZONE_DIRECTORY),
        };

        let tz = std::env::var("TZ").ok();
        debug!("using time zone directory {} and TZ={:?}", time_zone_directory.display(), tz);

        Self { tz, ..Self::new(time_zone_directory) }
    }

    /// Set the value of the `TZ` variable selecting the local time zone.
    ///
    /// The value is a time zone id relative to the time zone directory or an absolute path, optionally prefixed by `:`.
    /// An empty value selects UTC.
    pub fn with_tz(self, tz: Option<&str>) -> Self {
        Self { tz: tz.map(str::to_owned), ..self }
    }

    /// Set the local time zone file used when `TZ` is not set
    pub fn with_localtime_path(self, localtime_path: impl Into<PathBuf>) -> Self {
        Self { localtime_path: localtime_path.into(), ..self }
    }

    /// Returns the time zone directory
    pub fn time_zone_directory(&self) -> &Path {
        &self.time_zone_directory
    }

    /// Returns the value of the `TZ` variable
    pub fn tz(&self) -> Option<&str> {
        self.tz.as_deref()
    }

    /// Returns the local time zone file used when `TZ` is not set
    pub fn localtime_path(&self) -> &Path {
        &self.localtime_path
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_ZONE_DIRECTORY)
    }
}

/// Read the TZif file of a system time zone
pub(crate) fn read_time_zone_data(config: &Config, id: &str) -> Result<Vec<u8>, Error> {
    let path = time_zone_file_path(config, id).ok_or_else(|| Error::TimeZoneNotFound(id.to_owned()))?;

    match fs::read(&path) {
        Ok(bytes) => Ok(bytes),
        Err(error) if error.kind() == io::ErrorKind::NotFound || path.is_dir() => Err(Error::TimeZoneNotFound(id.to_owned())),
        Err(error) => Err(InvalidTimeZoneError::Io(error).into()),
    }
}

/// Returns the path of the TZif file of a system time zone, or `None` if the id cannot name a file of the time zone directory
fn time_zone_file_path(config: &Config, id: &str) -> Option<PathBuf> {
    let relative_path = Path::new(id);

    let is_valid = !id.is_empty() && !id.contains('\0') && relative_path.components().all(|x| matches!(x, Component::Normal(_)));
    is_valid.then(|| config.time_zone_directory.join(relative_path))
}

/// Returns the time zone ids listed in the third column of `zone.tab`, or nothing if the file cannot be read
pub(crate) fn zone_tab_ids(config: &Config) -> Vec<String> {
    let path = config.time_zone_directory.join(ZONE_TAB);

    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_error) => {
            debug!("failed reading {}: {}", path.display(), _error);
            return Vec::new();
        }
    };

    parse_zone_tab(&content)
}

fn parse_zone_tab(content: &str) -> Vec<String> {
    content.lines().filter(|line| !line.is_empty() && !line.starts_with('#')).filter_map(|line| line.split('\t').nth(2)).map(str::to_owned).collect()
}

/// Construct the local time zone, falling back to UTC if it cannot be found or loaded
pub(crate) fn local_time_zone(config: &Config) -> TimeZoneInfo {
    let tz = config.tz().map(|tz| tz.strip_prefix(':').unwrap_or(tz));

    if tz == Some("") {
        debug!("TZ is set but empty, using UTC as local time zone");
        return TimeZoneInfo::utc().as_ref().clone();
    }

    let local_tz_data = match tz {
        None => load_local_tz_file(config, &config.localtime_path, None)
            .or_else(|| load_local_tz_file(config, &config.time_zone_directory.join("localtime"), None)),
        Some(tz) if tz.starts_with('/') => load_local_tz_file(config, Path::new(tz), None),
        Some(tz) => load_local_tz_file(config, &config.time_zone_directory.join(tz), Some(tz)),
    };

    match local_tz_data {
        Some((id, bytes)) => match TimeZoneInfo::from_tz_data(&id, &bytes) {
            Ok(time_zone) => {
                debug!("using {:?} as local time zone", id);
                return time_zone;
            }
            Err(_error) => warn!("failed loading local time zone {:?}, using UTC: {}", id, _error),
        },
        None => warn!("no local time zone file found, using UTC"),
    }

    TimeZoneInfo::utc().as_ref().clone()
}

/// Read a local time zone file, finding its id if not provided
fn load_local_tz_file(config: &Config, path: &Path, id: Option<&str>) -> Option<(String, Vec<u8>)> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(_error) => {
            debug!("failed reading local time zone file {}: {}", path.display(), _error);
            return None;
        }
    };

    let id = match id {
        Some(id) => id.to_owned(),
        None => id_from_symlink(config, path).or_else(|| id_from_contents(config, &bytes)).unwrap_or_else(|| LOCAL_ID.to_owned()),
    };

    Some((id, bytes))
}

/// Find the id of a local time zone file which is a symbolic link into the time zone directory
fn id_from_symlink(config: &Config, path: &Path) -> Option<String> {
    let target = fs::read_link(path).ok()?;
    let target = normalize(&path.parent().unwrap_or(Path::new("/")).join(target));

    let id = target.strip_prefix(normalize(&config.time_zone_directory)).ok()?;
    id.to_str().filter(|id| !id.is_empty()).map(str::to_owned)
}

/// Find the id of a local time zone file by comparing its contents with the files of the time zone directory.
///
/// Unreadable directories and files are skipped.
fn id_from_contents(config: &Config, bytes: &[u8]) -> Option<String> {
    let directory = &config.time_zone_directory;
    let skipped = [directory.join("localtime"), directory.join("posixrules")];

    let mut stack = vec![directory.clone()];
    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_error) => {
                debug!("failed reading directory {}: {}", dir.display(), _error);
                continue;
            }
        };

        let mut entries: Vec<_> = entries.filter_map(Result::ok).collect();
        entries.sort_by_key(|entry| entry.path());

        for entry in entries {
            let path = entry.path();

            // Symbolic links to directories are not followed
            if entry.file_type().map(|file_type| file_type.is_dir()).unwrap_or(false) {
                stack.push(path);
                continue;
            }

            if skipped.contains(&path) || !has_len(&path, bytes.len()) {
                continue;
            }

            if matches!(fs::read(&path), Ok(content) if content == bytes) {
                let id = path.strip_prefix(directory).ok()?.to_str()?.to_owned();
                trace!("matched local time zone file with {}", path.display());
                return Some(id);
            }
        }
    }

    None
}

fn has_len(path: &Path, len: usize) -> bool {
    fs::metadata(path).map(|metadata| metadata.is_file() && metadata.len() == len as u64).unwrap_or(false)
}

/// Resolve `.` and `..` components without accessing the file system
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => (),
            Component::ParentDir => {
                normalized.pop();
            }
            component => normalized.push(component),
        }
    }

    normalized
}
