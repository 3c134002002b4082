//! Cache of the system time zones.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::datetime::{DateTime, DateTimeKind};
use crate::error::Error;
use crate::system::{self, Config};
use crate::timezone::{convert_time, convert_time_unchecked, ConversionMode, TimeZoneInfo, UTC_ID};

/// Maximum length of a time zone id
const MAX_ID_LENGTH: usize = 255;

/// Cache of the system time zones and of the local time zone.
///
/// Time zones are loaded lazily from the time zone directory of the configuration, and shared between lookups.
/// Clearing the cache does not affect the time zones already returned.
#[derive(Debug)]
pub struct ZoneCache {
    /// Configuration of the system time zones
    config: Config,
    /// Current cache generation
    data: RwLock<Arc<CachedData>>,
}

/// Cache generation
#[derive(Debug)]
struct CachedData {
    /// Cached state, locked for every lookup
    state: Mutex<CacheState>,
}

#[derive(Debug)]
struct CacheState {
    /// Loaded time zones, indexed by lowercase id
    zones: HashMap<String, Arc<TimeZoneInfo>>,
    /// Local time zone, once discovered
    local: Option<Arc<TimeZoneInfo>>,
    /// `true` if every time zone listed by the system has been loaded
    all_zones_read: bool,
    /// Sorted list of the system time zones
    sorted_zones: Option<Vec<Arc<TimeZoneInfo>>>,
}

impl CachedData {
    fn new() -> Self {
        let utc = TimeZoneInfo::utc();
        let zones = HashMap::from([(utc.id().to_ascii_lowercase(), utc)]);

        Self { state: Mutex::new(CacheState { zones, local: None, all_zones_read: false, sorted_zones: None }) }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ZoneCache {
    /// Construct an empty cache
    pub fn new(config: Config) -> Self {
        Self { config, data: RwLock::new(Arc::new(CachedData::new())) }
    }

    /// Construct an empty cache configured from the `TZDIR` and `TZ` environment variables
    pub fn from_env() -> Self {
        Self::new(Config::from_env())
    }

    /// Returns the configuration of the system time zones
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the current cache generation
    fn data(&self) -> Arc<CachedData> {
        Arc::clone(&self.data.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Discard every cached time zone, including the local time zone
    pub fn clear(&self) {
        debug!("clearing time zone cache");
        *self.data.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(CachedData::new());
    }

    /// Returns the local time zone, discovering it on first use.
    ///
    /// The local time zone is a distinct instance even when it has the same id as a system time zone, and falls back to UTC if it cannot be loaded.
    pub fn local(&self) -> Arc<TimeZoneInfo> {
        let data = self.data();
        let mut state = data.lock();

        if let Some(local) = &state.local {
            return Arc::clone(local);
        }

        let local = Arc::new(system::local_time_zone(&self.config));
        state.local = Some(Arc::clone(&local));
        local
    }

    /// Returns the UTC time zone
    pub fn utc(&self) -> Arc<TimeZoneInfo> {
        TimeZoneInfo::utc()
    }

    /// Find a system time zone by id, ignoring case
    pub fn find_system_time_zone_by_id(&self, id: &str) -> Result<Arc<TimeZoneInfo>, Error> {
        if id.eq_ignore_ascii_case(UTC_ID) {
            return Ok(TimeZoneInfo::utc());
        }

        if id.is_empty() || id.len() > MAX_ID_LENGTH || id.contains('\0') {
            return Err(Error::TimeZoneNotFound(id.to_owned()));
        }

        let data = self.data();
        let mut state = data.lock();

        if let Some(time_zone) = state.zones.get(&id.to_ascii_lowercase()) {
            return Ok(Arc::clone(time_zone));
        }

        if state.all_zones_read {
            return Err(Error::TimeZoneNotFound(id.to_owned()));
        }

        let time_zone = Arc::new(self.load(id)?);
        state.zones.insert(id.to_ascii_lowercase(), Arc::clone(&time_zone));

        Ok(time_zone)
    }

    /// Returns every system time zone, sorted by base offset and then by display name.
    ///
    /// Time zones which cannot be loaded are skipped.
    pub fn get_system_time_zones(&self) -> Vec<Arc<TimeZoneInfo>> {
        let data = self.data();
        let mut state = data.lock();

        if let Some(sorted_zones) = &state.sorted_zones {
            return sorted_zones.clone();
        }

        for id in system::zone_tab_ids(&self.config) {
            let key = id.to_ascii_lowercase();
            if state.zones.contains_key(&key) {
                continue;
            }

            match self.load(&id) {
                Ok(time_zone) => {
                    state.zones.insert(key, Arc::new(time_zone));
                }
                Err(_error) => debug!("skipping system time zone {:?}: {}", id, _error),
            }
        }

        let mut sorted_zones: Vec<_> = state.zones.values().cloned().collect();
        sorted_zones.sort_by(|x, y| x.base_utc_offset().cmp(&y.base_utc_offset()).then_with(|| x.display_name().cmp(y.display_name())));

        state.all_zones_read = true;
        state.sorted_zones = Some(sorted_zones.clone());

        sorted_zones
    }

    /// Load a system time zone from its file
    fn load(&self, id: &str) -> Result<TimeZoneInfo, Error> {
        let bytes = system::read_time_zone_data(&self.config, id)?;
        trace!("loading time zone {:?}", id);
        TimeZoneInfo::from_tz_data_with_options(id, &bytes, false)
    }

    /// Returns the current local date time, with a [`DateTimeKind::Local`] kind
    pub fn now(&self) -> DateTime {
        let local = self.local();
        convert_time_unchecked(DateTime::utc_now(), &TimeZoneInfo::utc(), &local, &local)
    }

    /// Convert a date time to a destination time zone.
    ///
    /// The source time zone is UTC for UTC date times, and the local time zone otherwise.
    pub fn convert_time(&self, date_time: DateTime, destination: &TimeZoneInfo) -> Result<DateTime, Error> {
        let local = self.local();

        match date_time.kind() {
            DateTimeKind::Utc => convert_time(date_time, &TimeZoneInfo::utc(), destination, ConversionMode::Strict, &local),
            _ => convert_time(date_time, &local, destination, ConversionMode::Strict, &local),
        }
    }

    /// Convert a date time from a source time zone to a destination time zone.
    ///
    /// Fails if the kind of the date time does not match the source time zone, or if the date time is invalid in the source time zone.
    pub fn convert_time_between(&self, date_time: DateTime, source: &TimeZoneInfo, destination: &TimeZoneInfo) -> Result<DateTime, Error> {
        self.convert_time_with_mode(date_time, source, destination, ConversionMode::Strict)
    }

    /// Convert a date time from a source time zone to a destination time zone, with the specified conversion mode
    pub fn convert_time_with_mode(&self, date_time: DateTime, source: &TimeZoneInfo, destination: &TimeZoneInfo, mode: ConversionMode) -> Result<DateTime, Error> {
        convert_time(date_time, source, destination, mode, &self.local())
    }

    /// Convert a UTC or unspecified date time to a destination time zone
    pub fn convert_time_from_utc(&self, date_time: DateTime, destination: &TimeZoneInfo) -> Result<DateTime, Error> {
        self.convert_time_between(date_time, &TimeZoneInfo::utc(), destination)
    }

    /// Convert a date time to UTC.
    ///
    /// UTC date times are returned unchanged, and other date times are converted from the local time zone.
    pub fn convert_time_to_utc(&self, date_time: DateTime) -> Result<DateTime, Error> {
        if date_time.kind() == DateTimeKind::Utc {
            return Ok(date_time);
        }

        self.convert_time_between(date_time, &self.local(), &TimeZoneInfo::utc())
    }

    /// Convert a date time from a source time zone to UTC
    pub fn convert_time_to_utc_from(&self, date_time: DateTime, source: &TimeZoneInfo) -> Result<DateTime, Error> {
        self.convert_time_between(date_time, source, &TimeZoneInfo::utc())
    }

    /// Convert a date time to the system time zone with the specified id
    pub fn convert_time_by_system_time_zone_id(&self, date_time: DateTime, destination_id: &str) -> Result<DateTime, Error> {
        let destination = self.find_system_time_zone_by_id(destination_id)?;
        self.convert_time(date_time, &destination)
    }

    /// Convert a date time between the system time zones with the specified ids.
    ///
    /// A local date time with the id of the local time zone, or a UTC date time with the UTC id, is converted from the local or UTC time zone respectively.
    pub fn convert_time_by_system_time_zone_ids(&self, date_time: DateTime, source_id: &str, destination_id: &str) -> Result<DateTime, Error> {
        let local = self.local();

        let source = match date_time.kind() {
            DateTimeKind::Local if source_id.eq_ignore_ascii_case(local.id()) => Arc::clone(&local),
            DateTimeKind::Utc if source_id.eq_ignore_ascii_case(UTC_ID) => TimeZoneInfo::utc(),
            _ => self.find_system_time_zone_by_id(source_id)?,
        };

        let destination = self.find_system_time_zone_by_id(destination_id)?;
        convert_time(date_time, &source, &destination, ConversionMode::Strict, &local)
    }
}
