#![no_main]
use libfuzzer_sys::fuzz_target;

use tzinfo::TimeZoneInfo;

fuzz_target!(|data: &[u8]| {
    if let Ok(source) = std::str::from_utf8(data) {
        if let Ok(time_zone) = TimeZoneInfo::from_serialized_string(source) {
            assert!(TimeZoneInfo::from_serialized_string(&time_zone.to_serialized_string()).is_ok());
        }
    }
});
