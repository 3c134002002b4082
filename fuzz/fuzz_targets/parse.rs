#![no_main]
use libfuzzer_sys::fuzz_target;

use tzinfo::TimeZoneInfo;

fuzz_target!(|data: &[u8]| {
    let _ = TimeZoneInfo::from_tz_data("Fuzz/Zone", data);
});
