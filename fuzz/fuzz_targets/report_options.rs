#![no_main]

use fleetcheck::report::{DetailFilter, Verbosity};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Level lists and detail patterns come straight from the command line
        let _ = input.parse::<Verbosity>();

        let mut fields = input.splitn(3, '\n');
        let group = fields.next().unwrap_or_default();
        let category = fields.next().unwrap_or_default();
        let item = fields.next().unwrap_or_default();
        let filter = DetailFilter::new(group, category, item);
        let _ = filter.matches(1, "loops_per_sec", "logical_0");
        let _ = filter.matches(12, "standalone_randread_4k_IOps", "sdb");
    }
});
