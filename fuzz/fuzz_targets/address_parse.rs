#![no_main]

use deadswitch_core::Address;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Address parsing must never panic, and anything it accepts must
    // survive a display/parse round trip.
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(addr) = s.parse::<Address>() {
            let reparsed: Address = addr.to_string().parse().expect("display output parses");
            assert_eq!(reparsed, addr);
        }
    }
});
