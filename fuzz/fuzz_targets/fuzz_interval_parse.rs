//! Fuzz target: delay endpoint body parsing
//!
//! Feeds arbitrary bytes through `BlinkInterval::parse` as a response
//! body and checks:
//! - No panics on any UTF-8 input
//! - Accepted values are always at least 1 ms
//! - Accepted values agree with a plain integer parse of the trimmed body
//! - The fallback path never yields zero
//!
//! cargo fuzz run fuzz_interval_parse

#![no_main]

use internet_led::app::interval::BlinkInterval;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(body) = core::str::from_utf8(data) else {
        return;
    };

    let parsed = BlinkInterval::parse(body);
    if let Ok(interval) = parsed {
        assert!(interval.millis() >= 1);
        let expected: i64 = body.trim().parse().expect("accepted body must be an integer");
        assert_eq!(i64::from(interval.millis()), expected);
    }

    let fallback = BlinkInterval::default();
    let resolved = BlinkInterval::or_fallback(parsed, fallback);
    assert!(resolved.millis() >= 1);
});
