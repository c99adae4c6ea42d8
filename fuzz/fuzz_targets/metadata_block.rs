//! Fuzz target for metadata block decoding

#![no_main]

use icy_metabot::icy::block_value;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // a length byte allows at most 255 * 16 bytes
    if data.len() > 4080 {
        return;
    }
    if let Some(value) = block_value(data) {
        assert!(value.len() <= data.len() * 3);
    }
});
