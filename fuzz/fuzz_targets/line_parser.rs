//! Fuzz target for the inbound line path
//!
//! Raw server bytes go through the color filter, the chat grammar and the
//! line processor; none of them may panic.

#![no_main]

use icy_metabot::filter::strip_colors;
use icy_metabot::message::ChatGrammar;
use icy_metabot::session::process_line;
use icy_metabot::LineCodec;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 {
        return;
    }

    let filtered = strip_colors(data);
    assert!(!filtered.contains(&0x03));

    let line = String::from_utf8_lossy(&filtered);
    let grammar = ChatGrammar::new();
    if let Some(message) = grammar.parse(&line) {
        assert!(!message.body.is_empty());
    }
    let _ = process_line(&grammar, "metabot", &line);

    let sanitized = LineCodec::sanitize(&line);
    assert!(!sanitized.contains(['\r', '\n']));
});
