//! Benchmarks for the inbound line path and metadata block decoding.

use bytes::BytesMut;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use icy_metabot::icy::block_value;
use icy_metabot::session::process_line;
use icy_metabot::{strip_colors, ChatGrammar, LineCodec};
use tokio_util::codec::Decoder;

/// Server keepalive
const PING_LINE: &str = "PING :irc.example.com";

/// Plain channel message
const PLAIN_MESSAGE: &str = ":nick!user@host PRIVMSG #radio :Hello, world!";

/// Colored request token
const COLORED_TOKEN: &str = ":dj!dj@radio.example.net PRIVMSG #radio :\x0304,01?lastsong?";

/// CTCP action
const ACTION_MESSAGE: &str = ":nick!user@host PRIVMSG #radio :\x01ACTION dances to the beat\x01";

/// Numeric response, not a channel message
const NUMERIC_RESPONSE: &str =
    ":irc.server.net 001 metabot :Welcome to the IRC Network metabot!user@host";

const SIMPLE_BLOCK: &[u8] = b"StreamTitle='Song A - Artist';\0\0";

const LONG_BLOCK: &[u8] = b"StreamTitle='A Rather Long Title (Extended Club Mix; feat. Someone) - The Artist';StreamUrl='http://radio.example.net/now-playing?id=12345';\0\0\0\0\0\0\0\0\0\0\0\0\0";

fn benchmark_filtering(c: &mut Criterion) {
    let mut group = c.benchmark_group("Line Filtering");

    for (name, line) in [("plain", PLAIN_MESSAGE), ("colored", COLORED_TOKEN)] {
        group.bench_with_input(BenchmarkId::new("strip_colors", name), line, |b, s| {
            b.iter(|| black_box(strip_colors(black_box(s.as_bytes()))))
        });
    }

    group.finish();
}

fn benchmark_grammar(c: &mut Criterion) {
    let mut group = c.benchmark_group("Message Grammar");
    let grammar = ChatGrammar::new();

    let lines = [
        ("plain", PLAIN_MESSAGE),
        ("action", ACTION_MESSAGE),
        ("numeric", NUMERIC_RESPONSE),
    ];
    for (name, line) in lines {
        group.bench_with_input(BenchmarkId::new("parse", name), line, |b, s| {
            b.iter(|| black_box(grammar.parse(black_box(s))))
        });
    }

    group.bench_function("process_ping", |b| {
        b.iter(|| black_box(process_line(&grammar, "metabot", black_box(PING_LINE))))
    });

    group.finish();
}

fn benchmark_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("Line Decoding");

    let mut batch = String::new();
    for _ in 0..32 {
        batch.push_str(PLAIN_MESSAGE);
        batch.push_str("\r\n");
        batch.push_str(COLORED_TOKEN);
        batch.push_str("\r\n");
    }

    group.bench_function("decode_batch", |b| {
        b.iter(|| {
            let mut codec = LineCodec::new();
            let mut buf = BytesMut::from(batch.as_bytes());
            let mut count = 0;
            while let Ok(Some(line)) = codec.decode(&mut buf) {
                black_box(line);
                count += 1;
            }
            black_box(count)
        })
    });

    group.finish();
}

fn benchmark_blocks(c: &mut Criterion) {
    let mut group = c.benchmark_group("Metadata Blocks");

    for (name, block) in [("simple", SIMPLE_BLOCK), ("long", LONG_BLOCK)] {
        group.bench_with_input(BenchmarkId::new("block_value", name), block, |b, p| {
            b.iter(|| black_box(block_value(black_box(p))))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_filtering,
    benchmark_grammar,
    benchmark_decoding,
    benchmark_blocks,
);

criterion_main!(benches);
