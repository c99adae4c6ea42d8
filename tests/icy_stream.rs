//! Metadata extraction and the bridge, end to end over in-memory pipes.

use std::time::Duration;

use futures_util::{stream, StreamExt};
use icy_metabot::icy::{metadata_stream, BLOCK_UNIT};
use icy_metabot::{spawn_auto_settings, BridgeEnd, IrcSession, MetaBridge, SessionConfig};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

/// One length byte plus the NUL-padded payload.
fn block(text: &str) -> Vec<u8> {
    let units = (text.len() + BLOCK_UNIT - 1) / BLOCK_UNIT;
    let mut out = vec![units as u8];
    out.extend_from_slice(text.as_bytes());
    out.resize(1 + units * BLOCK_UNIT, 0);
    out
}

#[tokio::test]
async fn test_realistic_body() {
    let interval = 32;
    let mut body = Vec::new();
    body.extend(vec![0x55; interval]);
    body.extend(block("StreamTitle='Rock; Roll - The Band';StreamUrl='http://x';"));
    body.extend(vec![0x66; interval]);
    body.push(0);
    body.extend(vec![0x77; interval]);
    body.extend(block("StreamTitle='';"));
    body.extend(vec![0x88; interval]);
    body.extend(block("StreamUrl=nothing;"));
    body.extend(vec![0x99; interval / 2]);

    let values: Vec<String> = metadata_stream(&body[..], interval)
        .map(Result::unwrap)
        .collect()
        .await;
    assert_eq!(values, vec!["Rock; Roll - The Band", "", "nothing"]);
}

#[tokio::test]
async fn test_payload_without_equals_is_skipped() {
    let mut body = Vec::new();
    body.extend([0u8; 4]);
    body.extend(block("garbage"));
    body.extend([0u8; 4]);
    body.extend(block("StreamTitle='After';"));

    let values: Vec<String> = metadata_stream(&body[..], 4)
        .map(Result::unwrap)
        .collect()
        .await;
    assert_eq!(values, vec!["After"]);
}

#[tokio::test]
async fn test_bridge_answers_in_channel() {
    let (bot_side, server_side) = tokio::io::duplex(4096);
    let config = SessionConfig::new("irc.example.net:6667", "metabot", "#radio");
    let (session, mut tokens) = IrcSession::start(bot_side, config).await.unwrap();

    let (server_read, mut server_write) = tokio::io::split(server_side);
    let mut wire = BufReader::new(server_read).lines();
    for _ in 0..3 {
        timeout(WAIT, wire.next_line()).await.unwrap().unwrap();
    }

    let (mut icy_write, icy_read) = tokio::io::duplex(1024);
    let songs = metadata_stream(icy_read, 8).chain(stream::pending());
    let mut bridge = MetaBridge::new(spawn_auto_settings()).with_replies(session.commands());
    let bridge = tokio::spawn(async move {
        let end = bridge.run(songs, &mut tokens).await;
        (end, bridge)
    });

    server_write
        .write_all(b":dj!d@radio PRIVMSG #radio :?autolast?\r\n")
        .await
        .unwrap();
    assert_eq!(
        timeout(WAIT, wire.next_line()).await.unwrap().unwrap().as_deref(),
        Some("PRIVMSG #radio :Auto-announce is on")
    );

    icy_write.write_all(&[0xAB; 8]).await.unwrap();
    icy_write
        .write_all(&block("StreamTitle='Song A - Artist';"))
        .await
        .unwrap();
    assert_eq!(
        timeout(WAIT, wire.next_line()).await.unwrap().unwrap().as_deref(),
        Some("PRIVMSG #radio :Now playing: Song A - Artist")
    );

    server_write
        .write_all(b":dj!d@radio PRIVMSG #radio :?lastsong?\r\n")
        .await
        .unwrap();
    assert_eq!(
        timeout(WAIT, wire.next_line()).await.unwrap().unwrap().as_deref(),
        Some("PRIVMSG #radio :Last song: Song A - Artist")
    );

    session.quit().await.unwrap();
    session.join().await.unwrap();

    let (end, bridge) = timeout(WAIT, bridge).await.unwrap().unwrap();
    assert_eq!(end.unwrap(), BridgeEnd::ChatClosed);
    assert_eq!(bridge.last_song(), Some("Song A - Artist"));
}
