//! # icy-metabot
//!
//! An IRC bot that follows the inline ("ICY") metadata of a Shoutcast or
//! Icecast stream and answers song questions in a channel.
//!
//! ## Features
//!
//! - Line-oriented IRC session with PING/PONG keep-alive and a typed
//!   outbound command queue
//! - Color-code filtering and a small grammar for channel messages
//! - Byte-exact extraction of metadata blocks from an HTTP audio body
//! - A message-passing actor for the bot's auto-announce setting
//! - Optional Tokio integration (enabled by default)

#![deny(clippy::all)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! ## Quick Start
//!
//! ### Parsing channel messages
//!
//! ```rust
//! use icy_metabot::filter::strip_colors;
//! use icy_metabot::message::ChatGrammar;
//!
//! let raw = b":dj!dj@radio PRIVMSG #radio :\x034?lastsong?";
//! let line = String::from_utf8_lossy(&strip_colors(raw)).into_owned();
//!
//! let msg = ChatGrammar::new().parse(&line).expect("channel message");
//! assert_eq!(msg.nick, "dj");
//! assert_eq!(msg.body, "?lastsong?");
//! ```
//!
//! ### Decoding a metadata block
//!
//! ```rust
//! use icy_metabot::icy::block_value;
//!
//! let block = b"StreamTitle='Song A - Artist';StreamUrl='';\0\0\0\0";
//! assert_eq!(block_value(block).as_deref(), Some("Song A - Artist"));
//! ```

#[cfg(feature = "tokio")]
pub mod bridge;
#[cfg(feature = "tokio")]
pub mod codec;
pub mod command;
pub mod error;
pub mod filter;
pub mod icy;
pub mod message;
#[cfg(feature = "tokio")]
pub mod session;
#[cfg(feature = "tokio")]
pub mod settings;

pub use self::command::{Command, CommandKind};
pub use self::error::{ActorStopped, BridgeError, IcyError, SessionError};
pub use self::filter::{strip_colors, ColorFilter, FilterState};
pub use self::message::{ChatGrammar, ChatMessage};

#[cfg(feature = "tokio")]
pub use self::bridge::{BridgeEnd, MetaBridge};
#[cfg(feature = "http")]
pub use self::bridge::get_meta;
#[cfg(feature = "tokio")]
pub use self::codec::{LineCodec, MAX_LINE_LEN};
#[cfg(feature = "tokio")]
pub use self::command::CommandSender;
#[cfg(feature = "tokio")]
pub use self::session::{
    IrcSession, LineAction, SessionConfig, SessionEnd, SessionHandle, SessionState,
};
#[cfg(feature = "tokio")]
pub use self::settings::{spawn_auto_settings, AutoSettings, AutoSettingsHandle};
