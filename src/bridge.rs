//! The bridge between the metadata stream and the chat side.
//!
//! The bridge remembers the last song seen on the stream and answers the
//! chat tokens forwarded by the session. By default it only logs its
//! answers; given a [`CommandSender`] it also says them in the room and
//! announces new songs while auto-announce is on.

use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::command::{Command, CommandSender};
use crate::error::{BridgeError, IcyError};
use crate::settings::{spawn_auto_settings, AutoSettingsHandle};

/// Why the bridge stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BridgeEnd {
    /// The metadata stream ended; reopening it is up to the caller.
    StreamEnded,
    /// The chat side closed the token channel.
    ChatClosed,
}

/// Joins one metadata stream to the chat token channel.
#[derive(Debug)]
pub struct MetaBridge {
    settings: AutoSettingsHandle,
    replies: Option<CommandSender>,
    last_song: Option<String>,
}

impl MetaBridge {
    /// A log-only bridge.
    pub fn new(settings: AutoSettingsHandle) -> Self {
        Self {
            settings,
            replies: None,
            last_song: None,
        }
    }

    /// Also relay answers and announcements to the room through `commands`.
    pub fn with_replies(mut self, commands: CommandSender) -> Self {
        self.replies = Some(commands);
        self
    }

    /// The last song seen on the stream.
    pub fn last_song(&self) -> Option<&str> {
        self.last_song.as_deref()
    }

    /// Run until the metadata stream ends or the token channel closes.
    ///
    /// The token receiver is borrowed so that a caller can run a new bridge
    /// on the same chat side after reopening the stream.
    pub async fn run<M>(
        &mut self,
        metadata: M,
        requests: &mut mpsc::Receiver<String>,
    ) -> Result<BridgeEnd, BridgeError>
    where
        M: Stream<Item = Result<String, IcyError>>,
    {
        futures_util::pin_mut!(metadata);

        loop {
            tokio::select! {
                next = metadata.next() => match next {
                    Some(Ok(song)) => self.on_song(song).await?,
                    Some(Err(e)) => return Err(e.into()),
                    None => {
                        info!("metadata stream ended");
                        return Ok(BridgeEnd::StreamEnded);
                    }
                },
                request = requests.recv() => match request {
                    Some(token) if !token.is_empty() => self.on_request(&token).await?,
                    _ => {
                        info!("chat side is gone, stopping the bridge");
                        return Ok(BridgeEnd::ChatClosed);
                    }
                },
            }
        }
    }

    async fn on_song(&mut self, song: String) -> Result<(), BridgeError> {
        info!(song = %song, "new metadata");
        let changed = self.last_song.as_deref() != Some(song.as_str());

        if changed && self.replies.is_some() && self.settings.get().await?.auto_announce_last {
            self.relay(format!("Now playing: {}", song));
        }
        self.last_song = Some(song);
        Ok(())
    }

    async fn on_request(&mut self, token: &str) -> Result<(), BridgeError> {
        match token {
            "?autolast?" => {
                self.settings.toggle_last().await?;
                let settings = self.settings.get().await?;
                info!(auto_last = settings.auto_announce_last, "AUTOLAST toggled");
                let state = if settings.auto_announce_last { "on" } else { "off" };
                self.relay(format!("Auto-announce is {}", state));
            }
            "?lastsong?" => {
                let song = self.last_song.clone();
                info!(
                    song = song.as_deref().unwrap_or(""),
                    "request for the last song"
                );
                match song {
                    Some(song) => self.relay(format!("Last song: {}", song)),
                    None => self.relay("No song seen yet".to_string()),
                }
            }
            "?tweet?" | "?autotweet?" => debug!(token, "no handler for token"),
            other => debug!(token = other, "ignoring unknown token"),
        }
        Ok(())
    }

    fn relay(&mut self, text: String) {
        let Some(commands) = &self.replies else {
            return;
        };
        if commands.try_send(Command::reply(text)).is_err() {
            if commands.is_closed() {
                debug!("session is gone, no more replies");
                self.replies = None;
            } else {
                warn!("command queue full, dropping reply");
            }
        }
    }
}

/// Open `url` and bridge its metadata to `requests` with fresh settings.
#[cfg(feature = "http")]
pub async fn get_meta(
    url: &str,
    requests: &mut mpsc::Receiver<String>,
    replies: Option<CommandSender>,
) -> Result<BridgeEnd, BridgeError> {
    info!("Shoutcast stream metadata yanker");
    let stream = crate::icy::open_stream(url).await?;

    let mut bridge = MetaBridge::new(spawn_auto_settings());
    if let Some(commands) = replies {
        bridge = bridge.with_replies(commands);
    }
    bridge.run(stream.into_extractor().into_stream(), requests).await
}
