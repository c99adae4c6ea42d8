//! Outbound commands for the IRC session.
//!
//! Anything that wants to put bytes on the wire builds a [`Command`] and
//! hands it to the session through a [`CommandSender`]. The session's
//! dispatch loop is the only consumer.

use std::fmt;

#[cfg(feature = "tokio")]
use tokio::sync::mpsc;

#[cfg(feature = "tokio")]
use crate::error::{Result, SessionError};

/// A request to act on the IRC connection.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Command {
    /// Say `text` in the room. `to` names the intended recipient (a nick or
    /// channel); whether it is honoured depends on the session configuration.
    StringReply {
        /// Intended recipient, if any.
        to: Option<String>,
        /// Message text.
        text: String,
    },
    /// Leave and end the session.
    Quit,
    /// Change the announce interval. Accepted and logged; no effect yet.
    SetInterval(u32),
    /// A preformatted protocol line, written as is (without CRLF).
    Raw(String),
}

/// Discriminant of a [`Command`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// [`Command::StringReply`]
    StringReply,
    /// [`Command::Quit`]
    Quit,
    /// [`Command::SetInterval`]
    SetInterval,
    /// [`Command::Raw`]
    Raw,
}

impl Command {
    /// A reply with no explicit recipient.
    pub fn reply(text: impl Into<String>) -> Self {
        Command::StringReply {
            to: None,
            text: text.into(),
        }
    }

    /// A reply meant for `to`.
    pub fn reply_to(to: impl Into<String>, text: impl Into<String>) -> Self {
        Command::StringReply {
            to: Some(to.into()),
            text: text.into(),
        }
    }

    /// The variant tag.
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::StringReply { .. } => CommandKind::StringReply,
            Command::Quit => CommandKind::Quit,
            Command::SetInterval(_) => CommandKind::SetInterval,
            Command::Raw(_) => CommandKind::Raw,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandKind::StringReply => "string-reply",
            CommandKind::Quit => "quit",
            CommandKind::SetInterval => "set-interval",
            CommandKind::Raw => "raw",
        };
        f.write_str(name)
    }
}

/// Cloneable handle for queueing commands to a running session.
#[cfg(feature = "tokio")]
#[derive(Clone, Debug)]
pub struct CommandSender {
    tx: mpsc::Sender<Command>,
}

#[cfg(feature = "tokio")]
impl CommandSender {
    pub(crate) fn new(tx: mpsc::Sender<Command>) -> Self {
        Self { tx }
    }

    /// Queue any command.
    ///
    /// Waits while the queue is full. Fails with [`SessionError::Closed`]
    /// once the session has terminated.
    pub async fn send(&self, command: Command) -> Result<()> {
        self.tx.send(command).await.map_err(|_| SessionError::Closed)
    }

    /// Queue a command without waiting.
    ///
    /// Fails with [`SessionError::Closed`] when the queue is full or the
    /// session has terminated; the command is dropped either way.
    pub fn try_send(&self, command: Command) -> Result<()> {
        self.tx.try_send(command).map_err(|_| SessionError::Closed)
    }

    /// Say `text` in the room, optionally naming a recipient.
    pub async fn string_reply(&self, text: impl Into<String>, to: Option<&str>) -> Result<()> {
        self.send(Command::StringReply {
            to: to.map(str::to_owned),
            text: text.into(),
        })
        .await
    }

    /// Ask the session to quit.
    pub async fn quit(&self) -> Result<()> {
        self.send(Command::Quit).await
    }

    /// Request a new announce interval.
    pub async fn set_interval(&self, value: u32) -> Result<()> {
        self.send(Command::SetInterval(value)).await
    }

    /// Whether the session has stopped accepting commands.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
