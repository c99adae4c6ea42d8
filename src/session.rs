//! The IRC session: login, keep-alive, and command dispatch.
//!
//! A session runs three tasks joined by channels:
//!
//! ```text
//! socket ─▶ reader ─lines─▶ processor ─actions─▶ dispatcher ─▶ socket
//!                                                  ▲      │
//!                                   CommandSender ─┘      └─tokens─▶ consumer
//! ```
//!
//! The dispatcher owns the only write half, so every line that reaches the
//! server goes through it. End of input (or an empty line) closes the line
//! channel, which closes the action channel, which ends the dispatcher and
//! drops the token sender; whoever consumes tokens sees the channel close.
//! Tokens are handed over without waiting: when the consumer is not keeping
//! up they are dropped, so the connection is never held hostage by it.

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, warn};

use crate::codec::LineCodec;
use crate::command::{Command, CommandSender};
use crate::error::{Result, SessionError};
use crate::message::ChatGrammar;

/// Chat tokens forwarded to the token consumer.
pub const RECOGNIZED_TOKENS: [&str; 4] = ["?lastsong?", "?tweet?", "?autolast?", "?autotweet?"];

/// Realname sent in `USER` when none is configured.
pub const DEFAULT_REALNAME: &str = "tutorial bot";

/// Answer to anyone addressing the bot by name.
pub const GREETING_REPLY: &str = "Sup?";

const COMMAND_QUEUE_DEPTH: usize = 16;

/// Tokens held for a consumer that is not reading; beyond this they are dropped.
pub const TOKEN_QUEUE_DEPTH: usize = 16;

/// Connection parameters for an [`IrcSession`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// `host:port` of the IRC server.
    pub server: String,
    /// Nickname (also used as the username).
    pub nickname: String,
    /// The single channel the bot joins, including `#`.
    pub room: String,
    /// Realname sent with `USER`.
    pub realname: String,
    /// Send [`Command::StringReply`] to its `to` field instead of the room.
    pub honor_reply_target: bool,
}

impl SessionConfig {
    /// Configuration with the default realname, always replying in the room.
    pub fn new(
        server: impl Into<String>,
        nickname: impl Into<String>,
        room: impl Into<String>,
    ) -> Self {
        Self {
            server: server.into(),
            nickname: nickname.into(),
            room: room.into(),
            realname: DEFAULT_REALNAME.to_string(),
            honor_reply_target: false,
        }
    }

    /// Set the realname.
    pub fn with_realname(mut self, realname: impl Into<String>) -> Self {
        self.realname = realname.into();
        self
    }

    /// Choose whether replies go to their named recipient.
    pub fn with_reply_target(mut self, honor: bool) -> Self {
        self.honor_reply_target = honor;
        self
    }

    fn login_lines(&self) -> [String; 3] {
        [
            format!("NICK {}", self.nickname),
            format!("USER {} 0 * :{}", self.nickname, self.realname),
            format!("JOIN {}", self.room),
        ]
    }
}

/// Lifecycle of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Transport accepted, login not yet sent.
    Connecting,
    /// `NICK`/`USER`/`JOIN` written and flushed.
    Joined,
    /// Loops are running.
    Running,
    /// The dispatcher has exited.
    Terminated,
}

/// How a session ended without error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    /// The server closed the connection or sent an empty line.
    Disconnected,
    /// A [`Command::Quit`] was processed.
    Quit,
}

/// What the processor wants done about one inbound line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineAction {
    /// Write this line back immediately (the `PONG` for a `PING`).
    Keepalive(String),
    /// Execute a command (the greeting reply).
    Reply(Command),
    /// Hand a recognized chat token to the consumer.
    Forward(String),
}

/// Decide what to do with one filtered line.
///
/// `PING :x` becomes `PONG :x`. A channel message whose body starts with
/// `nickname` gets a greeting aimed at the sender; a body equal to one of
/// [`RECOGNIZED_TOKENS`] is forwarded. Everything else, actions included,
/// yields `None`.
pub fn process_line(grammar: &ChatGrammar, nickname: &str, line: &str) -> Option<LineAction> {
    if line.starts_with("PING :") {
        return Some(LineAction::Keepalive(line.replacen("PING", "PONG", 1)));
    }

    debug!(line = %line, "recv");
    let message = grammar.parse(line)?;

    if message.is_action {
        None
    } else if message.is_addressed_to(nickname) {
        Some(LineAction::Reply(Command::reply_to(
            message.nick,
            GREETING_REPLY,
        )))
    } else if RECOGNIZED_TOKENS.contains(&message.body.as_str()) {
        Some(LineAction::Forward(message.body))
    } else {
        None
    }
}

/// Entry points for starting a session.
#[derive(Debug)]
pub struct IrcSession;

impl IrcSession {
    /// Connect over TCP to `config.server` and start the session.
    ///
    /// Returns the session handle and the channel of forwarded chat tokens.
    pub async fn connect(config: SessionConfig) -> Result<(SessionHandle, mpsc::Receiver<String>)> {
        info!(
            server = %config.server,
            nick = %config.nickname,
            room = %config.room,
            "IRC bot connecting"
        );
        let stream = TcpStream::connect(&config.server).await?;
        if let Err(e) = enable_keepalive(&stream) {
            warn!("failed to enable TCP keepalive: {}", e);
        }
        info!("done connecting");

        Self::start(stream, config).await
    }

    /// Log in over an already connected stream and spawn the session tasks.
    ///
    /// The login is written and flushed before this returns; no server
    /// acknowledgment is awaited.
    pub async fn start<S>(
        stream: S,
        config: SessionConfig,
    ) -> Result<(SessionHandle, mpsc::Receiver<String>)>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (state_tx, state_rx) = watch::channel(SessionState::Connecting);
        let (read_half, write_half) = tokio::io::split(stream);

        let mut writer = FramedWrite::new(write_half, LineCodec::new());
        for line in config.login_lines() {
            writer.feed(line).await?;
        }
        writer.flush().await?;
        state_tx.send_replace(SessionState::Joined);

        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let (line_tx, line_rx) = mpsc::channel(1);
        let (action_tx, action_rx) = mpsc::channel(1);
        let (token_tx, token_rx) = mpsc::channel(TOKEN_QUEUE_DEPTH);

        tokio::spawn(read_lines(
            FramedRead::new(read_half, LineCodec::new()),
            line_tx,
        ));
        tokio::spawn(process_lines(
            ChatGrammar::new(),
            config.nickname.clone(),
            line_rx,
            action_tx,
        ));

        let dispatcher = Dispatcher {
            writer,
            room: config.room,
            honor_reply_target: config.honor_reply_target,
            tokens: Some(token_tx),
        };
        state_tx.send_replace(SessionState::Running);
        let task = tokio::spawn(dispatcher.run(command_rx, action_rx, state_tx));

        let handle = SessionHandle {
            commands: CommandSender::new(command_tx),
            state: state_rx,
            task,
        };
        Ok((handle, token_rx))
    }
}

/// Handle to a running session.
#[derive(Debug)]
pub struct SessionHandle {
    commands: CommandSender,
    state: watch::Receiver<SessionState>,
    task: JoinHandle<Result<SessionEnd>>,
}

impl SessionHandle {
    /// A sender for queueing commands.
    pub fn commands(&self) -> CommandSender {
        self.commands.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// A receiver that observes lifecycle changes.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Say `text` in the room.
    pub async fn string_reply(&self, text: impl Into<String>, to: Option<&str>) -> Result<()> {
        self.commands.string_reply(text, to).await
    }

    /// Ask the session to quit.
    pub async fn quit(&self) -> Result<()> {
        self.commands.quit().await
    }

    /// Wait for the dispatcher to finish.
    ///
    /// An `Err` here is one of the fatal conditions: a failed write or
    /// flush after login.
    pub async fn join(self) -> Result<SessionEnd> {
        match self.task.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Err(SessionError::Closed),
        }
    }
}

fn enable_keepalive(stream: &TcpStream) -> anyhow::Result<()> {
    use socket2::{SockRef, TcpKeepalive};
    use std::time::Duration;

    let sock = SockRef::from(stream);
    let keepalive = TcpKeepalive::new()
        .with_time(Duration::from_secs(120))
        .with_interval(Duration::from_secs(30));

    sock.set_tcp_keepalive(&keepalive)?;
    Ok(())
}

async fn read_lines<S>(mut lines: FramedRead<ReadHalf<S>, LineCodec>, tx: mpsc::Sender<String>)
where
    S: AsyncRead,
{
    while let Some(next) = lines.next().await {
        match next {
            Ok(line) => {
                if tx.send(line).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!("read failed: {}", e);
                break;
            }
        }
    }
    debug!("reader finished");
}

async fn process_lines(
    grammar: ChatGrammar,
    nickname: String,
    mut lines: mpsc::Receiver<String>,
    actions: mpsc::Sender<LineAction>,
) {
    while let Some(line) = lines.recv().await {
        if line.is_empty() {
            info!("empty line from server, ending session");
            break;
        }
        if let Some(action) = process_line(&grammar, &nickname, &line) {
            if actions.send(action).await.is_err() {
                break;
            }
        }
    }
}

struct Dispatcher<S> {
    writer: FramedWrite<WriteHalf<S>, LineCodec>,
    room: String,
    honor_reply_target: bool,
    tokens: Option<mpsc::Sender<String>>,
}

impl<S: AsyncWrite> Dispatcher<S> {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut actions: mpsc::Receiver<LineAction>,
        state: watch::Sender<SessionState>,
    ) -> Result<SessionEnd> {
        let result = self.dispatch(&mut commands, &mut actions).await;
        state.send_replace(SessionState::Terminated);
        match &result {
            Ok(end) => info!(?end, "session terminated"),
            Err(e) => warn!("session failed: {}", e),
        }
        result
    }

    async fn dispatch(
        &mut self,
        commands: &mut mpsc::Receiver<Command>,
        actions: &mut mpsc::Receiver<LineAction>,
    ) -> Result<SessionEnd> {
        loop {
            tokio::select! {
                Some(command) = commands.recv() => {
                    if let Some(end) = self.proc_command(command).await? {
                        return Ok(end);
                    }
                }
                action = actions.recv() => match action {
                    Some(action) => {
                        if let Some(end) = self.proc_action(action).await? {
                            return Ok(end);
                        }
                    }
                    None => return Ok(SessionEnd::Disconnected),
                },
            }
        }
    }

    async fn proc_action(&mut self, action: LineAction) -> Result<Option<SessionEnd>> {
        match action {
            LineAction::Keepalive(line) => {
                self.writer.send(line).await?;
                Ok(None)
            }
            LineAction::Reply(command) => self.proc_command(command).await,
            LineAction::Forward(token) => {
                self.forward(token);
                Ok(None)
            }
        }
    }

    /// Hand a token to the consumer without waiting.
    fn forward(&mut self, token: String) {
        let Some(tokens) = &self.tokens else {
            return;
        };
        match tokens.try_send(token) {
            Ok(()) => {}
            Err(TrySendError::Full(token)) => warn!(token = %token, "token consumer busy, dropping token"),
            Err(TrySendError::Closed(_)) => {
                debug!("token consumer is gone, dropping further tokens");
                self.tokens = None;
            }
        }
    }

    async fn proc_command(&mut self, command: Command) -> Result<Option<SessionEnd>> {
        match command {
            Command::StringReply { to, text } => {
                let target = match to {
                    Some(to) if self.honor_reply_target => to,
                    _ => self.room.clone(),
                };
                self.writer
                    .send(format!("PRIVMSG {} :{}", target, text))
                    .await?;
            }
            Command::Quit => {
                info!("shutting down because of a Quit command");
                return Ok(Some(SessionEnd::Quit));
            }
            Command::SetInterval(value) => {
                // TODO: feed the interval into MetaBridge's auto-announce once it has a timer
                info!(value, "interval set request");
            }
            Command::Raw(line) => {
                self.writer.send(line).await?;
            }
        }
        Ok(None)
    }
}
