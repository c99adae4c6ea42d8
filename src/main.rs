//! `icy-metabot` command line.
//!
//! `meta <URL>` prints every metadata change of a stream, reconnecting
//! forever. `bot ... <URL>` joins an IRC channel and answers song requests
//! from the stream's metadata.

use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use icy_metabot::icy::stream_meta;
use icy_metabot::session::DEFAULT_REALNAME;
use icy_metabot::{
    get_meta, BridgeEnd, BridgeError, CommandSender, IrcSession, SessionConfig,
};

const RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Parser)]
#[command(name = "icy-metabot", version, about)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Print stream metadata to stdout, e.g. `meta http://radioxenu.com:8000/relay`
    Meta {
        /// Stream URL
        url: String,
    },
    /// Join IRC and answer requests about the stream
    Bot(BotArgs),
}

#[derive(Debug, Args)]
struct BotArgs {
    /// IRC server as host:port
    #[arg(long, env = "METABOT_SERVER")]
    server: String,
    /// Nickname
    #[arg(long, env = "METABOT_NICK", default_value = "metabot")]
    nick: String,
    /// Channel to join, including '#'
    #[arg(long, env = "METABOT_ROOM")]
    room: String,
    /// Realname sent at login
    #[arg(long, default_value = DEFAULT_REALNAME)]
    realname: String,
    /// Send replies to their named recipient instead of the room
    #[arg(long)]
    reply_to_sender: bool,
    /// Say bridge answers in the channel instead of only logging them
    #[arg(long)]
    relay_replies: bool,
    /// Stream URL
    url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    match Cli::parse().mode {
        Mode::Meta { url } => run_meta(&url).await,
        Mode::Bot(args) => run_bot(args).await,
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_meta(url: &str) -> anyhow::Result<()> {
    loop {
        match stream_meta(url).await {
            Ok(()) => info!("stream ended, reopening"),
            Err(e) if e.is_setup() => warn!("could not open stream: {}", e),
            Err(e) => return Err(e).context("metadata stream failed"),
        }
        tokio::time::sleep(RETRY_DELAY).await;
    }
}

async fn run_bot(args: BotArgs) -> anyhow::Result<()> {
    let config = SessionConfig::new(args.server, args.nick, args.room)
        .with_realname(args.realname)
        .with_reply_target(args.reply_to_sender);

    let (session, mut tokens) = IrcSession::connect(config)
        .await
        .context("could not start the IRC session")?;

    let replies = args.relay_replies.then(|| session.commands());
    let url = args.url;
    let mut bridge = tokio::spawn(async move { follow_stream(&url, &mut tokens, replies).await });

    let session_done = session.join();
    tokio::pin!(session_done);

    tokio::select! {
        end = &mut session_done => {
            let end = end.context("IRC session failed")?;
            info!(?end, "IRC session over");
        }
        result = &mut bridge => {
            result
                .context("metadata bridge panicked")?
                .context("metadata bridge failed")?;
            let end = session_done.await.context("IRC session failed")?;
            info!(?end, "IRC session over");
        }
    }
    Ok(())
}

/// Keep a bridge running on `url` until the chat side closes.
async fn follow_stream(
    url: &str,
    tokens: &mut mpsc::Receiver<String>,
    replies: Option<CommandSender>,
) -> Result<(), BridgeError> {
    loop {
        match get_meta(url, tokens, replies.clone()).await {
            Ok(BridgeEnd::ChatClosed) => return Ok(()),
            Ok(BridgeEnd::StreamEnded) => info!("stream ended, reopening"),
            Err(BridgeError::Metadata(e)) if e.is_setup() => {
                warn!("could not open stream: {}", e)
            }
            Err(e) => return Err(e),
        }
        tokio::time::sleep(RETRY_DELAY).await;
    }
}
