//! Channel message grammar.
//!
//! The bot only cares about one shape of line: a `PRIVMSG` to a channel,
//! sent by a user prefix. Everything else (numerics, JOINs, notices, ...)
//! is "no message" and is ignored by the session.
//!
//! ```text
//! :<nick>!<anything>PRIVMSG <#channel> :[digits][ACTION ]<body>
//! ```
//!
//! The optional leading digits soak up the color number that remains when a
//! color code was longer than the one byte the line filter removes.

use nom::{
    bytes::complete::{tag, take_until, take_while1},
    character::complete::{char, digit0},
    combinator::{opt, recognize, rest},
    error::{context, VerboseError},
    sequence::{pair, preceded, terminated},
    IResult,
};

type ParseResult<I, O> = IResult<I, O, VerboseError<I>>;

/// CTCP delimiter wrapping `ACTION` messages.
const CTCP_DELIM: char = '\x01';

/// A channel message addressed to the room the bot sits in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    /// Nickname of the sender.
    pub nick: String,
    /// Channel the message was sent to, including the `#`.
    pub channel: String,
    /// Whether this was a `/me` action.
    pub is_action: bool,
    /// Message text, with any numeric prefix and `ACTION ` marker removed.
    pub body: String,
}

impl ChatMessage {
    /// Whether the body starts with `name`, i.e. the sender addressed `name`.
    pub fn is_addressed_to(&self, name: &str) -> bool {
        !name.is_empty() && self.body.starts_with(name)
    }
}

/// The channel-message grammar.
///
/// Built once and owned by whoever parses lines; it holds no mutable state,
/// so a shared reference can be used from any task.
#[derive(Clone, Debug)]
pub struct ChatGrammar {
    verb: &'static str,
    action_marker: &'static str,
}

impl Default for ChatGrammar {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatGrammar {
    /// The grammar for `PRIVMSG` lines with `ACTION ` markers.
    pub const fn new() -> Self {
        Self {
            verb: "PRIVMSG ",
            action_marker: "ACTION ",
        }
    }

    /// Parse one filtered line.
    ///
    /// Returns `None` for anything that is not a channel message; that is
    /// the normal outcome for most server traffic and not an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use icy_metabot::message::ChatGrammar;
    ///
    /// let grammar = ChatGrammar::new();
    /// let msg = grammar.parse(":nick!u@h PRIVMSG #chan :hello").unwrap();
    /// assert_eq!(msg.nick, "nick");
    /// assert_eq!(msg.channel, "#chan");
    /// assert!(!msg.is_action);
    /// assert_eq!(msg.body, "hello");
    ///
    /// assert!(grammar.parse(":server 001 nick :Welcome").is_none());
    /// ```
    pub fn parse(&self, line: &str) -> Option<ChatMessage> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (_, (nick, channel, is_action, body)) = self.channel_message(line).ok()?;

        Some(ChatMessage {
            nick: nick.to_owned(),
            channel: channel.to_owned(),
            is_action,
            body: body.to_owned(),
        })
    }

    fn channel_message<'a>(
        &self,
        input: &'a str,
    ) -> ParseResult<&'a str, (&'a str, &'a str, bool, &'a str)> {
        let (input, nick) = context("parsing sender nick", preceded(char(':'), nick))(input)?;
        let (input, _) = context(
            "skipping user@host",
            take_until::<_, _, VerboseError<&str>>(self.verb),
        )(input)?;
        let (input, _) = tag::<_, _, VerboseError<&str>>(self.verb)(input)?;
        let (input, channel) = context("parsing channel", channel)(input)?;
        let (input, _) = tag::<_, _, VerboseError<&str>>(" :")(input)?;
        let (after_digits, digits) = digit0::<_, VerboseError<&str>>(input)?;
        let (input, action) = context(
            "parsing action marker",
            opt(preceded(
                opt(char(CTCP_DELIM)),
                tag::<_, _, VerboseError<&str>>(self.action_marker),
            )),
        )(after_digits)?;
        let (input, body) = rest::<_, VerboseError<&str>>(input)?;

        // The body is never empty: an action marker with nothing after it is
        // plain text, and a digits-only body keeps its last digit.
        let (is_action, body) = match action {
            Some(_) => match body.strip_suffix(CTCP_DELIM).unwrap_or(body) {
                "" => (false, after_digits),
                body => (true, body),
            },
            None if body.is_empty() && !digits.is_empty() => {
                (false, &digits[digits.len() - 1..])
            }
            None => (false, body),
        };

        if body.is_empty() || !body.chars().all(is_printable) {
            return Err(nom::Err::Error(VerboseError {
                errors: vec![(
                    input,
                    nom::error::VerboseErrorKind::Context("parsing message body"),
                )],
            }));
        }

        Ok((input, (nick, channel, is_action, body)))
    }
}

fn is_printable(c: char) -> bool {
    !c.is_control()
}

fn nick(input: &str) -> ParseResult<&str, &str> {
    terminated(
        take_while1(|c: char| c != '!' && c != ' ' && is_printable(c)),
        char('!'),
    )(input)
}

fn channel(input: &str) -> ParseResult<&str, &str> {
    recognize(pair(
        char('#'),
        take_while1(|c: char| c != ' ' && is_printable(c)),
    ))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Option<ChatMessage> {
        ChatGrammar::new().parse(line)
    }

    #[test]
    fn test_parse_plain_message() {
        let msg = parse(":nick!u@h PRIVMSG #chan :hello").unwrap();
        assert_eq!(
            msg,
            ChatMessage {
                nick: "nick".into(),
                channel: "#chan".into(),
                is_action: false,
                body: "hello".into(),
            }
        );
    }

    #[test]
    fn test_parse_action() {
        let msg = parse(":nick!u@h PRIVMSG #chan :\x01ACTION waves\x01").unwrap();
        assert!(msg.is_action);
        assert_eq!(msg.body, "waves");

        let msg = parse(":nick!u@h PRIVMSG #chan :ACTION waves").unwrap();
        assert!(msg.is_action);
        assert_eq!(msg.body, "waves");
    }

    #[test]
    fn test_parse_numeric_prefix() {
        let msg = parse(":dj!u@h PRIVMSG #radio :4?lastsong?").unwrap();
        assert_eq!(msg.body, "?lastsong?");

        let msg = parse(":dj!u@h PRIVMSG #radio :12ACTION dances").unwrap();
        assert!(msg.is_action);
        assert_eq!(msg.body, "dances");
    }

    #[test]
    fn test_digits_only_body_keeps_last_digit() {
        let msg = parse(":n!u@h PRIVMSG #c :1234").unwrap();
        assert!(!msg.is_action);
        assert_eq!(msg.body, "4");

        let msg = parse(":n!u@h PRIVMSG #c :7").unwrap();
        assert_eq!(msg.body, "7");
    }

    #[test]
    fn test_bare_action_marker_is_text() {
        let msg = parse(":n!u@h PRIVMSG #c :ACTION ").unwrap();
        assert!(!msg.is_action);
        assert_eq!(msg.body, "ACTION ");

        assert!(parse(":n!u@h PRIVMSG #c :\x01ACTION \x01").is_none());
    }

    #[test]
    fn test_body_keeps_spaces_and_colons() {
        let msg = parse(":a!b@c PRIVMSG #x :bot: what is: this").unwrap();
        assert_eq!(msg.body, "bot: what is: this");
    }

    #[test]
    fn test_trailing_crlf_ignored() {
        let msg = parse(":a!b@c PRIVMSG #x :hi\r\n").unwrap();
        assert_eq!(msg.body, "hi");
    }

    #[test]
    fn test_no_match() {
        assert!(parse("PING :server123").is_none());
        assert!(parse(":server 001 nick :Welcome").is_none());
        assert!(parse(":nick!u@h JOIN #chan").is_none());
        // private message to the bot, not a channel
        assert!(parse(":nick!u@h PRIVMSG bot :hello").is_none());
        // empty body
        assert!(parse(":nick!u@h PRIVMSG #chan :").is_none());
        // stray control byte in the body
        assert!(parse(":nick!u@h PRIVMSG #chan :a\x02b").is_none());
        assert!(parse("").is_none());
    }

    #[test]
    fn test_addressed() {
        let msg = parse(":nick!u@h PRIVMSG #chan :metabot: hi").unwrap();
        assert!(msg.is_addressed_to("metabot"));
        assert!(!msg.is_addressed_to("otherbot"));
        assert!(!msg.is_addressed_to(""));
    }
}
