//! Line framing for the IRC connection.
//!
//! Inbound bytes are split on `\n`, a trailing `\r` is dropped and color
//! codes are stripped before the line is decoded as (lossy) UTF-8. Outbound
//! lines get a `\r\n` appended.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::SessionError;
use crate::filter::strip_colors;

/// Longest line accepted from the server, in bytes (IRCv3 limit with tags).
pub const MAX_LINE_LEN: usize = 8191;

/// Codec turning a byte stream into color-filtered lines and back.
#[derive(Clone, Debug)]
pub struct LineCodec {
    next_index: usize,
    max_len: usize,
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl LineCodec {
    /// A codec with the default [`MAX_LINE_LEN`].
    pub fn new() -> Self {
        Self::with_max_len(MAX_LINE_LEN)
    }

    /// A codec with a custom maximum line length.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
        }
    }

    /// Cut a line at its first CR or LF so a single send can never smuggle
    /// in a second protocol line.
    pub fn sanitize(line: &str) -> &str {
        match line.find(['\r', '\n']) {
            Some(pos) => &line[..pos],
            None => line,
        }
    }

    fn finish_line(&self, raw: &[u8]) -> Result<String, SessionError> {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        if raw.len() > self.max_len {
            return Err(SessionError::LineTooLong {
                actual: raw.len(),
                limit: self.max_len,
            });
        }
        Ok(String::from_utf8_lossy(&strip_colors(raw)).into_owned())
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = SessionError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, SessionError> {
        match src[self.next_index..].iter().position(|&b| b == b'\n') {
            Some(offset) => {
                let newline = self.next_index + offset;
                self.next_index = 0;
                let line = src.split_to(newline + 1);
                self.finish_line(&line[..newline]).map(Some)
            }
            None if src.len() > self.max_len => Err(SessionError::LineTooLong {
                actual: src.len(),
                limit: self.max_len,
            }),
            None => {
                self.next_index = src.len();
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>, SessionError> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if src.is_empty() {
            return Ok(None);
        }
        // unterminated last line
        self.next_index = 0;
        let line = src.split_to(src.len());
        self.finish_line(&line).map(Some)
    }
}

impl Encoder<String> for LineCodec {
    type Error = SessionError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> Result<(), SessionError> {
        let line = Self::sanitize(&line);
        dst.reserve(line.len() + 2);
        dst.put_slice(line.as_bytes());
        dst.put_slice(b"\r\n");
        Ok(())
    }
}
