//! Decoding of a single ICY metadata block.

#[cfg(feature = "tokio")]
use tokio::io::{AsyncRead, AsyncReadExt};

#[cfg(feature = "tokio")]
use crate::error::IcyError;

/// Size unit of the length byte: a block is `16 * L` bytes long.
pub const BLOCK_UNIT: usize = 16;

/// Extract the value of the first `key=value;` pair of a block payload.
///
/// NUL padding is ignored. A value quoted with `'` runs up to the closing
/// `';`, so titles containing `;` survive; the quotes are dropped. Returns
/// `None` when the payload has no `=` at all.
///
/// # Examples
///
/// ```
/// use icy_metabot::icy::block_value;
///
/// let block = b"StreamTitle='Song A - Artist';StreamUrl='';\0\0\0";
/// assert_eq!(block_value(block).as_deref(), Some("Song A - Artist"));
/// ```
pub fn block_value(payload: &[u8]) -> Option<String> {
    let end = payload
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |p| p + 1);
    let text = String::from_utf8_lossy(&payload[..end]);
    let (_, value) = text.split_once('=')?;

    let value = match value.strip_prefix('\'') {
        Some(quoted) => match quoted.find("';") {
            Some(close) => &quoted[..close],
            None => quoted.split(';').next().unwrap_or(quoted).trim_end_matches('\''),
        },
        None => value.split(';').next().unwrap_or(value),
    };
    Some(value.to_string())
}

/// Read the payload announced by `length_byte` and decode it.
///
/// The length byte itself has already been consumed. A zero length means
/// "no metadata this interval" and yields `Ok(None)` without reading. A
/// stream that ends before `16 * L` bytes arrived is a framing violation.
#[cfg(feature = "tokio")]
pub async fn read_block<R>(reader: &mut R, length_byte: u8) -> Result<Option<String>, IcyError>
where
    R: AsyncRead + Unpin,
{
    if length_byte == 0 {
        return Ok(None);
    }

    let expected = usize::from(length_byte) * BLOCK_UNIT;
    let mut payload = Vec::with_capacity(expected);
    reader
        .take(expected as u64)
        .read_to_end(&mut payload)
        .await?;
    if payload.len() < expected {
        return Err(IcyError::Truncated {
            expected,
            got: payload.len(),
        });
    }

    let value = block_value(&payload);
    if value.is_none() {
        tracing::warn!(
            payload = %String::from_utf8_lossy(&payload).trim_end_matches('\0'),
            "metadata block without key=value"
        );
    }
    Ok(value)
}
