//! Walking an ICY body and yielding metadata values.

use futures_util::stream::{self, Stream};
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};
use tracing::debug;

use super::framer::read_block;
use crate::error::IcyError;

/// Smallest read buffer used, whatever the interval.
const MIN_BUFFER: usize = 4096;

/// Pulls metadata values out of an ICY body.
///
/// Each step skips `interval` bytes of audio, reads the length byte and
/// decodes the block that follows. Blocks of length zero are skipped
/// silently. The sequence ends cleanly when the body ends inside the audio
/// payload; ending anywhere else is an error.
#[derive(Debug)]
pub struct MetadataExtractor<R> {
    reader: BufReader<R>,
    interval: usize,
}

impl<R: AsyncRead + Unpin> MetadataExtractor<R> {
    /// Wrap `reader`, whose metadata blocks are `interval` bytes apart.
    pub fn new(reader: R, interval: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(interval.max(MIN_BUFFER), reader),
            interval,
        }
    }

    /// Bytes of audio between two metadata blocks.
    pub fn interval(&self) -> usize {
        self.interval
    }

    /// The next metadata value, or `None` once the body has ended.
    pub async fn next_metadata(&mut self) -> Result<Option<String>, IcyError> {
        loop {
            if !self.skip_audio().await {
                return Ok(None);
            }

            let length = self
                .reader
                .read_u8()
                .await
                .map_err(IcyError::MissingLengthByte)?;

            if let Some(value) = read_block(&mut self.reader, length).await? {
                return Ok(Some(value));
            }
        }
    }

    /// Skip one interval of audio. Returns false if the body ended first.
    async fn skip_audio(&mut self) -> bool {
        let wanted = self.interval as u64;
        let mut audio = (&mut self.reader).take(wanted);
        match tokio::io::copy(&mut audio, &mut tokio::io::sink()).await {
            Ok(skipped) if skipped == wanted => true,
            Ok(skipped) => {
                debug!(skipped, wanted, "stream ended inside audio payload");
                false
            }
            Err(e) => {
                debug!("stream read failed: {}", e);
                false
            }
        }
    }

    /// Turn the extractor into a lazy stream of values.
    ///
    /// The stream yields at most one error and then ends.
    pub fn into_stream(self) -> impl Stream<Item = Result<String, IcyError>> {
        stream::unfold(Some(self), |state| async move {
            let mut extractor = state?;
            match extractor.next_metadata().await {
                Ok(Some(value)) => Some((Ok(value), Some(extractor))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}

/// Lazy stream of metadata values from `reader`, blocks `interval` bytes apart.
pub fn metadata_stream<R>(reader: R, interval: usize) -> impl Stream<Item = Result<String, IcyError>>
where
    R: AsyncRead + Unpin,
{
    MetadataExtractor::new(reader, interval).into_stream()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    fn block(text: &str) -> Vec<u8> {
        let units = (text.len() + 15) / 16;
        let mut out = vec![units as u8];
        out.extend_from_slice(text.as_bytes());
        out.resize(1 + units * 16, 0);
        out
    }

    #[tokio::test]
    async fn test_extracts_in_order() {
        let mut body = Vec::new();
        body.extend_from_slice(&[0xAA; 8]);
        body.extend(block("StreamTitle='First';"));
        body.extend_from_slice(&[0xBB; 8]);
        body.push(0);
        body.extend_from_slice(&[0xCC; 8]);
        body.extend(block("StreamTitle='Second';"));
        body.extend_from_slice(&[0xDD; 3]);

        let values: Vec<_> = metadata_stream(&body[..], 8).collect().await;
        let values: Vec<String> = values.into_iter().map(Result::unwrap).collect();
        assert_eq!(values, vec!["First".to_string(), "Second".to_string()]);
    }

    #[tokio::test]
    async fn test_clean_end_on_short_audio() {
        let mut extractor = MetadataExtractor::new(&[1u8, 2, 3][..], 8);
        assert_eq!(extractor.next_metadata().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_length_byte_is_error() {
        let body = [0u8; 8];
        let mut extractor = MetadataExtractor::new(&body[..], 8);
        assert!(matches!(
            extractor.next_metadata().await,
            Err(IcyError::MissingLengthByte(_))
        ));
    }

    #[tokio::test]
    async fn test_truncated_block_ends_stream_with_error() {
        let mut body = vec![0u8; 4];
        body.push(2);
        body.extend_from_slice(b"StreamTitle=");

        let values: Vec<_> = metadata_stream(&body[..], 4).collect().await;
        assert_eq!(values.len(), 1);
        assert!(matches!(values[0], Err(IcyError::Truncated { expected: 32, got: 12 })));
    }

    #[tokio::test]
    async fn test_zero_interval() {
        let mut body = Vec::new();
        body.extend(block("StreamTitle='A';"));
        body.push(0);
        body.extend(block("StreamTitle='B';"));

        let mut extractor = MetadataExtractor::new(&body[..], 0);
        assert_eq!(extractor.interval(), 0);
        assert_eq!(extractor.next_metadata().await.unwrap().as_deref(), Some("A"));
        assert_eq!(extractor.next_metadata().await.unwrap().as_deref(), Some("B"));
        assert!(matches!(
            extractor.next_metadata().await,
            Err(IcyError::MissingLengthByte(_))
        ));
    }
}
