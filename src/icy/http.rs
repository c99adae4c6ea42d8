//! Opening an ICY stream over HTTP.

use std::io;
use std::pin::Pin;

use futures_util::{StreamExt, TryStreamExt};
use reqwest::header::HeaderMap;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio_util::io::StreamReader;
use tracing::info;

use super::extractor::MetadataExtractor;
use crate::error::IcyError;

/// Request header asking the server to interleave metadata.
pub const METADATA_REQUEST_HEADER: &str = "Icy-MetaData";

const USER_AGENT: &str = concat!("icy-metabot/", env!("CARGO_PKG_VERSION"));

/// Response body as a byte reader.
pub type IcyBody = Pin<Box<dyn AsyncRead + Send>>;

/// Headers of interest from an ICY response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IcyHeaders {
    /// Audio bytes between metadata blocks.
    pub metaint: usize,
    /// `icy-name`, if sent.
    pub station_name: Option<String>,
    /// `content-type`, if sent.
    pub content_type: Option<String>,
    /// `icy-br` in kbit/s, if sent and numeric.
    pub bitrate: Option<u32>,
}

impl From<reqwest::Error> for IcyError {
    fn from(err: reqwest::Error) -> Self {
        IcyError::Http(Box::new(err))
    }
}

impl IcyHeaders {
    /// Collect the ICY headers; `icy-metaint` is mandatory.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, IcyError> {
        let text = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim().to_string())
        };

        Ok(Self {
            metaint: parse_metaint(text("icy-metaint").as_deref())?,
            station_name: text("icy-name"),
            content_type: text("content-type"),
            bitrate: text("icy-br").and_then(|v| v.parse().ok()),
        })
    }
}

/// Parse the value of an `Icy-Metaint` header.
///
/// ```
/// use icy_metabot::icy::parse_metaint;
///
/// assert_eq!(parse_metaint(Some(" 16000 ")).unwrap(), 16000);
/// assert!(parse_metaint(None).is_err());
/// assert!(parse_metaint(Some("lots")).is_err());
/// ```
pub fn parse_metaint(value: Option<&str>) -> Result<usize, IcyError> {
    let value = value.ok_or(IcyError::MissingMetaint)?;
    match value.trim().parse::<usize>() {
        Ok(0) | Err(_) => Err(IcyError::InvalidMetaint(value.to_string())),
        Ok(metaint) => Ok(metaint),
    }
}

/// An open ICY response.
pub struct IcyStream {
    /// Parsed response headers.
    pub headers: IcyHeaders,
    /// The raw body, audio and metadata interleaved.
    pub body: IcyBody,
}

impl std::fmt::Debug for IcyStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IcyStream")
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

impl IcyStream {
    /// An extractor over the body using the advertised interval.
    pub fn into_extractor(self) -> MetadataExtractor<IcyBody> {
        MetadataExtractor::new(self.body, self.headers.metaint)
    }
}

/// `GET url` with `Icy-MetaData: 1` and check the ICY headers.
pub async fn open_stream(url: &str) -> Result<IcyStream, IcyError> {
    info!(url, "opening stream");
    let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
    let response = client
        .get(url)
        .header(METADATA_REQUEST_HEADER, "1")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(IcyError::Status(status.as_u16()));
    }

    let headers = IcyHeaders::from_headers(response.headers())?;
    info!(
        metaint = headers.metaint,
        station = headers.station_name.as_deref().unwrap_or("-"),
        "stream open"
    );

    let bytes = response
        .bytes_stream()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
        .boxed();
    Ok(IcyStream {
        headers,
        body: Box::pin(StreamReader::new(bytes)),
    })
}

/// Print every metadata value of `url` to stdout until the stream ends.
pub async fn stream_meta(url: &str) -> Result<(), IcyError> {
    info!("Shoutcast stream metadata yanker");
    let stream = open_stream(url).await?;
    let values = stream.into_extractor().into_stream();
    futures_util::pin_mut!(values);

    let mut stdout = tokio::io::stdout();
    while let Some(value) = values.next().await {
        let value = value?;
        stdout
            .write_all(format!("New meta:\n{}\n", value).as_bytes())
            .await?;
        stdout.flush().await?;
    }
    info!(url, "stream ended");
    Ok(())
}
