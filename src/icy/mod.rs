//! ICY (Shoutcast/Icecast) inline metadata.
//!
//! A server asked for `Icy-MetaData: 1` interleaves the audio body with
//! metadata blocks every `Icy-Metaint` bytes:
//!
//! ```text
//! [interval audio bytes][L][16*L bytes of text][interval audio bytes][L]...
//! ```
//!
//! [`framer`] decodes one block, [`extractor`] walks the whole body, and
//! [`http`] opens the stream.

#[cfg(feature = "tokio")]
pub mod extractor;
pub mod framer;
#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "tokio")]
pub use self::extractor::{metadata_stream, MetadataExtractor};
pub use self::framer::{block_value, BLOCK_UNIT};
#[cfg(feature = "http")]
pub use self::http::{open_stream, parse_metaint, stream_meta, IcyHeaders, IcyStream};
