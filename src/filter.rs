//! Color-code stripping for raw IRC lines.
//!
//! mIRC-style colors are introduced by the control byte `0x03` followed by
//! a color code. The filter drops the introducer together with exactly one
//! following byte and passes everything else through untouched.

/// The mIRC color introducer.
pub const COLOR_CONTROL: u8 = 0x03;

/// State of the color filter between two bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FilterState {
    /// Copying bytes to the output.
    #[default]
    Scanning,
    /// The previous byte was [`COLOR_CONTROL`]; the next byte is dropped.
    SkipOne,
}

/// A one-pass color filter.
///
/// The state is per line: a trailing introducer leaves the filter in
/// [`FilterState::SkipOne`], and that state is discarded with the filter
/// instead of carrying over to the next line.
#[derive(Clone, Debug, Default)]
pub struct ColorFilter {
    state: FilterState,
}

impl ColorFilter {
    /// Create a filter in the [`FilterState::Scanning`] state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> FilterState {
        self.state
    }

    /// Feed one byte, returning it if it belongs in the output.
    #[inline]
    pub fn feed(&mut self, byte: u8) -> Option<u8> {
        match self.state {
            FilterState::Scanning if byte == COLOR_CONTROL => {
                self.state = FilterState::SkipOne;
                None
            }
            FilterState::Scanning => Some(byte),
            FilterState::SkipOne => {
                self.state = FilterState::Scanning;
                None
            }
        }
    }
}

/// Remove every color introducer and the byte after it.
///
/// # Examples
///
/// ```
/// use icy_metabot::filter::strip_colors;
///
/// assert_eq!(strip_colors(b"\x034hello"), b"hello");
/// assert_eq!(strip_colors(b"plain"), b"plain");
/// ```
pub fn strip_colors(input: &[u8]) -> Vec<u8> {
    let mut filter = ColorFilter::new();
    let mut out = Vec::with_capacity(input.len());
    out.extend(input.iter().filter_map(|&b| filter.feed(b)));
    out
}
