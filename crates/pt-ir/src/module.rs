//! The parsed module.

use alloc::vec::Vec;
use arrayvec::ArrayString;

use crate::pattern::Pattern;
use crate::sample::Sample;

/// Number of sample slots in a 31-instrument module.
pub const NUM_SAMPLES: usize = 31;

/// Size of the pattern (order) table.
pub const MAX_POSITIONS: usize = 128;

/// Format tag at offset 1080, which also fixes the channel count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signature {
    /// `M.K.` (ProTracker)
    Mk,
    /// `M!K!` (ProTracker, more than 64 patterns)
    MkExt,
    /// `4CHN`
    FourChn,
    /// `FLT4` (StarTrekker)
    Flt4,
    /// `6CHN`
    SixChn,
    /// `8CHN`
    EightChn,
    /// `FLT8` (StarTrekker)
    Flt8,
    /// `28CH`
    TwentyEightCh,
}

impl Signature {
    /// Recognize a 4-byte tag.
    pub fn from_bytes(tag: &[u8; 4]) -> Option<Self> {
        match tag {
            b"M.K." => Some(Self::Mk),
            b"M!K!" => Some(Self::MkExt),
            b"4CHN" => Some(Self::FourChn),
            b"FLT4" => Some(Self::Flt4),
            b"6CHN" => Some(Self::SixChn),
            b"8CHN" => Some(Self::EightChn),
            b"FLT8" => Some(Self::Flt8),
            b"28CH" => Some(Self::TwentyEightCh),
            _ => None,
        }
    }

    /// The tag as text.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mk => "M.K.",
            Self::MkExt => "M!K!",
            Self::FourChn => "4CHN",
            Self::Flt4 => "FLT4",
            Self::SixChn => "6CHN",
            Self::EightChn => "8CHN",
            Self::Flt8 => "FLT8",
            Self::TwentyEightCh => "28CH",
        }
    }

    /// Channel count implied by the tag.
    pub const fn channels(self) -> u8 {
        match self {
            Self::Mk | Self::MkExt | Self::FourChn | Self::Flt4 => 4,
            Self::SixChn => 6,
            Self::EightChn | Self::Flt8 => 8,
            Self::TwentyEightCh => 28,
        }
    }
}

/// An immutable ProTracker module.
#[derive(Clone, Debug, PartialEq)]
pub struct Module {
    /// Song title
    pub title: ArrayString<40>,
    /// Format tag
    pub signature: Signature,
    /// Number of positions in the pattern table that are played (1-128)
    pub song_length: u8,
    /// Restart position (0 when the file carries the 127 "none" marker)
    pub restart_position: u8,
    /// Song position → pattern index
    pub pattern_table: [u8; MAX_POSITIONS],
    /// Sample slots (always 31)
    pub samples: Vec<Sample>,
    /// Patterns, indexed by pattern table entries
    pub patterns: Vec<Pattern>,
    /// LED filter state requested by the first row of the song
    pub filter: bool,
}

impl Module {
    /// Create an empty module: 31 blank samples, one empty pattern,
    /// song length 1.
    pub fn new(title: &str, signature: Signature) -> Self {
        let mut t = ArrayString::new();
        let _ = t.try_push_str(title);
        Self {
            title: t,
            signature,
            song_length: 1,
            restart_position: 0,
            pattern_table: [0; MAX_POSITIONS],
            samples: (0..NUM_SAMPLES).map(|_| Sample::new("")).collect(),
            patterns: alloc::vec![Pattern::new(signature.channels())],
            filter: false,
        }
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.signature.channels() as usize
    }

    /// Number of stored patterns.
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Pattern played at a song position, if both exist.
    pub fn pattern_at(&self, position: usize) -> Option<&Pattern> {
        let idx = *self.pattern_table.get(position)?;
        self.patterns.get(idx as usize)
    }

    /// Append a pattern and return its index.
    pub fn add_pattern(&mut self, pattern: Pattern) -> u8 {
        self.patterns.push(pattern);
        (self.patterns.len() - 1) as u8
    }

    /// Replace the order list. Extra entries beyond 128 are ignored.
    pub fn set_order(&mut self, order: &[u8]) {
        let n = order.len().min(MAX_POSITIONS);
        self.pattern_table = [0; MAX_POSITIONS];
        self.pattern_table[..n].copy_from_slice(&order[..n]);
        self.song_length = n as u8;
    }

    /// The order list actually played.
    pub fn order(&self) -> &[u8] {
        &self.pattern_table[..self.song_length as usize]
    }
}
