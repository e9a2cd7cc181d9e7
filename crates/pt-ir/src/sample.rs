//! Sample descriptors and PCM.

use alloc::vec::Vec;
use arrayvec::ArrayString;

/// A sample slot: header fields plus normalized PCM.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sample {
    /// Sample name (printable ASCII, at most 22 bytes)
    pub name: ArrayString<22>,
    /// Finetune (-8..7)
    pub finetune: i8,
    /// Default volume as stored in the file (nominally 0-64)
    pub volume: u8,
    /// Loop start in frames
    pub loop_start: usize,
    /// Loop length in frames (0 together with `loop_start == 0` means no loop)
    pub loop_length: usize,
    /// PCM frames in [-1, 1)
    pub data: Vec<f32>,
}

impl Sample {
    /// Create an empty sample.
    pub fn new(name: &str) -> Self {
        let mut sample = Self {
            volume: 64,
            ..Default::default()
        };
        let _ = sample.name.try_push_str(name);
        sample
    }

    /// Length in frames.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the sample has no PCM.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns true if playback wraps at the loop end instead of stopping.
    ///
    /// A zero-length loop with a nonzero start still counts: the voice stays
    /// on past the sample end and outputs silence.
    pub fn has_loop(&self) -> bool {
        self.loop_start != 0 || self.loop_length != 0
    }

    /// Index into a 16-entry finetune table.
    pub fn finetune_index(&self) -> usize {
        (self.finetune as i32 + 8).clamp(0, 15) as usize
    }

    /// Bring loop bounds in line with the sample length.
    ///
    /// A 2-byte loop is the "no loop" marker. A loop starting or ending
    /// past the end of the data is dropped. Returns true if anything changed.
    pub fn normalize_loop(&mut self) -> bool {
        let before = (self.loop_start, self.loop_length);
        let len = self.len();
        if self.loop_length == 2
            || self.loop_start > len
            || self.loop_start + self.loop_length > len
        {
            self.loop_start = 0;
            self.loop_length = 0;
        }
        before != (self.loop_start, self.loop_length)
    }
}

/// Convert a raw PCM byte to a float.
///
/// Bytes below 128 map to `b / 128`; bytes from 128 up map to
/// `(b - 128) / 128 - 1`, so 128 is -1.0 and 255 is just below zero.
pub fn pcm_from_byte(b: u8) -> f32 {
    if b < 128 {
        b as f32 / 128.0
    } else {
        (b - 128) as f32 / 128.0 - 1.0
    }
}
