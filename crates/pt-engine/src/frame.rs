//! Audio frame type.

/// A stereo audio frame.
///
/// Values are the raw mixer sums: every voice contributes up to
/// `volume / 64` on its side, so a frame can exceed [-1, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Frame {
    pub left: f32,
    pub right: f32,
}

impl Frame {
    /// Create a silent frame.
    pub const fn silence() -> Self {
        Self { left: 0.0, right: 0.0 }
    }

    /// Create a frame from both sides.
    pub const fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    /// Returns true if both sides are exactly zero.
    pub fn is_silent(&self) -> bool {
        self.left == 0.0 && self.right == 0.0
    }

    /// Scale both sides.
    pub fn scale(self, gain: f32) -> Self {
        Self {
            left: self.left * gain,
            right: self.right * gain,
        }
    }

    /// Convert to clamped 16-bit PCM after applying `gain`.
    pub fn to_i16(self, gain: f32) -> [i16; 2] {
        let conv = |v: f32| ((v * gain).clamp(-1.0, 1.0) * 32767.0) as i16;
        [conv(self.left), conv(self.right)]
    }
}
