//! Amiga output filter: one-pole RC low-pass per side.
//!
//! The hardware always had a gentle low-pass on the output, and the power
//! LED switched in a much steeper one. Both are approximated with the same
//! one-pole section at two different cutoffs.

use core::f32::consts::TAU;

use crate::frame::Frame;

/// Cutoff with the LED filter engaged.
pub const LED_ON_CUTOFF: f32 = 3275.0;

/// Cutoff of the always-on output filter.
pub const LED_OFF_CUTOFF: f32 = 28867.0;

/// One-pole RC low-pass: `y = y_prev + alpha * (x - y_prev)`.
#[derive(Clone, Debug)]
pub struct LedFilter {
    prev_left: f32,
    prev_right: f32,
    alpha_on: f32,
    alpha_off: f32,
}

impl LedFilter {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            prev_left: 0.0,
            prev_right: 0.0,
            alpha_on: alpha(LED_ON_CUTOFF, sample_rate),
            alpha_off: alpha(LED_OFF_CUTOFF, sample_rate),
        }
    }

    /// Filter one frame, using the steep cutoff when `led` is on.
    pub fn process(&mut self, frame: Frame, led: bool) -> Frame {
        let alpha = if led { self.alpha_on } else { self.alpha_off };
        self.prev_left += alpha * (frame.left - self.prev_left);
        self.prev_right += alpha * (frame.right - self.prev_right);
        Frame::new(self.prev_left, self.prev_right)
    }

    /// Filter a buffer in place.
    pub fn work(&mut self, frames: &mut [Frame], led: bool) {
        for frame in frames {
            *frame = self.process(*frame, led);
        }
    }

    pub fn reset(&mut self) {
        self.prev_left = 0.0;
        self.prev_right = 0.0;
    }
}

/// Smoothing factor for a cutoff; stays in (0, 1) even above Nyquist.
fn alpha(cutoff_hz: f32, sample_rate: u32) -> f32 {
    1.0 - libm::expf(-TAU * cutoff_hz / sample_rate as f32)
}
