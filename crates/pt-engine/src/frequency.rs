//! Timing and pitch math.
//!
//! Tick length comes from the BPM with truncating integer division, and
//! playback speed from the Paula clock divided by the period.

use core::f32::consts::PI;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Paula clock (PAL), the base of the period-to-speed formula.
pub const PAULA_CLOCK: f64 = 7_093_789.2;

/// Output frames per tick.
///
/// `((sample_rate * 60) / bpm) / 4 / 6`, each step truncating. A tick
/// actually lasts one frame longer than this because the sequencer only
/// fires once the frame counter *exceeds* it.
pub fn samples_per_tick(sample_rate: u32, bpm: u32) -> u32 {
    if bpm == 0 {
        return u32::MAX;
    }
    ((sample_rate * 60) / bpm) / 4 / 6
}

/// Sample frames advanced per output frame for a (possibly modulated)
/// period.
pub fn period_to_speed(voice_period: f64, finetune: f32, sample_rate: u32) -> f64 {
    PAULA_CLOCK / (voice_period * 2.0) * finetune as f64 / sample_rate as f64
}

/// Finetune multipliers and vibrato waveforms, built once per player.
#[derive(Clone, Debug)]
pub(crate) struct Tables {
    /// `2^((i - 8) / 96)`, indexed by finetune + 8
    pub finetune: [f32; 16],
    /// Sine, descending ramp, square, random; 64 steps of ±127
    pub vibrato: [[f32; 64]; 4],
}

impl Tables {
    pub fn new(seed: u64) -> Self {
        let mut finetune = [0.0; 16];
        for (i, f) in finetune.iter_mut().enumerate() {
            *f = libm::powf(2.0, (i as f32 - 8.0) / 12.0 / 8.0);
        }

        let mut rng = Pcg32::seed_from_u64(seed);
        let mut vibrato = [[0.0; 64]; 4];
        for i in 0..64 {
            vibrato[0][i] = 127.0 * libm::sinf(PI * 2.0 * (i as f32 / 64.0));
            vibrato[1][i] = 127.0 - 4.0 * i as f32;
            vibrato[2][i] = if i < 32 { 127.0 } else { -127.0 };
            vibrato[3][i] = (1.0 - 2.0 * rng.random::<f32>()) * 127.0;
        }

        Self { finetune, vibrato }
    }
}
