//! Per-channel playback state.

use bitflags::bitflags;

bitflags! {
    /// Work the mixer still has to do for a channel this frame.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ChannelFlags: u8 {
        /// Recompute the sample step from `voice_period`
        const RECALC_SPEED = 0x01;
        /// Recompute `note` from `period`
        const RECALC_NOTE = 0x02;
    }
}

/// Mixing and effect state for one tracker channel.
#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
    /// Current sample slot (0-based)
    pub sample: usize,
    /// Base period set by notes and slides
    pub period: i32,
    /// Period actually played this tick (arpeggio and vibrato modulate it)
    pub voice_period: f64,
    /// Index into the period table nearest to `period`
    pub note: usize,
    /// Volume; `Cxx` may leave it above 64
    pub volume: i32,
    /// Effect command of the current row
    pub command: u8,
    /// Effect parameter of the current row
    pub data: u8,
    /// Fractional read position in sample frames
    pub sample_pos: f64,
    /// Sample frames advanced per output frame
    pub sample_speed: f64,
    pub flags: ChannelFlags,
    /// Is the voice sounding?
    pub note_on: bool,

    // Effect memory
    /// Portamento up/down speed
    pub slide_speed: i32,
    /// Tone portamento target period
    pub slide_to: i32,
    /// Tone portamento speed
    pub slide_to_speed: i32,
    /// Arpeggio offsets (hi nibble, lo nibble)
    pub arpeggio: u8,
    pub vibrato_speed: usize,
    pub vibrato_depth: i32,
    /// Position in the 64-step waveform
    pub vibrato_pos: usize,
    /// Waveform select (bits 0-1); bit 2 resets the position on new notes
    pub vibrato_wave: u8,
}

impl Default for Channel {
    fn default() -> Self {
        Self {
            sample: 0,
            period: 214,
            voice_period: 214.0,
            note: 24,
            volume: 64,
            command: 0,
            data: 0,
            sample_pos: 0.0,
            sample_speed: 0.0,
            flags: ChannelFlags::empty(),
            note_on: false,
            slide_speed: 0,
            slide_to: 214,
            slide_to_speed: 0,
            arpeggio: 0,
            vibrato_speed: 0,
            vibrato_depth: 0,
            vibrato_pos: 0,
            vibrato_wave: 0,
        }
    }
}

impl Channel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a note at `period` from the beginning of the sample.
    pub fn trigger(&mut self, period: i32) {
        self.period = period;
        self.sample_pos = 0.0;
        if self.vibrato_wave > 3 {
            self.vibrato_pos = 0;
        }
        self.flags |= ChannelFlags::RECALC_SPEED | ChannelFlags::RECALC_NOTE;
        self.note_on = true;
    }

    /// Effect parameter high nibble.
    pub fn data_hi(&self) -> u8 {
        self.data >> 4
    }

    /// Effect parameter low nibble.
    pub fn data_lo(&self) -> u8 {
        self.data & 0x0F
    }
}
