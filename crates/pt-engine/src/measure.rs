//! Song length measurement.
//!
//! Runs the sequencer on a copy of the player, one rendered frame per tick,
//! until the song ends or revisits a row outside of a pattern loop.

use pt_ir::{MAX_POSITIONS, ROWS};

use crate::player::Player;

/// Upper bound on measured ticks; about 93 hours at 125 BPM.
const MAX_MEASURE_TICKS: u64 = 1 << 24;

/// How long a song plays before it ends or starts over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SongLength {
    /// Ticks played
    pub ticks: u64,
    /// Output frames at the player's sample rate
    pub frames: u64,
    /// True when playback jumps back to an already played row instead of
    /// running off the end of the order list
    pub looped: bool,
}

impl SongLength {
    /// Duration in seconds at `sample_rate`.
    pub fn seconds(&self, sample_rate: u32) -> f64 {
        self.frames as f64 / sample_rate as f64
    }
}

impl Player {
    /// Measure the song without touching this player's state.
    pub fn measure(&self) -> SongLength {
        let mut dry = Player::with_tables(
            self.module.clone(),
            self.sample_rate,
            self.tables.clone(),
        );
        dry.play();

        let mut visited = [0u64; MAX_POSITIONS];
        let mut length = SongLength {
            ticks: 0,
            frames: 0,
            looped: false,
        };

        while length.ticks < MAX_MEASURE_TICKS {
            let in_loop = dry.loop_count != 0;
            dry.render_frame();
            if dry.end_of_song {
                break;
            }

            if dry.tick == 0 && dry.row < ROWS {
                let bit = 1u64 << dry.row;
                let seen = &mut visited[dry.position % MAX_POSITIONS];
                if *seen & bit != 0 && !in_loop {
                    length.looped = true;
                    break;
                }
                *seen |= bit;
            }

            let frames = dry.samples_per_tick() as u64 + 1;
            length.ticks += 1;
            length.frames += frames;
            // Skip straight to the next tick boundary
            dry.offset = frames as u32;
        }

        length
    }
}
