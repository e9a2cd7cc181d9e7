//! Song sequencing: tick, row, and position advancement.

use bitflags::bitflags;
use pt_ir::ROWS;
use tracing::debug;

use crate::player::Player;

bitflags! {
    /// Events pending for the current frame.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub(crate) struct PlayerFlags: u8 {
        /// A tick started this frame
        const NEW_TICK = 0x01;
        /// A row started this frame; channels load their cells
        const NEW_ROW = 0x02;
        /// The song position changed
        const NEW_POSITION = 0x04;
        /// `Bxx` or `Dxx` requested a jump at the end of the row
        const JUMP = 0x10;
        /// `E6x` requested a jump back to the loop row
        const LOOP = 0x40;
    }
}

impl PlayerFlags {
    /// Flags that survive the end of a frame.
    pub(crate) const PERSISTENT: Self = Self::JUMP.union(Self::LOOP);
}

impl Player {
    /// Move the song clock forward by one frame's worth of decisions.
    ///
    /// Called once per rendered frame before the channels are mixed.
    pub(crate) fn advance(&mut self) {
        if self.offset > self.samples_per_tick() {
            self.tick += 1;
            self.offset = 0;
            self.flags |= PlayerFlags::NEW_TICK;
        }

        if self.tick >= self.speed {
            if self.pattern_delay != 0 && self.tick < (self.pattern_delay + 1) * self.speed {
                // Row repeats without retriggering notes
                if self.flags.contains(PlayerFlags::NEW_TICK) && self.tick % self.speed == 0 {
                    self.pattern_wait += 1;
                }
            } else {
                self.pattern_delay = 0;
                self.pattern_wait = 0;
                self.next_row();
            }
        }

        if self.row >= ROWS {
            self.position += 1;
            self.row = 0;
            self.flags |= PlayerFlags::NEW_POSITION;
        }

        if self.position >= self.module.song_length as usize {
            if self.repeat {
                self.position = 0;
            } else if !self.end_of_song {
                self.end_of_song = true;
                debug!(position = self.position, "end of song");
            }
        }

        if self.flags.contains(PlayerFlags::NEW_POSITION) && !self.end_of_song {
            debug!(
                position = self.position,
                pattern = self.module.pattern_table.get(self.position).copied(),
                "position"
            );
        }
    }

    /// Resolve pending jumps, or step to the next row.
    fn next_row(&mut self) {
        if self.flags.contains(PlayerFlags::LOOP) {
            self.row = self.loop_row;
            self.flags.remove(PlayerFlags::JUMP | PlayerFlags::LOOP);
        } else if self.flags.contains(PlayerFlags::JUMP) {
            self.position = self.pattern_jump;
            self.row = self.break_row;
            self.pattern_jump = 0;
            self.break_row = 0;
            self.flags.remove(PlayerFlags::JUMP);
            self.flags |= PlayerFlags::NEW_POSITION;
        } else {
            self.row += 1;
        }
        self.tick = 0;
        self.flags |= PlayerFlags::NEW_ROW;
    }
}
