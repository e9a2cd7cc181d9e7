//! Frame rendering: row loading, voice update, and output routing.
//!
//! Channels alternate sides in the pattern LRRL: the side flips after
//! every odd channel, so channels 0 and 3 land left, 1 and 2 right.

use pt_ir::{Sample, PERIOD_TABLE};

use crate::channel::{Channel, ChannelFlags};
use crate::effects;
use crate::frame::Frame;
use crate::frequency::{period_to_speed, Tables};
use crate::player::Player;
use crate::sequencer::PlayerFlags;

impl Player {
    /// Generate one frame of audio.
    ///
    /// Returns silence while stopped, paused, or past the end of the song.
    pub fn render_frame(&mut self) -> Frame {
        if !self.playing || self.paused || self.end_of_song {
            return Frame::silence();
        }

        self.advance();

        let mut out = [0.0f32; 2];
        if !self.end_of_song {
            self.mix_channels(&mut out);
        }

        self.offset += 1;
        self.flags &= PlayerFlags::PERSISTENT;

        Frame::new(out[0], out[1])
    }

    fn mix_channels(&mut self, out: &mut [f32; 2]) {
        let new_tick = self.flags.contains(PlayerFlags::NEW_TICK);
        let new_row = self.flags.contains(PlayerFlags::NEW_ROW);
        let mut side = 0usize;

        for ch in 0..self.channels.len() {
            if new_row {
                self.load_cell(ch);
            }

            let sample_len = self.module.samples[self.channels[ch].sample].len();
            let channel = &mut self.channels[ch];
            channel.voice_period = channel.period as f64;
            if sample_len == 0 {
                channel.note_on = false;
            }

            if new_tick {
                effects::dispatch(self, ch);
            }

            let sample = self.channels[ch].sample;
            let level = update_voice(
                &mut self.channels[ch],
                &self.module.samples[sample],
                &self.tables,
                self.sample_rate,
                new_tick,
                new_row,
            );

            side ^= ch & 1;
            out[side] += level as f32;
            self.vu[ch] = self.vu[ch].max(level.abs() as f32);
        }
    }

    /// Latch the cell at the current row into a channel.
    fn load_cell(&mut self, ch: usize) {
        let Some(cell) = self
            .module
            .pattern_at(self.position)
            .map(|p| p.cell(self.row, ch))
        else {
            return;
        };

        let channel = &mut self.channels[ch];
        channel.command = cell.command();
        channel.data = cell.data();

        // EDx latches the note itself when its tick comes
        if channel.command == 0x0E && channel.data & 0xF0 == 0xD0 {
            return;
        }

        let period = cell.period() as i32;
        if period != 0 {
            // Tone portamento keeps the old note and slides toward this one
            if channel.command != 0x03 && channel.command != 0x05 {
                channel.trigger(period);
            }
            channel.slide_to = period;
        }

        let number = cell.sample() as usize;
        if number != 0 {
            if let Some(sample) = self.module.samples.get(number - 1) {
                channel.sample = number - 1;
                channel.volume = sample.volume as i32;
                if period == 0 && channel.sample_pos > sample.len() as f64 {
                    channel.sample_pos = 0.0;
                }
            }
        }
    }
}

/// Recompute pitch, read one sample frame, and step the read position.
///
/// Returns the channel's contribution to its side of the output.
fn update_voice(
    channel: &mut Channel,
    sample: &Sample,
    tables: &Tables,
    sample_rate: u32,
    new_tick: bool,
    new_row: bool,
) -> f64 {
    if channel.flags.contains(ChannelFlags::RECALC_NOTE) {
        for (note, &period) in PERIOD_TABLE.iter().enumerate() {
            if period as i32 >= channel.period {
                channel.note = note;
            }
        }
    }

    let recalc = channel.flags.contains(ChannelFlags::RECALC_SPEED) || new_row;
    if recalc && channel.voice_period != 0.0 {
        let finetune = tables.finetune[sample.finetune_index()];
        channel.sample_speed = period_to_speed(channel.voice_period, finetune, sample_rate);
    }

    if new_tick {
        channel.vibrato_pos = (channel.vibrato_pos + channel.vibrato_speed) & 0x3F;
    }

    let mut level = 0.0;
    if channel.note_on {
        if (sample.len() as f64) > channel.sample_pos {
            let frame = sample.data[channel.sample_pos as usize];
            level = (frame * channel.volume as f32) as f64 / 64.0;
        }
        channel.sample_pos += channel.sample_speed;

        if sample.has_loop() {
            let loop_end = (sample.loop_start + sample.loop_length) as f64;
            if channel.sample_pos >= loop_end {
                channel.sample_pos -= sample.loop_length as f64;
            }
        } else if channel.sample_pos >= sample.len() as f64 {
            channel.note_on = false;
        }
    }

    channel.flags = ChannelFlags::empty();
    level
}
