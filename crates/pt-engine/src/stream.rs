//! Pull-based frame source over a player.

use crate::frame::Frame;
use crate::player::Player;

/// Lazily rendered, seekable stream of frames.
///
/// Seeking forward renders and discards; seeking backward restarts the
/// song and replays up to the target, so the result is identical to
/// having played straight through.
#[derive(Clone, Debug)]
pub struct FrameStream {
    player: Player,
    position: u64,
}

impl FrameStream {
    /// Start playing `player` from the top of its song.
    pub fn new(mut player: Player) -> Self {
        player.play();
        Self {
            player,
            position: 0,
        }
    }

    /// Frames produced so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    /// True once the song has ended (never with repeat on).
    pub fn is_finished(&self) -> bool {
        self.player.is_end_of_song()
    }

    /// Move to frame `target`.
    pub fn seek(&mut self, target: u64) {
        if target < self.position {
            self.player.play();
            self.position = 0;
        }
        while self.position < target && !self.is_finished() {
            self.player.render_frame();
            self.position += 1;
        }
    }

    /// Start over from frame 0.
    pub fn restart(&mut self) {
        self.seek(0);
    }

    /// Fill `out`, returning how many frames were written before the song
    /// ended.
    pub fn fill(&mut self, out: &mut [Frame]) -> usize {
        let mut written = 0;
        for frame in out.iter_mut() {
            if self.is_finished() {
                break;
            }
            *frame = self.player.render_frame();
            self.position += 1;
            written += 1;
        }
        written
    }
}

impl Iterator for FrameStream {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        if self.is_finished() {
            return None;
        }
        self.position += 1;
        Some(self.player.render_frame())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pt_ir::{Cell, Module, Pattern, Sample, Signature};

    fn module() -> Module {
        let mut module = Module::new("stream", Signature::Mk);
        let mut sample = Sample::new("saw");
        sample.data = (0..256).map(|i| (i as f32 - 128.0) / 128.0).collect();
        sample.loop_length = 256;
        module.samples[0] = sample;
        let mut pattern = Pattern::new(4);
        pattern.set_cell(0, 0, Cell::new(428, 1, 0, 0));
        pattern.set_cell(8, 1, Cell::new(214, 1, 0x4, 0x46));
        pattern.set_cell(16, 0, Cell::new(0, 0, 0xF, 0x02));
        module.patterns[0] = pattern;
        module
    }

    #[test]
    fn seek_backward_matches_straight_playback() {
        let reference: Vec<Frame> = FrameStream::new(Player::new(module(), 22050))
            .skip(30_000)
            .take(500)
            .collect();

        let mut stream = FrameStream::new(Player::new(module(), 22050));
        stream.seek(40_000);
        stream.seek(30_000);
        assert_eq!(stream.position(), 30_000);
        let replay: Vec<Frame> = stream.by_ref().take(500).collect();
        assert_eq!(replay, reference);
        assert_eq!(stream.position(), 30_500);
    }

    #[test]
    fn iterator_ends_with_song() {
        let stream = FrameStream::new(Player::new(Module::new("e", Signature::Mk), 8000));
        let spt = stream.player().samples_per_tick() as usize;
        // 64 rows of 6 ticks, then the silent frame that detects the end
        assert_eq!(stream.count(), 64 * 6 * (spt + 1) + 1);
    }

    #[test]
    fn fill_stops_at_end() {
        let mut stream = FrameStream::new(Player::new(Module::new("e", Signature::Mk), 8000));
        let total = 64 * 6 * (stream.player().samples_per_tick() as u64 + 1) + 1;
        stream.seek(total - 10);
        let mut buf = [Frame::new(9.0, 9.0); 32];
        assert_eq!(stream.fill(&mut buf), 10);
        assert!(stream.is_finished());
        assert_eq!(buf[10], Frame::new(9.0, 9.0));
    }

    #[test]
    fn restart_rewinds() {
        let mut stream = FrameStream::new(Player::new(module(), 22050));
        let first: Vec<Frame> = stream.by_ref().take(100).collect();
        stream.restart();
        assert_eq!(stream.position(), 0);
        let again: Vec<Frame> = stream.take(100).collect();
        assert_eq!(first, again);
    }
}
