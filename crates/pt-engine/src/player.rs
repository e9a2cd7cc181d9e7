//! The player: song position, timing, and channel state for one module.

use alloc::sync::Arc;
use alloc::vec::Vec;
use heapless::Deque;
use pt_ir::Module;
use tracing::debug;

use crate::channel::Channel;
use crate::frame::Frame;
use crate::frequency::{samples_per_tick, Tables};
use crate::sequencer::PlayerFlags;

/// Capacity of the sync event queue.
pub const SYNC_QUEUE_LEN: usize = 32;

/// Seed for the random vibrato waveform when none is given.
pub const DEFAULT_SEED: u64 = 0x5EED_0F_A1CE;

/// Plays one module at a fixed output rate.
#[derive(Clone, Debug)]
pub struct Player {
    pub(crate) module: Arc<Module>,
    pub(crate) tables: Tables,
    pub(crate) sample_rate: u32,

    pub(crate) playing: bool,
    pub(crate) paused: bool,
    pub(crate) repeat: bool,
    pub(crate) end_of_song: bool,
    /// LED filter state (only ever on for 4-channel modules)
    pub(crate) filter: bool,

    pub(crate) position: usize,
    pub(crate) row: usize,
    pub(crate) tick: u32,
    /// Frames into the current tick
    pub(crate) offset: u32,
    pub(crate) flags: PlayerFlags,

    /// Ticks per row
    pub(crate) speed: u32,
    pub(crate) bpm: u32,

    pub(crate) break_row: usize,
    pub(crate) pattern_jump: usize,
    pub(crate) pattern_delay: u32,
    pub(crate) pattern_wait: u32,
    pub(crate) loop_row: usize,
    pub(crate) loop_count: u32,

    pub(crate) channels: Vec<Channel>,
    pub(crate) vu: Vec<f32>,
    pub(crate) sync_queue: Deque<u8, SYNC_QUEUE_LEN>,
}

impl Player {
    /// Create a stopped player for `module`.
    pub fn new(module: impl Into<Arc<Module>>, sample_rate: u32) -> Self {
        Self::with_seed(module, sample_rate, DEFAULT_SEED)
    }

    /// Like [`Player::new`], seeding the random vibrato waveform.
    pub fn with_seed(module: impl Into<Arc<Module>>, sample_rate: u32, seed: u64) -> Self {
        Self::with_tables(module.into(), sample_rate, Tables::new(seed))
    }

    pub(crate) fn with_tables(module: Arc<Module>, sample_rate: u32, tables: Tables) -> Self {
        let channels = module.channels();
        let mut player = Self {
            module,
            tables,
            sample_rate,
            playing: false,
            paused: false,
            repeat: false,
            end_of_song: false,
            filter: false,
            position: 0,
            row: 0,
            tick: 0,
            offset: 0,
            flags: PlayerFlags::empty(),
            speed: 6,
            bpm: 125,
            break_row: 0,
            pattern_jump: 0,
            pattern_delay: 0,
            pattern_wait: 0,
            loop_row: 0,
            loop_count: 0,
            channels: Vec::with_capacity(channels),
            vu: Vec::with_capacity(channels),
            sync_queue: Deque::new(),
        };
        player.initialize();
        player
    }

    /// Reset song position, timing, and every channel to power-on state.
    ///
    /// Does not start or stop playback.
    pub fn initialize(&mut self) {
        let channels = self.module.channels();

        self.position = 0;
        self.row = 0;
        self.tick = 0;
        self.offset = 0;
        self.flags = PlayerFlags::empty();
        self.speed = 6;
        self.bpm = 125;
        self.break_row = 0;
        self.pattern_jump = 0;
        self.pattern_delay = 0;
        self.pattern_wait = 0;
        self.loop_row = 0;
        self.loop_count = 0;
        self.end_of_song = false;
        self.filter = self.module.filter && channels == 4;

        self.channels.clear();
        self.channels.resize(channels, Channel::default());
        self.vu.clear();
        self.vu.resize(channels, 0.0);
        self.sync_queue.clear();
    }

    /// Start playback from the top of the song.
    pub fn play(&mut self) {
        self.initialize();
        // Load row 0 on the first frame
        self.flags = PlayerFlags::NEW_TICK | PlayerFlags::NEW_ROW;
        self.playing = true;
        self.paused = false;
        debug!(
            channels = self.channels.len(),
            song_length = self.module.song_length,
            sample_rate = self.sample_rate,
            "playback started"
        );
    }

    /// Stop playback. Position is kept until the next [`Player::play`].
    pub fn stop(&mut self) {
        self.playing = false;
        self.paused = false;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Restart from position 0 instead of ending when the song runs out.
    pub fn set_repeat(&mut self, repeat: bool) {
        self.repeat = repeat;
    }

    pub fn repeat(&self) -> bool {
        self.repeat
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_end_of_song(&self) -> bool {
        self.end_of_song
    }

    /// Playing and not yet past the last position.
    pub fn is_active(&self) -> bool {
        self.playing && !self.end_of_song
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Current song position (index into the pattern table).
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    /// Ticks per row.
    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    /// Current LED filter state.
    pub fn filter(&self) -> bool {
        self.filter
    }

    /// Output frames per tick at the current BPM.
    pub fn samples_per_tick(&self) -> u32 {
        samples_per_tick(self.sample_rate, self.bpm)
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channel(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    /// Peak level per channel since the last [`Player::decay_vu`].
    pub fn vu(&self) -> &[f32] {
        &self.vu
    }

    /// Scale every VU level by `factor`.
    pub fn decay_vu(&mut self, factor: f32) {
        for level in &mut self.vu {
            *level *= factor;
        }
    }

    /// Queue a sync value from an `8xy` or `E8x` effect. When the queue is
    /// full the oldest value is dropped.
    pub(crate) fn push_sync(&mut self, value: u8) {
        if self.sync_queue.is_full() {
            self.sync_queue.pop_back();
        }
        let _ = self.sync_queue.push_front(value);
    }

    /// Oldest pending sync value.
    pub fn pop_sync(&mut self) -> Option<u8> {
        self.sync_queue.pop_back()
    }

    /// Render frames into `out`.
    ///
    /// With the `alloc_check` feature any heap allocation in here aborts.
    pub fn mix(&mut self, out: &mut [Frame]) {
        #[cfg(feature = "alloc_check")]
        assert_no_alloc::assert_no_alloc(|| self.mix_into(out));
        #[cfg(not(feature = "alloc_check"))]
        self.mix_into(out);
    }

    fn mix_into(&mut self, out: &mut [Frame]) {
        for frame in out {
            *frame = self.render_frame();
        }
    }

    /// Render up to `max_frames`, stopping early at the end of the song.
    pub fn render_frames(&mut self, max_frames: usize) -> Vec<Frame> {
        let mut frames = Vec::with_capacity(max_frames.min(self.sample_rate as usize));
        while frames.len() < max_frames && self.is_active() {
            frames.push(self.render_frame());
        }
        frames
    }
}
