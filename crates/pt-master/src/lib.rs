//! Headless controller for ptplayer.
//!
//! Provides one API for loading modules, real-time playback, and offline
//! rendering so the CLI and tests share the same code path.

use pt_audio::{AudioOutput, CpalOutput};
use pt_engine::{LedFilter, Player};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{info, warn};

// Re-export common types so callers don't need pt-ir/pt-engine directly.
pub use pt_engine::{Frame, SongLength};
pub use pt_formats::{default_gain, frames_to_wav, write_wav, FormatError};
pub use pt_ir::{Module, Signature};

/// Frames rendered per block on the playback thread.
const BLOCK_FRAMES: usize = 256;

/// Song position as seen by the playback thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaybackPosition {
    /// Index into the pattern table
    pub position: usize,
    /// Pattern played at that position
    pub pattern: u8,
    pub row: usize,
}

/// Rendering options shared by real-time and offline playback.
#[derive(Clone, Copy, Debug, Default)]
pub struct RenderOptions {
    /// Wrap to position 0 instead of ending
    pub repeat: bool,
    /// Run the output through the LED filter model
    pub led_filter: bool,
    /// Output gain; `None` uses [`default_gain`] for the channel count
    pub gain: Option<f32>,
}

/// Headless player controller: owns a module and manages playback.
pub struct Controller {
    module: Arc<Module>,
    options: RenderOptions,
    playback: Option<PlaybackHandle>,
}

struct PlaybackHandle {
    stop_signal: Arc<AtomicBool>,
    /// `position << 8 | row`
    current: Arc<AtomicU32>,
    finished: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Controller {
    pub fn new() -> Self {
        Self {
            module: Arc::new(Module::new("Untitled", Signature::Mk)),
            options: RenderOptions::default(),
            playback: None,
        }
    }

    // --- Module management ---

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn load_mod(&mut self, data: &[u8]) -> Result<(), FormatError> {
        self.stop();
        self.module = Arc::new(pt_formats::load_mod(data)?);
        Ok(())
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    /// Options apply from the next `play` or render call.
    pub fn set_options(&mut self, options: RenderOptions) {
        self.options = options;
    }

    /// Output gain in effect for the loaded module.
    pub fn gain(&self) -> f32 {
        self.options
            .gain
            .unwrap_or_else(|| default_gain(self.module.channels()))
    }

    /// Play time of the loaded module at `sample_rate`.
    pub fn measure(&self, sample_rate: u32) -> SongLength {
        Player::new(self.module.clone(), sample_rate).measure()
    }

    // --- Real-time playback ---

    pub fn play(&mut self) {
        self.stop();

        let module = self.module.clone();
        let options = self.options;
        let gain = self.gain();
        let stop_signal = Arc::new(AtomicBool::new(false));
        let current = Arc::new(AtomicU32::new(0));
        let finished = Arc::new(AtomicBool::new(false));

        let stop = stop_signal.clone();
        let pos = current.clone();
        let done = finished.clone();

        let thread = std::thread::spawn(move || {
            audio_thread(module, options, gain, stop, pos, done);
        });

        self.playback = Some(PlaybackHandle {
            stop_signal,
            current,
            finished,
            thread: Some(thread),
        });
    }

    pub fn stop(&mut self) {
        if let Some(mut pb) = self.playback.take() {
            pb.stop_signal.store(true, Ordering::Relaxed);
            if let Some(handle) = pb.thread.take() {
                let _ = handle.join();
            }
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| !p.finished.load(Ordering::Relaxed))
    }

    pub fn is_finished(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| p.finished.load(Ordering::Relaxed))
    }

    pub fn position(&self) -> Option<PlaybackPosition> {
        let pb = self.playback.as_ref()?;
        if pb.finished.load(Ordering::Relaxed) {
            return None;
        }
        let packed = pb.current.load(Ordering::Relaxed);
        let position = (packed >> 8) as usize;
        Some(PlaybackPosition {
            position,
            pattern: self.module.pattern_table.get(position).copied().unwrap_or(0),
            row: (packed & 0xFF) as usize,
        })
    }

    // --- Offline rendering ---

    /// Render from the top, stopping at the end of the song or after
    /// `max_frames`. Frames are the raw mix, LED-filtered if enabled.
    pub fn render_frames(&self, sample_rate: u32, max_frames: usize) -> Vec<Frame> {
        let mut player = Player::new(self.module.clone(), sample_rate);
        player.set_repeat(self.options.repeat);
        player.play();
        let mut filter = self.options.led_filter.then(|| LedFilter::new(sample_rate));

        let mut frames = Vec::with_capacity(max_frames.min(sample_rate as usize * 600));
        while player.is_active() && frames.len() < max_frames {
            let frame = player.render_frame();
            frames.push(match filter.as_mut() {
                Some(f) => f.process(frame, player.filter()),
                None => frame,
            });
        }
        frames
    }

    /// Render to an in-memory WAV file.
    pub fn render_to_wav(&self, sample_rate: u32, max_seconds: u32) -> Vec<u8> {
        let max_frames = (sample_rate as u64 * max_seconds as u64) as usize;
        let frames = self.render_frames(sample_rate, max_frames);
        frames_to_wav(&frames, sample_rate, self.gain())
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.stop();
    }
}

fn audio_thread(
    module: Arc<Module>,
    options: RenderOptions,
    gain: f32,
    stop_signal: Arc<AtomicBool>,
    current: Arc<AtomicU32>,
    finished: Arc<AtomicBool>,
) {
    let (mut output, consumer) = match CpalOutput::new() {
        Ok(pair) => pair,
        Err(err) => {
            warn!(%err, "no audio output");
            finished.store(true, Ordering::Relaxed);
            return;
        }
    };

    let sample_rate = output.sample_rate();
    let mut player = Player::new(module, sample_rate);
    player.set_repeat(options.repeat);
    player.play();
    let mut filter = LedFilter::new(sample_rate);

    if let Err(err) = output.build_stream(consumer) {
        warn!(%err, "failed to build audio stream");
        finished.store(true, Ordering::Relaxed);
        return;
    }
    let _ = output.start();
    info!(sample_rate, "playback thread running");

    let mut block = [Frame::silence(); BLOCK_FRAMES];
    while player.is_active() && !stop_signal.load(Ordering::Relaxed) {
        player.mix(&mut block);
        for frame in block {
            let frame = if options.led_filter {
                filter.process(frame, player.filter())
            } else {
                frame
            };
            output.write_spin(frame.scale(gain));
        }
        current.store(
            ((player.position() as u32) << 8) | player.row() as u32,
            Ordering::Relaxed,
        );
    }

    // Let the ring buffer drain before the stream is dropped
    if !stop_signal.load(Ordering::Relaxed) {
        for _ in 0..sample_rate / 10 {
            output.write_spin(Frame::silence());
        }
    }

    finished.store(true, Ordering::Relaxed);
}
