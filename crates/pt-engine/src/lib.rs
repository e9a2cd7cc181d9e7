//! Playback engine for the ptplayer ProTracker engine.
//!
//! A [`Player`] owns a parsed module and turns it into stereo frames one
//! at a time: the sequencer advances ticks, rows and positions, the effect
//! tables update channel state, and the mixer resamples every voice.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod channel;
mod effects;
mod filter;
mod frame;
mod frequency;
mod measure;
mod mixer;
mod player;
mod sequencer;
mod stream;

pub use channel::{Channel, ChannelFlags};
pub use filter::{LedFilter, LED_OFF_CUTOFF, LED_ON_CUTOFF};
pub use frame::Frame;
pub use frequency::{period_to_speed, samples_per_tick, PAULA_CLOCK};
pub use measure::SongLength;
pub use player::{Player, DEFAULT_SEED, SYNC_QUEUE_LEN};
pub use stream::FrameStream;
