//! Module data model for ptplayer.
//!
//! A [`Module`] is built once by the format parser and never mutated
//! afterwards. The playback engine reads patterns and sample PCM from it
//! while keeping all runtime state on its own side.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod module;
mod pattern;
mod period;
mod sample;

pub use module::{Module, Signature, MAX_POSITIONS, NUM_SAMPLES};
pub use pattern::{Cell, Pattern, ROWS};
pub use period::{note_for_period, note_name, PERIOD_MAX, PERIOD_MIN, PERIOD_TABLE};
pub use sample::{pcm_from_byte, Sample};
