//! Format support for ptplayer.
//!
//! Parses ProTracker MOD files into a [`pt_ir::Module`] and writes rendered
//! frames out as WAV.

mod mod_format;
mod wav_format;

pub use mod_format::{load_mod, HEADER_SIZE};
pub use wav_format::{default_gain, frames_to_wav, write_wav};

use thiserror::Error;

/// Error type for format parsing.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The tag at offset 1080 is not a known 31-sample signature
    #[error("unknown module signature {:?}", String::from_utf8_lossy(.0))]
    UnknownSignature([u8; 4]),
    /// The buffer ends before the header or pattern data does
    #[error("unexpected end of file")]
    UnexpectedEof,
    /// The fixed-size header could not be decoded
    #[error("malformed header: {0}")]
    Header(#[from] binrw::Error),
}
