//! Amiga period table and note naming.

/// Lowest period a slide may reach (highest pitch, B-3).
pub const PERIOD_MIN: i32 = 113;

/// Highest period a slide may reach (lowest pitch, C-1).
pub const PERIOD_MAX: i32 = 856;

/// Paula periods for the three ProTracker octaves, C-1 to B-3.
pub const PERIOD_TABLE: [u16; 36] = [
    856, 808, 762, 720, 678, 640, 604, 570, 538, 508, 480, 453, // Octave 1
    428, 404, 381, 360, 339, 320, 302, 285, 269, 254, 240, 226, // Octave 2
    214, 202, 190, 180, 170, 160, 151, 143, 135, 127, 120, 113, // Octave 3
];

const NOTE_NAMES: [&str; 36] = [
    "C-1", "C#1", "D-1", "D#1", "E-1", "F-1", "F#1", "G-1", "G#1", "A-1", "A#1", "B-1",
    "C-2", "C#2", "D-2", "D#2", "E-2", "F-2", "F#2", "G-2", "G#2", "A-2", "A#2", "B-2",
    "C-3", "C#3", "D-3", "D#3", "E-3", "F-3", "F#3", "G-3", "G#3", "A-3", "A#3", "B-3",
];

/// Look up the note index of a packed cell period.
///
/// Only exact table matches produce a note; finetuned or out-of-range
/// periods return `None`, as does period 0 (no note).
pub fn note_for_period(period: u16) -> Option<u8> {
    if period == 0 {
        return None;
    }
    PERIOD_TABLE
        .iter()
        .position(|&p| p == period)
        .map(|i| i as u8)
}

/// Tracker-style name of a note index (`"C-1"` .. `"B-3"`), `"???"` when
/// outside the table.
pub fn note_name(note: u8) -> &'static str {
    NOTE_NAMES.get(note as usize).copied().unwrap_or("???")
}
