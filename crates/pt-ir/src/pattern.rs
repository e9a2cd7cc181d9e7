//! Pattern and cell types.

use alloc::vec::Vec;

use crate::period::note_for_period;

/// Rows per pattern. Fixed by the format.
pub const ROWS: usize = 64;

/// A raw 4-byte pattern cell, kept exactly as stored in the file.
///
/// ```text
/// byte 0: sample hi nibble | period bits 11..8
/// byte 1: period bits 7..0
/// byte 2: sample lo nibble | effect command
/// byte 3: effect data
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cell(pub [u8; 4]);

impl Cell {
    /// An empty cell: no note, no sample, no effect.
    pub const fn empty() -> Self {
        Self([0; 4])
    }

    /// Pack a cell from its fields. Out-of-range bits are masked off.
    pub const fn new(period: u16, sample: u8, command: u8, data: u8) -> Self {
        Self([
            (sample & 0xF0) | ((period >> 8) as u8 & 0x0F),
            period as u8,
            ((sample & 0x0F) << 4) | (command & 0x0F),
            data,
        ])
    }

    /// 12-bit period (0 = no note).
    pub const fn period(self) -> u16 {
        ((self.0[0] as u16 & 0x0F) << 8) | self.0[1] as u16
    }

    /// Sample number (0 = none, 1-31 = sample index + 1).
    pub const fn sample(self) -> u8 {
        (self.0[0] & 0xF0) | (self.0[2] >> 4)
    }

    /// Effect command nibble.
    pub const fn command(self) -> u8 {
        self.0[2] & 0x0F
    }

    /// Effect data byte.
    pub const fn data(self) -> u8 {
        self.0[3]
    }

    /// Returns true if the cell is completely empty.
    pub fn is_empty(self) -> bool {
        self.0 == [0; 4]
    }
}

/// A 64-row pattern for a fixed channel count.
///
/// Cells are stored row-major. A parallel note table caches the note index
/// of every cell for display; playback never reads it.
#[derive(Clone, Debug, PartialEq)]
pub struct Pattern {
    channels: u8,
    cells: Vec<Cell>,
    notes: Vec<Option<u8>>,
}

impl Pattern {
    /// Create a pattern with empty cells.
    pub fn new(channels: u8) -> Self {
        let len = ROWS * channels as usize;
        Self {
            channels,
            cells: alloc::vec![Cell::empty(); len],
            notes: alloc::vec![None; len],
        }
    }

    /// Build a pattern from its raw bytes (`4 * channels * 64`).
    ///
    /// Missing trailing bytes leave the remaining cells empty.
    pub fn from_bytes(data: &[u8], channels: u8) -> Self {
        let mut pattern = Self::new(channels);
        for (i, raw) in data.chunks_exact(4).take(pattern.cells.len()).enumerate() {
            let cell = Cell([raw[0], raw[1], raw[2], raw[3]]);
            pattern.cells[i] = cell;
            pattern.notes[i] = note_for_period(cell.period());
        }
        pattern
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.channels as usize
    }

    /// Get a cell.
    pub fn cell(&self, row: usize, channel: usize) -> Cell {
        debug_assert!(row < ROWS);
        debug_assert!(channel < self.channels());
        self.cells[row * self.channels() + channel]
    }

    /// Replace a cell, keeping the note table in sync.
    pub fn set_cell(&mut self, row: usize, channel: usize, cell: Cell) {
        let idx = row * self.channels() + channel;
        self.cells[idx] = cell;
        self.notes[idx] = note_for_period(cell.period());
    }

    /// All cells of a row.
    pub fn row(&self, row: usize) -> &[Cell] {
        let start = row * self.channels();
        &self.cells[start..start + self.channels()]
    }

    /// Cached note index of a cell.
    pub fn note(&self, row: usize, channel: usize) -> Option<u8> {
        self.notes[row * self.channels() + channel]
    }
}
