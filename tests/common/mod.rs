//! Synthetic MOD files for the integration tests.

#![allow(dead_code)]

use pt_ir::{Cell, ROWS};

const HEADER_SIZE: usize = 1084;

/// Builds a MOD file byte by byte.
pub struct ModBuilder {
    title: String,
    tag: [u8; 4],
    channels: usize,
    order: Vec<u8>,
    patterns: Vec<Vec<Cell>>,
    samples: Vec<SampleSpec>,
}

#[derive(Clone, Default)]
struct SampleSpec {
    name: String,
    finetune: u8,
    volume: u8,
    loop_start: u16,
    loop_length: u16,
    pcm: Vec<u8>,
}

impl ModBuilder {
    pub fn new(tag: &[u8; 4], channels: usize) -> Self {
        Self {
            title: "synthetic".to_string(),
            tag: *tag,
            channels,
            order: vec![0],
            patterns: vec![vec![Cell::empty(); ROWS * channels]],
            samples: vec![SampleSpec::default(); 31],
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn order(mut self, order: &[u8]) -> Self {
        self.order = order.to_vec();
        let needed = order.iter().copied().max().unwrap_or(0) as usize + 1;
        while self.patterns.len() < needed {
            self.patterns.push(vec![Cell::empty(); ROWS * self.channels]);
        }
        self
    }

    pub fn cell(mut self, pattern: usize, row: usize, channel: usize, cell: Cell) -> Self {
        self.patterns[pattern][row * self.channels + channel] = cell;
        self
    }

    /// One-shot or looping sample from signed 8-bit PCM; loop values in bytes.
    pub fn sample(
        mut self,
        number: usize,
        name: &str,
        pcm: &[i8],
        volume: u8,
        loop_bytes: Option<(usize, usize)>,
    ) -> Self {
        let (start, length) = loop_bytes.unwrap_or((0, 2));
        self.samples[number - 1] = SampleSpec {
            name: name.to_string(),
            finetune: 0,
            volume,
            loop_start: (start / 2) as u16,
            loop_length: (length / 2) as u16,
            pcm: pcm.iter().map(|&b| b as u8).collect(),
        };
        self
    }

    pub fn finetune(mut self, number: usize, nibble: u8) -> Self {
        self.samples[number - 1].finetune = nibble;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_SIZE];
        let title = self.title.as_bytes();
        buf[..title.len().min(20)].copy_from_slice(&title[..title.len().min(20)]);

        for (i, s) in self.samples.iter().enumerate() {
            let st = 20 + i * 30;
            let name = s.name.as_bytes();
            buf[st..st + name.len().min(22)].copy_from_slice(&name[..name.len().min(22)]);
            let words = (s.pcm.len() / 2) as u16;
            buf[st + 22..st + 24].copy_from_slice(&words.to_be_bytes());
            buf[st + 24] = s.finetune;
            buf[st + 25] = s.volume;
            buf[st + 26..st + 28].copy_from_slice(&s.loop_start.to_be_bytes());
            buf[st + 28..st + 30].copy_from_slice(&s.loop_length.to_be_bytes());
        }

        buf[950] = self.order.len() as u8;
        buf[951] = 127;
        buf[952..952 + self.order.len()].copy_from_slice(&self.order);
        buf[1080..1084].copy_from_slice(&self.tag);

        for pattern in &self.patterns {
            for cell in pattern {
                buf.extend_from_slice(&cell.0);
            }
        }
        for s in &self.samples {
            buf.extend_from_slice(&s.pcm);
        }
        buf
    }
}

/// A square wave of `len` bytes at full scale.
pub fn square(len: usize, half_period: usize) -> Vec<i8> {
    (0..len)
        .map(|i| if (i / half_period) % 2 == 0 { 96 } else { -96 })
        .collect()
}

/// A module with one looping square sample and a few notes.
pub fn tune() -> Vec<u8> {
    ModBuilder::new(b"M.K.", 4)
        .title("tune")
        .sample(1, "square", &square(64, 16), 64, Some((0, 64)))
        .order(&[0, 1])
        .cell(0, 0, 0, Cell::new(428, 1, 0, 0))
        .cell(0, 0, 1, Cell::new(320, 1, 0xC, 0x20))
        .cell(0, 16, 0, Cell::new(0, 0, 0x4, 0x46))
        .cell(0, 32, 2, Cell::new(214, 1, 0x0, 0x47))
        .cell(0, 48, 3, Cell::new(856, 1, 0x3, 0x08))
        .cell(1, 0, 0, Cell::new(0, 0, 0xA, 0x02))
        .cell(1, 8, 1, Cell::new(0, 0, 0xE, 0x92))
        .cell(1, 20, 0, Cell::new(0, 0, 0xF, 0x04))
        .cell(1, 40, 2, Cell::new(0, 0, 0x8, 0x42))
        .build()
}
