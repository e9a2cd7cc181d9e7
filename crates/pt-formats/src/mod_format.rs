//! ProTracker MOD format parser.

use binrw::io::Cursor;
use binrw::BinRead;
use pt_ir::{
    pcm_from_byte, Module, Pattern, Sample, Signature, MAX_POSITIONS, NUM_SAMPLES, ROWS,
};
use tracing::{debug, warn};

use crate::FormatError;

/// Size of the fixed header up to and including the signature.
pub const HEADER_SIZE: usize = 1084;

/// 30-byte sample header; lengths and loop bounds are in 16-bit words.
#[derive(BinRead, Debug)]
#[br(big)]
struct RawSampleHeader {
    name: [u8; 22],
    length: u16,
    finetune: u8,
    volume: u8,
    loop_start: u16,
    loop_length: u16,
}

#[derive(BinRead, Debug)]
#[br(big)]
struct RawHeader {
    title: [u8; 20],
    samples: [RawSampleHeader; NUM_SAMPLES],
    song_length: u8,
    restart: u8,
    pattern_table: [u8; MAX_POSITIONS],
    signature: [u8; 4],
}

/// Load a MOD file from bytes.
pub fn load_mod(data: &[u8]) -> Result<Module, FormatError> {
    if data.len() < HEADER_SIZE {
        return Err(FormatError::UnexpectedEof);
    }

    let header = RawHeader::read(&mut Cursor::new(data))?;
    let signature = Signature::from_bytes(&header.signature)
        .ok_or(FormatError::UnknownSignature(header.signature))?;
    let channels = signature.channels();

    let mut module = Module::new("", signature);
    module.title = parse_title(&header.title);

    let mut samples: Vec<Sample> = header.samples.iter().map(parse_sample_header).collect();

    if header.song_length as usize > MAX_POSITIONS {
        warn!(song_length = header.song_length, "song length clamped to 128");
    }
    module.song_length = header.song_length.min(MAX_POSITIONS as u8);
    if header.restart != 127 {
        module.restart_position = header.restart;
    }
    module.pattern_table = header.pattern_table;

    // Every table entry counts, not only the first song_length ones
    let pattern_count = header.pattern_table.iter().copied().max().unwrap_or(0) as usize + 1;
    let pattern_size = 4 * ROWS * channels as usize;
    let patterns_end = HEADER_SIZE + pattern_count * pattern_size;
    if data.len() < patterns_end {
        return Err(FormatError::UnexpectedEof);
    }
    module.patterns = data[HEADER_SIZE..patterns_end]
        .chunks_exact(pattern_size)
        .map(|raw| Pattern::from_bytes(raw, channels))
        .collect();

    load_sample_data(&mut samples, &data[patterns_end..]);
    module.samples = samples;
    module.filter = initial_filter(&module);

    debug!(
        title = module.title.as_str(),
        signature = signature.as_str(),
        channels,
        patterns = pattern_count,
        song_length = module.song_length,
        "parsed module"
    );

    Ok(module)
}

/// Zero-terminated title, at most 20 bytes, each byte taken as a char.
fn parse_title(raw: &[u8; 20]) -> arrayvec::ArrayString<40> {
    let mut title = arrayvec::ArrayString::new();
    for &b in raw.iter().take_while(|&&b| b != 0) {
        title.push(b as char);
    }
    title
}

/// Zero-terminated name with non-printable bytes replaced by spaces.
fn parse_name(raw: &[u8; 22]) -> arrayvec::ArrayString<22> {
    let mut name = arrayvec::ArrayString::new();
    for &b in raw.iter().take_while(|&&b| b != 0) {
        name.push(if (0x20..0x7f).contains(&b) { b as char } else { ' ' });
    }
    name
}

fn parse_sample_header(raw: &RawSampleHeader) -> Sample {
    let finetune = (raw.finetune & 0x0F) as i8;
    Sample {
        name: parse_name(&raw.name),
        finetune: if finetune > 7 { finetune - 16 } else { finetune },
        volume: raw.volume,
        loop_start: raw.loop_start as usize * 2,
        loop_length: raw.loop_length as usize * 2,
        // Sized to the declared length; filled from the PCM block later
        data: vec![0.0; raw.length as usize * 2],
    }
}

/// Fill each sample from the concatenated PCM block and fix up its loop.
fn load_sample_data(samples: &mut [Sample], mut pcm: &[u8]) {
    for (i, sample) in samples.iter_mut().enumerate() {
        let declared = sample.len();
        let take = declared.min(pcm.len());
        if take < declared {
            warn!(sample = i, declared, available = take, "sample data truncated");
            sample.data.truncate(take);
        }
        for (dst, &b) in sample.data.iter_mut().zip(&pcm[..take]) {
            *dst = pcm_from_byte(b);
        }
        pcm = &pcm[take..];

        let (start, length) = (sample.loop_start, sample.loop_length);
        if sample.normalize_loop() && length != 2 {
            debug!(
                sample = i,
                loop_start = start,
                loop_length = length,
                "loop bounds corrected"
            );
        }
    }
}

/// Look at the first row of the first position for an `E0x` filter command.
fn initial_filter(module: &Module) -> bool {
    let Some(pattern) = module.pattern_at(0) else {
        return false;
    };
    let mut filter = false;
    for cell in pattern.row(0) {
        if cell.command() == 0x0E && cell.data() & 0xF0 == 0x00 {
            filter = cell.data() & 0x01 == 0;
        }
    }
    filter
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pt_ir::Cell;

    const PATTERN_4CH: usize = 4 * ROWS * 4;

    /// A header-only 4-channel module with one empty pattern.
    fn minimal(signature: &[u8; 4]) -> Vec<u8> {
        let channels = Signature::from_bytes(signature).map_or(4, |s| s.channels()) as usize;
        let mut buf = vec![0u8; HEADER_SIZE + 4 * ROWS * channels];
        buf[..5].copy_from_slice(b"tune!");
        buf[950] = 1;
        buf[951] = 127;
        buf[1080..1084].copy_from_slice(signature);
        buf
    }

    /// Header fields in file units: length and loop bounds in words.
    #[allow(clippy::too_many_arguments)]
    fn set_sample(
        buf: &mut [u8],
        idx: usize,
        name: &[u8],
        words: u16,
        ft: u8,
        vol: u8,
        loop_start: u16,
        loop_length: u16,
    ) {
        let st = 20 + idx * 30;
        buf[st..st + name.len()].copy_from_slice(name);
        buf[st + 22..st + 24].copy_from_slice(&words.to_be_bytes());
        buf[st + 24] = ft;
        buf[st + 25] = vol;
        buf[st + 26..st + 28].copy_from_slice(&loop_start.to_be_bytes());
        buf[st + 28..st + 30].copy_from_slice(&loop_length.to_be_bytes());
    }

    #[test]
    fn every_valid_signature_parses() {
        for (tag, ch) in [
            (b"M.K.", 4),
            (b"M!K!", 4),
            (b"4CHN", 4),
            (b"FLT4", 4),
            (b"6CHN", 6),
            (b"8CHN", 8),
            (b"FLT8", 8),
            (b"28CH", 28),
        ] {
            let module = load_mod(&minimal(tag)).unwrap();
            assert_eq!(module.channels(), ch);
            assert_eq!(module.patterns[0].channels(), ch);
        }
    }

    #[test]
    fn unknown_signature_fails() {
        let buf = minimal(b"XXXX");
        match load_mod(&buf) {
            Err(FormatError::UnknownSignature(tag)) => assert_eq!(&tag, b"XXXX"),
            other => panic!("expected UnknownSignature, got {:?}", other),
        }
    }

    #[test]
    fn short_buffers_fail_without_panicking() {
        assert!(matches!(load_mod(&[]), Err(FormatError::UnexpectedEof)));
        let buf = minimal(b"M.K.");
        assert!(matches!(
            load_mod(&buf[..HEADER_SIZE + 10]),
            Err(FormatError::UnexpectedEof)
        ));
    }

    #[test]
    fn header_fields() {
        let mut buf = minimal(b"M.K.");
        buf[950] = 3;
        buf[951] = 2;
        buf[952..955].copy_from_slice(&[0, 1, 0]);
        buf.extend(vec![0u8; PATTERN_4CH]); // pattern 1
        set_sample(&mut buf, 0, b"kick\x01drum", 0, 0x0F, 48, 0, 0);

        let module = load_mod(&buf).unwrap();
        assert_eq!(module.title.as_str(), "tune!");
        assert_eq!(module.signature, Signature::Mk);
        assert_eq!(module.song_length, 3);
        assert_eq!(module.restart_position, 2);
        assert_eq!(module.pattern_count(), 2);
        assert_eq!(module.samples.len(), 31);
        assert_eq!(module.samples[0].name.as_str(), "kick drum");
        assert_eq!(module.samples[0].finetune, -1);
        assert_eq!(module.samples[0].volume, 48);
    }

    #[test]
    fn restart_marker_127_means_zero() {
        let module = load_mod(&minimal(b"M.K.")).unwrap();
        assert_eq!(module.restart_position, 0);
    }

    #[test]
    fn pattern_count_uses_whole_table() {
        let mut buf = minimal(b"M.K.");
        buf[952 + 100] = 2; // beyond song length, still counted
        buf.extend(vec![0u8; 2 * PATTERN_4CH]);
        let module = load_mod(&buf).unwrap();
        assert_eq!(module.pattern_count(), 3);
    }

    #[test]
    fn pcm_is_normalized_asymmetrically() {
        let mut buf = minimal(b"M.K.");
        set_sample(&mut buf, 0, b"s", 2, 0, 64, 0, 0);
        buf.extend([0u8, 128, 255, 64]);

        let module = load_mod(&buf).unwrap();
        let data = &module.samples[0].data;
        assert_eq!(data.len(), 4);
        assert_eq!(data[0], 0.0);
        assert_eq!(data[1], -1.0);
        assert_relative_eq!(data[2], -0.0078125);
        assert_eq!(data[3], 0.5);
    }

    #[test]
    fn samples_are_read_back_to_back() {
        let mut buf = minimal(b"M.K.");
        set_sample(&mut buf, 0, b"a", 1, 0, 64, 0, 0);
        set_sample(&mut buf, 2, b"b", 1, 0, 64, 0, 0);
        buf.extend([64u8, 64, 32, 32]);

        let module = load_mod(&buf).unwrap();
        assert_eq!(module.samples[0].data, vec![0.5, 0.5]);
        assert!(module.samples[1].is_empty());
        assert_eq!(module.samples[2].data, vec![0.25, 0.25]);
    }

    #[test]
    fn loop_start_past_length_disables_loop() {
        let mut buf = minimal(b"M.K.");
        set_sample(&mut buf, 0, b"s", 4, 0, 64, 10, 2);
        buf.extend([0u8; 8]);
        let module = load_mod(&buf).unwrap();
        assert_eq!(module.samples[0].loop_start, 0);
        assert_eq!(module.samples[0].loop_length, 0);
    }

    #[test]
    fn one_word_loop_disables_loop() {
        let mut buf = minimal(b"M.K.");
        set_sample(&mut buf, 0, b"s", 4, 0, 64, 0, 1);
        buf.extend([0u8; 8]);
        let module = load_mod(&buf).unwrap();
        assert!(!module.samples[0].has_loop());
    }

    #[test]
    fn truncated_pcm_shortens_sample() {
        let mut buf = minimal(b"M.K.");
        set_sample(&mut buf, 0, b"s", 8, 0, 64, 2, 6);
        buf.extend([0u8; 10]);
        let module = load_mod(&buf).unwrap();
        let s = &module.samples[0];
        assert_eq!(s.len(), 10);
        // The loop now ends past the data that is present
        assert_eq!((s.loop_start, s.loop_length), (0, 0));

        let mut buf = minimal(b"M.K.");
        set_sample(&mut buf, 0, b"s", 8, 0, 64, 1, 2);
        buf.extend([0u8; 10]);
        let s = &load_mod(&buf).unwrap().samples[0];
        assert_eq!((s.loop_start, s.loop_length), (2, 4));
    }

    #[test]
    fn loop_overrunning_declared_length_is_dropped() {
        let mut buf = minimal(b"M.K.");
        set_sample(&mut buf, 0, b"s", 8, 0, 64, 4, 8);
        buf.extend([0u8; 16]);
        let s = &load_mod(&buf).unwrap().samples[0];
        assert_eq!(s.len(), 16);
        assert_eq!((s.loop_start, s.loop_length), (0, 0));
        assert!(!s.has_loop());
    }

    #[test]
    fn first_row_e00_enables_filter() {
        let mut buf = minimal(b"M.K.");
        buf[HEADER_SIZE + 8..HEADER_SIZE + 12].copy_from_slice(&Cell::new(0, 0, 0xE, 0x00).0);
        assert!(load_mod(&buf).unwrap().filter);

        buf[HEADER_SIZE + 8..HEADER_SIZE + 12].copy_from_slice(&Cell::new(0, 0, 0xE, 0x01).0);
        assert!(!load_mod(&buf).unwrap().filter);
    }

    #[test]
    fn song_length_is_clamped() {
        let mut buf = minimal(b"M.K.");
        buf[950] = 200;
        assert_eq!(load_mod(&buf).unwrap().song_length, 128);
    }
}
