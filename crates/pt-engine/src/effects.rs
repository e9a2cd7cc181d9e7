//! Effect handlers.
//!
//! Four dispatch tables of sixteen handlers each: main commands on the
//! first tick of a row, main commands on later ticks, and the same pair
//! for the `Exy` sub-commands. Every handler takes the player and a
//! channel index and only touches that channel plus the song-level
//! state (speed, jumps, sync queue).

use pt_ir::{PERIOD_MAX, PERIOD_MIN, PERIOD_TABLE};

use crate::channel::ChannelFlags;
use crate::player::Player;
use crate::sequencer::PlayerFlags;

type EffectFn = fn(&mut Player, usize);

const RECALC: ChannelFlags = ChannelFlags::RECALC_SPEED.union(ChannelFlags::RECALC_NOTE);

static FIRST_TICK: [EffectFn; 16] = [
    set_arpeggio,        // 0xy
    set_slide_speed,     // 1xx
    set_slide_speed,     // 2xx
    set_slide_to_speed,  // 3xx
    set_vibrato,         // 4xy
    nop,                 // 5xy
    nop,                 // 6xy
    nop,                 // 7xy
    sync,                // 8xy
    sample_offset,       // 9xx
    nop,                 // Axy
    position_jump,       // Bxx
    set_volume,          // Cxx
    pattern_break,       // Dxy
    extended_first_tick, // Exy
    set_speed,           // Fxx
];

static OTHER_TICKS: [EffectFn; 16] = [
    arpeggio,
    slide_up,
    slide_down,
    slide_to_note,
    vibrato,
    slide_to_note_volume_slide,
    vibrato_volume_slide,
    nop,
    nop,
    nop,
    volume_slide,
    nop,
    nop,
    nop,
    extended_other_ticks,
    nop,
];

static EXTENDED_FIRST_TICK: [EffectFn; 16] = [
    set_filter,       // E0x
    fine_slide_up,    // E1x
    fine_slide_down,  // E2x
    nop,              // E3x glissando
    set_vibrato_wave, // E4x
    nop,              // E5x finetune
    pattern_loop,     // E6x
    nop,              // E7x tremolo wave
    sync_extended,    // E8x
    nop,              // E9x
    fine_volume_up,   // EAx
    fine_volume_down, // EBx
    nop,              // ECx
    note_delay,       // EDx
    pattern_delay,    // EEx
    nop,              // EFx invert loop
];

static EXTENDED_OTHER_TICKS: [EffectFn; 16] = [
    nop,
    nop,
    nop,
    nop,
    nop,
    nop,
    nop,
    nop,
    nop,
    retrigger,  // E9x
    nop,
    nop,
    note_cut,   // ECx
    note_delay, // EDx
    nop,
    nop,
];

/// Run the channel's current effect for this tick.
pub(crate) fn dispatch(player: &mut Player, ch: usize) {
    let command = (player.channels[ch].command & 0x0F) as usize;
    if player.tick == 0 {
        FIRST_TICK[command](player, ch);
    } else {
        OTHER_TICKS[command](player, ch);
    }
}

fn nop(_: &mut Player, _: usize) {}

// --- First tick ---

fn set_arpeggio(player: &mut Player, ch: usize) {
    let channel = &mut player.channels[ch];
    channel.arpeggio = channel.data;
}

fn set_slide_speed(player: &mut Player, ch: usize) {
    let channel = &mut player.channels[ch];
    if channel.data != 0 {
        channel.slide_speed = channel.data as i32;
    }
}

fn set_slide_to_speed(player: &mut Player, ch: usize) {
    let channel = &mut player.channels[ch];
    if channel.data != 0 {
        channel.slide_to_speed = channel.data as i32;
    }
}

fn set_vibrato(player: &mut Player, ch: usize) {
    let channel = &mut player.channels[ch];
    if channel.data_lo() != 0 && channel.data_hi() != 0 {
        channel.vibrato_depth = channel.data_lo() as i32;
        channel.vibrato_speed = channel.data_hi() as usize;
    }
    vibrato(player, ch);
}

fn sync(player: &mut Player, ch: usize) {
    let value = player.channels[ch].data_lo();
    player.push_sync(value);
}

fn sample_offset(player: &mut Player, ch: usize) {
    let channel = &mut player.channels[ch];
    channel.sample_pos = channel.data as f64 * 256.0;
}

fn position_jump(player: &mut Player, ch: usize) {
    player.break_row = 0;
    player.pattern_jump = player.channels[ch].data as usize;
    player.flags |= PlayerFlags::JUMP;
}

fn set_volume(player: &mut Player, ch: usize) {
    let channel = &mut player.channels[ch];
    channel.volume = channel.data as i32;
}

fn pattern_break(player: &mut Player, ch: usize) {
    let channel = &player.channels[ch];
    player.break_row = channel.data_hi() as usize * 10 + channel.data_lo() as usize;
    if !player.flags.contains(PlayerFlags::JUMP) {
        player.pattern_jump = player.position + 1;
    }
    player.flags |= PlayerFlags::JUMP;
}

fn extended_first_tick(player: &mut Player, ch: usize) {
    let sub = player.channels[ch].data_hi() as usize;
    EXTENDED_FIRST_TICK[sub](player, ch);
}

fn set_speed(player: &mut Player, ch: usize) {
    let data = player.channels[ch].data as u32;
    if data > 32 {
        player.bpm = data;
    } else if data != 0 {
        player.speed = data;
    }
}

// --- Other ticks ---

fn arpeggio(player: &mut Player, ch: usize) {
    let tick = player.tick;
    let channel = &mut player.channels[ch];
    if channel.data == 0 {
        return;
    }
    let mut note = channel.note;
    match tick % 3 {
        1 => note += (channel.arpeggio >> 4) as usize,
        2 => note += (channel.arpeggio & 0x0F) as usize,
        _ => {}
    }
    if let Some(&period) = PERIOD_TABLE.get(note) {
        channel.voice_period = period as f64;
    }
    channel.flags |= ChannelFlags::RECALC_SPEED;
}

fn slide_up(player: &mut Player, ch: usize) {
    let channel = &mut player.channels[ch];
    channel.period = (channel.period - channel.slide_speed).max(PERIOD_MIN);
    channel.flags |= RECALC;
}

fn slide_down(player: &mut Player, ch: usize) {
    let channel = &mut player.channels[ch];
    channel.period = (channel.period + channel.slide_speed).min(PERIOD_MAX);
    channel.flags |= RECALC;
}

fn slide_to_note(player: &mut Player, ch: usize) {
    let channel = &mut player.channels[ch];
    if channel.period < channel.slide_to {
        channel.period = (channel.period + channel.slide_to_speed).min(channel.slide_to);
    } else if channel.period > channel.slide_to {
        channel.period = (channel.period - channel.slide_to_speed).max(channel.slide_to);
    }
    channel.flags |= RECALC;
}

fn vibrato(player: &mut Player, ch: usize) {
    let channel = &mut player.channels[ch];
    let wave = &player.tables.vibrato[(channel.vibrato_wave & 3) as usize];
    let waveform = wave[channel.vibrato_pos & 0x3F] as f64 / 63.0;
    channel.voice_period += channel.vibrato_depth as f64 * waveform;
    channel.flags |= ChannelFlags::RECALC_SPEED;
}

fn slide_to_note_volume_slide(player: &mut Player, ch: usize) {
    slide_to_note(player, ch);
    volume_slide(player, ch);
}

fn vibrato_volume_slide(player: &mut Player, ch: usize) {
    vibrato(player, ch);
    volume_slide(player, ch);
}

fn volume_slide(player: &mut Player, ch: usize) {
    let channel = &mut player.channels[ch];
    if channel.data_lo() == 0 {
        channel.volume = (channel.volume + channel.data_hi() as i32).min(64);
    }
    if channel.data_hi() == 0 {
        channel.volume = (channel.volume - channel.data_lo() as i32).max(0);
    }
}

fn extended_other_ticks(player: &mut Player, ch: usize) {
    let sub = player.channels[ch].data_hi() as usize;
    EXTENDED_OTHER_TICKS[sub](player, ch);
}

// --- Extended, first tick ---

fn set_filter(player: &mut Player, ch: usize) {
    if player.channels.len() > 4 {
        return;
    }
    player.filter = player.channels[ch].data & 0x01 == 0;
}

fn fine_slide_up(player: &mut Player, ch: usize) {
    let channel = &mut player.channels[ch];
    channel.period = (channel.period - channel.data_lo() as i32).max(PERIOD_MIN);
}

fn fine_slide_down(player: &mut Player, ch: usize) {
    let channel = &mut player.channels[ch];
    channel.period = (channel.period + channel.data_lo() as i32).min(PERIOD_MAX);
    channel.flags |= ChannelFlags::RECALC_SPEED;
}

fn set_vibrato_wave(player: &mut Player, ch: usize) {
    let channel = &mut player.channels[ch];
    channel.vibrato_wave = channel.data & 0x07;
}

fn pattern_loop(player: &mut Player, ch: usize) {
    let count = player.channels[ch].data_lo() as u32;
    if count == 0 {
        player.loop_row = player.row;
        return;
    }
    if player.loop_count != 0 {
        player.loop_count -= 1;
    } else {
        player.loop_count = count;
    }
    if player.loop_count != 0 {
        player.flags |= PlayerFlags::LOOP;
    }
}

fn sync_extended(player: &mut Player, ch: usize) {
    let value = player.channels[ch].data_lo();
    player.push_sync(value);
}

fn fine_volume_up(player: &mut Player, ch: usize) {
    let channel = &mut player.channels[ch];
    channel.volume = (channel.volume + channel.data_lo() as i32).min(64);
}

fn fine_volume_down(player: &mut Player, ch: usize) {
    let channel = &mut player.channels[ch];
    channel.volume = (channel.volume - channel.data_lo() as i32).max(0);
}

fn pattern_delay(player: &mut Player, ch: usize) {
    player.pattern_delay = player.channels[ch].data_lo() as u32;
    player.pattern_wait = 0;
}

// --- Extended, any tick ---

/// Start the row's note once `tick` reaches the delay.
fn note_delay(player: &mut Player, ch: usize) {
    if player.tick != player.channels[ch].data_lo() as u32 {
        return;
    }
    let Some(cell) = player
        .module
        .pattern_at(player.position)
        .map(|p| p.cell(player.row, ch))
    else {
        return;
    };

    let channel = &mut player.channels[ch];
    let period = cell.period();
    if period != 0 {
        channel.trigger(period as i32);
        channel.voice_period = period as f64;
    }
    let number = cell.sample() as usize;
    if number != 0 {
        if let Some(sample) = player.module.samples.get(number - 1) {
            channel.sample = number - 1;
            channel.volume = sample.volume as i32;
        }
    }
}

fn retrigger(player: &mut Player, ch: usize) {
    let interval = player.channels[ch].data_lo() as u32;
    if interval != 0 && player.tick % interval == 0 {
        player.channels[ch].sample_pos = 0.0;
    }
}

fn note_cut(player: &mut Player, ch: usize) {
    if player.tick == player.channels[ch].data_lo() as u32 {
        player.channels[ch].volume = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pt_ir::{Cell, Module, Pattern, Sample, Signature};

    fn player() -> Player {
        let mut module = Module::new("fx", Signature::Mk);
        let mut sample = Sample::new("s");
        sample.volume = 40;
        sample.data = vec![0.5; 1000];
        module.samples[0] = sample;
        let mut player = Player::new(module, 44100);
        player.play();
        player
    }

    fn run(player: &mut Player, tick: u32, command: u8, data: u8) {
        player.tick = tick;
        player.channels[0].command = command;
        player.channels[0].data = data;
        dispatch(player, 0);
    }

    #[test]
    fn arpeggio_cycles_three_notes() {
        let mut p = player();
        p.channels[0].note = 12;
        run(&mut p, 0, 0x0, 0x47);
        assert_eq!(p.channels[0].arpeggio, 0x47);
        run(&mut p, 1, 0x0, 0x47);
        assert_eq!(p.channels[0].voice_period, PERIOD_TABLE[16] as f64);
        run(&mut p, 2, 0x0, 0x47);
        assert_eq!(p.channels[0].voice_period, PERIOD_TABLE[19] as f64);
        p.channels[0].voice_period = 1.0;
        run(&mut p, 3, 0x0, 0x47);
        assert_eq!(p.channels[0].voice_period, PERIOD_TABLE[12] as f64);
    }

    #[test]
    fn arpeggio_past_table_keeps_period() {
        let mut p = player();
        p.channels[0].note = 35;
        p.channels[0].arpeggio = 0xF0;
        p.channels[0].voice_period = 300.0;
        run(&mut p, 1, 0x0, 0xF0);
        assert_eq!(p.channels[0].voice_period, 300.0);
    }

    #[test]
    fn zero_arpeggio_does_nothing() {
        let mut p = player();
        p.channels[0].voice_period = 300.0;
        run(&mut p, 1, 0x0, 0x00);
        assert_eq!(p.channels[0].voice_period, 300.0);
        assert!(p.channels[0].flags.is_empty());
    }

    #[test]
    fn portamento_clamps_to_period_range() {
        let mut p = player();
        p.channels[0].period = 120;
        run(&mut p, 0, 0x1, 0x10);
        run(&mut p, 1, 0x1, 0x10);
        assert_eq!(p.channels[0].period, PERIOD_MIN);

        p.channels[0].period = 850;
        run(&mut p, 0, 0x2, 0x08);
        run(&mut p, 1, 0x2, 0x08);
        assert_eq!(p.channels[0].period, PERIOD_MAX);
        assert!(p.channels[0].flags.contains(RECALC));
    }

    #[test]
    fn slide_speed_is_remembered() {
        let mut p = player();
        p.channels[0].period = 400;
        run(&mut p, 0, 0x1, 0x04);
        run(&mut p, 0, 0x1, 0x00);
        run(&mut p, 1, 0x1, 0x00);
        assert_eq!(p.channels[0].period, 396);
    }

    #[test]
    fn tone_portamento_never_overshoots() {
        let mut p = player();
        p.channels[0].period = 400;
        p.channels[0].slide_to = 428;
        run(&mut p, 0, 0x3, 0x10);
        run(&mut p, 1, 0x3, 0x00);
        assert_eq!(p.channels[0].period, 416);
        run(&mut p, 2, 0x3, 0x00);
        assert_eq!(p.channels[0].period, 428);
        run(&mut p, 3, 0x3, 0x00);
        assert_eq!(p.channels[0].period, 428);

        p.channels[0].slide_to = 420;
        run(&mut p, 4, 0x3, 0x00);
        assert_eq!(p.channels[0].period, 420);
    }

    #[test]
    fn vibrato_modulates_voice_period() {
        let mut p = player();
        p.channels[0].voice_period = 428.0;
        p.channels[0].vibrato_pos = 16;
        run(&mut p, 0, 0x4, 0x48);
        assert_eq!(p.channels[0].vibrato_speed, 4);
        assert_eq!(p.channels[0].vibrato_depth, 8);
        let expected = 428.0 + 8.0 * p.tables.vibrato[0][16] as f64 / 63.0;
        assert_relative_eq!(p.channels[0].voice_period, expected, epsilon = 1e-9);
        assert_eq!(p.channels[0].period, 214);
    }

    #[test]
    fn vibrato_needs_both_nibbles_to_update() {
        let mut p = player();
        run(&mut p, 0, 0x4, 0x48);
        run(&mut p, 0, 0x4, 0x40);
        assert_eq!(p.channels[0].vibrato_depth, 8);
    }

    #[test]
    fn volume_slide_clamps() {
        let mut p = player();
        p.channels[0].volume = 60;
        run(&mut p, 1, 0xA, 0x80);
        assert_eq!(p.channels[0].volume, 64);
        p.channels[0].volume = 3;
        run(&mut p, 1, 0xA, 0x05);
        assert_eq!(p.channels[0].volume, 0);
    }

    #[test]
    fn combined_slides_apply_volume_too() {
        let mut p = player();
        p.channels[0].volume = 10;
        p.channels[0].period = 400;
        p.channels[0].slide_to = 410;
        p.channels[0].slide_to_speed = 4;
        run(&mut p, 1, 0x5, 0x20);
        assert_eq!(p.channels[0].period, 404);
        assert_eq!(p.channels[0].volume, 12);

        run(&mut p, 1, 0x6, 0x03);
        assert_eq!(p.channels[0].volume, 9);
    }

    #[test]
    fn set_volume_is_unclamped() {
        let mut p = player();
        run(&mut p, 0, 0xC, 0x50);
        assert_eq!(p.channels[0].volume, 0x50);
    }

    #[test]
    fn sample_offset_in_pages() {
        let mut p = player();
        run(&mut p, 0, 0x9, 0x02);
        assert_eq!(p.channels[0].sample_pos, 512.0);
    }

    #[test]
    fn speed_and_bpm_split_at_32() {
        let mut p = player();
        run(&mut p, 0, 0xF, 0x20);
        assert_eq!((p.speed, p.bpm), (32, 125));
        run(&mut p, 0, 0xF, 0x21);
        assert_eq!((p.speed, p.bpm), (32, 33));
        run(&mut p, 0, 0xF, 0x00);
        assert_eq!((p.speed, p.bpm), (32, 33));
    }

    #[test]
    fn sync_commands_queue_low_nibble() {
        let mut p = player();
        run(&mut p, 0, 0x8, 0x35);
        run(&mut p, 0, 0xE, 0x87);
        assert_eq!(p.pop_sync(), Some(5));
        assert_eq!(p.pop_sync(), Some(7));
        assert_eq!(p.pop_sync(), None);
    }

    #[test]
    fn filter_toggle() {
        let mut p = player();
        run(&mut p, 0, 0xE, 0x00);
        assert!(p.filter());
        run(&mut p, 0, 0xE, 0x01);
        assert!(!p.filter());
    }

    #[test]
    fn fine_slides() {
        let mut p = player();
        p.channels[0].period = 115;
        run(&mut p, 0, 0xE, 0x1F);
        assert_eq!(p.channels[0].period, PERIOD_MIN);
        assert!(p.channels[0].flags.is_empty());
        p.channels[0].period = 850;
        run(&mut p, 0, 0xE, 0x2F);
        assert_eq!(p.channels[0].period, PERIOD_MAX);
        assert!(p.channels[0].flags.contains(ChannelFlags::RECALC_SPEED));
    }

    #[test]
    fn fine_volume() {
        let mut p = player();
        p.channels[0].volume = 60;
        run(&mut p, 0, 0xE, 0xAF);
        assert_eq!(p.channels[0].volume, 64);
        p.channels[0].volume = 5;
        run(&mut p, 0, 0xE, 0xBF);
        assert_eq!(p.channels[0].volume, 0);
    }

    #[test]
    fn retrigger_every_x_ticks() {
        let mut p = player();
        p.channels[0].sample_pos = 50.0;
        run(&mut p, 1, 0xE, 0x93);
        assert_eq!(p.channels[0].sample_pos, 50.0);
        run(&mut p, 3, 0xE, 0x93);
        assert_eq!(p.channels[0].sample_pos, 0.0);
        p.channels[0].sample_pos = 50.0;
        run(&mut p, 2, 0xE, 0x90);
        assert_eq!(p.channels[0].sample_pos, 50.0);
    }

    #[test]
    fn note_cut_on_tick() {
        let mut p = player();
        run(&mut p, 1, 0xE, 0xC2);
        assert_eq!(p.channels[0].volume, 64);
        run(&mut p, 2, 0xE, 0xC2);
        assert_eq!(p.channels[0].volume, 0);
    }

    #[test]
    fn note_delay_triggers_on_tick() {
        let mut module = Module::new("fx", Signature::Mk);
        let mut sample = Sample::new("s");
        sample.volume = 40;
        sample.data = vec![0.5; 100];
        module.samples[0] = sample;
        let mut pattern = Pattern::new(4);
        pattern.set_cell(0, 0, Cell::new(428, 1, 0xE, 0xD2));
        module.patterns[0] = pattern;
        let mut p = Player::new(module, 44100);
        p.play();

        run(&mut p, 0, 0xE, 0xD2);
        run(&mut p, 1, 0xE, 0xD2);
        assert!(!p.channels[0].note_on);
        run(&mut p, 2, 0xE, 0xD2);
        let ch = &p.channels[0];
        assert!(ch.note_on);
        assert_eq!(ch.period, 428);
        assert_eq!(ch.voice_period, 428.0);
        assert_eq!(ch.volume, 40);
        assert_eq!(ch.sample_pos, 0.0);
    }

    #[test]
    fn pattern_delay_sets_counter() {
        let mut p = player();
        p.pattern_wait = 3;
        run(&mut p, 0, 0xE, 0xE4);
        assert_eq!((p.pattern_delay, p.pattern_wait), (4, 0));
    }

    #[test]
    fn position_jump_resets_break_row() {
        let mut p = player();
        p.break_row = 9;
        run(&mut p, 0, 0xB, 0x05);
        assert_eq!((p.pattern_jump, p.break_row), (5, 0));
        assert!(p.flags.contains(PlayerFlags::JUMP));
    }
}
