//! pt-cli: headless ProTracker playback and WAV export.
//!
//! Usage:
//!   pt-cli path/to/file.mod
//!   pt-cli path/to/file.mod --wav output.wav

mod args;

use args::CliArgs;
use pt_ir::{note_name, ROWS};
use pt_master::{Controller, Module, RenderOptions};
use std::io::Write;
use std::time::Duration;
use std::{fs, process};
use tracing::info;

#[cfg(feature = "alloc_check")]
#[global_allocator]
static A: assert_no_alloc::AllocDisabler = assert_no_alloc::AllocDisabler;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    if args.show_help {
        CliArgs::print_help();
        process::exit(1);
    }
    let Some(path) = args.file_path.as_deref() else {
        CliArgs::print_help();
        process::exit(1);
    };

    let data = fs::read(path).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {}", path, e);
        process::exit(1);
    });

    let mut ctrl = Controller::new();
    ctrl.load_mod(&data).unwrap_or_else(|e| {
        eprintln!("Failed to parse {}: {}", path, e);
        process::exit(1);
    });
    ctrl.set_options(RenderOptions {
        repeat: args.repeat,
        led_filter: args.led_filter,
        gain: None,
    });

    print_info(&ctrl, args.sample_rate);
    if args.info_only {
        return;
    }

    match args.wav_path.as_deref() {
        Some(wav) => render_to_wav(&ctrl, wav, args.sample_rate, args.max_seconds),
        None => play_audio(&mut ctrl, args.max_seconds),
    }
}

fn print_info(ctrl: &Controller, sample_rate: u32) {
    let module: &Module = ctrl.module();
    println!("Title:    {}", module.title);
    println!("Format:   {} ({} channels)", module.signature.as_str(), module.channels());
    println!("Patterns: {}", module.pattern_count());
    println!("Length:   {} positions, restart at {}", module.song_length, module.restart_position);

    let length = ctrl.measure(sample_rate);
    let seconds = length.seconds(sample_rate) as u64;
    println!(
        "Duration: {}:{:02}{}",
        seconds / 60,
        seconds % 60,
        if length.looped { " (loops)" } else { "" }
    );
    println!();

    println!(" #  Name                    Length  Fine  Vol  Loop");
    for (i, sample) in module.samples.iter().enumerate() {
        if sample.is_empty() && sample.name.is_empty() {
            continue;
        }
        let looping = if sample.has_loop() {
            format!("{}+{}", sample.loop_start, sample.loop_length)
        } else {
            "-".to_string()
        };
        println!(
            "{:2}  {:22}  {:6}  {:4}  {:3}  {}",
            i + 1,
            sample.name.as_str(),
            sample.len(),
            sample.finetune,
            sample.volume,
            looping
        );
    }
    println!();
}

fn play_audio(ctrl: &mut Controller, max_seconds: u32) {
    ctrl.play();
    println!("Playing...");
    println!();

    let started = std::time::Instant::now();
    let limit = Duration::from_secs(max_seconds as u64);
    while ctrl.is_playing() && started.elapsed() < limit {
        if let Some(pos) = ctrl.position() {
            print!(
                "\rPos: {:02X} | Pat: {:02X} | Row: {:02X} | {}",
                pos.position,
                pos.pattern,
                pos.row,
                row_notes(ctrl.module(), pos.pattern, pos.row)
            );
            let _ = std::io::stdout().flush();
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    ctrl.stop();

    println!("\rDone.                           ");
}

/// Note names of the first few channels of a row, `---` where no note.
fn row_notes(module: &Module, pattern: u8, row: usize) -> String {
    let Some(pattern) = module.patterns.get(pattern as usize).filter(|_| row < ROWS) else {
        return String::new();
    };
    (0..pattern.channels().min(8))
        .map(|ch| pattern.note(row, ch).map_or("---", note_name))
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_to_wav(ctrl: &Controller, path: &str, sample_rate: u32, max_seconds: u32) {
    info!(path, sample_rate, "rendering");
    println!("Rendering to {} at {} Hz...", path, sample_rate);

    let wav = ctrl.render_to_wav(sample_rate, max_seconds);
    println!("Rendered {} bytes", wav.len());

    fs::write(path, &wav).unwrap_or_else(|e| {
        eprintln!("Failed to write {}: {}", path, e);
        process::exit(1);
    });

    println!("Done.");
}
