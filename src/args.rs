//! Command-line argument parsing for pt-cli.

use std::env;

/// Parsed command-line arguments.
#[derive(Debug, PartialEq)]
pub struct CliArgs {
    /// Module file to play
    pub file_path: Option<String>,
    /// Render to this WAV file instead of the sound card
    pub wav_path: Option<String>,
    /// Render rate for WAV output
    pub sample_rate: u32,
    /// Cap on rendered length
    pub max_seconds: u32,
    pub repeat: bool,
    pub led_filter: bool,
    /// Print module information and exit
    pub info_only: bool,
    pub show_help: bool,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            file_path: None,
            wav_path: None,
            sample_rate: 44100,
            max_seconds: 300,
            repeat: false,
            led_filter: false,
            info_only: false,
            show_help: false,
        }
    }
}

impl CliArgs {
    /// Parse arguments from the command line.
    pub fn parse() -> Self {
        Self::parse_from(env::args().skip(1))
    }

    /// Parse from an argument list without the program name.
    pub fn parse_from(iter: impl IntoIterator<Item = String>) -> Self {
        let mut args = Self::default();
        let mut iter = iter.into_iter();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--wav" => match iter.next() {
                    Some(path) => args.wav_path = Some(path),
                    None => args.fail("--wav requires a file name"),
                },
                "--rate" => match iter.next().as_deref().map(str::parse::<u32>) {
                    Some(Ok(rate)) if (8000..=192_000).contains(&rate) => args.sample_rate = rate,
                    _ => args.fail("--rate requires a sample rate between 8000 and 192000"),
                },
                "--seconds" => match iter.next().as_deref().map(str::parse::<u32>) {
                    Some(Ok(seconds)) if seconds > 0 => args.max_seconds = seconds,
                    _ => args.fail("--seconds requires a positive number"),
                },
                "--repeat" => args.repeat = true,
                "--led-filter" => args.led_filter = true,
                "--info" => args.info_only = true,
                "--help" | "-h" => args.show_help = true,
                _ if arg.starts_with('-') => args.fail(&format!("Unknown flag: {}", arg)),
                _ => args.file_path = Some(arg),
            }
        }

        if args.file_path.is_none() {
            args.show_help = true;
        }
        args
    }

    fn fail(&mut self, message: &str) {
        eprintln!("{}", message);
        self.show_help = true;
    }

    /// Print help text to stderr.
    pub fn print_help() {
        eprintln!(
            "Usage:\n  pt-cli [options] <file.mod>\n\n\
             Options:\n\
             \x20 --wav <out.wav>   Render to a 16-bit WAV file instead of playing\n\
             \x20 --rate <hz>       WAV sample rate (default 44100)\n\
             \x20 --seconds <n>     Stop after n seconds (default 300)\n\
             \x20 --repeat          Loop the song instead of stopping at the end\n\
             \x20 --led-filter      Emulate the Amiga LED low-pass filter\n\
             \x20 --info            Print module information and exit\n\
             \x20 -h, --help        Show this help\n\n\
             Logging is controlled with RUST_LOG (e.g. RUST_LOG=debug).\n"
        );
    }
}
