mod bridge;
mod editor;
mod error;
mod host;
mod markdown;
mod parser;
mod serialiser;
mod srt;
mod timecode;

use crate::bridge::{Bridge, BridgeConfig, DEFAULT_PLUGIN_ID};
use crate::editor::Status;
use crate::host::project::ProjectConnector;

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser as ClapParser, Subcommand};

fn main() {
    let cli = Cli::parse();
    setup_logger(cli.verbose);
    match run(cli) {
        Ok(true) => (),
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("An error occurred: {}", err);
            for cause in err.chain().skip(1) {
                eprintln!("    {}", cause);
            }
            std::process::exit(1);
        }
    }
}

fn setup_logger(level: u8) {
    let log_level = match level {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    let mut builder = pretty_env_logger::formatted_timed_builder();
    builder.filter_level(log_level);
    builder.format_timestamp_millis();
    builder.init();
}

#[derive(ClapParser)]
#[command(about = "Edit the subtitle track of an editing host as SRT text")]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "The project document the host serves."
    )]
    project: PathBuf,
    #[arg(
        short,
        long,
        value_name = "N",
        default_value_t = 1,
        help = "The subtitle track to read and replace."
    )]
    track: usize,
    #[arg(
        long,
        value_name = "DIR",
        help = "Where temporary SRT files are written. Defaults to the system temp directory."
    )]
    temp_dir: Option<PathBuf>,
    #[arg(
        long,
        value_name = "SECS",
        default_value_t = 5,
        help = "Seconds to keep a temporary SRT file around after applying."
    )]
    cleanup_delay: u64,
    #[arg(long, default_value = DEFAULT_PLUGIN_ID, help = "The plugin id announced to the host.")]
    plugin_id: String,
    #[arg(long, help = "Print raw replies as JSON instead of a status line.")]
    json: bool,
    #[arg(short, long, action = clap::ArgAction::Count, help = "Increase log verbosity.")]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the subtitle track as editor text.
    Load {
        #[arg(
            short,
            long,
            value_name = "FILE",
            help = "The file to write to. If not supplied, the text will be written to standard output.",
            default_value = "-"
        )]
        output: String,
    },
    /// Replace the subtitle track with the cues in editor text.
    Apply {
        #[arg(
            short,
            long,
            value_name = "FILE",
            help = "The file to read from. If not supplied, the text will be read from standard input.",
            default_value = "-"
        )]
        input: String,
        #[arg(
            short,
            long,
            value_name = "FILE",
            help = "Write the current track as editor text to the specified file before replacing it."
        )]
        backup: Option<String>,
    },
    /// List the declared calls and live properties of a host object.
    Probe {
        #[arg(value_parser = ["timeline", "timelineItem", "mediaPool"])]
        kind: String,
    },
    /// Convert editor text to SRT without touching the host.
    Convert {
        #[arg(short, long, value_name = "FILE", default_value = "-")]
        input: String,
        #[arg(short, long, value_name = "FILE", default_value = "-")]
        output: String,
    },
}

/// `Ok(false)` once an error status line has been printed.
fn run(cli: Cli) -> Result<bool> {
    let mut config = BridgeConfig {
        plugin_id: cli.plugin_id,
        subtitle_track: cli.track,
        cleanup_delay: Duration::from_secs(cli.cleanup_delay),
        ..BridgeConfig::default()
    };
    if let Some(dir) = cli.temp_dir {
        config.temp_dir = dir;
    }
    let mut bridge = Bridge::new(ProjectConnector::new(cli.project), config);

    let result = match cli.command {
        Command::Load { output } => {
            if cli.json {
                print_json(&bridge.get_subtitles()).map(|_| true)
            } else {
                let loaded = editor::load(&mut bridge);
                if let Some(text) = loaded.text {
                    write_output(&output, &text)?;
                }
                Ok(report(&loaded.status))
            }
        }
        Command::Apply { input, backup } => {
            let text = read_input(&input)?;
            if let Some(backup_path) = backup {
                let loaded = editor::load(&mut bridge);
                if loaded.status.is_error() {
                    return Ok(report(&loaded.status));
                }
                std::fs::write(&backup_path, loaded.text.unwrap_or_default())
                    .context(format!("Failed to write backup file: '{}'", backup_path))?;
            }
            if cli.json {
                let cues = markdown::parse(&text);
                if cues.is_empty() {
                    return Err(anyhow!("You appear to have supplied no usable cues."));
                }
                print_json(&bridge.apply_subtitles(&serialiser::to_srt(&cues))).map(|_| true)
            } else {
                Ok(report(&editor::apply(&mut bridge, &text)))
            }
        }
        Command::Probe { kind } => print_json(&bridge.probe_object(&kind)).map(|_| true),
        Command::Convert { input, output } => {
            let cues = markdown::parse(&read_input(&input)?);
            if cues.is_empty() {
                return Err(anyhow!("You appear to have supplied no usable cues."));
            }
            if output == "-" {
                write_output(&output, &serialiser::to_srt(&cues))?;
            } else {
                serialiser::write_srt(&output, &cues)
                    .context(format!("Failed to write output file: '{}'", output))?;
            }
            Ok(true)
        }
    };

    bridge.finish();
    result
}

/// Prints the status line and tells whether it reports success.
fn report(status: &Status) -> bool {
    eprintln!("{}", status);
    !status.is_error()
}

fn print_json<T: serde::Serialize>(reply: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(reply).context("Failed to encode reply")?;
    println!("{}", json);
    Ok(())
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(input).context(format!("Failed to open input file: '{}'", input))
    }
}

fn write_output(output: &str, contents: &str) -> Result<()> {
    if output == "-" {
        io::stdout()
            .write_all(contents.as_bytes())
            .context("Failed to write to stdout")
    } else {
        std::fs::write(output, contents).context(format!("Failed to write output file: '{}'", output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_fails_the_run() {
        let failed = Status::Failed("No active timeline found.".to_string());
        assert_eq!(failed.to_string(), "Error: No active timeline found.");
        assert!(!report(&failed));
        assert!(!report(&Status::Rejected));
        assert!(!report(&Status::NoCues));

        assert!(report(&Status::Applied));
        assert!(report(&Status::EditorEmpty));
        assert!(report(&Status::NoSubtitles { track: 2 }));
    }
}
