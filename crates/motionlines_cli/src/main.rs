//! Command-line entry point for the motionlines core.
//!
//! # Responsibility
//! - Verify core crate linkage (`ping`, `version`).
//! - Number a markup file or render a motion snapshot from JSON, printing
//!   markup to stdout and collision ranges to stderr.
//! - Start file logging when `--log-dir` is given; without it log events are
//!   dropped and errors only reach stderr.

use clap::{Parser, Subcommand};
use log::error;
use motionlines_core::{
    default_log_level, init_logging, number_html, unify, MotionRenderer, MotionSnapshot,
    NumberingOptions, RenderConfig, RenderOptions, ViewMode, WordDiff,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "motionlines", version, about = "Line numbering for motion texts")]
struct Cli {
    /// Absolute directory for rolling log files.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    /// trace | debug | info | warn | error
    #[arg(long, global = true, default_value_t = default_log_level().to_string())]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Prints `pong`.
    Ping,
    /// Prints the core crate version.
    Version,
    /// Numbers an HTML file and prints the numbered markup.
    Number {
        file: PathBuf,
        #[arg(default_value_t = RenderConfig::default().column_width)]
        width: u32,
        #[arg(long, default_value_t = 1)]
        first_line: u32,
        /// Do not count `<ins>`/`.insert` content, e.g. when numbering diff
        /// output against the original text.
        #[arg(long)]
        ignore_inserted: bool,
    },
    /// Renders a motion snapshot (JSON) in one view mode.
    Render {
        snapshot: PathBuf,
        /// original | changed | diff | final | modified_final
        mode: ViewMode,
        #[arg(long, default_value_t = RenderConfig::default().column_width)]
        width: u32,
        #[arg(long)]
        no_line_numbers: bool,
        #[arg(long)]
        show_all: bool,
        #[arg(long)]
        include_internal: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Some(dir) = &cli.log_dir {
        if let Err(err) = init_logging(&cli.log_level, &dir.to_string_lossy()) {
            eprintln!("warning: logging disabled: {err}");
        }
    }
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli module=cli status=error error={message}");
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), String> {
    match command {
        Command::Ping => println!("motionlines_core ping={}", motionlines_core::ping()),
        Command::Version => println!(
            "motionlines_core version={}",
            motionlines_core::core_version()
        ),
        Command::Number {
            file,
            width,
            first_line,
            ignore_inserted,
        } => {
            let html = read(&file)?;
            let mut options = NumberingOptions::new(width, first_line);
            if ignore_inserted {
                options = options.ignoring_inserted_text();
            }
            let numbered = number_html(&html, &options).map_err(|err| err.to_string())?;
            println!("{numbered}");
        }
        Command::Render {
            snapshot,
            mode,
            width,
            no_line_numbers,
            show_all,
            include_internal,
        } => {
            let snapshot =
                MotionSnapshot::from_json(&read(&snapshot)?).map_err(|err| err.to_string())?;
            let renderer = MotionRenderer::new(WordDiff::new(), width);
            let changes = unify(&snapshot, &renderer.numbering(&snapshot.motion), renderer.differ())
                .map_err(|err| err.to_string())?;

            let mut options = RenderOptions::new(mode);
            if no_line_numbers {
                options = options.without_line_numbers();
            }
            if show_all {
                options = options.showing_all_changes();
            }
            if include_internal {
                options = options.including_internal();
            }
            let rendered = renderer
                .render(&snapshot.motion, &changes, &options)
                .map_err(|err| err.to_string())?;
            println!("{}", rendered.html);
            for range in rendered.collisions {
                eprintln!("collision lines {}..{}", range.from, range.to);
            }
            for inconsistency in changes.inconsistencies {
                eprintln!(
                    "inconsistent amendment {} paragraph {}",
                    inconsistency.amendment_id, inconsistency.paragraph_no
                );
            }
        }
    }
    Ok(())
}

fn read(path: &PathBuf) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|err| format!("cannot read `{}`: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn log_dir_and_ignore_inserted_are_parsed() {
        let cli = Cli::try_parse_from([
            "motionlines",
            "number",
            "diff.html",
            "40",
            "--ignore-inserted",
            "--log-dir",
            "/tmp/motionlines-logs",
            "--log-level",
            "warn",
        ])
        .expect("arguments parse");
        assert_eq!(cli.log_dir, Some(PathBuf::from("/tmp/motionlines-logs")));
        assert_eq!(cli.log_level, "warn");
        assert!(matches!(
            cli.command,
            Command::Number {
                width: 40,
                ignore_inserted: true,
                ..
            }
        ));
    }

    #[test]
    fn logging_is_off_without_log_dir() {
        let cli = Cli::try_parse_from(["motionlines", "ping"]).expect("arguments parse");
        assert!(cli.log_dir.is_none());
        assert!(matches!(cli.command, Command::Ping));
    }
}
