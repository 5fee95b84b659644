// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! # lootmerge — guild loot and donation log merge
//!
//! Picks a loot export, keeps the guild's rows, and merges the donation log entries made since
//! the first of those loots.
//!
//! ## Run
//!
//! | Step            | Description |
//! |-----------------|-------------|
//! | choose file     | Ask for the `;`-delimited loot export (`*.csv`, `*.txt`). Cancel exits with status 1. |
//! | filter          | Keep rows whose `looted_by__guild` is exactly `Smurfing Monkeys`; write them with the header. |
//! | cutoff          | Read `timestamp_utc` of the first kept row (`YYYY-MM-DDTHH:MM:SS[.ffffff]Z`). None: exit 0. |
//! | paste           | Ask for the copied donation log; empty text is refused and asked again. |
//! | merge           | Keep lines dated `MM/DD/YYYY HH:MM:SS` at or after the cutoff, verbatim and in order. |
//!
//! ## Output
//!
//! Next to the binary, in a directory named after the input file (`loot.csv` -> `loot/`):
//!
//! - `loot_formatted.txt`: the kept rows, `;`-delimited, header first.
//! - `merged_donatelog.txt`: the kept donation lines, one per line.
//!
//! Both are overwritten on every run. Their paths are printed on stdout; diagnostics go to
//! stderr (`RUST_LOG` sets the level, default `info`).

mod config;
mod donatelog;
mod error;
mod loot;
#[cfg(target_os = "macos")]
mod paste_dialog_macos;
mod paths;
mod prompt;
mod timestamp;

use chrono::NaiveDateTime;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;
#[cfg(unix)]
use libc::{signal, SIGPIPE, SIG_IGN};

use crate::config::MergeConfig;
use crate::error::MergeError;
use crate::paths::OutputLayout;
use crate::prompt::Prompter;

/// How a run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
enum RunOutcome {
    /// The file dialog was cancelled.
    NoFileSelected,
    /// No cutoff: filter failed, no guild rows, or an unparseable timestamp.
    NoCutoff,
    /// The paste surface was closed without a merge.
    Abandoned,
    Merged(PathBuf),
    /// Lines qualified but the merged file could not be written.
    WriteFailed,
}

impl RunOutcome {
    fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::NoFileSelected => 1,
            _ => 0,
        }
    }
}

/// One full run: choose file, filter, cutoff, paste, merge.
///
/// Filter failures are only reported; the cutoff step then finds no formatted file and the run
/// ends there.
fn run(base_dir: &Path, config: &MergeConfig, prompter: &mut dyn Prompter) -> RunOutcome {
    let input = match prompter.choose_file() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => {
            println!("No file selected.");
            return RunOutcome::NoFileSelected;
        }
    };
    debug!(input = %input.display(), "file selected");
    let layout = OutputLayout::for_input(base_dir, &input, config);

    match loot::process_loot_file(&input, &layout, config) {
        Ok(path) => println!("{}", path.display()),
        Err(e) => error!("{}", e),
    }

    let cutoff = match loot::read_cutoff(&layout.formatted, config) {
        Ok(c) => c,
        Err(MergeError::EmptyTable(path)) => {
            info!(path = %path.display(), "no guild rows, nothing to merge");
            return RunOutcome::NoCutoff;
        }
        Err(e) => {
            error!("{}", e);
            return RunOutcome::NoCutoff;
        }
    };
    info!(%cutoff, "cutoff from first guild loot");

    capture_and_merge(cutoff, &layout, config, prompter)
}

/// Asks for the donation log until something is merged or the user closes the surface.
fn capture_and_merge(
    cutoff: NaiveDateTime,
    layout: &OutputLayout,
    config: &MergeConfig,
    prompter: &mut dyn Prompter,
) -> RunOutcome {
    loop {
        let text = match prompter.ask_paste() {
            Some(t) => t,
            None => return RunOutcome::Abandoned,
        };
        if text.trim().is_empty() {
            prompter.show_error("Error", "Empty");
            continue;
        }
        let lines = donatelog::filter_pasted_text(&text, cutoff, &config.donation_header);
        if lines.is_empty() {
            prompter.show_info("Result", "No valid lines");
            continue;
        }
        let outcome = match donatelog::write_merged(&lines, &layout.merged) {
            Ok(()) => {
                println!("{}", layout.merged.display());
                RunOutcome::Merged(layout.merged.clone())
            }
            Err(e) => {
                error!("{}", e);
                RunOutcome::WriteFailed
            }
        };
        prompter.show_info("Done", "created");
        return outcome;
    }
}

fn main() {
    #[cfg(unix)]
    unsafe {
        signal(SIGPIPE, SIG_IGN);
    }
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let config = MergeConfig::default();
    let base_dir = paths::base_dir();
    debug!(base_dir = %base_dir.display(), "output base directory");
    let mut prompter = prompt::default_prompter();
    let outcome = run(&base_dir, &config, prompter.as_mut());
    match &outcome {
        RunOutcome::Merged(path) => debug!(path = %path.display(), "donation log merged"),
        other => debug!(outcome = ?other, "run finished"),
    }
    process::exit(outcome.exit_code());
}
