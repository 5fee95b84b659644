//! User interaction: choosing the loot export, pasting the donation log, and notices.
//!
//! The pipeline only sees [`Prompter`]. Which implementation backs it depends on the platform:
//! AppKit panels on macOS, `zenity` on other Unix desktops, and plain stdin/stdout everywhere
//! else (or when no display is available).

use std::env;
use std::fs;
use std::io::{self, BufRead, Stdout, StdinLock, Write};
use std::path::{Path, PathBuf};
#[cfg(all(unix, not(target_os = "macos")))]
use std::process::{Command, Stdio};

use regex::Regex;
use tracing::debug;

pub const FILE_DIALOG_TITLE: &str = "Select the file";
pub const FILE_FILTER_NAME: &str = "CSV and Text files";
pub const PASTE_TITLE: &str = "Paste New Text";
pub const PASTE_PROMPT: &str = "Please paste the donation log.";
pub const SUBMIT_LABEL: &str = "Process Pasted Content";

/// Line that ends a paste in the terminal.
const TERMINAL_PASTE_END: &str = ".";

/// The dialogs a run needs.
pub trait Prompter {
    /// Path of the loot export, or `None` if the user cancelled.
    fn choose_file(&mut self) -> Option<PathBuf>;
    /// Raw pasted text on submit, or `None` if the user closed the surface.
    fn ask_paste(&mut self) -> Option<String>;
    fn show_error(&mut self, title: &str, message: &str);
    fn show_info(&mut self, title: &str, message: &str);
}

/// Best available prompter for this platform.
pub fn default_prompter() -> Box<dyn Prompter> {
    #[cfg(target_os = "macos")]
    {
        if let Some(p) = crate::paste_dialog_macos::NativePrompter::new() {
            return Box::new(p);
        }
    }
    #[cfg(all(unix, not(target_os = "macos")))]
    {
        if ZenityPrompter::display_available() {
            return Box::new(ZenityPrompter::new());
        }
    }
    Box::new(TerminalPrompter::stdio())
}

/// Files in `dir` whose name ends in `.csv` or `.txt` (any case), sorted by name.
pub fn candidate_files(dir: &Path) -> Vec<PathBuf> {
    let re = match Regex::new(r"(?i)\.(csv|txt)$") {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };
    let mut found: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| re.is_match(n))
                    .unwrap_or(false)
            })
            .collect(),
        Err(_) => Vec::new(),
    };
    found.sort();
    found
}

/// Prompter over a line-oriented reader and writer (stdin/stdout in production).
pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
    /// Directory whose `*.csv`/`*.txt` files are offered by number.
    dir: PathBuf,
    /// Input hit EOF; nothing more can be pasted.
    closed: bool,
}

impl TerminalPrompter<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        let dir = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        TerminalPrompter::new(io::stdin().lock(), io::stdout(), dir)
    }
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(input: R, output: W, dir: PathBuf) -> Self {
        TerminalPrompter {
            input,
            output,
            dir,
            closed: false,
        }
    }

    /// One line without its terminator; `None` at EOF or on a read error.
    fn read_line(&mut self) -> Option<String> {
        let mut buf = String::new();
        match self.input.read_line(&mut buf) {
            Ok(0) | Err(_) => {
                self.closed = true;
                None
            }
            Ok(_) => Some(buf.trim_end_matches(|c: char| c == '\r' || c == '\n').to_string()),
        }
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn choose_file(&mut self) -> Option<PathBuf> {
        let candidates = candidate_files(&self.dir);
        let _ = writeln!(self.output, "{}", FILE_DIALOG_TITLE);
        if !candidates.is_empty() {
            let _ = writeln!(self.output, "{} in {}:", FILE_FILTER_NAME, self.dir.display());
            for (i, p) in candidates.iter().enumerate() {
                let name = p.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
                let _ = writeln!(self.output, "  {}) {}", i + 1, name);
            }
        }
        let _ = write!(self.output, "File (number or path, empty to cancel): ");
        let _ = self.output.flush();
        let answer = self.read_line()?;
        let answer = answer.trim().trim_matches(|c: char| c == '\'' || c == '"');
        if answer.is_empty() {
            return None;
        }
        if let Ok(n) = answer.parse::<usize>() {
            if n >= 1 && n <= candidates.len() {
                return Some(candidates[n - 1].clone());
            }
        }
        Some(PathBuf::from(answer))
    }

    fn ask_paste(&mut self) -> Option<String> {
        if self.closed {
            return None;
        }
        let _ = writeln!(self.output, "{}", PASTE_TITLE);
        let _ = writeln!(self.output, "{}", PASTE_PROMPT);
        let _ = writeln!(
            self.output,
            "Finish with a line containing only \"{}\" to {}.",
            TERMINAL_PASTE_END,
            SUBMIT_LABEL.to_lowercase()
        );
        let _ = self.output.flush();
        let mut text = String::new();
        let mut read_any = false;
        while let Some(line) = self.read_line() {
            read_any = true;
            if line.trim() == TERMINAL_PASTE_END {
                return Some(text);
            }
            text.push_str(&line);
            text.push('\n');
        }
        debug!(read_any, "paste input reached EOF");
        if read_any {
            Some(text)
        } else {
            None
        }
    }

    fn show_error(&mut self, title: &str, message: &str) {
        let _ = writeln!(self.output, "{}: {}", title, message);
    }

    fn show_info(&mut self, title: &str, message: &str) {
        let _ = writeln!(self.output, "{}: {}", title, message);
    }
}

/// Result of one `zenity` invocation.
#[cfg(all(unix, not(target_os = "macos")))]
enum ZenityOutcome {
    Accepted(String),
    Dismissed,
}

/// Desktop dialogs via the `zenity` helper; drops to the terminal when it cannot be spawned.
#[cfg(all(unix, not(target_os = "macos")))]
pub struct ZenityPrompter {
    terminal: TerminalPrompter<StdinLock<'static>, Stdout>,
    zenity_ok: bool,
    /// Text of the last submit, offered again when the user has to resubmit.
    draft: String,
}

#[cfg(all(unix, not(target_os = "macos")))]
impl ZenityPrompter {
    pub fn new() -> Self {
        ZenityPrompter {
            terminal: TerminalPrompter::stdio(),
            zenity_ok: true,
            draft: String::new(),
        }
    }

    pub fn display_available() -> bool {
        env::var_os("DISPLAY").is_some() || env::var_os("WAYLAND_DISPLAY").is_some()
    }

    /// Runs zenity with `args`, feeding `stdin_text` if given. `None` if zenity could not run.
    fn run(&mut self, args: &[&str], stdin_text: Option<&str>) -> Option<ZenityOutcome> {
        if !self.zenity_ok {
            return None;
        }
        let child = Command::new("zenity")
            .args(args)
            .stdin(if stdin_text.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn();
        let mut child = match child {
            Ok(c) => c,
            Err(e) => {
                debug!(error = %e, "zenity unavailable, using terminal prompts");
                self.zenity_ok = false;
                return None;
            }
        };
        if let (Some(text), Some(mut stdin)) = (stdin_text, child.stdin.take()) {
            let _ = stdin.write_all(text.as_bytes());
        }
        let output = match child.wait_with_output() {
            Ok(o) => o,
            Err(e) => {
                debug!(error = %e, "zenity failed, using terminal prompts");
                self.zenity_ok = false;
                return None;
            }
        };
        if output.status.success() {
            Some(ZenityOutcome::Accepted(
                String::from_utf8_lossy(&output.stdout).into_owned(),
            ))
        } else {
            Some(ZenityOutcome::Dismissed)
        }
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
impl Default for ZenityPrompter {
    fn default() -> Self {
        ZenityPrompter::new()
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
impl Prompter for ZenityPrompter {
    fn choose_file(&mut self) -> Option<PathBuf> {
        let title = format!("--title={}", FILE_DIALOG_TITLE);
        let filter = format!("--file-filter={} | *.csv *.txt", FILE_FILTER_NAME);
        let args = [
            "--file-selection",
            title.as_str(),
            filter.as_str(),
            "--file-filter=All files | *",
        ];
        match self.run(&args, None) {
            Some(ZenityOutcome::Accepted(out)) => {
                let path = out.trim_end_matches(|c: char| c == '\r' || c == '\n');
                if path.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(path))
                }
            }
            Some(ZenityOutcome::Dismissed) => None,
            None => self.terminal.choose_file(),
        }
    }

    fn ask_paste(&mut self) -> Option<String> {
        let title = format!("--title={} - {}", PASTE_TITLE, PASTE_PROMPT);
        let ok_label = format!("--ok-label={}", SUBMIT_LABEL);
        let args = [
            "--text-info",
            "--editable",
            title.as_str(),
            ok_label.as_str(),
            "--width=640",
            "--height=420",
        ];
        let draft = std::mem::take(&mut self.draft);
        match self.run(&args, Some(draft.as_str())) {
            Some(ZenityOutcome::Accepted(text)) => {
                self.draft = text.clone();
                Some(text)
            }
            Some(ZenityOutcome::Dismissed) => None,
            None => self.terminal.ask_paste(),
        }
    }

    fn show_error(&mut self, title: &str, message: &str) {
        let t = format!("--title={}", title);
        let m = format!("--text={}", message);
        if self.run(&["--error", t.as_str(), m.as_str()], None).is_none() {
            self.terminal.show_error(title, message);
        }
    }

    fn show_info(&mut self, title: &str, message: &str) {
        let t = format!("--title={}", title);
        let m = format!("--text={}", message);
        if self.run(&["--info", t.as_str(), m.as_str()], None).is_none() {
            self.terminal.show_info(title, message);
        }
    }
}
