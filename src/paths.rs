//! Where outputs go: `<base_dir>/<input_base_name>/`.

use std::env;
use std::path::{Path, PathBuf};

use crate::config::MergeConfig;

/// Directory containing the running binary, or `.` if it cannot be determined.
pub fn base_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Output locations derived from one input file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputLayout {
    /// `<base_dir>/<base_name>`
    pub dir: PathBuf,
    /// `<dir>/<base_name>_formatted.txt`
    pub formatted: PathBuf,
    /// `<dir>/merged_donatelog.txt`
    pub merged: PathBuf,
}

impl OutputLayout {
    pub fn for_input(base_dir: &Path, input: &Path, config: &MergeConfig) -> Self {
        let name = base_name(input);
        let dir = base_dir.join(&name);
        OutputLayout {
            formatted: dir.join(format!("{}{}", name, config.formatted_suffix)),
            merged: dir.join(&config.merged_file_name),
            dir,
        }
    }
}

/// File name without its last extension (`loot.2024.csv` -> `loot.2024`).
pub fn base_name(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
