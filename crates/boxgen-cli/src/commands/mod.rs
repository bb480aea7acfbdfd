pub mod check;
pub mod completions;
pub mod generate;
pub mod inspect;
pub mod man_pages;

use boxgen_core::{Generator, GeneratorConfig};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_MANIFEST_ERROR: u8 = 2;
pub const EXIT_VALIDATION_ERROR: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

/// Frames of the progress spinner: partitions filling up one by one.
const SPINNER_FRAMES: &[&str] = &["▱▱▱", "▰▱▱", "▰▰▱", "▰▰▰", "▱▰▰", "▱▱▰"];

/// Progress indicator for a pipeline run, drawn on stderr so `--json` stdout stays clean.
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed:.dim}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(SPINNER_FRAMES);
    pb.set_style(style);
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Replace the spinner with a final pass or fail line.
pub fn finish_spinner(pb: &ProgressBar, passed: bool, msg: &str) {
    use console::Style;
    let mark = if passed {
        Style::new().green().apply_to("pass")
    } else {
        Style::new().red().bold().apply_to("FAIL")
    };
    pb.set_style(
        ProgressStyle::with_template("{msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.finish_with_message(format!("[{mark}] {msg}"));
}

pub fn colorize_role(is_main: bool) -> String {
    use console::Style;
    if is_main {
        Style::new().cyan().bold().apply_to("main").to_string()
    } else {
        Style::new().green().apply_to("box").to_string()
    }
}

/// The workspace must be an existing, readable directory.
pub fn resolve_workspace(path: &Path) -> Result<PathBuf, String> {
    if !path.is_dir() {
        return Err(format!("dir: '{}' is not a valid path", path.display()));
    }
    if let Err(e) = std::fs::read_dir(path) {
        return Err(format!(
            "dir: '{}' is not a readable dir: {e}",
            path.display()
        ));
    }
    std::fs::canonicalize(path).map_err(|e| format!("dir: '{}': {e}", path.display()))
}

/// An existing output path must be a directory. A missing one is created by
/// the writer once every artifact has rendered.
pub fn check_output_dir(path: &Path) -> Result<(), String> {
    if path.exists() && !path.is_dir() {
        return Err(format!("dir: '{}' is not a directory", path.display()));
    }
    Ok(())
}

/// Explicit `--config` wins; otherwise `boxgen.toml` at the workspace root, then defaults.
pub fn load_generator(config: Option<&Path>, workspace: &Path) -> Result<Generator, String> {
    let config = match config {
        Some(path) => GeneratorConfig::load(path),
        None => GeneratorConfig::load_or_default(workspace),
    }
    .map_err(|e| format!("config error: {e}"))?;
    Ok(Generator::new(config))
}
