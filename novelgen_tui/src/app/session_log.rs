use std::fs::{create_dir_all, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "NOVELGEN_LOG";
const DEFAULT_FILTER: &str = "info";

/// Routes `tracing` output to a per-session file, since the terminal belongs
/// to the UI. Returns the log path, or `None` when no file could be opened.
pub fn init_session_log() -> Option<PathBuf> {
    let path = build_log_path()?;
    if let Some(parent) = path.parent() {
        create_dir_all(parent).ok()?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .ok()?;

    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .ok()?;

    Some(path)
}

fn build_log_path() -> Option<PathBuf> {
    let base = dirs::data_dir().or_else(|| std::env::current_dir().ok())?;
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    Some(
        base.join("novelgen")
            .join("logs")
            .join(format!("session-{}.log", stamp)),
    )
}

const MAX_BLOCK_BYTES: usize = 16384;

/// Caps long bodies (prompts, chapter text) before they go to the log.
pub fn truncate_with_notice(input: &str, limit: usize) -> String {
    if input.len() <= limit {
        return input.to_string();
    }

    let mut out = String::new();
    for ch in input.chars() {
        if out.len() + ch.len_utf8() > limit.saturating_sub(64) {
            break;
        }
        out.push(ch);
    }
    let omitted = input.len().saturating_sub(out.len());
    out.push_str(&format!("\n...[truncated {} bytes]", omitted));
    out
}

pub fn log_block(label: &str, body: &str) {
    let bounded = truncate_with_notice(body, MAX_BLOCK_BYTES);
    tracing::debug!(target: "novelgen::session", "{} BEGIN\n{}\n{} END", label, bounded, label);
}
