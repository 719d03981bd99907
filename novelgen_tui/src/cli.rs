//! Command-line flags. Each one overrides the matching config file entry.

use clap::Parser;
use novelgen_core::Config;
use std::path::PathBuf;

/// `novelgen` - terminal client for an AI novel generation server
///
/// Sends a story idea to the server and browses the generated chapters.
#[derive(Parser, Debug, Default)]
#[command(name = "novelgen", version, about, long_about = None)]
pub struct Args {
    /// Base URL of the generation server (e.g. http://127.0.0.1:8000)
    #[arg(long)]
    pub server_url: Option<String>,

    /// Path to a config file instead of the default location
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Color theme: retro, dark, light or auto
    #[arg(long)]
    pub theme: Option<String>,

    /// Per-request timeout in seconds (0 disables it)
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl Args {
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(url) = &self.server_url {
            config.server_url = url.clone();
        }
        if let Some(theme) = &self.theme {
            config.theme = theme.clone();
        }
        if let Some(secs) = self.timeout {
            config.request_timeout_secs = Some(secs);
        }
        config.normalized()
    }
}
