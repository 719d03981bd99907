use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use novelgen_core::{Config, HttpNovelApi};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::stdout;
use std::path::Path;
use std::sync::Arc;

mod app;
mod cli;
mod theme;
mod ui;

use app::runtime::run_app;
use app::session_log::init_session_log;
use app::state::App;
use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_path = init_session_log();
    let config = load_config(&args).await?;

    tracing::info!(
        server = %config.server_url,
        timeout = ?config.request_timeout(),
        "novelgen starting"
    );

    let api = HttpNovelApi::from_config(&config).context("Failed to build HTTP client")?;
    let mut app = App::new(config, Arc::new(api));
    if let Some(path) = &log_path {
        app.push_log(format!("Session log: {}", path.display()));
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    // Mouse support enables clickable buttons and chapter items.
    let mouse_capture_enabled = execute!(stdout, EnableMouseCapture).is_ok();
    let paste_enabled = execute!(stdout, EnableBracketedPaste).is_ok();
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    if paste_enabled {
        let _ = execute!(terminal.backend_mut(), DisableBracketedPaste);
    }
    if mouse_capture_enabled {
        let _ = execute!(terminal.backend_mut(), DisableMouseCapture);
    }
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "event loop failed");
        println!("{:?}", err);
    }

    Ok(())
}

/// Reads the config file (writing defaults on first run at the default
/// location), then layers the command-line flags on top.
async fn load_config(args: &Args) -> Result<Config> {
    let config = match &args.config {
        Some(path) => Config::load_from(path).await?,
        None => {
            let path = Config::default_path()?;
            let config = Config::load_from(&path).await?;
            if !path.exists() {
                write_default_config(&config, &path).await;
            }
            config
        }
    };
    Ok(args.apply(config))
}

/// A read-only config dir must not block startup; failures are only logged.
async fn write_default_config(config: &Config, path: &Path) -> bool {
    match config.save_to(path).await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(
                error = %err,
                path = %path.display(),
                "could not write default config"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unwritable_default_config_is_not_fatal() {
        // The parent "directory" is a regular file, so the write must fail.
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("Cargo.toml")
            .join("config.toml");
        assert!(!write_default_config(&Config::default(), &path).await);
    }
}
