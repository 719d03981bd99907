use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::model::Mode;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Per-request timeout. Unset means requests may wait indefinitely.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub default_mode: Mode,
    #[serde(default = "default_genres")]
    pub genres: Vec<String>,
    #[serde(default = "default_example_prompts")]
    pub example_prompts: Vec<String>,
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_theme() -> String {
    "auto".to_string()
}

fn default_genres() -> Vec<String> {
    [
        "英雄史诗",
        "现代都市",
        "科幻太空",
        "奇幻冒险",
        "悬疑推理",
        "青春校园",
    ]
    .iter()
    .map(|g| g.to_string())
    .collect()
}

fn default_example_prompts() -> Vec<String> {
    [
        "一个普通少年意外获得上古传承，踏上修仙之路",
        "2150年，人类第一艘殖民飞船抵达比邻星b",
        "雨夜，老侦探收到一封来自二十年前的信",
        "转学生在开学第一天发现学校天台藏着秘密",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            request_timeout_secs: None,
            debounce_ms: default_debounce_ms(),
            theme: default_theme(),
            default_mode: Mode::default(),
            genres: default_genres(),
            example_prompts: default_example_prompts(),
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("novelgen");
        Ok(config_dir.join("config.toml"))
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;

        Ok(config.normalized())
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir).await?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    pub fn normalized(mut self) -> Self {
        self.server_url = self.server_url.trim().trim_end_matches('/').to_string();
        if self.server_url.is_empty() {
            self.server_url = default_server_url();
        }

        self.genres = clean_list(self.genres);
        self.example_prompts = clean_list(self.example_prompts);
        self.request_timeout_secs = self.request_timeout_secs.filter(|secs| *secs > 0);
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let trimmed = item.trim();
        if trimmed.is_empty() || out.iter().any(|existing| existing == trimmed) {
            continue;
        }
        out.push(trimmed.to_string());
    }
    out
}
