//! Client configuration
//!
//! The API location is resolved from the environment first, then from
//! `config.json` in the notecmd config directory, then the local default.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

pub const ENV_API_URL: &str = "NOTECMD_API_URL";

const DEFAULT_SERVER_URL: &str = "http://localhost:8000";
const API_PATH: &str = "/api";
const CONFIG_FILE: &str = "config.json";
const TOKEN_FILE: &str = "session.json";

#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
    /// Server root, without the `/api` suffix
    #[serde(default)]
    server_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// API root including the `/api` path, no trailing slash
    pub api_url: String,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        let data_dir = Self::default_dir()?;
        Self::load_from(data_dir, env::var(ENV_API_URL).ok())
    }

    pub fn load_from(data_dir: PathBuf, env_url: Option<String>) -> Result<Self> {
        let file = read_file_config(&data_dir.join(CONFIG_FILE))?;

        let server_url = env_url
            .filter(|u| !u.trim().is_empty())
            .or(file.server_url)
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

        Ok(Self {
            api_url: api_root(&server_url)?,
            data_dir,
        })
    }

    pub fn token_path(&self) -> PathBuf {
        self.data_dir.join(TOKEN_FILE)
    }

    fn default_dir() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not find config directory"))?;
        Ok(config_dir.join("notecmd"))
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid config file {}", path.display()))
}

/// Turn a server root into the API root (`<server>/api`).
fn api_root(server_url: &str) -> Result<String> {
    let trimmed = server_url.trim().trim_end_matches('/');
    let parsed = url::Url::parse(trimmed)
        .with_context(|| format!("Invalid server URL: {}", server_url))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(anyhow!("Server URL must use http or https: {}", server_url));
    }
    if trimmed.ends_with(API_PATH) {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{}{}", trimmed, API_PATH))
    }
}
