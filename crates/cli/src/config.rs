use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use cftrack_api::client::CODEFORCES_BASE;
use cftrack_api::fetcher::DEFAULT_CHUNK_SIZE;
use cftrack_api::{ClientConfig, CodeforcesClient, FetchOptions, Signer};
use cftrack_core::history::DEFAULT_TOLERANCE_SECS;

const CONFIG_FILE: &str = "cftrack.toml";
const KEY_ENV: &str = "CODEFORCES_API_KEY";
const SECRET_ENV: &str = "CODEFORCES_SECRET";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub files: FilesConfig,
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub key: Option<String>,
    pub secret: Option<String>,
    pub chunk_size: usize,
    pub request_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: CODEFORCES_BASE.to_string(),
            key: None,
            secret: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            request_delay_ms: 2000,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    pub handles: PathBuf,
    pub data: PathBuf,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            handles: PathBuf::from("handles.txt"),
            data: PathBuf::from("user_data.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub years: Vec<i32>,
    pub month: u32,
    pub day: u32,
    pub tolerance_days: i64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            years: vec![2022, 2023, 2024],
            month: 3,
            day: 15,
            tolerance_days: DEFAULT_TOLERANCE_SECS / 86_400,
        }
    }
}

impl AppConfig {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cftrack")
            .join(CONFIG_FILE)
    }

    /// Load from `path` (or the default location). A missing default file
    /// gives defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Self::config_path();
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(std::env::var(KEY_ENV).ok(), std::env::var(SECRET_ENV).ok());
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("config not found at {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("failed to parse config")
    }

    /// Environment credentials take precedence over the file.
    fn apply_env(&mut self, key: Option<String>, secret: Option<String>) {
        if let Some(key) = key.filter(|k| !k.is_empty()) {
            self.api.key = Some(key);
        }
        if let Some(secret) = secret.filter(|s| !s.is_empty()) {
            self.api.secret = Some(secret);
        }
    }

    pub fn signer(&self) -> Signer {
        Signer::from_credentials(self.api.key.clone(), self.api.secret.clone())
    }

    pub fn client(&self) -> CodeforcesClient {
        CodeforcesClient::new(
            ClientConfig {
                base_url: self.api.base_url.clone(),
                timeout: Duration::from_secs(self.api.timeout_secs),
            },
            self.signer(),
        )
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.api.request_delay_ms)
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            chunk_size: self.api.chunk_size,
            delay: self.request_delay(),
        }
    }
}
