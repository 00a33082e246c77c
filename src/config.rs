use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::clients::tmdb::TMDB_API;
use crate::domain::{SortKey, SortOrder};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub tmdb: TmdbConfig,

    pub catalogue: CatalogueConfig,

    pub retry: RetryConfig,

    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Directory holding the local key-value cache documents.
    pub cache_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            worker_threads: 2,
            cache_dir: "data/cache".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TmdbConfig {
    pub base_url: String,

    pub image_base_url: String,

    /// Locale sent as the `language` parameter on every request.
    pub language: String,

    /// Request timeout in seconds (default: 8)
    pub timeout_seconds: u64,

    /// Environment variable the API key is read from.
    pub api_key_env: String,

    /// Inline API key. Takes precedence over the environment when non-empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            base_url: TMDB_API.to_string(),
            image_base_url: "https://image.tmdb.org/t/p".to_string(),
            language: "en-US".to_string(),
            timeout_seconds: 8,
            api_key_env: "TMDB_API_KEY".to_string(),
            api_key: None,
        }
    }
}

impl TmdbConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogueConfig {
    /// How many top-rated movies to keep (default: 250)
    pub target_count: usize,

    /// Items per upstream page (default: 20)
    pub page_size: usize,

    pub cache_ttl_hours: u64,
}

impl Default for CatalogueConfig {
    fn default() -> Self {
        Self {
            target_count: 250,
            page_size: 20,
            cache_ttl_hours: 24,
        }
    }
}

impl CatalogueConfig {
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_hours.saturating_mul(60 * 60))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries allowed per request on 429/5xx (default: 1)
    pub max_retries: u32,

    pub backoff_min_ms: u64,

    pub backoff_max_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            backoff_min_ms: 600,
            backoff_max_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet period before typed input is used (default: 200)
    pub debounce_ms: u64,

    pub default_sort: SortKey,

    pub default_order: SortOrder,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 200,
            default_sort: SortKey::Title,
            default_order: SortOrder::Ascending,
        }
    }
}

impl SearchConfig {
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("cinelist").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".cinelist").join("config.toml"));
        }

        paths
    }

    #[must_use]
    pub fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.tmdb.base_url)
            .with_context(|| format!("Invalid TMDB base URL: {}", self.tmdb.base_url))?;

        if self.tmdb.language.trim().is_empty() {
            anyhow::bail!("TMDB language cannot be empty");
        }

        if self.catalogue.page_size == 0 {
            anyhow::bail!("Catalogue page size must be > 0");
        }

        if self.catalogue.target_count == 0 {
            anyhow::bail!("Catalogue target count must be > 0");
        }

        if self.catalogue.cache_ttl_hours == 0 {
            anyhow::bail!("Cache TTL must be > 0 hours");
        }

        if self.retry.backoff_min_ms > self.retry.backoff_max_ms {
            anyhow::bail!(
                "Retry backoff window is inverted: min {}ms > max {}ms",
                self.retry.backoff_min_ms,
                self.retry.backoff_max_ms
            );
        }

        Ok(())
    }
}
