use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GrimoireConfig {
    pub server: ServerConfig,
    pub qdrant: QdrantConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    /// `"stdio"` or `"http"`.
    pub transport: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct QdrantConfig {
    pub url: String,
    /// Canon content collection. Lore collections derive their own names.
    pub collection: String,
    /// Canon metadata collection — aggregates plus the lore catalog.
    pub metadata_collection: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub ollama_host: String,
    pub model: String,
    pub dimensions: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_limit: usize,
    /// Similarity floor for semantic search.
    pub semantic_score_floor: f32,
    /// Lower floor for keyword search — the keyword filter already narrows
    /// the candidate set.
    pub keyword_score_floor: f32,
    pub dedup_threshold: f32,
    /// Single-page bound for aggregate and catalog scans.
    pub scroll_page_size: usize,
    /// Page bound for backup export.
    pub export_page_size: usize,
}

impl Default for GrimoireConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            qdrant: QdrantConfig::default(),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            host: "127.0.0.1".into(),
            port: 17950,
            log_level: "info".into(),
        }
    }
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6333".into(),
            collection: "canon".into(),
            metadata_collection: "canon_metadata".into(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            ollama_host: "http://localhost:11434".into(),
            model: "nomic-embed-text".into(),
            dimensions: 768,
            timeout_secs: 30,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            semantic_score_floor: 0.7,
            keyword_score_floor: 0.6,
            dedup_threshold: 0.95,
            scroll_page_size: 1000,
            export_page_size: 10_000,
        }
    }
}

/// Returns `~/.grimoire/`
pub fn default_grimoire_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".grimoire")
}

/// Returns the default config file path: `~/.grimoire/config.toml`
pub fn default_config_path() -> PathBuf {
    default_grimoire_dir().join("config.toml")
}

impl GrimoireConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            GrimoireConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("GRIMOIRE_QDRANT_URL") {
            self.qdrant.url = val;
        }
        if let Ok(val) = std::env::var("GRIMOIRE_COLLECTION") {
            self.qdrant.collection = val;
        }
        if let Ok(val) = std::env::var("GRIMOIRE_OLLAMA_HOST") {
            self.embedding.ollama_host = val;
        }
        if let Ok(val) = std::env::var("GRIMOIRE_EMBEDDING_MODEL") {
            self.embedding.model = val;
        }
        if let Ok(val) = std::env::var("GRIMOIRE_EMBEDDING_DIMENSIONS") {
            if let Ok(dims) = val.parse() {
                self.embedding.dimensions = dims;
            }
        }
        if let Ok(val) = std::env::var("GRIMOIRE_LOG_LEVEL") {
            self.server.log_level = val;
        }
    }

    /// Reject configs that cannot work before any service starts.
    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.embedding.dimensions > 0,
            "embedding dimensions must be positive, got {}",
            self.embedding.dimensions
        );
        anyhow::ensure!(
            self.qdrant.url.starts_with("http"),
            "qdrant url must be an http(s) URL: {}",
            self.qdrant.url
        );
        anyhow::ensure!(
            self.embedding.ollama_host.starts_with("http"),
            "ollama host must be an http(s) URL: {}",
            self.embedding.ollama_host
        );
        Ok(())
    }
}
