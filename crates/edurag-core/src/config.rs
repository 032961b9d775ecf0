//! Layered configuration and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (nested keys separated by `__`, e.g. `APP_GENERATION__API_KEY`). The merged
//! tree is extracted into [`Settings`]; every field has a default so an empty
//! environment still yields a runnable service.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::Error;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?.validate()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        self.figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to extract settings: {}", e))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub embedding: EmbeddingSettings,
    pub ingest: IngestSettings,
    pub retrieval: RetrievalSettings,
    pub generation: GenerationSettings,
    pub server: ServerSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<(), Error> {
        if self.embedding.dim == 0 {
            return Err(Error::InvalidConfig("embedding.dim must be positive".into()));
        }
        if self.embedding.batch_size == 0 {
            return Err(Error::InvalidConfig("embedding.batch_size must be positive".into()));
        }
        if self.ingest.chunk_chars == 0 {
            return Err(Error::InvalidConfig("ingest.chunk_chars must be positive".into()));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::InvalidConfig("retrieval.top_k must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// One subdirectory per subject.
    pub corpus_dir: String,
    pub index_dir: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self { corpus_dir: "educational_pdf".into(), index_dir: "data/indices".into() }
    }
}

impl DataSettings {
    pub fn corpus_path(&self) -> PathBuf {
        expand_path(&self.corpus_dir)
    }

    pub fn index_path(&self) -> PathBuf {
        expand_path(&self.index_dir)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model_dir: Option<String>,
    pub dim: usize,
    pub max_len: usize,
    pub batch_size: usize,
    pub use_fake: bool,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { model_dir: None, dim: 384, max_len: 256, batch_size: 32, use_fake: false }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    pub chunk_chars: usize,
    /// Pages yielding fewer non-whitespace chars than this count as image-only.
    pub ocr_min_chars: usize,
    pub ocr_probe_pages: usize,
    pub ocr_language: String,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self { chunk_chars: 500, ocr_min_chars: 50, ocr_probe_pages: 3, ocr_language: "eng".into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub model: String,
    pub endpoint: String,
    /// Falls back to `GEMINI_API_KEY` when unset.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_ms: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".into(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".into(),
            api_key: None,
            timeout_secs: 30,
            max_retries: 3,
            backoff_ms: 500,
        }
    }
}

impl GenerationSettings {
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| env::var("GEMINI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { host: "0.0.0.0".into(), port: 5000 }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

