//! Configuration for the quality checker.
//!
//! Supports both environment variables and YAML config file.
//! Environment variables take precedence over config file values.

use crate::error::{CheckerError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// LLM configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL for the LLM API (e.g., "https://api.openai.com")
    pub api_base: String,

    /// API key for authentication
    pub api_key: String,

    /// Primary judging model
    pub model: String,

    /// Models tried in order when the primary call fails
    #[serde(default = "default_fallback_models")]
    pub fallback_models: Vec<String>,

    /// Maximum tokens for response (optional)
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Temperature for generation (optional)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout; the HTTP client's default applies when unset
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_fallback_models() -> Vec<String> {
    vec!["gpt-3.5-turbo".to_string()]
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.1
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            fallback_models: default_fallback_models(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: None,
        }
    }
}

impl LlmConfig {
    /// Primary model followed by the fallbacks, in call order.
    pub fn model_chain(&self) -> Vec<String> {
        std::iter::once(self.model.clone())
            .chain(self.fallback_models.iter().cloned())
            .filter(|m| !m.trim().is_empty())
            .collect()
    }
}

/// Article extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// User-Agent sent with page fetches
    pub user_agent: String,

    /// Per-fetch timeout in seconds
    pub timeout_secs: u64,

    /// Extracted bodies are capped to this many characters
    pub max_body_chars: usize,

    /// Base URL of a readability proxy; the page URL is appended to it
    pub readability_proxy: Option<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
                .to_string(),
            timeout_secs: 10,
            max_body_chars: 20_000,
            readability_proxy: None,
        }
    }
}

/// Which backend answers similar-page queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchProviderKind {
    DuckDuckGo,
    Serper,
    None,
}

impl SearchProviderKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "duckduckgo" | "ddg" => Some(Self::DuckDuckGo),
            "serper" => Some(Self::Serper),
            "none" | "off" => Some(Self::None),
            _ => None,
        }
    }
}

/// Similar-page search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub provider: SearchProviderKind,

    /// Number of candidates passed to the judge
    pub top_k: usize,

    /// Queries are cut to this many characters before dispatch
    pub max_query_chars: usize,

    pub timeout_secs: u64,

    pub serper_api_key: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: SearchProviderKind::DuckDuckGo,
            top_k: 5,
            max_query_chars: 100,
            timeout_secs: 10,
            serper_api_key: None,
        }
    }
}

/// Result log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub path: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("sqeg_log.csv"),
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub llm: LlmConfig,
    pub extract: ExtractConfig,
    pub search: SearchConfig,
    pub log: LogConfig,
}

/// Configuration file structure (YAML format).
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    llm: Option<LlmFileSection>,
    extract: Option<ExtractFileSection>,
    search: Option<SearchFileSection>,
    log: Option<LogFileSection>,
}

#[derive(Debug, Deserialize)]
struct LlmFileSection {
    api_base: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    fallback_models: Option<Vec<String>>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ExtractFileSection {
    user_agent: Option<String>,
    timeout_secs: Option<u64>,
    max_body_chars: Option<usize>,
    readability_proxy: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchFileSection {
    provider: Option<String>,
    top_k: Option<usize>,
    max_query_chars: Option<usize>,
    timeout_secs: Option<u64>,
    serper_api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LogFileSection {
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables and optional config file.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (LLM_API_BASE, LLM_API_KEY, LLM_MODEL, SQEG_*)
    /// 2. Config file (~/.config/sqeg-checker/config.yaml)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                config = Self::load_from_file(&config_path)?;
            }
        }

        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CheckerError::io(path, e))?;
        Self::from_yaml(&content)
    }

    /// Parse a YAML document on top of the defaults.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let file_config: ConfigFile = serde_yaml::from_str(content)
            .map_err(|e| CheckerError::Config(format!("Failed to parse config file: {}", e)))?;

        let mut config = Config::default();

        if let Some(llm) = file_config.llm {
            if let Some(api_base) = llm.api_base {
                config.llm.api_base = api_base;
            }
            if let Some(api_key) = llm.api_key {
                config.llm.api_key = api_key;
            }
            if let Some(model) = llm.model {
                config.llm.model = model;
            }
            if let Some(fallback_models) = llm.fallback_models {
                config.llm.fallback_models = fallback_models;
            }
            if let Some(max_tokens) = llm.max_tokens {
                config.llm.max_tokens = max_tokens;
            }
            if let Some(temperature) = llm.temperature {
                config.llm.temperature = temperature;
            }
            if llm.timeout_secs.is_some() {
                config.llm.timeout_secs = llm.timeout_secs;
            }
        }

        if let Some(extract) = file_config.extract {
            if let Some(user_agent) = extract.user_agent {
                config.extract.user_agent = user_agent;
            }
            if let Some(timeout) = extract.timeout_secs {
                config.extract.timeout_secs = timeout;
            }
            if let Some(max_body_chars) = extract.max_body_chars {
                config.extract.max_body_chars = max_body_chars;
            }
            if extract.readability_proxy.is_some() {
                config.extract.readability_proxy = extract.readability_proxy;
            }
        }

        if let Some(search) = file_config.search {
            if let Some(provider) = search.provider {
                config.search.provider = SearchProviderKind::parse(&provider).ok_or_else(|| {
                    CheckerError::Config(format!("Unknown search provider '{}'", provider))
                })?;
            }
            if let Some(top_k) = search.top_k {
                config.search.top_k = top_k;
            }
            if let Some(max_query_chars) = search.max_query_chars {
                config.search.max_query_chars = max_query_chars;
            }
            if let Some(timeout) = search.timeout_secs {
                config.search.timeout_secs = timeout;
            }
            if search.serper_api_key.is_some() {
                config.search.serper_api_key = search.serper_api_key;
            }
        }

        if let Some(log) = file_config.log {
            if let Some(path) = log.path {
                config.log.path = path;
            }
        }

        Ok(config)
    }

    /// Override values from the environment. `lookup` is `std::env::var` outside tests.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_base) = lookup("LLM_API_BASE") {
            self.llm.api_base = api_base;
        }

        if let Some(api_key) = lookup("LLM_API_KEY").or_else(|| lookup("OPENAI_API_KEY")) {
            self.llm.api_key = api_key;
        }

        if let Some(model) = lookup("LLM_MODEL") {
            self.llm.model = model;
        }

        if let Some(models) = lookup("LLM_FALLBACK_MODELS") {
            self.llm.fallback_models = models
                .split(',')
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect();
        }

        if let Some(max_tokens) = lookup("LLM_MAX_TOKENS") {
            if let Ok(tokens) = max_tokens.parse() {
                self.llm.max_tokens = tokens;
            }
        }

        if let Some(temperature) = lookup("LLM_TEMPERATURE") {
            if let Ok(temp) = temperature.parse() {
                self.llm.temperature = temp;
            }
        }

        if let Some(proxy) = lookup("SQEG_READABILITY_PROXY") {
            self.extract.readability_proxy = Some(proxy).filter(|p| !p.trim().is_empty());
        }

        if let Some(provider) = lookup("SQEG_SEARCH_PROVIDER") {
            self.search.provider = SearchProviderKind::parse(&provider).ok_or_else(|| {
                CheckerError::Config(format!("Unknown search provider '{}'", provider))
            })?;
        }

        if let Some(key) = lookup("SERPER_API_KEY") {
            self.search.serper_api_key = Some(key);
        }

        if let Some(path) = lookup("SQEG_LOG_PATH") {
            self.log.path = PathBuf::from(path);
        }

        Ok(())
    }

    /// Get the default config file path.
    pub fn config_file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "sqeg-checker")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Validate that required configuration is present.
    pub fn validate(&self) -> Result<()> {
        if self.llm.api_base.is_empty() {
            return Err(CheckerError::Config(
                "LLM API base URL is required. Set LLM_API_BASE environment variable or add to config file.".to_string()
            ));
        }

        if self.llm.api_key.is_empty() {
            return Err(CheckerError::Config(
                "LLM API key is required. Set LLM_API_KEY (or OPENAI_API_KEY) or add to config file.".to_string()
            ));
        }

        if self.llm.model.is_empty() {
            return Err(CheckerError::Config(
                "LLM model is required. Set LLM_MODEL environment variable or add to config file."
                    .to_string(),
            ));
        }

        if self.extract.max_body_chars == 0 {
            return Err(CheckerError::InvalidConfig(
                "extract.max_body_chars must be greater than zero".to_string(),
            ));
        }

        if self.search.top_k == 0 {
            return Err(CheckerError::InvalidConfig(
                "search.top_k must be greater than zero".to_string(),
            ));
        }

        if self.search.provider == SearchProviderKind::Serper
            && self.search.serper_api_key.as_deref().unwrap_or("").is_empty()
        {
            return Err(CheckerError::InvalidConfig(
                "search provider 'serper' needs SERPER_API_KEY".to_string(),
            ));
        }

        Ok(())
    }

    /// Create a config from explicit values (useful for testing).
    pub fn with_llm(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            llm: LlmConfig {
                api_base: api_base.into(),
                api_key: api_key.into(),
                model: model.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}
