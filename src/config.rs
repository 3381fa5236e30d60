//! Service configuration
//!
//! Layered with figment: built-in defaults, then an optional TOML file, then
//! `STEELBLOCK_`-prefixed environment variables (`__` separates nesting, e.g.
//! `STEELBLOCK_PROVIDER__API_KEY`).

use std::fmt;
use std::net::SocketAddr;
use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Default config file, read when present
pub const DEFAULT_CONFIG_FILE: &str = "steelblock.toml";

/// Fallback environment variable for the provider key
pub const API_KEY_FALLBACK_VAR: &str = "OPENAI_API_KEY";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub provider: ProviderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            provider: ProviderConfig::default(),
        }
    }
}

impl Config {
    /// Load from defaults, the given (or default) TOML file, and environment
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Self::figment(file).extract().map(Self::with_key_fallback)
    }

    fn figment(file: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed("STEELBLOCK_").split("__"))
    }

    fn with_key_fallback(mut self) -> Self {
        if self.provider.api_key.is_none() {
            self.provider.api_key = std::env::var(API_KEY_FALLBACK_VAR)
                .ok()
                .filter(|k| !k.trim().is_empty());
        }
        self
    }
}

/// Generative provider settings
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key; absence is reported at first call, not at startup
    pub api_key: Option<String>,
    /// OpenAI-compatible API base URL
    pub base_url: String,
    /// Chat completion model
    pub text_model: String,
    /// Image generation model
    pub image_model: String,
    /// Image resolution, `WxH`
    pub image_size: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Largest image download accepted, in bytes
    pub max_image_bytes: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            text_model: "gpt-4".to_string(),
            image_model: "dall-e-3".to_string(),
            image_size: "1024x1024".to_string(),
            timeout_secs: 120,
            max_image_bytes: 20 * 1024 * 1024,
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .field("image_size", &self.image_size)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_image_bytes", &self.max_image_bytes)
            .finish()
    }
}
