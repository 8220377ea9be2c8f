use crate::error::{HaulError, Result};
use std::env;
use std::fmt;
use std::time::Duration;

/// Credential variables, checked in this order.
pub const API_KEY_VARS: [&str; 3] = ["GOOGLE_GENAI_API_KEY", "GEMINI_API_KEY", "GOOGLE_API_KEY"];

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8787;
pub const DEFAULT_API_PREFIX: &str = "/api";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image-preview";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_CLIENT_BASE_URL: &str = "http://localhost:8787/api";
pub const DEFAULT_BODY_LIMIT: usize = 20 * 1024 * 1024;

#[derive(Clone, Default)]
pub struct GenAiConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub api_prefix: Option<String>,
    pub body_limit: usize,
    pub json_logs: bool,
    pub genai: GenAiConfig,
}

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &str, value: Option<String>) -> Result<Option<T>> {
    match non_blank(value) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| HaulError::ConfigError(format!("{} has an invalid value: {}", name, raw))),
        None => Ok(None),
    }
}

impl fmt::Debug for GenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenAiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl GenAiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = API_KEY_VARS
            .iter()
            .find_map(|name| non_blank(lookup(name)));
        let model = non_blank(lookup("GENAI_MODEL"));
        let api_base = non_blank(lookup("GEMINI_API_BASE"))
            .map(|base| base.trim_end_matches('/').to_string());
        let timeout_secs = parse_var("GENAI_TIMEOUT_SECS", lookup("GENAI_TIMEOUT_SECS"))?;

        Ok(GenAiConfig {
            api_key,
            model,
            api_base,
            timeout_secs,
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = non_blank(Some(api_key.into()));
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into().trim_end_matches('/').to_string());
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_secs = Some(seconds);
        self
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: None,
            port: None,
            api_prefix: None,
            body_limit: DEFAULT_BODY_LIMIT,
            json_logs: false,
            genai: GenAiConfig::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = non_blank(lookup("HOST"));
        let port = parse_var("PORT", lookup("PORT"))?;
        let api_prefix = non_blank(lookup("API_PREFIX"));
        let json_logs = non_blank(lookup("LOG_FORMAT")).map_or(false, |val| val == "json");
        let genai = GenAiConfig::from_lookup(&lookup)?;

        Ok(Config {
            host,
            port,
            api_prefix,
            body_limit: DEFAULT_BODY_LIMIT,
            json_logs,
            genai,
        })
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = Some(prefix.into());
        self
    }

    pub fn with_genai(mut self, config: GenAiConfig) -> Self {
        self.genai = config;
        self
    }

    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Route prefix, normalized to a leading slash and no trailing slash.
    /// An empty result mounts the routes at the root.
    pub fn api_prefix(&self) -> String {
        let raw = self.api_prefix.as_deref().unwrap_or(DEFAULT_API_PREFIX);
        let trimmed = raw.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{}", trimmed)
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(ClientConfig {
            base_url: non_blank(lookup("API_BASE_URL")),
            timeout_secs: parse_var("API_TIMEOUT_SECS", lookup("API_TIMEOUT_SECS"))?,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_CLIENT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
