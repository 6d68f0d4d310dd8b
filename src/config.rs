use anyhow::Context;
use std::env;
use std::time::Duration;

use crate::types::AppError;

pub const DEFAULT_STREAM_PATHS: [&str; 3] = [
    "/api/reasoning",
    "/api/stop-streaming",
    "/api/upload-streaming",
];

/// Routes with their own handlers, not available as stream aliases
pub const RESERVED_PATHS: [&str; 6] = [
    "/",
    "/on_off_reasoning",
    "/stop_streaming_response",
    "/upload_image",
    "/api/upload-image",
    "/health",
];

#[derive(Debug, Clone)]
pub struct Config {
    // Server configuration
    pub host: String,
    pub port: u16,

    // Upstream model
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model_name: String,
    pub llm_max_tokens: u32,
    pub llm_supports_vision: bool,

    // Uploads
    pub upload_max_bytes: usize,
    pub upload_ttl: Duration,

    /// Paths bound to the streaming relay
    pub stream_paths: Vec<String>,
}

/// Settings checked at the start of every relay session
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            llm_api_key: String::new(),
            llm_base_url: String::new(),
            llm_model_name: "gpt-4o-mini".to_string(),
            llm_max_tokens: 4096,
            llm_supports_vision: false,
            upload_max_bytes: 5 * 1024 * 1024,
            upload_ttl: Duration::from_secs(300),
            stream_paths: DEFAULT_STREAM_PATHS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(host) = lookup("HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("PORT") {
            config.port = port.trim().parse().context("PORT must be a port number")?;
        }

        if let Some(key) = lookup("LLM_API_KEY") {
            config.llm_api_key = key.trim().to_string();
        }
        if let Some(url) = lookup("LLM_BASE_URL") {
            config.llm_base_url = url.trim().to_string();
        }
        if let Some(model) = lookup("LLM_MODEL_NAME") {
            config.llm_model_name = model.trim().to_string();
        }
        if let Some(max_tokens) = lookup("LLM_MAX_TOKENS") {
            config.llm_max_tokens = max_tokens
                .trim()
                .parse()
                .context("LLM_MAX_TOKENS must be a positive integer")?;
        }
        if let Some(vision) = lookup("LLM_SUPPORTS_VISION") {
            config.llm_supports_vision = parse_flag(&vision)
                .with_context(|| format!("LLM_SUPPORTS_VISION is not a boolean: {vision}"))?;
        }

        if let Some(max_bytes) = lookup("UPLOAD_MAX_BYTES") {
            config.upload_max_bytes = max_bytes
                .trim()
                .parse()
                .context("UPLOAD_MAX_BYTES must be a byte count")?;
        }
        if let Some(ttl) = lookup("UPLOAD_TTL_SECS") {
            let secs: u64 = ttl
                .trim()
                .parse()
                .context("UPLOAD_TTL_SECS must be a number of seconds")?;
            anyhow::ensure!(secs > 0, "UPLOAD_TTL_SECS must be greater than zero");
            config.upload_ttl = Duration::from_secs(secs);
        }

        if let Some(paths) = lookup("STREAM_PATHS") {
            let mut unique: Vec<String> = Vec::new();
            for path in paths.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                anyhow::ensure!(path.starts_with('/'), "STREAM_PATHS entry {path} must start with '/'");
                anyhow::ensure!(
                    !RESERVED_PATHS.contains(&path),
                    "STREAM_PATHS entry {path} collides with a built-in route"
                );
                if !unique.iter().any(|p| p == path) {
                    unique.push(path.to_string());
                }
            }
            if !unique.is_empty() {
                config.stream_paths = unique;
            }
        }

        Ok(config)
    }

    /// Base URL the demo pages point their EventSource at
    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Fails with the first setting the relay cannot do without
    pub fn upstream_settings(&self) -> Result<UpstreamSettings, AppError> {
        if self.llm_api_key.is_empty() {
            return Err(AppError::ConfigurationIncomplete { setting: "LLM_API_KEY" });
        }
        if self.llm_base_url.is_empty() {
            return Err(AppError::ConfigurationIncomplete { setting: "LLM_BASE_URL" });
        }
        if self.llm_model_name.is_empty() {
            return Err(AppError::ConfigurationIncomplete { setting: "LLM_MODEL_NAME" });
        }
        if self.llm_max_tokens == 0 {
            return Err(AppError::ConfigurationIncomplete { setting: "LLM_MAX_TOKENS" });
        }

        Ok(UpstreamSettings {
            api_key: self.llm_api_key.clone(),
            base_url: self.llm_base_url.clone(),
            model: self.llm_model_name.clone(),
            max_tokens: self.llm_max_tokens,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
