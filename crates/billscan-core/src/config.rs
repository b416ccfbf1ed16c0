//! Configuration system for billscan.
//!
//! All values come from the environment (a `.env` file is loaded by the
//! binary). Provider credentials have no defaults and are validated when the
//! configuration is built.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::{BillscanError, BillscanResult};

pub const DEFAULT_API_VERSION: &str = "2023-05-15";
pub const DEFAULT_MAX_TOKENS: u32 = 2000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_PROMPT: &str = "Please extract all item details from this invoice. \
Create a JSON array including the items, their quantities, and the address. \
Additionally, include the latitude and longitude for the address.";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant for extracting invoice data.";

/// Which MIME type the image data URI declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageMimePolicy {
    /// Always `image/png`, whatever the upload really is.
    #[default]
    Png,
    /// The format detected from the file's magic number.
    Detect,
}

impl FromStr for ImageMimePolicy {
    type Err = BillscanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "detect" => Ok(Self::Detect),
            other => Err(BillscanError::Configuration(format!(
                "Unknown image MIME policy '{}', expected 'png' or 'detect'",
                other
            ))),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = BillscanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(BillscanError::Configuration(format!(
                "Unknown log format '{}', expected 'text' or 'json'",
                other
            ))),
        }
    }
}

/// Settings for talking to the vision model.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Provider base URL, always ending with `/`.
    pub api_base_url: String,
    pub deployment: String,
    pub api_key: SecretString,
    pub api_version: String,
    pub prompt: String,
    pub system_prompt: String,
    pub max_tokens: u32,
    /// Bound on the whole outbound call.
    pub timeout: Duration,
    pub image_mime: ImageMimePolicy,
}

impl ExtractionConfig {
    /// Create a config with default prompts and limits.
    pub fn new(
        api_base_url: impl Into<String>,
        deployment: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            api_base_url: with_trailing_slash(api_base_url.into()),
            deployment: deployment.into(),
            api_key: SecretString::new(api_key.into()),
            api_version: DEFAULT_API_VERSION.to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            image_mime: ImageMimePolicy::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_image_mime(mut self, policy: ImageMimePolicy) -> Self {
        self.image_mime = policy;
        self
    }

    pub fn with_prompts(mut self, prompt: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self.system_prompt = system_prompt.into();
        self
    }

    /// Create config from environment variables.
    ///
    /// Reads:
    /// - `AZURE_OPENAI_ENDPOINT` (required)
    /// - `AZURE_OPENAI_DEPLOYMENT` (required)
    /// - `AZURE_OPENAI_API_KEY` (required)
    /// - `AZURE_OPENAI_API_VERSION` (default: 2023-05-15)
    /// - `BILLSCAN_PROMPT`, `BILLSCAN_SYSTEM_PROMPT`
    /// - `BILLSCAN_MAX_TOKENS` (default: 2000)
    /// - `BILLSCAN_REQUEST_TIMEOUT_SECS` (default: 60)
    /// - `BILLSCAN_IMAGE_MIME` (default: png)
    pub fn from_env() -> BillscanResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ExtractionConfig::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> BillscanResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = required(&lookup, "AZURE_OPENAI_ENDPOINT")?;
        let deployment = required(&lookup, "AZURE_OPENAI_DEPLOYMENT")?;
        let api_key = required(&lookup, "AZURE_OPENAI_API_KEY")?;

        validate_endpoint(&endpoint)?;

        let mut config = Self::new(endpoint, deployment, api_key);

        if let Some(version) = optional(&lookup, "AZURE_OPENAI_API_VERSION") {
            config.api_version = version;
        }
        if let Some(prompt) = optional(&lookup, "BILLSCAN_PROMPT") {
            config.prompt = prompt;
        }
        if let Some(prompt) = optional(&lookup, "BILLSCAN_SYSTEM_PROMPT") {
            config.system_prompt = prompt;
        }
        if let Some(max_tokens) = optional(&lookup, "BILLSCAN_MAX_TOKENS") {
            config.max_tokens = parse_number(&max_tokens, "BILLSCAN_MAX_TOKENS")?;
        }
        if let Some(secs) = optional(&lookup, "BILLSCAN_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = parse_number(&secs, "BILLSCAN_REQUEST_TIMEOUT_SECS")?;
            if secs == 0 {
                return Err(BillscanError::Configuration(
                    "BILLSCAN_REQUEST_TIMEOUT_SECS must be greater than zero".to_string(),
                ));
            }
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(policy) = optional(&lookup, "BILLSCAN_IMAGE_MIME") {
            config.image_mime = policy.parse()?;
        }

        Ok(config)
    }
}

/// Build `{base}openai/deployments/{deployment}/chat/completions?api-version={version}`.
///
/// No component is escaped.
pub fn chat_completions_url(api_base_url: &str, deployment: &str, api_version: &str) -> String {
    format!(
        "{}openai/deployments/{}/chat/completions?api-version={}",
        api_base_url, deployment, api_version
    )
}

/// Settings for the HTTP server process.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding in-flight uploads.
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 20 * 1024 * 1024,
            log_format: LogFormat::default(),
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables.
    ///
    /// Reads:
    /// - `BILLSCAN_HOST` (default: 0.0.0.0)
    /// - `BILLSCAN_PORT` (default: 5000)
    /// - `BILLSCAN_UPLOAD_DIR` (default: uploads)
    /// - `BILLSCAN_MAX_UPLOAD_BYTES` (default: 20 MiB)
    /// - `BILLSCAN_LOG_FORMAT` (default: text)
    pub fn from_env() -> BillscanResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> BillscanResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = optional(&lookup, "BILLSCAN_HOST") {
            config.host = host;
        }
        if let Some(port) = optional(&lookup, "BILLSCAN_PORT") {
            config.port = parse_number(&port, "BILLSCAN_PORT")?;
        }
        if let Some(dir) = optional(&lookup, "BILLSCAN_UPLOAD_DIR") {
            config.upload_dir = PathBuf::from(dir);
        }
        if let Some(limit) = optional(&lookup, "BILLSCAN_MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = parse_number(&limit, "BILLSCAN_MAX_UPLOAD_BYTES")?;
        }
        if let Some(format) = optional(&lookup, "BILLSCAN_LOG_FORMAT") {
            config.log_format = format.parse()?;
        }

        Ok(config)
    }

    /// Socket address string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.trim().is_empty())
}

fn required<F>(lookup: &F, key: &str) -> BillscanResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, key)
        .ok_or_else(|| BillscanError::Configuration(format!("{} must be set", key)))
}

fn parse_number<T: FromStr>(value: &str, key: &str) -> BillscanResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| BillscanError::Configuration(format!("{} must be a valid number", key)))
}

fn validate_endpoint(endpoint: &str) -> BillscanResult<()> {
    let url = url::Url::parse(endpoint).map_err(|e| {
        BillscanError::Configuration(format!("AZURE_OPENAI_ENDPOINT is not a valid URL: {}", e))
    })?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(BillscanError::Configuration(format!(
            "AZURE_OPENAI_ENDPOINT must use http or https, got '{}'",
            scheme
        ))),
    }
}

fn with_trailing_slash(mut url: String) -> String {
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}
