//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `DOCCHAT_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `DOCCHAT_` override YAML values
//! 3. **PORT** - Special case: overrides `port` if set
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `DOCCHAT_LLM__MODEL=deepseek-chat` sets the `llm.model` field.
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # Override server port (container convention)
//! PORT=8080
//!
//! # Point the chat client at a different OpenAI-compatible provider
//! DOCCHAT_LLM__API_URL="https://api.openai.com/v1"
//! DOCCHAT_LLM__API_KEY="sk-..."
//!
//! # Override nested values
//! DOCCHAT_RETRIEVAL__TOP_K=5
//! DOCCHAT_ENABLE_METRICS=true
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "DOCCHAT_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// This is the root configuration structure loaded from YAML and environment variables.
/// All fields have sensible defaults defined in the `Default` implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Directory where uploaded documents are stored (created on startup if absent)
    pub uploads_dir: PathBuf,
    /// Upstream chat completion provider configuration
    pub llm: LlmConfig,
    /// Embedding provider used to index document chunks and questions
    pub embedder: EmbedderConfig,
    /// Chunking and retrieval tuning
    pub retrieval: RetrievalConfig,
    /// Resource limits for protecting system capacity
    pub limits: LimitsConfig,
    /// Optional eviction of old documents and their files
    pub retention: RetentionConfig,
    /// CORS configuration for browser clients and the embeddable widget
    pub cors: CorsConfig,
    /// Enable Prometheus metrics endpoint at `/internal/metrics`
    pub enable_metrics: bool,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            uploads_dir: PathBuf::from("uploads"),
            llm: LlmConfig::default(),
            embedder: EmbedderConfig::default(),
            retrieval: RetrievalConfig::default(),
            limits: LimitsConfig::default(),
            retention: RetentionConfig::default(),
            cors: CorsConfig::default(),
            enable_metrics: false,
            enable_otel_export: false,
        }
    }
}

/// Upstream chat completion provider.
///
/// Any OpenAI-compatible `/chat/completions` endpoint works here. The API key can be
/// omitted from the file and supplied at runtime through the settings endpoint or
/// per-request in the ask payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LlmConfig {
    /// Base URL of the provider API, up to and including the version segment
    pub api_url: Url,
    /// Bearer token sent with chat completion requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Model name passed through to the provider
    pub model: String,
    /// Sampling temperature (low by default for grounded answers)
    pub temperature: f32,
    /// Completion token cap per answer
    pub max_tokens: u32,
    /// Timeout for a single chat completion request
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: Url::parse("https://api.deepseek.com/v1").expect("default LLM API URL is valid"),
            api_key: None,
            model: "deepseek-chat".to_string(),
            temperature: 0.1,
            max_tokens: 500,
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Embedding provider configuration.
///
/// Either a remote OpenAI-compatible `/embeddings` endpoint, or the built-in lexical
/// vectorizer which needs no network access. Adding a new provider requires a new
/// variant here and a match arm in `embedder::create_embedder`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum EmbedderConfig {
    /// Remote OpenAI-compatible embeddings endpoint
    Api {
        /// Base URL of the provider API, up to and including the version segment
        api_url: Url,
        /// Bearer token sent with embedding requests
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
        /// Embedding model name
        model: String,
    },
    /// Built-in hashed term-frequency vectorizer (deterministic, offline)
    Lexical {
        /// Vector dimensionality
        #[serde(default = "default_lexical_dimensions")]
        dimensions: usize,
    },
}

fn default_lexical_dimensions() -> usize {
    512
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        EmbedderConfig::Lexical {
            dimensions: default_lexical_dimensions(),
        }
    }
}

/// Chunking and retrieval tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Number of chunks retrieved as context for each question
    pub top_k: usize,
    /// Target maximum chunk length in characters
    pub max_chunk_chars: usize,
    /// Lines shorter than this (after trimming) are dropped during chunking
    pub min_line_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            max_chunk_chars: 500,
            min_line_chars: 5,
        }
    }
}

/// Resource limits for protecting system capacity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            // 50 MiB
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

/// Optional eviction of old documents.
///
/// Disabled unless `max_age` is set. When enabled, a background sweeper removes
/// documents older than `max_age` from the index and deletes their upload files.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetentionConfig {
    /// Documents older than this are evicted (unset = keep forever)
    #[serde(with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub max_age: Option<Duration>,
    /// How often the sweeper wakes up
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_age: None,
            sweep_interval: Duration::from_secs(3600),
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<CorsOrigin>,
    /// Allow credentials (cookies) in CORS requests
    pub allow_credentials: bool,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            // The widget is meant to be embedded on arbitrary sites
            allowed_origins: vec![CorsOrigin::Wildcard],
            allow_credentials: false,
            max_age: None,
        }
    }
}

/// Can be either a wildcard (`*`) to allow all origins, or a specific URL.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://app.example.com`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("DOCCHAT_").split("__"))
            // Common container convention: PORT selects the bind port
            .merge(Env::raw().only(&["PORT"]))
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.retrieval.top_k == 0 {
            return Err(Error::Internal {
                operation: "Config validation: retrieval.top_k must be at least 1".to_string(),
            });
        }

        if self.retrieval.max_chunk_chars == 0 {
            return Err(Error::Internal {
                operation: "Config validation: retrieval.max_chunk_chars must be positive (default: 500)".to_string(),
            });
        }

        if let EmbedderConfig::Lexical { dimensions } = &self.embedder
            && *dimensions == 0
        {
            return Err(Error::Internal {
                operation: "Config validation: embedder.dimensions must be positive (default: 512)".to_string(),
            });
        }

        if self.retention.max_age.is_some() && self.retention.sweep_interval.is_zero() {
            return Err(Error::Internal {
                operation: "Config validation: retention.sweep_interval must be positive when retention.max_age is set".to_string(),
            });
        }

        // tower-http rejects this combination at runtime; fail early with a clear message
        if self.cors.allow_credentials
            && self.cors.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard))
        {
            return Err(Error::Internal {
                operation: "Config validation: cors.allow_credentials cannot be combined with a wildcard origin. \
                     List explicit origins or disable credentials."
                    .to_string(),
            });
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
