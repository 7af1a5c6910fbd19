//! TOML-based configuration for DocIntel
//!
//! This module provides declarative configuration for the text-generation
//! provider, the specialist capability service, workflow defaults and quality
//! weights via a TOML file (`docintel.toml`).
//!
//! Secrets are never written into the file: sections reference the *name* of
//! an environment variable, which is resolved when the client is built. A
//! `.env` file is honoured through `dotenvy` by the binary.

use crate::llm::Provider;
use crate::types::{AppError, ExecutionPattern, SearchMode};
use crate::workflows::quality::QualityWeights;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure loaded from docintel.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocIntelConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub capabilities: CapabilitiesConfig,

    #[serde(default)]
    pub workflow: WorkflowSettings,

    /// Quality score weights used by the convergence loop
    #[serde(default)]
    pub quality: QualityWeights,
}

// ============= Logging Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ============= LLM Configuration =============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Ollama,
    OpenAI,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: ProviderKind,

    /// Defaults to the provider's public endpoint when omitted
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Environment variable containing the API key (required for openai)
    #[serde(default)]
    pub api_key_env: Option<String>,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_llm_model() -> String {
    "llama3.2".to_string()
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            base_url: None,
            model: default_llm_model(),
            api_key_env: None,
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl LlmConfig {
    /// Resolve env vars and build the runtime provider description
    pub fn to_provider(&self) -> Result<Provider, ConfigError> {
        match self.provider {
            ProviderKind::Ollama => Ok(Provider::Ollama {
                base_url: self.base_url.clone().unwrap_or_else(default_ollama_url),
                model: self.model.clone(),
            }),
            ProviderKind::OpenAI => {
                let env = self.api_key_env.as_deref().ok_or_else(|| {
                    ConfigError::ValidationError(
                        "llm.api_key_env is required for the openai provider".to_string(),
                    )
                })?;
                Ok(Provider::OpenAI {
                    api_key: resolve_env(env)?,
                    api_base: self.base_url.clone().unwrap_or_else(default_openai_base),
                    model: self.model.clone(),
                })
            }
        }
    }
}

// ============= Capability Service Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilitiesConfig {
    #[serde(default = "default_capabilities_url")]
    pub base_url: String,

    /// Environment variable containing a bearer token for the service
    #[serde(default)]
    pub api_key_env: Option<String>,

    #[serde(default = "default_capability_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_research_path")]
    pub research_path: String,

    #[serde(default = "default_analysis_path")]
    pub analysis_path: String,

    #[serde(default = "default_citation_path")]
    pub citation_path: String,
}

fn default_capabilities_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_capability_timeout() -> u64 {
    300
}

fn default_research_path() -> String {
    "/research".to_string()
}

fn default_analysis_path() -> String {
    "/analysis".to_string()
}

fn default_citation_path() -> String {
    "/citation".to_string()
}

impl Default for CapabilitiesConfig {
    fn default() -> Self {
        Self {
            base_url: default_capabilities_url(),
            api_key_env: None,
            timeout_secs: default_capability_timeout(),
            research_path: default_research_path(),
            analysis_path: default_analysis_path(),
            citation_path: default_citation_path(),
        }
    }
}

impl CapabilitiesConfig {
    pub fn resolve_api_key(&self) -> crate::types::Result<Option<String>> {
        self.api_key_env
            .as_deref()
            .map(resolve_env)
            .transpose()
            .map_err(AppError::from)
    }
}

// ============= Workflow Configuration =============

/// Defaults applied to every workflow run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowSettings {
    #[serde(default)]
    pub default_pattern: ExecutionPattern,

    /// Upper bound on convergence-loop passes
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Score at which the loop stops early, in `[0, 1]`
    #[serde(default = "default_quality_threshold")]
    pub quality_threshold: f64,

    #[serde(default)]
    pub research_mode: SearchMode,

    /// Restrict research to these file names
    #[serde(default)]
    pub file_filter: Option<Vec<String>>,

    /// Characters of each research answer quoted in the synthesis prompt
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,
}

fn default_max_iterations() -> u32 {
    3
}

fn default_quality_threshold() -> f64 {
    0.85
}

fn default_excerpt_chars() -> usize {
    200
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            default_pattern: ExecutionPattern::default(),
            max_iterations: default_max_iterations(),
            quality_threshold: default_quality_threshold(),
            research_mode: SearchMode::default(),
            file_filter: None,
            excerpt_chars: default_excerpt_chars(),
        }
    }
}

impl WorkflowSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "workflow.max_iterations must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.quality_threshold) {
            return Err(ConfigError::ValidationError(format!(
                "workflow.quality_threshold must be within [0, 1], got {}",
                self.quality_threshold
            )));
        }
        if self.excerpt_chars == 0 {
            return Err(ConfigError::ValidationError(
                "workflow.excerpt_chars must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

fn resolve_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

impl DocIntelConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: DocIntelConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for internal consistency and env var availability
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.workflow.validate()?;

        self.quality
            .validate()
            .map_err(ConfigError::ValidationError)?;

        if self.llm.provider == ProviderKind::OpenAI && self.llm.api_key_env.is_none() {
            return Err(ConfigError::ValidationError(
                "llm.api_key_env is required for the openai provider".to_string(),
            ));
        }
        if let Some(ref env) = self.llm.api_key_env {
            resolve_env(env)?;
        }
        if let Some(ref env) = self.capabilities.api_key_env {
            resolve_env(env)?;
        }

        Ok(())
    }
}

/// Starter configuration written by `docintel init`
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# DocIntel configuration

[logging]
level = "info"
json = false

[llm]
provider = "ollama"            # or "openai"
base_url = "http://localhost:11434"
model = "llama3.2"
# api_key_env = "OPENAI_API_KEY"
timeout_secs = 120

[capabilities]
base_url = "http://localhost:3000"
# api_key_env = "CAPABILITY_API_KEY"
timeout_secs = 300

[workflow]
default_pattern = "sequential"  # sequential | parallel | loop
max_iterations = 3
quality_threshold = 0.85
research_mode = "hybrid"        # hybrid | semantic | lexical
excerpt_chars = 200

[quality]
sources = 0.30
citation = 0.50
completeness = 0.20
source_target = 10
"#;
