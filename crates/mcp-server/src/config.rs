//! Startup configuration: environment variables (optionally from `.env`) plus CLI overrides.
//!
//! The loaded [`EffectiveConfig`] is immutable and shared behind an `Arc`; overrides from
//! flags are applied and validated here, before any tool can observe the config.

use clap::Parser;
use deepseek_api::DEFAULT_BASE_URL;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const DEFAULT_TEMPERATURE: f32 = 0.4;
pub const DEFAULT_TIMEOUT_SECS: u64 = 90;
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert software engineer. Analyze the \
question and any attached source files carefully, explain the root cause of problems, and \
answer with correct, idiomatic code. Be precise and concise.";

/// Content types accepted when `DEEPSEEK_ALLOWED_FILE_TYPES` is not set: text and source code.
pub const DEFAULT_ALLOWED_FILE_TYPES: &[&str] = &[
    "text/plain",
    "text/markdown",
    "text/csv",
    "text/html",
    "text/css",
    "text/x-go",
    "text/x-python",
    "text/x-java",
    "text/x-c",
    "text/x-rust",
    "text/x-shellscript",
    "text/x-sql",
    "text/x-toml",
    "text/yaml",
    "text/typescript",
    "application/javascript",
    "application/json",
    "application/xml",
];

const ENV_API_KEY: &str = "DEEPSEEK_API_KEY";
const ENV_BASE_URL: &str = "DEEPSEEK_BASE_URL";
const ENV_MODEL: &str = "DEEPSEEK_MODEL";
const ENV_SYSTEM_PROMPT: &str = "DEEPSEEK_SYSTEM_PROMPT";
const ENV_SYSTEM_PROMPT_FILE: &str = "DEEPSEEK_SYSTEM_PROMPT_FILE";
const ENV_TEMPERATURE: &str = "DEEPSEEK_TEMPERATURE";
const ENV_TIMEOUT: &str = "DEEPSEEK_TIMEOUT";
const ENV_MAX_RETRIES: &str = "DEEPSEEK_MAX_RETRIES";
const ENV_MAX_FILE_SIZE: &str = "DEEPSEEK_MAX_FILE_SIZE";
const ENV_ALLOWED_FILE_TYPES: &str = "DEEPSEEK_ALLOWED_FILE_TYPES";
const ENV_ALLOWED_ROOTS: &str = "DEEPSEEK_ALLOWED_ROOTS";
const ENV_ALLOW_SECRET_FILES: &str = "DEEPSEEK_ALLOW_SECRET_FILES";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("DEEPSEEK_API_KEY environment variable is required")]
    MissingApiKey,

    #[error("invalid {key} value {value:?}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to read system prompt file {}: {source}", path.display())]
    PromptFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Command-line overrides. Each one replaces the matching environment value.
#[derive(Debug, Default, Clone, Parser)]
#[command(name = "deepseek-mcp")]
#[command(about = "MCP server that forwards coding questions to the DeepSeek API", long_about = None)]
#[command(version)]
pub struct Cli {
    /// DeepSeek model id (overrides DEEPSEEK_MODEL)
    #[arg(long = "deepseek-model")]
    pub model: Option<String>,

    /// System prompt (overrides DEEPSEEK_SYSTEM_PROMPT and DEEPSEEK_SYSTEM_PROMPT_FILE)
    #[arg(long = "deepseek-system-prompt")]
    pub system_prompt: Option<String>,

    /// Sampling temperature, 0.0-1.0 (overrides DEEPSEEK_TEMPERATURE)
    #[arg(long = "deepseek-temperature")]
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub system_prompt: String,
    pub temperature: f32,
    pub timeout: Duration,
    pub max_retries: u32,
    pub max_file_size: u64,
    /// Empty means every content type is accepted.
    pub allowed_file_types: Vec<String>,
    /// Empty means every path is accepted (no restriction configured).
    pub allowed_roots: Vec<PathBuf>,
    pub allow_secret_files: bool,
}

impl EffectiveConfig {
    /// Load from the process environment and apply CLI overrides.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), cli)
    }

    /// Load from an arbitrary key lookup (the environment in production, a map in tests).
    pub fn from_lookup<F>(lookup: F, cli: &Cli) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(ENV_API_KEY)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let base_url = non_empty(lookup(ENV_BASE_URL)).unwrap_or_else(|| DEFAULT_BASE_URL.into());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(invalid(ENV_BASE_URL, &base_url, "must start with http:// or https://"));
        }

        let mut model = non_empty(lookup(ENV_MODEL)).unwrap_or_else(|| DEFAULT_MODEL.into());

        let mut system_prompt = match non_empty(lookup(ENV_SYSTEM_PROMPT_FILE)) {
            Some(path) => read_prompt_file(PathBuf::from(path))?,
            None => lookup(ENV_SYSTEM_PROMPT)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.into()),
        };

        let mut temperature = match non_empty(lookup(ENV_TEMPERATURE)) {
            Some(raw) => {
                let value: f64 = raw
                    .parse()
                    .map_err(|_| invalid(ENV_TEMPERATURE, &raw, "not a number"))?;
                checked_temperature(ENV_TEMPERATURE, value)?
            }
            None => DEFAULT_TEMPERATURE,
        };

        let timeout_secs = parse_or(&lookup, ENV_TIMEOUT, DEFAULT_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(invalid(ENV_TIMEOUT, "0", "must be at least 1 second"));
        }
        let max_retries = parse_or(&lookup, ENV_MAX_RETRIES, DEFAULT_MAX_RETRIES)?;
        let max_file_size = parse_or(&lookup, ENV_MAX_FILE_SIZE, DEFAULT_MAX_FILE_SIZE)?;
        if max_file_size == 0 {
            return Err(invalid(ENV_MAX_FILE_SIZE, "0", "must be greater than zero"));
        }

        let allowed_file_types = match lookup(ENV_ALLOWED_FILE_TYPES) {
            Some(raw) => raw
                .split(',')
                .map(|t| t.trim().to_ascii_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            None => DEFAULT_ALLOWED_FILE_TYPES
                .iter()
                .map(|t| (*t).to_string())
                .collect(),
        };

        // Unset means unrestricted. A value naming no directory is an error, not permit-all.
        let allowed_roots: Vec<PathBuf> = match lookup(ENV_ALLOWED_ROOTS) {
            None => Vec::new(),
            Some(raw) => {
                let roots: Vec<PathBuf> = std::env::split_paths(&raw)
                    .filter(|p| !p.to_string_lossy().trim().is_empty())
                    .collect();
                if roots.is_empty() {
                    return Err(invalid(
                        ENV_ALLOWED_ROOTS,
                        &raw,
                        "must name at least one directory; unset it to allow any path",
                    ));
                }
                roots
            }
        };

        let allow_secret_files = match non_empty(lookup(ENV_ALLOW_SECRET_FILES)) {
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| invalid(ENV_ALLOW_SECRET_FILES, &raw, "expected true/false"))?,
            None => false,
        };

        if let Some(flag_model) = non_empty(cli.model.clone()) {
            log::info!("Overriding DeepSeek model with flag value: {flag_model}");
            model = flag_model;
        }
        if let Some(flag_prompt) = cli.system_prompt.clone().filter(|p| !p.trim().is_empty()) {
            log::info!("Overriding DeepSeek system prompt with flag value");
            system_prompt = flag_prompt;
        }
        if let Some(flag_temperature) = cli.temperature {
            temperature = checked_temperature("--deepseek-temperature", flag_temperature)?;
            log::info!("Overriding DeepSeek temperature with flag value: {temperature}");
        }

        Ok(Self {
            api_key,
            base_url,
            model,
            system_prompt,
            temperature,
            timeout: Duration::from_secs(timeout_secs),
            max_retries,
            max_file_size,
            allowed_file_types,
            allowed_roots,
            allow_secret_files,
        })
    }
}

/// Temperatures outside [0, 1] (or non-finite) are rejected rather than clamped.
pub fn checked_temperature(key: &'static str, value: f64) -> Result<f32, ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value as f32)
    } else {
        Err(invalid(key, &value.to_string(), "must be between 0.0 and 1.0"))
    }
}

fn read_prompt_file(path: PathBuf) -> Result<String, ConfigError> {
    match std::fs::read_to_string(&path) {
        Ok(text) if !text.trim().is_empty() => Ok(text),
        Ok(_) => Err(invalid(
            ENV_SYSTEM_PROMPT_FILE,
            &path.display().to_string(),
            "file is empty",
        )),
        Err(source) => Err(ConfigError::PromptFile { path, source }),
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match non_empty(lookup(key)) {
        Some(raw) => raw
            .parse()
            .map_err(|_| invalid(key, &raw, "expected a non-negative integer")),
        None => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
