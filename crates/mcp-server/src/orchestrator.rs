//! Per-invocation request handling behind the MCP tools.
//!
//! Every call resolves its effective settings (request override, else configured default),
//! admits caller-supplied files through [`FileIngest`], and talks to the API under a fresh
//! deadline. Domain failures come back as [`ToolError`] and are rendered as tool-level
//! errors by the caller.

use crate::config::{checked_temperature, EffectiveConfig};
use crate::files::{FileContext, FileIngest, FileLoader, IngestError, PathGuard};
use crate::models::{ModelRegistry, ModelSnapshot, RegistryError};
use deepseek_api::{
    estimate_token_count, ApiError, BalanceResponse, ChatCompletionRequest, ChatMessage,
    DeepseekApi, RetryPolicy, TokenEstimate,
};
use std::fmt::Write as _;
use std::sync::Arc;
use thiserror::Error;

pub const EMPTY_RESPONSE_MESSAGE: &str = "The DeepSeek model returned an empty response. This \
might indicate that the model couldn't generate an appropriate response for your query. Please \
try rephrasing your question or providing more context.";

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid model specified: {0}")]
    InvalidModel(#[source] RegistryError),

    #[error("Access to file path is denied: {0}")]
    Denied(String),

    #[error("Error reading file: {0}")]
    File(String),

    #[error("Error from DeepSeek API: {source}{}", files_suffix(*files_included))]
    Transport {
        #[source]
        source: ApiError,
        files_included: usize,
    },

    #[error("Error checking balance: {0}")]
    Balance(#[source] ApiError),
}

fn files_suffix(files: usize) -> String {
    if files == 0 {
        String::new()
    } else {
        format!("\n\nThe request included {files} file(s).")
    }
}

/// Arguments of a single `deepseek_ask` call. Empty strings count as "not provided".
#[derive(Debug, Clone, Default)]
pub struct AskParams {
    pub query: String,
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub temperature: Option<f64>,
    pub file_paths: Vec<String>,
    pub json_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct AskOutcome {
    pub answer: String,
    pub files_attached: usize,
    pub skipped: Vec<SkippedFile>,
}

impl AskOutcome {
    /// Human-readable list of requested files that were left out of the request.
    pub fn skip_note(&self) -> Option<String> {
        if self.skipped.is_empty() {
            return None;
        }
        let mut note = format!(
            "Note: {} of the requested file(s) were not included:\n",
            self.skipped.len()
        );
        for skip in &self.skipped {
            let _ = writeln!(note, "- {}: {}", skip.path, skip.reason);
        }
        Some(note)
    }
}

/// Where a token estimate's content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimateSource {
    Text,
    File,
}

impl EstimateSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::File => "file",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenReport {
    pub source_type: EstimateSource,
    pub source_name: String,
    pub estimate: TokenEstimate,
    pub byte_size: u64,
}

pub struct RequestOrchestrator {
    config: Arc<EffectiveConfig>,
    api: Arc<dyn DeepseekApi>,
    registry: Arc<ModelRegistry>,
    ingest: FileIngest,
    retry: RetryPolicy,
}

impl RequestOrchestrator {
    pub fn new(
        config: Arc<EffectiveConfig>,
        api: Arc<dyn DeepseekApi>,
        registry: Arc<ModelRegistry>,
    ) -> Self {
        let ingest = FileIngest::new(
            PathGuard::new(config.allowed_roots.clone()),
            FileLoader::new(config.max_file_size, config.allowed_file_types.clone())
                .allow_secret_files(config.allow_secret_files),
        );
        let retry = RetryPolicy::with_max_retries(config.max_retries);
        Self {
            config,
            api,
            registry,
            ingest,
            retry,
        }
    }

    pub fn config(&self) -> &EffectiveConfig {
        &self.config
    }

    pub async fn ask(&self, params: AskParams) -> Result<AskOutcome, ToolError> {
        log::info!("Handling deepseek_ask request");
        if params.query.trim().is_empty() {
            return Err(ToolError::Validation(
                "Missing required 'query' parameter".to_string(),
            ));
        }

        let model = match non_empty(params.model.as_deref()) {
            Some(requested) => {
                self.registry
                    .validate(requested)
                    .await
                    .map_err(ToolError::InvalidModel)?;
                log::info!("Using request-specific model: {requested}");
                requested.trim().to_string()
            }
            None => self.config.model.clone(),
        };

        let system_prompt = match non_empty(params.system_prompt.as_deref()) {
            Some(prompt) => {
                log::info!("Using request-specific system prompt");
                prompt.to_string()
            }
            None => self.config.system_prompt.clone(),
        };

        let temperature = match params.temperature {
            Some(value) => {
                let value = checked_temperature("temperature", value)
                    .map_err(|err| ToolError::Validation(err.to_string()))?;
                log::info!("Using request-specific temperature: {value}");
                value
            }
            None => self.config.temperature,
        };

        if params.json_mode {
            log::info!("JSON mode is enabled via request");
        }

        let (attached, skipped) = self.collect_files(&params.file_paths).await;
        let user_content = compose_user_message(&params.query, &attached);

        let request = ChatCompletionRequest::new(
            model.as_str(),
            vec![
                ChatMessage::system(system_prompt),
                ChatMessage::user(user_content),
            ],
        )
        .with_temperature(temperature)
        .with_json_mode(params.json_mode);
        log::debug!(
            "Using temperature: {temperature} for model {model}. JSON mode: {}",
            params.json_mode
        );

        let api = self.api.as_ref();
        let request = &request;
        let response = self
            .retry
            .run(self.config.timeout, move || api.chat_completion(request))
            .await
            .map_err(|source| {
                log::error!("DeepSeek API error: {source}");
                ToolError::Transport {
                    source,
                    files_included: params.file_paths.len(),
                }
            })?;

        let answer = match response.first_content() {
            Some(content) if !content.is_empty() => content.to_string(),
            _ => {
                log::warn!("DeepSeek model returned an empty response");
                EMPTY_RESPONSE_MESSAGE.to_string()
            }
        };

        Ok(AskOutcome {
            answer,
            files_attached: attached.len(),
            skipped,
        })
    }

    /// Current snapshot, refreshed first if nothing has been discovered yet.
    pub async fn list_models(&self) -> Arc<ModelSnapshot> {
        log::info!("Listing available DeepSeek models");
        if let Err(err) = self.registry.refresh_if_empty().await {
            log::error!("Failed to refresh models from API: {err}");
        }
        self.registry.snapshot()
    }

    pub async fn check_balance(&self) -> Result<BalanceResponse, ToolError> {
        log::info!("Checking DeepSeek API balance");
        let api = self.api.as_ref();
        self.retry
            .run(self.config.timeout, move || api.balance())
            .await
            .map_err(|err| {
                log::error!("Failed to get balance from DeepSeek API: {err}");
                ToolError::Balance(err)
            })
    }

    /// Whitespace-only `text` is still content and gets estimated; only `""` counts as absent.
    pub async fn estimate_tokens(
        &self,
        text: Option<&str>,
        file_path: Option<&str>,
    ) -> Result<TokenReport, ToolError> {
        log::info!("Estimating token count");
        match (text.filter(|t| !t.is_empty()), non_empty(file_path)) {
            (Some(_), Some(_)) => Err(ToolError::Validation(
                "Provide either 'text' or 'file_path', not both".to_string(),
            )),
            (None, None) => {
                log::warn!("Token estimate requested without 'text' or 'file_path'");
                Err(ToolError::Validation(
                    "Please provide either 'text' or 'file_path' parameter".to_string(),
                ))
            }
            (Some(text), None) => {
                let estimate = estimate_token_count(text);
                log::info!(
                    "Estimated {} tokens for provided text",
                    estimate.estimated_tokens
                );
                Ok(TokenReport {
                    source_type: EstimateSource::Text,
                    source_name: "provided input".to_string(),
                    estimate,
                    byte_size: text.len() as u64,
                })
            }
            (None, Some(path)) => {
                let ingest = self.ingest.clone();
                let owned = path.to_string();
                let file = tokio::task::spawn_blocking(move || ingest.ingest(&owned))
                    .await
                    .map_err(|err| ToolError::File(format!("file read task failed: {err}")))?
                    .map_err(|err| {
                        log::error!("Failed to read file for token estimation {path}: {err}");
                        match err {
                            IngestError::Denied(_) => ToolError::Denied(path.to_string()),
                            IngestError::File(err) => ToolError::File(err.to_string()),
                        }
                    })?;
                let estimate = estimate_token_count(&file.content);
                log::info!(
                    "Estimated {} tokens for file {path}",
                    estimate.estimated_tokens
                );
                Ok(TokenReport {
                    source_type: EstimateSource::File,
                    source_name: file.file_name(),
                    estimate,
                    byte_size: file.byte_size,
                })
            }
        }
    }

    /// Reads run on the blocking pool.
    async fn collect_files(&self, paths: &[String]) -> (Vec<FileContext>, Vec<SkippedFile>) {
        if paths.is_empty() {
            return (Vec::new(), Vec::new());
        }

        log::info!("Processing {} file_paths for context", paths.len());
        let ingest = self.ingest.clone();
        let owned = paths.to_vec();
        let (attached, skipped) =
            match tokio::task::spawn_blocking(move || collect_files_sync(&ingest, &owned)).await {
                Ok(result) => result,
                Err(err) => {
                    log::error!("File read task failed: {err}");
                    let skipped = paths
                        .iter()
                        .map(|path| SkippedFile {
                            path: path.clone(),
                            reason: format!("file read task failed: {err}"),
                        })
                        .collect();
                    (Vec::new(), skipped)
                }
            };

        if attached.is_empty() {
            log::warn!("No files were successfully read to include in the query");
        } else {
            let total: u64 = attached.iter().map(|f| f.byte_size).sum();
            log::info!(
                "Including {} file(s) in the query, total size: {}",
                attached.len(),
                crate::util::human_readable_size(total)
            );
        }
        (attached, skipped)
    }
}

fn collect_files_sync(
    ingest: &FileIngest,
    paths: &[String],
) -> (Vec<FileContext>, Vec<SkippedFile>) {
    let mut attached = Vec::new();
    let mut skipped = Vec::new();
    for path in paths {
        match ingest.ingest(path) {
            Ok(file) => attached.push(file),
            Err(err) => {
                log::warn!("Skipping file {path}: {err}");
                skipped.push(SkippedFile {
                    path: path.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }
    (attached, skipped)
}

/// Query followed by a `# Reference Files` section with one fenced block per file.
fn compose_user_message(query: &str, files: &[FileContext]) -> String {
    if files.is_empty() {
        return query.to_string();
    }
    let mut message = String::from(query);
    message.push_str("\n\n# Reference Files\n");
    for file in files {
        let _ = write!(
            message,
            "\n\n## {}\n\n```{}\n{}\n```",
            file.file_name(),
            file.language(),
            file.content
        );
    }
    message
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
