//! Process startup: logging, configuration, then either the full tool surface (Ready) or the
//! single-tool diagnostic surface (Degraded). Both are served over stdio.

use crate::config::{Cli, EffectiveConfig};
use crate::models::ModelRegistry;
use crate::orchestrator::RequestOrchestrator;
use crate::tools::{DeepseekService, DiagnosticService};
use crate::util::{human_readable_size, truncate_to_chars};
use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use deepseek_api::{DeepseekApi, DeepseekClient, RetryPolicy};
use rmcp::transport::stdio;
use rmcp::{ServerHandler, ServiceExt};
use std::process::ExitCode;
use std::sync::Arc;

const PROMPT_PREVIEW_CHARS: usize = 50;

pub async fn main_entry() -> ExitCode {
    // Before logging init so RUST_LOG may come from `.env` too.
    let dotenv = dotenvy::dotenv();

    // stdout carries the MCP protocol; logs go to stderr only.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    match dotenv {
        Ok(path) => log::info!("Loaded environment from {}", path.display()),
        Err(err) if err.not_found() => {}
        Err(err) => log::warn!("Ignoring unreadable .env file: {err}"),
    }

    log::info!("Starting DeepSeek MCP server");
    match prepare().await {
        Ok(service) => {
            log::info!("Starting DeepSeek MCP server via stdio");
            serve(service).await
        }
        Err(err) => {
            let message = format!("{err:#}");
            log::error!("Initialization error: {message}");
            log::warn!("Serving degraded diagnostic surface");
            serve(DiagnosticService::new(message)).await
        }
    }
}

async fn prepare() -> Result<DeepseekService> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => anyhow::bail!("invalid command-line arguments: {}", err.to_string().trim()),
    };

    let config = EffectiveConfig::load(&cli).context("invalid configuration")?;
    let client = DeepseekClient::new(&config.api_key, &config.base_url)
        .context("failed to create DeepSeek client")?;
    build_service(config, Arc::new(client)).await
}

/// Wire the Ready-mode service around `api`. The initial model refresh is best-effort; the
/// default model must still validate against whatever snapshot results.
pub(crate) async fn build_service(
    config: EffectiveConfig,
    api: Arc<dyn DeepseekApi>,
) -> Result<DeepseekService> {
    let config = Arc::new(config);
    let registry = Arc::new(ModelRegistry::new(
        api.clone(),
        config.timeout,
        RetryPolicy::with_max_retries(config.max_retries),
    ));

    if let Err(err) = registry.refresh().await {
        log::warn!("Initial model discovery failed: {err}");
    }
    registry
        .validate(&config.model)
        .await
        .with_context(|| format!("effective model ID \"{}\" is invalid", config.model))?;

    log_settings(&config);
    let orchestrator = RequestOrchestrator::new(config, api, registry);
    Ok(DeepseekService::new(Arc::new(orchestrator)))
}

fn log_settings(config: &EffectiveConfig) {
    log::info!("Registered DeepSeek tools with model: {}", config.model);
    log::info!(
        "File handling: max size {}, allowed types: {:?}",
        human_readable_size(config.max_file_size),
        config.allowed_file_types
    );
    if config.allowed_roots.is_empty() {
        log::warn!(
            "DEEPSEEK_ALLOWED_ROOTS is not set: file_paths may reference any readable file"
        );
    } else {
        log::info!("Allowed file roots: {:?}", config.allowed_roots);
    }
    log::info!(
        "Using system prompt: {}",
        truncate_to_chars(&config.system_prompt, PROMPT_PREVIEW_CHARS)
    );
}

async fn serve<S: ServerHandler>(service: S) -> ExitCode {
    let server = match service.serve(stdio()).await {
        Ok(server) => server,
        Err(err) => {
            log::error!("Failed to start stdio transport: {err}");
            return ExitCode::FAILURE;
        }
    };
    match server.waiting().await {
        Ok(reason) => {
            log::info!("DeepSeek MCP server stopped: {reason:?}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("Server error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockApi;
    use std::time::Duration;

    fn config(model: &str) -> EffectiveConfig {
        EffectiveConfig {
            api_key: "sk-test".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            model: model.to_string(),
            system_prompt: "prompt".to_string(),
            temperature: 0.4,
            timeout: Duration::from_secs(5),
            max_retries: 0,
            max_file_size: 1000,
            allowed_file_types: Vec::new(),
            allowed_roots: Vec::new(),
            allow_secret_files: false,
        }
    }

    #[tokio::test]
    async fn valid_default_model_reaches_ready() {
        let api = Arc::new(MockApi::with_models(&["deepseek-chat"]));
        let service = build_service(config("deepseek-chat"), api.clone()).await;
        assert!(service.is_ok());
        assert_eq!(api.model_calls(), 1);
    }

    #[tokio::test]
    async fn unknown_default_model_is_a_startup_error() {
        let api = Arc::new(MockApi::with_models(&["deepseek-chat"]));
        let err = build_service(config("deepseek-nope"), api)
            .await
            .err()
            .map(|err| format!("{err:#}"))
            .unwrap_or_default();
        assert!(err.contains("effective model ID \"deepseek-nope\" is invalid"), "{err}");
    }

    #[tokio::test]
    async fn unreachable_api_falls_back_to_builtin_models() {
        let api = Arc::new(MockApi::with_models(&[]));
        api.fail_models(true);
        assert!(build_service(config("deepseek-reasoner"), api).await.is_ok());
    }
}
