use super::schemas::ask::AskRequest;
use super::schemas::token_estimate::TokenEstimateRequest;
use crate::orchestrator::{RequestOrchestrator, ToolError};
use crate::report;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use std::sync::Arc;

/// Full tool surface, served once startup has succeeded.
#[derive(Clone)]
pub struct DeepseekService {
    orchestrator: Arc<RequestOrchestrator>,
    tool_router: ToolRouter<Self>,
}

impl DeepseekService {
    pub fn new(orchestrator: Arc<RequestOrchestrator>) -> Self {
        Self {
            orchestrator,
            tool_router: Self::tool_router(),
        }
    }
}

fn tool_error(err: ToolError) -> CallToolResult {
    CallToolResult::error(vec![Content::text(err.to_string())])
}

#[tool_router]
impl DeepseekService {
    #[tool(
        description = "Use DeepSeek's AI model to ask about complex coding problems. Optionally attach local files as context."
    )]
    pub async fn deepseek_ask(
        &self,
        Parameters(request): Parameters<AskRequest>,
    ) -> Result<CallToolResult, McpError> {
        match self.orchestrator.ask(request.into()).await {
            Ok(outcome) => {
                let mut content = vec![Content::text(outcome.answer.clone())];
                if let Some(note) = outcome.skip_note() {
                    content.push(Content::text(note));
                }
                Ok(CallToolResult::success(content))
            }
            Err(err) => Ok(tool_error(err)),
        }
    }

    #[tool(description = "List available DeepSeek models with descriptions")]
    pub async fn deepseek_models(&self) -> Result<CallToolResult, McpError> {
        let snapshot = self.orchestrator.list_models().await;
        Ok(CallToolResult::success(vec![Content::text(
            report::models_markdown(&snapshot),
        )]))
    }

    #[tool(description = "Check your DeepSeek API account balance")]
    pub async fn deepseek_balance(&self) -> Result<CallToolResult, McpError> {
        match self.orchestrator.check_balance().await {
            Ok(balance) => Ok(CallToolResult::success(vec![Content::text(
                report::balance_markdown(&balance),
            )])),
            Err(err) => Ok(tool_error(err)),
        }
    }

    #[tool(description = "Estimate the number of tokens in a given text or file content.")]
    pub async fn deepseek_token_estimate(
        &self,
        Parameters(request): Parameters<TokenEstimateRequest>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .orchestrator
            .estimate_tokens(request.text.as_deref(), request.file_path.as_deref())
            .await;
        match result {
            Ok(estimate) => Ok(CallToolResult::success(vec![Content::text(
                report::token_estimate_markdown(&estimate),
            )])),
            Err(err) => Ok(tool_error(err)),
        }
    }
}

#[tool_handler]
impl ServerHandler for DeepseekService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(format!(
                "DeepSeek bridge for coding questions. Use 'deepseek_ask' to ask a question \
                 (optionally attaching files via 'file_paths'), 'deepseek_models' to list \
                 models, 'deepseek_balance' for the account balance, and \
                 'deepseek_token_estimate' to size a prompt. Default model: {}.",
                self.orchestrator.config().model
            )),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "deepseek".to_string(),
                ..Implementation::from_build_env()
            },
            ..Default::default()
        }
    }
}
