use rmcp::handler::server::tool::ToolRouter;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use std::sync::Arc;

/// Degraded-mode surface: a single tool that reports why startup failed.
#[derive(Clone)]
pub struct DiagnosticService {
    startup_error: Arc<str>,
    tool_router: ToolRouter<Self>,
}

impl DiagnosticService {
    pub fn new(startup_error: impl Into<Arc<str>>) -> Self {
        Self {
            startup_error: startup_error.into(),
            tool_router: Self::tool_router(),
        }
    }

    pub fn message(&self) -> &str {
        &self.startup_error
    }
}

#[tool_router]
impl DiagnosticService {
    #[tool(description = "Report the error that prevented the DeepSeek MCP server from starting")]
    pub async fn startup_error(&self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::error(vec![Content::text(format!(
            "DeepSeek MCP server failed to start: {}",
            self.startup_error
        ))]))
    }
}

#[tool_handler]
impl ServerHandler for DiagnosticService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "The DeepSeek MCP server could not start. Call 'startup_error' for details."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "deepseek-error".to_string(),
                ..Implementation::from_build_env()
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echoes_the_captured_error() {
        let service = DiagnosticService::new("DEEPSEEK_API_KEY environment variable is required");
        let result = service.startup_error().await.unwrap();
        assert_eq!(result.is_error, Some(true));
        let text = result
            .content
            .first()
            .and_then(|c| c.as_text())
            .map(|t| t.text.clone())
            .unwrap_or_default();
        assert!(text.contains("DEEPSEEK_API_KEY"));
    }

    #[test]
    fn exposes_only_the_diagnostic_tool() {
        let service = DiagnosticService::new("boom");
        let names: Vec<String> = service
            .tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        assert_eq!(names, ["startup_error"]);
        assert_eq!(service.message(), "boom");
        assert_eq!(service.get_info().server_info.name, "deepseek-error");
    }
}
