use crate::orchestrator::AskParams;
use rmcp::schemars;
use serde::Deserialize;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct AskRequest {
    #[schemars(
        description = "The coding problem or question for DeepSeek AI, including any relevant code."
    )]
    pub query: String,

    #[schemars(
        description = "Optional: Specific DeepSeek model to use (e.g., deepseek-chat, deepseek-reasoner). Overrides default configuration."
    )]
    pub model: Option<String>,

    #[serde(rename = "systemPrompt", alias = "system_prompt")]
    #[schemars(
        description = "Optional: Custom system prompt to guide the AI's behavior for this request. Overrides default configuration."
    )]
    pub system_prompt: Option<String>,

    #[schemars(
        description = "Optional: Sampling temperature between 0.0 and 1.0 for this request. Overrides default configuration."
    )]
    pub temperature: Option<f64>,

    #[schemars(
        description = "Optional: Paths to files to include in the request context. Content will be appended to the query."
    )]
    pub file_paths: Option<Vec<String>>,

    #[schemars(
        description = "Optional: Enable JSON mode for structured JSON responses. Set to true when expecting JSON output."
    )]
    pub json_mode: Option<bool>,
}

impl From<AskRequest> for AskParams {
    fn from(request: AskRequest) -> Self {
        Self {
            query: request.query,
            model: request.model,
            system_prompt: request.system_prompt,
            temperature: request.temperature,
            file_paths: request.file_paths.unwrap_or_default(),
            json_mode: request.json_mode.unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn accepts_camel_case_system_prompt_and_defaults_optionals() {
        let request: AskRequest = serde_json::from_value(serde_json::json!({
            "query": "why does this panic?",
            "systemPrompt": "be terse",
        }))
        .unwrap();
        let params = AskParams::from(request);
        assert_eq!(params.query, "why does this panic?");
        assert_eq!(params.system_prompt.as_deref(), Some("be terse"));
        assert!(params.file_paths.is_empty());
        assert!(!params.json_mode);
        assert_eq!(params.temperature, None);
    }

    #[test]
    fn carries_files_and_json_mode() {
        let request: AskRequest = serde_json::from_value(serde_json::json!({
            "query": "q",
            "file_paths": ["src/main.rs", "Cargo.toml"],
            "json_mode": true,
            "temperature": 0.1,
        }))
        .unwrap();
        let params = AskParams::from(request);
        assert_eq!(params.file_paths, vec!["src/main.rs", "Cargo.toml"]);
        assert!(params.json_mode);
        assert_eq!(params.temperature, Some(0.1));
    }
}
