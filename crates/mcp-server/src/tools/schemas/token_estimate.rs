use rmcp::schemars;
use serde::Deserialize;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct TokenEstimateRequest {
    #[schemars(description = "Text to estimate token count for. Use this or file_path.")]
    pub text: Option<String>,

    #[schemars(description = "Path to a file to estimate token count for. Use this or text.")]
    pub file_path: Option<String>,
}
