use crate::error::{ApiError, Result};
use crate::types::{BalanceResponse, ChatCompletionRequest, ChatCompletionResponse, ModelList};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Remote collaborator seam. Callers bound every call with their own deadline;
/// implementations must be cancel-safe (dropping the future aborts the request).
#[async_trait]
pub trait DeepseekApi: Send + Sync {
    async fn chat_completion(&self, request: &ChatCompletionRequest)
        -> Result<ChatCompletionResponse>;

    async fn list_models(&self) -> Result<ModelList>;

    async fn balance(&self) -> Result<BalanceResponse>;
}

/// `reqwest`-backed DeepSeek client using bearer authentication.
#[derive(Clone)]
pub struct DeepseekClient {
    http: Client,
    base_url: String,
}

impl DeepseekClient {
    pub fn new(api_key: &str, base_url: &str) -> Result<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(ApiError::Config("API key is empty".to_string()));
        }

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| ApiError::Config("API key contains invalid characters".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .default_headers(headers)
            .user_agent(concat!("deepseek-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{path}", self.base_url))
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            log::debug!("DeepSeek API returned {status}");
            return Err(ApiError::from_status_body(status.as_u16(), &body));
        }
        serde_json::from_str(&body).map_err(|err| ApiError::Decode(err.to_string()))
    }
}

#[async_trait]
impl DeepseekApi for DeepseekClient {
    async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        self.send(self.request(Method::POST, "/chat/completions").json(request))
            .await
    }

    async fn list_models(&self) -> Result<ModelList> {
        self.send(self.request(Method::GET, "/models")).await
    }

    async fn balance(&self) -> Result<BalanceResponse> {
        self.send(self.request(Method::GET, "/user/balance")).await
    }
}
