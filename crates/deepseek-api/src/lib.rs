//! # DeepSeek API
//!
//! Minimal async client for the DeepSeek REST API, shaped for tool servers that
//! need chat completions, model discovery and account balance lookups.
//!
//! ## Layout
//!
//! ```text
//! DeepseekApi (trait seam, mockable)
//!     │
//!     ├──> DeepseekClient (reqwest, bearer auth)
//!     │      ├─> POST /chat/completions
//!     │      ├─> GET  /models
//!     │      └─> GET  /user/balance
//!     │
//!     └──> RetryPolicy (deadline-aware, transient failures only)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use deepseek_api::{ChatCompletionRequest, ChatMessage, DeepseekApi, DeepseekClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), deepseek_api::ApiError> {
//!     let client = DeepseekClient::new("sk-...", deepseek_api::DEFAULT_BASE_URL)?;
//!     let request = ChatCompletionRequest::new(
//!         "deepseek-chat",
//!         vec![ChatMessage::system("Be brief."), ChatMessage::user("What is a borrow?")],
//!     );
//!     let response = client.chat_completion(&request).await?;
//!     println!("{}", response.first_content().unwrap_or_default());
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod retry;
mod tokens;
mod types;

pub use client::{DeepseekApi, DeepseekClient, DEFAULT_BASE_URL};
pub use error::{ApiError, Result};
pub use retry::RetryPolicy;
pub use tokens::{estimate_token_count, TokenEstimate};
pub use types::{
    BalanceInfo, BalanceResponse, ChatChoice, ChatCompletionRequest, ChatCompletionResponse,
    ChatMessage, ChatRole, ModelList, RemoteModel, ResponseFormat, Usage,
};
