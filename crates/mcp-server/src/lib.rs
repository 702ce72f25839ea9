//! DeepSeek MCP server.
//!
//! Exposes the DeepSeek chat API to MCP clients over stdio.
//!
//! ## Tools
//!
//! - `deepseek_ask` - ask a coding question, optionally attaching local files
//! - `deepseek_models` - list the models the API currently offers
//! - `deepseek_balance` - show the account balance
//! - `deepseek_token_estimate` - estimate the token count of text or a file
//!
//! When startup fails (missing API key, invalid settings, unknown default model) the server
//! still starts, exposing only `startup_error`.
//!
//! ## Usage
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "deepseek": {
//!       "command": "deepseek-mcp",
//!       "env": { "DEEPSEEK_API_KEY": "sk-...", "DEEPSEEK_ALLOWED_ROOTS": "/home/me/project" }
//!     }
//!   }
//! }
//! ```

pub mod config;
pub mod files;
pub mod models;
pub mod orchestrator;
pub mod report;
mod startup;
pub mod tools;
mod util;

#[cfg(test)]
mod test_support;

pub use startup::main_entry;
