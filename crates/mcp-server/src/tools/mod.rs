//! MCP tool surface.
//!
//! [`DeepseekService`] is served when startup succeeds; [`DiagnosticService`] replaces it when
//! startup fails, so the client can still learn what went wrong.

mod diagnostic;
mod schemas;
mod service;

pub use diagnostic::DiagnosticService;
pub use service::DeepseekService;
