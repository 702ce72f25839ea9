//! Markdown rendering of tool results.

use crate::models::ModelSnapshot;
use crate::orchestrator::TokenReport;
use crate::util::human_readable_size;
use deepseek_api::BalanceResponse;
use std::fmt::Write as _;

const PLATFORM_URL: &str = "https://platform.deepseek.com";

pub fn models_markdown(snapshot: &ModelSnapshot) -> String {
    let mut out = String::from("# Available DeepSeek Models\n\n");
    if snapshot.is_empty() {
        out.push_str("*No models available*\n\n");
    }
    for model in snapshot.descriptors() {
        let _ = writeln!(out, "## {}", model.name);
        let _ = writeln!(out, "- ID: `{}`", model.id);
        let _ = writeln!(out, "- Description: {}\n", model.description);
    }
    out.push_str("## Usage\n");
    out.push_str(
        "You can specify a model ID in the `model` parameter when using the `deepseek_ask` tool:\n",
    );
    out.push_str("```json\n{\n  \"query\": \"Your question here\",\n  \"model\": \"deepseek-chat\"\n}\n```\n");
    out
}

pub fn balance_markdown(balance: &BalanceResponse) -> String {
    let mut out = String::from("# DeepSeek API Balance Information\n\n");
    let status = if balance.is_available {
        "✅ Available (Balance is sufficient for API calls)"
    } else {
        "❌ Unavailable (Insufficient balance for API calls)"
    };
    let _ = write!(out, "**Account Status:** {status}\n\n");

    if balance.balance_infos.is_empty() {
        out.push_str("*No balance details available*\n");
    } else {
        out.push_str("## Balance Details\n\n");
        out.push_str("| Currency | Total Balance | Granted Balance | Topped-up Balance |\n");
        out.push_str("|----------|---------------|-----------------|-------------------|\n");
        for info in &balance.balance_infos {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} |",
                info.currency, info.total_balance, info.granted_balance, info.topped_up_balance
            );
        }
    }

    out.push_str("\n## Usage Information\n\n");
    let _ = writeln!(
        out,
        "To top up your account or check more detailed usage statistics, please visit the \
         [DeepSeek Platform]({PLATFORM_URL})."
    );
    out
}

pub fn token_estimate_markdown(report: &TokenReport) -> String {
    let tokens = report.estimate.estimated_tokens;
    let chars = report.estimate.total_chars();

    let mut out = String::from("# Token Estimation Results\n\n");
    let _ = writeln!(out, "**Source Type:** {}", report.source_type.as_str());
    let _ = writeln!(out, "**Source:** {}", report.source_name);
    let _ = write!(out, "**Estimated Token Count:** {tokens}\n\n");

    out.push_str("## Content Statistics\n\n");
    let _ = writeln!(
        out,
        "- **Byte Size:** {} ({} bytes)",
        human_readable_size(report.byte_size),
        report.byte_size
    );
    let _ = writeln!(out, "- **Character Count:** {chars} characters");
    if chars > 0 {
        let _ = writeln!(
            out,
            "- **Tokens per Character Ratio:** {:.2} tokens/char",
            tokens as f64 / chars as f64
        );
    }

    out.push_str("\n## Note\n\n");
    out.push_str(
        "*This is an estimation and may not exactly match the token count used by the API. \
         Actual token usage can vary based on the model and specific tokenization algorithm.*\n",
    );
    out
}
