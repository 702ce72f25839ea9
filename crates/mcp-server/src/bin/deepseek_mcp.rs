use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    deepseek_mcp::main_entry().await
}
