use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;

pub fn locate_deepseek_mcp_bin() -> Result<PathBuf> {
    if let Some(path) = option_env!("CARGO_BIN_EXE_deepseek-mcp") {
        return Ok(PathBuf::from(path));
    }

    // `.../target/{debug|release}/deps/<test>` -> `.../target/{debug|release}/deepseek-mcp`
    if let Ok(exe) = std::env::current_exe() {
        if let Some(target_profile_dir) = exe.parent().and_then(|p| p.parent()) {
            let candidate = target_profile_dir.join("deepseek-mcp");
            if candidate.exists() {
                return Ok(candidate);
            }
        }
    }

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let repo_root = manifest_dir
        .ancestors()
        .nth(2)
        .context("failed to resolve repo root from CARGO_MANIFEST_DIR")?;
    for rel in ["target/debug/deepseek-mcp", "target/release/deepseek-mcp"] {
        let candidate = repo_root.join(rel);
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    anyhow::bail!("failed to locate deepseek-mcp binary; build with: cargo build -p deepseek-mcp")
}

/// Server command isolated from the caller's environment and any `.env` in the checkout.
pub fn server_command(workdir: &Path) -> Result<Command> {
    let mut cmd = Command::new(locate_deepseek_mcp_bin()?);
    cmd.current_dir(workdir);
    for key in [
        "DEEPSEEK_API_KEY",
        "DEEPSEEK_BASE_URL",
        "DEEPSEEK_MODEL",
        "DEEPSEEK_SYSTEM_PROMPT",
        "DEEPSEEK_SYSTEM_PROMPT_FILE",
        "DEEPSEEK_TEMPERATURE",
        "DEEPSEEK_TIMEOUT",
        "DEEPSEEK_MAX_RETRIES",
        "DEEPSEEK_MAX_FILE_SIZE",
        "DEEPSEEK_ALLOWED_FILE_TYPES",
        "DEEPSEEK_ALLOWED_ROOTS",
        "DEEPSEEK_ALLOW_SECRET_FILES",
    ] {
        cmd.env_remove(key);
    }
    cmd.env("RUST_LOG", "warn");
    Ok(cmd)
}
