use std::path::Path;

/// Exact file names (lowercased) that hold credentials.
const CREDENTIAL_FILE_NAMES: &[&str] = &[
    ".env",
    ".envrc",
    ".netrc",
    ".pypirc",
    ".npmrc",
    ".pnpmrc",
    ".yarnrc",
    ".yarnrc.yml",
    ".git-credentials",
    "id_rsa",
    "id_dsa",
    "id_ecdsa",
    "id_ed25519",
];

/// Trailing path segments of tool credential stores, compared with `/` separators.
const CREDENTIAL_STORES: &[&str] = &[
    ".aws/credentials",
    ".cargo/credentials",
    ".cargo/credentials.toml",
    ".docker/config.json",
];

const KEY_EXTENSIONS: &[&str] = &["env", "key", "p12", "pem", "pfx"];

/// `.env.<variant>` files meant to be committed.
const DOTENV_TEMPLATES: &[&str] = &["dist", "example", "sample", "template"];

/// Filename-based denylist for files that commonly hold credentials.
///
/// The server reads its own API key from `.env`, so attaching such files would forward
/// secrets to the remote API. Matching is by name only; contents are not inspected.
pub fn is_potential_secret_path(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let name = name.to_ascii_lowercase();

    if let Some(variant) = name.strip_prefix(".env.") {
        return !DOTENV_TEMPLATES.contains(&variant);
    }
    if CREDENTIAL_FILE_NAMES.contains(&name.as_str()) {
        return true;
    }

    let unified = path.to_string_lossy().to_ascii_lowercase().replace('\\', "/");
    if CREDENTIAL_STORES
        .iter()
        .any(|store| unified == *store || unified.ends_with(&format!("/{store}")))
    {
        return true;
    }

    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| KEY_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}
