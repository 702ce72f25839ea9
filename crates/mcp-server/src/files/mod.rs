//! Secure file ingestion: root containment ([`PathGuard`]) followed by bounded,
//! type-checked reads ([`FileLoader`]).
//!
//! A path is only read after both checks pass; the resulting [`FileContext`] lives for a
//! single request and is never cached.

mod guard;
mod kinds;
mod loader;
mod secrets;

pub use guard::{PathDenied, PathGuard};
pub use kinds::{content_type_for_path, language_for_path};
pub use loader::{FileError, FileLoader, LoadedFile};
pub use secrets::is_potential_secret_path;

use std::path::{Path, PathBuf};

/// A file admitted into an outbound request.
#[derive(Debug, Clone)]
pub struct FileContext {
    /// Path as the caller supplied it.
    pub path: String,
    pub resolved_path: PathBuf,
    pub content_type: &'static str,
    pub byte_size: u64,
    pub content: String,
}

impl FileContext {
    pub fn file_name(&self) -> String {
        Path::new(&self.path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.clone())
    }

    pub fn language(&self) -> &'static str {
        language_for_path(&self.resolved_path)
    }
}

/// Why a requested file did not make it into a request.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Denied(#[from] PathDenied),

    #[error(transparent)]
    File(#[from] FileError),
}

/// Guard + loader pair applied to every caller-supplied path.
#[derive(Debug, Clone)]
pub struct FileIngest {
    guard: PathGuard,
    loader: FileLoader,
}

impl FileIngest {
    pub fn new(guard: PathGuard, loader: FileLoader) -> Self {
        Self { guard, loader }
    }

    pub fn ingest(&self, raw_path: &str) -> Result<FileContext, IngestError> {
        let resolved = self.guard.check(Path::new(raw_path))?;
        let loaded = self.loader.load(&resolved)?;
        Ok(FileContext {
            path: raw_path.to_string(),
            resolved_path: resolved,
            content_type: loaded.content_type,
            byte_size: loaded.bytes.len() as u64,
            content: loaded.into_text(),
        })
    }
}
