use super::kinds::content_type_for_path;
use super::secrets::is_potential_secret_path;
use crate::util::human_readable_size;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("file not found or not accessible: {}: {source}", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("path is a directory, not a file: {}", path.display())]
    NotAFile { path: PathBuf },

    #[error("file is too large: {} ({}, limit {})", path.display(), human_readable_size(*size), human_readable_size(*limit))]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("file type not allowed: {} (type: {content_type})", path.display())]
    TypeNotAllowed {
        path: PathBuf,
        content_type: &'static str,
    },

    #[error("refusing to read potential secret file: {} (set DEEPSEEK_ALLOW_SECRET_FILES=1 to override)", path.display())]
    PotentialSecret { path: PathBuf },

    #[error("failed to read file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl LoadedFile {
    /// Content as prompt text; invalid UTF-8 sequences become U+FFFD.
    pub fn into_text(self) -> String {
        match String::from_utf8(self.bytes) {
            Ok(text) => text,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        }
    }
}

/// Size- and type-bounded file reader. Every check runs before any content is read.
#[derive(Debug, Clone)]
pub struct FileLoader {
    max_bytes: u64,
    allowed_types: Vec<String>,
    allow_secrets: bool,
}

impl FileLoader {
    pub fn new(max_bytes: u64, allowed_types: Vec<String>) -> Self {
        Self {
            max_bytes,
            allowed_types: allowed_types
                .into_iter()
                .map(|t| t.trim().to_ascii_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            allow_secrets: false,
        }
    }

    pub fn allow_secret_files(mut self, allow: bool) -> Self {
        self.allow_secrets = allow;
        self
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn allowed_types(&self) -> &[String] {
        &self.allowed_types
    }

    pub fn load(&self, path: &Path) -> Result<LoadedFile, FileError> {
        let meta = std::fs::metadata(path).map_err(|source| FileError::NotFound {
            path: path.to_path_buf(),
            source,
        })?;
        if !meta.is_file() {
            return Err(FileError::NotAFile {
                path: path.to_path_buf(),
            });
        }
        if meta.len() > self.max_bytes {
            return Err(FileError::TooLarge {
                path: path.to_path_buf(),
                size: meta.len(),
                limit: self.max_bytes,
            });
        }

        let content_type = content_type_for_path(path);
        if !self.allowed_types.is_empty() && !self.allowed_types.iter().any(|t| t == content_type)
        {
            return Err(FileError::TypeNotAllowed {
                path: path.to_path_buf(),
                content_type,
            });
        }
        if !self.allow_secrets && is_potential_secret_path(path) {
            return Err(FileError::PotentialSecret {
                path: path.to_path_buf(),
            });
        }

        let bytes = self.read_bounded(path)?;
        Ok(LoadedFile {
            content_type,
            bytes,
        })
    }

    // The file may grow between `metadata` and the read; never buffer past the limit.
    fn read_bounded(&self, path: &Path) -> Result<Vec<u8>, FileError> {
        let read_err = |source| FileError::Read {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(read_err)?;
        let mut bytes = Vec::new();
        file.take(self.max_bytes.saturating_add(1))
            .read_to_end(&mut bytes)
            .map_err(read_err)?;
        if bytes.len() as u64 > self.max_bytes {
            return Err(FileError::TooLarge {
                path: path.to_path_buf(),
                size: bytes.len() as u64,
                limit: self.max_bytes,
            });
        }
        Ok(bytes)
    }
}
