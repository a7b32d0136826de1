use std::path::{Path, PathBuf};

use thiserror::Error;

/// Storage-layer error: a kind, a human-readable message, and the file the
/// operation was touching.
///
/// Every fallible operation in the engine surfaces one of these four kinds.
/// `Corruption` means the bytes on disk fail validation (checksum mismatch);
/// the `File*` kinds wrap the underlying I/O failure.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The file descriptor could not be acquired.
    #[error("failed to open {}: {message}", path.display())]
    FileOpen { message: String, path: PathBuf },

    /// A write or fsync did not complete.
    #[error("failed to write {}: {message}", path.display())]
    FileWrite { message: String, path: PathBuf },

    /// A read fell short or the file structure is not parseable.
    #[error("failed to read {}: {message}", path.display())]
    FileRead { message: String, path: PathBuf },

    /// Stored checksum does not match the recomputed one.
    #[error("corruption in {}: {message}", path.display())]
    Corruption { message: String, path: PathBuf },
}

impl StorageError {
    pub fn file_open(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::FileOpen {
            message: message.to_string(),
            path: path.into(),
        }
    }

    pub fn file_write(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::FileWrite {
            message: message.to_string(),
            path: path.into(),
        }
    }

    pub fn file_read(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::FileRead {
            message: message.to_string(),
            path: path.into(),
        }
    }

    pub fn corruption(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Corruption {
            message: message.to_string(),
            path: path.into(),
        }
    }

    /// The file the failing operation was touching.
    pub fn path(&self) -> &Path {
        match self {
            Self::FileOpen { path, .. }
            | Self::FileWrite { path, .. }
            | Self::FileRead { path, .. }
            | Self::Corruption { path, .. } => path,
        }
    }
}
