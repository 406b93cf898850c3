//! Error taxonomy for the layout and staging modules.

use std::path::PathBuf;

/// Errors surfaced by [`crate::layout`] and [`crate::staging`].
///
/// Host I/O failures propagate unchanged via [`VfsError::Io`]; the driver
/// is responsible for mapping these onto FUSE errno replies.
#[derive(Debug, thiserror::Error)]
pub enum VfsError {
    /// The requested logical file (or the requested version of it) does
    /// not exist in the version store.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation targeted a hidden name, which is never writable
    /// through the mount.
    #[error("not permitted: {0}")]
    NotPermitted(String),

    /// A host-level I/O failure (permission error, missing store
    /// directory, etc.) propagated unchanged.
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl VfsError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        VfsError::Io {
            path: path.into(),
            source,
        }
    }
}
