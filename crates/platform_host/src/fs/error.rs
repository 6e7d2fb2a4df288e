//! Typed VFS failures.

use thiserror::Error;

/// Errors returned by [`crate::VfsService`] operations.
///
/// Every operation validates before it mutates, so an error always means the store is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VfsError {
    /// The store has not been opened (or was closed).
    #[error("virtual file system is not available")]
    StorageUnavailable,
    /// No item exists at the path.
    #[error("no item at `{path}`")]
    NotFound {
        /// Requested path.
        path: String,
    },
    /// A file already exists and overwrite was not requested.
    #[error("`{path}` already exists")]
    AlreadyExists {
        /// Occupied path.
        path: String,
    },
    /// An item of the other kind (file vs folder) occupies the name.
    #[error("`{path}` is already used by an item of a different kind")]
    NameConflict {
        /// Conflicting path.
        path: String,
    },
    /// Move/copy/restore target is occupied.
    #[error("destination `{path}` is occupied")]
    DestinationOccupied {
        /// Occupied destination.
        path: String,
    },
    /// Restore was requested for an item without a recycle tag.
    #[error("`{path}` is not a recycled item")]
    InvalidRecycledItem {
        /// Offending path.
        path: String,
    },
    /// Path is empty, not rooted, or names a protected base directory.
    #[error("invalid path `{path}`")]
    InvalidPath {
        /// Offending path.
        path: String,
    },
    /// A folder cannot be moved or copied beneath itself.
    #[error("cannot place `{source_path}` inside itself at `{destination}`")]
    MoveIntoDescendant {
        /// Folder being relocated.
        source_path: String,
        /// Requested destination.
        destination: String,
    },
    /// Backing store failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl VfsError {
    pub(crate) fn not_found(path: &str) -> Self {
        Self::NotFound {
            path: path.to_string(),
        }
    }

    pub(crate) fn invalid_path(path: &str) -> Self {
        Self::InvalidPath {
            path: path.to_string(),
        }
    }

    pub(crate) fn occupied(path: &str) -> Self {
        Self::DestinationOccupied {
            path: path.to_string(),
        }
    }
}
