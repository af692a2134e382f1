//! Local mirror of plaintext documents.
//!
//! The mirror itself is maintained by an external rsync step; this module
//! only knows where a given document's file lives inside it.

use std::path::PathBuf;

use crate::document::{DocKey, DocKind};

/// Path of the XML index relative to the mirror root.
pub const INDEX_FILE: &str = "rfc/rfc-index.xml";

/// Read-only view of a mirrored document tree.
pub struct MirrorTree {
    root: PathBuf,
}

impl MirrorTree {
    /// Create a view of the mirror rooted at the given path.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Default location of the XML index inside the mirror.
    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    /// Where the plaintext file for `key` would be.
    ///
    /// Not-issued numbers have no file.
    #[must_use]
    pub fn document_path(&self, key: DocKey) -> Option<PathBuf> {
        let relative = match key.kind {
            DocKind::Rfc => format!("rfc/rfc{}.txt", key.id),
            DocKind::Bcp => format!("rfc/bcp/bcp{}.txt", key.id),
            DocKind::Fyi => format!("rfc/fyi/fyi{}.txt", key.id),
            DocKind::Std => format!("std/std{}.txt", key.id),
            DocKind::NotIssued => return None,
        };
        Some(self.root.join(relative))
    }

    /// Like [`MirrorTree::document_path`], but only if the file exists.
    #[must_use]
    pub fn existing_path(&self, key: DocKey) -> Option<PathBuf> {
        self.document_path(key).filter(|path| path.is_file())
    }
}
