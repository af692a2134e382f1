//! Document store traits and implementations.
//!
//! Reads go through [`DocumentStore`], which the resolution and search code
//! is written against. Writes go through [`DocumentSink`], which only the
//! ingestor uses, inside a refresh transaction owned by the caller.

pub mod mirror;
pub mod sqlite;

use std::collections::BTreeSet;

use crate::document::{DocKind, DocRef, Document, EdgeKind, ParseError};

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Failed to create {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt stored value: {0}")]
    Decode(#[from] ParseError),
}

/// Text columns that term search can match against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    RfcTitle,
    AuthorName,
    AuthorTitle,
    AuthorOrganization,
    AuthorOrgAbbrev,
}

/// How a search term is compared to a [`TextField`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermMatch {
    /// Byte-for-byte, case-sensitive equality.
    Exact,
    /// Case-insensitive, with `*` matching any run of characters.
    Wildcard,
}

/// Read access to stored documents.
pub trait DocumentStore {
    /// Point lookup. `Ok(None)` means the key is not present.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read or a stored value
    /// cannot be decoded.
    fn document(&self, kind: DocKind, id: u32) -> Result<Option<Document>, StorageError>;

    /// Numbers of the Rfcs that declare an edge of `kind` pointing at `target`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    fn rfcs_declaring(&self, kind: EdgeKind, target: DocRef) -> Result<Vec<u32>, StorageError>;

    /// Numbers of the Rfcs whose `field` matches `term`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    fn rfcs_matching(
        &self,
        field: TextField,
        term: &str,
        how: TermMatch,
    ) -> Result<BTreeSet<u32>, StorageError>;

    /// Numbers of the Rfcs tagged with `word`, compared case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    fn rfcs_with_keyword(&self, word: &str) -> Result<BTreeSet<u32>, StorageError>;
}

/// Write access used during ingestion.
pub trait DocumentSink {
    /// Register one document with everything it owns (authors, edges,
    /// keyword links).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be written.
    fn add_document(&mut self, document: &Document) -> Result<(), StorageError>;
}
