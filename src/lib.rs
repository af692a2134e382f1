//! rfcindex - A local, queryable index of IETF documents.
//!
//! This library ingests the RFC Editor's XML index into SQLite and answers
//! questions about the RFC, STD, BCP and FYI series: what a document is,
//! what its current version is, what else it is published as, and which
//! RFCs match an author, title or keyword.
//!
//! # Modules
//!
//! - [`document`] - Document records, references and edges
//! - [`ingest`] - XML index ingestion
//! - [`storage`] - Document store traits, SQLite store and mirror layout
//! - [`resolve`] - Edge traversal: current versions, obsolescence, aliases
//! - [`search`] - Author, title and keyword search
//! - [`query`] - Query façade with per-number unresolved reasons
//! - [`commands`] - High-level operations shared by the CLI and MCP server
//! - [`config`] - Configuration loading
//! - [`cli`] - Command-line interface definitions

pub mod cli;
pub mod commands;
pub mod config;
pub mod document;
pub mod ingest;
pub mod query;
pub mod resolve;
pub mod search;
pub mod storage;

#[cfg(feature = "mcp")]
pub mod mcp;
