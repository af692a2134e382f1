//! Command implementations shared by CLI and MCP server.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context;
use tracing::info;

use crate::config::Config;
use crate::document::{DocType, Document};
use crate::ingest::{self, IngestStats};
use crate::query::{Found, Mode, Outcome, QueryFacade};
use crate::search::AuthorQuery;
use crate::storage::mirror::MirrorTree;
use crate::storage::sqlite::SqliteStore;

/// How results are turned into text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Output {
    /// Records separated by blank lines.
    #[default]
    Records,
    /// One mirror path per line, for documents present on disk.
    Paths,
    Json,
}

impl Output {
    #[must_use]
    pub fn from_flags(paths: bool, json: bool) -> Self {
        if json {
            Self::Json
        } else if paths {
            Self::Paths
        } else {
            Self::Records
        }
    }
}

/// Rebuild the database from the XML index.
///
/// # Arguments
///
/// * `index` - Index file to read; the configured one if `None`
///
/// # Errors
///
/// Returns an error if the index cannot be read or parsed, or the database
/// cannot be written. The previous database contents survive any failure.
pub fn ingest(index: Option<&Path>) -> anyhow::Result<IngestStats> {
    let config = Config::load()?;
    let index_path = index.map_or_else(|| config.index_path(), Path::to_path_buf);

    let xml = std::fs::read_to_string(&index_path)
        .with_context(|| format!("Failed to read index {}", index_path.display()))?;

    let database = config.database_path();
    let mut store = SqliteStore::open(&database)?;
    let stats = ingest::refresh(&mut store, &xml)
        .with_context(|| format!("Failed to ingest {}", index_path.display()))?;

    info!(database = %database.display(), total = stats.total(), "Refresh committed");
    Ok(stats)
}

/// Open the configured database, which must already have been built.
///
/// # Errors
///
/// Returns an error if the database file is missing, holds no documents,
/// or cannot be opened.
pub fn open_store(config: &Config) -> anyhow::Result<SqliteStore> {
    let path = config.database_path();
    if !path.is_file() {
        anyhow::bail!(
            "No database at {}. Run `rfcindex ingest` first.",
            path.display()
        );
    }
    let store = SqliteStore::open(&path)?;
    if store.is_empty()? {
        anyhow::bail!(
            "Database at {} is empty. Run `rfcindex ingest` first.",
            path.display()
        );
    }
    Ok(store)
}

/// Resolve document numbers of one type.
///
/// # Errors
///
/// Returns an error if config loading fails or the store cannot be read.
pub fn resolve(doc_type: DocType, numbers: &[u32], mode: Mode) -> anyhow::Result<Outcome> {
    let config = Config::load()?;
    let store = open_store(&config)?;
    Ok(QueryFacade::new(&store).resolve(doc_type, numbers, mode)?)
}

/// Search RFCs by author attributes.
///
/// # Errors
///
/// Returns an error if no term is given, config loading fails or the store
/// cannot be read.
pub fn author(query: &AuthorQuery) -> anyhow::Result<Outcome> {
    if query.is_empty() {
        anyhow::bail!("Give at least one of --name, --title, --org or --org-abbrev");
    }
    let config = Config::load()?;
    let store = open_store(&config)?;
    let docs = QueryFacade::new(&store).search_by_author(query)?;
    Ok(search_outcome(docs))
}

/// Search RFCs by title.
///
/// # Errors
///
/// Returns an error if config loading fails or the store cannot be read.
pub fn title(titles: &[String]) -> anyhow::Result<Outcome> {
    let config = Config::load()?;
    let store = open_store(&config)?;
    let docs = QueryFacade::new(&store).search_by_title(titles)?;
    Ok(search_outcome(docs))
}

/// Search RFCs by keyword.
///
/// # Errors
///
/// Returns an error if config loading fails or the store cannot be read.
pub fn keyword(words: &[String]) -> anyhow::Result<Outcome> {
    let config = Config::load()?;
    let store = open_store(&config)?;
    let docs = QueryFacade::new(&store).search_by_keyword(words)?;
    Ok(search_outcome(docs))
}

fn search_outcome(docs: Vec<Document>) -> Outcome {
    Outcome {
        found: docs.into_iter().map(Found::Document).collect(),
        unresolved: vec![],
    }
}

/// Render the found documents.
///
/// Unresolved reasons are not included; see [`render_unresolved`].
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render(outcome: &Outcome, output: Output, mirror: &MirrorTree) -> anyhow::Result<String> {
    let mut text = String::new();
    match output {
        Output::Records => {
            let records: Vec<String> = outcome.found.iter().map(ToString::to_string).collect();
            text = records.join("\n");
        }
        Output::Paths => {
            for path in outcome
                .found
                .iter()
                .filter_map(Found::document)
                .filter_map(|doc| mirror.existing_path(doc.key()))
            {
                writeln!(text, "{}", path.display())?;
            }
        }
        Output::Json => {
            text = serde_json::to_string_pretty(outcome)?;
            text.push('\n');
        }
    }
    Ok(text)
}

/// One line per unresolved number.
#[must_use]
pub fn render_unresolved(outcome: &Outcome) -> String {
    outcome
        .unresolved
        .iter()
        .map(|reason| format!("{reason}\n"))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::document::{DocRef, Series};
    use crate::query::Unresolved;

    fn outcome() -> Outcome {
        Outcome {
            found: vec![
                Found::Document(Document::Bcp(Series {
                    id: 14,
                    title: None,
                })),
                Found::Document(Document::Std(Series {
                    id: 3,
                    title: Some("Requirements for Internet Hosts".to_string()),
                })),
                Found::Reference(DocRef::new(DocType::Ien, 137)),
            ],
            unresolved: vec![Unresolved::NotIssued { id: 14 }],
        }
    }

    mod render_tests {
        use super::*;

        #[test]
        fn records_are_blank_line_separated() {
            let mirror = MirrorTree::new("/nonexistent".into());
            let text = render(&outcome(), Output::Records, &mirror).unwrap();
            assert_eq!(
                text,
                "BCP                : 0014\n\
                 \n\
                 STD                : 0003\n\
                 Title              : Requirements for Internet Hosts\n\
                 \n\
                 IEN 137\n"
            );
        }

        #[test]
        fn paths_only_for_existing_files() {
            let dir = TempDir::new().unwrap();
            fs::create_dir_all(dir.path().join("std")).unwrap();
            fs::write(dir.path().join("std/std3.txt"), "").unwrap();

            let mirror = MirrorTree::new(dir.path().to_path_buf());
            let text = render(&outcome(), Output::Paths, &mirror).unwrap();
            assert_eq!(text, format!("{}\n", dir.path().join("std/std3.txt").display()));
        }

        #[test]
        fn json_includes_reasons() {
            let mirror = MirrorTree::new("/nonexistent".into());
            let text = render(&outcome(), Output::Json, &mirror).unwrap();
            let value: serde_json::Value = serde_json::from_str(&text).unwrap();
            assert_eq!(value["found"][0]["kind"], "bcp");
            assert_eq!(value["found"][2]["type"], "IEN");
            assert_eq!(value["unresolved"][0]["reason"], "not_issued");
        }

        #[test]
        fn unresolved_lines() {
            assert_eq!(
                render_unresolved(&outcome()),
                "RFC 14 was reserved but never issued.\n"
            );
        }
    }

    #[test]
    fn output_flags() {
        assert_eq!(Output::from_flags(false, false), Output::Records);
        assert_eq!(Output::from_flags(true, false), Output::Paths);
        assert_eq!(Output::from_flags(false, true), Output::Json);
    }

    #[test]
    fn missing_database_is_explained() {
        let dir = TempDir::new().unwrap();
        let config: Config =
            toml::from_str(&format!("[data]\ndir = {:?}\n", dir.path().display().to_string()))
                .unwrap();
        let err = open_store(&config).err().unwrap();
        assert!(err.to_string().contains("rfcindex ingest"));
    }

    #[test]
    fn schema_only_database_is_explained() {
        let dir = TempDir::new().unwrap();
        let config: Config =
            toml::from_str(&format!("[data]\ndir = {:?}\n", dir.path().display().to_string()))
                .unwrap();
        SqliteStore::open(&config.database_path()).unwrap();
        let err = open_store(&config).err().unwrap();
        assert!(err.to_string().contains("is empty"));
        assert!(err.to_string().contains("rfcindex ingest"));
    }

    #[test]
    fn empty_author_query_is_rejected() {
        let err = author(&AuthorQuery::default()).unwrap_err();
        assert!(err.to_string().contains("--name"));
    }
}
