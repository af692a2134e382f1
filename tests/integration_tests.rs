//! Integration tests for the rfcindex library.
//!
//! Each test ingests the fixture index into a fresh database file and
//! queries it through the public API.

use std::path::PathBuf;

use rfcindex::document::{DocKind, DocRef, DocType, Document, FileType, Month};
use rfcindex::ingest;
use rfcindex::query::{Found, Mode, QueryFacade, Unresolved};
use rfcindex::resolve::{self, Target, UpdatePolicy};
use rfcindex::search::AuthorQuery;
use rfcindex::storage::DocumentStore;
use rfcindex::storage::sqlite::{DB_FILENAME, SqliteStore};
use tempfile::TempDir;

const INDEX: &str = include_str!("data/rfc-index.xml");

/// Test helper owning a database built from the fixture.
struct TestStore {
    _temp_dir: TempDir,
    path: PathBuf,
    store: SqliteStore,
}

impl TestStore {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join(DB_FILENAME);
        let mut store = SqliteStore::open(&path).expect("Failed to open store");
        ingest::refresh(&mut store, INDEX).expect("Failed to ingest fixture");

        Self {
            _temp_dir: temp_dir,
            path,
            store,
        }
    }

    fn facade(&self) -> QueryFacade<'_, SqliteStore> {
        QueryFacade::new(&self.store)
    }
}

fn ids(docs: &[Document]) -> Vec<u32> {
    docs.iter().map(Document::id).collect()
}

fn rfc(id: u32) -> DocRef {
    DocRef::new(DocType::Rfc, id)
}

// =============================================================================
// Ingestion round trip
// =============================================================================

mod ingest_tests {
    use super::*;

    #[test]
    fn rfc8180_survives_round_trip() {
        let env = TestStore::new();
        let doc = env
            .store
            .document(DocKind::Rfc, 8180)
            .unwrap()
            .expect("RFC 8180 missing");
        let rfc = doc.as_rfc().unwrap();

        assert_eq!(
            rfc.title,
            "Minimal IPv6 over the TSCH Mode of IEEE 802.15.4e (6TiSCH) Configuration"
        );
        assert_eq!(rfc.authors.len(), 3);
        assert_eq!(rfc.authors[0].title.as_deref(), Some("Editor"));
        assert_eq!(rfc.date.month, Month::May);
        assert_eq!(rfc.formats[0].file_type, FileType::Ascii);
        assert_eq!(rfc.formats[0].char_count, 60068);
        assert_eq!(rfc.formats[0].page_count, Some(28));
        assert_eq!(rfc.abstract_paragraphs.len(), 1);
        assert_eq!(rfc.is_also, vec![DocRef::new(DocType::Bcp, 210)]);
    }

    #[test]
    fn rfc0010_edges_in_declaration_order() {
        let env = TestStore::new();
        let doc = env.store.document(DocKind::Rfc, 10).unwrap().unwrap();
        let record = doc.as_rfc().unwrap();

        assert_eq!(record.obsoletes, vec![rfc(24), rfc(27), rfc(30)]);
        assert_eq!(record.updated_by, vec![rfc(24), rfc(27), rfc(30)]);
        assert_eq!(record.keywords, vec!["One", "Two"]);
        assert_eq!(record.authors[0].name, "S.D. Crocker");
    }

    #[test]
    fn keywords_are_shared() {
        let env = TestStore::new();
        // "One" appears on two entries, "Two" and "Standards" on one each.
        assert_eq!(env.store.keyword_count().unwrap(), 3);
    }

    #[test]
    fn reopened_database_keeps_contents() {
        let env = TestStore::new();
        let reopened = SqliteStore::open(&env.path).unwrap();
        assert_eq!(reopened.count(DocKind::Rfc).unwrap(), 7);
        assert_eq!(reopened.count(DocKind::Std).unwrap(), 2);
        assert!(reopened.document(DocKind::NotIssued, 14).unwrap().is_some());
    }

    #[test]
    fn refresh_replaces_instead_of_appending() {
        let mut env = TestStore::new();
        ingest::refresh(&mut env.store, INDEX).unwrap();
        assert_eq!(env.store.count(DocKind::Rfc).unwrap(), 7);
        assert_eq!(env.store.keyword_count().unwrap(), 3);
    }

    #[test]
    fn series_titles() {
        let env = TestStore::new();
        let std1 = env.store.document(DocKind::Std, 1).unwrap().unwrap();
        assert!(std1.title().unwrap().starts_with("[STD number 1 is retired."));
        let bcp14 = env.store.document(DocKind::Bcp, 14).unwrap().unwrap();
        assert_eq!(bcp14.title(), None);
    }
}

// =============================================================================
// Resolution
// =============================================================================

mod resolve_tests {
    use super::*;

    #[test]
    fn current_without_updates_is_itself() {
        let env = TestStore::new();
        let current = env.facade().resolve_current(8180).unwrap().unwrap();
        assert_eq!(current.id(), 8180);
        let again = env.facade().resolve_current(current.id()).unwrap().unwrap();
        assert_eq!(again, current);
    }

    #[test]
    fn current_takes_last_updated_by() {
        let env = TestStore::new();
        assert_eq!(env.facade().resolve_current(10).unwrap().map(|d| d.id()), Some(30));
        assert_eq!(env.facade().resolve_current(2119).unwrap().map(|d| d.id()), Some(8174));
    }

    #[test]
    fn latest_by_date_on_fixture() {
        let env = TestStore::new();
        let facade = env.facade().with_policy(UpdatePolicy::LatestByDate);
        // RFC 30 (1970) is newer than RFC 24 and RFC 27 (1969).
        assert_eq!(facade.resolve_current(10).unwrap().map(|d| d.id()), Some(30));
    }

    #[test]
    fn obsoleting_follows_chain() {
        let env = TestStore::new();
        assert_eq!(env.facade().resolve_obsoleting(10).unwrap().map(|d| d.id()), Some(30));
        assert_eq!(env.facade().resolve_obsoleting(14).unwrap(), None);
    }

    #[test]
    fn rfc8180_is_also_bcp210() {
        let env = TestStore::new();
        let outcome = env.facade().resolve_aliases(8180).unwrap();
        assert_eq!(outcome.found.len(), 1);
        let doc = outcome.found[0].document().unwrap();
        assert_eq!((doc.kind(), doc.id()), (DocKind::Bcp, 210));
    }

    #[test]
    fn bcp14_aliases_are_its_rfcs() {
        let env = TestStore::new();
        let aliases = resolve::resolve_aliases(&env.store, DocType::Bcp, 14)
            .unwrap()
            .unwrap();
        let found: Vec<u32> = aliases
            .iter()
            .filter_map(Target::document)
            .map(Document::id)
            .collect();
        assert_eq!(found, vec![2119, 8174]);
    }

    #[test]
    fn see_also_mixes_found_raw_and_dangling() {
        let env = TestStore::new();
        let outcome = env
            .facade()
            .resolve(DocType::Rfc, &[8180], Mode::SeeAlso)
            .unwrap();
        assert_eq!(outcome.found.len(), 2);
        assert_eq!(outcome.found[1], Found::Reference(DocRef::new(DocType::Ien, 137)));
        assert_eq!(
            outcome.unresolved,
            vec![Unresolved::Dangling {
                from: rfc(8180),
                to: DocRef::new(DocType::Bcp, 0),
            }]
        );
    }

    #[test]
    fn not_issued_is_not_not_found() {
        let env = TestStore::new();
        let outcome = env
            .facade()
            .resolve(DocType::Rfc, &[14, 15, 14], Mode::Lookup)
            .unwrap();
        assert_eq!(
            outcome.unresolved,
            vec![
                Unresolved::NotIssued { id: 14 },
                Unresolved::NotFound { target: rfc(15) },
            ]
        );
        assert_eq!(
            env.facade().lookup(DocType::Rfc, 14).unwrap(),
            Some(Document::NotIssued { id: 14 })
        );
    }
}

// =============================================================================
// Search
// =============================================================================

mod search_tests {
    use super::*;

    #[test]
    fn author_wildcard() {
        let env = TestStore::new();
        let docs = env
            .facade()
            .search_by_author(&AuthorQuery::names(["*Crocker"]))
            .unwrap();
        assert_eq!(ids(&docs), vec![10, 24, 27, 30]);
    }

    #[test]
    fn author_intersection() {
        let env = TestStore::new();
        let facade = env.facade();
        let both = facade
            .search_by_author(&AuthorQuery::names(["*Pister*", "*Watteyne*"]))
            .unwrap();
        assert_eq!(ids(&both), vec![8180]);

        let none = facade
            .search_by_author(&AuthorQuery::names(["S.D. Crocker", "*Watteyne*"]))
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn title_exact_then_wildcard() {
        let env = TestStore::new();
        let facade = env.facade();
        assert_eq!(
            ids(&facade.search_by_title(&["Documentation conventions"]).unwrap()),
            vec![10]
        );
        assert_eq!(
            ids(&facade.search_by_title(&["documentation conventions"]).unwrap()),
            vec![10, 24, 27, 30]
        );
    }

    #[test]
    fn keyword_search() {
        let env = TestStore::new();
        let facade = env.facade();
        assert_eq!(ids(&facade.search_by_keyword(&["One"]).unwrap()), vec![10, 8174]);
        assert!(facade.search_by_keyword(&["DNE"]).unwrap().is_empty());
    }
}
