//! Query façade used by the command-line and MCP layers.
//!
//! Wraps the resolution engine and turns "nothing there" into an explicit
//! [`Unresolved`] reason per requested number, so callers can tell a
//! number that was never assigned from one that was reserved and skipped.

use std::fmt;

use serde::Serialize;

use crate::document::{DocKind, DocRef, DocType, Document};
use crate::resolve::{self, Target, TargetKey, UpdatePolicy, dedupe_by_key, dedupe_preserve_order};
use crate::search::{self, AuthorQuery};
use crate::storage::{DocumentStore, StorageError};

/// What to do with each requested number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// The document itself.
    #[default]
    Lookup,
    /// Its current version, via `updated_by`.
    Current,
    /// The end of its `obsoleted_by` chain.
    Obsoleting,
    /// Its `is_also` aliases.
    Aliases,
    /// Its `see_also` references.
    SeeAlso,
}

/// One entry of a query result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Found {
    Document(Document),
    /// An edge target with no store table, passed through as written.
    Reference(DocRef),
}

impl Found {
    fn key(&self) -> TargetKey {
        match self {
            Self::Document(doc) => TargetKey::Stored(doc.kind(), doc.id()),
            Self::Reference(r) => TargetKey::Reference(*r),
        }
    }

    #[must_use]
    pub fn document(&self) -> Option<&Document> {
        match self {
            Self::Document(doc) => Some(doc),
            Self::Reference(_) => None,
        }
    }
}

impl fmt::Display for Found {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document(doc) => doc.fmt(f),
            Self::Reference(r) => writeln!(f, "{r}"),
        }
    }
}

/// Why a requested number produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Unresolved {
    NotFound { target: DocRef },
    NotIssued { id: u32 },
    Dangling { from: DocRef, to: DocRef },
    /// An edge whose RFC target was reserved but never issued.
    DanglingNotIssued { from: DocRef, to: DocRef },
}

impl fmt::Display for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { target } => write!(f, "{target} does not exist."),
            Self::NotIssued { id } => write!(f, "RFC {id} was reserved but never issued."),
            Self::Dangling { from, to } => {
                write!(f, "{from} resolves to {to}, which does not exist.")
            }
            Self::DanglingNotIssued { from, to } => {
                write!(f, "{from} resolves to {to}, which was reserved but never issued.")
            }
        }
    }
}

/// Documents found plus a reason for every number that yielded nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub found: Vec<Found>,
    pub unresolved: Vec<Unresolved>,
}

/// Read-only query entry point over a store.
pub struct QueryFacade<'s, S> {
    store: &'s S,
    policy: UpdatePolicy,
}

impl<'s, S: DocumentStore> QueryFacade<'s, S> {
    #[must_use]
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            policy: UpdatePolicy::default(),
        }
    }

    /// Use `policy` when resolving current versions.
    #[must_use]
    pub fn with_policy(mut self, policy: UpdatePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Point lookup, including the not-issued set for RFC numbers.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    pub fn lookup(&self, doc_type: DocType, id: u32) -> Result<Option<Document>, StorageError> {
        if let Some(doc) = resolve::lookup(self.store, doc_type, id)? {
            return Ok(Some(doc));
        }
        if doc_type == DocType::Rfc {
            return self.store.document(DocKind::NotIssued, id);
        }
        Ok(None)
    }

    /// Current version of RFC `id`, or `None` if it resolves to nothing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    pub fn resolve_current(&self, id: u32) -> Result<Option<Document>, StorageError> {
        let target = resolve::resolve_current(self.store, DocType::Rfc, id, self.policy)?;
        Ok(target.and_then(into_document))
    }

    /// Last document of RFC `id`'s `obsoleted_by` chain.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    pub fn resolve_obsoleting(&self, id: u32) -> Result<Option<Document>, StorageError> {
        let target = resolve::resolve_obsoleting(self.store, DocType::Rfc, id)?;
        Ok(target.and_then(into_document))
    }

    /// Aliases of RFC `id`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    pub fn resolve_aliases(&self, id: u32) -> Result<Outcome, StorageError> {
        self.resolve(DocType::Rfc, &[id], Mode::Aliases)
    }

    /// Resolve every number in `ids` (duplicates ignored) under `mode`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    pub fn resolve(&self, doc_type: DocType, ids: &[u32], mode: Mode) -> Result<Outcome, StorageError> {
        let mut outcome = Outcome::default();
        for id in dedupe_preserve_order(ids.iter().copied()) {
            let subject = DocRef::new(doc_type, id);
            let targets = match mode {
                Mode::Lookup => {
                    resolve::lookup(self.store, doc_type, id)?.map(|doc| vec![Target::Found(doc)])
                }
                Mode::Current => {
                    resolve::resolve_current(self.store, doc_type, id, self.policy)?.map(|t| vec![t])
                }
                Mode::Obsoleting => {
                    resolve::resolve_obsoleting(self.store, doc_type, id)?.map(|t| vec![t])
                }
                Mode::Aliases => resolve::resolve_aliases(self.store, doc_type, id)?,
                Mode::SeeAlso => resolve::resolve_see_also(self.store, doc_type, id)?,
            };
            let Some(targets) = targets else {
                outcome.unresolved.push(self.absent(subject)?);
                continue;
            };
            for target in targets {
                match target {
                    Target::Found(doc) => outcome.found.push(Found::Document(doc)),
                    Target::Undispatched(r) => outcome.found.push(Found::Reference(r)),
                    Target::Missing(to) => outcome.unresolved.push(self.dangling(subject, to)?),
                }
            }
        }
        outcome.found = dedupe_by_key(outcome.found, Found::key);
        Ok(outcome)
    }

    fn is_not_issued(&self, r: DocRef) -> Result<bool, StorageError> {
        if r.doc_type != DocType::Rfc {
            return Ok(false);
        }
        Ok(self.store.document(DocKind::NotIssued, r.id)?.is_some())
    }

    /// Reason for `subject` not being in the store.
    fn absent(&self, subject: DocRef) -> Result<Unresolved, StorageError> {
        if self.is_not_issued(subject)? {
            return Ok(Unresolved::NotIssued { id: subject.id });
        }
        Ok(Unresolved::NotFound { target: subject })
    }

    /// Reason for an edge from `from` leading to nothing stored.
    fn dangling(&self, from: DocRef, to: DocRef) -> Result<Unresolved, StorageError> {
        if self.is_not_issued(to)? {
            return Ok(Unresolved::DanglingNotIssued { from, to });
        }
        Ok(Unresolved::Dangling { from, to })
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    pub fn search_by_author(&self, query: &AuthorQuery) -> Result<Vec<Document>, StorageError> {
        search::search_by_author(self.store, query)
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    pub fn search_by_title<T: AsRef<str>>(&self, titles: &[T]) -> Result<Vec<Document>, StorageError> {
        search::search_by_title(self.store, titles)
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    pub fn search_by_keyword<T: AsRef<str>>(&self, words: &[T]) -> Result<Vec<Document>, StorageError> {
        search::search_by_keyword(self.store, words)
    }
}

fn into_document(target: Target) -> Option<Document> {
    match target {
        Target::Found(doc) => Some(doc),
        Target::Missing(_) | Target::Undispatched(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Date, Month, Rfc, Series};
    use crate::storage::DocumentSink;
    use crate::storage::sqlite::SqliteStore;

    fn rfc(id: u32) -> Rfc {
        Rfc::new(
            id,
            format!("RFC {id}"),
            Date {
                year: 1990,
                month: Month::October,
                day: None,
            },
        )
    }

    fn store() -> SqliteStore {
        let mut a = rfc(1);
        a.updated_by = vec![DocRef::new(DocType::Rfc, 2)];
        a.obsoleted_by = vec![DocRef::new(DocType::Rfc, 404)];
        a.is_also = vec![
            DocRef::new(DocType::Std, 7),
            DocRef::new(DocType::Rtr, 3),
            DocRef::new(DocType::Fyi, 9),
        ];
        let mut b = rfc(2);
        b.is_also = vec![DocRef::new(DocType::Std, 7)];

        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut refresh = store.begin_refresh().unwrap();
        for doc in [
            a.into(),
            b.into(),
            Document::Std(Series {
                id: 7,
                title: Some("Seven".to_string()),
            }),
            Document::NotIssued { id: 14 },
        ] {
            refresh.add_document(&doc).unwrap();
        }
        refresh.commit().unwrap();
        store
    }

    fn found_ids(outcome: &Outcome) -> Vec<(DocKind, u32)> {
        outcome
            .found
            .iter()
            .filter_map(Found::document)
            .map(|doc| (doc.kind(), doc.id()))
            .collect()
    }

    mod lookup_tests {
        use super::*;

        #[test]
        fn distinguishes_not_found_from_not_issued() {
            let store = store();
            let facade = QueryFacade::new(&store);
            let outcome = facade.resolve(DocType::Rfc, &[14, 15], Mode::Lookup).unwrap();
            assert!(outcome.found.is_empty());
            assert_eq!(
                outcome.unresolved,
                vec![
                    Unresolved::NotIssued { id: 14 },
                    Unresolved::NotFound {
                        target: DocRef::new(DocType::Rfc, 15)
                    },
                ]
            );
        }

        #[test]
        fn lookup_returns_not_issued_marker() {
            let store = store();
            let facade = QueryFacade::new(&store);
            assert_eq!(
                facade.lookup(DocType::Rfc, 14).unwrap(),
                Some(Document::NotIssued { id: 14 })
            );
            assert_eq!(facade.lookup(DocType::Std, 14).unwrap(), None);
        }

        #[test]
        fn duplicate_numbers_are_resolved_once() {
            let store = store();
            let facade = QueryFacade::new(&store);
            let outcome = facade.resolve(DocType::Rfc, &[2, 1, 2, 99, 99], Mode::Lookup).unwrap();
            assert_eq!(found_ids(&outcome), vec![(DocKind::Rfc, 2), (DocKind::Rfc, 1)]);
            assert_eq!(outcome.unresolved.len(), 1);
        }

        #[test]
        fn series_lookup() {
            let store = store();
            let facade = QueryFacade::new(&store);
            let outcome = facade.resolve(DocType::Std, &[7], Mode::Lookup).unwrap();
            assert_eq!(found_ids(&outcome), vec![(DocKind::Std, 7)]);
        }
    }

    mod resolve_tests {
        use super::*;

        #[test]
        fn current_version() {
            let store = store();
            let facade = QueryFacade::new(&store);
            assert_eq!(facade.resolve_current(1).unwrap().map(|d| d.id()), Some(2));
            assert_eq!(facade.resolve_current(2).unwrap().map(|d| d.id()), Some(2));
            assert_eq!(facade.resolve_current(3).unwrap(), None);
        }

        #[test]
        fn current_collapses_to_one_entry() {
            let store = store();
            let facade = QueryFacade::new(&store);
            let outcome = facade.resolve(DocType::Rfc, &[1, 2], Mode::Current).unwrap();
            assert_eq!(found_ids(&outcome), vec![(DocKind::Rfc, 2)]);
        }

        #[test]
        fn dangling_obsoleted_by_is_reported() {
            let store = store();
            let facade = QueryFacade::new(&store);
            assert_eq!(facade.resolve_obsoleting(1).unwrap(), None);

            let outcome = facade.resolve(DocType::Rfc, &[1], Mode::Obsoleting).unwrap();
            assert!(outcome.found.is_empty());
            assert_eq!(
                outcome.unresolved,
                vec![Unresolved::Dangling {
                    from: DocRef::new(DocType::Rfc, 1),
                    to: DocRef::new(DocType::Rfc, 404),
                }]
            );
            assert_eq!(
                outcome.unresolved[0].to_string(),
                "RFC 1 resolves to RFC 404, which does not exist."
            );
        }

        #[test]
        fn edge_to_not_issued_number_keeps_its_reason() {
            let mut a = rfc(1);
            a.updated_by = vec![DocRef::new(DocType::Rfc, 14)];
            a.see_also = vec![DocRef::new(DocType::Rfc, 14), DocRef::new(DocType::Rfc, 15)];
            let mut store = SqliteStore::open_in_memory().unwrap();
            let mut refresh = store.begin_refresh().unwrap();
            refresh.add_document(&a.into()).unwrap();
            refresh.add_document(&Document::NotIssued { id: 14 }).unwrap();
            refresh.commit().unwrap();

            let facade = QueryFacade::new(&store);
            let from = DocRef::new(DocType::Rfc, 1);
            let to = DocRef::new(DocType::Rfc, 14);

            let current = facade.resolve(DocType::Rfc, &[1], Mode::Current).unwrap();
            assert!(current.found.is_empty());
            assert_eq!(current.unresolved, vec![Unresolved::DanglingNotIssued { from, to }]);
            assert_eq!(
                current.unresolved[0].to_string(),
                "RFC 1 resolves to RFC 14, which was reserved but never issued."
            );

            let see_also = facade.resolve(DocType::Rfc, &[1], Mode::SeeAlso).unwrap();
            assert_eq!(
                see_also.unresolved,
                vec![
                    Unresolved::DanglingNotIssued { from, to },
                    Unresolved::Dangling {
                        from,
                        to: DocRef::new(DocType::Rfc, 15),
                    },
                ]
            );
        }

        #[test]
        fn aliases_mix_documents_references_and_dangling() {
            let store = store();
            let facade = QueryFacade::new(&store);
            let outcome = facade.resolve_aliases(1).unwrap();
            assert_eq!(
                outcome.found,
                vec![
                    Found::Document(Document::Std(Series {
                        id: 7,
                        title: Some("Seven".to_string()),
                    })),
                    Found::Reference(DocRef::new(DocType::Rtr, 3)),
                ]
            );
            assert_eq!(outcome.unresolved.len(), 1);
        }

        #[test]
        fn std_aliases_are_declaring_rfcs() {
            let store = store();
            let facade = QueryFacade::new(&store);
            let outcome = facade.resolve(DocType::Std, &[7, 8], Mode::Aliases).unwrap();
            assert_eq!(
                found_ids(&outcome),
                vec![(DocKind::Rfc, 1), (DocKind::Rfc, 2)]
            );
            assert!(outcome.unresolved.contains(&Unresolved::NotFound {
                target: DocRef::new(DocType::Std, 8)
            }));
        }
    }

    #[test]
    fn reason_messages() {
        assert_eq!(
            Unresolved::NotFound {
                target: DocRef::new(DocType::Bcp, 5)
            }
            .to_string(),
            "BCP 5 does not exist."
        );
        assert_eq!(
            Unresolved::NotIssued { id: 14 }.to_string(),
            "RFC 14 was reserved but never issued."
        );
    }

    #[test]
    fn searches_delegate_to_store() {
        let store = store();
        let facade = QueryFacade::new(&store);
        let titles = facade.search_by_title(&["RFC *"]).unwrap();
        assert_eq!(titles.len(), 2);
        assert!(facade.search_by_keyword(&["DNE"]).unwrap().is_empty());
        assert!(facade.search_by_author(&AuthorQuery::default()).unwrap().is_empty());
    }
}
