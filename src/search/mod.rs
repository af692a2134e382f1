//! Term search over Rfc authors, titles and keywords.
//!
//! Every term narrows the result: the sets matched by individual terms are
//! intersected. Results come back in ascending RFC number.

use std::collections::BTreeSet;

use tracing::debug;

use crate::document::{DocKind, Document};
use crate::storage::{DocumentStore, StorageError, TermMatch, TextField};

/// Author attribute to match against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorField {
    #[default]
    Name,
    Title,
    Organization,
    OrgAbbrev,
}

impl AuthorField {
    fn text_field(self) -> TextField {
        match self {
            Self::Name => TextField::AuthorName,
            Self::Title => TextField::AuthorTitle,
            Self::Organization => TextField::AuthorOrganization,
            Self::OrgAbbrev => TextField::AuthorOrgAbbrev,
        }
    }
}

/// Author search terms grouped by the attribute they target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorQuery {
    pub names: Vec<String>,
    pub titles: Vec<String>,
    pub organizations: Vec<String>,
    pub org_abbrevs: Vec<String>,
}

impl AuthorQuery {
    /// A query matching author names only.
    #[must_use]
    pub fn names<I, T>(names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    fn terms(&self) -> impl Iterator<Item = (AuthorField, &str)> {
        [
            (AuthorField::Name, &self.names),
            (AuthorField::Title, &self.titles),
            (AuthorField::Organization, &self.organizations),
            (AuthorField::OrgAbbrev, &self.org_abbrevs),
        ]
        .into_iter()
        .flat_map(|(field, terms)| terms.iter().map(move |term| (field, term.as_str())))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms().next().is_none()
    }
}

/// Rfcs matching one term: exact first, then wildcard if nothing matched.
fn match_term(
    store: &impl DocumentStore,
    field: TextField,
    term: &str,
) -> Result<BTreeSet<u32>, StorageError> {
    let exact = store.rfcs_matching(field, term, TermMatch::Exact)?;
    if !exact.is_empty() {
        return Ok(exact);
    }
    debug!(term, "no exact match, retrying as wildcard");
    store.rfcs_matching(field, term, TermMatch::Wildcard)
}

/// Intersect the per-term sets. No terms means no results.
fn intersect_all<I>(sets: I) -> Result<BTreeSet<u32>, StorageError>
where
    I: IntoIterator<Item = Result<BTreeSet<u32>, StorageError>>,
{
    let mut result: Option<BTreeSet<u32>> = None;
    for set in sets {
        let set = set?;
        let narrowed = match result {
            None => set,
            Some(prev) => prev.intersection(&set).copied().collect(),
        };
        if narrowed.is_empty() {
            return Ok(narrowed);
        }
        result = Some(narrowed);
    }
    Ok(result.unwrap_or_default())
}

fn load_rfcs(store: &impl DocumentStore, ids: BTreeSet<u32>) -> Result<Vec<Document>, StorageError> {
    let mut docs = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(doc) = store.document(DocKind::Rfc, id)? {
            docs.push(doc);
        }
    }
    Ok(docs)
}

/// Rfcs with an author matching every term of `query`.
///
/// Terms may match different authors of the same Rfc.
///
/// # Errors
///
/// Returns `StorageError` if the store cannot be read.
pub fn search_by_author(
    store: &impl DocumentStore,
    query: &AuthorQuery,
) -> Result<Vec<Document>, StorageError> {
    let ids = intersect_all(
        query
            .terms()
            .map(|(field, term)| match_term(store, field.text_field(), term)),
    )?;
    load_rfcs(store, ids)
}

/// Rfcs whose title matches every term.
///
/// # Errors
///
/// Returns `StorageError` if the store cannot be read.
pub fn search_by_title<T: AsRef<str>>(
    store: &impl DocumentStore,
    titles: &[T],
) -> Result<Vec<Document>, StorageError> {
    let ids = intersect_all(
        titles
            .iter()
            .map(|title| match_term(store, TextField::RfcTitle, title.as_ref())),
    )?;
    load_rfcs(store, ids)
}

/// Rfcs tagged with every keyword, compared case-insensitively.
///
/// # Errors
///
/// Returns `StorageError` if the store cannot be read.
pub fn search_by_keyword<T: AsRef<str>>(
    store: &impl DocumentStore,
    words: &[T],
) -> Result<Vec<Document>, StorageError> {
    let ids = intersect_all(
        words
            .iter()
            .map(|word| store.rfcs_with_keyword(word.as_ref())),
    )?;
    load_rfcs(store, ids)
}
