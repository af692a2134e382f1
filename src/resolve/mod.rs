//! Edge traversal over the document graph.
//!
//! Every function takes the store explicitly and only reads from it. The
//! subject document being absent is reported as `None`; an edge leading
//! nowhere is reported as [`Target::Missing`].

use std::collections::HashSet;
use std::hash::Hash;

use tracing::{debug, warn};

use crate::document::{Date, DocKind, DocRef, DocType, Document, EdgeKind};
use crate::storage::{DocumentStore, StorageError};

/// Tie-break used by [`resolve_current`] when an Rfc has several
/// `updated_by` edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpdatePolicy {
    /// The edge declared last in the index.
    #[default]
    LastDeclared,
    /// The updating Rfc with the newest publication date. Falls back to
    /// `LastDeclared` when none of the targets is a stored Rfc.
    LatestByDate,
}

/// Where an edge leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Found(Document),
    /// A dispatchable type whose number is not in the store.
    Missing(DocRef),
    /// A type with no store table (NIC, IEN, RTR).
    Undispatched(DocRef),
}

impl Target {
    #[must_use]
    pub fn document(&self) -> Option<&Document> {
        match self {
            Self::Found(doc) => Some(doc),
            Self::Missing(_) | Self::Undispatched(_) => None,
        }
    }
}

/// Resolve an edge target through the store table for its type.
///
/// # Errors
///
/// Returns `StorageError` if the store cannot be read.
pub fn dispatch(store: &impl DocumentStore, target: DocRef) -> Result<Target, StorageError> {
    let Some(kind) = DocKind::for_type(target.doc_type) else {
        return Ok(Target::Undispatched(target));
    };
    Ok(match store.document(kind, target.id)? {
        Some(doc) => Target::Found(doc),
        None => {
            debug!(%target, "dangling edge target");
            Target::Missing(target)
        }
    })
}

/// Point lookup by type and number. Types without a table yield `None`.
///
/// Not-issued numbers are not consulted here.
///
/// # Errors
///
/// Returns `StorageError` if the store cannot be read.
pub fn lookup(
    store: &impl DocumentStore,
    doc_type: DocType,
    id: u32,
) -> Result<Option<Document>, StorageError> {
    match DocKind::for_type(doc_type) {
        Some(kind) => store.document(kind, id),
        None => Ok(None),
    }
}

/// The Rfc with the newest date among `targets`; ties go to the later edge.
fn newest_rfc(
    store: &impl DocumentStore,
    targets: &[DocRef],
) -> Result<Option<Document>, StorageError> {
    let mut newest: Option<(Date, Document)> = None;
    for &target in targets {
        let Target::Found(doc) = dispatch(store, target)? else {
            continue;
        };
        let Some(date) = doc.as_rfc().map(|rfc| rfc.date) else {
            continue;
        };
        if newest.as_ref().is_none_or(|(best, _)| date >= *best) {
            newest = Some((date, doc));
        }
    }
    Ok(newest.map(|(_, doc)| doc))
}

/// The current version of a document.
///
/// A document without `updated_by` edges is its own current version.
/// Otherwise the edge picked by `policy` is dispatched on its target type;
/// an undispatchable target yields the document itself. Only one hop is
/// taken.
///
/// # Errors
///
/// Returns `StorageError` if the store cannot be read.
pub fn resolve_current(
    store: &impl DocumentStore,
    doc_type: DocType,
    id: u32,
    policy: UpdatePolicy,
) -> Result<Option<Target>, StorageError> {
    let Some(doc) = lookup(store, doc_type, id)? else {
        return Ok(None);
    };
    let Some(rfc) = doc.as_rfc() else {
        return Ok(Some(Target::Found(doc)));
    };
    let Some(&last) = rfc.updated_by.last() else {
        return Ok(Some(Target::Found(doc)));
    };

    if policy == UpdatePolicy::LatestByDate {
        if let Some(newest) = newest_rfc(store, &rfc.updated_by)? {
            return Ok(Some(Target::Found(newest)));
        }
    }

    Ok(Some(match dispatch(store, last)? {
        Target::Undispatched(_) => Target::Found(doc),
        target => target,
    }))
}

/// Follow `obsoleted_by` edges, always taking the last declared one, until
/// reaching a document that nothing obsoletes.
///
/// Stops at the last document reached if the chain loops back on itself or
/// leads to an undispatchable type.
///
/// # Errors
///
/// Returns `StorageError` if the store cannot be read.
pub fn resolve_obsoleting(
    store: &impl DocumentStore,
    doc_type: DocType,
    id: u32,
) -> Result<Option<Target>, StorageError> {
    let Some(mut current) = lookup(store, doc_type, id)? else {
        return Ok(None);
    };
    let mut visited = HashSet::from([DocRef::new(doc_type, id)]);

    loop {
        let Some(next) = current
            .as_rfc()
            .and_then(|rfc| rfc.obsoleted_by.last().copied())
        else {
            return Ok(Some(Target::Found(current)));
        };
        if !visited.insert(next) {
            warn!(start = %DocRef::new(doc_type, id), at = %next, "obsoleted_by cycle");
            return Ok(Some(Target::Found(current)));
        }
        match dispatch(store, next)? {
            Target::Found(doc) => current = doc,
            Target::Undispatched(_) => return Ok(Some(Target::Found(current))),
            missing @ Target::Missing(_) => return Ok(Some(missing)),
        }
    }
}

/// Targets of every `kind` edge declared by Rfc `id`, dispatched in order.
fn expand_forward(
    store: &impl DocumentStore,
    id: u32,
    kind: EdgeKind,
) -> Result<Option<Vec<Target>>, StorageError> {
    let Some(doc) = store.document(DocKind::Rfc, id)? else {
        return Ok(None);
    };
    let targets = doc.as_rfc().map(|rfc| rfc.edges(kind)).unwrap_or_default();
    targets
        .iter()
        .map(|&target| dispatch(store, target))
        .collect::<Result<_, _>>()
        .map(Some)
}

/// Rfcs declaring a `kind` edge to `subject`, each followed by its own
/// `kind` targets other than `subject`.
fn expand_reverse(
    store: &impl DocumentStore,
    subject: DocRef,
    kind: EdgeKind,
) -> Result<Vec<Target>, StorageError> {
    let mut declaring = Vec::new();
    for rfc_id in store.rfcs_declaring(kind, subject)? {
        if let Some(doc) = store.document(DocKind::Rfc, rfc_id)? {
            declaring.push(doc);
        }
    }
    let mut others = Vec::new();
    for rfc in declaring.iter().filter_map(Document::as_rfc) {
        for &target in rfc.edges(kind) {
            if target != subject {
                others.push(dispatch(store, target)?);
            }
        }
    }
    let targets = declaring.into_iter().map(Target::Found).chain(others);
    Ok(dedupe_by_key(targets, target_key))
}

fn expand(
    store: &impl DocumentStore,
    doc_type: DocType,
    id: u32,
    kind: EdgeKind,
) -> Result<Option<Vec<Target>>, StorageError> {
    match doc_type {
        DocType::Rfc => expand_forward(store, id, kind),
        DocType::Std | DocType::Bcp | DocType::Fyi => {
            if lookup(store, doc_type, id)?.is_none() {
                return Ok(None);
            }
            expand_reverse(store, DocRef::new(doc_type, id), kind).map(Some)
        }
        DocType::Nic | DocType::Ien | DocType::Rtr => Ok(None),
    }
}

/// Aliases of a document.
///
/// For an Rfc, every `is_also` edge dispatched in declaration order, with
/// undispatchable targets passed through. For a Std, Bcp or Fyi, the Rfcs
/// that declare themselves to be it, followed by those Rfcs' other aliases.
///
/// # Errors
///
/// Returns `StorageError` if the store cannot be read.
pub fn resolve_aliases(
    store: &impl DocumentStore,
    doc_type: DocType,
    id: u32,
) -> Result<Option<Vec<Target>>, StorageError> {
    expand(store, doc_type, id, EdgeKind::IsAlso)
}

/// Like [`resolve_aliases`], over `see_also` edges.
///
/// # Errors
///
/// Returns `StorageError` if the store cannot be read.
pub fn resolve_see_also(
    store: &impl DocumentStore,
    doc_type: DocType,
    id: u32,
) -> Result<Option<Vec<Target>>, StorageError> {
    expand(store, doc_type, id, EdgeKind::SeeAlso)
}

/// Identity used to dedupe targets: the store key for found documents,
/// the raw reference otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKey {
    Stored(DocKind, u32),
    Reference(DocRef),
}

#[must_use]
pub fn target_key(target: &Target) -> TargetKey {
    match target {
        Target::Found(doc) => TargetKey::Stored(doc.kind(), doc.id()),
        Target::Missing(r) | Target::Undispatched(r) => TargetKey::Reference(*r),
    }
}

/// Drop items whose key was already seen, keeping first occurrences in
/// order.
pub fn dedupe_by_key<T, K, F>(items: impl IntoIterator<Item = T>, mut key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(key(item))).collect()
}

/// Remove duplicates, keeping the first-seen order.
pub fn dedupe_preserve_order<T: Eq + Hash + Clone>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    dedupe_by_key(items, T::clone)
}
