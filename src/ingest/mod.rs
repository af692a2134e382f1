//! XML index ingestion.
//!
//! Walks a parsed `rfc-index` tree and hands every entry to a
//! [`DocumentSink`]. Any malformed entry aborts the whole batch; the caller
//! decides whether to commit.

use std::str::FromStr;

use roxmltree::Node;
use tracing::info;

use crate::document::{Author, Date, DocKind, DocRef, Document, EdgeKind, FileFormat, Rfc, Series};
use crate::storage::sqlite::SqliteStore;
use crate::storage::{DocumentSink, StorageError};

pub use crate::document::ParseError;

/// Namespace of the RFC Editor's index.
pub const NAMESPACE: &str = "http://www.rfc-editor.org/rfc-index";

const ROOT_ELEMENT: &str = "rfc-index";

/// Entry kinds in the order they are registered.
const INGEST_ORDER: [DocKind; 5] = [
    DocKind::Bcp,
    DocKind::Fyi,
    DocKind::NotIssued,
    DocKind::Rfc,
    DocKind::Std,
];

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Number of entries registered per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub rfc: usize,
    pub std: usize,
    pub bcp: usize,
    pub fyi: usize,
    pub not_issued: usize,
}

impl IngestStats {
    fn bump(&mut self, kind: DocKind) {
        match kind {
            DocKind::Rfc => self.rfc += 1,
            DocKind::Std => self.std += 1,
            DocKind::Bcp => self.bcp += 1,
            DocKind::Fyi => self.fyi += 1,
            DocKind::NotIssued => self.not_issued += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.rfc + self.std + self.bcp + self.fyi + self.not_issued
    }
}

/// Child-element accessors scoped to one namespace.
#[derive(Clone, Copy)]
struct Element<'a, 'input, 'n> {
    node: Node<'a, 'input>,
    ns: &'n str,
}

impl<'a, 'input, 'n> Element<'a, 'input, 'n> {
    fn new(node: Node<'a, 'input>, ns: &'n str) -> Self {
        Self { node, ns }
    }

    fn children(self, name: &'static str) -> impl Iterator<Item = Self> {
        let ns = self.ns;
        self.node
            .children()
            .filter(move |child| child.has_tag_name((ns, name)))
            .map(move |node| Self { node, ns })
    }

    fn child(self, name: &'static str) -> Option<Self> {
        self.children(name).next()
    }

    /// Trimmed text content; whitespace-only counts as absent.
    fn text(self) -> Option<&'a str> {
        self.node.text().map(str::trim).filter(|t| !t.is_empty())
    }

    fn optional(self, name: &'static str) -> Option<String> {
        self.child(name).and_then(Self::text).map(str::to_string)
    }

    fn required(self, name: &'static str) -> Result<&'a str, ParseError> {
        self.child(name)
            .and_then(Self::text)
            .ok_or(ParseError::MissingField(name))
    }

    fn number<T: FromStr>(self, name: &'static str) -> Result<Option<T>, ParseError> {
        self.child(name)
            .and_then(Self::text)
            .map(|text| {
                text.parse().map_err(|_| ParseError::InvalidField {
                    field: name,
                    value: text.to_string(),
                })
            })
            .transpose()
    }

    fn parse<T: FromStr<Err = ParseError>>(self, name: &'static str) -> Result<T, ParseError> {
        self.required(name)?.parse()
    }

    /// `doc-id` children of the `name` container, in document order.
    fn refs(self, name: &'static str) -> Result<Vec<DocRef>, ParseError> {
        let Some(list) = self.child(name) else {
            return Ok(vec![]);
        };
        list.children("doc-id")
            .filter_map(Self::text)
            .map(str::parse)
            .collect()
    }
}

fn parse_id(entry: Element<'_, '_, '_>, kind: DocKind) -> Result<u32, ParseError> {
    let text = entry.required("doc-id")?;
    let doc_ref: DocRef = text.parse()?;
    if doc_ref.doc_type != kind.doc_type() {
        return Err(ParseError::InvalidField {
            field: "doc-id",
            value: text.to_string(),
        });
    }
    Ok(doc_ref.id)
}

fn parse_date(entry: Element<'_, '_, '_>) -> Result<Date, ParseError> {
    let date = entry.child("date").ok_or(ParseError::MissingField("date"))?;
    let year = date
        .number("year")?
        .ok_or(ParseError::MissingField("year"))?;
    let month = date.parse("month")?;
    let day = date.number::<u8>("day")?;
    if let Some(day) = day.filter(|d| !(1..=31).contains(d)) {
        return Err(ParseError::InvalidField {
            field: "day",
            value: day.to_string(),
        });
    }
    Ok(Date { year, month, day })
}

fn parse_author(author: Element<'_, '_, '_>) -> Result<Author, ParseError> {
    Ok(Author {
        name: author.required("name")?.to_string(),
        title: author.optional("title"),
        organization: author.optional("organization"),
        org_abbrev: author.optional("org-abbrev"),
    })
}

fn parse_format(format: Element<'_, '_, '_>) -> Result<FileFormat, ParseError> {
    Ok(FileFormat {
        file_type: format.parse("file-format")?,
        char_count: format
            .number("char-count")?
            .ok_or(ParseError::MissingField("char-count"))?,
        page_count: format.number("page-count")?,
    })
}

fn paragraphs(entry: Element<'_, '_, '_>, container: &'static str, item: &'static str) -> Vec<String> {
    entry
        .child(container)
        .map(|list| {
            list.children(item)
                .filter_map(Element::text)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_rfc(entry: Element<'_, '_, '_>) -> Result<Rfc, ParseError> {
    let mut rfc = Rfc::new(
        parse_id(entry, DocKind::Rfc)?,
        entry.required("title")?,
        parse_date(entry)?,
    );
    rfc.authors = entry
        .children("author")
        .map(parse_author)
        .collect::<Result<_, _>>()?;
    rfc.formats = entry
        .children("format")
        .map(parse_format)
        .collect::<Result<_, _>>()?;
    rfc.keywords = paragraphs(entry, "keywords", "kw");
    rfc.abstract_paragraphs = paragraphs(entry, "abstract", "p");
    rfc.draft = entry.optional("draft");
    rfc.notes = entry.optional("notes");
    for &kind in EdgeKind::ALL {
        *rfc.edges_mut(kind) = entry.refs(kind.element())?;
    }
    rfc.current_status = entry.parse("current-status")?;
    rfc.publication_status = entry.parse("publication-status")?;
    rfc.stream = entry
        .child("stream")
        .and_then(Element::text)
        .map(str::parse)
        .transpose()?;
    rfc.area = entry.optional("area");
    rfc.wg_acronym = entry.optional("wg_acronym");
    rfc.errata_url = entry.optional("errata-url");
    rfc.doi = entry.optional("doi");
    Ok(rfc)
}

fn parse_series(entry: Element<'_, '_, '_>, kind: DocKind) -> Result<Series, ParseError> {
    Ok(Series {
        id: parse_id(entry, kind)?,
        title: entry.optional("title"),
    })
}

/// Parse one `<...-entry>` element of the given kind.
///
/// # Errors
///
/// Returns `ParseError::InEntry` naming the entry's `doc-id` when a
/// mandatory field is missing or malformed.
pub fn parse_entry(node: Node<'_, '_>, ns: &str, kind: DocKind) -> Result<Document, ParseError> {
    let entry = Element::new(node, ns);
    let parsed = match kind {
        DocKind::Rfc => parse_rfc(entry).map(Document::from),
        DocKind::Std => parse_series(entry, kind).map(Document::Std),
        DocKind::Bcp => parse_series(entry, kind).map(Document::Bcp),
        DocKind::Fyi => parse_series(entry, kind).map(Document::Fyi),
        DocKind::NotIssued => parse_id(entry, kind).map(|id| Document::NotIssued { id }),
    };
    parsed.map_err(|err| {
        let label = entry
            .child("doc-id")
            .and_then(Element::text)
            .unwrap_or(kind.entry_element());
        err.in_entry(label)
    })
}

/// Register every entry under `root` with `sink`.
///
/// Does not commit.
///
/// # Errors
///
/// Returns `IngestError::Parse` on the first malformed entry and
/// `IngestError::Storage` if the sink rejects a document.
pub fn add_all(
    sink: &mut impl DocumentSink,
    root: Node<'_, '_>,
    ns: &str,
) -> Result<IngestStats, IngestError> {
    let mut stats = IngestStats::default();
    for kind in INGEST_ORDER {
        let element = kind.entry_element();
        for node in root.children().filter(|n| n.has_tag_name((ns, element))) {
            let document = parse_entry(node, ns, kind)?;
            sink.add_document(&document)?;
            stats.bump(kind);
        }
    }
    info!(
        rfc = stats.rfc,
        std = stats.std,
        bcp = stats.bcp,
        fyi = stats.fyi,
        not_issued = stats.not_issued,
        "Ingested index entries"
    );
    Ok(stats)
}

/// Replace the contents of `store` with the index in `xml`.
///
/// Runs in a single transaction: on any error the previous contents are
/// left untouched.
///
/// # Errors
///
/// Returns `IngestError::Parse` if the XML is malformed, is not an
/// `rfc-index` document, or contains a malformed entry.
pub fn refresh(store: &mut SqliteStore, xml: &str) -> Result<IngestStats, IngestError> {
    let tree = roxmltree::Document::parse(xml).map_err(ParseError::from)?;
    let root = tree.root_element();
    if !root.has_tag_name((NAMESPACE, ROOT_ELEMENT)) {
        return Err(ParseError::NotAnIndex(root.tag_name().name().to_string()).into());
    }

    let mut refresh = store.begin_refresh()?;
    let stats = add_all(&mut refresh, root, NAMESPACE)?;
    refresh.commit()?;
    Ok(stats)
}
