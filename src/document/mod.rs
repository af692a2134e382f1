//! Document records and relationship edges.
//!
//! A [`Document`] is one of five kinds. Rfcs carry the full bibliographic
//! record together with their outgoing edges; Std, Bcp and Fyi entries carry
//! only a number and an optional title; not-issued entries mark a reserved
//! RFC number.

mod vocab;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

pub use vocab::{DocType, FileType, Month, Status, Stream};

/// Errors raised while turning index text into typed values.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid doc-id '{0}': expected a 3-letter type prefix followed by digits")]
    InvalidDocId(String),

    #[error("unknown {vocabulary} '{value}'")]
    UnknownValue {
        vocabulary: &'static str,
        value: String,
    },

    #[error("missing mandatory element <{0}>")]
    MissingField(&'static str),

    #[error("invalid <{field}> value '{value}'")]
    InvalidField { field: &'static str, value: String },

    #[error("{entry}: {source}")]
    InEntry {
        entry: String,
        #[source]
        source: Box<ParseError>,
    },

    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("root element is <{0}>, not an rfc-index document")]
    NotAnIndex(String),
}

impl ParseError {
    /// Attach the entry being parsed to this error.
    #[must_use]
    pub fn in_entry(self, entry: &str) -> Self {
        Self::InEntry {
            entry: entry.to_string(),
            source: Box::new(self),
        }
    }
}

/// Reference to a document by type and number, as written in a `doc-id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DocRef {
    #[serde(rename = "type")]
    pub doc_type: DocType,
    pub id: u32,
}

impl DocRef {
    #[must_use]
    pub const fn new(doc_type: DocType, id: u32) -> Self {
        Self { doc_type, id }
    }
}

impl FromStr for DocRef {
    type Err = ParseError;

    /// Parse `RFC0010`-style identifiers.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidDocId(s.to_string());

        let prefix = s.get(..3).ok_or_else(invalid)?;
        let digits = &s[3..];
        let doc_type = DocType::from_prefix(prefix).ok_or_else(invalid)?;

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let id = digits.parse().map_err(|_| invalid())?;

        Ok(Self { doc_type, id })
    }
}

impl fmt::Display for DocRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.doc_type, self.id)
    }
}

/// The five kinds of stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum DocKind {
    Rfc,
    Std,
    Bcp,
    Fyi,
    NotIssued,
}

impl DocKind {
    /// The store kind holding documents of `doc_type`, if any.
    #[must_use]
    pub fn for_type(doc_type: DocType) -> Option<Self> {
        match doc_type {
            DocType::Rfc => Some(Self::Rfc),
            DocType::Std => Some(Self::Std),
            DocType::Bcp => Some(Self::Bcp),
            DocType::Fyi => Some(Self::Fyi),
            DocType::Nic | DocType::Ien | DocType::Rtr => None,
        }
    }

    /// The `<...-entry>` element name for this kind.
    #[must_use]
    pub const fn entry_element(self) -> &'static str {
        match self {
            Self::Rfc => "rfc-entry",
            Self::Std => "std-entry",
            Self::Bcp => "bcp-entry",
            Self::Fyi => "fyi-entry",
            Self::NotIssued => "rfc-not-issued-entry",
        }
    }

    /// The `doc-id` prefix documents of this kind are numbered under.
    #[must_use]
    pub const fn doc_type(self) -> DocType {
        match self {
            Self::Rfc | Self::NotIssued => DocType::Rfc,
            Self::Std => DocType::Std,
            Self::Bcp => DocType::Bcp,
            Self::Fyi => DocType::Fyi,
        }
    }
}

/// Store key of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DocKey {
    pub kind: DocKind,
    pub id: u32,
}

/// The kinds of relationship an Rfc can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Obsoletes,
    ObsoletedBy,
    Updates,
    UpdatedBy,
    IsAlso,
    SeeAlso,
}

impl EdgeKind {
    pub const ALL: &'static [Self] = &[
        Self::Obsoletes,
        Self::ObsoletedBy,
        Self::Updates,
        Self::UpdatedBy,
        Self::IsAlso,
        Self::SeeAlso,
    ];

    /// Column value used by the store.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Obsoletes => "obsoletes",
            Self::ObsoletedBy => "obsoleted_by",
            Self::Updates => "updates",
            Self::UpdatedBy => "updated_by",
            Self::IsAlso => "is_also",
            Self::SeeAlso => "see_also",
        }
    }

    /// Element name in the XML index.
    #[must_use]
    pub const fn element(self) -> &'static str {
        match self {
            Self::Obsoletes => "obsoletes",
            Self::ObsoletedBy => "obsoleted-by",
            Self::Updates => "updates",
            Self::UpdatedBy => "updated-by",
            Self::IsAlso => "is-also",
            Self::SeeAlso => "see-also",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Obsoletes => "Obsoletes",
            Self::ObsoletedBy => "Obsoleted By",
            Self::Updates => "Updates",
            Self::UpdatedBy => "Updated By",
            Self::IsAlso => "Is Also",
            Self::SeeAlso => "See Also",
        }
    }
}

impl FromStr for EdgeKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ParseError::UnknownValue {
                vocabulary: "edge kind",
                value: s.to_string(),
            })
    }
}

/// A directed relation declared by an Rfc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    pub source: u32,
    pub kind: EdgeKind,
    pub target: DocRef,
}

/// Publication date. Day is absent for most older documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Date {
    pub year: u16,
    pub month: Month,
    pub day: Option<u8>,
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month.number())?;
        if let Some(day) = self.day {
            write!(f, "-{day:02}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Author {
    pub name: String,
    pub title: Option<String>,
    pub organization: Option<String>,
    pub org_abbrev: Option<String>,
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for part in [&self.title, &self.organization, &self.org_abbrev]
            .into_iter()
            .flatten()
        {
            write!(f, ", {part}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileFormat {
    pub file_type: FileType,
    pub char_count: u64,
    pub page_count: Option<u32>,
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "filetype={}, char count={}",
            self.file_type, self.char_count
        )?;
        if let Some(pages) = self.page_count {
            write!(f, ", page count={pages}")?;
        }
        Ok(())
    }
}

/// A full RFC record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rfc {
    pub id: u32,
    pub title: String,
    pub authors: Vec<Author>,
    pub date: Date,
    pub formats: Vec<FileFormat>,
    pub keywords: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_paragraphs: Vec<String>,
    pub draft: Option<String>,
    pub notes: Option<String>,
    pub obsoletes: Vec<DocRef>,
    pub obsoleted_by: Vec<DocRef>,
    pub updates: Vec<DocRef>,
    pub updated_by: Vec<DocRef>,
    pub is_also: Vec<DocRef>,
    pub see_also: Vec<DocRef>,
    pub current_status: Status,
    pub publication_status: Status,
    pub stream: Option<Stream>,
    pub area: Option<String>,
    pub wg_acronym: Option<String>,
    pub errata_url: Option<String>,
    pub doi: Option<String>,
}

impl Rfc {
    /// A minimal record with no optional attributes and no edges.
    #[must_use]
    pub fn new(id: u32, title: impl Into<String>, date: Date) -> Self {
        Self {
            id,
            title: title.into(),
            authors: vec![],
            date,
            formats: vec![],
            keywords: vec![],
            abstract_paragraphs: vec![],
            draft: None,
            notes: None,
            obsoletes: vec![],
            obsoleted_by: vec![],
            updates: vec![],
            updated_by: vec![],
            is_also: vec![],
            see_also: vec![],
            current_status: Status::Unknown,
            publication_status: Status::Unknown,
            stream: None,
            area: None,
            wg_acronym: None,
            errata_url: None,
            doi: None,
        }
    }

    /// Targets of `kind`, in declaration order.
    #[must_use]
    pub fn edges(&self, kind: EdgeKind) -> &[DocRef] {
        match kind {
            EdgeKind::Obsoletes => &self.obsoletes,
            EdgeKind::ObsoletedBy => &self.obsoleted_by,
            EdgeKind::Updates => &self.updates,
            EdgeKind::UpdatedBy => &self.updated_by,
            EdgeKind::IsAlso => &self.is_also,
            EdgeKind::SeeAlso => &self.see_also,
        }
    }

    pub fn edges_mut(&mut self, kind: EdgeKind) -> &mut Vec<DocRef> {
        match kind {
            EdgeKind::Obsoletes => &mut self.obsoletes,
            EdgeKind::ObsoletedBy => &mut self.obsoleted_by,
            EdgeKind::Updates => &mut self.updates,
            EdgeKind::UpdatedBy => &mut self.updated_by,
            EdgeKind::IsAlso => &mut self.is_also,
            EdgeKind::SeeAlso => &mut self.see_also,
        }
    }

    /// The most recently declared edge of `kind`.
    #[must_use]
    pub fn last_edge(&self, kind: EdgeKind) -> Option<Edge> {
        self.edges(kind).last().map(|&target| Edge {
            source: self.id,
            kind,
            target,
        })
    }
}

/// A Std, Bcp or Fyi entry: a number in its own series, optionally titled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Series {
    pub id: u32,
    pub title: Option<String>,
}

/// Any stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Document {
    Rfc(Box<Rfc>),
    Std(Series),
    Bcp(Series),
    Fyi(Series),
    NotIssued { id: u32 },
}

impl Document {
    #[must_use]
    pub fn kind(&self) -> DocKind {
        match self {
            Self::Rfc(_) => DocKind::Rfc,
            Self::Std(_) => DocKind::Std,
            Self::Bcp(_) => DocKind::Bcp,
            Self::Fyi(_) => DocKind::Fyi,
            Self::NotIssued { .. } => DocKind::NotIssued,
        }
    }

    #[must_use]
    pub fn id(&self) -> u32 {
        match self {
            Self::Rfc(rfc) => rfc.id,
            Self::Std(s) | Self::Bcp(s) | Self::Fyi(s) => s.id,
            Self::NotIssued { id } => *id,
        }
    }

    #[must_use]
    pub fn key(&self) -> DocKey {
        DocKey {
            kind: self.kind(),
            id: self.id(),
        }
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Rfc(rfc) => Some(&rfc.title),
            Self::Std(s) | Self::Bcp(s) | Self::Fyi(s) => s.title.as_deref(),
            Self::NotIssued { .. } => None,
        }
    }

    #[must_use]
    pub fn as_rfc(&self) -> Option<&Rfc> {
        match self {
            Self::Rfc(rfc) => Some(rfc),
            _ => None,
        }
    }
}

impl From<Rfc> for Document {
    fn from(rfc: Rfc) -> Self {
        Self::Rfc(Box::new(rfc))
    }
}

/// Writes one `Label : value` line with the label left-aligned in 18 columns.
fn line(f: &mut fmt::Formatter<'_>, label: &str, value: impl fmt::Display) -> fmt::Result {
    writeln!(f, "{label:<18} : {value}")
}

/// Truncated paragraph preview so a record stays within 80 columns.
fn preview(par: &str) -> String {
    let head: String = par.chars().take(55).collect();
    format!("{head}...")
}

impl fmt::Display for Rfc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        line(f, "RFC", format_args!("{:04}", self.id))?;
        line(f, "Title", &self.title)?;
        for author in &self.authors {
            line(f, "Author", author)?;
        }
        line(f, "Date", self.date)?;
        for format in &self.formats {
            line(f, "Format", format)?;
        }
        for keyword in &self.keywords {
            line(f, "Keyword", keyword)?;
        }
        for par in &self.abstract_paragraphs {
            line(f, "Abstract", preview(par))?;
        }
        if let Some(draft) = &self.draft {
            line(f, "Draft", draft)?;
        }
        if let Some(notes) = &self.notes {
            line(f, "Note", notes)?;
        }
        for &kind in EdgeKind::ALL {
            for target in self.edges(kind) {
                line(f, kind.label(), target)?;
            }
        }
        line(f, "Current Status", self.current_status)?;
        line(f, "Publication Status", self.publication_status)?;
        if let Some(stream) = self.stream {
            line(f, "Stream", stream)?;
        }
        for (label, value) in [
            ("Area", &self.area),
            ("WG Acronym", &self.wg_acronym),
            ("Errata URL", &self.errata_url),
            ("DOI", &self.doi),
        ] {
            if let Some(value) = value {
                line(f, label, value)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rfc(rfc) => rfc.fmt(f),
            Self::Std(s) | Self::Bcp(s) | Self::Fyi(s) => {
                line(f, self.kind().doc_type().as_str(), format_args!("{:04}", s.id))?;
                if let Some(title) = &s.title {
                    line(f, "Title", title)?;
                }
                Ok(())
            }
            Self::NotIssued { id } => line(f, "RFC", format_args!("{id:04} (not issued)")),
        }
    }
}
