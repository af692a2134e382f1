//! SQLite-backed document store.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Transaction, params};
use tracing::debug;

use crate::document::{
    Author, Date, DocKind, DocRef, Document, EdgeKind, FileFormat, Month, Rfc, Series, Stream,
};
use crate::storage::{DocumentSink, DocumentStore, StorageError, TermMatch, TextField};

/// File name of the database inside the data directory.
pub const DB_FILENAME: &str = "rfc-index.sqlite3";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS rfc (
    id                 INTEGER PRIMARY KEY,
    title              TEXT NOT NULL,
    date_year          INTEGER NOT NULL,
    date_month         INTEGER NOT NULL CHECK (date_month BETWEEN 1 AND 12),
    date_day           INTEGER,
    draft              TEXT,
    notes              TEXT,
    current_status     TEXT NOT NULL,
    publication_status TEXT NOT NULL,
    stream             TEXT,
    area               TEXT,
    wg_acronym         TEXT,
    errata_url         TEXT,
    doi                TEXT
);
CREATE TABLE IF NOT EXISTS author (
    rfc_id       INTEGER NOT NULL REFERENCES rfc(id),
    position     INTEGER NOT NULL,
    name         TEXT NOT NULL,
    title        TEXT,
    organization TEXT,
    org_abbrev   TEXT,
    PRIMARY KEY (rfc_id, position)
);
CREATE TABLE IF NOT EXISTS format (
    rfc_id     INTEGER NOT NULL REFERENCES rfc(id),
    position   INTEGER NOT NULL,
    filetype   TEXT NOT NULL,
    char_count INTEGER NOT NULL,
    page_count INTEGER,
    PRIMARY KEY (rfc_id, position)
);
CREATE TABLE IF NOT EXISTS abstract (
    rfc_id   INTEGER NOT NULL REFERENCES rfc(id),
    position INTEGER NOT NULL,
    par      TEXT NOT NULL,
    PRIMARY KEY (rfc_id, position)
);
CREATE TABLE IF NOT EXISTS edge (
    rfc_id   INTEGER NOT NULL REFERENCES rfc(id),
    kind     TEXT NOT NULL,
    position INTEGER NOT NULL,
    doc_type TEXT NOT NULL,
    doc_id   INTEGER NOT NULL,
    PRIMARY KEY (rfc_id, kind, position)
);
CREATE TABLE IF NOT EXISTS keyword (
    id     INTEGER PRIMARY KEY,
    word   TEXT NOT NULL UNIQUE,
    folded TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS rfc_keyword (
    rfc_id     INTEGER NOT NULL REFERENCES rfc(id),
    keyword_id INTEGER NOT NULL REFERENCES keyword(id),
    position   INTEGER NOT NULL,
    PRIMARY KEY (rfc_id, keyword_id)
);
CREATE TABLE IF NOT EXISTS std (id INTEGER PRIMARY KEY, title TEXT);
CREATE TABLE IF NOT EXISTS bcp (id INTEGER PRIMARY KEY, title TEXT);
CREATE TABLE IF NOT EXISTS fyi (id INTEGER PRIMARY KEY, title TEXT);
CREATE TABLE IF NOT EXISTS rfc_not_issued (id INTEGER PRIMARY KEY);
CREATE INDEX IF NOT EXISTS edge_target ON edge (kind, doc_type, doc_id);
CREATE INDEX IF NOT EXISTS author_rfc ON author (rfc_id);
CREATE INDEX IF NOT EXISTS keyword_folded ON keyword (folded);
";

/// Children before parents so foreign keys hold at every step.
const CLEAR: &str = "
DELETE FROM rfc_keyword;
DELETE FROM keyword;
DELETE FROM edge;
DELETE FROM abstract;
DELETE FROM format;
DELETE FROM author;
DELETE FROM rfc;
DELETE FROM std;
DELETE FROM bcp;
DELETE FROM fyi;
DELETE FROM rfc_not_issued;
";

const fn table(kind: DocKind) -> &'static str {
    match kind {
        DocKind::Rfc => "rfc",
        DocKind::Std => "std",
        DocKind::Bcp => "bcp",
        DocKind::Fyi => "fyi",
        DocKind::NotIssued => "rfc_not_issued",
    }
}

/// Document store holding one SQLite connection.
///
/// Queries borrow the store immutably; a refresh borrows it mutably, so
/// the borrow checker keeps ingestion and querying apart.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path`, creating parent directories
    /// and the schema as needed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the directory or database cannot be created.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StorageError::CreateDir {
                path: parent.display().to_string(),
                source,
            })?;
        }
        Self::init(Connection::open(path)?)
    }

    /// Open a private in-memory store.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the schema cannot be created.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Start a refresh that replaces the whole store.
    ///
    /// Existing rows are cleared inside the transaction, so until
    /// [`Refresh::commit`] runs, readers of the file still see the previous
    /// contents, and dropping the refresh leaves them untouched.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the transaction cannot be started.
    pub fn begin_refresh(&mut self) -> Result<Refresh<'_>, StorageError> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(CLEAR)?;
        Ok(Refresh { tx })
    }

    /// Number of stored documents of `kind`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the table cannot be read.
    pub fn count(&self, kind: DocKind) -> Result<usize, StorageError> {
        let sql = format!("SELECT COUNT(*) FROM {}", table(kind));
        Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
    }

    /// Number of distinct keywords.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the table cannot be read.
    pub fn keyword_count(&self) -> Result<usize, StorageError> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM keyword", [], |row| row.get(0))?)
    }

    /// True when no document of any kind is stored, as in a database whose
    /// first refresh never committed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if a table cannot be read.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        for kind in [
            DocKind::Rfc,
            DocKind::Std,
            DocKind::Bcp,
            DocKind::Fyi,
            DocKind::NotIssued,
        ] {
            if self.count(kind)? > 0 {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn load_series(&self, kind: DocKind, id: u32) -> Result<Option<Series>, StorageError> {
        let sql = format!("SELECT title FROM {} WHERE id = ?1", table(kind));
        let title: Option<Option<String>> = self
            .conn
            .query_row(&sql, params![id], |row| row.get(0))
            .optional()?;
        Ok(title.map(|title| Series { id, title }))
    }

    fn load_not_issued(&self, id: u32) -> Result<Option<Document>, StorageError> {
        let found: Option<u32> = self
            .conn
            .query_row(
                "SELECT id FROM rfc_not_issued WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.map(|id| Document::NotIssued { id }))
    }

    fn load_rfc(&self, id: u32) -> Result<Option<Rfc>, StorageError> {
        let row = self
            .conn
            .query_row(
                "SELECT title, date_year, date_month, date_day, draft, notes,
                        current_status, publication_status, stream, area,
                        wg_acronym, errata_url, doi
                 FROM rfc WHERE id = ?1",
                params![id],
                |row| {
                    Ok(RfcRow {
                        title: row.get(0)?,
                        year: row.get(1)?,
                        month: row.get(2)?,
                        day: row.get(3)?,
                        draft: row.get(4)?,
                        notes: row.get(5)?,
                        current_status: row.get(6)?,
                        publication_status: row.get(7)?,
                        stream: row.get(8)?,
                        area: row.get(9)?,
                        wg_acronym: row.get(10)?,
                        errata_url: row.get(11)?,
                        doi: row.get(12)?,
                    })
                },
            )
            .optional()?;

        let Some(row) = row else {
            return Ok(None);
        };

        let date = Date {
            year: row.year,
            month: Month::from_number(row.month)?,
            day: row.day,
        };
        let mut rfc = Rfc::new(id, row.title, date);
        rfc.draft = row.draft;
        rfc.notes = row.notes;
        rfc.current_status = row.current_status.parse()?;
        rfc.publication_status = row.publication_status.parse()?;
        rfc.stream = row.stream.map(|s| s.parse::<Stream>()).transpose()?;
        rfc.area = row.area;
        rfc.wg_acronym = row.wg_acronym;
        rfc.errata_url = row.errata_url;
        rfc.doi = row.doi;

        rfc.authors = self.load_authors(id)?;
        rfc.formats = self.load_formats(id)?;
        rfc.abstract_paragraphs = self.load_abstract(id)?;
        rfc.keywords = self.load_keywords(id)?;
        self.load_edges(&mut rfc)?;

        Ok(Some(rfc))
    }

    fn load_authors(&self, id: u32) -> Result<Vec<Author>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT name, title, organization, org_abbrev
             FROM author WHERE rfc_id = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map(params![id], |row| {
            Ok(Author {
                name: row.get(0)?,
                title: row.get(1)?,
                organization: row.get(2)?,
                org_abbrev: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn load_formats(&self, id: u32) -> Result<Vec<FileFormat>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT filetype, char_count, page_count
             FROM format WHERE rfc_id = ?1 ORDER BY position",
        )?;
        let rows = stmt
            .query_map(params![id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, u64>(1)?,
                    row.get::<_, Option<u32>>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(file_type, char_count, page_count)| -> Result<_, StorageError> {
                Ok(FileFormat {
                    file_type: file_type.parse()?,
                    char_count,
                    page_count,
                })
            })
            .collect()
    }

    fn load_abstract(&self, id: u32) -> Result<Vec<String>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT par FROM abstract WHERE rfc_id = ?1 ORDER BY position")?;
        let rows = stmt.query_map(params![id], |row| row.get(0))?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn load_keywords(&self, id: u32) -> Result<Vec<String>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT k.word FROM rfc_keyword rk
             JOIN keyword k ON k.id = rk.keyword_id
             WHERE rk.rfc_id = ?1 ORDER BY rk.position",
        )?;
        let rows = stmt.query_map(params![id], |row| row.get(0))?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn load_edges(&self, rfc: &mut Rfc) -> Result<(), StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT kind, doc_type, doc_id FROM edge
             WHERE rfc_id = ?1 ORDER BY kind, position",
        )?;
        let rows = stmt
            .query_map(params![rfc.id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u32>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        for (kind, doc_type, doc_id) in rows {
            let kind: EdgeKind = kind.parse()?;
            let target = DocRef::new(doc_type.parse()?, doc_id);
            rfc.edges_mut(kind).push(target);
        }
        Ok(())
    }
}

/// Raw `rfc` row before enum columns are decoded.
struct RfcRow {
    title: String,
    year: u16,
    month: u8,
    day: Option<u8>,
    draft: Option<String>,
    notes: Option<String>,
    current_status: String,
    publication_status: String,
    stream: Option<String>,
    area: Option<String>,
    wg_acronym: Option<String>,
    errata_url: Option<String>,
    doi: Option<String>,
}

/// Translate a search term into a `LIKE` pattern.
///
/// `*` becomes `%`; literal `%`, `_` and `\` are escaped.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len());
    for c in term.chars() {
        match c {
            '*' => pattern.push('%'),
            '%' | '_' | '\\' => {
                pattern.push('\\');
                pattern.push(c);
            }
            _ => pattern.push(c),
        }
    }
    pattern
}

impl DocumentStore for SqliteStore {
    fn document(&self, kind: DocKind, id: u32) -> Result<Option<Document>, StorageError> {
        match kind {
            DocKind::Rfc => Ok(self.load_rfc(id)?.map(Document::from)),
            DocKind::Std => Ok(self.load_series(kind, id)?.map(Document::Std)),
            DocKind::Bcp => Ok(self.load_series(kind, id)?.map(Document::Bcp)),
            DocKind::Fyi => Ok(self.load_series(kind, id)?.map(Document::Fyi)),
            DocKind::NotIssued => self.load_not_issued(id),
        }
    }

    fn rfcs_declaring(&self, kind: EdgeKind, target: DocRef) -> Result<Vec<u32>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT rfc_id FROM edge
             WHERE kind = ?1 AND doc_type = ?2 AND doc_id = ?3
             ORDER BY rfc_id",
        )?;
        let rows = stmt.query_map(
            params![kind.as_str(), target.doc_type.as_str(), target.id],
            |row| row.get(0),
        )?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn rfcs_matching(
        &self,
        field: TextField,
        term: &str,
        how: TermMatch,
    ) -> Result<BTreeSet<u32>, StorageError> {
        let (table, column, id_column) = match field {
            TextField::RfcTitle => ("rfc", "title", "id"),
            TextField::AuthorName => ("author", "name", "rfc_id"),
            TextField::AuthorTitle => ("author", "title", "rfc_id"),
            TextField::AuthorOrganization => ("author", "organization", "rfc_id"),
            TextField::AuthorOrgAbbrev => ("author", "org_abbrev", "rfc_id"),
        };

        let (sql, pattern) = match how {
            TermMatch::Exact => (
                format!("SELECT DISTINCT {id_column} FROM {table} WHERE {column} = ?1"),
                term.to_string(),
            ),
            TermMatch::Wildcard => (
                format!(
                    "SELECT DISTINCT {id_column} FROM {table} WHERE {column} LIKE ?1 ESCAPE '\\'"
                ),
                like_pattern(term),
            ),
        };

        debug!(?field, ?how, %pattern, "matching term");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![pattern], |row| row.get(0))?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn rfcs_with_keyword(&self, word: &str) -> Result<BTreeSet<u32>, StorageError> {
        // SQLite's lower() only folds ASCII, so both sides are folded in Rust.
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT rk.rfc_id FROM rfc_keyword rk
             JOIN keyword k ON k.id = rk.keyword_id
             WHERE k.folded = ?1",
        )?;
        let rows = stmt.query_map(params![word.to_lowercase()], |row| row.get(0))?;
        Ok(rows.collect::<Result<_, _>>()?)
    }
}

/// One all-or-nothing refresh of the store.
///
/// Dropping a `Refresh` without calling [`Refresh::commit`] rolls back
/// every change, including the clearing of the previous contents.
pub struct Refresh<'conn> {
    tx: Transaction<'conn>,
}

impl Refresh<'_> {
    /// Make the refresh visible.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the commit fails.
    pub fn commit(self) -> Result<(), StorageError> {
        self.tx.commit()?;
        Ok(())
    }

    /// Look up a keyword by its exact text, creating it if absent.
    fn keyword_id(&self, word: &str) -> Result<i64, StorageError> {
        let existing = self
            .tx
            .query_row(
                "SELECT id FROM keyword WHERE word = ?1",
                params![word],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        self.tx
            .execute(
                "INSERT INTO keyword (word, folded) VALUES (?1, ?2)",
                params![word, word.to_lowercase()],
            )?;
        Ok(self.tx.last_insert_rowid())
    }

    fn add_rfc(&self, rfc: &Rfc) -> Result<(), StorageError> {
        self.tx.execute(
            "INSERT INTO rfc (id, title, date_year, date_month, date_day, draft, notes,
                              current_status, publication_status, stream, area,
                              wg_acronym, errata_url, doi)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                rfc.id,
                rfc.title,
                rfc.date.year,
                rfc.date.month.number(),
                rfc.date.day,
                rfc.draft,
                rfc.notes,
                rfc.current_status.as_str(),
                rfc.publication_status.as_str(),
                rfc.stream.map(|s| s.as_str()),
                rfc.area,
                rfc.wg_acronym,
                rfc.errata_url,
                rfc.doi,
            ],
        )?;

        for (position, author) in rfc.authors.iter().enumerate() {
            self.tx.execute(
                "INSERT INTO author (rfc_id, position, name, title, organization, org_abbrev)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    rfc.id,
                    position,
                    author.name,
                    author.title,
                    author.organization,
                    author.org_abbrev,
                ],
            )?;
        }

        for (position, format) in rfc.formats.iter().enumerate() {
            self.tx.execute(
                "INSERT INTO format (rfc_id, position, filetype, char_count, page_count)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    rfc.id,
                    position,
                    format.file_type.as_str(),
                    format.char_count,
                    format.page_count,
                ],
            )?;
        }

        for (position, par) in rfc.abstract_paragraphs.iter().enumerate() {
            self.tx.execute(
                "INSERT INTO abstract (rfc_id, position, par) VALUES (?1, ?2, ?3)",
                params![rfc.id, position, par],
            )?;
        }

        for &kind in EdgeKind::ALL {
            for (position, target) in rfc.edges(kind).iter().enumerate() {
                self.tx.execute(
                    "INSERT INTO edge (rfc_id, kind, position, doc_type, doc_id)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        rfc.id,
                        kind.as_str(),
                        position,
                        target.doc_type.as_str(),
                        target.id,
                    ],
                )?;
            }
        }

        for (position, word) in rfc.keywords.iter().enumerate() {
            let keyword_id = self.keyword_id(word)?;
            let inserted = self.tx.execute(
                "INSERT OR IGNORE INTO rfc_keyword (rfc_id, keyword_id, position)
                 VALUES (?1, ?2, ?3)",
                params![rfc.id, keyword_id, position],
            )?;
            if inserted == 0 {
                debug!(rfc = rfc.id, word, "duplicate keyword on entry");
            }
        }

        Ok(())
    }

    fn add_series(&self, kind: DocKind, series: &Series) -> Result<(), StorageError> {
        let sql = format!("INSERT INTO {} (id, title) VALUES (?1, ?2)", table(kind));
        self.tx.execute(&sql, params![series.id, series.title])?;
        Ok(())
    }
}

impl DocumentSink for Refresh<'_> {
    fn add_document(&mut self, document: &Document) -> Result<(), StorageError> {
        match document {
            Document::Rfc(rfc) => self.add_rfc(rfc),
            Document::Std(series) | Document::Bcp(series) | Document::Fyi(series) => {
                self.add_series(document.kind(), series)
            }
            Document::NotIssued { id } => {
                self.tx
                    .execute("INSERT INTO rfc_not_issued (id) VALUES (?1)", params![id])?;
                Ok(())
            }
        }
    }
}
