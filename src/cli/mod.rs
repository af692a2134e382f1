//! CLI interface for rfcindex.
//!
//! Provides command-line argument parsing using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::query::Mode;

/// Command-line interface for rfcindex.
#[derive(Parser)]
#[command(name = "rfcindex")]
#[command(author, version, about = "Local index of RFC, STD, BCP and FYI documents", long_about = None)]
pub struct Cli {
    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// How found documents are printed.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct OutputArgs {
    /// Print the mirror path of each document instead of its record.
    #[arg(long)]
    pub paths: bool,

    /// Print the result as JSON.
    #[arg(long, conflicts_with = "paths")]
    pub json: bool,
}

/// Relationship to follow from an RFC.
#[derive(Args, Debug, Clone, Copy, Default)]
#[group(multiple = false)]
pub struct RfcMode {
    /// Show the current version (follows updated-by).
    #[arg(short, long)]
    pub updates: bool,

    /// Show the newest obsoleting document (follows obsoleted-by).
    #[arg(short, long)]
    pub obsoletes: bool,

    /// Show the documents this RFC is also published as.
    #[arg(short, long)]
    pub is_also: bool,

    /// Show the documents this RFC refers to.
    #[arg(short, long)]
    pub see_also: bool,
}

impl RfcMode {
    #[must_use]
    pub fn mode(self) -> Mode {
        if self.updates {
            Mode::Current
        } else if self.obsoletes {
            Mode::Obsoleting
        } else if self.is_also {
            Mode::Aliases
        } else if self.see_also {
            Mode::SeeAlso
        } else {
            Mode::Lookup
        }
    }
}

/// Arguments shared by the BCP, STD and FYI subcommands.
#[derive(Args, Debug, Clone)]
pub struct SeriesArgs {
    /// Show the RFCs published under this number.
    #[arg(short, long)]
    pub is_also: bool,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Document numbers.
    #[arg(required = true)]
    pub numbers: Vec<u32>,
}

impl SeriesArgs {
    #[must_use]
    pub fn mode(&self) -> Mode {
        if self.is_also {
            Mode::Aliases
        } else {
            Mode::Lookup
        }
    }
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Rebuild the database from the XML index.
    Ingest {
        /// Index file to read instead of the configured one.
        #[arg(long)]
        index: Option<PathBuf>,
    },

    /// Look up RFCs by number.
    Rfc {
        #[command(flatten)]
        mode: RfcMode,

        #[command(flatten)]
        output: OutputArgs,

        /// RFC numbers.
        #[arg(required = true)]
        numbers: Vec<u32>,
    },

    /// Look up Best Current Practice documents.
    Bcp(SeriesArgs),

    /// Look up Internet Standards.
    Std(SeriesArgs),

    /// Look up For Your Information documents.
    Fyi(SeriesArgs),

    /// Search RFCs by author. All given terms must match.
    ///
    /// Terms are matched exactly first; if nothing matches, case-insensitively
    /// with `*` as a wildcard.
    Author {
        /// Author name.
        #[arg(short, long = "name")]
        names: Vec<String>,

        /// Author title, such as "Editor".
        #[arg(short, long = "title")]
        titles: Vec<String>,

        /// Author organization.
        #[arg(long = "org")]
        organizations: Vec<String>,

        /// Abbreviated author organization.
        #[arg(long = "org-abbrev")]
        org_abbrevs: Vec<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Search RFCs by title. All given terms must match.
    Title {
        #[command(flatten)]
        output: OutputArgs,

        /// Title terms; `*` matches any run of characters.
        #[arg(required = true)]
        titles: Vec<String>,
    },

    /// Search RFCs by keyword, ignoring case. All given words must match.
    Keyword {
        #[command(flatten)]
        output: OutputArgs,

        #[arg(required = true)]
        words: Vec<String>,
    },

    /// Start the MCP server for AI editor integration.
    #[cfg(feature = "mcp")]
    Serve,
}
