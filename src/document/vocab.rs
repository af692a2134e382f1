//! Fixed vocabularies used by the index: document types, months, file
//! formats, statuses and streams.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::document::ParseError;

/// Declares a closed vocabulary enum with its index spelling.
///
/// Generates `ALL`, `as_str`, `Display` and a `FromStr` that accepts the
/// index spelling exactly.
macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $text)] $variant),+
        }

        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The spelling used by the XML index.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| ParseError::UnknownValue {
                        vocabulary: $label,
                        value: s.to_string(),
                    })
            }
        }
    };
}

vocabulary! {
    /// Document type prefixes that appear in `doc-id` elements.
    ///
    /// Only `Rfc`, `Std`, `Bcp` and `Fyi` have their own store tables;
    /// the remaining types show up as edge targets only.
    DocType, "document type" {
        Rfc => "RFC",
        Std => "STD",
        Bcp => "BCP",
        Fyi => "FYI",
        Nic => "NIC",
        Ien => "IEN",
        Rtr => "RTR",
    }
}

vocabulary! {
    /// Calendar months as spelled in `<date><month>`.
    Month, "month" {
        January => "January",
        February => "February",
        March => "March",
        April => "April",
        May => "May",
        June => "June",
        July => "July",
        August => "August",
        September => "September",
        October => "October",
        November => "November",
        December => "December",
    }
}

vocabulary! {
    /// File kinds listed under `<format>`.
    FileType, "file format" {
        Ascii => "ASCII",
        Ps => "PS",
        Pdf => "PDF",
        Tgz => "TGZ",
        Html => "HTML",
        Xml => "XML",
        Text => "TEXT",
    }
}

vocabulary! {
    /// Standards-track status values (RFC 2026).
    Status, "status" {
        ProposedStandard => "PROPOSED STANDARD",
        DraftStandard => "DRAFT STANDARD",
        InternetStandard => "INTERNET STANDARD",
        Informational => "INFORMATIONAL",
        Experimental => "EXPERIMENTAL",
        BestCurrentPractice => "BEST CURRENT PRACTICE",
        Historic => "HISTORIC",
        Unknown => "UNKNOWN",
    }
}

vocabulary! {
    /// Originating stream of an RFC.
    Stream, "stream" {
        Ietf => "IETF",
        Iab => "IAB",
        Irtf => "IRTF",
        Independent => "INDEPENDENT",
        Legacy => "Legacy",
    }
}

impl DocType {
    /// Look up a type by its three-letter `doc-id` prefix.
    #[must_use]
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == prefix)
    }
}

impl Month {
    /// Month number in `1..=12`.
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Self::January => 1,
            Self::February => 2,
            Self::March => 3,
            Self::April => 4,
            Self::May => 5,
            Self::June => 6,
            Self::July => 7,
            Self::August => 8,
            Self::September => 9,
            Self::October => 10,
            Self::November => 11,
            Self::December => 12,
        }
    }

    /// Inverse of [`Month::number`].
    ///
    /// # Errors
    ///
    /// Returns `ParseError::UnknownValue` outside `1..=12`.
    pub fn from_number(number: u8) -> Result<Self, ParseError> {
        usize::from(number)
            .checked_sub(1)
            .and_then(|i| Self::ALL.get(i))
            .copied()
            .ok_or_else(|| ParseError::UnknownValue {
                vocabulary: "month",
                value: number.to_string(),
            })
    }
}
