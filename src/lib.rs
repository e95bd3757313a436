//! # charset-policy - Legacy Charset Resolution
//!
//! Resolves the unknown legacy byte encoding of text values and converts
//! them to a target encoding. Supported encodings are grouped into language
//! families (Latin, Cyrillic, KOI8), each with an ordered list of candidates
//! to try during detection and a default encoding to fall back on.
//!
//! ## Features
//!
//! - **Ordered candidate detection** per encoding group
//! - **Disambiguation** of ISO-8859-1 against Windows-1252 and ISO-8859-15
//! - **Malformed UTF-8 guard** that falls back to the group default
//! - **Recursive conversion** of nested containers, keys included
//!
//! ## Quick Start
//!
//! ```rust
//! use charset_policy::{Converter, Encoding, GroupId};
//!
//! let converter = Converter::new(GroupId::Latin).unwrap();
//!
//! // "äöüß" in UTF-8, detected automatically
//! let converted = converter
//!     .convert_string("äöüß".as_bytes(), Encoding::WINDOWS_1252, None, None)
//!     .unwrap();
//! assert_eq!(converted.value, vec![0xE4, 0xF6, 0xFC, 0xDF]);
//! assert_eq!(converted.source_encoding, Some(Encoding::UTF8));
//! ```

#![deny(missing_docs)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod catalog;
pub mod config;
pub mod container;
pub mod convert;
pub mod detection;
pub mod registry;
pub mod transcode;

pub use catalog::{EncodingCatalog, GroupId};
pub use config::ConverterConfig;
pub use container::{Key, Node, Scalar};
pub use convert::{Converted, Converter};
pub use detection::DetectionEngine;
pub use registry::{EncodingGroupRegistry, GroupProfile};
pub use transcode::{CharsetTranscoder, TranscodeError, Transcoder, is_well_formed_utf8};

/// Result type for detection and conversion operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while detecting or converting
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Invalid configuration, raised while building a registry
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Encoding group is not registered
    #[error("encoding group '{0}' is not known")]
    UnknownGroup(String),
    /// Encoding is not part of the catalog
    #[error("encoding '{0}' is not supported")]
    UnsupportedEncoding(String),
    /// No candidate in the group's detect order matched the input
    #[error("failed to detect encoding in group {group} for {len} bytes")]
    DetectionFailed {
        /// Group whose detect order was exhausted
        group: GroupId,
        /// Length of the rejected input
        len: usize,
    },
    /// The transcoding primitive rejected the input
    #[error(transparent)]
    Transcoding(#[from] TranscodeError),
}

/// Supported character encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum Encoding {
    /// ASCII (7-bit, 0-127)
    #[serde(rename = "ASCII")]
    ASCII,
    /// UTF-8 Unicode encoding (variable length, 1-4 bytes)
    #[serde(rename = "UTF-8")]
    UTF8,
    /// ISO-8859-1 (Latin-1) - Western European
    #[serde(rename = "ISO-8859-1")]
    ISO_8859_1,
    /// ISO-8859-15 (Latin-9) - Western European with Euro
    #[serde(rename = "ISO-8859-15")]
    ISO_8859_15,
    /// ISO-8859-5 (Cyrillic)
    #[serde(rename = "ISO-8859-5")]
    ISO_8859_5,
    /// Windows-1251 (Cyrillic)
    #[serde(rename = "Windows-1251")]
    WINDOWS_1251,
    /// Windows-1252 (Western European)
    #[serde(rename = "Windows-1252")]
    WINDOWS_1252,
    /// KOI8-R (Russian)
    #[serde(rename = "KOI8-R")]
    KOI8_R,
    /// KOI8-U (Ukrainian)
    #[serde(rename = "KOI8-U")]
    KOI8_U,
}

impl Encoding {
    /// Every supported encoding, in catalog order
    pub const ALL: [Encoding; 9] = [
        Encoding::UTF8,
        Encoding::ASCII,
        Encoding::ISO_8859_1,
        Encoding::ISO_8859_15,
        Encoding::WINDOWS_1252,
        Encoding::ISO_8859_5,
        Encoding::WINDOWS_1251,
        Encoding::KOI8_R,
        Encoding::KOI8_U,
    ];

    /// Get the canonical name of this encoding
    pub fn name(self) -> &'static str {
        match self {
            Encoding::ASCII => "ASCII",
            Encoding::UTF8 => "UTF-8",
            Encoding::ISO_8859_1 => "ISO-8859-1",
            Encoding::ISO_8859_15 => "ISO-8859-15",
            Encoding::ISO_8859_5 => "ISO-8859-5",
            Encoding::WINDOWS_1251 => "Windows-1251",
            Encoding::WINDOWS_1252 => "Windows-1252",
            Encoding::KOI8_R => "KOI8-R",
            Encoding::KOI8_U => "KOI8-U",
        }
    }

    /// Check if every byte sequence is structurally valid in this encoding
    ///
    /// True for the 8-bit tables, where each of the 256 byte values maps to
    /// a character.
    pub fn is_single_byte(self) -> bool {
        !matches!(self, Encoding::ASCII | Encoding::UTF8)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let encoding = match s.trim().to_uppercase().as_str() {
            "ASCII" | "US-ASCII" => Encoding::ASCII,
            "UTF8" | "UTF-8" => Encoding::UTF8,

            "ISO88591" | "ISO-8859-1" | "ISO_8859-1" | "LATIN1" => Encoding::ISO_8859_1,
            "ISO885915" | "ISO-8859-15" | "ISO_8859-15" | "LATIN9" => Encoding::ISO_8859_15,
            "ISO88595" | "ISO-8859-5" | "ISO_8859-5" => Encoding::ISO_8859_5,

            "WINDOWS1251" | "WINDOWS-1251" | "WIN1251" | "CP1251" => Encoding::WINDOWS_1251,
            "WINDOWS1252" | "WINDOWS-1252" | "WIN1252" | "CP1252" => Encoding::WINDOWS_1252,

            "KOI8R" | "KOI8-R" | "KOI8_R" => Encoding::KOI8_R,
            "KOI8U" | "KOI8-U" | "KOI8_U" => Encoding::KOI8_U,

            _ => return Err(Error::UnsupportedEncoding(s.to_string())),
        };

        Ok(encoding)
    }
}
