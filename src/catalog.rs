//! Static table of supported encodings and the group that owns each one.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Encoding, Error, Result};

/// Identifier of an encoding group
///
/// `Global` owns the encodings shared by every language family (ASCII and
/// UTF-8). It appears in the catalog but is never a registered group, so
/// detection and conversion reject it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupId {
    /// Encodings usable by every group
    Global,
    /// Western European encodings
    Latin,
    /// Cyrillic ISO/Windows encodings
    Cyrillic,
    /// KOI8 family
    Koi8,
}

impl GroupId {
    /// Get the canonical name of this group
    pub fn name(self) -> &'static str {
        match self {
            GroupId::Global => "GLOBAL",
            GroupId::Latin => "LATIN",
            GroupId::Cyrillic => "CYRILLIC",
            GroupId::Koi8 => "KOI8",
        }
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GroupId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "GLOBAL" => Ok(GroupId::Global),
            "LATIN" => Ok(GroupId::Latin),
            "CYRILLIC" => Ok(GroupId::Cyrillic),
            "KOI8" => Ok(GroupId::Koi8),
            _ => Err(Error::UnknownGroup(s.to_string())),
        }
    }
}

/// Mapping from every supported encoding to its owning group
///
/// Fixed at compile time. Components hold a copy of the catalog rather than
/// reaching for a global.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingCatalog {
    pub(crate) entries: &'static [(Encoding, GroupId)],
}

impl EncodingCatalog {
    /// The built-in catalog
    pub const BUILTIN: EncodingCatalog = EncodingCatalog {
        entries: &[
            (Encoding::UTF8, GroupId::Global),
            (Encoding::ASCII, GroupId::Global),
            (Encoding::ISO_8859_1, GroupId::Latin),
            (Encoding::ISO_8859_15, GroupId::Latin),
            (Encoding::WINDOWS_1252, GroupId::Latin),
            (Encoding::ISO_8859_5, GroupId::Cyrillic),
            (Encoding::WINDOWS_1251, GroupId::Cyrillic),
            (Encoding::KOI8_R, GroupId::Koi8),
            (Encoding::KOI8_U, GroupId::Koi8),
        ],
    };

    /// Group that owns `encoding`, if it is catalogued
    pub fn group_of(&self, encoding: Encoding) -> Option<GroupId> {
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == encoding)
            .map(|&(_, group)| group)
    }

    /// Check if `encoding` is catalogued
    pub fn contains(&self, encoding: Encoding) -> bool {
        self.group_of(encoding).is_some()
    }

    /// Iterate over catalogued encodings in table order
    pub fn encodings(&self) -> impl Iterator<Item = Encoding> + '_ {
        self.entries.iter().map(|&(encoding, _)| encoding)
    }

    /// Iterate over `(encoding, owning group)` pairs in table order
    pub fn entries(&self) -> impl Iterator<Item = (Encoding, GroupId)> + '_ {
        self.entries.iter().copied()
    }
}

impl Default for EncodingCatalog {
    fn default() -> Self {
        Self::BUILTIN
    }
}
