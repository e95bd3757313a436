//! Per-group detection profiles: detect order, default and member encodings.

use tracing::{info, warn};

use crate::catalog::{EncodingCatalog, GroupId};
use crate::{Encoding, Error, Result};

/// Detection profile of one encoding group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupProfile {
    pub(crate) id: GroupId,
    pub(crate) default_encoding: Encoding,
    pub(crate) detect_order: Vec<Encoding>,
    pub(crate) encodings: Vec<Encoding>,
    pub(crate) detect_order_modified: bool,
}

impl GroupProfile {
    fn builtin(
        id: GroupId,
        default_encoding: Encoding,
        detect_order: &[Encoding],
        encodings: &[Encoding],
    ) -> Self {
        Self {
            id,
            default_encoding,
            detect_order: detect_order.to_vec(),
            encodings: encodings.to_vec(),
            detect_order_modified: false,
        }
    }

    /// Group identifier
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Fallback encoding when detection has to be overridden
    pub fn default_encoding(&self) -> Encoding {
        self.default_encoding
    }

    /// Candidates tried during detection, highest priority first
    pub fn detect_order(&self) -> &[Encoding] {
        &self.detect_order
    }

    /// Encodings belonging to this group
    pub fn encodings(&self) -> &[Encoding] {
        &self.encodings
    }

    /// Whether the detect order differs from the built-in one
    ///
    /// The ISO-8859-1 disambiguation only runs while this is false. Built-in
    /// profiles never set it.
    pub fn detect_order_modified(&self) -> bool {
        self.detect_order_modified
    }

    fn validate(&self, catalog: &EncodingCatalog) -> Result<()> {
        let uncatalogued = std::iter::once(&self.default_encoding)
            .chain(&self.detect_order)
            .chain(&self.encodings)
            .find(|encoding| !catalog.contains(**encoding));
        if let Some(encoding) = uncatalogued {
            return Err(Error::Config(format!(
                "group {} references uncatalogued encoding {}",
                self.id, encoding
            )));
        }

        for (i, encoding) in self.detect_order.iter().enumerate() {
            if self.detect_order[..i].contains(encoding) {
                return Err(Error::Config(format!(
                    "group {} lists {} twice in its detect order",
                    self.id, encoding
                )));
            }
        }

        Ok(())
    }
}

fn builtin_profiles() -> Vec<GroupProfile> {
    use Encoding::*;

    vec![
        GroupProfile::builtin(
            GroupId::Latin,
            WINDOWS_1252,
            &[ASCII, UTF8, ISO_8859_1],
            &[ISO_8859_1, ISO_8859_15, WINDOWS_1252],
        ),
        GroupProfile::builtin(
            GroupId::Cyrillic,
            ISO_8859_5,
            &[ASCII, ISO_8859_5, KOI8_R, KOI8_U],
            &[ISO_8859_5],
        ),
        GroupProfile::builtin(
            GroupId::Koi8,
            KOI8_R,
            &[ASCII, UTF8, KOI8_R, KOI8_U],
            &[KOI8_R, KOI8_U],
        ),
    ]
}

/// Registered encoding groups plus the group used when callers pass none
///
/// Mutation is limited to [`set_default_encoding`](Self::set_default_encoding),
/// which takes `&mut self`; share a registry across threads behind a lock or
/// clone it per reconfiguration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingGroupRegistry {
    catalog: EncodingCatalog,
    default_group: GroupId,
    groups: Vec<GroupProfile>,
}

impl EncodingGroupRegistry {
    /// Build the registry from the built-in tables
    ///
    /// Fails with [`Error::Config`] if `default_group` is not registered.
    pub fn new(default_group: GroupId) -> Result<Self> {
        Self::from_profiles(EncodingCatalog::BUILTIN, default_group, builtin_profiles())
    }

    pub(crate) fn from_profiles(
        catalog: EncodingCatalog,
        default_group: GroupId,
        groups: Vec<GroupProfile>,
    ) -> Result<Self> {
        for profile in &groups {
            profile.validate(&catalog)?;
        }

        let registry = Self {
            catalog,
            default_group,
            groups,
        };
        if !registry.is_group_supported(default_group) {
            return Err(Error::Config(format!(
                "encoding group {default_group} is not known"
            )));
        }

        Ok(registry)
    }

    /// Catalog the registry validates against
    pub fn catalog(&self) -> &EncodingCatalog {
        &self.catalog
    }

    /// Group used when callers do not name one
    pub fn default_group(&self) -> GroupId {
        self.default_group
    }

    /// Check if `group` is registered
    pub fn is_group_supported(&self, group: GroupId) -> bool {
        self.profile(group).is_some()
    }

    /// Registered groups in registration order
    pub fn list_groups(&self) -> Vec<GroupId> {
        self.groups.iter().map(GroupProfile::id).collect()
    }

    /// Member encodings of `group`, empty if the group is unknown
    pub fn encodings_of(&self, group: GroupId) -> &[Encoding] {
        self.profile(group).map(GroupProfile::encodings).unwrap_or(&[])
    }

    /// Profile of a registered group
    pub fn profile(&self, group: GroupId) -> Option<&GroupProfile> {
        self.groups.iter().find(|profile| profile.id == group)
    }

    /// Resolve an optional group to a registered profile
    ///
    /// `None` selects the registry's default group.
    pub fn resolve(&self, group: Option<GroupId>) -> Result<&GroupProfile> {
        let group = group.unwrap_or(self.default_group);
        self.profile(group)
            .ok_or_else(|| Error::UnknownGroup(group.name().to_string()))
    }

    /// Replace the default encoding of `group`
    ///
    /// Returns false, leaving the registry untouched, if the group is not
    /// registered or the encoding is not catalogued. The encoding does not
    /// have to be a member of the group: `Windows-1251` is accepted as the
    /// `LATIN` default.
    pub fn set_default_encoding(&mut self, group: GroupId, encoding: Encoding) -> bool {
        if !self.catalog.contains(encoding) {
            warn!(%group, %encoding, "rejected default encoding: not catalogued");
            return false;
        }
        let Some(profile) = self.groups.iter_mut().find(|profile| profile.id == group) else {
            warn!(%group, %encoding, "rejected default encoding: group not registered");
            return false;
        };

        info!(
            %group,
            previous = %profile.default_encoding,
            %encoding,
            "default encoding replaced"
        );
        profile.default_encoding = encoding;
        true
    }
}
