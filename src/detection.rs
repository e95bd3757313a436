//! Encoding detection by ordered candidate matching
//!
//! Each group tries its detect order front to back and keeps the first
//! encoding whose byte grammar accepts the input. Two overrides then refine
//! the result:
//!
//! - a UTF-8 match that fails strict validation falls back to the group's
//!   default encoding;
//! - an ISO-8859-1 match is reassigned to Windows-1252 when a byte in
//!   0x7F-0x9F is present, or to ISO-8859-15 when the Euro position 0xA4 is.

use tracing::{debug, trace};

use crate::catalog::GroupId;
use crate::registry::{EncodingGroupRegistry, GroupProfile};
use crate::transcode::is_well_formed_utf8;
use crate::{Encoding, Error, Result};

/// Bytes that are control codes in ISO-8859-1 but printable in Windows-1252
const LATIN1_AMBIGUOUS_RANGE: std::ops::RangeInclusive<u8> = 0x7F..=0x9F;

/// Euro sign in ISO-8859-15, currency sign in ISO-8859-1
const LATIN9_EURO: u8 = 0xA4;

/// Detector bound to a registry
#[derive(Debug, Clone, Copy)]
pub struct DetectionEngine<'r> {
    registry: &'r EncodingGroupRegistry,
}

impl<'r> DetectionEngine<'r> {
    /// Create a detector reading group profiles from `registry`
    pub fn new(registry: &'r EncodingGroupRegistry) -> Self {
        Self { registry }
    }

    /// Detect the encoding of `data`
    ///
    /// `group` selects the detect order; `None` uses the registry default.
    /// With `malformed_check` set, a UTF-8 match is re-validated strictly
    /// and replaced by the group default if it is malformed.
    pub fn detect(
        &self,
        data: &[u8],
        group: Option<GroupId>,
        malformed_check: bool,
    ) -> Result<Encoding> {
        let profile = self.registry.resolve(group)?;

        let detected = profile
            .detect_order()
            .iter()
            .copied()
            .find(|&candidate| matches_candidate(candidate, data))
            .ok_or(Error::DetectionFailed {
                group: profile.id(),
                len: data.len(),
            })?;
        trace!(group = %profile.id(), %detected, "candidate matched");

        Ok(refine(profile, detected, data, malformed_check))
    }
}

fn refine(profile: &GroupProfile, detected: Encoding, data: &[u8], malformed_check: bool) -> Encoding {
    match detected {
        Encoding::UTF8 if malformed_check && !is_well_formed_utf8(data) => {
            let fallback = profile.default_encoding();
            debug!(group = %profile.id(), %fallback, "malformed UTF-8, using group default");
            fallback
        }
        Encoding::ISO_8859_1 if !profile.detect_order_modified() => {
            let refined = disambiguate_latin1(data);
            if refined != detected {
                debug!(group = %profile.id(), %refined, "ISO-8859-1 reassigned");
            }
            refined
        }
        _ => detected,
    }
}

/// Pick between ISO-8859-1 and its supersets from the bytes present
fn disambiguate_latin1(data: &[u8]) -> Encoding {
    if data.iter().any(|b| LATIN1_AMBIGUOUS_RANGE.contains(b)) {
        Encoding::WINDOWS_1252
    } else if data.contains(&LATIN9_EURO) {
        Encoding::ISO_8859_15
    } else {
        Encoding::ISO_8859_1
    }
}

/// Check if `data` fits the byte grammar of `candidate`
fn matches_candidate(candidate: Encoding, data: &[u8]) -> bool {
    match candidate {
        Encoding::ASCII => data.is_ascii(),
        Encoding::UTF8 => has_utf8_structure(data),
        // every byte maps to a character in an 8-bit table
        _ => candidate.is_single_byte(),
    }
}

/// Structural UTF-8 match: lead byte class followed by the right number of
/// continuation bytes
///
/// Looser than [`is_well_formed_utf8`]: overlong forms, surrogates and
/// sequences beyond U+10FFFF pass here.
fn has_utf8_structure(data: &[u8]) -> bool {
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];

        let continuation = if byte < 0x80 {
            0
        } else if (byte & 0xE0) == 0xC0 {
            1
        } else if (byte & 0xF0) == 0xE0 {
            2
        } else if (byte & 0xF8) == 0xF0 {
            3
        } else {
            // stray continuation byte or 0xF8..=0xFF
            return false;
        };

        let end = i + 1 + continuation;
        if end > data.len() || !data[i + 1..end].iter().all(|&b| (b & 0xC0) == 0x80) {
            return false;
        }
        i = end;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EncodingCatalog;

    fn latin() -> EncodingGroupRegistry {
        EncodingGroupRegistry::new(GroupId::Latin).unwrap()
    }

    fn custom_registry(detect_order: Vec<Encoding>, detect_order_modified: bool) -> EncodingGroupRegistry {
        let profile = GroupProfile {
            id: GroupId::Latin,
            default_encoding: Encoding::WINDOWS_1252,
            detect_order,
            encodings: vec![Encoding::ISO_8859_1],
            detect_order_modified,
        };
        EncodingGroupRegistry::from_profiles(EncodingCatalog::BUILTIN, GroupId::Latin, vec![profile])
            .unwrap()
    }

    #[test]
    fn test_ascii_first() {
        let registry = latin();
        let detector = DetectionEngine::new(&registry);

        assert_eq!(detector.detect(b"Hello, World!", None, true).unwrap(), Encoding::ASCII);
        assert_eq!(detector.detect(b"", None, true).unwrap(), Encoding::ASCII);
    }

    #[test]
    fn test_utf8_text() {
        let registry = latin();
        let detector = DetectionEngine::new(&registry);

        let text = "öääüß".as_bytes();
        assert_eq!(detector.detect(text, None, true).unwrap(), Encoding::UTF8);
        assert_eq!(detector.detect(text, None, false).unwrap(), Encoding::UTF8);
        assert_eq!(
            detector.detect(text, Some(GroupId::Koi8), true).unwrap(),
            Encoding::UTF8
        );
    }

    #[test]
    fn test_latin1_text_stays_latin1() {
        let registry = latin();
        let detector = DetectionEngine::new(&registry);

        // "öääüß" in ISO-8859-1
        let text = [0xF6, 0xE4, 0xE4, 0xFC, 0xDF];
        assert_eq!(
            detector.detect(&text, Some(GroupId::Latin), true).unwrap(),
            Encoding::ISO_8859_1
        );
    }

    #[test]
    fn test_ambiguous_range_means_windows_1252() {
        let registry = latin();
        let detector = DetectionEngine::new(&registry);

        // Euro sign in Windows-1252
        assert_eq!(detector.detect(&[0x80], None, true).unwrap(), Encoding::WINDOWS_1252);
        // lower bound of the range, even next to the Euro position
        assert_eq!(
            detector.detect(&[0xE9, 0x7F, 0xA4], None, true).unwrap(),
            Encoding::WINDOWS_1252
        );
        assert_eq!(
            detector.detect(&[b'x', 0x9F, 0xE9], None, true).unwrap(),
            Encoding::WINDOWS_1252
        );
    }

    #[test]
    fn test_euro_position_means_iso_8859_15() {
        let registry = latin();
        let detector = DetectionEngine::new(&registry);

        assert_eq!(detector.detect(&[0xA4], None, true).unwrap(), Encoding::ISO_8859_15);
        assert_eq!(
            detector.detect(&[b'5', b' ', 0xA4, 0xE9], None, true).unwrap(),
            Encoding::ISO_8859_15
        );
    }

    #[test]
    fn test_disambiguation_skipped_when_detect_order_modified() {
        let order = vec![Encoding::ASCII, Encoding::ISO_8859_1];

        let registry = custom_registry(order.clone(), true);
        let detector = DetectionEngine::new(&registry);
        assert_eq!(detector.detect(&[0x80], None, true).unwrap(), Encoding::ISO_8859_1);
        assert_eq!(detector.detect(&[0xA4], None, true).unwrap(), Encoding::ISO_8859_1);

        let registry = custom_registry(order, false);
        let detector = DetectionEngine::new(&registry);
        assert_eq!(detector.detect(&[0x80], None, true).unwrap(), Encoding::WINDOWS_1252);
    }

    #[test]
    fn test_malformed_utf8_falls_back_to_group_default() {
        let mut registry = latin();

        // overlong encoding of '/', structurally UTF-8
        let overlong = [b'a', 0xC0, 0xAF];
        {
            let detector = DetectionEngine::new(&registry);
            assert_eq!(
                detector.detect(&overlong, None, true).unwrap(),
                Encoding::WINDOWS_1252
            );
            assert_eq!(detector.detect(&overlong, None, false).unwrap(), Encoding::UTF8);
            assert_eq!(
                detector.detect(&overlong, Some(GroupId::Koi8), true).unwrap(),
                Encoding::KOI8_R
            );
        }

        assert!(registry.set_default_encoding(GroupId::Latin, Encoding::ISO_8859_15));
        let detector = DetectionEngine::new(&registry);
        assert_eq!(
            detector.detect(&overlong, None, true).unwrap(),
            Encoding::ISO_8859_15
        );
    }

    #[test]
    fn test_cyrillic_group_has_no_utf8_candidate() {
        let registry = EncodingGroupRegistry::new(GroupId::Cyrillic).unwrap();
        let detector = DetectionEngine::new(&registry);

        assert_eq!(
            detector.detect("Привет".as_bytes(), None, true).unwrap(),
            Encoding::ISO_8859_5
        );
        // KOI8-R bytes still land on the first 8-bit candidate
        assert_eq!(
            detector.detect(&[0xF0, 0xD2, 0xC9], None, true).unwrap(),
            Encoding::ISO_8859_5
        );
    }

    #[test]
    fn test_koi8_group_falls_through_to_koi8_r() {
        let registry = EncodingGroupRegistry::new(GroupId::Koi8).unwrap();
        let detector = DetectionEngine::new(&registry);

        assert_eq!(
            detector.detect(&[0xF0, 0xD2, 0xC9, 0xD7, 0xC5, 0xD4], None, true).unwrap(),
            Encoding::KOI8_R
        );
    }

    #[test]
    fn test_ascii_only_group_fails_on_high_bytes() {
        let registry = custom_registry(vec![Encoding::ASCII], false);
        let detector = DetectionEngine::new(&registry);

        assert_eq!(
            detector.detect(&[b'a', 0xE9], None, true),
            Err(Error::DetectionFailed {
                group: GroupId::Latin,
                len: 2,
            })
        );
        assert_eq!(detector.detect(b"plain", None, true).unwrap(), Encoding::ASCII);
    }

    #[test]
    fn test_unknown_group() {
        let registry = latin();
        let detector = DetectionEngine::new(&registry);

        assert_eq!(
            detector.detect(b"abc", Some(GroupId::Global), true),
            Err(Error::UnknownGroup("GLOBAL".to_string()))
        );
    }

    #[test]
    fn test_utf8_structure() {
        assert!(has_utf8_structure(b""));
        assert!(has_utf8_structure("a€😀".as_bytes()));
        assert!(has_utf8_structure(&[0xC0, 0x80]));
        assert!(has_utf8_structure(&[0xED, 0xA0, 0x80]));
        assert!(has_utf8_structure(&[0xF7, 0xBF, 0xBF, 0xBF]));

        assert!(!has_utf8_structure(&[0x80]));
        assert!(!has_utf8_structure(&[0xE2, 0x82]));
        assert!(!has_utf8_structure(&[0xC3, 0x41]));
        assert!(!has_utf8_structure(&[0xF8, 0x80, 0x80, 0x80, 0x80]));
    }
}
