//! Conversion of text values to a target encoding

use tracing::debug;

use crate::catalog::GroupId;
use crate::detection::DetectionEngine;
use crate::registry::EncodingGroupRegistry;
use crate::transcode::{CharsetTranscoder, Transcoder};
use crate::{Encoding, Error, Result};

/// Converted value together with the source encoding that was used
///
/// Feed `source_encoding` back into the next call to reuse a detection
/// across a batch of values sharing one encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Converted<T> {
    /// The converted value
    pub value: T,
    /// Source encoding the value was decoded with
    ///
    /// `None` only when no encoding was supplied and nothing needed
    /// converting (empty input).
    pub source_encoding: Option<Encoding>,
}

/// Detection and conversion entry point
///
/// Owns the group registry and the transcoding primitive.
#[derive(Debug, Clone)]
pub struct Converter<T = CharsetTranscoder> {
    registry: EncodingGroupRegistry,
    transcoder: T,
}

impl Converter {
    /// Create a converter over the built-in groups
    ///
    /// Fails with [`Error::Config`] if `default_group` is not registered.
    pub fn new(default_group: GroupId) -> Result<Self> {
        Ok(Self::with_transcoder(
            EncodingGroupRegistry::new(default_group)?,
            CharsetTranscoder::new(),
        ))
    }
}

impl<T: Transcoder> Converter<T> {
    /// Create a converter from an existing registry and transcoder
    pub fn with_transcoder(registry: EncodingGroupRegistry, transcoder: T) -> Self {
        Self {
            registry,
            transcoder,
        }
    }

    /// Group registry used for detection
    pub fn registry(&self) -> &EncodingGroupRegistry {
        &self.registry
    }

    /// Detector bound to this converter's registry
    pub fn detector(&self) -> DetectionEngine<'_> {
        DetectionEngine::new(&self.registry)
    }

    /// Detect the encoding of `data`, see [`DetectionEngine::detect`]
    pub fn detect_encoding(
        &self,
        data: &[u8],
        group: Option<GroupId>,
        malformed_check: bool,
    ) -> Result<Encoding> {
        self.detector().detect(data, group, malformed_check)
    }

    /// Replace the default encoding of `group`, see
    /// [`EncodingGroupRegistry::set_default_encoding`]
    pub fn set_default_encoding(&mut self, group: GroupId, encoding: Encoding) -> bool {
        self.registry.set_default_encoding(group, encoding)
    }

    /// Convert one text value to `target`
    ///
    /// `source` is the encoding of `text`; when `None` it is detected with
    /// `group`'s detect order (or the default group's) and reported back in
    /// the result. Empty input is returned as is without any checks.
    pub fn convert_string(
        &self,
        text: &[u8],
        target: Encoding,
        source: Option<Encoding>,
        group: Option<GroupId>,
    ) -> Result<Converted<Vec<u8>>> {
        if text.is_empty() {
            return Ok(Converted {
                value: Vec::new(),
                source_encoding: source,
            });
        }

        let catalog = self.registry.catalog();
        if !catalog.contains(target) {
            return Err(Error::UnsupportedEncoding(target.name().to_string()));
        }

        let group = self.registry.resolve(group)?.id();
        let source = match source {
            Some(source) => source,
            None => {
                let detected = self.detector().detect(text, Some(group), true)?;
                debug!(%group, %detected, len = text.len(), "source encoding detected");
                detected
            }
        };
        if !catalog.contains(source) {
            return Err(Error::UnsupportedEncoding(source.name().to_string()));
        }

        let value = self.transcoder.transcode(text, source, target)?;
        Ok(Converted {
            value,
            source_encoding: Some(source),
        })
    }
}
