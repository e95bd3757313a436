//! Byte-level transcoding between catalogued encodings
//!
//! Conversions go through Unicode: the source bytes are decoded to a `str`,
//! then encoded into the target. Both halves are strict; nothing is replaced.

use std::borrow::Cow;

use encoding_rs::EncoderResult;

use crate::Encoding;

/// Failure of the transcoding primitive
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranscodeError {
    /// Byte value is not valid in the source encoding
    #[error("unmappable byte 0x{byte:02X} at position {position} for {encoding}")]
    UnmappableSource {
        /// Declared source encoding
        encoding: Encoding,
        /// The offending byte value
        byte: u8,
        /// Position of the byte in input
        position: usize,
    },
    /// Character cannot be encoded in the target encoding
    #[error("cannot encode character '{character}' at position {position} as {encoding}")]
    UnmappableTarget {
        /// Requested target encoding
        encoding: Encoding,
        /// The unmappable character
        character: char,
        /// Byte offset of the character in the decoded text
        position: usize,
    },
}

/// Converts bytes between two named encodings
pub trait Transcoder {
    /// Transcode `bytes` from `from` to `to`
    ///
    /// Fails if `bytes` are not valid under `from` or decode to a character
    /// that `to` cannot represent.
    fn transcode(
        &self,
        bytes: &[u8],
        from: Encoding,
        to: Encoding,
    ) -> Result<Vec<u8>, TranscodeError>;
}

/// Strict UTF-8 validity check
///
/// Rejects overlong forms, surrogates and code points above U+10FFFF.
pub fn is_well_formed_utf8(bytes: &[u8]) -> bool {
    std::str::from_utf8(bytes).is_ok()
}

/// Default transcoder backed by `encoding_rs`
///
/// ASCII and ISO-8859-1 are handled directly: `encoding_rs` follows the
/// WHATWG labels, which alias both to Windows-1252. KOI8-U is patched at
/// 0xAE and 0xBE, where the WHATWG table is KOI8-RU.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharsetTranscoder;

impl CharsetTranscoder {
    /// Create a new transcoder
    pub fn new() -> Self {
        Self
    }

    /// Decode `bytes` to Unicode
    pub fn decode<'a>(
        &self,
        bytes: &'a [u8],
        encoding: Encoding,
    ) -> Result<Cow<'a, str>, TranscodeError> {
        match encoding {
            Encoding::ASCII => match bytes.iter().position(|byte| !byte.is_ascii()) {
                Some(position) => Err(TranscodeError::UnmappableSource {
                    encoding,
                    byte: bytes[position],
                    position,
                }),
                // ASCII is a subset of UTF-8
                None => Ok(Cow::Borrowed(std::str::from_utf8(bytes).unwrap_or_default())),
            },
            Encoding::UTF8 => std::str::from_utf8(bytes).map(Cow::Borrowed).map_err(|err| {
                let position = err.valid_up_to();
                TranscodeError::UnmappableSource {
                    encoding,
                    byte: bytes[position],
                    position,
                }
            }),
            Encoding::ISO_8859_1 => Ok(Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect())),
            Encoding::KOI8_U => decode_single_byte(bytes, encoding)
                .map(|text| Cow::Owned(text.chars().map(koi8_u_from_whatwg).collect())),
            _ => decode_single_byte(bytes, encoding),
        }
    }

    /// Encode Unicode text into `encoding`
    pub fn encode(&self, text: &str, encoding: Encoding) -> Result<Vec<u8>, TranscodeError> {
        match encoding {
            Encoding::UTF8 => Ok(text.as_bytes().to_vec()),
            Encoding::ASCII => encode_with(text, encoding, |ch| {
                ch.is_ascii().then_some(ch as u8)
            }),
            Encoding::ISO_8859_1 => {
                encode_with(text, encoding, |ch| u8::try_from(u32::from(ch)).ok())
            }
            Encoding::KOI8_U => encode_with(text, encoding, koi8_u_byte),
            _ => encode_single_byte(text, encoding),
        }
    }
}

impl Transcoder for CharsetTranscoder {
    fn transcode(
        &self,
        bytes: &[u8],
        from: Encoding,
        to: Encoding,
    ) -> Result<Vec<u8>, TranscodeError> {
        let text = self.decode(bytes, from)?;
        self.encode(&text, to)
    }
}

fn codec_for(encoding: Encoding) -> &'static encoding_rs::Encoding {
    match encoding {
        Encoding::UTF8 => encoding_rs::UTF_8,
        Encoding::ISO_8859_5 => encoding_rs::ISO_8859_5,
        Encoding::ISO_8859_15 => encoding_rs::ISO_8859_15,
        Encoding::WINDOWS_1251 => encoding_rs::WINDOWS_1251,
        Encoding::KOI8_R => encoding_rs::KOI8_R,
        Encoding::KOI8_U => encoding_rs::KOI8_U,
        Encoding::WINDOWS_1252 => encoding_rs::WINDOWS_1252,
        // handled in CharsetTranscoder before any codec lookup
        Encoding::ASCII | Encoding::ISO_8859_1 => {
            unreachable!("{encoding} has no encoding_rs codec")
        }
    }
}

fn decode_single_byte(bytes: &[u8], encoding: Encoding) -> Result<Cow<'_, str>, TranscodeError> {
    let codec = codec_for(encoding);
    codec
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or_else(|| {
            // Locate the first byte the codec rejects on its own
            let position = bytes
                .iter()
                .position(|b| {
                    codec
                        .decode_without_bom_handling_and_without_replacement(std::slice::from_ref(b))
                        .is_none()
                })
                .unwrap_or(0);
            TranscodeError::UnmappableSource {
                encoding,
                byte: bytes.get(position).copied().unwrap_or_default(),
                position,
            }
        })
}

// encoding_rs labels KOI8-RU as KOI8-U. RFC 2319 has box drawing at 0xAE and
// 0xBE where KOI8-RU has the Belarusian short U.
fn koi8_u_from_whatwg(character: char) -> char {
    match character {
        '\u{045E}' => '\u{255D}',
        '\u{040E}' => '\u{256C}',
        other => other,
    }
}

fn koi8_u_byte(character: char) -> Option<u8> {
    match character {
        '\u{255D}' => Some(0xAE),
        '\u{256C}' => Some(0xBE),
        '\u{045E}' | '\u{040E}' => None,
        other => {
            let mut buffer = [0; 4];
            let (bytes, _, had_errors) = encoding_rs::KOI8_U.encode(other.encode_utf8(&mut buffer));
            match (had_errors, bytes.as_ref()) {
                (false, &[byte]) => Some(byte),
                _ => None,
            }
        }
    }
}

fn encode_with(
    text: &str,
    encoding: Encoding,
    map: impl Fn(char) -> Option<u8>,
) -> Result<Vec<u8>, TranscodeError> {
    let mut output = Vec::with_capacity(text.len());
    for (position, character) in text.char_indices() {
        match map(character) {
            Some(byte) => output.push(byte),
            None => {
                return Err(TranscodeError::UnmappableTarget {
                    encoding,
                    character,
                    position,
                });
            }
        }
    }
    Ok(output)
}

fn encode_single_byte(text: &str, encoding: Encoding) -> Result<Vec<u8>, TranscodeError> {
    let mut encoder = codec_for(encoding).new_encoder();
    let mut output = Vec::with_capacity(text.len());
    let mut read = 0;

    loop {
        let (result, consumed) =
            encoder.encode_from_utf8_to_vec_without_replacement(&text[read..], &mut output, true);
        read += consumed;
        match result {
            EncoderResult::InputEmpty => return Ok(output),
            EncoderResult::OutputFull => output.reserve(text.len() - read + 1),
            EncoderResult::Unmappable(character) => {
                return Err(TranscodeError::UnmappableTarget {
                    encoding,
                    character,
                    position: read - character.len_utf8(),
                });
            }
        }
    }
}
