//! Recursive conversion of nested containers of text values

use indexmap::IndexMap;

use crate::catalog::GroupId;
use crate::convert::{Converted, Converter};
use crate::transcode::Transcoder;
use crate::{Encoding, Result};

/// Mapping key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// Text key in a not yet known encoding
    Text(Vec<u8>),
    /// Integer key, never converted
    Int(i64),
}

/// Non-text leaf value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    /// Absent value
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point number
    Float(f64),
}

/// Node of a nested container
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Text leaf in a not yet known encoding
    Text(Vec<u8>),
    /// Any other leaf, passed through untouched
    Scalar(Scalar),
    /// Ordered list of nodes
    Sequence(Vec<Node>),
    /// Insertion-ordered mapping
    Mapping(IndexMap<Key, Node>),
}

impl From<&str> for Key {
    fn from(text: &str) -> Self {
        Key::Text(text.as_bytes().to_vec())
    }
}

impl From<&[u8]> for Key {
    fn from(bytes: &[u8]) -> Self {
        Key::Text(bytes.to_vec())
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::Text(text.as_bytes().to_vec())
    }
}

impl From<&[u8]> for Node {
    fn from(bytes: &[u8]) -> Self {
        Node::Text(bytes.to_vec())
    }
}

impl From<Scalar> for Node {
    fn from(scalar: Scalar) -> Self {
        Node::Scalar(scalar)
    }
}

impl<K: Into<Key>, V: Into<Node>> FromIterator<(K, V)> for Node {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Node::Mapping(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl<T: Transcoder> Converter<T> {
    /// Convert every text value of `node`, and text keys when `convert_keys`
    ///
    /// `convert_keys` holds at every nesting level, so nested keys stay
    /// untouched when it is false.
    ///
    /// The source encoding is threaded through the walk: once the first text
    /// has been detected, every later one is decoded with the same encoding.
    /// Entries are moved under their converted keys; if two keys convert to
    /// the same bytes the later entry replaces the earlier one, keeping the
    /// earlier position. Callers that rely on unique keys must check sizes.
    pub fn convert_container(
        &self,
        node: Node,
        target: Encoding,
        source: Option<Encoding>,
        group: Option<GroupId>,
        convert_keys: bool,
    ) -> Result<Converted<Node>> {
        let mut walk = Walk {
            converter: self,
            target,
            source,
            group,
            convert_keys,
        };
        let value = walk.node(node)?;

        Ok(Converted {
            value,
            source_encoding: walk.source,
        })
    }
}

struct Walk<'c, T> {
    converter: &'c Converter<T>,
    target: Encoding,
    source: Option<Encoding>,
    group: Option<GroupId>,
    convert_keys: bool,
}

impl<T: Transcoder> Walk<'_, T> {
    fn node(&mut self, node: Node) -> Result<Node> {
        match node {
            Node::Text(text) => self.text(&text).map(Node::Text),
            Node::Scalar(scalar) => Ok(Node::Scalar(scalar)),
            Node::Sequence(items) => items
                .into_iter()
                .map(|item| self.node(item))
                .collect::<Result<Vec<_>>>()
                .map(Node::Sequence),
            Node::Mapping(entries) => {
                let mut converted = IndexMap::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = match key {
                        Key::Text(text) if self.convert_keys => Key::Text(self.text(&text)?),
                        key => key,
                    };
                    let value = self.node(value)?;
                    converted.insert(key, value);
                }
                Ok(Node::Mapping(converted))
            }
        }
    }

    fn text(&mut self, text: &[u8]) -> Result<Vec<u8>> {
        let converted = self
            .converter
            .convert_string(text, self.target, self.source, self.group)?;
        self.source = converted.source_encoding;
        Ok(converted.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converter() -> Converter {
        Converter::new(GroupId::Latin).unwrap()
    }

    fn mapping(entries: Vec<(Key, Node)>) -> Node {
        Node::Mapping(entries.into_iter().collect())
    }

    #[test]
    fn test_convert_keys_and_values() {
        let node: Node = [("äö", "üß"), ("ab", "ac")].into_iter().collect();

        let converted = converter()
            .convert_container(node, Encoding::WINDOWS_1252, Some(Encoding::UTF8), None, true)
            .unwrap();

        let expected = mapping(vec![
            (Key::Text(vec![0xE4, 0xF6]), Node::Text(vec![0xFC, 0xDF])),
            (Key::from("ab"), Node::from("ac")),
        ]);
        assert_eq!(converted.value, expected);
        assert_eq!(converted.source_encoding, Some(Encoding::UTF8));
    }

    #[test]
    fn test_keys_left_alone_when_disabled() {
        let node: Node = [("äö", "üß")].into_iter().collect();

        let converted = converter()
            .convert_container(node, Encoding::WINDOWS_1252, Some(Encoding::UTF8), None, false)
            .unwrap();

        let expected = mapping(vec![(Key::from("äö"), Node::Text(vec![0xFC, 0xDF]))]);
        assert_eq!(converted.value, expected);
    }

    #[test]
    fn test_nested_keys_left_alone_when_disabled() {
        let inner: Node = [("ß", "ö")].into_iter().collect();
        let node = mapping(vec![(Key::from("äö"), inner)]);

        let converted = converter()
            .convert_container(node, Encoding::ISO_8859_1, Some(Encoding::UTF8), None, false)
            .unwrap();

        let expected = mapping(vec![(
            Key::from("äö"),
            mapping(vec![(Key::from("ß"), Node::Text(vec![0xF6]))]),
        )]);
        assert_eq!(converted.value, expected);
    }

    #[test]
    fn test_first_detection_is_reused() {
        // the first value decides the encoding for the rest of the walk
        let node = Node::Sequence(vec![Node::from("ä"), Node::from("ö")]);
        let converted = converter()
            .convert_container(node, Encoding::WINDOWS_1252, None, None, true)
            .unwrap();
        assert_eq!(converted.source_encoding, Some(Encoding::UTF8));
        assert_eq!(
            converted.value,
            Node::Sequence(vec![Node::Text(vec![0xE4]), Node::Text(vec![0xF6])])
        );

        // "plain" is detected as ASCII, which cannot decode "ü"
        let node = Node::Sequence(vec![Node::from("plain"), Node::from("ü")]);
        let err = converter()
            .convert_container(node, Encoding::ISO_8859_1, None, None, true)
            .unwrap_err();
        assert_eq!(
            err,
            crate::Error::Transcoding(crate::TranscodeError::UnmappableSource {
                encoding: Encoding::ASCII,
                byte: 0xC3,
                position: 0,
            })
        );
    }

    #[test]
    fn test_nested_values_and_scalars() {
        let inner = mapping(vec![
            (Key::from("ß"), Node::from("ö")),
            (Key::Int(7), Node::Scalar(Scalar::Float(1.5))),
        ]);
        let node = mapping(vec![
            (Key::Int(0), Node::Scalar(Scalar::Null)),
            (Key::from("nested"), inner),
            (
                Key::from("list"),
                Node::Sequence(vec![Node::from("ä"), Node::Scalar(Scalar::Bool(true))]),
            ),
        ]);

        let converted = converter()
            .convert_container(node, Encoding::ISO_8859_1, Some(Encoding::UTF8), None, true)
            .unwrap();

        let expected = mapping(vec![
            (Key::Int(0), Node::Scalar(Scalar::Null)),
            (
                Key::from("nested"),
                mapping(vec![
                    (Key::Text(vec![0xDF]), Node::Text(vec![0xF6])),
                    (Key::Int(7), Node::Scalar(Scalar::Float(1.5))),
                ]),
            ),
            (
                Key::from("list"),
                Node::Sequence(vec![Node::Text(vec![0xE4]), Node::Scalar(Scalar::Bool(true))]),
            ),
        ]);
        assert_eq!(converted.value, expected);
    }

    #[test]
    fn test_colliding_keys_last_write_wins() {
        struct AsciiUppercase;

        impl Transcoder for AsciiUppercase {
            fn transcode(
                &self,
                bytes: &[u8],
                _from: Encoding,
                _to: Encoding,
            ) -> std::result::Result<Vec<u8>, crate::TranscodeError> {
                Ok(bytes.to_ascii_uppercase())
            }
        }

        let converter = Converter::with_transcoder(
            crate::EncodingGroupRegistry::new(GroupId::Latin).unwrap(),
            AsciiUppercase,
        );
        let node = mapping(vec![
            (Key::from("id"), Node::from("first")),
            (Key::from("x"), Node::from("middle")),
            (Key::from("ID"), Node::from("second")),
        ]);

        let converted = converter
            .convert_container(node, Encoding::UTF8, None, None, true)
            .unwrap();

        let expected = mapping(vec![
            (Key::from("ID"), Node::from("SECOND")),
            (Key::from("X"), Node::from("MIDDLE")),
        ]);
        assert_eq!(converted.value, expected);

        // IndexMap equality ignores order, so check positions separately
        let Node::Mapping(entries) = &converted.value else {
            panic!("expected a mapping");
        };
        assert_eq!(
            entries.keys().collect::<Vec<_>>(),
            vec![&Key::from("ID"), &Key::from("X")]
        );
    }

    #[test]
    fn test_scalar_root_passes_through() {
        let converted = converter()
            .convert_container(Node::Scalar(Scalar::Int(3)), Encoding::UTF8, None, None, true)
            .unwrap();
        assert_eq!(converted.value, Node::Scalar(Scalar::Int(3)));
        assert_eq!(converted.source_encoding, None);
    }
}
