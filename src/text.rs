//! String payloads and their text encodings.
//!
//! A [`Text`] is an optional byte payload plus an optional encoding label.
//! No payload means a null string (written as the Null byte); an empty payload
//! is an empty string; everything else is bytes interpreted through the label,
//! defaulting to UTF-8. Two shapes get dedicated wire fast paths: the single
//! UTF-16 code unit forms produced by [`Text::from_char`], and a 16-byte
//! unlabelled payload holding a UUID.

use bytes::Bytes;
use uuid::Uuid;

use crate::Value;

/// Known text encodings for string payloads.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TextEncoding {
    Ascii,
    Utf8,
    Utf16Le,
    Utf16Be,
    Utf32,
    Latin1,
    /// An unrecognized code page, carried by number. Payloads with a custom
    /// page round-trip as raw bytes but cannot be decoded to text here.
    Custom(u32),
}

use TextEncoding::*;

impl TextEncoding {
    /// Decodes a payload to a string, or `None` when the bytes are not valid
    /// for this encoding.
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            Ascii => {
                if bytes.is_ascii() {
                    String::from_utf8(bytes.to_vec()).ok()
                } else {
                    None
                }
            }
            Utf8 => String::from_utf8(bytes.to_vec()).ok(),
            Utf16Le => {
                if bytes.len() % 2 != 0 {
                    return None;
                }
                let units: Vec<u16> = bytes
                    .chunks(2)
                    .map(|c| u16::from_le_bytes([c[0], c[1]]))
                    .collect();
                String::from_utf16(&units).ok()
            }
            Utf16Be => {
                if bytes.len() % 2 != 0 {
                    return None;
                }
                let units: Vec<u16> = bytes
                    .chunks(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect();
                String::from_utf16(&units).ok()
            }
            Utf32 => {
                if bytes.len() % 4 != 0 {
                    return None;
                }
                bytes
                    .chunks(4)
                    .map(|c| {
                        std::char::from_u32(u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    })
                    .collect()
            }
            Latin1 => Some(bytes.iter().map(|b| *b as char).collect()),
            Custom(_) => None,
        }
    }

    /// Encodes a string to a payload, or `None` when the string cannot be
    /// represented in this encoding.
    pub fn encode(&self, text: &str) -> Option<Vec<u8>> {
        match self {
            Ascii => {
                if text.is_ascii() {
                    Some(text.as_bytes().to_vec())
                } else {
                    None
                }
            }
            Utf8 => Some(text.as_bytes().to_vec()),
            Utf16Le => Some(
                text.encode_utf16()
                    .flat_map(|u| u.to_le_bytes().to_vec())
                    .collect(),
            ),
            Utf16Be => Some(
                text.encode_utf16()
                    .flat_map(|u| u.to_be_bytes().to_vec())
                    .collect(),
            ),
            Utf32 => Some(
                text.chars()
                    .flat_map(|c| (c as u32).to_le_bytes().to_vec())
                    .collect(),
            ),
            Latin1 => {
                let mut out = Vec::with_capacity(text.len());
                for c in text.chars() {
                    if c as u32 > 0xff {
                        return None;
                    }
                    out.push(c as u32 as u8);
                }
                Some(out)
            }
            Custom(_) => None,
        }
    }
}

/// An optional byte payload plus an optional encoding label.
#[derive(Clone, Debug)]
pub struct Text {
    bytes: Option<Bytes>,
    encoding: Option<TextEncoding>,
}

impl Text {
    /// The null string (absent payload).
    pub fn null() -> Text {
        Text {
            bytes: None,
            encoding: None,
        }
    }

    /// The empty string.
    pub fn empty() -> Text {
        Text {
            bytes: Some(Bytes::new()),
            encoding: None,
        }
    }

    /// A raw byte payload with no encoding label.
    pub fn from_bytes(bytes: Vec<u8>) -> Text {
        Text {
            bytes: Some(Bytes::from(bytes)),
            encoding: None,
        }
    }

    /// A byte payload with an explicit encoding label.
    pub fn with_encoding(bytes: Vec<u8>, encoding: Option<TextEncoding>) -> Text {
        Text {
            bytes: Some(Bytes::from(bytes)),
            encoding,
        }
    }

    /// A string: single characters take the compact character representation,
    /// anything else is UTF-8.
    pub fn from_string(text: &str) -> Text {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Text::from_char(c),
            _ => Text {
                bytes: Some(Bytes::from(text.as_bytes().to_vec())),
                encoding: Some(Utf8),
            },
        }
    }

    /// A single character: one Latin-1 byte when it fits, else one UTF-16
    /// code unit, else (outside the basic multilingual plane) UTF-8.
    pub fn from_char(c: char) -> Text {
        let cp = c as u32;
        if cp <= 0xff {
            Text {
                bytes: Some(Bytes::from(vec![cp as u8])),
                encoding: Some(Latin1),
            }
        } else if cp <= 0xffff {
            Text {
                bytes: Some(Bytes::from(vec![(cp & 0xff) as u8, (cp >> 8) as u8])),
                encoding: Some(Utf16Le),
            }
        } else {
            Text {
                bytes: Some(Bytes::from(c.to_string().into_bytes())),
                encoding: Some(Utf8),
            }
        }
    }

    /// The payload shape the wire's single-code-unit fast path decodes to.
    pub fn from_utf16_unit(unit: u16) -> Text {
        if unit <= 0xff {
            Text {
                bytes: Some(Bytes::from(vec![unit as u8])),
                encoding: Some(Latin1),
            }
        } else {
            Text {
                bytes: Some(Bytes::from(vec![(unit & 0xff) as u8, (unit >> 8) as u8])),
                encoding: Some(Utf16Le),
            }
        }
    }

    /// A UUID as its 16 raw bytes with no encoding label.
    pub fn from_uuid(uuid: Uuid) -> Text {
        Text {
            bytes: Some(Bytes::from(uuid.as_bytes().to_vec())),
            encoding: None,
        }
    }

    pub fn is_null(&self) -> bool { self.bytes.is_none() }

    pub fn is_empty(&self) -> bool { self.bytes.as_ref().map_or(true, |b| b.is_empty()) }

    pub fn as_bytes(&self) -> Option<&Bytes> { self.bytes.as_ref() }

    pub fn encoding(&self) -> Option<TextEncoding> { self.encoding }

    /// Whether the payload is exactly one UTF-16 code unit in the shape
    /// [`Text::from_char`] produces, and if so which unit.
    pub(crate) fn as_utf16_unit(&self) -> Option<u16> {
        match (self.bytes.as_deref(), self.encoding) {
            (Some([b]), Some(Latin1)) => Some(*b as u16),
            (Some([lo, hi]), Some(Utf16Le)) => {
                let unit = u16::from_le_bytes([*lo, *hi]);
                if unit > 0xff {
                    Some(unit)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Decodes the payload through its encoding label (UTF-8 when absent).
    /// `None` for null text, undecodable bytes, or custom code pages.
    pub fn decoded(&self) -> Option<String> {
        let bytes = self.bytes.as_ref()?;
        self.encoding.unwrap_or(Utf8).decode(bytes)
    }

    /// The first character: direct for the fast-path shapes, else through the
    /// decoded string.
    pub fn to_char(&self) -> Option<char> {
        match self.bytes.as_deref() {
            Some([b]) => Some(*b as char),
            Some([lo, hi]) => std::char::from_u32(u16::from_le_bytes([*lo, *hi]) as u32),
            _ => self.decoded()?.chars().next(),
        }
    }

    /// A UUID from a 16-byte payload, or parsed from the decoded text.
    pub fn to_uuid(&self) -> Option<Uuid> {
        if let Some(bytes) = self.bytes.as_ref() {
            if bytes.len() == 16 {
                return Uuid::from_slice(bytes).ok();
            }
        }
        Uuid::parse_str(&self.decoded()?).ok()
    }

    /// Best-effort conversion from any value: booleans, integers and floats
    /// render their canonical textual form; arrays cast through their first
    /// element.
    pub fn cast(value: &Value) -> Option<Text> {
        match value {
            Value::Null => None,
            Value::Str(t) => Some(t.clone()),
            Value::Bool(b) => Some(Text::from_string(if *b { "true" } else { "false" })),
            Value::Int(i) => Some(Text::from_string(&i.to_string())),
            Value::Float(f) => Some(Text::from_string(&f.to_string())),
            Value::Array(a) => a.first().and_then(Text::cast),
            Value::Dict(_) => None,
        }
    }
}

impl PartialEq for Text {
    fn eq(&self, other: &Text) -> bool {
        match (&self.bytes, &other.bytes) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                if a.is_empty() && b.is_empty() {
                    return true;
                }
                a == b && self.encoding == other.encoding
            }
            _ => false,
        }
    }
}
