//! # EDS
//!
//! EDS is a compact, self-describing binary serialization codec: it turns
//! structured values into a typed byte stream and back without an externally
//! shared schema.
//!
//! # Usage
//!
//! Values are built as [`Value`] trees and moved through the codec with
//! [`encode_full`](encoding::encode_full) and
//! [`decode_full`](encoding::decode_full). A [`Config`](config::Config) is
//! passed to every call; [`Config::default`](config::Config) matches the
//! format's historical defaults.
//!
//! ```
//! use eds::prelude::*;
//!
//! let config = Config::default();
//!
//! let mut map = Dict::with_config(&config);
//! map.insert("answer", Value::from(42));
//! map.insert("greeting", Value::from("Hello World!"));
//!
//! let bytes = encode_full(&Value::Dict(map.clone()), &config).unwrap();
//! let back = decode_full(&bytes, &config).unwrap();
//!
//! assert_eq!(back, Value::Dict(map));
//! ```
//!
//! Mapping your own types through the codec goes through the structural
//! binder: declare a [`Shape`](binder::Shape), implement
//! [`Reflect`](binder::Reflect), and use [`serialize`](binder::serialize) /
//! [`deserialize`](binder::deserialize). The binder matches incoming
//! dictionary keys to declared names by minimizing an edit distance, so it
//! tolerates case and punctuation drift.
//!
//! # Specification
//!
//! This section describes the EDS binary format.
//!
//! ## Control byte
//!
//! The first byte of every value is the *control byte*. Its top 3 bits select
//! the type; the remaining 5 bits are variant metadata. A control byte of
//! exactly `0` is always `Null`.
//!
//! | Type bits | Variant            |
//! | ---       | ---                |
//! | `000`     | Null               |
//! | `001`     | Boolean            |
//! | `010`     | Integer (positive) |
//! | `011`     | Integer (negative) |
//! | `100`     | Float              |
//! | `101`     | String             |
//! | `110`     | Array              |
//! | `111`     | Dictionary         |
//!
//! ## Integers
//!
//! The sign lives in bit 5 of the control byte. Bit 4 is a continuation
//! flag and bits 3-0 carry the first 4 magnitude bits, least significant
//! first, filling from bit 3 downward. Every following byte carries a
//! continuation flag in bit 7 and 7 more magnitude bits. Only bits up to the
//! magnitude's most significant set bit are emitted, so 0 through 15 fit in
//! a single byte and zero is the bare control byte.
//!
//! ## Floats
//!
//! Zero, the infinities and NaN get dedicated one-byte tags. Otherwise the
//! metadata selects a 16-, 32-, 64- or 128-bit payload, written little
//! endian; the encoder always picks the narrowest width that reproduces the
//! value exactly. The 128-bit form is a decimal fixed-point layout (96-bit
//! mantissa, scale, sign).
//!
//! ## Strings
//!
//! A string is either `Null`, a dedicated empty tag, a single UTF-16 code
//! unit (carried as an Integer), a 16-byte unlabelled UUID payload, or a
//! general payload: an encoding label in the control byte (with a custom
//! code-page escape), an Integer byte length, and the bytes. Payloads longer
//! than twenty bytes travel gzip-compressed, marked by bit 4 of the control
//! byte.
//!
//! ## Arrays
//!
//! Up to fifteen elements the length is inline in the control byte's low
//! nibble; longer arrays set bit 4 and carry an Integer length. Elements are
//! self-describing values, mixed variants welcome.
//!
//! ## Dictionaries
//!
//! Up to fifteen entries the count is inline and keys are written in full.
//! Larger maps either write full keys or, in compact mode, build a prefix
//! table: shared key prefixes are replaced by sentinel code points from the
//! private use area, the table travels ahead of the entries, and decoding
//! reverses the substitution. Lengths and counts here, as everywhere, are
//! Integer values.

#![warn(
    deprecated_in_future,
    unsafe_code,
    unused_labels,
    keyword_idents,
    macro_use_extern_crate,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces
)]
#![allow(clippy::cast_lossless)]

pub mod binder;
pub mod config;
pub mod dict;
pub mod encoding;
pub mod errors;
pub mod float;
pub mod inum;
mod json;
pub mod keypack;
pub mod prelude;
pub mod text;
pub mod util;

use failure::{bail, Error};
use half::f16;
use num_bigint::BigInt;
use uuid::Uuid;

use crate::{
    dict::Dict,
    float::{Fixed128, Float},
    inum::Inum,
    text::Text,
};

/// [`Value`] and its variants: the tagged union at the center of the codec.
///
/// # Example
///
/// ```
/// use eds::Value;
///
/// let b = Value::Bool(true);
///
/// let val = match b {
///     Value::Bool(b) => b,
///     _ => panic!(),
/// };
///
/// assert!(val);
/// ```
#[derive(Clone, PartialEq, Debug)]
pub enum Value {
    /// Null. Carries no data.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer of arbitrary magnitude.
    Int(Inum),
    /// Floating-point number in one of four widths.
    Float(Float),
    /// String: an optional byte payload plus an optional encoding label.
    Str(Text),
    /// Ordered sequence of values; duplicates and mixed variants allowed.
    Array(Vec<Value>),
    /// String-keyed map with configurable key case sensitivity.
    Dict(Dict),
}

impl Value {
    /// Indicates whether a value is [`Value::Null`] (a null string counts).
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Str(t) => t.is_null(),
            _ => false,
        }
    }

    /// Tries to read the value as a [`bool`].
    pub fn to_bool(&self) -> Result<bool, Error> {
        match self {
            Value::Bool(b) => Ok(*b),
            _ => bail!("this value is not a `Bool`"),
        }
    }

    /// Tries to borrow the value as an [`Inum`].
    pub fn to_inum(&self) -> Result<&Inum, Error> {
        match self {
            Value::Int(i) => Ok(i),
            _ => bail!("this value is not an `Int`"),
        }
    }

    /// Consumes the value, producing an [`Inum`].
    pub fn into_inum(self) -> Result<Inum, Error> {
        match self {
            Value::Int(i) => Ok(i),
            _ => bail!("this value is not an `Int`"),
        }
    }

    /// Tries to borrow the value as a [`Float`].
    pub fn to_float(&self) -> Result<&Float, Error> {
        match self {
            Value::Float(f) => Ok(f),
            _ => bail!("this value is not a `Float`"),
        }
    }

    /// Tries to borrow the value as a [`Text`].
    pub fn to_text(&self) -> Result<&Text, Error> {
        match self {
            Value::Str(t) => Ok(t),
            _ => bail!("this value is not a `Str`"),
        }
    }

    /// Tries to borrow the value as a vector of values.
    pub fn to_vec(&self) -> Result<&Vec<Value>, Error> {
        match self {
            Value::Array(a) => Ok(a),
            _ => bail!("this value is not an `Array`"),
        }
    }

    /// Consumes the value, producing a vector of values.
    pub fn into_vec(self) -> Result<Vec<Value>, Error> {
        match self {
            Value::Array(a) => Ok(a),
            _ => bail!("this value is not an `Array`"),
        }
    }

    /// Tries to borrow the value as a [`Dict`].
    pub fn to_dict(&self) -> Result<&Dict, Error> {
        match self {
            Value::Dict(d) => Ok(d),
            _ => bail!("this value is not a `Dict`"),
        }
    }

    /// Consumes the value, producing a [`Dict`].
    pub fn into_dict(self) -> Result<Dict, Error> {
        match self {
            Value::Dict(d) => Ok(d),
            _ => bail!("this value is not a `Dict`"),
        }
    }

    /// Best-effort boolean view: integers and floats compare against zero,
    /// strings go through the usual keyword table, arrays cast through their
    /// first element. `None` means no sensible conversion.
    pub fn cast_bool(&self) -> Option<bool> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(!i.is_zero()),
            Value::Float(f) => Some(f.to_f64() != 0.0),
            Value::Str(t) => {
                let text = t.decoded()?;
                let text = text.trim().to_lowercase();
                match text.as_str() {
                    "" | "null" | "undefined" => None,
                    "f" | "0" | "false" | "no" | "off" => Some(false),
                    "t" | "1" | "true" | "yes" | "on" => Some(true),
                    other => {
                        if let Ok(i) = other.parse::<i64>() {
                            Some(i != 0)
                        } else if let Ok(f) = other.parse::<f64>() {
                            Some(f != 0.0)
                        } else {
                            Some(!other.is_empty())
                        }
                    }
                }
            }
            Value::Array(a) => a.first().and_then(Value::cast_bool),
            Value::Dict(_) => None,
        }
    }

    /// Best-effort array view: arrays pass through, `Null` is absent, any
    /// other value wraps itself as a single element.
    pub fn cast_array(&self) -> Option<Vec<Value>> {
        match self {
            Value::Null => None,
            Value::Array(a) => Some(a.clone()),
            other => Some(vec![other.clone()]),
        }
    }
}

// bool
from_fn!(Value, bool, Value::Bool);
try_from_ctor!(Value, bool, Bool);

// integers
from_fn!(Value, Inum, Value::Int);
try_from_ctor!(Value, Inum, Int);
compose_from!(Value, Inum, BigInt);
compose_from!(Value, Inum, i64);
compose_from!(Value, Inum, u64);
compose_from!(Value, Inum, i128);
compose_from!(Value, Inum, u128);
from_prims!(Value);

// floats
from_fn!(Value, Float, Value::Float);
try_from_ctor!(Value, Float, Float);
compose_from!(Value, Float, f16);
compose_from!(Value, Float, f32);
compose_from!(Value, Float, f64);
compose_from!(Value, Float, Fixed128);

// strings
from_fn!(Value, Text, Value::Str);
try_from_ctor!(Value, Text, Str);
from_fn!(Value, char, |c| Value::Str(Text::from_char(c)));
from_fn!(Value, Uuid, |u| Value::Str(Text::from_uuid(u)));

impl From<&str> for Value {
    fn from(s: &str) -> Value { Value::Str(Text::from_string(s)) }
}

impl From<String> for Value {
    fn from(s: String) -> Value { Value::Str(Text::from_string(&s)) }
}

// containers
from_fn!(Value, Dict, Value::Dict);
try_from_ctor!(Value, Dict, Dict);
try_from_ctor!(Value, Vec<Value>, Array);

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Value { Value::Array(v.into_iter().map(T::into).collect()) }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        fn fmt_text(t: &Text) -> String {
            match t.decoded() {
                Some(s) => format!("{:?}", s),
                None => match t.as_bytes() {
                    Some(bytes) => {
                        let mut out = String::from("b\"");
                        for b in bytes.iter() {
                            out.push_str(&format!("{:02x}", b));
                        }
                        out.push('"');
                        out
                    }
                    None => "null".to_owned(),
                },
            }
        }

        fn fmt_map(m: &Dict, indent: usize) -> String {
            let mut out = String::from("{");
            for (i, (k, v)) in m.iter().enumerate() {
                if i == 0 {
                    out.push_str(&format!("\n{:indent$}", "", indent = indent + 2));
                } else {
                    out.push_str(&format!(",\n{:indent$}", "", indent = indent + 2));
                }
                out.push_str(&format!("{:?}: {}", k, fmt_helper(v, indent + 2)));
                if i == m.len() - 1 {
                    out.push_str(&format!("\n{:indent$}", "", indent = indent));
                }
            }
            out.push('}');
            out
        }

        fn fmt_helper(v: &Value, indent: usize) -> String {
            match v {
                Value::Null => "null".to_owned(),
                Value::Bool(b) => if *b { "true" } else { "false" }.to_owned(),
                Value::Int(i) => format!("{}", i),
                Value::Float(x) => format!("{}", x),
                Value::Str(t) => fmt_text(t),
                Value::Array(a) => {
                    let mut out = String::from("[");
                    for (i, item) in a.iter().enumerate() {
                        if i != 0 {
                            out.push_str(", ");
                        }
                        out.push_str(&fmt_helper(item, indent));
                    }
                    out.push(']');
                    out
                }
                Value::Dict(m) => fmt_map(m, indent),
            }
        }

        write!(f, "{}", fmt_helper(self, 0))
    }
}
