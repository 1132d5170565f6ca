//! Common imports for working with EDS values.

pub use crate::{
    binder::{deserialize, from_value, serialize, serialize_into, to_value},
    binder::{Ctor, Member, MemberKind, Reflect, Shape},
    config::{Config, DictionaryStrategy, Endianness},
    dict::Dict,
    encoding::{decode, decode_full, encode, encode_full},
    errors::{BindError, DecodeError, KeyPackError},
    float::{Fixed128, Float},
    inum::Inum,
    text::{Text, TextEncoding},
    Value,
};
pub use bytes::{Bytes, IntoBuf};
pub use half::f16;
pub use num_bigint::BigInt;
pub use uuid::Uuid;
