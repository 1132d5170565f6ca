//! Typed error kinds surfaced through [`failure::Error`].

use failure::Fail;

/// An error encountered while decoding a value from a byte stream.
///
/// Decoding a value from a completely exhausted stream is not an error (it
/// yields `Null`); these fire once a control byte has been consumed and the
/// rest of the value cannot be produced.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Fail)]
pub enum DecodeError {
    /// The stream ended in the middle of a value.
    #[fail(display = "unexpected end of stream while decoding a value")]
    UnexpectedEndOfStream,
    /// A control byte whose metadata bits match no known variant layout.
    #[fail(display = "unsupported type tag: {:#010b}", _0)]
    UnsupportedTypeTag(u8),
    /// A length or count position held a value that is not an integer.
    #[fail(display = "length field did not hold an integer")]
    BadLengthField,
}

/// An error raised while compressing dictionary keys.
#[derive(Clone, Eq, PartialEq, Debug, Fail)]
pub enum KeyPackError {
    /// More distinct shared prefixes than the sentinel code-point range can
    /// index.
    #[fail(
        display = "dictionary has {} distinct key prefixes, more than the sentinel range can index",
        prefixes
    )]
    KeyCollisionUnrepresentable { prefixes: usize },
    /// A key contains a code point from the reserved sentinel range.
    #[fail(
        display = "dictionary key {:?} contains a code point reserved for prefix compression",
        key
    )]
    ReservedCharacterInKey { key: String },
}

/// An error raised by the structural binder.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Fail)]
pub enum BindError {
    /// No constructor (nor a parameterless fallback) produced an instance of
    /// the target shape.
    #[fail(display = "no viable constructor for target type `{}`", type_name)]
    NoViableConstructor { type_name: &'static str },
}
