//! Codec configuration.
//!
//! A [`Config`] is passed explicitly to every encode/decode entry point; the
//! codec never consults global state. [`Config::default`] mirrors the
//! historical defaults of the format's reference implementation.

/// Byte order of multi-byte payloads.
///
/// Only little-endian payloads are defined by the wire format today; the
/// big-endian variant is declared for forward use and is not interpreted by
/// any codec.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Endianness {
    LittleEndian,
    BigEndian,
}

/// How dictionary keys are written for maps with more than fifteen entries.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DictionaryStrategy {
    /// Keys are always written at full length.
    FullCompatibility,
    /// Shared key prefixes are replaced by sentinel code points.
    Compact,
}

/// Options recognized by the codec and the structural binder.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Config {
    /// Key encoding preference for large dictionaries.
    pub dictionary_strategy: DictionaryStrategy,
    /// Declared payload byte order (see [`Endianness`]).
    pub byte_endianness: Endianness,
    /// Compare dictionary keys and member names case-insensitively.
    pub ignore_case: bool,
    /// Binder visibility: walk plain fields.
    pub include_fields: bool,
    /// Binder visibility: walk members without a setter.
    pub include_readonly_members: bool,
    /// Binder visibility: walk non-public members.
    pub include_private_members: bool,
}

/// The default configuration as a constant, for contexts that need one at
/// compile time.
pub const DEFAULT_CONFIG: Config = Config {
    dictionary_strategy: DictionaryStrategy::FullCompatibility,
    byte_endianness: Endianness::LittleEndian,
    ignore_case: true,
    include_fields: true,
    include_readonly_members: true,
    include_private_members: false,
};

impl Default for Config {
    fn default() -> Config { DEFAULT_CONFIG }
}
