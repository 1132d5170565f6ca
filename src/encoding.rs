//! The EDS binary encoder and decoder.
//!
//! Every value is one control byte followed by variant-specific bytes. The
//! top 3 bits of the control byte select the type; the remaining 5 bits are
//! variant metadata. Multi-byte lengths and counts anywhere in the format are
//! themselves complete Integer values, so nothing is capped at a fixed width.
//!
//! # Example
//!
//! ```
//! use eds::prelude::*;
//!
//! let config = Config::default();
//! let value = Value::from(vec![1, 2, 3]);
//!
//! let bytes = encode_full(&value, &config).unwrap();
//! let back = decode_full(&bytes, &config).unwrap();
//!
//! assert_eq!(back, value);
//! ```

use bytes::{Buf, IntoBuf};
use failure::{format_err, Error};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use smallvec::SmallVec;
use std::{
    convert::TryFrom,
    io::{Read, Write},
};

use crate::{
    config::{Config, DictionaryStrategy},
    dict::Dict,
    errors::DecodeError,
    float::{Fixed128, Float, Narrow},
    inum::Inum,
    keypack::KeyCompressor,
    text::{Text, TextEncoding},
    util::significant_bits,
    Value,
};

/// 0xe0
pub const MASK_TYPE: u8 = 0b1110_0000;
/// 0x1f
pub const MASK_META: u8 = 0b0001_1111;
/// Null type bits, 0x00
pub const TYPE_NULL: u8 = 0b0000_0000;
/// Boolean type bits, 0x20
pub const TYPE_BOOL: u8 = 0b0010_0000;
/// Positive integer type bits, 0x40
pub const TYPE_INT: u8 = 0b0100_0000;
/// Negative integer type bits (the sign lives in bit 5), 0x60
pub const TYPE_INT_NEG: u8 = 0b0110_0000;
/// Float type bits, 0x80
pub const TYPE_FLOAT: u8 = 0b1000_0000;
/// String type bits, 0xa0
pub const TYPE_STR: u8 = 0b1010_0000;
/// Array type bits, 0xc0
pub const TYPE_ARR: u8 = 0b1100_0000;
/// Dictionary type bits, 0xe0
pub const TYPE_MAP: u8 = 0b1110_0000;

/// Long-form indicator bit for arrays and dictionaries, 0x10
pub const BIG_BIT: u8 = 0b0001_0000;
/// Inline length bits, 0x0f
pub const MASK_LEN_BITS: u8 = 0b0000_1111;

/// Integer continuation flag of the control byte.
pub const INT_FIRST_MORE: u8 = 0b0001_0000;
/// Integer continuation flag of every later byte.
pub const INT_MORE: u8 = 0b1000_0000;

pub const BOOL_FALSE: u8 = TYPE_BOOL;
pub const BOOL_TRUE: u8 = TYPE_BOOL | 1;

pub const FLOAT_ZERO: u8 = TYPE_FLOAT;
pub const FLOAT_POS_INF: u8 = TYPE_FLOAT | 0b001;
pub const FLOAT_NEG_INF: u8 = TYPE_FLOAT | 0b010;
pub const FLOAT_NAN: u8 = TYPE_FLOAT | 0b011;
/// Width cases are matched under this mask.
pub const FLOAT_WIDTH_MASK: u8 = 0b1110_0111;
pub const FLOAT_F16: u8 = TYPE_FLOAT | 0b100;
pub const FLOAT_F32: u8 = TYPE_FLOAT | 0b101;
pub const FLOAT_F64: u8 = TYPE_FLOAT | 0b110;
pub const FLOAT_F128: u8 = TYPE_FLOAT | 0b111;

pub const STR_EMPTY: u8 = TYPE_STR;
pub const STR_BINARY: u8 = TYPE_STR | 1;
pub const STR_ASCII: u8 = TYPE_STR | 2;
pub const STR_UTF8: u8 = TYPE_STR | 3;
pub const STR_UTF16LE: u8 = TYPE_STR | 4;
pub const STR_UTF16BE: u8 = TYPE_STR | 5;
pub const STR_UTF32: u8 = TYPE_STR | 6;
pub const STR_LATIN1: u8 = TYPE_STR | 7;
pub const STR_CUSTOM: u8 = TYPE_STR | 8;
/// Single UTF-16 code unit fast path.
pub const STR_CHAR: u8 = TYPE_STR | 9;
/// 16 raw bytes, no length field.
pub const STR_UUID: u8 = TYPE_STR | 10;
/// Compressed-payload flag; never set on the fixed-size fast paths.
pub const STR_COMPRESSED: u8 = 0b0001_0000;
/// Payloads longer than this are compressed before writing.
pub const COMPRESS_THRESHOLD: usize = 20;

pub const ARR_SHORT: u8 = TYPE_ARR;
pub const ARR_LONG: u8 = TYPE_ARR | BIG_BIT;

pub const MAP_SMALL: u8 = TYPE_MAP;
/// Prefix-compressed keys.
pub const MAP_COMPACT: u8 = TYPE_MAP | BIG_BIT | 1;
/// Full-length keys.
pub const MAP_FULL: u8 = TYPE_MAP | BIG_BIT | 2;

/// Encodes a value into `out`.
pub fn encode(value: &Value, config: &Config, out: &mut Vec<u8>) -> Result<(), Error> {
    match value {
        Value::Null => out.push(TYPE_NULL),
        Value::Bool(b) => out.push(if *b { BOOL_TRUE } else { BOOL_FALSE }),
        Value::Int(i) => {
            let (negative, magnitude) = i.sign_magnitude();
            write_int(negative, &magnitude, out);
        }
        Value::Float(f) => write_float(f, out),
        Value::Str(t) => write_text(t, config, out)?,
        Value::Array(items) => {
            if items.len() <= MASK_LEN_BITS as usize {
                out.push(ARR_SHORT | items.len() as u8);
            } else {
                out.push(ARR_LONG);
                write_len(items.len(), out);
            }
            for item in items {
                encode(item, config, out)?;
            }
        }
        Value::Dict(d) => write_dict(d, config, out)?,
    }
    Ok(())
}

/// Encodes a value into a fresh byte vector.
pub fn encode_full(value: &Value, config: &Config) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    encode(value, config, &mut out)?;
    Ok(out)
}

/// Decodes one value from a byte cursor. An exhausted stream at the value
/// boundary yields `Null`; truncation after the control byte is an error.
pub fn decode<B: Buf>(data: &mut B, config: &Config) -> Result<Value, Error> {
    if !data.has_remaining() {
        return Ok(Value::Null);
    }
    read_value(data, config)
}

/// Decodes one value from a whole buffer.
pub fn decode_full<B: IntoBuf>(bytes: B, config: &Config) -> Result<Value, Error> {
    decode(&mut bytes.into_buf(), config)
}

/// Reads a value whose presence is required (inside an array, map or length
/// position).
fn read_value<B: Buf>(data: &mut B, config: &Config) -> Result<Value, Error> {
    if !data.has_remaining() {
        return Err(DecodeError::UnexpectedEndOfStream.into());
    }
    let first = data.get_u8();
    read_value_with(data, first, config)
}

/// Dispatches on an already-consumed control byte. Every reader funnels
/// through here, so a foreign control byte re-dispatches to the right variant
/// instead of misreading the payload.
pub fn read_value_with<B: Buf>(data: &mut B, first: u8, config: &Config) -> Result<Value, Error> {
    match first & MASK_TYPE {
        TYPE_NULL => Ok(Value::Null),
        TYPE_BOOL => Ok(Value::Bool(first != BOOL_FALSE)),
        TYPE_INT | TYPE_INT_NEG => read_int_body(data, first).map(Value::Int),
        TYPE_FLOAT => read_float_body(data, first),
        TYPE_STR => read_text_body(data, first, config),
        TYPE_ARR => read_array_body(data, first, config),
        TYPE_MAP => read_dict_body(data, first, config),
        other => Err(DecodeError::UnsupportedTypeTag(other).into()),
    }
}

/// Decodes a value and casts it to a boolean.
pub fn read_bool<B: Buf>(data: &mut B, config: &Config) -> Result<Option<bool>, Error> {
    Ok(decode(data, config)?.cast_bool())
}

/// Decodes a value and casts it to an integer.
pub fn read_int<B: Buf>(data: &mut B, config: &Config) -> Result<Option<Inum>, Error> {
    Ok(Inum::cast(&decode(data, config)?))
}

/// Decodes a value and casts it to a float.
pub fn read_float<B: Buf>(data: &mut B, config: &Config) -> Result<Option<Float>, Error> {
    Ok(Float::cast(&decode(data, config)?))
}

/// Decodes a value and casts it to a string.
pub fn read_text<B: Buf>(data: &mut B, config: &Config) -> Result<Option<Text>, Error> {
    Ok(Text::cast(&decode(data, config)?))
}

/// Decodes a value and casts it to an array.
pub fn read_array<B: Buf>(data: &mut B, config: &Config) -> Result<Option<Vec<Value>>, Error> {
    Ok(decode(data, config)?.cast_array())
}

/// Decodes a value and casts it to a dictionary.
pub fn read_dict<B: Buf>(data: &mut B, config: &Config) -> Result<Option<Dict>, Error> {
    Ok(Dict::cast(&decode(data, config)?))
}

/// Writes a sign flag and the minimal significant bits of a little-endian
/// magnitude: 4 payload bits in the control byte, 7 in every later byte,
/// least significant value bit first, filling each byte from its highest
/// payload position downward.
fn write_int(negative: bool, magnitude_le: &[u8], out: &mut Vec<u8>) {
    let total_bits = significant_bits(magnitude_le);
    let mut current = if negative { TYPE_INT_NEG } else { TYPE_INT };
    let mut shift = 4usize;

    for bit in 0..total_bits {
        if shift == 0 {
            out.push(current);
            current = 0;
            shift = 7;
        }
        if total_bits - bit > shift {
            current |= if bit < 4 { INT_FIRST_MORE } else { INT_MORE };
        }
        shift -= 1;
        if magnitude_le[bit / 8] & (1 << (bit % 8)) != 0 {
            current |= 1 << shift;
        }
    }

    out.push(current);
}

/// Length and count fields are complete Integer values.
fn write_len(len: usize, out: &mut Vec<u8>) {
    write_int(false, &(len as u64).to_le_bytes(), out);
}

fn read_int_body<B: Buf>(data: &mut B, first: u8) -> Result<Inum, Error> {
    let negative = first & MASK_TYPE == TYPE_INT_NEG;
    let mut magnitude: SmallVec<[u8; 16]> = SmallVec::new();
    let mut current = first;
    let mut group = 4usize;
    let mut out_byte = 0u8;
    let mut out_bits = 0usize;

    loop {
        for i in 0..group {
            if current & (1 << (group - 1 - i)) != 0 {
                out_byte |= 1 << (out_bits % 8);
            }
            out_bits += 1;
            if out_bits % 8 == 0 {
                magnitude.push(out_byte);
                out_byte = 0;
            }
        }

        let more_flag = if group == 4 { INT_FIRST_MORE } else { INT_MORE };
        if current & more_flag == 0 {
            break;
        }
        if !data.has_remaining() {
            return Err(DecodeError::UnexpectedEndOfStream.into());
        }
        current = data.get_u8();
        group = 7;
    }

    if out_byte != 0 {
        magnitude.push(out_byte);
    }

    Ok(Inum::from_sign_magnitude(negative, &magnitude))
}

fn write_float(f: &Float, out: &mut Vec<u8>) {
    match f.narrow() {
        Narrow::Zero => out.push(FLOAT_ZERO),
        Narrow::PosInf => out.push(FLOAT_POS_INF),
        Narrow::NegInf => out.push(FLOAT_NEG_INF),
        Narrow::Nan => out.push(FLOAT_NAN),
        Narrow::F16(bits) => {
            out.push(FLOAT_F16);
            out.extend_from_slice(&bits.to_le_bytes());
        }
        Narrow::F32(bits) => {
            out.push(FLOAT_F32);
            out.extend_from_slice(&bits.to_le_bytes());
        }
        Narrow::F64(bits) => {
            out.push(FLOAT_F64);
            out.extend_from_slice(&bits.to_le_bytes());
        }
        Narrow::F128(bits) => {
            out.push(FLOAT_F128);
            out.extend_from_slice(&bits.to_le_bytes());
        }
    }
}

fn read_float_body<B: Buf>(data: &mut B, first: u8) -> Result<Value, Error> {
    let float = match first {
        FLOAT_ZERO => Float::Half(0),
        FLOAT_POS_INF => Float::Half(0x7c00),
        FLOAT_NEG_INF => Float::Half(0xfc00),
        FLOAT_NAN => Float::Half(0x7e00),
        _ => match first & FLOAT_WIDTH_MASK {
            FLOAT_F16 => {
                let b = read_many(data, 2)?;
                Float::Half(u16::from_le_bytes([b[0], b[1]]))
            }
            FLOAT_F32 => {
                let b = read_many(data, 4)?;
                Float::Single(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            }
            FLOAT_F64 => {
                let b = read_many(data, 8)?;
                let mut buf = [0u8; 8];
                buf.copy_from_slice(&b);
                Float::Double(u64::from_le_bytes(buf))
            }
            FLOAT_F128 => {
                let b = read_many(data, 16)?;
                let mut buf = [0u8; 16];
                buf.copy_from_slice(&b);
                Float::Fixed(Fixed128::from_bits(u128::from_le_bytes(buf)))
            }
            _ => return Err(DecodeError::UnsupportedTypeTag(first).into()),
        },
    };
    Ok(Value::Float(float))
}

fn encoding_flag(encoding: Option<TextEncoding>) -> u8 {
    match encoding {
        None => STR_BINARY,
        Some(TextEncoding::Ascii) => STR_ASCII,
        Some(TextEncoding::Utf8) => STR_UTF8,
        Some(TextEncoding::Utf16Le) => STR_UTF16LE,
        Some(TextEncoding::Utf16Be) => STR_UTF16BE,
        Some(TextEncoding::Utf32) => STR_UTF32,
        Some(TextEncoding::Latin1) => STR_LATIN1,
        Some(TextEncoding::Custom(_)) => STR_CUSTOM,
    }
}

fn write_text(text: &Text, _config: &Config, out: &mut Vec<u8>) -> Result<(), Error> {
    let bytes = match text.as_bytes() {
        None => {
            out.push(TYPE_NULL);
            return Ok(());
        }
        Some(b) => b,
    };

    if bytes.is_empty() {
        out.push(STR_EMPTY);
        return Ok(());
    }

    if let Some(unit) = text.as_utf16_unit() {
        out.push(STR_CHAR);
        write_int(false, &unit.to_le_bytes(), out);
        return Ok(());
    }

    if bytes.len() == 16 && text.encoding().is_none() {
        out.push(STR_UUID);
        out.extend_from_slice(bytes);
        return Ok(());
    }

    let flag = encoding_flag(text.encoding());
    let compress = bytes.len() > COMPRESS_THRESHOLD;
    out.push(if compress { flag | STR_COMPRESSED } else { flag });

    if let Some(TextEncoding::Custom(page)) = text.encoding() {
        write_len(page as usize, out);
    }

    if compress {
        let payload = gzip_compress(bytes)?;
        write_len(payload.len(), out);
        out.extend_from_slice(&payload);
    } else {
        write_len(bytes.len(), out);
        out.extend_from_slice(bytes);
    }
    Ok(())
}

fn read_text_body<B: Buf>(data: &mut B, first: u8, config: &Config) -> Result<Value, Error> {
    let compressed = first & STR_COMPRESSED != 0;
    let flag = first & !STR_COMPRESSED;

    let text = match flag {
        STR_EMPTY => Text::empty(),
        STR_CHAR => {
            let unit = match read_int(data, config)? {
                Some(i) => i.to_i128().map(|v| v as u16).unwrap_or(0),
                None => return Err(DecodeError::BadLengthField.into()),
            };
            Text::from_utf16_unit(unit)
        }
        STR_UUID => Text::from_bytes(read_many(data, 16)?),
        STR_BINARY | STR_ASCII | STR_UTF8 | STR_UTF16LE | STR_UTF16BE | STR_UTF32
        | STR_LATIN1 | STR_CUSTOM => {
            let encoding = match flag {
                STR_BINARY => None,
                STR_ASCII => Some(TextEncoding::Ascii),
                STR_UTF8 => Some(TextEncoding::Utf8),
                STR_UTF16LE => Some(TextEncoding::Utf16Le),
                STR_UTF16BE => Some(TextEncoding::Utf16Be),
                STR_UTF32 => Some(TextEncoding::Utf32),
                STR_LATIN1 => Some(TextEncoding::Latin1),
                _ => Some(TextEncoding::Custom(read_length(data, config)? as u32)),
            };
            let len = read_length(data, config)?;
            let mut payload = read_many(data, len)?;
            if compressed {
                payload = gzip_decompress(&payload)?;
            }
            Text::with_encoding(payload, encoding)
        }
        _ => return Err(DecodeError::UnsupportedTypeTag(first).into()),
    };
    Ok(Value::Str(text))
}

fn read_array_body<B: Buf>(data: &mut B, first: u8, config: &Config) -> Result<Value, Error> {
    let len = if first & BIG_BIT == 0 {
        (first & MASK_LEN_BITS) as usize
    } else {
        read_length(data, config)?
    };

    let mut items = Vec::with_capacity(len.min(4096));
    for _ in 0..len {
        items.push(read_value(data, config)?);
    }
    Ok(Value::Array(items))
}

fn write_dict(dict: &Dict, config: &Config, out: &mut Vec<u8>) -> Result<(), Error> {
    let entries: Vec<(&str, &Value)> = dict.iter().collect();
    let compact = dict.compact() || config.dictionary_strategy == DictionaryStrategy::Compact;

    if entries.len() <= MASK_LEN_BITS as usize {
        out.push(MAP_SMALL | entries.len() as u8);
        for (key, value) in &entries {
            write_text(&Text::from_string(key), config, out)?;
            encode(value, config, out)?;
        }
    } else if compact {
        let compressor =
            KeyCompressor::build(entries.iter().map(|(k, _)| *k), config.ignore_case)?;
        out.push(MAP_COMPACT);
        write_len(entries.len(), out);
        write_len(compressor.prefixes().len(), out);
        for prefix in compressor.prefixes() {
            write_text(&Text::from_string(prefix), config, out)?;
        }
        for (key, value) in &entries {
            let mapped = compressor.compress(key).unwrap_or(key);
            write_text(&Text::from_string(mapped), config, out)?;
            encode(value, config, out)?;
        }
    } else {
        out.push(MAP_FULL);
        write_len(entries.len(), out);
        for (key, value) in &entries {
            write_text(&Text::from_string(key), config, out)?;
            encode(value, config, out)?;
        }
    }
    Ok(())
}

fn read_dict_body<B: Buf>(data: &mut B, first: u8, config: &Config) -> Result<Value, Error> {
    let mut dict = Dict::new(config.ignore_case, false);

    let (len, compressor) = if first & BIG_BIT == 0 {
        ((first & MASK_LEN_BITS) as usize, None)
    } else {
        match first {
            MAP_COMPACT => {
                let len = read_length(data, config)?;
                let prefix_count = read_length(data, config)?;
                let mut prefixes = Vec::with_capacity(prefix_count.min(4096));
                for _ in 0..prefix_count {
                    prefixes.push(read_key(data, config)?);
                }
                dict.prefer_compact();
                (len, Some(KeyCompressor::from_prefixes(prefixes)))
            }
            MAP_FULL => (read_length(data, config)?, None),
            _ => return Err(DecodeError::UnsupportedTypeTag(first).into()),
        }
    };

    for _ in 0..len {
        let raw = read_key(data, config)?;
        let key = match &compressor {
            Some(c) => c.expand(&raw),
            None => raw,
        };
        let value = read_value(data, config)?;
        dict.insert(key, value);
    }
    Ok(Value::Dict(dict))
}

fn read_key<B: Buf>(data: &mut B, config: &Config) -> Result<String, Error> {
    let value = read_value(data, config)?;
    Text::cast(&value)
        .and_then(|t| t.decoded())
        .ok_or_else(|| format_err!("dictionary key was not a decodable string"))
}

fn read_length<B: Buf>(data: &mut B, config: &Config) -> Result<usize, Error> {
    let value = read_value(data, config)?;
    let int = Inum::cast(&value).ok_or(DecodeError::BadLengthField)?;
    int.to_u128()
        .and_then(|u| usize::try_from(u).ok())
        .ok_or_else(|| DecodeError::BadLengthField.into())
}

fn read_many<B: Buf>(data: &mut B, len: usize) -> Result<Vec<u8>, Error> {
    if data.remaining() >= len {
        let mut buf = vec![0; len];
        data.copy_to_slice(&mut buf);
        Ok(buf)
    } else {
        Err(DecodeError::UnexpectedEndOfStream.into())
    }
}

fn gzip_compress(plain: &[u8]) -> Result<Vec<u8>, Error> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(plain)?;
    Ok(encoder.finish()?)
}

fn gzip_decompress(compressed: &[u8]) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    GzDecoder::new(compressed).read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn cfg() -> Config { Config::default() }

    fn enc(v: &Value) -> Vec<u8> { encode_full(v, &cfg()).unwrap() }

    fn round_trip(v: &Value) -> Value { decode_full(&enc(v), &cfg()).unwrap() }

    #[test]
    fn null_and_bool_constants() {
        assert_eq!(enc(&Value::Null), vec![0x00]);
        assert_eq!(enc(&Value::Bool(false)), vec![0b0010_0000]);
        assert_eq!(enc(&Value::Bool(true)), vec![0b0010_0001]);

        assert_eq!(round_trip(&Value::Null), Value::Null);
        assert_eq!(round_trip(&Value::Bool(true)), Value::Bool(true));
        assert_eq!(round_trip(&Value::Bool(false)), Value::Bool(false));
    }

    #[test]
    fn int_small_values_take_one_byte() {
        assert_eq!(enc(&Value::from(0)), vec![0b0100_0000]);
        assert_eq!(enc(&Value::from(1)), vec![0b0100_1000]);
        assert_eq!(enc(&Value::from(2)), vec![0b0100_0100]);
        assert_eq!(enc(&Value::from(7)), vec![0b0100_1110]);
        assert_eq!(enc(&Value::from(15)), vec![0b0100_1111]);
        assert_eq!(enc(&Value::from(-1)), vec![0b0110_1000]);
        assert_eq!(enc(&Value::from(-7)), vec![0b0110_1110]);
    }

    #[test]
    fn int_continuation_bytes() {
        // 16 needs a fifth bit, so the control byte sets its continuation flag
        assert_eq!(enc(&Value::from(16)), vec![0b0101_0000, 0b0100_0000]);
        assert_eq!(enc(&Value::from(511)), vec![0b0101_1111, 0b0111_1100]);
        assert_eq!(enc(&Value::from(512)), vec![0b0101_0000, 0b0000_0010]);
    }

    #[test]
    fn int_minimality() {
        // byte count is ceil((significant bits - 4) / 7) + 1
        let cases: &[(i64, usize)] = &[
            (0, 1),
            (15, 1),
            (16, 2),
            (2047, 2),
            (2048, 3),
            (-10000, 3),
            (i64::from(i32::max_value()), 5),
        ];
        for (value, expected) in cases {
            assert_eq!(enc(&Value::from(*value)).len(), *expected, "value {}", value);
        }
    }

    #[test]
    fn int_round_trips() {
        let values: &[i64] = &[
            0, 1, -1, 2, -2, 7, -7, 10, -10, 15, 16, 31, 32, 511, 512, -512, 10_000, -10_000,
            -0xdead, 0xbeef,
            i64::from(i32::max_value()),
            i64::from(i32::min_value()),
            i64::max_value(),
            i64::min_value(),
        ];
        for v in values {
            assert_eq!(round_trip(&Value::from(*v)), Value::from(*v), "value {}", v);
        }
    }

    #[test]
    fn int_big_round_trips() {
        let big = Inum::from(170_141_183_460_469_231_731_687_303_715_884_105_727i128);
        assert_eq!(round_trip(&Value::Int(big.clone())), Value::Int(big));
        let neg = Inum::from(-170_141_183_460_469_231_731_687_303_715_884_105_728i128);
        assert_eq!(round_trip(&Value::Int(neg.clone())), Value::Int(neg));
    }

    #[test]
    fn int_truncated_continuation_fails() {
        let err = decode_full(&[0b0101_0000u8][..], &cfg()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DecodeError>(),
            Some(&DecodeError::UnexpectedEndOfStream)
        );
    }

    #[test]
    fn float_special_tags() {
        assert_eq!(enc(&Value::from(0.0f64)), vec![0x80]);
        assert_eq!(enc(&Value::from(-0.0f64)), vec![0x80]);
        assert_eq!(enc(&Value::from(std::f64::INFINITY)), vec![0x81]);
        assert_eq!(enc(&Value::from(std::f64::NEG_INFINITY)), vec![0x82]);
        assert_eq!(enc(&Value::from(std::f64::NAN)), vec![0x83]);
    }

    #[test]
    fn float_width_selection() {
        // 1.0 fits a half exactly, whatever width it came in as
        assert_eq!(enc(&Value::from(1.0f64)), vec![0x84, 0x00, 0x3c]);
        assert_eq!(enc(&Value::from(1.0f32)), vec![0x84, 0x00, 0x3c]);

        // 0.1f32 has no exact half form
        let bytes = enc(&Value::from(0.1f32));
        assert_eq!(bytes[0], 0x85);
        assert_eq!(&bytes[1..], &0.1f32.to_bits().to_le_bytes()[..]);

        // 1/3 in double precision fits nothing narrower
        let third = 1.0f64 / 3.0;
        let bytes = enc(&Value::from(third));
        assert_eq!(bytes[0], 0x86);
        assert_eq!(&bytes[1..], &third.to_bits().to_le_bytes()[..]);

        // -3.14 has a faithful decimal reading, so the fixed value travels
        // as a plain double
        let bytes = enc(&Value::Float(Float::Fixed(Fixed128::new(true, 2, 314))));
        assert_eq!(bytes[0], 0x86);
        assert_eq!(&bytes[1..], &(-3.14f64).to_bits().to_le_bytes()[..]);

        // 21 significant digits survive only in the 128-bit form
        let precise = Fixed128::new(false, 20, 314_159_265_358_979_323_846);
        let bytes = enc(&Value::Float(Float::Fixed(precise)));
        assert_eq!(bytes[0], 0x87);
        assert_eq!(bytes.len(), 17);
    }

    #[test]
    fn float_round_trips() {
        let values = vec![
            Float::from(0.0f64),
            Float::from(1.0f64),
            Float::from(-1.0f32),
            Float::from(half::f16::from_f32(65504.0)),
            Float::from(0.1f32),
            Float::from(1.0f64 / 3.0),
            Float::from(std::f64::INFINITY),
            Float::from(std::f64::NEG_INFINITY),
            Float::from(std::f64::NAN),
            Float::Fixed(Fixed128::new(true, 2, 314)),
            Float::Fixed(Fixed128::new(true, 20, 314_159_265_358_979_323_846)),
        ];
        for f in values {
            let v = Value::Float(f.clone());
            assert_eq!(round_trip(&v), v, "value {:?}", f);
        }
    }

    #[test]
    fn float_invalid_meta_is_rejected() {
        let err = decode_full(&[0b1000_1000u8][..], &cfg()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DecodeError>(),
            Some(&DecodeError::UnsupportedTypeTag(0b1000_1000))
        );
    }

    #[test]
    fn float_truncated_payload_fails() {
        let err = decode_full(&[0x85u8, 0x00][..], &cfg()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DecodeError>(),
            Some(&DecodeError::UnexpectedEndOfStream)
        );
    }

    #[test]
    fn string_null_and_empty() {
        assert_eq!(enc(&Value::Str(Text::null())), vec![0x00]);
        assert_eq!(enc(&Value::Str(Text::empty())), vec![0xa0]);

        // a null string decodes as the Null value
        assert_eq!(round_trip(&Value::Str(Text::null())), Value::Null);
        assert_eq!(round_trip(&Value::Str(Text::empty())), Value::Str(Text::empty()));
    }

    #[test]
    fn string_single_char_fast_path() {
        let w = Value::from('w');
        assert_eq!(enc(&w), vec![0xa9, 0b0101_1110, 0b0111_0000]);
        assert_eq!(round_trip(&w), w);

        let omega = Value::from('Ω');
        assert_eq!(enc(&omega)[0], 0xa9);
        assert_eq!(round_trip(&omega), omega);
    }

    #[test]
    fn string_general_form() {
        let v = Value::from("Hello World!");
        let bytes = enc(&v);
        assert_eq!(bytes[0], STR_UTF8);
        assert_eq!(bytes[1], 0b0100_0011); // length 12
        assert_eq!(&bytes[2..], b"Hello World!");
        assert_eq!(round_trip(&v), v);

        // two ASCII characters are not a single UTF-16 unit
        let ab = Value::from("ab");
        assert_eq!(enc(&ab)[0], STR_UTF8);
        assert_eq!(round_trip(&ab), ab);
    }

    #[test]
    fn string_uuid_fast_path() {
        let uuid = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        let v = Value::Str(Text::from_uuid(uuid));
        let bytes = enc(&v);
        assert_eq!(bytes[0], STR_UUID);
        assert_eq!(bytes.len(), 17);
        assert_eq!(round_trip(&v), v);

        // sixteen labelled bytes stay on the general path
        let labelled = Value::Str(Text::with_encoding(
            b"0123456789abcdef".to_vec(),
            Some(TextEncoding::Utf8),
        ));
        assert_eq!(enc(&labelled)[0], STR_UTF8);
        assert_eq!(round_trip(&labelled), labelled);
    }

    #[test]
    fn string_long_payloads_compress() {
        let text: String = std::iter::repeat("abcdefgh").take(16).collect();
        let v = Value::from(text.as_str());
        let bytes = enc(&v);
        assert_eq!(bytes[0], STR_UTF8 | STR_COMPRESSED);
        assert!(bytes.len() < text.len());
        assert_eq!(round_trip(&v), v);
    }

    #[test]
    fn string_binary_payloads() {
        let v = Value::Str(Text::from_bytes(vec![0, 159, 146, 150]));
        assert_eq!(enc(&v)[0], STR_BINARY);
        assert_eq!(round_trip(&v), v);
    }

    #[test]
    fn string_custom_code_page() {
        let v = Value::Str(Text::with_encoding(
            vec![1, 2, 3],
            Some(TextEncoding::Custom(437)),
        ));
        assert_eq!(enc(&v)[0], STR_CUSTOM);
        assert_eq!(round_trip(&v), v);
    }

    #[test]
    fn array_inline_and_long_forms() {
        assert_eq!(enc(&Value::Array(vec![])), vec![0xc0]);
        assert_eq!(enc(&Value::Array(vec![Value::Null])), vec![0xc1, 0x00]);

        let fifteen = Value::Array(vec![Value::from(0); 15]);
        assert_eq!(enc(&fifteen)[0], 0xcf);
        assert_eq!(round_trip(&fifteen), fifteen);

        let sixteen = Value::Array(vec![Value::from(0); 16]);
        let bytes = enc(&sixteen);
        assert_eq!(bytes[0], ARR_LONG);
        assert_eq!(&bytes[1..3], &[0b0101_0000, 0b0100_0000]); // length 16
        assert_eq!(round_trip(&sixteen), sixteen);
    }

    #[test]
    fn array_mixed_elements() {
        let v = Value::Array(vec![
            Value::Null,
            Value::from(true),
            Value::from(-42),
            Value::from("mixed"),
            Value::from(2.5f64),
        ]);
        assert_eq!(round_trip(&v), v);
    }

    #[test]
    fn array_truncated_elements_fail() {
        let err = decode_full(&[0xc2u8, 0x00][..], &cfg()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DecodeError>(),
            Some(&DecodeError::UnexpectedEndOfStream)
        );
    }

    #[test]
    fn dict_inline_form() {
        assert_eq!(enc(&Value::Dict(Dict::new(true, false))), vec![0xe0]);

        let mut d = Dict::new(true, false);
        d.insert("a", Value::from(1));
        let v = Value::Dict(d);
        let bytes = enc(&v);
        assert_eq!(bytes[0], 0xe1);
        assert_eq!(round_trip(&v), v);
    }

    #[test]
    fn dict_full_key_form() {
        let mut d = Dict::new(true, false);
        for i in 0..16 {
            d.insert(format!("k{:02}", i), Value::from(i));
        }
        let v = Value::Dict(d);
        let bytes = enc(&v);
        assert_eq!(bytes[0], MAP_FULL);
        assert_eq!(round_trip(&v), v);
    }

    #[test]
    fn dict_compact_form_round_trips() {
        let mut d = Dict::new(true, false);
        d.prefer_compact();
        for i in 0..8 {
            d.insert(format!("shared_prefix_a{:02}", i), Value::from(i));
            d.insert(format!("shared_prefix_b{:02}", i), Value::from(-i));
        }
        let v = Value::Dict(d);
        let bytes = enc(&v);
        assert_eq!(bytes[0], MAP_COMPACT);
        assert_eq!(round_trip(&v), v);

        // the compact form should beat the full form on shared keys
        let mut full = Dict::new(true, false);
        for i in 0..8 {
            full.insert(format!("shared_prefix_a{:02}", i), Value::from(i));
            full.insert(format!("shared_prefix_b{:02}", i), Value::from(-i));
        }
        let full_bytes = enc(&Value::Dict(full));
        assert!(bytes.len() < full_bytes.len());
    }

    #[test]
    fn dict_compact_strategy_from_config() {
        let mut d = Dict::new(true, false);
        for i in 0..16 {
            d.insert(format!("entry_number_{:02}", i), Value::from(i));
        }
        let v = Value::Dict(d);
        let compact_cfg = Config {
            dictionary_strategy: DictionaryStrategy::Compact,
            ..Config::default()
        };
        let bytes = encode_full(&v, &compact_cfg).unwrap();
        assert_eq!(bytes[0], MAP_COMPACT);
        assert_eq!(decode_full(&bytes, &compact_cfg).unwrap(), v);
    }

    #[test]
    fn dict_case_insensitive_compact_keeps_spellings() {
        let mut d = Dict::new(true, false);
        d.prefer_compact();
        for i in 0..8 {
            d.insert(format!("CamelPrefix{:02}", i), Value::from(i));
            d.insert(format!("camelPrefixExtra{:02}", i), Value::from(i));
        }
        let v = Value::Dict(d.clone());
        let decoded = round_trip(&v);
        match decoded {
            Value::Dict(out) => {
                let mut expected: Vec<&str> = d.keys().collect();
                let mut actual: Vec<String> = out.keys().map(str::to_owned).collect();
                expected.sort_unstable();
                actual.sort_unstable();
                assert_eq!(actual, expected);
            }
            other => panic!("expected a dictionary, got {:?}", other),
        }
    }

    #[test]
    fn dict_reserved_key_characters_fail_compact_encoding() {
        let mut d = Dict::new(false, false);
        d.prefer_compact();
        for i in 0..16 {
            d.insert(format!("prefixed_{}\u{e005}", i), Value::from(i));
        }
        assert!(encode_full(&Value::Dict(d), &cfg()).is_err());
    }

    #[test]
    fn exhausted_stream_yields_null() {
        assert_eq!(decode_full(&b""[..], &cfg()).unwrap(), Value::Null);
    }

    #[test]
    fn null_metadata_bits_still_mean_null() {
        assert_eq!(decode_full(&[0b0001_0101u8][..], &cfg()).unwrap(), Value::Null);
    }

    #[test]
    fn typed_readers_redispatch() {
        use bytes::IntoBuf;

        // an integer read through the string reader renders textually
        let bytes = enc(&Value::from(42));
        let text = read_text(&mut bytes.into_buf(), &cfg()).unwrap().unwrap();
        assert_eq!(text.decoded().as_deref(), Some("42"));

        // a boolean read through the integer reader casts to one
        let bytes = enc(&Value::from(true));
        let int = read_int(&mut bytes.into_buf(), &cfg()).unwrap().unwrap();
        assert_eq!(int, Inum::from(1));

        // a nonzero float read through the boolean reader is true
        let bytes = enc(&Value::from(2.5f64));
        let b = read_bool(&mut bytes.into_buf(), &cfg()).unwrap();
        assert_eq!(b, Some(true));

        // an integer read through the float reader promotes exactly
        let bytes = enc(&Value::from(42));
        let float = read_float(&mut bytes.into_buf(), &cfg()).unwrap().unwrap();
        assert_eq!(float, Float::from(42.0f64));

        // an array read through the dictionary reader gets index keys
        let bytes = enc(&Value::Array(vec![Value::from(5)]));
        let dict = read_dict(&mut bytes.into_buf(), &cfg()).unwrap().unwrap();
        assert_eq!(dict.get("0"), Some(&Value::from(5)));

        // a scalar read through the array reader wraps itself
        let bytes = enc(&Value::from(9));
        let arr = read_array(&mut bytes.into_buf(), &cfg()).unwrap().unwrap();
        assert_eq!(arr, vec![Value::from(9)]);

        // the raw dispatcher accepts a pre-consumed control byte
        let bytes = enc(&Value::from(511));
        let mut buf = bytes.as_slice().into_buf();
        let first = buf.get_u8();
        let v = read_value_with(&mut buf, first, &cfg()).unwrap();
        assert_eq!(v, Value::from(511));
    }
}
