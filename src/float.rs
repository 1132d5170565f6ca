//! Floating-point values of four backing widths.
//!
//! A [`Float`] holds exactly one width at a time: IEEE half/single/double
//! precision stored as raw bits (so NaN payloads survive untouched), or a
//! 128-bit decimal fixed-point value ([`Fixed128`]). The encoder narrows to
//! the smallest width that reproduces the value exactly; equality is numeric
//! across widths and NaN is self-equal under the model's equality.

use half::f16;
use std::fmt;

use crate::{inum, inum::Inum, Value};

/// Largest decimal scale a [`Fixed128`] can carry.
pub const MAX_SCALE: u8 = 28;

// 2^96 and 2^53 as f64, bounds for exact fixed-point extraction.
const MANTISSA_LIMIT: f64 = 79_228_162_514_264_337_593_543_950_336.0;
const EXACT_INT_LIMIT: f64 = 9_007_199_254_740_992.0;

/// A 128-bit decimal fixed-point number: sign, scale `0..=28` and a 96-bit
/// mantissa, representing `±mantissa / 10^scale`.
///
/// Raw wire layout (little-endian `u128`): bits 0-31 are flags (scale in bits
/// 16-23, sign in bit 31), bits 32-63 the mantissa's high word, bits 64-127
/// the mantissa's low words.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Fixed128 {
    negative: bool,
    scale: u8,
    mantissa: u128,
}

impl Fixed128 {
    /// Builds a canonical value: trailing decimal zeros are stripped and zero
    /// is never negative.
    pub fn new(negative: bool, scale: u8, mantissa: u128) -> Fixed128 {
        let mut scale = scale.min(MAX_SCALE);
        let mut mantissa = mantissa & ((1u128 << 96) - 1);
        if mantissa == 0 {
            return Fixed128 {
                negative: false,
                scale: 0,
                mantissa: 0,
            };
        }
        while scale > 0 && mantissa % 10 == 0 {
            mantissa /= 10;
            scale -= 1;
        }
        Fixed128 {
            negative,
            scale,
            mantissa,
        }
    }

    pub fn is_zero(&self) -> bool { self.mantissa == 0 }

    pub fn is_negative(&self) -> bool { self.negative }

    pub fn scale(&self) -> u8 { self.scale }

    pub fn mantissa(&self) -> u128 { self.mantissa }

    /// Raw 128-bit wire representation.
    pub fn to_bits(&self) -> u128 {
        let flags = ((self.scale as u128) << 16) | ((self.negative as u128) << 31);
        let hi = (self.mantissa >> 64) & 0xffff_ffff;
        let lo = self.mantissa & 0xffff_ffff_ffff_ffff;
        flags | (hi << 32) | (lo << 64)
    }

    /// Rebuilds a value from its raw wire representation.
    pub fn from_bits(bits: u128) -> Fixed128 {
        let scale = ((bits >> 16) & 0xff) as u8;
        let negative = bits & (1 << 31) != 0;
        let hi = (bits >> 32) & 0xffff_ffff;
        let lo = bits >> 64;
        Fixed128::new(negative, scale.min(MAX_SCALE), (hi << 64) | lo)
    }

    /// Nearest `f64`.
    pub fn to_f64(&self) -> f64 {
        let v = self.mantissa as f64 / 10f64.powi(self.scale as i32);
        if self.negative {
            -v
        } else {
            v
        }
    }

    /// The shortest decimal reading of a binary float that converts back to
    /// the identical float, when one exists within the scale bounds. Values
    /// whose scaled form reaches 2^53 are rejected since integer exactness
    /// cannot be established there.
    pub fn from_f64(value: f64) -> Option<Fixed128> {
        if !value.is_finite() {
            return None;
        }
        if value == 0.0 {
            return Some(Fixed128::new(false, 0, 0));
        }
        let negative = value < 0.0;
        let magnitude = value.abs();
        for scale in 0..=MAX_SCALE {
            let scaled = magnitude * 10f64.powi(scale as i32);
            if scaled >= EXACT_INT_LIMIT || scaled >= MANTISSA_LIMIT {
                return None;
            }
            if scaled.fract() == 0.0 {
                let fixed = Fixed128::new(negative, scale, scaled as u128);
                if fixed.to_f64() == value {
                    return Some(fixed);
                }
            }
        }
        None
    }

    /// Truncation toward zero: sign and integral magnitude.
    pub fn trunc(&self) -> (bool, u128) {
        (self.negative, self.mantissa / 10u128.pow(self.scale as u32))
    }
}

impl fmt::Display for Fixed128 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let digits = self.mantissa.to_string();
        let sign = if self.negative { "-" } else { "" };
        let scale = self.scale as usize;
        if scale == 0 {
            write!(f, "{}{}", sign, digits)
        } else if digits.len() > scale {
            let (int, frac) = digits.split_at(digits.len() - scale);
            write!(f, "{}{}.{}", sign, int, frac)
        } else {
            write!(f, "{}0.{}{}", sign, "0".repeat(scale - digits.len()), digits)
        }
    }
}

/// A floating-point value in exactly one of its four possible widths.
#[derive(Clone, Debug)]
pub enum Float {
    Half(u16),
    Single(u32),
    Double(u64),
    Fixed(Fixed128),
}

use Float::*;

impl From<f16> for Float {
    fn from(f: f16) -> Float { Half(f.to_bits()) }
}

impl From<f32> for Float {
    fn from(f: f32) -> Float { Single(f.to_bits()) }
}

impl From<f64> for Float {
    fn from(f: f64) -> Float { Double(f.to_bits()) }
}

impl From<Fixed128> for Float {
    fn from(f: Fixed128) -> Float { Fixed(f) }
}

/// Narrowest lossless wire form of a float value, computed before writing.
#[derive(Copy, Clone, Debug)]
pub(crate) enum Narrow {
    Zero,
    PosInf,
    NegInf,
    Nan,
    F16(u16),
    F32(u32),
    F64(u64),
    F128(u128),
}

impl Float {
    pub fn is_nan(&self) -> bool {
        match self {
            Half(b) => f16::from_bits(*b).is_nan(),
            Single(b) => f32::from_bits(*b).is_nan(),
            Double(b) => f64::from_bits(*b).is_nan(),
            Fixed(_) => false,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Fixed(d) => d.is_zero(),
            other => other.to_f64() == 0.0,
        }
    }

    /// Nearest `f64` view of the value.
    pub fn to_f64(&self) -> f64 {
        match self {
            Half(b) => f16::from_bits(*b).to_f64(),
            Single(b) => f32::from_bits(*b) as f64,
            Double(b) => f64::from_bits(*b),
            Fixed(d) => d.to_f64(),
        }
    }

    /// Nearest `f32` view of the value.
    pub fn to_f32(&self) -> f32 {
        match self {
            Single(b) => f32::from_bits(*b),
            other => other.to_f64() as f32,
        }
    }

    /// Nearest `f16` view of the value.
    pub fn to_f16(&self) -> f16 {
        match self {
            Half(b) => f16::from_bits(*b),
            other => f16::from_f64(other.to_f64()),
        }
    }

    /// Exact fixed-point view, when one exists.
    pub fn to_fixed(&self) -> Option<Fixed128> {
        match self {
            Fixed(d) => Some(*d),
            other => Fixed128::from_f64(other.to_f64()),
        }
    }

    /// Truncation toward zero through the backing view, for integer casts.
    pub(crate) fn trunc_to_int(&self) -> Option<Inum> {
        match self {
            Fixed(d) => {
                let (negative, mag) = d.trunc();
                let i = Inum::from(mag);
                Some(if negative && !i.is_zero() {
                    Inum::from(-num_bigint::BigInt::from(i))
                } else {
                    i
                })
            }
            other => inum::from_f64_trunc(other.to_f64()),
        }
    }

    /// Narrowest wire form that reproduces this value exactly. Special values
    /// (zero of any width, infinities, NaN) collapse to dedicated tags.
    pub(crate) fn narrow(&self) -> Narrow {
        match self {
            Half(bits) => {
                let h = f16::from_bits(*bits);
                if h.to_f64() == 0.0 {
                    Narrow::Zero
                } else if h.is_nan() {
                    Narrow::Nan
                } else if h.is_infinite() {
                    if h.to_f64() > 0.0 {
                        Narrow::PosInf
                    } else {
                        Narrow::NegInf
                    }
                } else {
                    Narrow::F16(*bits)
                }
            }
            Single(bits) => {
                let v = f32::from_bits(*bits);
                if v == 0.0 {
                    Narrow::Zero
                } else if v.is_nan() {
                    Narrow::Nan
                } else if v.is_infinite() {
                    if v > 0.0 {
                        Narrow::PosInf
                    } else {
                        Narrow::NegInf
                    }
                } else {
                    let h = f16::from_f32(v);
                    if h.to_f32() == v {
                        Narrow::F16(h.to_bits())
                    } else {
                        Narrow::F32(*bits)
                    }
                }
            }
            Double(bits) => {
                let v = f64::from_bits(*bits);
                if v == 0.0 {
                    Narrow::Zero
                } else if v.is_nan() {
                    Narrow::Nan
                } else if v.is_infinite() {
                    if v > 0.0 {
                        Narrow::PosInf
                    } else {
                        Narrow::NegInf
                    }
                } else {
                    let h = f16::from_f64(v);
                    if h.to_f64() == v {
                        Narrow::F16(h.to_bits())
                    } else {
                        let s = v as f32;
                        if s as f64 == v {
                            Narrow::F32(s.to_bits())
                        } else {
                            Narrow::F64(*bits)
                        }
                    }
                }
            }
            Fixed(d) => {
                if d.is_zero() {
                    return Narrow::Zero;
                }
                let v = d.to_f64();
                let h = f16::from_f64(v);
                if Fixed128::from_f64(h.to_f64()) == Some(*d) {
                    return Narrow::F16(h.to_bits());
                }
                let s = v as f32;
                if Fixed128::from_f64(s as f64) == Some(*d) {
                    return Narrow::F32(s.to_bits());
                }
                if Fixed128::from_f64(v) == Some(*d) {
                    return Narrow::F64(v.to_bits());
                }
                Narrow::F128(d.to_bits())
            }
        }
    }

    /// Best-effort conversion from any value. `None` means there is no
    /// sensible conversion.
    pub fn cast(value: &Value) -> Option<Float> {
        match value {
            Value::Null => None,
            Value::Float(f) => Some(f.clone()),
            Value::Bool(b) => Some(Double((*b as i64 as f64).to_bits())),
            Value::Int(i) => Some(Float::promote(i)),
            Value::Str(t) => parse_symbolic(&t.decoded()?),
            Value::Array(a) => a.first().and_then(Float::cast),
            Value::Dict(_) => None,
        }
    }

    /// Promotes an integer to a float: exact fixed-point when the magnitude
    /// fits 96 bits, otherwise the nearest double.
    fn promote(i: &Inum) -> Float {
        if let Some(v) = i.to_i128() {
            let mag = v.unsigned_abs();
            if mag < 1u128 << 96 {
                return Fixed(Fixed128::new(v < 0, 0, mag));
            }
        }
        Double(i.to_f64().to_bits())
    }
}

/// The symbolic table shared with the integer codec, extended with NaN and
/// directional infinity keywords.
fn parse_symbolic(text: &str) -> Option<Float> {
    let text = text.trim().to_lowercase();
    match text.as_str() {
        "" | "null" => None,
        "undefined" | "nan" => Some(Double(std::f64::NAN.to_bits())),
        "zero" => Some(Fixed(Fixed128::new(false, 0, 0))),
        "one" => Some(Single(1f32.to_bits())),
        "-one" => Some(Single((-1f32).to_bits())),
        "two" => Some(Single(2f32.to_bits())),
        "-two" => Some(Single((-2f32).to_bits())),
        "pi" => Some(Double(std::f64::consts::PI.to_bits())),
        "-pi" => Some(Double((-std::f64::consts::PI).to_bits())),
        "e" => Some(Double(std::f64::consts::E.to_bits())),
        "-e" => Some(Double((-std::f64::consts::E).to_bits())),
        "tau" => Some(Double((2.0 * std::f64::consts::PI).to_bits())),
        "-tau" => Some(Double((-2.0 * std::f64::consts::PI).to_bits())),
        "inf" | "infinity" | "posinf" | "posinfinity" | "positiveinfinity" => {
            Some(Double(std::f64::INFINITY.to_bits()))
        }
        "-inf" | "-infinity" | "neginf" | "neginfinity" | "negativeinfinity" => {
            Some(Double(std::f64::NEG_INFINITY.to_bits()))
        }
        literal => {
            let v = literal.parse::<f64>().ok()?;
            Some(match Fixed128::from_f64(v) {
                Some(d) => Fixed(d),
                None => Double(v.to_bits()),
            })
        }
    }
}

impl PartialEq for Float {
    fn eq(&self, other: &Float) -> bool {
        match (self, other) {
            (Fixed(a), Fixed(b)) => a == b,
            (a, b) => {
                if a.is_nan() && b.is_nan() {
                    return true;
                }
                a.to_f64() == b.to_f64()
            }
        }
    }
}

impl fmt::Display for Float {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Fixed(d) => write!(f, "{}", d),
            other => write!(f, "{}", other.to_f64()),
        }
    }
}
