//! Signed integers of arbitrary magnitude.
//!
//! The wire format carries a sign flag plus the minimal significant bits of an
//! unsigned magnitude, so the in-memory type is a plain sign-magnitude number:
//! small values live in an `i64`, everything else in a [`BigInt`]. The
//! conversion API is bounded at 128 bits; the wire format itself is not.

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{FromPrimitive, ToPrimitive, Zero};
use std::{
    convert::TryFrom,
    fmt,
};

use crate::{from_as, from_fn, Value};

/// `Inum`s are either `i64` or `BigInt`s (i.e., big integers).
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Hash, Debug)]
pub enum Inum {
    I64(i64),
    Big(BigInt),
}

use Inum::*;

from_fn!(Inum, i64, I64);
from_fn!(Inum, u64, |u: u64| {
    let i = u as i64;
    if i >= 0 {
        I64(i)
    } else {
        Big(BigInt::from(u))
    }
});

from_fn!(Inum, BigInt, |i: BigInt| {
    i.to_i64().map_or_else(|| Big(i), I64)
});

impl From<i128> for Inum {
    fn from(i: i128) -> Inum {
        match i64::try_from(i) {
            Ok(small) => I64(small),
            Err(_) => {
                let sign = if i < 0 { Sign::Minus } else { Sign::Plus };
                let mag = BigUint::from_bytes_le(&i.unsigned_abs().to_le_bytes());
                Big(BigInt::from_biguint(sign, mag))
            }
        }
    }
}

impl From<u128> for Inum {
    fn from(u: u128) -> Inum {
        match i64::try_from(u) {
            Ok(small) => I64(small),
            Err(_) => Big(BigInt::from_biguint(
                Sign::Plus,
                BigUint::from_bytes_le(&u.to_le_bytes()),
            )),
        }
    }
}

impl From<Inum> for BigInt {
    fn from(i: Inum) -> BigInt {
        match i {
            I64(i) => BigInt::from(i),
            Big(i) => i,
        }
    }
}

impl TryFrom<Inum> for i64 {
    type Error = Inum;

    fn try_from(i: Inum) -> Result<Self, Inum> {
        match i {
            I64(i) => Ok(i),
            big => Err(big),
        }
    }
}

impl TryFrom<Inum> for u64 {
    type Error = Inum;

    fn try_from(n: Inum) -> Result<Self, Inum> {
        match n.to_u64() {
            Some(u) => Ok(u),
            None => Err(n),
        }
    }
}

macro_rules! to_prim {
    ($name:ident, $t:ty) => {
        /// Checked narrowing conversion; `None` when the value does not fit.
        pub fn $name(&self) -> Option<$t> {
            self.to_i128().and_then(|i| <$t>::try_from(i).ok())
        }
    };
}

impl Inum {
    /// Whether the value is negative.
    pub fn is_negative(&self) -> bool {
        match self {
            I64(i) => *i < 0,
            Big(i) => i.sign() == Sign::Minus,
        }
    }

    /// Whether the value is zero.
    pub fn is_zero(&self) -> bool {
        match self {
            I64(i) => *i == 0,
            Big(i) => i.is_zero(),
        }
    }

    /// Sign flag and little-endian magnitude bytes, as the wire format sees
    /// them. Trailing zero bytes are permitted; the encoder trims to
    /// significant bits.
    pub(crate) fn sign_magnitude(&self) -> (bool, Vec<u8>) {
        match self {
            I64(i) => (*i < 0, i.unsigned_abs().to_le_bytes().to_vec()),
            Big(i) => {
                let (sign, bytes) = i.to_bytes_le();
                (sign == Sign::Minus, bytes)
            }
        }
    }

    /// Rebuilds a value from a decoded sign flag and little-endian magnitude.
    /// A negative zero normalizes to zero.
    pub(crate) fn from_sign_magnitude(negative: bool, magnitude_le: &[u8]) -> Inum {
        let mag = BigUint::from_bytes_le(magnitude_le);
        if mag.is_zero() {
            return I64(0);
        }
        let sign = if negative { Sign::Minus } else { Sign::Plus };
        Inum::from(BigInt::from_biguint(sign, mag))
    }

    /// Produces an `i64` if `self` is an `I64`, otherwise returns `None`.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            I64(i) => Some(*i),
            Big(_) => None,
        }
    }

    /// Produces an `i128` if the value fits, otherwise returns `None`.
    pub fn to_i128(&self) -> Option<i128> {
        match self {
            I64(i) => Some(*i as i128),
            Big(i) => {
                let (sign, bytes) = i.to_bytes_le();
                if bytes.len() > 16 {
                    return None;
                }
                let mut buf = [0u8; 16];
                buf[..bytes.len()].copy_from_slice(&bytes);
                let mag = u128::from_le_bytes(buf);
                if sign == Sign::Minus {
                    if mag > i128::max_value() as u128 + 1 {
                        None
                    } else if mag == i128::max_value() as u128 + 1 {
                        Some(i128::min_value())
                    } else {
                        Some(-(mag as i128))
                    }
                } else if mag > i128::max_value() as u128 {
                    None
                } else {
                    Some(mag as i128)
                }
            }
        }
    }

    /// Produces a `u128` if the value is non-negative and fits, otherwise
    /// returns `None`.
    pub fn to_u128(&self) -> Option<u128> {
        match self {
            I64(i) => u128::try_from(*i).ok(),
            Big(i) => {
                let (sign, bytes) = i.to_bytes_le();
                if sign == Sign::Minus || bytes.len() > 16 {
                    return None;
                }
                let mut buf = [0u8; 16];
                buf[..bytes.len()].copy_from_slice(&bytes);
                Some(u128::from_le_bytes(buf))
            }
        }
    }

    to_prim!(to_i8, i8);
    to_prim!(to_u8, u8);
    to_prim!(to_i16, i16);
    to_prim!(to_u16, u16);
    to_prim!(to_i32, i32);
    to_prim!(to_u32, u32);
    to_prim!(to_u64, u64);

    /// Nearest `f64`; saturates to an infinity when the magnitude is beyond
    /// `f64` range.
    pub fn to_f64(&self) -> f64 {
        match self {
            I64(i) => *i as f64,
            Big(i) => i.to_f64().unwrap_or(if self.is_negative() {
                std::f64::NEG_INFINITY
            } else {
                std::f64::INFINITY
            }),
        }
    }

    /// Best-effort conversion from any value. `None` means there is no
    /// sensible conversion, which is a normal outcome rather than an error.
    pub fn cast(value: &Value) -> Option<Inum> {
        match value {
            Value::Null => None,
            Value::Int(i) => Some(i.clone()),
            Value::Bool(b) => Some(I64(*b as i64)),
            Value::Float(f) => f.trunc_to_int(),
            Value::Str(t) => parse_symbolic(&t.decoded()?),
            Value::Array(a) => a.first().and_then(Inum::cast),
            Value::Dict(_) => None,
        }
    }
}

/// The coarse symbolic table inherited from the format's reference
/// implementation ("e" really does map to 2), with a literal parse fallback.
fn parse_symbolic(text: &str) -> Option<Inum> {
    let text = text.trim().to_lowercase();
    match text.as_str() {
        "" | "null" | "undefined" => None,
        "zero" => Some(I64(0)),
        "one" => Some(I64(1)),
        "e" | "two" => Some(I64(2)),
        "-e" | "-two" => Some(I64(-2)),
        "pi" => Some(I64(3)),
        "-pi" => Some(I64(-3)),
        "tau" => Some(I64(6)),
        "-tau" => Some(I64(-6)),
        literal => literal
            .parse::<i128>()
            .ok()
            .map(Inum::from)
            .or_else(|| literal.parse::<BigInt>().ok().map(Inum::from)),
    }
}

/// Truncation toward zero of a float's backing view, used by `Inum::cast`.
pub(crate) fn from_f64_trunc(value: f64) -> Option<Inum> {
    if !value.is_finite() {
        return None;
    }
    BigInt::from_f64(value.trunc()).map(Inum::from)
}

impl fmt::Display for Inum {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            I64(i) => write!(f, "{}", i),
            Big(i) => write!(f, "{}", i),
        }
    }
}

#[macro_export]
macro_rules! from_prims {
    ($to:tt) => {
        from_as!($to, i32, i64);
        from_as!($to, i16, i64);
        from_as!($to, i8, i64);
        from_as!($to, isize, i64);

        from_as!($to, u32, i64);
        from_as!($to, u16, i64);
        from_as!($to, u8, i64);
        from_as!($to, usize, u64);
    };
}

from_prims!(Inum);
