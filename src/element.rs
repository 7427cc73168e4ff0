use std::fmt::{self, Display};

use zerocopy::{NativeEndian, byteorder};

use crate::{Error, Result, cold_path};

/// The two families of values a view can store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ContentType {
    Number,
    BigInt,
}

impl Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentType::Number => f.write_str("Number"),
            ContentType::BigInt => f.write_str("BigInt"),
        }
    }
}

/// The fixed numeric interpretation a view applies to its bytes.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum ElementKind {
    Int8 = 0,
    Uint8 = 1,
    Uint8Clamped = 2,
    Int16 = 3,
    Uint16 = 4,
    Int32 = 5,
    Uint32 = 6,
    Float32 = 7,
    Float64 = 8,
    BigInt64 = 9,
    BigUint64 = 10,
}

impl ElementKind {
    pub const ALL: [ElementKind; 11] = [
        Self::Int8,
        Self::Uint8,
        Self::Uint8Clamped,
        Self::Int16,
        Self::Uint16,
        Self::Int32,
        Self::Uint32,
        Self::Float32,
        Self::Float64,
        Self::BigInt64,
        Self::BigUint64,
    ];

    /// Returns the width of one element in bytes.
    ///
    /// # Example
    ///
    /// ```
    /// use tarray::ElementKind;
    ///
    /// assert_eq!(ElementKind::Uint8Clamped.size(), 1);
    /// assert_eq!(ElementKind::Float32.size(), 4);
    /// assert_eq!(ElementKind::BigUint64.size(), 8);
    /// ```
    #[inline]
    pub const fn size(self) -> usize {
        const SIZE: [usize; 11] = [1, 1, 1, 2, 2, 4, 4, 4, 8, 8, 8];
        SIZE[self as usize]
    }

    /// Returns the constructor name of views of this kind.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int8 => "Int8Array",
            Self::Uint8 => "Uint8Array",
            Self::Uint8Clamped => "Uint8ClampedArray",
            Self::Int16 => "Int16Array",
            Self::Uint16 => "Uint16Array",
            Self::Int32 => "Int32Array",
            Self::Uint32 => "Uint32Array",
            Self::Float32 => "Float32Array",
            Self::Float64 => "Float64Array",
            Self::BigInt64 => "BigInt64Array",
            Self::BigUint64 => "BigUint64Array",
        }
    }

    #[inline]
    pub const fn content_type(self) -> ContentType {
        match self {
            Self::BigInt64 | Self::BigUint64 => ContentType::BigInt,
            _ => ContentType::Number,
        }
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Decodes one element from exactly `self.size()` native-endian bytes.
    pub(crate) fn decode(self, raw: &[u8]) -> Numeric {
        let mut b = [0u8; 8];
        b[..raw.len()].copy_from_slice(raw);
        match self {
            Self::Int8 => Numeric::Number(b[0] as i8 as f64),
            Self::Uint8 | Self::Uint8Clamped => Numeric::Number(b[0] as f64),
            Self::Int16 => Numeric::Number(
                byteorder::I16::<NativeEndian>::from_bytes([b[0], b[1]]).get() as f64,
            ),
            Self::Uint16 => Numeric::Number(
                byteorder::U16::<NativeEndian>::from_bytes([b[0], b[1]]).get() as f64,
            ),
            Self::Int32 => Numeric::Number(
                byteorder::I32::<NativeEndian>::from_bytes([b[0], b[1], b[2], b[3]]).get() as f64,
            ),
            Self::Uint32 => Numeric::Number(
                byteorder::U32::<NativeEndian>::from_bytes([b[0], b[1], b[2], b[3]]).get() as f64,
            ),
            Self::Float32 => Numeric::Number(
                byteorder::F32::<NativeEndian>::from_bytes([b[0], b[1], b[2], b[3]]).get() as f64,
            ),
            Self::Float64 => Numeric::Number(byteorder::F64::<NativeEndian>::from_bytes(b).get()),
            Self::BigInt64 => {
                Numeric::BigInt(byteorder::I64::<NativeEndian>::from_bytes(b).get() as i128)
            }
            Self::BigUint64 => {
                Numeric::BigInt(byteorder::U64::<NativeEndian>::from_bytes(b).get() as i128)
            }
        }
    }

    /// Encodes `value` into exactly `self.size()` bytes, applying this kind's
    /// conversion (modular truncation, clamping or float narrowing).
    pub(crate) fn encode(self, value: Numeric, out: &mut [u8]) -> Result<()> {
        match (self, value) {
            (Self::Int8 | Self::Uint8, Numeric::Number(x)) => out[0] = to_uint_bits(x, 8) as u8,
            (Self::Uint8Clamped, Numeric::Number(x)) => out[0] = to_uint8_clamp(x),
            (Self::Int16 | Self::Uint16, Numeric::Number(x)) => out.copy_from_slice(
                &byteorder::U16::<NativeEndian>::new(to_uint_bits(x, 16) as u16).to_bytes(),
            ),
            (Self::Int32 | Self::Uint32, Numeric::Number(x)) => out.copy_from_slice(
                &byteorder::U32::<NativeEndian>::new(to_uint_bits(x, 32) as u32).to_bytes(),
            ),
            (Self::Float32, Numeric::Number(x)) => {
                out.copy_from_slice(&byteorder::F32::<NativeEndian>::new(x as f32).to_bytes())
            }
            (Self::Float64, Numeric::Number(x)) => {
                out.copy_from_slice(&byteorder::F64::<NativeEndian>::new(x).to_bytes())
            }
            // BigInt64 and BigUint64 share the same modulo 2^64 bit pattern
            (Self::BigInt64 | Self::BigUint64, Numeric::BigInt(v)) => {
                out.copy_from_slice(&byteorder::U64::<NativeEndian>::new(v as u64).to_bytes())
            }
            (kind, value) => {
                cold_path();
                return Err(Error::ContentTypeMismatch(
                    kind.content_type(),
                    value.content_type(),
                ));
            }
        }
        Ok(())
    }
}

impl Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// ToInt8/ToUint8/ToInt16/.../ToUint32 share this: truncate toward zero,
/// map non-finite values to 0, reduce modulo 2^bits.
fn to_uint_bits(x: f64, bits: u32) -> u64 {
    if !x.is_finite() {
        return 0;
    }
    let modulus = (1u64 << bits) as f64;
    x.trunc().rem_euclid(modulus) as u64
}

fn to_uint8_clamp(x: f64) -> u8 {
    // NaN survives clamp and casts to 0
    x.clamp(0.0, 255.0).round_ties_even() as u8
}

/// The language-level value of a view element.
///
/// `PartialEq` is strict equality: `NaN != NaN` and `-0 == +0`. Use
/// [`Numeric::same_value_zero`] for the `includes` flavour of equality.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Numeric {
    Number(f64),
    BigInt(i128),
}

impl Numeric {
    #[inline]
    pub const fn content_type(&self) -> ContentType {
        match self {
            Numeric::Number(_) => ContentType::Number,
            Numeric::BigInt(_) => ContentType::BigInt,
        }
    }

    /// SameValueZero: like `==` except that NaN equals NaN.
    pub fn same_value_zero(&self, other: &Numeric) -> bool {
        match (self, other) {
            (Numeric::Number(x), Numeric::Number(y)) => (x.is_nan() && y.is_nan()) || x == y,
            (Numeric::BigInt(x), Numeric::BigInt(y)) => x == y,
            _ => false,
        }
    }

    /// Returns the value as an `f64`, rounding BigInt values.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Numeric::Number(x) => x,
            Numeric::BigInt(v) => v as f64,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match *self {
            Numeric::Number(x) => !(x == 0.0 || x.is_nan()),
            Numeric::BigInt(v) => v != 0,
        }
    }
}

impl Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Numeric::Number(x) => write_number(f, x),
            Numeric::BigInt(v) => write!(f, "{v}"),
        }
    }
}

/// Writes `x` in the standard numeric string form (`NaN`, `Infinity`, `0` for
/// both zeros, exponent notation outside `[1e-6, 1e21)`).
fn write_number(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_nan() {
        return f.write_str("NaN");
    }
    if x.is_infinite() {
        return f.write_str(if x > 0.0 { "Infinity" } else { "-Infinity" });
    }
    if x == 0.0 {
        return f.write_str("0");
    }
    let abs = x.abs();
    if (1e-6..1e21).contains(&abs) {
        return write!(f, "{x}");
    }
    let repr = format!("{x:e}");
    match repr.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => write!(f, "{mantissa}e+{exp}"),
        _ => f.write_str(&repr),
    }
}

impl From<f64> for Numeric {
    #[inline]
    fn from(value: f64) -> Self {
        Numeric::Number(value)
    }
}

impl From<i32> for Numeric {
    #[inline]
    fn from(value: i32) -> Self {
        Numeric::Number(value as f64)
    }
}

impl From<i128> for Numeric {
    #[inline]
    fn from(value: i128) -> Self {
        Numeric::BigInt(value)
    }
}

/// Conversion of a caller-supplied value into the [`Numeric`] a view of the
/// given content type stores.
///
/// Plain Rust floats and 8/16/32-bit integers are Numbers; 64/128-bit integers
/// are BigInts. Dynamic [`Value`](crate::Value)s coerce with ToNumber or
/// ToBigInt depending on the target.
pub trait IntoNumeric {
    fn into_numeric(self, target: ContentType) -> Result<Numeric>;
}

impl IntoNumeric for Numeric {
    #[inline]
    fn into_numeric(self, target: ContentType) -> Result<Numeric> {
        if self.content_type() != target {
            cold_path();
            return Err(Error::ContentTypeMismatch(target, self.content_type()));
        }
        Ok(self)
    }
}

macro_rules! number_into_numeric {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoNumeric for $ty {
                #[inline]
                fn into_numeric(self, target: ContentType) -> Result<Numeric> {
                    Numeric::Number(self as f64).into_numeric(target)
                }
            }
        )*
    };
}

macro_rules! bigint_into_numeric {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoNumeric for $ty {
                #[inline]
                fn into_numeric(self, target: ContentType) -> Result<Numeric> {
                    Numeric::BigInt(self as i128).into_numeric(target)
                }
            }
        )*
    };
}

number_into_numeric!(f64, f32, i8, u8, i16, u16, i32, u32);
bigint_into_numeric!(i64, u64, i128);

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(kind: ElementKind, value: Numeric) -> Numeric {
        let mut raw = [0u8; 8];
        kind.encode(value, &mut raw[..kind.size()]).unwrap();
        kind.decode(&raw[..kind.size()])
    }

    #[test]
    fn test_integer_stores_wrap() {
        assert_eq!(round_trip(ElementKind::Int8, 200.0.into()), Numeric::Number(-56.0));
        assert_eq!(round_trip(ElementKind::Uint8, (-1.0).into()), Numeric::Number(255.0));
        assert_eq!(round_trip(ElementKind::Uint16, 65537.9.into()), Numeric::Number(1.0));
        assert_eq!(
            round_trip(ElementKind::Int32, 2147483648.0.into()),
            Numeric::Number(-2147483648.0)
        );
        assert_eq!(round_trip(ElementKind::Uint32, f64::NAN.into()), Numeric::Number(0.0));
        assert_eq!(round_trip(ElementKind::Int16, f64::INFINITY.into()), Numeric::Number(0.0));
    }

    #[test]
    fn test_clamped_store_rounds_half_to_even() {
        assert_eq!(round_trip(ElementKind::Uint8Clamped, 2.5.into()), Numeric::Number(2.0));
        assert_eq!(round_trip(ElementKind::Uint8Clamped, 3.5.into()), Numeric::Number(4.0));
        assert_eq!(round_trip(ElementKind::Uint8Clamped, 300.0.into()), Numeric::Number(255.0));
        assert_eq!(round_trip(ElementKind::Uint8Clamped, (-4.0).into()), Numeric::Number(0.0));
        assert_eq!(round_trip(ElementKind::Uint8Clamped, f64::NAN.into()), Numeric::Number(0.0));
    }

    #[test]
    fn test_bigint_stores_wrap() {
        assert_eq!(
            round_trip(ElementKind::BigUint64, Numeric::BigInt(-1)),
            Numeric::BigInt(u64::MAX as i128)
        );
        assert_eq!(
            round_trip(ElementKind::BigInt64, Numeric::BigInt(1 << 63)),
            Numeric::BigInt(i64::MIN as i128)
        );
    }

    #[test]
    fn test_float_narrowing() {
        assert_eq!(round_trip(ElementKind::Float32, 0.1.into()), Numeric::Number(0.1f32 as f64));
        let negative_zero = round_trip(ElementKind::Float64, (-0.0).into());
        assert!(matches!(negative_zero, Numeric::Number(x) if x == 0.0 && x.is_sign_negative()));
    }

    #[test]
    fn test_content_type_mismatch() {
        let mut raw = [0u8; 8];
        assert!(matches!(
            ElementKind::BigInt64.encode(Numeric::Number(1.0), &mut raw),
            Err(Error::ContentTypeMismatch(ContentType::BigInt, ContentType::Number))
        ));
        assert!(1i64.into_numeric(ContentType::Number).is_err());
    }

    #[test]
    fn test_number_formatting() {
        let show = |x: f64| Numeric::Number(x).to_string();
        assert_eq!(show(3.0), "3");
        assert_eq!(show(-0.0), "0");
        assert_eq!(show(1.5), "1.5");
        assert_eq!(show(f64::NAN), "NaN");
        assert_eq!(show(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(show(1e21), "1e+21");
        assert_eq!(show(1e-7), "1e-7");
        assert_eq!(Numeric::BigInt(-12).to_string(), "-12");
    }
}
