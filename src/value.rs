//! Dynamic values exchanged with user callbacks and the [`prototype`](crate::prototype)
//! surface.

use std::{fmt, rc::Rc};

use crate::{
    ArrayBuffer, ContentType, Error, IntoNumeric, Numeric, Result, TypedArray, cold_path,
    to_integer,
};

type NativeFn = dyn Fn(&Value, &[Value]) -> Result<Value>;

/// A named native callable taking `(this, args)`.
#[derive(Clone)]
pub struct Function {
    name: Rc<str>,
    f: Rc<NativeFn>,
}

impl Function {
    pub fn new<F>(name: &str, f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value> + 'static,
    {
        Self {
            name: Rc::from(name),
            f: Rc::new(f),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invokes the function synchronously. Whatever it does, including
    /// detaching buffers, has happened by the time this returns.
    #[inline]
    pub fn call(&self, this: &Value, args: &[Value]) -> Result<Value> {
        (self.f)(this, args)
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.f, &other.f)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "function {}()", self.name)
    }
}

/// A dynamically typed value.
///
/// Equality is strict equality: numbers compare numerically (`NaN != NaN`),
/// objects compare by identity.
#[derive(Clone, Default, Debug)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    BigInt(i128),
    String(Rc<str>),
    /// An array-like list of values.
    Array(Rc<[Value]>),
    ArrayBuffer(ArrayBuffer),
    TypedArray(TypedArray),
    Function(Function),
}

impl Value {
    #[inline]
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    #[inline]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_typed_array(&self) -> Option<&TypedArray> {
        match self {
            Value::TypedArray(view) => Some(view),
            _ => None,
        }
    }

    /// Short human-readable description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Value::String(s) => format!("{s:?}"),
            Value::Array(_) => "[object Array]".to_owned(),
            Value::ArrayBuffer(_) => "[object ArrayBuffer]".to_owned(),
            Value::TypedArray(view) => format!("[object {}]", view.kind().name()),
            Value::Function(f) => format!("function {}", f.name()),
            other => other.to_js_string().unwrap_or_default(),
        }
    }

    /// ToBoolean.
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(x) => Numeric::Number(*x).is_truthy(),
            Value::BigInt(v) => *v != 0,
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// ToString. Typed arrays join their elements, which fails once detached.
    pub fn to_js_string(&self) -> Result<String> {
        Ok(match self {
            Value::Undefined => "undefined".to_owned(),
            Value::Null => "null".to_owned(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(x) => Numeric::Number(*x).to_string(),
            Value::BigInt(v) => v.to_string(),
            Value::String(s) => s.to_string(),
            Value::Array(items) => {
                let mut out = String::new();
                for (k, item) in items.iter().enumerate() {
                    if k > 0 {
                        out.push(',');
                    }
                    if !item.is_nullish() {
                        out.push_str(&item.to_js_string()?);
                    }
                }
                out
            }
            Value::ArrayBuffer(_) => "[object ArrayBuffer]".to_owned(),
            Value::TypedArray(view) => view.join(None)?,
            Value::Function(f) => format!("function {}() {{ [native code] }}", f.name()),
        })
    }

    /// ToNumber. BigInts do not convert implicitly.
    pub fn to_number(&self) -> Result<f64> {
        match self {
            Value::Undefined => Ok(f64::NAN),
            Value::Null => Ok(0.0),
            Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Number(x) => Ok(*x),
            Value::BigInt(_) => {
                cold_path();
                Err(Error::ContentTypeMismatch(ContentType::Number, ContentType::BigInt))
            }
            Value::String(s) => Ok(string_to_number(s)),
            Value::Array(_) | Value::TypedArray(_) => Ok(string_to_number(&self.to_js_string()?)),
            Value::ArrayBuffer(_) | Value::Function(_) => Ok(f64::NAN),
        }
    }

    /// ToBigInt. Numbers do not convert implicitly.
    pub fn to_bigint(&self) -> Result<i128> {
        match self {
            Value::Boolean(b) => Ok(*b as i128),
            Value::BigInt(v) => Ok(*v),
            Value::Number(_) => {
                cold_path();
                Err(Error::ContentTypeMismatch(ContentType::BigInt, ContentType::Number))
            }
            Value::String(s) => string_to_bigint(s),
            Value::Array(_) | Value::TypedArray(_) => string_to_bigint(&self.to_js_string()?),
            _ => {
                cold_path();
                Err(Error::InvalidConversion("BigInt"))
            }
        }
    }

    /// ToInteger, saturating to `i64`.
    #[inline]
    pub fn to_integer(&self) -> Result<i64> {
        Ok(to_integer(self.to_number()?))
    }

    /// ToInteger for an optional argument where `undefined` means "absent".
    #[inline]
    pub(crate) fn to_optional_integer(&self) -> Result<Option<i64>> {
        match self {
            Value::Undefined => Ok(None),
            other => other.to_integer().map(Some),
        }
    }

    /// Coerces to the language value of `content`, e.g. for `includes`.
    pub fn to_numeric(&self, content: ContentType) -> Result<Numeric> {
        match content {
            ContentType::Number => self.to_number().map(Numeric::Number),
            ContentType::BigInt => self.to_bigint().map(Numeric::BigInt),
        }
    }
}

fn string_to_number(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = s.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix).map_or(f64::NAN, |v| v as f64);
        }
    }
    // Rust accepts "inf"/"nan" spellings that are not numeric literals here
    if !s.bytes().all(|b| b.is_ascii_digit() || b"+-.eE".contains(&b)) {
        return f64::NAN;
    }
    s.parse().unwrap_or(f64::NAN)
}

fn string_to_bigint(s: &str) -> Result<i128> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(0);
    }
    s.parse().map_err(|_| {
        cold_path();
        Error::InvalidConversion("BigInt")
    })
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::ArrayBuffer(a), Value::ArrayBuffer(b)) => a.ptr_eq(b),
            (Value::TypedArray(a), Value::TypedArray(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl IntoNumeric for Value {
    #[inline]
    fn into_numeric(self, target: ContentType) -> Result<Numeric> {
        self.to_numeric(target)
    }
}

impl IntoNumeric for &Value {
    #[inline]
    fn into_numeric(self, target: ContentType) -> Result<Numeric> {
        self.to_numeric(target)
    }
}

impl From<Numeric> for Value {
    #[inline]
    fn from(value: Numeric) -> Self {
        match value {
            Numeric::Number(x) => Value::Number(x),
            Numeric::BigInt(v) => Value::BigInt(v),
        }
    }
}

impl From<f64> for Value {
    #[inline]
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    #[inline]
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    #[inline]
    fn from(value: &str) -> Self {
        Value::String(Rc::from(value))
    }
}

impl From<Vec<Value>> for Value {
    #[inline]
    fn from(value: Vec<Value>) -> Self {
        Value::Array(Rc::from(value))
    }
}

impl From<TypedArray> for Value {
    #[inline]
    fn from(value: TypedArray) -> Self {
        Value::TypedArray(value)
    }
}

impl From<ArrayBuffer> for Value {
    #[inline]
    fn from(value: ArrayBuffer) -> Self {
        Value::ArrayBuffer(value)
    }
}

impl From<Function> for Value {
    #[inline]
    fn from(value: Function) -> Self {
        Value::Function(value)
    }
}
