//! Dynamically typed entry points with the calling convention of the
//! builtin methods: an untyped receiver and an untyped argument list.
//!
//! Receiver and argument checks that the typed API enforces statically
//! happen here at run time:
//!
//! * the receiver must be a view ([`Error::NotATypedArray`]) or, for
//!   [`invoke_buffer_slice`], a buffer ([`Error::NotAnArrayBuffer`]);
//! * callback methods need a first argument ([`Error::MissingArgument`])
//!   that is callable ([`Error::NotCallable`]);
//! * everything else is coerced the way the builtins coerce it.
//!
//! # Example
//!
//! ```
//! use tarray::{ElementKind, Error, Function, TypedArray, Value};
//! use tarray::prototype::{Method, invoke};
//!
//! let view = Value::from(TypedArray::of(ElementKind::Int8, [1, 2, 3, 4]).unwrap());
//! let over_two = Function::new("overTwo", |_, args| Ok(Value::from(args[0].to_number()? > 2.0)));
//!
//! let found = invoke(Method::Some, &view, &[over_two.into()]).unwrap();
//! assert_eq!(found, Value::Boolean(true));
//!
//! let missing = invoke(Method::Some, &view, &[]);
//! assert!(matches!(missing, Err(Error::MissingArgument("some"))));
//! ```

use std::{cmp::Ordering, rc::Rc};

use crate::{
    ContentType, ElementKind, Error, Function, Numeric, Result, TypedArray, Value, cold_path,
};

/// A prototype method of typed-array views.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Method {
    CopyWithin,
    Every,
    Fill,
    Filter,
    Find,
    FindIndex,
    ForEach,
    Includes,
    IndexOf,
    Join,
    LastIndexOf,
    Map,
    Reduce,
    ReduceRight,
    Reverse,
    Set,
    Slice,
    Some,
    Sort,
    Subarray,
    ToString,
}

impl Method {
    pub const ALL: [Method; 21] = [
        Method::CopyWithin,
        Method::Every,
        Method::Fill,
        Method::Filter,
        Method::Find,
        Method::FindIndex,
        Method::ForEach,
        Method::Includes,
        Method::IndexOf,
        Method::Join,
        Method::LastIndexOf,
        Method::Map,
        Method::Reduce,
        Method::ReduceRight,
        Method::Reverse,
        Method::Set,
        Method::Slice,
        Method::Some,
        Method::Sort,
        Method::Subarray,
        Method::ToString,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Method::CopyWithin => "copyWithin",
            Method::Every => "every",
            Method::Fill => "fill",
            Method::Filter => "filter",
            Method::Find => "find",
            Method::FindIndex => "findIndex",
            Method::ForEach => "forEach",
            Method::Includes => "includes",
            Method::IndexOf => "indexOf",
            Method::Join => "join",
            Method::LastIndexOf => "lastIndexOf",
            Method::Map => "map",
            Method::Reduce => "reduce",
            Method::ReduceRight => "reduceRight",
            Method::Reverse => "reverse",
            Method::Set => "set",
            Method::Slice => "slice",
            Method::Some => "some",
            Method::Sort => "sort",
            Method::Subarray => "subarray",
            Method::ToString => "toString",
        }
    }

    /// Looks a method up by its property name.
    pub fn from_name(name: &str) -> Option<Method> {
        Method::ALL.into_iter().find(|method| method.name() == name)
    }

    /// Returns `true` for methods whose first argument must be callable.
    pub const fn takes_callback(self) -> bool {
        matches!(
            self,
            Method::Every
                | Method::Filter
                | Method::Find
                | Method::FindIndex
                | Method::ForEach
                | Method::Map
                | Method::Reduce
                | Method::ReduceRight
                | Method::Some
        )
    }
}

#[inline]
fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

/// An argument where `undefined` and absence both mean "default".
#[inline]
fn optional_integer(args: &[Value], index: usize) -> Result<Option<i64>> {
    arg(args, index).to_optional_integer()
}

fn receiver(this: &Value) -> Result<&TypedArray> {
    this.as_typed_array().ok_or_else(|| {
        cold_path();
        Error::NotATypedArray
    })
}

fn callback(method: Method, args: &[Value]) -> Result<Function> {
    match args.first() {
        None => {
            cold_path();
            Err(Error::MissingArgument(method.name()))
        }
        Some(Value::Function(f)) => Ok(f.clone()),
        Some(other) => {
            cold_path();
            Err(Error::NotCallable(other.describe()))
        }
    }
}

/// The element an `indexOf`-family search compares against, or `None` when
/// `value` can never be strictly equal to an element of `content`.
fn search_element(value: &Value, content: ContentType) -> Option<Numeric> {
    match (value, content) {
        (Value::Number(x), ContentType::Number) => Some(Numeric::Number(*x)),
        (Value::BigInt(v), ContentType::BigInt) => Some(Numeric::BigInt(*v)),
        _ => None,
    }
}

/// The elements of an array-like `source` as values.
fn array_like(source: &Value) -> Result<Vec<Value>> {
    match source {
        Value::Undefined | Value::Null => {
            cold_path();
            Err(Error::InvalidConversion("object"))
        }
        Value::Array(items) => Ok(items.to_vec()),
        Value::TypedArray(view) => Ok(view.to_vec()?.into_iter().map(Value::from).collect()),
        Value::String(s) => Ok(s
            .chars()
            .map(|c| Value::String(Rc::from(c.to_string())))
            .collect()),
        // no indexed properties, so an empty list
        _ => Ok(Vec::new()),
    }
}

/// Calls `method` on `this` with `args`.
///
/// Methods returning the receiver (`copyWithin`, `fill`, `reverse`, `sort`)
/// return `this` itself; `set` and `forEach` return `undefined`.
pub fn invoke(method: Method, this: &Value, args: &[Value]) -> Result<Value> {
    let view = receiver(this)?;
    match method {
        Method::CopyWithin => {
            let target = arg(args, 0).to_integer()?;
            let start = arg(args, 1).to_integer()?;
            let end = optional_integer(args, 2)?;
            view.copy_within(target, start, end)?;
            Ok(this.clone())
        }
        Method::Fill => {
            let value = arg(args, 0).to_numeric(view.kind().content_type())?;
            let start = optional_integer(args, 1)?.unwrap_or(0);
            let end = optional_integer(args, 2)?;
            view.fill(value, start, end)?;
            Ok(this.clone())
        }
        Method::Includes | Method::IndexOf | Method::LastIndexOf => search(method, view, args),
        Method::Join => {
            let separator = match arg(args, 0) {
                Value::Undefined => None,
                other => Some(other.to_js_string()?),
            };
            Ok(Value::from(view.join(separator.as_deref())?.as_str()))
        }
        Method::ToString => Ok(Value::from(view.to_string()?.as_str())),
        Method::Reverse => {
            view.reverse()?;
            Ok(this.clone())
        }
        Method::Set => {
            let source = arg(args, 0);
            let offset = arg(args, 1).to_integer()?;
            match &source {
                Value::TypedArray(source) => view.set_typed(source, offset)?,
                other => view.set_values(array_like(other)?, offset)?,
            }
            Ok(Value::Undefined)
        }
        Method::Slice => {
            let start = arg(args, 0).to_integer()?;
            let end = optional_integer(args, 1)?;
            Ok(view.slice(start, end)?.into())
        }
        Method::Subarray => {
            let begin = arg(args, 0).to_integer()?;
            let end = optional_integer(args, 1)?;
            Ok(view.subarray(begin, end)?.into())
        }
        Method::Sort => {
            match arg(args, 0) {
                Value::Undefined => view.sort()?,
                Value::Function(compare) => view.sort_by(|x, y| {
                    let order = compare
                        .call(&Value::Undefined, &[Value::from(*x), Value::from(*y)])?
                        .to_number()?;
                    // NaN compares as equal
                    Ok(order.partial_cmp(&0.0).unwrap_or(Ordering::Equal))
                })?,
                other => {
                    cold_path();
                    return Err(Error::NotCallable(other.describe()));
                }
            }
            Ok(this.clone())
        }
        method => {
            debug_assert!(method.takes_callback());
            view.require_attached()?;
            let f = callback(method, args)?;
            invoke_with_callback(method, view, &f, args)
        }
    }
}

fn invoke_with_callback(
    method: Method,
    view: &TypedArray,
    f: &Function,
    args: &[Value],
) -> Result<Value> {
    let this_arg = arg(args, 1);
    let call = |x: Numeric, k: usize, view: &TypedArray| {
        f.call(
            &this_arg,
            &[Value::from(x), Value::Number(k as f64), Value::TypedArray(view.clone())],
        )
    };
    let test = |x: Numeric, k: usize, view: &TypedArray| -> Result<bool> {
        Ok(call(x, k, view)?.to_boolean())
    };

    match method {
        Method::Every => Ok(view.every(test)?.into()),
        Method::Some => Ok(view.some(test)?.into()),
        Method::Find => Ok(view.find(test)?.map_or(Value::Undefined, Value::from)),
        Method::FindIndex => Ok(Value::Number(
            view.find_index(test)?.map_or(-1.0, |k| k as f64),
        )),
        Method::ForEach => {
            view.for_each(|x, k, view| call(x, k, view).map(drop))?;
            Ok(Value::Undefined)
        }
        Method::Map => Ok(view.map(|x, k, view| call(x, k, view))?.into()),
        Method::Filter => Ok(view.filter(test)?.into()),
        _ => {
            let initial = args.get(1).cloned();
            let fold = |acc: Value, x: Numeric, k: usize, view: &TypedArray| {
                f.call(
                    &Value::Undefined,
                    &[
                        acc,
                        Value::from(x),
                        Value::Number(k as f64),
                        Value::TypedArray(view.clone()),
                    ],
                )
            };
            if method == Method::ReduceRight {
                view.reduce_right(fold, initial)
            } else {
                view.reduce(fold, initial)
            }
        }
    }
}

fn search(method: Method, view: &TypedArray, args: &[Value]) -> Result<Value> {
    let from_index = match (method, args.get(1)) {
        // `lastIndexOf` treats an explicit `undefined` as absent
        (Method::LastIndexOf, _) => optional_integer(args, 1)?,
        // the others convert it to 0
        (_, Some(value)) => Some(value.to_integer()?),
        (_, None) => None,
    };
    let search = search_element(&arg(args, 0), view.kind().content_type());
    let index = match (method, search) {
        (Method::Includes, Some(search)) => return Ok(view.includes(search, from_index)?.into()),
        (Method::Includes, None) => {
            view.require_attached()?;
            return Ok(false.into());
        }
        (Method::IndexOf, Some(search)) => view.index_of(search, from_index)?,
        (Method::LastIndexOf, Some(search)) => view.last_index_of(search, from_index)?,
        _ => {
            view.require_attached()?;
            None
        }
    };
    Ok(Value::Number(index.map_or(-1.0, |k| k as f64)))
}

/// Calls the buffer `slice` method on `this`.
pub fn invoke_buffer_slice(this: &Value, args: &[Value]) -> Result<Value> {
    let Value::ArrayBuffer(buffer) = this else {
        cold_path();
        return Err(Error::NotAnArrayBuffer);
    };
    let start = arg(args, 0).to_integer()?;
    let end = optional_integer(args, 1)?;
    Ok(buffer.slice(start, end)?.into())
}

/// Builds a view of `kind` from an array-like `source`, passing each item
/// and its index through `map_fn` (called with `this_arg`) when it is not
/// `undefined`.
pub fn from(
    kind: ElementKind,
    source: &Value,
    map_fn: &Value,
    this_arg: &Value,
) -> Result<TypedArray> {
    let map_fn = match map_fn {
        Value::Undefined => None,
        Value::Function(f) => Some(f),
        other => {
            cold_path();
            return Err(Error::NotCallable(other.describe()));
        }
    };
    let items = array_like(source)?;
    TypedArray::from_mapped(kind, items, |item, k| match map_fn {
        Some(f) => f.call(this_arg, &[item, Value::Number(k as f64)]),
        None => Ok(item),
    })
}

/// Builds a view of `kind` holding `items`.
pub fn of(kind: ElementKind, items: &[Value]) -> Result<TypedArray> {
    TypedArray::of(kind, items)
}
