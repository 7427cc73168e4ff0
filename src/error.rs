//! Error types for typed-array and buffer operations.
//!
//! This module contains the [`Error`] type which represents every failure an
//! operation on a [`TypedArray`](crate::TypedArray) or an
//! [`ArrayBuffer`](crate::ArrayBuffer) can surface. Each variant belongs to one
//! of the classes reported by [`Error::kind`].
//!
//! # Example
//!
//! ```
//! use tarray::{ArrayBuffer, ElementKind, Error, ErrorKind, TypedArray};
//!
//! let view = TypedArray::new(ElementKind::Int32, 4);
//! view.buffer().detach().unwrap();
//!
//! match view.fill(1.0, 0, None) {
//!     Err(e @ Error::Detached) => assert_eq!(e.kind(), ErrorKind::TypeError),
//!     other => panic!("unexpected result: {other:?}"),
//! }
//! ```

use std::fmt::{self, Display};

use crate::{ContentType, Value};

/// Alias for a `Result` with the error type [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// The class an [`Error`] belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ErrorKind {
    /// Wrong receiver, detached buffer, non-callable argument, malformed
    /// constructor result or a reduction of an empty view without a seed.
    TypeError,
    /// Offset or length arithmetic that would leave the destination bounds.
    RangeError,
    /// An error raised by user callback code, propagated unchanged.
    Thrown,
}

/// This type represents all possible errors that can occur when operating on
/// a typed-array view or its buffer.
#[derive(Debug)]
pub enum Error {
    /// The buffer backing the receiver has been detached.
    ///
    /// Raised at the start of an operation, and again at the next element
    /// access after user code detached the buffer mid-operation.
    Detached,

    /// The receiver or argument is not a typed-array view.
    NotATypedArray,

    /// The receiver or a constructed result is not a buffer of the expected
    /// kind (exclusive vs shared).
    NotAnArrayBuffer,

    /// A shared buffer was asked to detach.
    NotDetachable,

    /// An argument that must be callable is not. Carries a description of
    /// the offending value.
    NotCallable(String),

    /// A method that requires a callback was invoked without arguments.
    MissingArgument(&'static str),

    /// `reduce`/`reduceRight` on an empty view without a seed accumulator.
    EmptyReduce,

    /// A value or source view of one content type was written into a view of
    /// the other (Number vs BigInt).
    ContentTypeMismatch(ContentType, ContentType),

    /// A value could not be converted to the numeric type a view stores.
    InvalidConversion(&'static str),

    /// A buffer constructor hook returned the very buffer being sliced.
    SameBufferReturned,

    /// A constructor hook produced a result with fewer elements (or bytes)
    /// than requested: `(requested, actual)`.
    ShortResult(usize, usize),

    /// A negative offset was passed to `set`.
    NegativeOffset,

    /// An index, offset or length lies outside the bounds of its receiver.
    OutOfBounds,

    /// A byte offset or byte length is not a multiple of the element size.
    Misaligned(usize, usize),

    /// An error thrown by user callback code.
    Thrown(Value),
}

impl Error {
    /// Returns the class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NegativeOffset | Error::OutOfBounds | Error::Misaligned(..) => {
                ErrorKind::RangeError
            }
            Error::Thrown(_) => ErrorKind::Thrown,
            _ => ErrorKind::TypeError,
        }
    }
}

impl Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Detached => formatter.write_str("attempting to access detached ArrayBuffer"),
            Error::NotATypedArray => formatter.write_str("receiver is not a typed array"),
            Error::NotAnArrayBuffer => formatter.write_str("value is not an ArrayBuffer"),
            Error::NotDetachable => formatter.write_str("shared buffers cannot be detached"),
            Error::NotCallable(what) => write!(formatter, "{what} is not a function"),
            Error::MissingArgument(method) => write!(
                formatter,
                "missing argument 0 when calling function {method}"
            ),
            Error::EmptyReduce => {
                formatter.write_str("reduce of empty array with no initial value")
            }
            Error::ContentTypeMismatch(expected, actual) => write!(
                formatter,
                "content type mismatch: expected {expected}, got {actual}"
            ),
            Error::InvalidConversion(target) => {
                write!(formatter, "cannot convert value to {target}")
            }
            Error::SameBufferReturned => {
                formatter.write_str("constructor returned the same ArrayBuffer")
            }
            Error::ShortResult(expected, actual) => write!(
                formatter,
                "constructor returned a result that is too small: expected {expected}, got {actual}"
            ),
            Error::NegativeOffset => formatter.write_str("offset must be non-negative"),
            Error::OutOfBounds => formatter.write_str("index out of range"),
            Error::Misaligned(value, size) => write!(
                formatter,
                "{value} is not a multiple of the element size {size}"
            ),
            Error::Thrown(value) => write!(formatter, "uncaught {}", value.describe()),
        }
    }
}

impl std::error::Error for Error {}
