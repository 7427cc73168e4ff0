//! Result-view factory: decides what concrete object an operation that
//! allocates a new view or buffer produces.
//!
//! By default a derived view has the source's element kind and a derived
//! buffer has the source's sharedness. A hook installed with
//! [`TypedArray::set_species`] or [`ArrayBuffer::set_species`] replaces that
//! choice; whatever it returns is checked before use:
//!
//! | Check | Views | Buffers |
//! |-------|-------|---------|
//! | right category | [`Error::NotATypedArray`] | [`Error::NotAnArrayBuffer`] |
//! | same content or sharedness | [`Error::ContentTypeMismatch`] | [`Error::NotAnArrayBuffer`] |
//! | attached (length requests only) | [`Error::Detached`] | [`Error::Detached`] |
//! | not the source itself | - | [`Error::SameBufferReturned`] |
//! | large enough | [`Error::ShortResult`] | [`Error::ShortResult`] |

use std::rc::Rc;

use crate::{ArrayBuffer, Error, Result, TypedArray, Value, cold_path};

/// What a derived view is being constructed from.
#[derive(Clone, Copy, Debug)]
pub enum ConstructArgs<'a> {
    /// A fresh view of at least this many elements (`map`, `filter`, `slice`).
    Length(usize),
    /// A view over an existing byte range (`subarray`).
    Range {
        buffer: &'a ArrayBuffer,
        byte_offset: usize,
        length: usize,
    },
}

/// Hook constructing the result of a view-deriving operation.
pub trait ViewSpecies {
    fn construct(&self, source: &TypedArray, args: ConstructArgs<'_>) -> Result<Value>;
}

impl<F> ViewSpecies for F
where
    F: Fn(&TypedArray, ConstructArgs<'_>) -> Result<Value>,
{
    #[inline]
    fn construct(&self, source: &TypedArray, args: ConstructArgs<'_>) -> Result<Value> {
        self(source, args)
    }
}

/// Hook constructing the result of [`ArrayBuffer::slice`].
pub trait BufferSpecies {
    fn construct(&self, source: &ArrayBuffer, byte_length: usize) -> Result<Value>;
}

impl<F> BufferSpecies for F
where
    F: Fn(&ArrayBuffer, usize) -> Result<Value>,
{
    #[inline]
    fn construct(&self, source: &ArrayBuffer, byte_length: usize) -> Result<Value> {
        self(source, byte_length)
    }
}

/// Boxes a closure as a view hook.
///
/// # Example
///
/// ```
/// use tarray::{ElementKind, TypedArray, Value, view_species};
///
/// let source = TypedArray::of(ElementKind::Uint8, [1, 2, 3]).unwrap();
/// source.set_species(Some(view_species(|_, _| {
///     Ok(Value::TypedArray(TypedArray::new(ElementKind::Float64, 8)))
/// })));
///
/// let copy = source.slice(0, None).unwrap();
/// assert_eq!(copy.kind(), ElementKind::Float64);
/// assert_eq!(copy.len(), 8);
/// ```
pub fn view_species<F>(f: F) -> Rc<dyn ViewSpecies>
where
    F: Fn(&TypedArray, ConstructArgs<'_>) -> Result<Value> + 'static,
{
    Rc::new(f)
}

/// Boxes a closure as a buffer hook.
pub fn buffer_species<F>(f: F) -> Rc<dyn BufferSpecies>
where
    F: Fn(&ArrayBuffer, usize) -> Result<Value> + 'static,
{
    Rc::new(f)
}

fn default_view(source: &TypedArray, args: ConstructArgs<'_>) -> TypedArray {
    match args {
        ConstructArgs::Length(length) => TypedArray::new(source.kind(), length),
        ConstructArgs::Range {
            buffer,
            byte_offset,
            length,
        } => TypedArray::over(source.kind(), buffer.clone(), byte_offset, length),
    }
}

/// Constructs the view an operation on `source` produces.
pub(crate) fn species_create(source: &TypedArray, args: ConstructArgs<'_>) -> Result<TypedArray> {
    let Some(species) = source.species() else {
        return Ok(default_view(source, args));
    };

    let view = match species.construct(source, args)? {
        Value::TypedArray(view) => view,
        _ => {
            cold_path();
            return Err(Error::NotATypedArray);
        }
    };

    if let ConstructArgs::Length(requested) = args {
        view.require_attached()?;
        if view.len() < requested {
            cold_path();
            return Err(Error::ShortResult(requested, view.len()));
        }
    }

    let (expected, actual) = (source.kind().content_type(), view.kind().content_type());
    if expected != actual {
        cold_path();
        return Err(Error::ContentTypeMismatch(expected, actual));
    }
    Ok(view)
}

fn default_buffer(source: &ArrayBuffer, byte_length: usize) -> ArrayBuffer {
    #[cfg(feature = "shared")]
    if source.is_shared() {
        return ArrayBuffer::new_shared(byte_length);
    }
    let _ = source;
    ArrayBuffer::new(byte_length)
}

/// Constructs the buffer `source.slice(..)` produces.
pub(crate) fn buffer_species_create(
    source: &ArrayBuffer,
    byte_length: usize,
) -> Result<ArrayBuffer> {
    let buffer = match source.species() {
        None => default_buffer(source, byte_length),
        Some(species) => match species.construct(source, byte_length)? {
            Value::ArrayBuffer(buffer) => buffer,
            _ => {
                cold_path();
                return Err(Error::NotAnArrayBuffer);
            }
        },
    };

    if buffer.is_shared() != source.is_shared() {
        cold_path();
        return Err(Error::NotAnArrayBuffer);
    }
    buffer.require_attached()?;
    if buffer.ptr_eq(source) {
        cold_path();
        return Err(Error::SameBufferReturned);
    }
    if buffer.byte_length() < byte_length {
        cold_path();
        return Err(Error::ShortResult(byte_length, buffer.byte_length()));
    }
    Ok(buffer)
}
