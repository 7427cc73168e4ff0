use std::{cell::RefCell, fmt, rc::Rc};

use crate::{ArrayBuffer, ElementKind, Error, IntoNumeric, Numeric, Result, ViewSpecies, cold_path};

struct ViewInner {
    buffer: ArrayBuffer,
    kind: ElementKind,
    byte_offset: usize,
    length: usize,
    species: RefCell<Option<Rc<dyn ViewSpecies>>>,
}

/// A typed projection over an [`ArrayBuffer`].
///
/// A view never owns its buffer and never changes its kind, offset or length.
/// Once the buffer detaches, the view reports a length of `0` and every
/// element access fails with [`Error::Detached`].
///
/// Cloning the handle aliases the same view object.
#[derive(Clone)]
pub struct TypedArray(Rc<ViewInner>);

impl TypedArray {
    /// Creates a view of `length` zeroed elements over a fresh exclusive
    /// buffer.
    ///
    /// # Panics
    ///
    /// Panics if `length * kind.size()` overflows `usize`.
    pub fn new(kind: ElementKind, length: usize) -> Self {
        let Some(byte_length) = length.checked_mul(kind.size()) else {
            cold_path();
            panic!("{length} {kind} elements overflow the byte length");
        };
        Self::over(kind, ArrayBuffer::new(byte_length), 0, length)
    }

    /// Creates a view over an existing buffer.
    ///
    /// # Arguments
    ///
    /// * `byte_offset` - Must be a multiple of the element size.
    /// * `length` - Element count; `None` covers the rest of the buffer,
    ///   whose byte length must then be a multiple of the element size.
    ///
    /// # Errors
    ///
    /// [`Error::Detached`] if the buffer is detached, [`Error::Misaligned`] or
    /// [`Error::OutOfBounds`] if the range does not fit.
    pub fn with_buffer(
        kind: ElementKind,
        buffer: ArrayBuffer,
        byte_offset: usize,
        length: Option<usize>,
    ) -> Result<Self> {
        let size = kind.size();
        if byte_offset % size != 0 {
            cold_path();
            return Err(Error::Misaligned(byte_offset, size));
        }
        buffer.require_attached()?;
        let buffer_len = buffer.byte_length();
        let length = match length {
            Some(length) => {
                let end = length
                    .checked_mul(size)
                    .and_then(|bytes| bytes.checked_add(byte_offset));
                if end.is_none_or(|end| end > buffer_len) {
                    cold_path();
                    return Err(Error::OutOfBounds);
                }
                length
            }
            None => {
                if buffer_len % size != 0 {
                    cold_path();
                    return Err(Error::Misaligned(buffer_len, size));
                }
                if byte_offset > buffer_len {
                    cold_path();
                    return Err(Error::OutOfBounds);
                }
                (buffer_len - byte_offset) / size
            }
        };
        Ok(Self::over(kind, buffer, byte_offset, length))
    }

    /// Reinterprets a byte range without validating it against the buffer.
    /// The caller derives the range from a view that fit when it was created.
    pub(crate) fn over(
        kind: ElementKind,
        buffer: ArrayBuffer,
        byte_offset: usize,
        length: usize,
    ) -> Self {
        Self(Rc::new(ViewInner {
            buffer,
            kind,
            byte_offset,
            length,
            species: RefCell::new(None),
        }))
    }

    /// Creates a view holding `values`, converted to `kind`.
    ///
    /// # Example
    ///
    /// ```
    /// use tarray::{ElementKind, Numeric, TypedArray};
    ///
    /// let view = TypedArray::of(ElementKind::Int8, [1, 2, 300]).unwrap();
    /// assert_eq!(view.get(2).unwrap(), Numeric::Number(44.0));
    /// ```
    pub fn of<I>(kind: ElementKind, values: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: IntoNumeric,
    {
        Self::from_mapped(kind, values, |value, _| Ok(value))
    }

    /// Creates a view from `source`, passing every item and its index through
    /// `map` before storing it.
    ///
    /// The source is drained completely before the view is allocated; `map`
    /// runs afterwards, in ascending index order.
    pub fn from_mapped<I, R, F>(kind: ElementKind, source: I, mut map: F) -> Result<Self>
    where
        I: IntoIterator,
        R: IntoNumeric,
        F: FnMut(I::Item, usize) -> Result<R>,
    {
        let values: Vec<I::Item> = source.into_iter().collect();
        let target = Self::new(kind, values.len());
        for (k, value) in values.into_iter().enumerate() {
            let mapped = map(value, k)?;
            target.set(k, mapped)?;
        }
        Ok(target)
    }

    #[inline]
    pub fn kind(&self) -> ElementKind {
        self.0.kind
    }

    #[inline]
    pub fn buffer(&self) -> &ArrayBuffer {
        &self.0.buffer
    }

    #[inline]
    pub fn is_detached(&self) -> bool {
        self.0.buffer.is_detached()
    }

    /// Resolves the buffer, failing with [`Error::Detached`] once it has been
    /// released.
    #[inline]
    pub fn require_attached(&self) -> Result<&ArrayBuffer> {
        self.0.buffer.require_attached()?;
        Ok(&self.0.buffer)
    }

    /// Returns the element count, `0` once detached.
    #[inline]
    pub fn len(&self) -> usize {
        if self.is_detached() { 0 } else { self.0.length }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the byte offset into the buffer, `0` once detached.
    #[inline]
    pub fn byte_offset(&self) -> usize {
        if self.is_detached() { 0 } else { self.0.byte_offset }
    }

    #[inline]
    pub fn byte_length(&self) -> usize {
        self.len() * self.0.kind.size()
    }

    /// Returns `true` if both handles refer to the same view object.
    #[inline]
    pub fn ptr_eq(&self, other: &TypedArray) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Installs (or clears) the hook that decides what `map`, `filter`,
    /// `slice` and `subarray` construct.
    pub fn set_species(&self, species: Option<Rc<dyn ViewSpecies>>) {
        *self.0.species.borrow_mut() = species;
    }

    pub fn species(&self) -> Option<Rc<dyn ViewSpecies>> {
        self.0.species.borrow().clone()
    }

    /// Byte position of element `index` within the buffer, ignoring
    /// detachment.
    #[inline]
    pub(crate) fn element_offset(&self, index: usize) -> usize {
        self.0.byte_offset + index * self.0.kind.size()
    }

    /// Byte offset and element count as fixed at creation.
    #[inline]
    pub(crate) fn raw_layout(&self) -> (usize, usize) {
        (self.0.byte_offset, self.0.length)
    }

    #[inline]
    fn check_index(&self, index: usize) -> Result<()> {
        self.0.buffer.require_attached()?;
        if index >= self.0.length {
            cold_path();
            return Err(Error::OutOfBounds);
        }
        Ok(())
    }

    /// Reads element `index`.
    pub fn get(&self, index: usize) -> Result<Numeric> {
        self.check_index(index)?;
        let mut raw = [0u8; 8];
        let raw = &mut raw[..self.0.kind.size()];
        self.0.buffer.read(self.element_offset(index), raw)?;
        Ok(self.0.kind.decode(raw))
    }

    /// Converts `value` to this view's kind and stores it at `index`.
    ///
    /// The value is converted before the buffer is checked, so a conversion
    /// error wins over a detached buffer.
    pub fn set(&self, index: usize, value: impl IntoNumeric) -> Result<()> {
        let value = value.into_numeric(self.0.kind.content_type())?;
        let mut raw = [0u8; 8];
        let raw = &mut raw[..self.0.kind.size()];
        self.0.kind.encode(value, raw)?;
        self.write_raw(index, raw)
    }

    pub(crate) fn read_raw(&self, index: usize, out: &mut [u8]) -> Result<()> {
        self.check_index(index)?;
        self.0.buffer.read(self.element_offset(index), out)
    }

    pub(crate) fn write_raw(&self, index: usize, raw: &[u8]) -> Result<()> {
        self.check_index(index)?;
        self.0.buffer.write(self.element_offset(index), raw)
    }

    /// Copies every element out.
    pub fn to_vec(&self) -> Result<Vec<Numeric>> {
        let buffer = self.require_attached()?;
        let kind = self.0.kind;
        let bytes = buffer.read_vec(self.0.byte_offset, self.byte_length())?;
        Ok(bytes.chunks_exact(kind.size()).map(|raw| kind.decode(raw)).collect())
    }
}

impl fmt::Debug for TypedArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.0.kind.name())
            .field("byte_offset", &self.0.byte_offset)
            .field("length", &self.0.length)
            .field("detached", &self.is_detached())
            .finish()
    }
}
