//! Region-to-region operations: copy, fill, reverse, slice, subview and set.
//!
//! Source and destination may be the same view, overlapping views over the
//! same buffer, views of different element kinds, or views over unrelated
//! buffers. Same-kind copies move raw bytes with memmove semantics; copies
//! that convert between kinds go through a scratch copy whenever the byte
//! ranges overlap.

use crate::{
    ArrayBuffer, ConstructArgs, Error, IntoNumeric, Result, TypedArray, buffer_species_create,
    cold_path, normalize_range, range_count, relative_index, species_create,
};

/// How `set` moves elements from a source view into the target.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum SetApproach {
    /// Same element kind: a raw byte move.
    SameKind,
    /// Different kinds over byte ranges that cannot alias.
    Disjoint,
    /// Different kinds over overlapping bytes of the same storage.
    Overlapping,
}

impl TypedArray {
    /// Copies the elements in `[start, end)` to position `target`, as if
    /// through an intermediate buffer.
    ///
    /// # Example
    ///
    /// ```
    /// use tarray::{ElementKind, TypedArray};
    ///
    /// let view = TypedArray::of(ElementKind::Int32, 0..8).unwrap();
    /// view.copy_within(0, 3, Some(6)).unwrap();
    /// assert_eq!(view.join(None).unwrap(), "3,4,5,3,4,5,6,7");
    /// ```
    pub fn copy_within(&self, target: i64, start: i64, end: Option<i64>) -> Result<()> {
        self.require_attached()?;
        let len = self.len();
        let to = relative_index(target, len);
        let (from, last) = normalize_range(start, end, len);
        let count = range_count(from, last).min(len - to);
        if count > 0 {
            let buffer = self.require_attached()?;
            let size = self.kind().size();
            buffer.copy_within(self.element_offset(from), self.element_offset(to), count * size)?;
        }
        Ok(())
    }

    /// Stores `value` at every index in `[start, end)`.
    ///
    /// The value is converted once, up front. Every store checks the buffer
    /// again.
    pub fn fill(&self, value: impl IntoNumeric, start: i64, end: Option<i64>) -> Result<()> {
        self.require_attached()?;
        let kind = self.kind();
        let value = value.into_numeric(kind.content_type())?;
        let mut raw = [0u8; 8];
        let raw = &mut raw[..kind.size()];
        kind.encode(value, raw)?;

        let (from, last) = normalize_range(start, end, self.len());
        for k in from..last {
            self.write_raw(k, raw)?;
        }
        Ok(())
    }

    /// Reverses the elements in place.
    pub fn reverse(&self) -> Result<()> {
        self.require_attached()?;
        let len = self.len();
        let size = self.kind().size();
        let (mut lower_raw, mut upper_raw) = ([0u8; 8], [0u8; 8]);
        let (lower_raw, upper_raw) = (&mut lower_raw[..size], &mut upper_raw[..size]);
        for lower in 0..len / 2 {
            let upper = len - 1 - lower;
            self.read_raw(lower, lower_raw)?;
            self.read_raw(upper, upper_raw)?;
            self.write_raw(lower, upper_raw)?;
            self.write_raw(upper, lower_raw)?;
        }
        Ok(())
    }

    /// Copies the elements in `[start, end)` into a new view that does not
    /// share storage with this one (unless a species hook says otherwise).
    pub fn slice(&self, start: i64, end: Option<i64>) -> Result<TypedArray> {
        self.require_attached()?;
        let (from, last) = normalize_range(start, end, self.len());
        let count = range_count(from, last);
        let result = species_create(self, ConstructArgs::Length(count))?;
        if count == 0 {
            return Ok(result);
        }

        // the hook may have detached us
        let source = self.require_attached()?;
        if result.kind() == self.kind() {
            let (dst_offset, _) = result.raw_layout();
            let bytes = count * self.kind().size();
            result
                .require_attached()?
                .copy_from(dst_offset, source, self.element_offset(from), bytes)?;
        } else {
            for n in 0..count {
                result.set(n, self.get(from + n)?)?;
            }
        }
        Ok(result)
    }

    /// Creates a view over `[begin, end)` of this view's elements, sharing
    /// the same buffer.
    ///
    /// No attachment check is made: a subview of a detached view is legal
    /// and permanently empty.
    ///
    /// # Example
    ///
    /// ```
    /// use tarray::{ElementKind, TypedArray};
    ///
    /// let view = TypedArray::of(ElementKind::Uint16, [1, 2, 3, 4]).unwrap();
    /// let tail = view.subarray(-2, None).unwrap();
    /// tail.set(0, 30).unwrap();
    /// assert_eq!(view.join(None).unwrap(), "1,2,30,4");
    /// assert_eq!(tail.byte_offset(), 4);
    /// ```
    pub fn subarray(&self, begin: i64, end: Option<i64>) -> Result<TypedArray> {
        let (from, last) = normalize_range(begin, end, self.len());
        let length = range_count(from, last);
        species_create(
            self,
            ConstructArgs::Range {
                buffer: self.buffer(),
                byte_offset: self.element_offset(from),
                length,
            },
        )
    }

    /// Stores the items of `source` starting at element `offset`.
    ///
    /// Each item is converted and then stored before the next is read; the
    /// buffer is checked again before every store.
    ///
    /// # Errors
    ///
    /// [`Error::NegativeOffset`] for `offset < 0`, [`Error::OutOfBounds`] if
    /// the items do not fit, [`Error::Detached`] if the buffer is or becomes
    /// detached.
    pub fn set_values<I>(&self, source: I, offset: i64) -> Result<()>
    where
        I: IntoIterator,
        I::IntoIter: ExactSizeIterator,
        I::Item: IntoNumeric,
    {
        let offset = self.check_set_offset(offset)?;
        let items = source.into_iter();
        let limit = self.check_set_limit(offset, items.len())?;

        let shared = self.buffer().is_shared();
        let content = self.kind().content_type();
        for (k, item) in (offset..limit).zip(items) {
            let value = item.into_numeric(content)?;
            if !shared {
                self.require_attached()?;
            }
            self.set(k, value)?;
        }
        Ok(())
    }

    /// Copies every element of `source` into this view starting at element
    /// `offset`, converting between element kinds where they differ.
    ///
    /// The result is always as if `source` had first been copied into
    /// independent storage, even when both views overlap in the same buffer.
    ///
    /// # Example
    ///
    /// ```
    /// use tarray::{ElementKind, TypedArray};
    ///
    /// let view = TypedArray::of(ElementKind::Uint8, 0..8).unwrap();
    /// view.set_typed(&view.subarray(2, Some(5)).unwrap(), 0).unwrap();
    /// assert_eq!(view.join(None).unwrap(), "2,3,4,3,4,5,6,7");
    /// ```
    pub fn set_typed(&self, source: &TypedArray, offset: i64) -> Result<()> {
        let offset = self.check_set_offset(offset)?;
        source.require_attached()?;
        let (expected, actual) = (self.kind().content_type(), source.kind().content_type());
        if expected != actual {
            cold_path();
            return Err(Error::ContentTypeMismatch(expected, actual));
        }
        let count = source.len();
        self.check_set_limit(offset, count)?;
        if count == 0 {
            return Ok(());
        }

        match self.set_approach(source, offset, count) {
            SetApproach::SameKind => {
                let bytes = count * self.kind().size();
                self.buffer().copy_from(
                    self.element_offset(offset),
                    source.buffer(),
                    source.element_offset(0),
                    bytes,
                )
            }
            SetApproach::Disjoint => {
                for k in 0..count {
                    self.set(offset + k, source.get(k)?)?;
                }
                Ok(())
            }
            SetApproach::Overlapping => {
                let scratch = source.to_vec()?;
                for (k, value) in scratch.into_iter().enumerate() {
                    self.set(offset + k, value)?;
                }
                Ok(())
            }
        }
    }

    fn set_approach(&self, source: &TypedArray, offset: usize, count: usize) -> SetApproach {
        if self.kind() == source.kind() {
            return SetApproach::SameKind;
        }
        if !self.buffer().same_storage(source.buffer()) {
            return SetApproach::Disjoint;
        }
        let dst_start = self.element_offset(offset);
        let dst_end = dst_start + count * self.kind().size();
        let src_start = source.element_offset(0);
        let src_end = src_start + count * source.kind().size();
        if dst_start < src_end && src_start < dst_end {
            SetApproach::Overlapping
        } else {
            SetApproach::Disjoint
        }
    }

    fn check_set_offset(&self, offset: i64) -> Result<usize> {
        if offset < 0 {
            cold_path();
            return Err(Error::NegativeOffset);
        }
        self.require_attached()?;
        Ok(usize::try_from(offset).unwrap_or(usize::MAX))
    }

    /// Returns `offset + count`, failing if that passes the end of the view.
    fn check_set_limit(&self, offset: usize, count: usize) -> Result<usize> {
        match offset.checked_add(count) {
            Some(limit) if limit <= self.len() => Ok(limit),
            _ => {
                cold_path();
                Err(Error::OutOfBounds)
            }
        }
    }
}

impl ArrayBuffer {
    /// Copies bytes `[start, end)` into a new buffer of the same sharedness
    /// (or whatever the installed species hook constructs).
    ///
    /// # Errors
    ///
    /// [`Error::Detached`] if this buffer is detached, before or after the
    /// result is constructed; the hook checks listed in
    /// [`species`](crate::species).
    ///
    /// # Example
    ///
    /// ```
    /// use tarray::{ArrayBuffer, ElementKind, TypedArray};
    ///
    /// let view = TypedArray::of(ElementKind::Uint8, [10, 20, 30, 40]).unwrap();
    /// let copy = view.buffer().slice(1, Some(-1)).unwrap();
    /// assert_eq!(copy.to_vec().unwrap(), [20, 30]);
    /// ```
    pub fn slice(&self, start: i64, end: Option<i64>) -> Result<ArrayBuffer> {
        self.require_attached()?;
        let (first, last) = normalize_range(start, end, self.byte_length());
        let new_len = range_count(first, last);
        let result = buffer_species_create(self, new_len)?;
        self.require_attached()?;
        if new_len > 0 {
            result.copy_from(0, self, first, new_len)?;
        }
        Ok(result)
    }
}
