//! Linear scans over a view: predicate tests, searches, mapping, folding,
//! joining and enumeration.
//!
//! Callbacks run synchronously, one index at a time, and may do anything,
//! including detaching the buffer being scanned. The element count is fixed
//! when the scan starts; every element is read through [`TypedArray::get`],
//! which fails with [`Error::Detached`] once the buffer is gone, so a scan
//! never observes stale memory after its callback detached the buffer.

use crate::{
    ConstructArgs, Error, IntoNumeric, Numeric, Result, TypedArray, cold_path, relative_index,
    species_create,
};

impl TypedArray {
    /// Returns `true` if `predicate` holds for every element. Stops at the
    /// first element for which it does not.
    ///
    /// # Example
    ///
    /// ```
    /// use tarray::{ElementKind, TypedArray};
    ///
    /// let view = TypedArray::of(ElementKind::Int16, [2, 4, 6]).unwrap();
    /// assert!(view.every(|x, _, _| Ok(x.as_f64() % 2.0 == 0.0)).unwrap());
    /// ```
    pub fn every<F>(&self, mut predicate: F) -> Result<bool>
    where
        F: FnMut(Numeric, usize, &TypedArray) -> Result<bool>,
    {
        let len = self.scan_len()?;
        for k in 0..len {
            if !predicate(self.get(k)?, k, self)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Returns `true` if `predicate` holds for some element. Stops at the
    /// first element for which it does.
    pub fn some<F>(&self, mut predicate: F) -> Result<bool>
    where
        F: FnMut(Numeric, usize, &TypedArray) -> Result<bool>,
    {
        let len = self.scan_len()?;
        for k in 0..len {
            if predicate(self.get(k)?, k, self)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Returns the first element satisfying `predicate`.
    pub fn find<F>(&self, predicate: F) -> Result<Option<Numeric>>
    where
        F: FnMut(Numeric, usize, &TypedArray) -> Result<bool>,
    {
        Ok(self.find_entry(predicate)?.map(|(_, value)| value))
    }

    /// Returns the index of the first element satisfying `predicate`.
    pub fn find_index<F>(&self, predicate: F) -> Result<Option<usize>>
    where
        F: FnMut(Numeric, usize, &TypedArray) -> Result<bool>,
    {
        Ok(self.find_entry(predicate)?.map(|(k, _)| k))
    }

    fn find_entry<F>(&self, mut predicate: F) -> Result<Option<(usize, Numeric)>>
    where
        F: FnMut(Numeric, usize, &TypedArray) -> Result<bool>,
    {
        let len = self.scan_len()?;
        for k in 0..len {
            let value = self.get(k)?;
            if predicate(value, k, self)? {
                return Ok(Some((k, value)));
            }
        }
        Ok(None)
    }

    pub fn for_each<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(Numeric, usize, &TypedArray) -> Result<()>,
    {
        let len = self.scan_len()?;
        for k in 0..len {
            f(self.get(k)?, k, self)?;
        }
        Ok(())
    }

    /// Creates a view of the same length holding `f` applied to every
    /// element. The result is allocated before the first call.
    pub fn map<F, R>(&self, mut f: F) -> Result<TypedArray>
    where
        F: FnMut(Numeric, usize, &TypedArray) -> Result<R>,
        R: IntoNumeric,
    {
        let len = self.scan_len()?;
        let result = species_create(self, ConstructArgs::Length(len))?;
        for k in 0..len {
            let mapped = f(self.get(k)?, k, self)?;
            result.set(k, mapped)?;
        }
        Ok(result)
    }

    /// Creates a view holding, in order, the elements for which `predicate`
    /// holds. The result is allocated once every element has been tested.
    pub fn filter<F>(&self, mut predicate: F) -> Result<TypedArray>
    where
        F: FnMut(Numeric, usize, &TypedArray) -> Result<bool>,
    {
        let len = self.scan_len()?;
        let mut kept = Vec::new();
        for k in 0..len {
            let value = self.get(k)?;
            if predicate(value, k, self)? {
                kept.push(value);
            }
        }

        let result = species_create(self, ConstructArgs::Length(kept.len()))?;
        for (n, value) in kept.into_iter().enumerate() {
            result.set(n, value)?;
        }
        Ok(result)
    }

    /// Folds the elements from the first to the last.
    ///
    /// Without `initial` the first element seeds the accumulator; an empty
    /// view then fails with [`Error::EmptyReduce`].
    ///
    /// # Example
    ///
    /// ```
    /// use tarray::{ElementKind, Numeric, TypedArray};
    ///
    /// let view = TypedArray::of(ElementKind::Uint8, [1, 2, 3]).unwrap();
    /// let sum = view
    ///     .reduce(|acc: Numeric, x, _, _| Ok(Numeric::Number(acc.as_f64() + x.as_f64())), None)
    ///     .unwrap();
    /// assert_eq!(sum, Numeric::Number(6.0));
    /// ```
    pub fn reduce<A, F>(&self, f: F, initial: Option<A>) -> Result<A>
    where
        A: From<Numeric>,
        F: FnMut(A, Numeric, usize, &TypedArray) -> Result<A>,
    {
        let len = self.scan_len()?;
        self.fold(0..len, f, initial)
    }

    /// Folds the elements from the last to the first.
    pub fn reduce_right<A, F>(&self, f: F, initial: Option<A>) -> Result<A>
    where
        A: From<Numeric>,
        F: FnMut(A, Numeric, usize, &TypedArray) -> Result<A>,
    {
        let len = self.scan_len()?;
        self.fold((0..len).rev(), f, initial)
    }

    fn fold<I, A, F>(&self, mut indices: I, mut f: F, initial: Option<A>) -> Result<A>
    where
        I: Iterator<Item = usize>,
        A: From<Numeric>,
        F: FnMut(A, Numeric, usize, &TypedArray) -> Result<A>,
    {
        let mut acc = match initial {
            Some(acc) => acc,
            None => match indices.next() {
                Some(k) => A::from(self.get(k)?),
                None => {
                    cold_path();
                    return Err(Error::EmptyReduce);
                }
            },
        };
        for k in indices {
            acc = f(acc, self.get(k)?, k, self)?;
        }
        Ok(acc)
    }

    /// Returns the first index holding an element strictly equal to
    /// `search`, starting at `from_index` (relative, default `0`).
    ///
    /// NaN is never found; use [`TypedArray::includes`] for that.
    pub fn index_of(&self, search: Numeric, from_index: Option<i64>) -> Result<Option<usize>> {
        let len = self.scan_len()?;
        if len == 0 {
            return Ok(None);
        }
        let start = relative_index(from_index.unwrap_or(0), len);
        for k in start..len {
            if self.get(k)? == search {
                return Ok(Some(k));
            }
        }
        Ok(None)
    }

    /// Returns the last index holding an element strictly equal to
    /// `search`, scanning down from `from_index` (relative, default
    /// `len - 1`).
    pub fn last_index_of(
        &self,
        search: Numeric,
        from_index: Option<i64>,
    ) -> Result<Option<usize>> {
        let len = self.scan_len()?;
        if len == 0 {
            return Ok(None);
        }
        let start = match from_index {
            None => len - 1,
            Some(n) if n >= 0 => (n as u64).min(len as u64 - 1) as usize,
            Some(n) => match (len as i64).checked_add(n) {
                Some(k) if k >= 0 => k as usize,
                _ => return Ok(None),
            },
        };
        for k in (0..=start).rev() {
            if self.get(k)? == search {
                return Ok(Some(k));
            }
        }
        Ok(None)
    }

    /// Like [`TypedArray::index_of`] != `None`, except that NaN finds NaN.
    pub fn includes(&self, search: Numeric, from_index: Option<i64>) -> Result<bool> {
        let len = self.scan_len()?;
        if len == 0 {
            return Ok(false);
        }
        let start = relative_index(from_index.unwrap_or(0), len);
        for k in start..len {
            if self.get(k)?.same_value_zero(&search) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Joins the elements' standard string forms with `separator`
    /// (default `","`).
    ///
    /// # Example
    ///
    /// ```
    /// use tarray::{ElementKind, TypedArray};
    ///
    /// let view = TypedArray::of(ElementKind::Float32, [1.5, -0.0, f64::NAN]).unwrap();
    /// assert_eq!(view.join(None).unwrap(), "1.5,0,NaN");
    /// assert_eq!(view.join(Some(" | ")).unwrap(), "1.5 | 0 | NaN");
    /// ```
    pub fn join(&self, separator: Option<&str>) -> Result<String> {
        let separator = separator.unwrap_or(",");
        let mut out = String::new();
        for (k, value) in self.to_vec()?.into_iter().enumerate() {
            if k > 0 {
                out.push_str(separator);
            }
            out.push_str(&value.to_string());
        }
        Ok(out)
    }

    /// `join(",")`; fails on a detached view.
    pub fn to_string(&self) -> Result<String> {
        self.join(None)
    }

    /// Iterates over the indices `0..len`.
    pub fn keys(&self) -> Result<Keys> {
        Cursor::new(self).map(Keys)
    }

    /// Iterates over the elements.
    pub fn values(&self) -> Result<Values> {
        Cursor::new(self).map(Values)
    }

    /// Iterates over `(index, element)` pairs.
    pub fn entries(&self) -> Result<Entries> {
        Cursor::new(self).map(Entries)
    }

    /// Validates the receiver and returns the element count a scan covers.
    #[inline]
    fn scan_len(&self) -> Result<usize> {
        self.require_attached()?;
        Ok(self.len())
    }
}

/// Iteration state shared by [`Keys`], [`Values`] and [`Entries`].
///
/// The length is fixed when iteration starts. Each step checks the buffer
/// again; after a detached step yields `Err(Detached)` the iterator is fused.
struct Cursor {
    view: TypedArray,
    next: usize,
    len: usize,
    done: bool,
}

impl Cursor {
    fn new(view: &TypedArray) -> Result<Self> {
        let len = view.scan_len()?;
        Ok(Self {
            view: view.clone(),
            next: 0,
            len,
            done: false,
        })
    }

    fn step<T>(&mut self, read: impl FnOnce(&TypedArray, usize) -> Result<T>) -> Option<Result<T>> {
        if self.done || self.next >= self.len {
            return None;
        }
        let k = self.next;
        self.next += 1;
        let item = read(&self.view, k);
        if item.is_err() {
            cold_path();
            self.done = true;
        }
        Some(item)
    }

    fn remaining(&self) -> usize {
        if self.done { 0 } else { self.len - self.next }
    }
}

/// Iterator returned by [`TypedArray::keys`].
pub struct Keys(Cursor);

impl Iterator for Keys {
    type Item = Result<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.step(|view, k| {
            view.require_attached()?;
            Ok(k)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.0.remaining()))
    }
}

/// Iterator returned by [`TypedArray::values`].
pub struct Values(Cursor);

impl Iterator for Values {
    type Item = Result<Numeric>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.step(TypedArray::get)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.0.remaining()))
    }
}

/// Iterator returned by [`TypedArray::entries`].
pub struct Entries(Cursor);

impl Iterator for Entries {
    type Item = Result<(usize, Numeric)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.step(|view, k| Ok((k, view.get(k)?)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.0.remaining()))
    }
}
