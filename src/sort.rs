//! In-place sorting of a view.
//!
//! Without a comparator the strategy is chosen by element kind:
//!
//! | Kind | Strategy |
//! |------|----------|
//! | `Int8`, `Uint8`, `Uint8Clamped` | counting sort over 256 buckets |
//! | `Int16`, `Uint16`, `Int32`, `Uint32`, `Float32` | LSD radix sort on order-preserving keys |
//! | `Float64`, `BigInt64`, `BigUint64` | comparison sort with [`compare_default`] |
//!
//! A comparator always selects the comparison sort. The buffer is checked
//! after every comparator call, so detaching it from inside the comparator
//! fails the sort with [`Error::Detached`](crate::Error::Detached).

use std::cmp::Ordering;

use zerocopy::{NativeEndian, byteorder};

use crate::{ElementKind, Error, Numeric, Result, TypedArray, cold_path};

/// Below this length the radix kinds use the comparison sort.
const RADIX_THRESHOLD: usize = 64;

const INSERTION_THRESHOLD: usize = 8;

/// The default total order: numeric order, `-0` before `+0`, NaN after
/// everything and equal to itself.
///
/// # Example
///
/// ```
/// use std::cmp::Ordering;
/// use tarray::{Numeric, compare_default};
///
/// let neg_zero = Numeric::Number(-0.0);
/// let zero = Numeric::Number(0.0);
/// let nan = Numeric::Number(f64::NAN);
/// assert_eq!(compare_default(&neg_zero, &zero), Ordering::Less);
/// assert_eq!(compare_default(&nan, &Numeric::Number(f64::INFINITY)), Ordering::Greater);
/// assert_eq!(compare_default(&nan, &nan), Ordering::Equal);
/// ```
pub fn compare_default(x: &Numeric, y: &Numeric) -> Ordering {
    match (*x, *y) {
        (Numeric::Number(x), Numeric::Number(y)) => match (x.is_nan(), y.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) if x == 0.0 && y == 0.0 => {
                y.is_sign_negative().cmp(&x.is_sign_negative())
            }
            (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        },
        (Numeric::BigInt(x), Numeric::BigInt(y)) => x.cmp(&y),
        _ => Ordering::Equal,
    }
}

impl TypedArray {
    /// Sorts the elements in the default total order.
    ///
    /// # Example
    ///
    /// ```
    /// use tarray::{ElementKind, TypedArray};
    ///
    /// let values = [3.0, -0.0, f64::NAN, 1.0, 0.0, -1.0];
    /// let view = TypedArray::of(ElementKind::Float32, values).unwrap();
    /// view.sort().unwrap();
    /// assert_eq!(view.join(None).unwrap(), "-1,0,0,1,3,NaN");
    /// ```
    pub fn sort(&self) -> Result<()> {
        let buffer = self.require_attached()?;
        let kind = self.kind();
        let len = self.len();
        let offset = self.element_offset(0);
        match kind {
            ElementKind::Int8 | ElementKind::Uint8 | ElementKind::Uint8Clamped => {
                let mut bytes = buffer.read_vec(offset, len)?;
                counting_sort(&mut bytes, kind == ElementKind::Int8);
                buffer.write(offset, &bytes)
            }
            ElementKind::Int16
            | ElementKind::Uint16
            | ElementKind::Int32
            | ElementKind::Uint32
            | ElementKind::Float32
                if len >= RADIX_THRESHOLD =>
            {
                let mut bytes = buffer.read_vec(offset, len * kind.size())?;
                radix_sort(&mut bytes, kind);
                buffer.write(offset, &bytes)
            }
            _ => self.comparison_sort(|x, y| Ok(compare_default(x, y))),
        }
    }

    /// Sorts the elements with `compare`.
    ///
    /// The comparator may be inconsistent; the sort still terminates, in
    /// some unspecified order.
    pub fn sort_by<F>(&self, mut compare: F) -> Result<()>
    where
        F: FnMut(&Numeric, &Numeric) -> Result<Ordering>,
    {
        let buffer = self.require_attached()?.clone();
        self.comparison_sort(|x, y| {
            let order = compare(x, y)?;
            if buffer.is_detached() {
                cold_path();
                return Err(Error::Detached);
            }
            Ok(order)
        })
    }

    fn comparison_sort<F>(&self, mut compare: F) -> Result<()>
    where
        F: FnMut(&Numeric, &Numeric) -> Result<Ordering>,
    {
        let mut values = self.to_vec()?;
        quicksort(&mut values, &mut compare)?;

        let kind = self.kind();
        let mut bytes = vec![0; values.len() * kind.size()];
        for (value, raw) in values.into_iter().zip(bytes.chunks_exact_mut(kind.size())) {
            kind.encode(value, raw)?;
        }
        self.require_attached()?.write(self.element_offset(0), &bytes)
    }
}

fn counting_sort(bytes: &mut [u8], signed: bool) {
    let flip = if signed { 0x80 } else { 0 };
    let mut counts = [0usize; 256];
    for byte in bytes.iter() {
        counts[(byte ^ flip) as usize] += 1;
    }
    let mut out = bytes.iter_mut();
    for (key, count) in counts.into_iter().enumerate() {
        for slot in out.by_ref().take(count) {
            *slot = key as u8 ^ flip;
        }
    }
}

/// Maps an element's bits to a key whose unsigned order is the default
/// total order. Every NaN maps to `u32::MAX`.
#[inline]
fn radix_key(kind: ElementKind, word: u32) -> u32 {
    match kind {
        ElementKind::Int16 => word ^ 0x8000,
        ElementKind::Int32 => word ^ 0x8000_0000,
        ElementKind::Float32 => {
            if f32::from_bits(word).is_nan() {
                u32::MAX
            } else if word & 0x8000_0000 != 0 {
                !word
            } else {
                word | 0x8000_0000
            }
        }
        _ => word,
    }
}

fn read_word(kind: ElementKind, raw: &[u8]) -> u32 {
    match raw {
        [a, b] if kind.size() == 2 => {
            byteorder::U16::<NativeEndian>::from_bytes([*a, *b]).get() as u32
        }
        [a, b, c, d] => byteorder::U32::<NativeEndian>::from_bytes([*a, *b, *c, *d]).get(),
        _ => 0,
    }
}

fn write_word(kind: ElementKind, word: u32, raw: &mut [u8]) {
    if kind.size() == 2 {
        raw.copy_from_slice(&byteorder::U16::<NativeEndian>::new(word as u16).to_bytes());
    } else {
        raw.copy_from_slice(&byteorder::U32::<NativeEndian>::new(word).to_bytes());
    }
}

/// LSD radix sort over 8-bit digits. Elements travel with their keys so NaN
/// payloads survive.
fn radix_sort(bytes: &mut [u8], kind: ElementKind) {
    let size = kind.size();
    let mut items: Vec<(u32, u32)> = bytes
        .chunks_exact(size)
        .map(|raw| {
            let word = read_word(kind, raw);
            (radix_key(kind, word), word)
        })
        .collect();
    let mut scratch = vec![(0u32, 0u32); items.len()];

    for pass in 0..size {
        let shift = pass * 8;
        let mut counts = [0usize; 257];
        for (key, _) in &items {
            counts[((key >> shift) & 0xff) as usize + 1] += 1;
        }
        for digit in 0..256 {
            counts[digit + 1] += counts[digit];
        }
        for item in &items {
            let digit = ((item.0 >> shift) & 0xff) as usize;
            scratch[counts[digit]] = *item;
            counts[digit] += 1;
        }
        std::mem::swap(&mut items, &mut scratch);
    }

    for ((_, word), raw) in items.into_iter().zip(bytes.chunks_exact_mut(size)) {
        write_word(kind, word, raw);
    }
}

/// Quicksort that propagates comparator errors and never indexes out of
/// bounds, whatever the comparator returns. Keys equal to the pivot are
/// gathered in one pass and never revisited.
fn quicksort<F>(mut v: &mut [Numeric], compare: &mut F) -> Result<()>
where
    F: FnMut(&Numeric, &Numeric) -> Result<Ordering>,
{
    loop {
        if v.len() <= INSERTION_THRESHOLD {
            return insertion_sort(v, compare);
        }
        let (lo, hi) = partition(v, compare)?;
        let (rest, right) = std::mem::take(&mut v).split_at_mut(hi);
        let left = &mut rest[..lo];
        // recurse into the smaller side
        if left.len() < right.len() {
            quicksort(left, compare)?;
            v = right;
        } else {
            quicksort(right, compare)?;
            v = left;
        }
    }
}

/// Three-way partition around the middle element. Returns `(lo, hi)` such
/// that `v[..lo]` compared less than the pivot, `v[hi..]` greater, and
/// `v[lo..hi]` equal. The pivot itself always lands in `v[lo..hi]`, so the
/// middle is never empty.
fn partition<F>(v: &mut [Numeric], compare: &mut F) -> Result<(usize, usize)>
where
    F: FnMut(&Numeric, &Numeric) -> Result<Ordering>,
{
    v.swap(0, v.len() / 2);
    let pivot = v[0];
    let (mut lt, mut i, mut gt) = (1, 1, v.len());
    while i < gt {
        match compare(&v[i], &pivot)? {
            Ordering::Less => {
                v.swap(i, lt);
                lt += 1;
                i += 1;
            }
            Ordering::Greater => {
                gt -= 1;
                v.swap(i, gt);
            }
            Ordering::Equal => i += 1,
        }
    }
    v.swap(0, lt - 1);
    Ok((lt - 1, gt))
}

fn insertion_sort<F>(v: &mut [Numeric], compare: &mut F) -> Result<()>
where
    F: FnMut(&Numeric, &Numeric) -> Result<Ordering>,
{
    for i in 1..v.len() {
        let mut j = i;
        while j > 0 && compare(&v[j], &v[j - 1])? == Ordering::Less {
            v.swap(j, j - 1);
            j -= 1;
        }
    }
    Ok(())
}
