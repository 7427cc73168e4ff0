//! Conversion of caller-supplied relative positions into absolute indices.
//!
//! Every range-taking operation (`copy_within`, `fill`, `slice`, `subarray`,
//! buffer `slice`, and the `from_index` of the search family) goes through the
//! same rule: a negative position `v` counts from the end and maps to
//! `max(len + v, 0)`, a non-negative one maps to `min(v, len)`, and an omitted
//! end means `len`.

/// Coerces an already-numeric argument to an integer position: NaN becomes 0,
/// fractions truncate toward zero and infinities saturate.
///
/// Saturating to `i64` keeps the clamping below exact, since no length comes
/// anywhere near `i64::MAX`.
#[inline]
pub fn to_integer(x: f64) -> i64 {
    if x.is_nan() { 0 } else { x.trunc() as i64 }
}

/// Maps a relative position onto `[0, len]`.
///
/// # Example
///
/// ```
/// use tarray::relative_index;
///
/// assert_eq!(relative_index(-2, 8), 6);
/// assert_eq!(relative_index(-20, 8), 0);
/// assert_eq!(relative_index(3, 8), 3);
/// assert_eq!(relative_index(30, 8), 8);
/// ```
#[inline]
pub fn relative_index(relative: i64, len: usize) -> usize {
    if relative < 0 {
        (len as i64).saturating_add(relative).max(0) as usize
    } else {
        (relative as u64).min(len as u64) as usize
    }
}

/// Normalizes `start`/`end` against `len`, returning `(from, final)`.
///
/// `final` may be smaller than `from`; use [`range_count`] for the clamped
/// element count.
#[inline]
pub fn normalize_range(start: i64, end: Option<i64>, len: usize) -> (usize, usize) {
    let from = relative_index(start, len);
    let last = end.map_or(len, |end| relative_index(end, len));
    (from, last)
}

/// `max(last - from, 0)`.
#[inline]
pub fn range_count(from: usize, last: usize) -> usize {
    last.saturating_sub(from)
}
