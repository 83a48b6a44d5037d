#![forbid(unsafe_code)]

//! Pure, non-mutating collection helpers.
//!
//! Every function returns a fresh collection and leaves its inputs alone, so
//! they compose with immutable state snapshots.
//!
//! Positional helpers take a signed index: any `idx <= -1` on
//! [`arr_insert`] / [`arr_replace`] means "prepend". Indexes past the end are
//! clamped for insert/replace and ignored for delete.

use std::collections::BTreeMap;

/// Insert `item` before position `idx`.
#[must_use]
pub fn arr_insert<T: Clone>(arr: &[T], idx: isize, item: T) -> Vec<T> {
    let mut out = Vec::with_capacity(arr.len() + 1);
    match usize::try_from(idx) {
        Ok(idx) => {
            let at = idx.min(arr.len());
            out.extend_from_slice(&arr[..at]);
            out.push(item);
            out.extend_from_slice(&arr[at..]);
        }
        Err(_) => {
            out.push(item);
            out.extend_from_slice(arr);
        }
    }
    out
}

/// Replace the element at `idx` with `item`.
///
/// Past the end, `item` is appended.
#[must_use]
pub fn arr_replace<T: Clone>(arr: &[T], idx: isize, item: T) -> Vec<T> {
    let mut out = Vec::with_capacity(arr.len() + 1);
    match usize::try_from(idx) {
        Ok(idx) => {
            let at = idx.min(arr.len());
            out.extend_from_slice(&arr[..at]);
            out.push(item);
            if at < arr.len() {
                out.extend_from_slice(&arr[at + 1..]);
            }
        }
        Err(_) => {
            out.push(item);
            out.extend_from_slice(arr);
        }
    }
    out
}

/// Remove the element at `idx`; out-of-range indexes return the input unchanged.
#[must_use]
pub fn arr_delete<T: Clone>(arr: &[T], idx: isize) -> Vec<T> {
    match usize::try_from(idx) {
        Ok(idx) if idx < arr.len() => {
            let mut out = Vec::with_capacity(arr.len() - 1);
            out.extend_from_slice(&arr[..idx]);
            out.extend_from_slice(&arr[idx + 1..]);
            out
        }
        _ => arr.to_vec(),
    }
}

/// Remove the first element structurally equal to `item`.
#[must_use]
pub fn arr_delete_first_item<T: Clone + PartialEq>(arr: &[T], item: &T) -> Vec<T> {
    match arr.iter().position(|candidate| candidate == item) {
        Some(idx) => {
            let mut out = arr.to_vec();
            out.remove(idx);
            out
        }
        None => arr.to_vec(),
    }
}

/// Elements only in `a` and elements only in `b`, by structural equality.
#[must_use]
pub fn diff_array<T: Clone + PartialEq>(a: &[T], b: &[T]) -> (Vec<T>, Vec<T>) {
    diff_array_by(a, b, |x, y| x == y)
}

/// [`diff_array`] with a caller-supplied equality. O(n·m).
#[must_use]
pub fn diff_array_by<T: Clone>(a: &[T], b: &[T], eq: impl Fn(&T, &T) -> bool) -> (Vec<T>, Vec<T>) {
    let a_not_b = a
        .iter()
        .filter(|x| !b.iter().any(|y| eq(x, y)))
        .cloned()
        .collect();
    let b_not_a = b
        .iter()
        .filter(|y| !a.iter().any(|x| eq(x, y)))
        .cloned()
        .collect();
    (a_not_b, b_not_a)
}

/// Split into (matching, non-matching), preserving relative order.
#[must_use]
pub fn partition<T: Clone>(arr: &[T], pred: impl FnMut(&T) -> bool) -> (Vec<T>, Vec<T>) {
    arr.iter().cloned().partition(pred)
}

/// Whether `start` is an element-wise prefix of `base`.
#[inline]
#[must_use]
pub fn array_starts_with<T: PartialEq>(base: &[T], start: &[T]) -> bool {
    base.starts_with(start)
}

/// Apply `f` to the elements satisfying `cond`; others are copied through.
#[must_use]
pub fn map_some<T: Clone>(arr: &[T], cond: impl Fn(&T) -> bool, f: impl Fn(&T) -> T) -> Vec<T> {
    arr.iter()
        .map(|item| if cond(item) { f(item) } else { item.clone() })
        .collect()
}

/// Map the values of an ordered map, keeping its keys.
#[must_use]
pub fn map_values<K: Ord + Clone, V, U>(
    map: &BTreeMap<K, V>,
    mut f: impl FnMut(&V) -> U,
) -> BTreeMap<K, U> {
    map.iter().map(|(k, v)| (k.clone(), f(v))).collect()
}

/// Three-way unzip.
#[must_use]
pub fn unzip3<A, B, C>(items: impl IntoIterator<Item = (A, B, C)>) -> (Vec<A>, Vec<B>, Vec<C>) {
    let mut out = (Vec::new(), Vec::new(), Vec::new());
    for (a, b, c) in items {
        out.0.push(a);
        out.1.push(b);
        out.2.push(c);
    }
    out
}

/// Last `/`-separated segment of a notebook path.
#[must_use]
pub fn name_from_path(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
