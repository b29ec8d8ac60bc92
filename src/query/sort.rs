//! Result sorting for queries
//!
//! Each sort key contributes a signed partial ordering:
//! - numbers: difference of the two values
//! - strings: lexicographic comparison (-1, 0, 1)
//! - anything else, missing fields, or mismatched types: 0
//!
//! Contributions are combined according to `SortComposition`.

use std::cmp::Ordering;

use serde_json::Value;

use super::filter::resolve_path;

/// Direction of one sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// Positive means ascending, anything else descending (`1` / `-1`)
    pub fn from_sign(sign: i64) -> Self {
        if sign > 0 {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        }
    }
}

/// One `(field path, direction)` sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub path: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn new(path: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            path: path.into(),
            direction,
        }
    }

    pub fn asc(path: impl Into<String>) -> Self {
        Self::new(path, SortDirection::Ascending)
    }

    pub fn desc(path: impl Into<String>) -> Self {
        Self::new(path, SortDirection::Descending)
    }

    /// Signed contribution of this key when comparing `a` with `b`
    ///
    /// `NaN` when the numeric difference is undefined (infinite operands).
    fn contribution(&self, a: &Value, b: &Value) -> f64 {
        let (first, second) = match self.direction {
            SortDirection::Ascending => (a, b),
            SortDirection::Descending => (b, a),
        };

        match (resolve_path(first, &self.path), resolve_path(second, &self.path)) {
            (Some(Value::Number(x)), Some(Value::Number(y))) => match (x.as_f64(), y.as_f64()) {
                (Some(xf), Some(yf)) => xf - yf,
                _ => 0.0,
            },
            (Some(Value::String(x)), Some(Value::String(y))) => match x.cmp(y) {
                Ordering::Less => -1.0,
                Ordering::Equal => 0.0,
                Ordering::Greater => 1.0,
            },
            _ => 0.0,
        }
    }
}

/// How several sort keys combine into one ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortComposition {
    /// The first key with a non-zero contribution decides
    #[default]
    Cascade,

    /// Contributions of all keys are added up and the sign of the sum decides
    ///
    /// Kept for parity with stores queried by older releases; a large
    /// difference on a later key can outweigh a small one on the first key.
    Summed,
}

/// Compare two documents under `keys`
pub fn compare_documents(
    a: &Value,
    b: &Value,
    keys: &[SortKey],
    composition: SortComposition,
) -> Ordering {
    match composition {
        SortComposition::Cascade => keys
            .iter()
            .map(|key| key.contribution(a, b))
            .find(|c| *c != 0.0 && !c.is_nan())
            .map_or(Ordering::Equal, sign),
        SortComposition::Summed => sign(keys.iter().map(|key| key.contribution(a, b)).sum()),
    }
}

/// Stable sort of `items` by the document each one carries
///
/// Mixed-type keys make the comparator non-transitive, which
/// `slice::sort_by` may reject with a panic; a merge sort accepts any
/// comparator.
pub fn sort_by_document<D, F>(
    items: Vec<D>,
    keys: &[SortKey],
    composition: SortComposition,
    document: F,
) -> Vec<D>
where
    F: Fn(&D) -> &Value,
{
    if keys.is_empty() {
        return items;
    }
    merge_sort(items, &|a: &D, b: &D| {
        compare_documents(document(a), document(b), keys, composition)
    })
}

fn merge_sort<D, C>(mut items: Vec<D>, cmp: &C) -> Vec<D>
where
    C: Fn(&D, &D) -> Ordering,
{
    if items.len() <= 1 {
        return items;
    }

    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, cmp);
    let right = merge_sort(right, cmp);

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    loop {
        // Ties take from the left run to keep the sort stable.
        let take_right = match (left.peek(), right.peek()) {
            (Some(a), Some(b)) => cmp(b, a) == Ordering::Less,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        let next = if take_right { right.next() } else { left.next() };
        merged.extend(next);
    }

    merged
}

fn sign(value: f64) -> Ordering {
    value.partial_cmp(&0.0).unwrap_or(Ordering::Equal)
}
