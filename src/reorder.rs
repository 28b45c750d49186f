//! Pure reordering of an id list.
//!
//! Both functions return the new full order, or `None` when the move is a
//! no-op (out of range, zero distance, or pushing past either end). Callers
//! persist the result with `Database::save_order`.

/// Move the element at `from` so that it ends up at index `to`.
///
/// ```
/// use cuedeck::reorder::move_to;
///
/// assert_eq!(move_to(&[1, 2, 3, 4], 0, 2), Some(vec![2, 3, 1, 4]));
/// assert_eq!(move_to(&[1, 2, 3], 1, 1), None);
/// ```
pub fn move_to(ids: &[i64], from: usize, to: usize) -> Option<Vec<i64>> {
    if from >= ids.len() || to >= ids.len() || from == to {
        return None;
    }
    let mut out = ids.to_vec();
    let id = out.remove(from);
    out.insert(to, id);
    Some(out)
}

/// Move the element at `index` by `delta` places (negative is towards the head).
///
/// A move that would cross either end is refused rather than clamped, so
/// "move up" on the first entry does nothing.
pub fn move_by(ids: &[i64], index: usize, delta: isize) -> Option<Vec<i64>> {
    let target = index.checked_add_signed(delta)?;
    move_to(ids, index, target)
}
