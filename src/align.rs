/// Rounds `value` down to the previous multiple of `align`.
///
/// `align` must be a power of two.
///
/// # Examples
///
/// ```rust
/// use buddy_arena::align_down;
///
/// assert_eq!(align_down!(100, 64), 64);
/// assert_eq!(align_down!(128, 64), 128);
/// ```
#[macro_export]
macro_rules! align_down {
  ($value:expr, $align:expr) => {
    ($value) & !(($align) - 1)
  };
}

/// Rounds `value` up to the next multiple of `align`.
///
/// `align` must be a power of two.
///
/// # Examples
///
/// ```rust
/// use buddy_arena::align_up;
///
/// assert_eq!(align_up!(40, 32), 64);
/// assert_eq!(align_up!(64, 32), 64);
/// ```
#[macro_export]
macro_rules! align_up {
  ($value:expr, $align:expr) => {
    (($value) + ($align) - 1) & !(($align) - 1)
  };
}

/// Size of the block a request of `request` bytes ends up in, given the
/// smallest block the tree is allowed to produce.
///
/// A free leaf is only split while its half still holds the request, so the
/// granted block is the smallest power of two that is `>= request`, never
/// below `min_block`. Returns `None` when that power of two overflows `usize`.
pub fn block_size_for(
  request: usize,
  min_block: usize,
) -> Option<usize> {
  request
    .checked_next_power_of_two()
    .map(|size| size.max(min_block))
}
