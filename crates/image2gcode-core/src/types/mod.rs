//! Type aliases shared across the workspace

/// A boxed iterator, used where the traversal order is chosen at runtime.
///
/// # Example
/// ```
/// use image2gcode_core::types::BoxedIterator;
///
/// let ascending = false;
/// let iter: BoxedIterator<u32> = if ascending {
///     Box::new(0..3)
/// } else {
///     Box::new((0..3).rev())
/// };
/// assert_eq!(iter.collect::<Vec<_>>(), vec![2, 1, 0]);
/// ```
pub type BoxedIterator<T> = Box<dyn Iterator<Item = T>>;
