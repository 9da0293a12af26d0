//! Sorting through an index-based contract.

/// Index-based view of a sortable collection.
pub trait Sorter {
    /// Number of elements.
    fn len(&self) -> usize;

    /// Whether the collection has no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether element `i` orders before element `j`.
    fn less(&self, i: usize, j: usize) -> bool;

    /// Exchanges elements `i` and `j`.
    fn swap(&mut self, i: usize, j: usize);
}

impl<T: Ord> Sorter for [T] {
    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn less(&self, i: usize, j: usize) -> bool {
        self[i] < self[j]
    }

    fn swap(&mut self, i: usize, j: usize) {
        <[T]>::swap(self, i, j);
    }
}

type LenFn<S> = Box<dyn Fn(&S) -> usize + Send>;
type LessFn<S> = Box<dyn Fn(&S, usize, usize) -> bool + Send>;
type SwapFn<S> = Box<dyn FnMut(&mut S, usize, usize) + Send>;

/// Closure-backed [`Sorter`] over owned state `S`.
///
/// ```
/// use purefunc::value::{SortInterface, sort};
///
/// let mut names = SortInterface::new(
///     vec!["carol", "alice", "bob"],
///     Vec::len,
///     |v, i, j| v[i] < v[j],
///     |v, i, j| v.swap(i, j),
/// );
/// sort(&mut names);
/// assert_eq!(names.into_inner(), vec!["alice", "bob", "carol"]);
/// ```
pub struct SortInterface<S> {
    state: S,
    len: LenFn<S>,
    less: LessFn<S>,
    swap: SwapFn<S>,
}

impl<S> SortInterface<S> {
    /// Wraps `state` with its three index operations.
    pub fn new<L, C, W>(state: S, len: L, less: C, swap: W) -> Self
    where
        L: Fn(&S) -> usize + Send + 'static,
        C: Fn(&S, usize, usize) -> bool + Send + 'static,
        W: FnMut(&mut S, usize, usize) + Send + 'static,
    {
        Self {
            state,
            len: Box::new(len),
            less: Box::new(less),
            swap: Box::new(swap),
        }
    }

    /// Borrows the wrapped state.
    pub const fn state(&self) -> &S {
        &self.state
    }

    /// Returns the wrapped state.
    pub fn into_inner(self) -> S {
        self.state
    }
}

impl<S> Sorter for SortInterface<S> {
    fn len(&self) -> usize {
        (self.len)(&self.state)
    }

    fn less(&self, i: usize, j: usize) -> bool {
        (self.less)(&self.state, i, j)
    }

    fn swap(&mut self, i: usize, j: usize) {
        (self.swap)(&mut self.state, i, j);
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for SortInterface<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SortInterface")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Sorts `data` in place with heap sort. Not stable.
pub fn sort<S: Sorter + ?Sized>(data: &mut S) {
    let n = data.len();
    for root in (0..n / 2).rev() {
        sift_down(data, root, n);
    }
    for end in (1..n).rev() {
        data.swap(0, end);
        sift_down(data, 0, end);
    }
}

fn sift_down<S: Sorter + ?Sized>(data: &mut S, mut root: usize, end: usize) {
    loop {
        let mut child = 2 * root + 1;
        if child >= end {
            return;
        }
        if child + 1 < end && data.less(child, child + 1) {
            child += 1;
        }
        if !data.less(root, child) {
            return;
        }
        data.swap(root, child);
        root = child;
    }
}

/// Whether `data` is in non-decreasing order.
pub fn is_sorted<S: Sorter + ?Sized>(data: &S) -> bool {
    (1..data.len()).all(|i| !data.less(i, i - 1))
}
