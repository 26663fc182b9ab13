use std::{iter::FusedIterator, rc::Rc};

use crate::{
    merge::LazyMerger,
    orderer::Orderer,
    run::{extractor::RunStream, PeekedRun},
};

/// The lazily sorted view over a source, as returned by
/// [`lazy_sort`](crate::lazy_sort) and friends.
///
/// The source has been split into sorted runs when this is created.
/// Every call to `next` then selects the smallest head among the runs
/// and advances only that run.
pub struct LazySorted<S, T, O>
where
    S: Iterator<Item = T>,
    T: Clone,
    O: Orderer<T>,
{
    inner: Sorted<S, T, O>,
    run_count: usize,
}

pub(crate) enum Sorted<S, T, O>
where
    S: Iterator<Item = T>,
    T: Clone,
    O: Orderer<T>,
{
    /// zero or one run, passed through unchanged.
    Single(Option<RunStream<S, T, Rc<O>>>),
    Merged(LazyMerger<T, PeekedRun<RunStream<S, T, Rc<O>>>, Rc<O>>),
}

impl<S, T, O> LazySorted<S, T, O>
where
    S: Iterator<Item = T>,
    T: Clone,
    O: Orderer<T>,
{
    pub(crate) fn new(inner: Sorted<S, T, O>, run_count: usize) -> Self {
        Self { inner, run_count }
    }

    /// the number of sorted runs the source was split into.
    /// This is 0 for an empty source and 1 for an already sorted one.
    pub fn run_count(&self) -> usize {
        self.run_count
    }
}

impl<S, T, O> Iterator for LazySorted<S, T, O>
where
    S: Iterator<Item = T>,
    T: Clone,
    O: Orderer<T>,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        match &mut self.inner {
            Sorted::Single(slot) => {
                let value = slot.as_mut()?.next();
                if value.is_none() {
                    *slot = None;
                }
                value
            }
            Sorted::Merged(merger) => merger.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            Sorted::Single(Some(run)) => run.size_hint(),
            Sorted::Single(None) => (0, Some(0)),
            Sorted::Merged(merger) => merger.size_hint(),
        }
    }
}

// all elements are buffered in their runs once the partitioning is done,
// so the size hint is exact.
impl<S, T, O> ExactSizeIterator for LazySorted<S, T, O>
where
    S: Iterator<Item = T>,
    T: Clone,
    O: Orderer<T>,
{
}

impl<S, T, O> FusedIterator for LazySorted<S, T, O>
where
    S: Iterator<Item = T>,
    T: Clone,
    O: Orderer<T>,
{
}
