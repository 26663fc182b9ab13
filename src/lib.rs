//! Lazy incremental sorting for iterators.
//!
//! [`lazy_sort`] splits its input into non-decreasing runs and merges them on demand.
//! Pulling the first `k` elements of the result costs a partitioning pass over the input
//! plus `O(k log R)` for `R` runs, so inputs made of a few long ascending runs are cheap to
//! take a sorted prefix from. Already sorted input forms a single run and is passed through
//! without any merging.
//!
//! ```
//! let sorted: Vec<_> = lazysort_iter::lazy_sort([5, 1, 4, 2, 8, 3]).collect();
//! assert_eq!(vec![1, 2, 3, 4, 5, 8], sorted);
//! ```
//!
//! The sort is stable. Elements need to be `Clone`, as every run retains
//! its last accepted element for comparison; sorting references avoids that cost.
//!
//! # Memory
//! The runs are produced from one shared pass over the input. Elements that are read
//! on behalf of one run but belong to another are kept in that run's replay buffer.
//! In the worst case the buffers hold the entire input, they are never capped.
//! [`LazySortConfig::buffer_warning`] can be used to get a log message when they grow large.

use std::cmp::Ordering;

mod error;
mod extension_trait;
mod merge;
mod orderer;
mod run;
mod sorter;

pub use error::EmptyInputError;
pub use extension_trait::{LazySortByExtension, LazySortExtension};
pub use merge::LazyMerger;
pub use orderer::{FuncOrderer, KeyOrderer, OrdOrderer, Orderer};
pub use run::{
    extractor::{extract_run, ResidualStream, RunStream},
    partitioner::{partition_runs, RunSet},
    PeekedRun, Run,
};
pub use sorter::{result_iter::LazySorted, LazySortConfig};

/// Returns a lazily sorted view over the elements of `input`,
/// using their natural ordering.
pub fn lazy_sort<S>(input: S) -> LazySorted<S::IntoIter, S::Item, OrdOrderer>
where
    S: IntoIterator,
    S::Item: Ord + Clone,
{
    sorter::LazySorter::new(LazySortConfig::default()).run(input.into_iter(), OrdOrderer::new())
}

/// Returns a lazily sorted view over the elements of `input`,
/// ordered by the given comparison function.
pub fn lazy_sort_by<S, F>(
    input: S,
    comparator: F,
) -> LazySorted<S::IntoIter, S::Item, FuncOrderer<F>>
where
    S: IntoIterator,
    S::Item: Clone,
    F: Fn(&S::Item, &S::Item) -> Ordering,
{
    sorter::LazySorter::new(LazySortConfig::default())
        .run(input.into_iter(), FuncOrderer::new(comparator))
}

/// Returns a lazily sorted view over the elements of `input`,
/// ordered by the key extracted from every element.
pub fn lazy_sort_by_key<S, F, K>(
    input: S,
    key_extractor: F,
) -> LazySorted<S::IntoIter, S::Item, KeyOrderer<F>>
where
    S: IntoIterator,
    S::Item: Clone,
    F: Fn(&S::Item) -> K,
    K: Ord,
{
    sorter::LazySorter::new(LazySortConfig::default())
        .run(input.into_iter(), KeyOrderer::new(key_extractor))
}
