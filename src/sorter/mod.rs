use std::{num::NonZeroUsize, rc::Rc};

use crate::{
    merge::LazyMerger,
    orderer::Orderer,
    run::{partitioner::partition_with, PeekedRun},
};

use self::result_iter::{LazySorted, Sorted};

pub mod result_iter;

/// The configuration for the lazy sorting.
#[derive(Clone, Debug, Default)]
pub struct LazySortConfig {
    /// the number of elements a single replay buffer may hold
    /// before a warning is logged
    pub(crate) buffer_warning: Option<NonZeroUsize>,
}

impl LazySortConfig {
    /// Creates a configuration that never warns about buffer growth.
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs a warning whenever a replay buffer first grows beyond
    /// `threshold` elements.
    /// The buffers are never capped, this is purely diagnostic.
    /// Useful for fluent-style api usage.
    pub fn buffer_warning(self, threshold: NonZeroUsize) -> Self {
        Self {
            buffer_warning: Some(threshold),
        }
    }
}

pub struct LazySorter {
    config: LazySortConfig,
}

impl LazySorter {
    pub fn new(options: LazySortConfig) -> Self {
        Self { config: options }
    }

    pub fn run<S, T, O>(&self, source: S, orderer: O) -> LazySorted<S, T, O>
    where
        S: Iterator<Item = T>,
        T: Clone,
        O: Orderer<T>,
    {
        let orderer = Rc::new(orderer);
        let runs = partition_with(source, Rc::clone(&orderer), self.config.buffer_warning);
        let run_count = runs.len();

        let inner = if run_count < 2 {
            // the input already is sorted, so there is nothing to merge.
            Sorted::Single(runs.into_iter().next())
        } else {
            let runs = runs.into_iter().map(PeekedRun::new).collect();
            Sorted::Merged(LazyMerger::new(runs, orderer))
        };

        LazySorted::new(inner, run_count)
    }
}
