use std::cmp::Ordering;

use crate::{
    orderer::{FuncOrderer, KeyOrderer, OrdOrderer},
    sorter::{result_iter::LazySorted, LazySortConfig, LazySorter},
};

pub trait LazySortExtension: Iterator
where
    Self: Sized,
    Self::Item: Ord + Clone,
{
    /// Sorts the provided Iterator lazily according to the provided config
    /// using the native ordering on the type to sort.
    ///
    /// The iterator is drained into sorted runs right away,
    /// the merging happens as the result is consumed.
    fn lazy_sort(self, options: LazySortConfig) -> LazySorted<Self, Self::Item, OrdOrderer>;
}

impl<I, T> LazySortExtension for I
where
    I: Iterator<Item = T>,
    T: Ord + Clone,
{
    fn lazy_sort(self, options: LazySortConfig) -> LazySorted<Self, Self::Item, OrdOrderer> {
        LazySorter::new(options).run(self, OrdOrderer::new())
    }
}

pub trait LazySortByExtension: Iterator
where
    Self: Sized,
    Self::Item: Clone,
{
    /// Sorts the provided Iterator lazily according to the provided config
    /// using a custom comparator function
    fn lazy_sort_by<F>(
        self,
        options: LazySortConfig,
        comparator: F,
    ) -> LazySorted<Self, Self::Item, FuncOrderer<F>>
    where
        F: Fn(&Self::Item, &Self::Item) -> Ordering;

    /// Sorts the provided Iterator lazily according to the provided config
    /// using a key extraction function.
    fn lazy_sort_by_key<F, K>(
        self,
        options: LazySortConfig,
        key_extractor: F,
    ) -> LazySorted<Self, Self::Item, KeyOrderer<F>>
    where
        F: Fn(&Self::Item) -> K,
        K: Ord;
}

impl<I, T> LazySortByExtension for I
where
    I: Iterator<Item = T>,
    T: Clone,
{
    fn lazy_sort_by<F>(
        self,
        options: LazySortConfig,
        comparator: F,
    ) -> LazySorted<Self, Self::Item, FuncOrderer<F>>
    where
        F: Fn(&Self::Item, &Self::Item) -> Ordering,
    {
        LazySorter::new(options).run(self, FuncOrderer::new(comparator))
    }

    fn lazy_sort_by_key<F, K>(
        self,
        options: LazySortConfig,
        key_extractor: F,
    ) -> LazySorted<Self, Self::Item, KeyOrderer<F>>
    where
        F: Fn(&Self::Item) -> K,
        K: Ord,
    {
        LazySorter::new(options).run(self, KeyOrderer::new(key_extractor))
    }
}
