use std::{cmp::Ordering, rc::Rc};

/// A generalisation of the Ord trait.
/// The orderer may carry state (a closure, a key extractor)
/// and is consulted by reference for every comparison the
/// run extraction and the merge perform.
pub trait Orderer<T> {
    /// compares two elements.
    fn compare(&self, left: &T, right: &T) -> Ordering;

    /// returns true if `candidate` may follow `last` inside a run,
    /// that is if `candidate >= last`.
    fn continues_run(&self, last: &T, candidate: &T) -> bool {
        self.compare(candidate, last).is_ge()
    }
}

/// Lets the run extraction and the merge share one orderer.
impl<T, O> Orderer<T> for Rc<O>
where
    O: Orderer<T> + ?Sized,
{
    fn compare(&self, left: &T, right: &T) -> Ordering {
        (**self).compare(left, right)
    }
}

/// An orderer that just delegates to the Ord implementation on the type itself
#[derive(Default, Clone, Copy, Debug)]
pub struct OrdOrderer {}
impl OrdOrderer {
    pub fn new() -> Self {
        Self {}
    }
}

impl<T: Ord> Orderer<T> for OrdOrderer {
    fn compare(&self, left: &T, right: &T) -> Ordering {
        left.cmp(right)
    }
}

/// an orderer comparing the keys extracted from both values.
#[derive(Clone)]
pub struct KeyOrderer<F> {
    key_extractor: F,
}
impl<F> KeyOrderer<F> {
    pub fn new<T, K>(key_extractor: F) -> Self
    where
        F: Fn(&T) -> K,
        K: Ord,
    {
        Self { key_extractor }
    }
}

impl<F, T, K> Orderer<T> for KeyOrderer<F>
where
    F: Fn(&T) -> K,
    K: Ord,
{
    fn compare(&self, left: &T, right: &T) -> Ordering {
        (self.key_extractor)(left).cmp(&(self.key_extractor)(right))
    }
}

/// an orderer delegating to a user supplied comparison function
#[derive(Clone)]
pub struct FuncOrderer<F> {
    comparator: F,
}

impl<F> FuncOrderer<F> {
    pub fn new<T>(comparator: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering,
    {
        Self { comparator }
    }
}

impl<F, T> Orderer<T> for FuncOrderer<F>
where
    F: Fn(&T, &T) -> Ordering,
{
    fn compare(&self, left: &T, right: &T) -> Ordering {
        (self.comparator)(left, right)
    }
}
