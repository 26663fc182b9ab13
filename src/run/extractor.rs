use std::{cell::RefCell, iter::FusedIterator, num::NonZeroUsize, rc::Rc};

use crate::{error::EmptyInputError, orderer::Orderer};

use super::cascade::Cascade;

/// The run output of an extraction.
///
/// Yields the first element of its input and then every element
/// that is not smaller than the last one it yielded. Smaller elements
/// are skipped, so the run only ends once the input is exhausted.
pub struct RunStream<I, T, O>
where
    I: Iterator<Item = T>,
    T: Clone,
    O: Orderer<T>,
{
    shared: Rc<RefCell<Cascade<I, T, O>>>,
    level: usize,
}

/// The residual output of an extraction: every element
/// one of the runs extracted so far rejected, in input order.
///
/// There is only ever one residual per source. Extracting a run
/// from it consumes the handle and hands back the narrowed residual.
pub struct ResidualStream<I, T, O>
where
    I: Iterator<Item = T>,
    T: Clone,
    O: Orderer<T>,
{
    shared: Rc<RefCell<Cascade<I, T, O>>>,
}

/// Splits `source` into its leading non-decreasing run and the residual
/// of all elements breaking it.
///
/// Both outputs read the same underlying iterator, every element is pulled once
/// and routed to exactly one of them.
/// Elements read on behalf of one output but belonging to the other are buffered
/// until the other output asks for them. This buffer is not bounded: draining the residual
/// while never advancing the run keeps every remaining run element in memory.
///
/// # Errors
/// Returns [`EmptyInputError`] if `source` yields no elements at all.
pub fn extract_run<S, O>(
    source: S,
    orderer: O,
) -> Result<
    (
        RunStream<S::IntoIter, S::Item, O>,
        ResidualStream<S::IntoIter, S::Item, O>,
    ),
    EmptyInputError,
>
where
    S: IntoIterator,
    S::Item: Clone,
    O: Orderer<S::Item>,
{
    ResidualStream::new(source.into_iter(), orderer, None).extract_run()
}

impl<I, T, O> ResidualStream<I, T, O>
where
    I: Iterator<Item = T>,
    T: Clone,
    O: Orderer<T>,
{
    /// wraps a source that no run has been extracted from yet.
    /// All of its elements are residual.
    pub(crate) fn new(source: I, orderer: O, buffer_warning: Option<NonZeroUsize>) -> Self {
        Self {
            shared: Rc::new(RefCell::new(Cascade::new(
                source,
                orderer,
                buffer_warning,
            ))),
        }
    }

    /// Extracts the next run from this residual.
    /// Returns the run together with the residual that remains after it.
    ///
    /// # Errors
    /// Returns [`EmptyInputError`] if the residual is already exhausted.
    pub fn extract_run(self) -> Result<(RunStream<I, T, O>, Self), EmptyInputError> {
        let level = {
            let mut cascade = self.shared.borrow_mut();
            let first = cascade.pull_residual().ok_or(EmptyInputError)?;
            cascade.push_level(first)
        };
        tracing::trace!(run = level, "extracted run");

        let run = RunStream {
            shared: Rc::clone(&self.shared),
            level,
        };
        Ok((run, self))
    }

    /// the number of runs extracted from the underlying source so far
    pub fn runs_extracted(&self) -> usize {
        self.shared.borrow().num_levels()
    }
}

impl<I, T, O> Iterator for ResidualStream<I, T, O>
where
    I: Iterator<Item = T>,
    T: Clone,
    O: Orderer<T>,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.shared.borrow_mut().pull_residual()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.shared.borrow().residual_size_hint()
    }
}

impl<I, T, O> FusedIterator for ResidualStream<I, T, O>
where
    I: Iterator<Item = T>,
    T: Clone,
    O: Orderer<T>,
{
}

impl<I, T, O> Iterator for RunStream<I, T, O>
where
    I: Iterator<Item = T>,
    T: Clone,
    O: Orderer<T>,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.shared.borrow_mut().pull_run(self.level)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.shared.borrow().run_size_hint(self.level)
    }
}

impl<I, T, O> FusedIterator for RunStream<I, T, O>
where
    I: Iterator<Item = T>,
    T: Clone,
    O: Orderer<T>,
{
}

impl<I, T, O> Drop for RunStream<I, T, O>
where
    I: Iterator<Item = T>,
    T: Clone,
    O: Orderer<T>,
{
    fn drop(&mut self) {
        // nobody will read this run anymore, so there is no point in buffering for it.
        if let Ok(mut cascade) = self.shared.try_borrow_mut() {
            cascade.detach_run(self.level);
        }
    }
}
