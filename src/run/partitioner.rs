use std::num::NonZeroUsize;

use crate::{error::EmptyInputError, orderer::Orderer};

use super::extractor::{ResidualStream, RunStream};

/// The runs a source was decomposed into, in extraction order.
///
/// Every element of the source belongs to exactly one run,
/// and every run on its own yields its elements in non-decreasing order.
pub struct RunSet<I, T, O>
where
    I: Iterator<Item = T>,
    T: Clone,
    O: Orderer<T>,
{
    runs: Vec<RunStream<I, T, O>>,
}

impl<I, T, O> RunSet<I, T, O>
where
    I: Iterator<Item = T>,
    T: Clone,
    O: Orderer<T>,
{
    /// the number of runs in the set
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn into_runs(self) -> Vec<RunStream<I, T, O>> {
        self.runs
    }
}

impl<I, T, O> IntoIterator for RunSet<I, T, O>
where
    I: Iterator<Item = T>,
    T: Clone,
    O: Orderer<T>,
{
    type Item = RunStream<I, T, O>;
    type IntoIter = std::vec::IntoIter<RunStream<I, T, O>>;

    fn into_iter(self) -> Self::IntoIter {
        self.runs.into_iter()
    }
}

/// Decomposes `source` into non-decreasing runs.
///
/// The whole source is read before this returns, since the last run can only
/// be known to be the last one once the source is exhausted.
/// The elements end up in the replay buffers of their runs.
pub fn partition_runs<S, O>(source: S, orderer: O) -> RunSet<S::IntoIter, S::Item, O>
where
    S: IntoIterator,
    S::Item: Clone,
    O: Orderer<S::Item>,
{
    partition_with(source.into_iter(), orderer, None)
}

pub(crate) fn partition_with<I, T, O>(
    source: I,
    orderer: O,
    buffer_warning: Option<NonZeroUsize>,
) -> RunSet<I, T, O>
where
    I: Iterator<Item = T>,
    T: Clone,
    O: Orderer<T>,
{
    let mut runs = Vec::new();
    let mut residual = ResidualStream::new(source, orderer, buffer_warning);
    loop {
        match residual.extract_run() {
            Ok((run, rest)) => {
                runs.push(run);
                residual = rest;
            }
            // the residual ran dry, every element has found its run.
            Err(EmptyInputError) => break,
        }
    }
    tracing::debug!(runs = runs.len(), "partitioned input into sorted runs");
    RunSet { runs }
}
