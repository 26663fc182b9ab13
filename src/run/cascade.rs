use std::{collections::VecDeque, num::NonZeroUsize};

use crate::orderer::Orderer;

/// The shared state behind a chain of run extractions over one source.
///
/// Every extraction adds a level holding the last element its run accepted.
/// An element pulled from the source lands in the first level, in extraction order,
/// that it does not undercut. An element rejected by every
/// level belongs to the residual of the newest extraction.
/// This is equivalent to feeding the residual of each extraction into the next one,
/// but a pull never recurses through nested residual iterators, no matter how many
/// runs there are.
///
/// Only the consumer that is currently pulling gets its element handed out directly.
/// Elements routed to any other consumer are queued in that consumer's replay buffer.
/// The buffers are unbounded: a run that is never advanced while the other consumers
/// are drained ends up holding every remaining element that belongs to it.
/// Capping them is not an option, since every element must be replayed exactly once.
pub(crate) struct Cascade<I, T, O> {
    source: I,
    /// set once the source returned None. It is never polled again after that.
    source_done: bool,
    orderer: O,
    levels: Vec<Level<T>>,
    residual: ReplayBuffer<T>,
    buffer_warning: Option<NonZeroUsize>,
}

struct Level<T> {
    /// the last element accepted into this run
    last: T,
    pending: ReplayBuffer<T>,
    /// the run handle was dropped, so routed elements are discarded.
    detached: bool,
}

/// Identifies a consumer of the cascade, for diagnostics.
#[derive(Clone, Copy)]
enum Consumer {
    Run(usize),
    Residual,
}

/// The destination of a freshly pulled element.
enum Route<T> {
    Run(usize, T),
    Residual(T),
}

struct ReplayBuffer<T> {
    items: VecDeque<T>,
    /// whether the growth warning was already emitted for this buffer
    warned: bool,
}

impl<T> ReplayBuffer<T> {
    fn new() -> Self {
        Self {
            items: VecDeque::new(),
            warned: false,
        }
    }

    fn push(&mut self, item: T, warn_at: Option<NonZeroUsize>, consumer: Consumer) {
        self.items.push_back(item);
        if let Some(threshold) = warn_at {
            if !self.warned && self.items.len() > threshold.get() {
                self.warned = true;
                let buffered = self.items.len();
                let threshold = threshold.get();
                match consumer {
                    Consumer::Run(run) => tracing::warn!(
                        run,
                        buffered,
                        threshold,
                        "run replay buffer grew past the configured threshold"
                    ),
                    Consumer::Residual => tracing::warn!(
                        buffered,
                        threshold,
                        "residual replay buffer grew past the configured threshold"
                    ),
                }
            }
        }
    }

    fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

impl<I, T, O> Cascade<I, T, O>
where
    I: Iterator<Item = T>,
    T: Clone,
    O: Orderer<T>,
{
    pub fn new(source: I, orderer: O, buffer_warning: Option<NonZeroUsize>) -> Self {
        Self {
            source,
            source_done: false,
            orderer,
            levels: Vec::new(),
            residual: ReplayBuffer::new(),
            buffer_warning,
        }
    }

    /// the number of runs started so far
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// fetches the next element of the given run.
    pub fn pull_run(&mut self, run: usize) -> Option<T> {
        if let Some(item) = self.levels[run].pending.pop() {
            return Some(item);
        }
        loop {
            let item = self.pull_source()?;
            match self.route(item) {
                Route::Run(idx, item) if idx == run => return Some(item),
                other => self.stash(other),
            }
        }
    }

    /// fetches the next element that no run accepted.
    pub fn pull_residual(&mut self) -> Option<T> {
        if let Some(item) = self.residual.pop() {
            return Some(item);
        }
        loop {
            let item = self.pull_source()?;
            match self.route(item) {
                Route::Residual(item) => return Some(item),
                other => self.stash(other),
            }
        }
    }

    /// Starts a new run headed by `first`, which must be the element
    /// just pulled from the residual.
    /// The elements still buffered for the residual are the continuation
    /// of the new run's input, so they are routed through it right away.
    /// Returns the index of the new run.
    pub fn push_level(&mut self, first: T) -> usize {
        let idx = self.levels.len();
        let warn_at = self.buffer_warning;

        let mut pending = ReplayBuffer::new();
        let mut last = first.clone();
        pending.push(first, warn_at, Consumer::Run(idx));

        let mut residual = ReplayBuffer::new();
        for item in std::mem::take(&mut self.residual.items) {
            if self.orderer.continues_run(&last, &item) {
                last = item.clone();
                pending.push(item, warn_at, Consumer::Run(idx));
            } else {
                residual.push(item, warn_at, Consumer::Residual);
            }
        }
        self.residual = residual;

        self.levels.push(Level {
            last,
            pending,
            detached: false,
        });
        idx
    }

    /// Marks a run as abandoned: its buffer is released and
    /// elements routed to it from now on are discarded.
    pub fn detach_run(&mut self, run: usize) {
        let level = &mut self.levels[run];
        level.detached = true;
        level.pending.items = VecDeque::new();
    }

    pub fn run_size_hint(&self, run: usize) -> (usize, Option<usize>) {
        self.size_hint_with(self.levels[run].pending.len())
    }

    pub fn residual_size_hint(&self) -> (usize, Option<usize>) {
        self.size_hint_with(self.residual.len())
    }

    /// any element still in the source may belong to any consumer.
    fn size_hint_with(&self, buffered: usize) -> (usize, Option<usize>) {
        if self.source_done {
            return (buffered, Some(buffered));
        }
        let (_, upper) = self.source.size_hint();
        (buffered, upper.and_then(|u| u.checked_add(buffered)))
    }

    fn pull_source(&mut self) -> Option<T> {
        if self.source_done {
            return None;
        }
        let item = self.source.next();
        if item.is_none() {
            self.source_done = true;
        }
        item
    }

    /// The last accepted elements strictly decrease from one level to the next:
    /// a level is started by an element all earlier levels rejected, and a level only
    /// ever accepts elements the level before it rejected.
    /// So the levels rejecting an element form a prefix, and the first accepting
    /// level is found by binary search.
    fn route(&mut self, item: T) -> Route<T> {
        let orderer = &self.orderer;
        let idx = self
            .levels
            .partition_point(|level| !orderer.continues_run(&level.last, &item));
        match self.levels.get_mut(idx) {
            Some(level) => {
                level.last = item.clone();
                Route::Run(idx, item)
            }
            None => Route::Residual(item),
        }
    }

    fn stash(&mut self, route: Route<T>) {
        let warn_at = self.buffer_warning;
        match route {
            Route::Run(idx, item) => {
                let level = &mut self.levels[idx];
                if !level.detached {
                    level.pending.push(item, warn_at, Consumer::Run(idx));
                }
            }
            Route::Residual(item) => self.residual.push(item, warn_at, Consumer::Residual),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::orderer::OrdOrderer;

    use super::Cascade;

    fn cascade(source: Vec<u32>) -> Cascade<std::vec::IntoIter<u32>, u32, OrdOrderer> {
        Cascade::new(source.into_iter(), OrdOrderer::new(), None)
    }

    #[test]
    fn test_without_levels_everything_is_residual() {
        let mut cascade = cascade(vec![3, 1, 2]);
        assert_eq!(Some(3), cascade.pull_residual());
        assert_eq!(Some(1), cascade.pull_residual());
        assert_eq!(Some(2), cascade.pull_residual());
        assert_eq!(None, cascade.pull_residual());
        assert_eq!((0, Some(0)), cascade.residual_size_hint());
    }

    #[test]
    fn test_run_pull_buffers_residual() {
        let mut cascade = cascade(vec![4, 1, 5, 2, 6]);
        let first = cascade.pull_residual().unwrap();
        let run = cascade.push_level(first);

        assert_eq!(Some(4), cascade.pull_run(run));
        assert_eq!(Some(5), cascade.pull_run(run));
        assert_eq!(Some(6), cascade.pull_run(run));
        assert_eq!(None, cascade.pull_run(run));

        assert_eq!((2, Some(2)), cascade.residual_size_hint());
        assert_eq!(Some(1), cascade.pull_residual());
        assert_eq!(Some(2), cascade.pull_residual());
        assert_eq!(None, cascade.pull_residual());
    }

    #[test]
    fn test_new_level_takes_over_buffered_residual() {
        let mut cascade = cascade(vec![9, 1, 3, 2, 10]);
        let first = cascade.pull_residual().unwrap();
        let outer = cascade.push_level(first);
        // drain the outer run, leaving [1, 3, 2] in the residual buffer
        assert_eq!(vec![9, 10], std::iter::from_fn(|| cascade.pull_run(outer)).collect::<Vec<_>>());

        let first = cascade.pull_residual().unwrap();
        assert_eq!(1, first);
        let inner = cascade.push_level(first);
        assert_eq!((2, Some(2)), cascade.run_size_hint(inner));
        assert_eq!(Some(1), cascade.pull_run(inner));
        assert_eq!(Some(3), cascade.pull_run(inner));
        assert_eq!(None, cascade.pull_run(inner));
        assert_eq!(Some(2), cascade.pull_residual());
    }

    #[test]
    fn test_detached_run_discards_elements() {
        let mut cascade = cascade(vec![1, 0, 2, 3]);
        let first = cascade.pull_residual().unwrap();
        let run = cascade.push_level(first);
        cascade.detach_run(run);
        assert_eq!(Some(0), cascade.pull_residual());
        assert_eq!(None, cascade.pull_residual());
        assert_eq!((0, Some(0)), cascade.run_size_hint(run));
    }

    #[test]
    fn test_size_hint_before_exhaustion() {
        let mut cascade = cascade(vec![1, 2, 3]);
        let first = cascade.pull_residual().unwrap();
        let run = cascade.push_level(first);
        assert_eq!((1, Some(3)), cascade.run_size_hint(run));
        assert_eq!(cascade.num_levels(), 1);
    }
}
