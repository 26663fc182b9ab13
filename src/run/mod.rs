mod cascade;
pub mod extractor;
pub mod partitioner;

/// A run is a sequence of items in ascending order,
/// as seen by the merge.
pub trait Run<T> {
    /// peeks at the next value in the sequence.
    fn peek(&self) -> Option<&T>;

    /// fetches the next item from the run.
    /// If the method returns None, we have reached the end.
    fn next(&mut self) -> Option<T>;

    /// returns the bounds on the remaining length of the run
    /// See https://doc.rust-lang.org/std/iter/trait.Iterator.html#method.size_hint
    fn size_hint(&self) -> (usize, Option<usize>);
}

/// Adapts a lazily produced run for the merge by always keeping
/// its next element pulled, so it can be compared without
/// advancing the run.
pub struct PeekedRun<I>
where
    I: Iterator,
{
    head: Option<I::Item>,
    rest: I,
}

impl<I> PeekedRun<I>
where
    I: Iterator,
{
    pub fn new(mut rest: I) -> Self {
        let head = rest.next();
        Self { head, rest }
    }
}

impl<I> Run<I::Item> for PeekedRun<I>
where
    I: Iterator,
{
    fn peek(&self) -> Option<&I::Item> {
        self.head.as_ref()
    }

    fn next(&mut self) -> Option<I::Item> {
        // once the head is gone, the rest is never polled again.
        let head = self.head.take()?;
        self.head = self.rest.next();
        Some(head)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.head.is_none() {
            return (0, Some(0));
        }
        let (lower, upper) = self.rest.size_hint();
        (
            lower.saturating_add(1),
            upper.and_then(|u| u.checked_add(1)),
        )
    }
}
