use thiserror::Error;

/// Returned when a run is requested from a cursor that
/// has no elements left.
///
/// The partitioner uses this as its termination signal, so it never
/// reaches callers of [`lazy_sort`](crate::lazy_sort).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("cannot extract a run from an exhausted sequence")]
pub struct EmptyInputError;
