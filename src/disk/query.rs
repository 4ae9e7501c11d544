//! Queries with an unknown result size
//!
//! Several Windows queries write a variable-length record and fail with
//! "insufficient buffer" when it does not fit, sometimes without saying how
//! much room is needed. [`query_with_growth`] drives such a query: start small,
//! grow on every insufficiency, stop at a ceiling.

use crate::disk::device::IoctlOutcome;
use crate::error::{FindfsError, Result};

/// How a query buffer starts and grows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthPolicy {
    /// Size of the first attempt
    pub initial: usize,
    /// Growth when the OS gives no usable size hint
    pub step: usize,
    /// Largest buffer ever allocated
    pub ceiling: usize,
}

impl GrowthPolicy {
    /// Create a growth policy
    pub fn new(initial: usize, step: usize, ceiling: usize) -> Self {
        Self {
            initial,
            step,
            ceiling,
        }
    }

    /// Size of the next attempt after `current` was too small
    fn next_capacity(&self, current: usize, hint: Option<usize>) -> usize {
        match hint {
            Some(required) if required > current => required,
            _ => current.saturating_add(self.step.max(1)),
        }
    }
}

/// Bytes written by a successful query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOutput {
    /// Reply, truncated to the byte count the OS reported
    pub bytes: Vec<u8>,
    /// Number of times the query was issued
    pub attempts: usize,
}

/// Run `query` with a growing buffer until it completes
///
/// Every attempt gets a freshly zeroed buffer. Errors from `query` are returned
/// as-is; exceeding `policy.ceiling` yields [`FindfsError::BufferCeiling`].
pub fn query_with_growth<F>(
    policy: &GrowthPolicy,
    operation: &str,
    mut query: F,
) -> Result<QueryOutput>
where
    F: FnMut(&mut [u8]) -> Result<IoctlOutcome>,
{
    let mut buffer = vec![0u8; policy.initial.min(policy.ceiling)];
    let mut attempts = 0;

    loop {
        attempts += 1;
        match query(&mut buffer)? {
            IoctlOutcome::Complete(written) => {
                buffer.truncate(written);
                return Ok(QueryOutput {
                    bytes: buffer,
                    attempts,
                });
            }
            IoctlOutcome::InsufficientBuffer(hint) => {
                let next = policy.next_capacity(buffer.len(), hint);
                if next > policy.ceiling {
                    return Err(FindfsError::BufferCeiling {
                        operation: operation.to_string(),
                        ceiling: policy.ceiling,
                    });
                }
                log::trace!("{}: growing buffer {} -> {} bytes", operation, buffer.len(), next);
                buffer.clear();
                buffer.resize(next, 0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn needs(size: usize, hint: bool) -> impl FnMut(&mut [u8]) -> Result<IoctlOutcome> {
        move |buffer| {
            if buffer.len() < size {
                Ok(IoctlOutcome::InsufficientBuffer(hint.then_some(size)))
            } else {
                buffer[..size].fill(0xab);
                Ok(IoctlOutcome::Complete(size))
            }
        }
    }

    #[test]
    fn test_grows_one_step_at_a_time() {
        let policy = GrowthPolicy::new(48, 144, 48 + 144 * 16);
        let output = query_with_growth(&policy, "test", needs(48 + 144 * 3, false)).unwrap();
        assert_eq!(output.attempts, 4);
        assert_eq!(output.bytes.len(), 48 + 144 * 3);
        assert!(output.bytes.iter().all(|&b| b == 0xab));
    }

    #[test]
    fn test_follows_size_hint() {
        let policy = GrowthPolicy::new(8, 2, 4096);
        let output = query_with_growth(&policy, "test", needs(300, true)).unwrap();
        assert_eq!(output.attempts, 2);
        assert_eq!(output.bytes.len(), 300);
    }

    #[test]
    fn test_ignores_useless_hint() {
        let policy = GrowthPolicy::new(10, 10, 100);
        let mut calls = 0;
        let output = query_with_growth(&policy, "test", |buffer| {
            calls += 1;
            if buffer.len() < 30 {
                // hint no larger than what was already tried
                Ok(IoctlOutcome::InsufficientBuffer(Some(buffer.len())))
            } else {
                Ok(IoctlOutcome::Complete(buffer.len()))
            }
        })
        .unwrap();
        assert_eq!(output.attempts, 3);
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_stops_at_ceiling() {
        let policy = GrowthPolicy::new(48, 144, 48 + 144 * 2);
        let err = query_with_growth(&policy, "IOCTL_TEST", |_| {
            Ok(IoctlOutcome::InsufficientBuffer(None))
        })
        .unwrap_err();
        assert!(matches!(
            err,
            FindfsError::BufferCeiling { ref operation, ceiling }
                if operation == "IOCTL_TEST" && ceiling == 336
        ));
    }

    #[test]
    fn test_other_errors_end_the_query() {
        let policy = GrowthPolicy::new(48, 144, 4096);
        let mut calls = 0;
        let err = query_with_growth(&policy, "test", |_| {
            calls += 1;
            Err(FindfsError::os("IOCTL_TEST", "The request is not supported."))
        })
        .unwrap_err();
        assert_eq!(calls, 1);
        assert!(err.is_skippable());
    }

    #[test]
    fn test_each_attempt_sees_zeroed_buffer() {
        let policy = GrowthPolicy::new(4, 4, 64);
        query_with_growth(&policy, "test", |buffer| {
            assert!(buffer.iter().all(|&b| b == 0));
            if buffer.len() < 12 {
                buffer.fill(0xff);
                Ok(IoctlOutcome::InsufficientBuffer(None))
            } else {
                Ok(IoctlOutcome::Complete(12))
            }
        })
        .unwrap();
    }
}
