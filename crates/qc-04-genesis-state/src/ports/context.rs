use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Cancellation signal of the caller's execution context.
///
/// Polled once per account by the export loop. A signaled context ends the
/// export with `GenesisError::Terminated`.
pub trait ExecutionContext {
    fn is_cancelled(&self) -> bool;
}

/// Context that is never cancelled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverCancel;

impl ExecutionContext for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl ExecutionContext for AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Acquire)
    }
}

impl<T: ExecutionContext + ?Sized> ExecutionContext for Arc<T> {
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

impl<T: ExecutionContext + ?Sized> ExecutionContext for &T {
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

/// Wraps a context with a deadline. Expiry reads as cancellation.
#[derive(Debug, Clone)]
pub struct Deadline<C> {
    inner: C,
    deadline: Instant,
}

impl<C: ExecutionContext> Deadline<C> {
    pub fn new(inner: C, deadline: Instant) -> Self {
        Self { inner, deadline }
    }
}

impl<C: ExecutionContext> ExecutionContext for Deadline<C> {
    fn is_cancelled(&self) -> bool {
        Instant::now() >= self.deadline || self.inner.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_atomic_flag_context() {
        let flag = Arc::new(AtomicBool::new(false));
        assert!(!flag.is_cancelled());

        flag.store(true, Ordering::Release);
        assert!(flag.is_cancelled());
    }

    #[test]
    fn test_deadline_expiry_reads_as_cancellation() {
        let expired = Deadline::new(NeverCancel, Instant::now());
        assert!(expired.is_cancelled());

        let later = Deadline::new(NeverCancel, Instant::now() + Duration::from_secs(3600));
        assert!(!later.is_cancelled());

        let flag = AtomicBool::new(true);
        assert!(Deadline::new(&flag, Instant::now() + Duration::from_secs(3600)).is_cancelled());
    }
}
