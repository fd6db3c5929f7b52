use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use fitloop_core::Observer;

use crate::traits::CanStopEarly;

/// A cloneable flag for cancelling a running solver from another thread.
///
/// As an observer, the token stops the solver at the next evaluation after
/// [`cancel`](Self::cancel) is called.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Every clone of this token observes it.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl<E, A: CanStopEarly> Observer<E, A> for CancelToken {
    fn observe(&mut self, _event: &E) -> Option<A> {
        self.is_cancelled().then(A::stop_early)
    }
}
