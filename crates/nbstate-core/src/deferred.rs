#![forbid(unsafe_code)]

//! Externally-resolvable results.
//!
//! [`deferred()`] returns a [`Resolver`] / [`Deferred`] pair. The resolver is
//! the capability to settle the result and can be stored in state (it is
//! `Clone` and compares by identity); the deferred is a read-only future
//! held by whoever waits for the answer.
//!
//! # Invariants
//!
//! 1. A deferred settles at most once. Later `resolve`/`reject` calls
//!    return `false` and have no effect.
//! 2. `is_settled()` is `true` on every clone of the resolver, and on the
//!    deferred, as soon as a value has been sent.
//! 3. Dropping every resolver clone without settling yields
//!    [`DeferredError::Abandoned`] on the waiting side.
//!
//! # Example
//!
//! ```
//! use nbstate_core::deferred::deferred;
//!
//! let (resolver, pending) = deferred::<u32>();
//! assert!(!pending.is_settled());
//! assert!(resolver.resolve(7));
//! assert!(pending.is_settled());
//! assert_eq!(futures::executor::block_on(pending), Ok(7));
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::channel::oneshot;
use thiserror::Error;

/// Why a deferred finished without a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeferredError<E> {
    /// The resolver rejected the request.
    #[error("deferred was rejected")]
    Rejected(E),
    /// Every resolver was dropped before settling.
    #[error("deferred was abandoned before it settled")]
    Abandoned,
}

type Slot<T, E> = Arc<Mutex<Option<oneshot::Sender<Result<T, E>>>>>;

/// Create a linked resolver and deferred whose rejection carries no reason.
#[must_use]
pub fn deferred<T>() -> (Resolver<T>, Deferred<T>) {
    deferred_with_error()
}

/// Like [`deferred()`], with a rejection reason of type `E`.
#[must_use]
pub fn deferred_with_error<T, E>() -> (Resolver<T, E>, Deferred<T, E>) {
    let (tx, rx) = oneshot::channel();
    let settled = Arc::new(AtomicBool::new(false));
    let resolver = Resolver {
        slot: Arc::new(Mutex::new(Some(tx))),
        settled: Arc::clone(&settled),
    };
    let pending = Deferred {
        receiver: rx,
        settled,
    };
    (resolver, pending)
}

// ─── Resolver ────────────────────────────────────────────────────────────────

/// Capability to settle a [`Deferred`].
pub struct Resolver<T, E = ()> {
    slot: Slot<T, E>,
    settled: Arc<AtomicBool>,
}

impl<T, E> Clone for Resolver<T, E> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
            settled: Arc::clone(&self.settled),
        }
    }
}

impl<T, E> PartialEq for Resolver<T, E> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }
}

impl<T, E> Eq for Resolver<T, E> {}

impl<T, E> fmt::Debug for Resolver<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("settled", &self.is_settled())
            .finish()
    }
}

impl<T, E> Resolver<T, E> {
    /// Settle with a value. Returns `false` if already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Settle with a rejection. Returns `false` if already settled.
    pub fn reject(&self, reason: E) -> bool {
        self.settle(Err(reason))
    }

    fn settle(&self, outcome: Result<T, E>) -> bool {
        let sender = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match sender {
            Some(tx) => {
                self.settled.store(true, Ordering::Release);
                // A dropped receiver still counts as settled from this side.
                let _ = tx.send(outcome);
                true
            }
            None => {
                tracing::trace!("deferred already settled");
                false
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.settled.load(Ordering::Acquire)
    }

    /// Whether the waiting side was dropped before this resolver settled.
    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(oneshot::Sender::is_canceled)
    }
}

// ─── Deferred ────────────────────────────────────────────────────────────────

/// Read-only side of a deferred result.
///
/// Await it (or poll it) to receive the outcome. Chain with the
/// [`FutureExt`] combinators.
#[must_use = "a deferred does nothing unless awaited or inspected"]
pub struct Deferred<T, E = ()> {
    receiver: oneshot::Receiver<Result<T, E>>,
    settled: Arc<AtomicBool>,
}

impl<T, E> fmt::Debug for Deferred<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("settled", &self.is_settled())
            .finish()
    }
}

impl<T, E> Deferred<T, E> {
    /// An already-resolved deferred.
    pub fn resolved(value: T) -> Self {
        let (resolver, pending) = deferred_with_error();
        resolver.resolve(value);
        pending
    }

    /// An already-rejected deferred.
    pub fn rejected(reason: E) -> Self {
        let (resolver, pending) = deferred_with_error();
        resolver.reject(reason);
        pending
    }

    #[inline]
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.settled.load(Ordering::Acquire)
    }

    /// Take the outcome without blocking.
    ///
    /// Returns `None` while pending. After an outcome has been taken the
    /// deferred reports [`DeferredError::Abandoned`].
    pub fn try_take(&mut self) -> Option<Result<T, DeferredError<E>>> {
        match self.receiver.try_recv() {
            Ok(Some(outcome)) => Some(outcome.map_err(DeferredError::Rejected)),
            Ok(None) => None,
            Err(oneshot::Canceled) => {
                self.settled.store(true, Ordering::Release);
                Some(Err(DeferredError::Abandoned))
            }
        }
    }

    /// Run `cleanup` once the deferred settles, whatever the outcome.
    pub fn finally<F>(self, cleanup: F) -> impl Future<Output = Result<T, DeferredError<E>>>
    where
        F: FnOnce(),
    {
        self.map(move |outcome| {
            cleanup();
            outcome
        })
    }
}

impl<T, E> Future for Deferred<T, E> {
    type Output = Result<T, DeferredError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match this.receiver.poll_unpin(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome.map_err(DeferredError::Rejected)),
            Poll::Ready(Err(oneshot::Canceled)) => {
                this.settled.store(true, Ordering::Release);
                Poll::Ready(Err(DeferredError::Abandoned))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
