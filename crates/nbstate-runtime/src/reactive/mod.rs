#![forbid(unsafe_code)]

//! Observable state containers.
//!
//! This module provides the change-tracking primitives the notebook model is
//! built on:
//!
//! - [`StateHandler`]: a shared, mutable-by-replacement value with change
//!   notification via observer callbacks.
//! - [`StateView`]: a read-only value derived from a handler or another view,
//!   either as a field projection or as a mapped projection.
//! - [`Observable`]: the read/observe/derive/dispose surface both share.
//! - [`Subscription`]: RAII guard that removes its observer on drop.
//!
//! # Architecture
//!
//! Handlers and views use `Rc<..>` for single-threaded shared ownership and
//! hold their value as an immutable `Rc<S>` snapshot that is replaced, never
//! edited. Observers receive `(new, old)` snapshots.
//!
//! # Invariants
//!
//! 1. Observers are notified only when the new value differs structurally
//!    from the old one, unless the update asks for [`Notify::Always`].
//! 2. Observers run synchronously in registration order. An observer removed
//!    during a round is not called later in that round.
//! 3. A view's value is computed from the exact parent snapshot that
//!    triggered it. A round whose snapshot was superseded by a nested
//!    update does not feed views.
//! 4. Disposing a handler disposes every view derived from it, transitively.
//!    Disposing a view detaches it from its parent and nothing else.
//! 5. After disposal, mutation, `add_observer` and view creation return
//!    [`StateError::Disposed`](crate::StateError::Disposed).
//!
//! # Failure Modes
//!
//! - **Observer panics**: caught per observer (by default) and logged; the
//!   remaining observers of the round still run.
//! - **Runaway recursion**: an observer that keeps updating the handler it
//!   observes is stopped at [`HandlerConfig::max_notify_depth`](crate::HandlerConfig)
//!   with [`StateError::NotifyDepthExceeded`](crate::StateError::NotifyDepthExceeded).
//! - **Leaks**: observers close over consumer state; anything registered must
//!   eventually be removed or its handler disposed.

pub mod handler;
mod node;
pub mod observer;
pub mod view;

use std::rc::Rc;

pub use handler::{StateHandler, WeakStateHandler};
pub use observer::{Notify, ObserverId, Subscription};
pub use view::{StateView, ViewKind};

use crate::error::Result;

/// Read, observe, derive and dispose.
///
/// Implemented by [`StateHandler`] and [`StateView`].
pub trait Observable<S: 'static> {
    /// Process-unique id, used in log events.
    fn id(&self) -> u64;

    /// Current snapshot.
    fn state(&self) -> Rc<S>;

    /// Run `f` against the current snapshot.
    fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R;

    /// Register `observer`, called with `(new, old)` after every notified change.
    fn add_observer(&self, observer: impl Fn(&S, &S) + 'static) -> Result<ObserverId>;

    /// Returns `false` if `id` was not registered.
    fn remove_observer(&self, id: ObserverId) -> bool;

    /// Like [`add_observer`](Observable::add_observer), removed when the
    /// returned guard drops.
    fn subscribe(&self, observer: impl Fn(&S, &S) + 'static) -> Result<Subscription>;

    /// A view of one field. Emits only when that field changes.
    fn view<T>(&self, field: impl Fn(&S) -> &T + 'static) -> Result<StateView<T>>
    where
        T: Clone + PartialEq + 'static;

    /// A view of `map(field(state))`. Emits when the mapped value changes.
    ///
    /// `map` runs again whenever the projected field changes and should not
    /// depend on anything else.
    fn map_view<K, T>(
        &self,
        field: impl Fn(&S) -> &K + 'static,
        map: impl Fn(&K) -> T + 'static,
    ) -> Result<StateView<T>>
    where
        K: PartialEq + ?Sized + 'static,
        T: PartialEq + 'static;

    /// [`map_view`](Observable::map_view) with a custom equality deciding
    /// when the mapped value has changed.
    fn map_view_with<K, T>(
        &self,
        field: impl Fn(&S) -> &K + 'static,
        map: impl Fn(&K) -> T + 'static,
        equals: impl Fn(&T, &T) -> bool + 'static,
    ) -> Result<StateView<T>>
    where
        K: PartialEq + ?Sized + 'static,
        T: 'static;

    /// Idempotent. Releases all observers and cascades to derived views.
    fn dispose(&self);

    fn is_disposed(&self) -> bool;

    fn observer_count(&self) -> usize;

    /// Number of live views derived directly from this one.
    fn view_count(&self) -> usize;
}

macro_rules! impl_observable {
    ($ty:ident) => {
        impl<S: 'static> Observable<S> for $ty<S> {
            #[inline]
            fn id(&self) -> u64 {
                self.node.id()
            }

            fn state(&self) -> Rc<S> {
                self.node.state()
            }

            fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
                self.node.with(f)
            }

            fn add_observer(&self, observer: impl Fn(&S, &S) + 'static) -> Result<ObserverId> {
                self.node.add_observer(Rc::new(observer))
            }

            fn remove_observer(&self, id: ObserverId) -> bool {
                self.node.remove_observer(id)
            }

            fn subscribe(&self, observer: impl Fn(&S, &S) + 'static) -> Result<Subscription> {
                self.node.subscribe(Rc::new(observer))
            }

            fn view<T>(&self, field: impl Fn(&S) -> &T + 'static) -> Result<StateView<T>>
            where
                T: Clone + PartialEq + 'static,
            {
                let node = self.node.field_view(field)?;
                Ok(StateView::from_node(node, ViewKind::Field))
            }

            fn map_view<K, T>(
                &self,
                field: impl Fn(&S) -> &K + 'static,
                map: impl Fn(&K) -> T + 'static,
            ) -> Result<StateView<T>>
            where
                K: PartialEq + ?Sized + 'static,
                T: PartialEq + 'static,
            {
                self.map_view_with(field, map, nbstate_core::equality::deep_equals::<T>)
            }

            fn map_view_with<K, T>(
                &self,
                field: impl Fn(&S) -> &K + 'static,
                map: impl Fn(&K) -> T + 'static,
                equals: impl Fn(&T, &T) -> bool + 'static,
            ) -> Result<StateView<T>>
            where
                K: PartialEq + ?Sized + 'static,
                T: 'static,
            {
                let node = self.node.mapped_view(field, map, equals)?;
                Ok(StateView::from_node(node, ViewKind::Mapped))
            }

            fn dispose(&self) {
                node::Dispose::dispose(self.node.as_ref());
            }

            #[inline]
            fn is_disposed(&self) -> bool {
                self.node.is_disposed()
            }

            fn observer_count(&self) -> usize {
                self.node.observer_count()
            }

            fn view_count(&self) -> usize {
                self.node.view_count()
            }
        }
    };
}

impl_observable!(StateHandler);
impl_observable!(StateView);
