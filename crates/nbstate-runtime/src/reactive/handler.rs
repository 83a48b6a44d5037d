#![forbid(unsafe_code)]

//! Root state containers.

use std::fmt;
use std::rc::{Rc, Weak};

use super::node::Node;
use super::observer::Notify;
use crate::config::HandlerConfig;
use crate::error::Result;

/// A shared value replaced wholesale on every update.
///
/// Cloning a `StateHandler` creates a new handle to the **same** value.
/// Use [`Observable`](super::Observable) for reads, observers and views.
///
/// # Example
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use nbstate_runtime::{Observable, StateHandler};
///
/// let counter = StateHandler::new(0);
/// let seen = Rc::new(Cell::new(0));
/// let sink = Rc::clone(&seen);
/// counter.add_observer(move |new, _old| sink.set(*new)).unwrap();
///
/// assert!(counter.update(|n| n + 1).unwrap());
/// assert!(!counter.set_state(1).unwrap()); // unchanged: no notification
/// assert_eq!(seen.get(), 1);
/// ```
pub struct StateHandler<S> {
    pub(crate) node: Rc<Node<S>>,
}

impl<S> Clone for StateHandler<S> {
    fn clone(&self) -> Self {
        Self {
            node: Rc::clone(&self.node),
        }
    }
}

impl<S: PartialEq + 'static> StateHandler<S> {
    #[must_use]
    pub fn new(initial: S) -> Self {
        Self::with_config(initial, HandlerConfig::default())
    }

    #[must_use]
    pub fn with_config(initial: S, config: HandlerConfig) -> Self {
        Self {
            node: Rc::new(Node::new(
                initial,
                config,
                nbstate_core::equality::deep_equals::<S>,
            )),
        }
    }
}

impl<S: 'static> StateHandler<S> {
    /// Replace the value with `f(current)`.
    ///
    /// Returns `Ok(true)` when observers were notified, `Ok(false)` when the
    /// result was structurally equal to the current value.
    pub fn update(&self, f: impl FnOnce(&S) -> S) -> Result<bool> {
        self.node.update(Notify::IfChanged, f)
    }

    /// [`update`](Self::update) with an explicit notification policy.
    pub fn update_with(&self, notify: Notify, f: impl FnOnce(&S) -> S) -> Result<bool> {
        self.node.update(notify, f)
    }

    pub fn set_state(&self, value: S) -> Result<bool> {
        self.node.set(value, Notify::IfChanged)
    }

    /// Store `value` and notify even if it equals the current value.
    pub fn set_state_forced(&self, value: S) -> Result<bool> {
        self.node.set(value, Notify::Always)
    }

    #[must_use]
    pub fn config(&self) -> &HandlerConfig {
        self.node.config()
    }

    /// A handle that does not keep the value alive.
    ///
    /// Observers that mutate their own handler should capture one of these
    /// rather than a clone, which would form a reference cycle.
    #[must_use]
    pub fn downgrade(&self) -> WeakStateHandler<S> {
        WeakStateHandler {
            node: Rc::downgrade(&self.node),
        }
    }

    /// Whether both handles refer to the same value.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }
}

impl<S: fmt::Debug + 'static> fmt::Debug for StateHandler<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateHandler")
            .field("id", &self.node.id())
            .field("label", &self.node.config().label)
            .field("state", &*self.node.state())
            .field("observers", &self.node.observer_count())
            .field("views", &self.node.view_count())
            .field("disposed", &self.node.is_disposed())
            .finish()
    }
}

/// Non-owning counterpart of [`StateHandler`].
pub struct WeakStateHandler<S> {
    node: Weak<Node<S>>,
}

impl<S> Clone for WeakStateHandler<S> {
    fn clone(&self) -> Self {
        Self {
            node: Weak::clone(&self.node),
        }
    }
}

impl<S> WeakStateHandler<S> {
    #[must_use]
    pub fn upgrade(&self) -> Option<StateHandler<S>> {
        self.node.upgrade().map(|node| StateHandler { node })
    }
}

impl<S> fmt::Debug for WeakStateHandler<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakStateHandler")
            .field("alive", &(self.node.strong_count() > 0))
            .finish()
    }
}
