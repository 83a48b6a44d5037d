#![forbid(unsafe_code)]

//! Shared interior of handlers and views.
//!
//! A `Node<S>` is the reference-counted cell behind both [`StateHandler`]
//! and [`StateView`]. Roots are mutated directly; views are fed by an
//! observer registered on their parent node.
//!
//! Ownership runs one way: a parent holds its views strongly through the
//! observer closure that feeds them, and keeps a weak list of them for
//! cascading disposal. A view holds only a weak back-reference to its
//! parent, together with the parent-side observer id used to detach.
//!
//! [`StateHandler`]: super::StateHandler
//! [`StateView`]: super::StateView

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, debug_span, error, trace, warn};

use super::observer::{Notify, ObserverId, Subscription};
use super::view::ViewKind;
use crate::config::HandlerConfig;
use crate::error::{Result, StateError};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

fn next_node_id() -> u64 {
    NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)
}

pub(crate) type ObserverFn<S> = Rc<dyn Fn(&S, &S)>;
type EqualityFn<S> = Box<dyn Fn(&S, &S) -> bool>;

/// Type-erased disposal, so a parent can cascade into views of other types.
pub(crate) trait Dispose {
    fn dispose(&self);

    fn is_disposed(&self) -> bool;
}

pub(crate) struct Node<S> {
    id: u64,
    config: HandlerConfig,
    value: RefCell<Rc<S>>,
    equals: EqualityFn<S>,
    observers: RefCell<Vec<(ObserverId, ObserverFn<S>)>>,
    next_observer: Cell<u64>,
    children: RefCell<Vec<Weak<dyn Dispose>>>,
    detach: RefCell<Option<Box<dyn FnOnce()>>>,
    disposed: Cell<bool>,
    depth: Cell<usize>,
}

/// Tracks nesting of notification rounds; unwinds correctly on panic.
struct DepthGuard<'a>(&'a Cell<usize>);

impl<'a> DepthGuard<'a> {
    fn enter(depth: &'a Cell<usize>) -> Self {
        depth.set(depth.get() + 1);
        Self(depth)
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

impl<S: 'static> Node<S> {
    pub(crate) fn new(
        initial: S,
        config: HandlerConfig,
        equals: impl Fn(&S, &S) -> bool + 'static,
    ) -> Self {
        Self {
            id: next_node_id(),
            config,
            value: RefCell::new(Rc::new(initial)),
            equals: Box::new(equals),
            observers: RefCell::new(Vec::new()),
            next_observer: Cell::new(1),
            children: RefCell::new(Vec::new()),
            detach: RefCell::new(None),
            disposed: Cell::new(false),
            depth: Cell::new(0),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    #[inline]
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub(crate) fn config(&self) -> &HandlerConfig {
        &self.config
    }

    pub(crate) fn state(&self) -> Rc<S> {
        Rc::clone(&self.value.borrow())
    }

    /// Borrow a snapshot. The cell itself is not borrowed while `f` runs,
    /// so `f` may update the node.
    pub(crate) fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        let snapshot = self.state();
        f(&snapshot)
    }

    #[inline]
    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    pub(crate) fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }

    pub(crate) fn view_count(&self) -> usize {
        self.children
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|child| !child.is_disposed())
            .count()
    }

    /// Whether `value` is the snapshot this node currently holds.
    fn is_current(&self, value: &S) -> bool {
        std::ptr::eq(value, Rc::as_ptr(&self.value.borrow()))
    }

    fn is_registered(&self, id: ObserverId) -> bool {
        self.observers.borrow().iter().any(|(oid, _)| *oid == id)
    }

    fn ensure_live(&self, operation: &'static str) -> Result<()> {
        if self.disposed.get() {
            warn!(
                handler = self.id,
                label = self.config.label_str(),
                operation,
                "rejected operation on disposed state handler"
            );
            return Err(StateError::Disposed {
                handler: self.id,
                operation,
            });
        }
        Ok(())
    }

    // ── Observers ────────────────────────────────────────────────────

    pub(crate) fn add_observer(&self, observer: ObserverFn<S>) -> Result<ObserverId> {
        self.ensure_live("add_observer")?;
        let id = ObserverId(self.next_observer.get());
        self.next_observer.set(id.0 + 1);
        self.observers.borrow_mut().push((id, observer));
        Ok(id)
    }

    pub(crate) fn remove_observer(&self, id: ObserverId) -> bool {
        // The removed closure is dropped after the borrow ends; it may own
        // the last reference to a view.
        let removed = {
            let mut observers = self.observers.borrow_mut();
            observers
                .iter()
                .position(|(oid, _)| *oid == id)
                .map(|pos| observers.remove(pos))
        };
        removed.is_some()
    }

    pub(crate) fn subscribe(self: &Rc<Self>, observer: ObserverFn<S>) -> Result<Subscription> {
        let id = self.add_observer(observer)?;
        let node = Rc::downgrade(self);
        Ok(Subscription::new(id, move || {
            if let Some(node) = node.upgrade() {
                node.remove_observer(id);
            }
        }))
    }

    // ── Mutation ─────────────────────────────────────────────────────

    /// Replace the value of a root node.
    pub(crate) fn set(&self, value: S, notify: Notify) -> Result<bool> {
        self.ensure_live("update")?;
        let limit = self.config.max_notify_depth;
        if self.depth.get() >= limit {
            warn!(
                handler = self.id,
                label = self.config.label_str(),
                limit,
                "nested update rejected"
            );
            return Err(StateError::NotifyDepthExceeded {
                handler: self.id,
                limit,
            });
        }
        Ok(self.replace(Rc::new(value), notify))
    }

    /// Compute the next value from the current snapshot and store it.
    pub(crate) fn update(&self, notify: Notify, f: impl FnOnce(&S) -> S) -> Result<bool> {
        self.ensure_live("update")?;
        let next = self.with(f);
        self.set(next, notify)
    }

    /// Feed a derived value into a view node.
    fn push_derived(&self, value: S) {
        if self.disposed.get() {
            return;
        }
        self.replace(Rc::new(value), Notify::IfChanged);
    }

    fn replace(&self, new: Rc<S>, notify: Notify) -> bool {
        let old = {
            let current = self.value.borrow();
            if notify == Notify::IfChanged && (self.equals)(&**current, &*new) {
                trace!(handler = self.id, "update suppressed: value unchanged");
                return false;
            }
            Rc::clone(&current)
        };
        *self.value.borrow_mut() = Rc::clone(&new);
        self.notify(&new, &old);
        true
    }

    fn notify(&self, new: &Rc<S>, old: &Rc<S>) {
        // Snapshot the list so observers may add or remove observers.
        let observers: Vec<(ObserverId, ObserverFn<S>)> = self.observers.borrow().clone();
        if observers.is_empty() {
            return;
        }
        let _span = debug_span!(
            "state.notify",
            handler = self.id,
            label = self.config.label_str(),
            observers = observers.len()
        )
        .entered();
        let _depth = DepthGuard::enter(&self.depth);

        for (id, observer) in observers {
            // Removed earlier in this round.
            if !self.is_registered(id) {
                continue;
            }
            if self.config.isolate_observer_panics {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| observer(&**new, &**old)));
                if let Err(payload) = outcome {
                    error!(
                        handler = self.id,
                        observer = id.raw(),
                        panic = panic_message(payload.as_ref()),
                        "observer panicked; continuing notification"
                    );
                }
            } else {
                observer(&**new, &**old);
            }
        }
    }

    // ── Views ────────────────────────────────────────────────────────

    /// Register a child node fed from this node.
    ///
    /// `select` receives `(new, old)` parent snapshots and returns the next
    /// child value, or `None` when the child is known to be unaffected.
    fn derive<T: 'static>(
        self: &Rc<Self>,
        kind: ViewKind,
        initial: T,
        select: impl Fn(&S, &S) -> Option<T> + 'static,
        equals: impl Fn(&T, &T) -> bool + 'static,
    ) -> Result<Rc<Node<T>>> {
        self.ensure_live("view")?;
        let child = Rc::new(Node::new(initial, self.config.clone(), equals));

        let target = Rc::clone(&child);
        let source = Rc::downgrade(self);
        let observer_id = self.add_observer(Rc::new(move |new: &S, old: &S| {
            // A nested round already fed the child a newer snapshot.
            if !source.upgrade().is_some_and(|parent| parent.is_current(new)) {
                trace!(view = target.id, "stale round skipped");
                return;
            }
            if let Some(next) = select(new, old) {
                target.push_derived(next);
            }
        }))?;

        let parent = Rc::downgrade(self);
        *child.detach.borrow_mut() = Some(Box::new(move || {
            if let Some(parent) = parent.upgrade() {
                parent.remove_observer(observer_id);
            }
        }));

        let weak_child: Weak<dyn Dispose> = Rc::downgrade(&child) as Weak<dyn Dispose>;
        {
            let mut children = self.children.borrow_mut();
            children.retain(|c| c.upgrade().is_some_and(|c| !c.is_disposed()));
            children.push(weak_child);
        }

        debug!(parent = self.id, view = child.id, ?kind, "view created");
        Ok(child)
    }

    /// A view onto one field of this node's value.
    pub(crate) fn field_view<T>(
        self: &Rc<Self>,
        field: impl Fn(&S) -> &T + 'static,
    ) -> Result<Rc<Node<T>>>
    where
        T: Clone + PartialEq + 'static,
    {
        let initial = self.with(|s| field(s).clone());
        self.derive(
            ViewKind::Field,
            initial,
            move |new, old| {
                let next = field(new);
                if next == field(old) {
                    None
                } else {
                    Some(next.clone())
                }
            },
            nbstate_core::equality::deep_equals::<T>,
        )
    }

    /// A view onto `map(field(value))`, compared with `equals`.
    ///
    /// `map` only runs when the projected field itself changed.
    pub(crate) fn mapped_view<K, T>(
        self: &Rc<Self>,
        field: impl Fn(&S) -> &K + 'static,
        map: impl Fn(&K) -> T + 'static,
        equals: impl Fn(&T, &T) -> bool + 'static,
    ) -> Result<Rc<Node<T>>>
    where
        K: PartialEq + ?Sized + 'static,
        T: 'static,
    {
        let initial = self.with(|s| map(field(s)));
        self.derive(
            ViewKind::Mapped,
            initial,
            move |new, old| {
                let next = field(new);
                if next == field(old) {
                    None
                } else {
                    Some(map(next))
                }
            },
            equals,
        )
    }
}

impl<S: 'static> Dispose for Node<S> {
    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        let children: Vec<Rc<dyn Dispose>> = self
            .children
            .borrow_mut()
            .drain(..)
            .filter_map(|child| child.upgrade())
            .collect();
        let observers = std::mem::take(&mut *self.observers.borrow_mut());
        let detach = self.detach.borrow_mut().take();
        if let Some(detach) = detach {
            detach();
        }
        debug!(
            handler = self.id,
            label = self.config.label_str(),
            views = children.len(),
            observers = observers.len(),
            "state handler disposed"
        );
        for child in children {
            child.dispose();
        }
        drop(observers);
    }

    fn is_disposed(&self) -> bool {
        self.disposed.get()
    }
}
