#![forbid(unsafe_code)]

//! Observer handles and notification policy.

use std::fmt;

/// Identifies one registered observer on one handler or view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub(crate) u64);

impl ObserverId {
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// When an update notifies observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Notify {
    /// Only when the new value differs structurally from the old one.
    #[default]
    IfChanged,
    /// On every update, even when nothing changed.
    Always,
}

/// RAII guard for an observer.
///
/// Dropping the guard removes the observer. [`keep`](Subscription::keep)
/// releases the guard and leaves the observer registered.
#[must_use = "dropping a Subscription removes its observer"]
pub struct Subscription {
    id: ObserverId,
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub(crate) fn new(id: ObserverId, detach: impl FnOnce() + 'static) -> Self {
        Self {
            id,
            detach: Some(Box::new(detach)),
        }
    }

    #[must_use]
    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Leave the observer registered and return its id for manual removal.
    pub fn keep(mut self) -> ObserverId {
        self.detach = None;
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("attached", &self.detach.is_some())
            .finish()
    }
}
