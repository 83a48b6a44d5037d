#![forbid(unsafe_code)]

//! Read-only derived state.

use std::fmt;
use std::rc::Rc;

use super::node::Node;

/// How a view derives its value from its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// A field of the parent value; emits when that field changes.
    Field,
    /// A pure function of (a part of) the parent value; emits when the
    /// result changes.
    Mapped,
}

/// A read-only container whose value follows a parent handler or view.
///
/// Cloning a `StateView` creates a new handle to the **same** view.
/// Disposing any clone disposes the view and detaches it from its parent.
pub struct StateView<S> {
    pub(crate) node: Rc<Node<S>>,
    kind: ViewKind,
}

impl<S> Clone for StateView<S> {
    fn clone(&self) -> Self {
        Self {
            node: Rc::clone(&self.node),
            kind: self.kind,
        }
    }
}

impl<S: 'static> StateView<S> {
    pub(crate) fn from_node(node: Rc<Node<S>>, kind: ViewKind) -> Self {
        Self { node, kind }
    }

    #[must_use]
    pub fn kind(&self) -> ViewKind {
        self.kind
    }
}

impl<S: fmt::Debug + 'static> fmt::Debug for StateView<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateView")
            .field("id", &self.node.id())
            .field("kind", &self.kind)
            .field("state", &*self.node.state())
            .field("observers", &self.node.observer_count())
            .field("disposed", &self.node.is_disposed())
            .finish()
    }
}
