#![forbid(unsafe_code)]

//! nbstate public facade crate.
//!
//! This crate provides the stable surface area for users: the workspace
//! crates under short names plus the types most programs touch.

pub mod prelude {
    pub use nbstate_core as core;
    pub use nbstate_model as model;
    #[cfg(feature = "notebook")]
    pub use nbstate_notebook as notebook;
    pub use nbstate_runtime as runtime;

    pub use nbstate_core::{Deferred, DeferredError, Resolver, deferred, deferred_with_error};
    pub use nbstate_model::{CellFlag, CellId, CellState, NotebookState, Output, Outputs};
    #[cfg(feature = "notebook")]
    pub use nbstate_notebook::{
        AvailableValues, NotebookError, NotebookHandlerConfig, NotebookStateHandler,
    };
    pub use nbstate_runtime::{
        HandlerConfig, Notify, Observable, StateError, StateHandler, StateView, Subscription,
    };
}
