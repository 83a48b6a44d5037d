#![forbid(unsafe_code)]

//! The notebook state handler.
//!
//! [`NotebookStateHandler`] wraps a [`StateHandler<NotebookState>`] and adds
//! cell-order queries, mutations that keep the model consistent, and
//! deferred waits on cell status and notebook loading.
//!
//! [`StateHandler<NotebookState>`]: nbstate_runtime::StateHandler
//! [`NotebookState`]: nbstate_model::NotebookState

pub mod config;
pub mod error;
pub mod handler;
mod mutations;
pub mod values;

pub use config::NotebookHandlerConfig;
pub use error::{NotebookError, Result};
pub use handler::NotebookStateHandler;
pub use values::{AvailableValues, PrecedingCells, ValueMap};
