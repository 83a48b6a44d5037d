#![forbid(unsafe_code)]

//! Runtime: observable state containers and derived views.
//!
//! A [`StateHandler`] owns one immutable snapshot of a value and replaces it
//! on every update. Observers registered on the handler, and on any
//! [`StateView`] derived from it, are told about structural changes only.

pub mod config;
pub mod error;
pub mod reactive;

pub use config::HandlerConfig;
pub use error::{Result, StateError};
pub use reactive::{
    Notify, Observable, ObserverId, StateHandler, StateView, Subscription, ViewKind,
    WeakStateHandler,
};
