#![forbid(unsafe_code)]

//! Core: structural equality, pure collection helpers, and deferred results.
//!
//! Everything in this crate is free of shared state except [`deferred`],
//! which bridges a state-driven signal back to an awaiting caller.

pub mod collections;
pub mod deferred;
pub mod equality;
pub mod error;

pub use deferred::{Deferred, DeferredError, Resolver, deferred, deferred_with_error};
pub use error::{CoreError, Result};
