#![forbid(unsafe_code)]

//! Notebook handler configuration.

use std::env;

use nbstate_runtime::HandlerConfig;

/// Environment variable enabling [`NotebookHandlerConfig::trace_changes`].
pub const ENV_TRACE_CHANGES: &str = "NBSTATE_TRACE_CHANGES";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotebookHandlerConfig {
    /// Settings for the underlying state handler. When no label is set the
    /// notebook's file name is used.
    pub handler: HandlerConfig,
    /// Log the top-level fields that changed on every update, at `debug`.
    pub trace_changes: bool,
}

impl NotebookHandlerConfig {
    /// Defaults with environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let trace_changes = lookup(ENV_TRACE_CHANGES)
            .is_some_and(|val| matches!(val.trim(), "1" | "true" | "TRUE" | "True"));
        Self {
            handler: HandlerConfig::from_lookup(lookup),
            trace_changes,
        }
    }

    #[must_use]
    pub fn with_handler(mut self, handler: HandlerConfig) -> Self {
        self.handler = handler;
        self
    }

    #[must_use]
    pub fn with_change_tracing(mut self, enabled: bool) -> Self {
        self.trace_changes = enabled;
        self
    }
}
