#![forbid(unsafe_code)]

//! Handler configuration.
//!
//! Defaults suit interactive use. Environment variables override the
//! defaults when a handler is built with [`HandlerConfig::from_env`]:
//!
//! | variable | field |
//! |---|---|
//! | `NBSTATE_MAX_NOTIFY_DEPTH` | [`HandlerConfig::max_notify_depth`] |
//! | `NBSTATE_ISOLATE_OBSERVER_PANICS` | [`HandlerConfig::isolate_observer_panics`] |

use std::env;

/// Environment variable overriding [`HandlerConfig::max_notify_depth`].
pub const ENV_MAX_NOTIFY_DEPTH: &str = "NBSTATE_MAX_NOTIFY_DEPTH";
/// Environment variable overriding [`HandlerConfig::isolate_observer_panics`].
pub const ENV_ISOLATE_OBSERVER_PANICS: &str = "NBSTATE_ISOLATE_OBSERVER_PANICS";

const DEFAULT_MAX_NOTIFY_DEPTH: usize = 32;

/// Behaviour shared by a handler and every view derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfig {
    /// Name attached to log events for this handler.
    pub label: Option<String>,
    /// How many notification rounds may be nested inside each other before
    /// further updates are rejected. Always at least 1.
    pub max_notify_depth: usize,
    /// Catch observer panics and keep notifying the remaining observers.
    pub isolate_observer_panics: bool,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            label: None,
            max_notify_depth: DEFAULT_MAX_NOTIFY_DEPTH,
            isolate_observer_panics: true,
        }
    }
}

impl HandlerConfig {
    /// Defaults with environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults with overrides read through `lookup`.
    ///
    /// Unparseable values are ignored.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(val) = lookup(ENV_MAX_NOTIFY_DEPTH)
            && let Ok(n) = val.trim().parse::<usize>()
        {
            config = config.with_max_notify_depth(n);
        }
        if let Some(val) = lookup(ENV_ISOLATE_OBSERVER_PANICS) {
            let val = val.trim();
            if val == "1" || val.eq_ignore_ascii_case("true") {
                config.isolate_observer_panics = true;
            } else if val == "0" || val.eq_ignore_ascii_case("false") {
                config.isolate_observer_panics = false;
            }
        }
        config
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_max_notify_depth(mut self, depth: usize) -> Self {
        self.max_notify_depth = depth.max(1);
        self
    }

    #[must_use]
    pub fn with_observer_panic_isolation(mut self, isolate: bool) -> Self {
        self.isolate_observer_panics = isolate;
        self
    }

    pub(crate) fn label_str(&self) -> &str {
        self.label.as_deref().unwrap_or("")
    }
}
