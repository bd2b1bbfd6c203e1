//! Contains the [`Config`] that bounds the work done by the engine.

use serde::{Deserialize, Serialize};

use crate::{constexpr::ConstexprContext, scope::Scope};

/// The number of steps a single top-level constant evaluation may perform.
pub const DEFAULT_STEP_LIMIT: usize = 1024;

/// How deep instantiation recurses into a tree before it gives up and leaves
/// the rest of the tree as is.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// The budgets of the engine.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_new::new,
)]
#[serde(default)]
pub struct Config {
    /// See [`DEFAULT_STEP_LIMIT`].
    pub step_limit: usize,

    /// See [`DEFAULT_MAX_DEPTH`].
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { step_limit: DEFAULT_STEP_LIMIT, max_depth: DEFAULT_MAX_DEPTH }
    }
}

impl Config {
    /// Creates a fresh constant evaluation context with this step limit.
    #[must_use]
    pub fn context<'a>(&self, scope: &'a dyn Scope) -> ConstexprContext<'a> {
        ConstexprContext::with_limit(scope, self.step_limit)
    }
}
