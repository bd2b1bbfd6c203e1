//! Receivers of the diagnostics reported while evaluating an expression.

use parking_lot::{RwLock, RwLockReadGuard};

use crate::{Diagnostic, Severity};

/// Receives the diagnostics the engine reports.
pub trait Handler<T>: Send + Sync {
    /// Receives a diagnostic and handles it.
    fn receive(&self, diagnostic: T);
}

/// Collects the diagnostics of an evaluation in the order they were reported.
///
/// The front end decides its exit status from [`Storage::has_errors`].
#[derive(Debug, Default)]
pub struct Storage {
    diagnostics: RwLock<Vec<Diagnostic>>,
}

impl Storage {
    /// Creates a new empty [`Storage`].
    #[must_use]
    pub const fn new() -> Self {
        Self { diagnostics: RwLock::new(Vec::new()) }
    }

    /// Returns the diagnostics received so far.
    pub fn diagnostics(&self) -> RwLockReadGuard<'_, Vec<Diagnostic>> {
        self.diagnostics.read()
    }

    /// Returns the number of diagnostics received with the given severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .read()
            .iter()
            .filter(|diagnostic| diagnostic.severity == severity)
            .count()
    }

    /// Returns `true` if a [`Severity::Error`] diagnostic was received.
    #[must_use]
    pub fn has_errors(&self) -> bool { self.count(Severity::Error) != 0 }

    /// Consumes the [`Storage`] and returns the diagnostics in the order they
    /// were received.
    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> { self.diagnostics.into_inner() }
}

impl Handler<Diagnostic> for Storage {
    fn receive(&self, diagnostic: Diagnostic) {
        self.diagnostics.write().push(diagnostic);
    }
}

/// Discards every diagnostic, for callers that only want the answers of the
/// queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Dummy;

impl<T> Handler<T> for Dummy {
    fn receive(&self, _: T) {}
}
