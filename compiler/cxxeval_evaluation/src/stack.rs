//! Keeps the recursive walks over deep trees from overflowing the stack.

/// Minimum stack space to keep available while recursing.
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when the red zone is reached.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Runs `f`, growing the stack first if less than the red zone remains.
///
/// Every function that recurses into the children of an
/// [`Evaluation`](crate::Evaluation) goes through here.
#[inline]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
