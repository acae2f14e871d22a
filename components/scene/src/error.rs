use thiserror::Error;

/// Errors raised by the composition registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    /// A composable ran outside of any [`CompositionContext`](crate::CompositionContext) scope.
    #[error("no composition context is active on this thread")]
    NoActiveContext,
}
