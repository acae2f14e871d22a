//! Errors raised by the server rendering pass.

use sigil_scene::ContextError;

/// Failure while building or embedding a scene.
#[derive(Debug, thiserror::Error)]
pub enum SsrError {
    /// A composable ran outside of the rendering scope.
    #[error(transparent)]
    Compose(#[from] ContextError),
    /// The scene could not be serialized.
    #[error("failed to serialize scene: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The mount id cannot be used as an element id.
    #[error("invalid mount id `{0}`: must be non-empty and free of whitespace and quotes")]
    InvalidMountId(String),
}
