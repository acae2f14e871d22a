//! Error types for structural edits on the node tree.

use crate::NodeId;

/// Contract violations reported by [`NodeTree`](crate::NodeTree) and
/// [`SceneApplier`](crate::SceneApplier).
///
/// These are programming errors on the caller side. They are returned as soon
/// as they are detected and the tree is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// Insert position past the end of the child list.
    #[error("insert index {index} out of bounds for {len} children")]
    IndexOutOfBounds {
        /// Requested index.
        index: usize,
        /// Number of children.
        len: usize,
    },
    /// Child run that does not fit inside the child list.
    #[error("range {start}..{start}+{count} out of bounds for {len} children")]
    RangeOutOfBounds {
        /// First index of the run.
        start: usize,
        /// Length of the run.
        count: usize,
        /// Number of children.
        len: usize,
    },
    /// Move whose source or destination is invalid.
    #[error("cannot move {count} children from {from} to {to} with {len} children")]
    MoveOutOfBounds {
        /// First index of the moved run.
        from: usize,
        /// Destination, as an index into the list before the move.
        to: usize,
        /// Length of the run.
        count: usize,
        /// Number of children.
        len: usize,
    },
    /// The node was disposed and can no longer be edited.
    #[error("node {0:?} has been disposed")]
    Disposed(NodeId),
    /// The id does not belong to this tree.
    #[error("node {0:?} does not exist")]
    UnknownNode(NodeId),
    /// Inserting would make a node its own ancestor.
    #[error("inserting {child:?} under {parent:?} would create a cycle")]
    Cycle {
        /// Intended parent.
        parent: NodeId,
        /// Node being inserted.
        child: NodeId,
    },
    /// The root can neither be inserted, removed nor disposed.
    #[error("the root node cannot be reparented or disposed")]
    RootProtected,
    /// `up` was called while the traversal already sits at the root.
    #[error("up() called at the root of the traversal")]
    UnbalancedUp,
    /// The engine graph no longer mirrors the wrapper graph below this node.
    #[error("engine graph diverged from the wrapper graph at {0:?}")]
    Diverged(NodeId),
}

/// Failure while turning a scene description into live nodes.
#[derive(Debug, thiserror::Error)]
pub enum SpawnError<E: std::error::Error + 'static> {
    /// The engine refused to create an object.
    #[error("engine failed to create an object")]
    Engine(#[source] E),
    /// A structural edit failed.
    #[error(transparent)]
    Tree(#[from] TreeError),
}
