//! Reconciliation of composition edits onto the node tree.
//!
//! A declarative runtime walks its output tree with `down`/`up` and reports
//! structural edits relative to the node it is currently positioned at. The
//! [`SceneApplier`] turns those edits into [`NodeTree`] operations, which in
//! turn keep the engine graph in sync.

use tracing::{debug, trace};

use crate::{Materia, NodeId, NodeTree, TreeError};

/// Receiver of structural edits from a declarative composition runtime.
///
/// Edits always target the node the traversal is positioned at
/// ([`current`](Self::current)). Indices refer to that node's children.
pub trait Applier {
    /// Node handle used by the runtime.
    type Node: Copy;
    /// Error returned for invalid edits.
    type Error;

    /// Node the traversal is positioned at.
    fn current(&self) -> Self::Node;

    /// Descends into `node`, which must be a child the runtime just visited.
    ///
    /// # Errors
    ///
    /// Fails when `node` cannot be edited.
    fn down(&mut self, node: Self::Node) -> Result<(), Self::Error>;

    /// Returns to the previous node.
    ///
    /// # Errors
    ///
    /// Fails when already at the root.
    fn up(&mut self) -> Result<(), Self::Error>;

    /// Reports `instance` at `index` while the tree is built parent first.
    ///
    /// # Errors
    ///
    /// Fails for an invalid instance.
    fn insert_top_down(&mut self, index: usize, instance: Self::Node) -> Result<(), Self::Error>;

    /// Reports `instance` at `index` while the tree is built children first.
    ///
    /// # Errors
    ///
    /// Fails for an invalid position or instance.
    fn insert_bottom_up(&mut self, index: usize, instance: Self::Node) -> Result<(), Self::Error>;

    /// Removes `count` children starting at `index`.
    ///
    /// # Errors
    ///
    /// Fails when the run does not fit.
    fn remove(&mut self, index: usize, count: usize) -> Result<(), Self::Error>;

    /// Moves `count` children from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Fails when the run or destination is invalid.
    fn move_nodes(&mut self, from: usize, to: usize, count: usize) -> Result<(), Self::Error>;

    /// Discards all previous output.
    fn clear(&mut self);

    /// Called before a batch of edits.
    fn on_begin_changes(&mut self) {}

    /// Called after a batch of edits.
    fn on_end_changes(&mut self) {}
}

/// [`Applier`] driving a [`NodeTree`].
///
/// Children are attached on [`insert_bottom_up`](Applier::insert_bottom_up), so
/// a subtree is fully assembled before it joins the live graph. The top-down
/// call only validates its argument.
#[derive(Debug)]
pub struct SceneApplier<E: Materia> {
    tree: NodeTree<E>,
    stack: Vec<NodeId>,
    batches: u64,
}

impl<E: Materia> SceneApplier<E> {
    /// Creates an applier positioned at the root of `tree`.
    pub fn new(tree: NodeTree<E>) -> Self {
        let root = tree.root();
        Self {
            tree,
            stack: vec![root],
            batches: 0,
        }
    }

    /// Creates an applier over a fresh tree for `engine`.
    pub fn with_engine(engine: E) -> Self {
        Self::new(NodeTree::new(engine))
    }

    /// The underlying tree.
    #[must_use]
    pub const fn tree(&self) -> &NodeTree<E> {
        &self.tree
    }

    /// Mutable access to the tree, used to create nodes before inserting them.
    pub const fn tree_mut(&mut self) -> &mut NodeTree<E> {
        &mut self.tree
    }

    /// Gives back the tree.
    pub fn into_tree(self) -> NodeTree<E> {
        self.tree
    }

    /// Traversal depth; zero at the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    /// Number of completed change batches.
    #[must_use]
    pub const fn batches(&self) -> u64 {
        self.batches
    }

    fn position(&self) -> NodeId {
        self.stack.last().copied().unwrap_or_else(|| self.tree.root())
    }
}

impl<E: Materia> Applier for SceneApplier<E> {
    type Node = NodeId;
    type Error = TreeError;

    fn current(&self) -> NodeId {
        self.position()
    }

    fn down(&mut self, node: NodeId) -> Result<(), TreeError> {
        if !self.tree.contains(node) {
            return Err(if self.tree.is_disposed(node) {
                TreeError::Disposed(node)
            } else {
                TreeError::UnknownNode(node)
            });
        }
        self.stack.push(node);
        trace!(?node, depth = self.depth(), "down");
        Ok(())
    }

    fn up(&mut self) -> Result<(), TreeError> {
        if self.stack.len() <= 1 {
            return Err(TreeError::UnbalancedUp);
        }
        self.stack.pop();
        trace!(depth = self.depth(), "up");
        Ok(())
    }

    fn insert_top_down(&mut self, _index: usize, instance: NodeId) -> Result<(), TreeError> {
        if self.tree.contains(instance) {
            Ok(())
        } else if self.tree.is_disposed(instance) {
            Err(TreeError::Disposed(instance))
        } else {
            Err(TreeError::UnknownNode(instance))
        }
    }

    fn insert_bottom_up(&mut self, index: usize, instance: NodeId) -> Result<(), TreeError> {
        let parent = self.position();
        self.tree.insert(parent, index, instance)
    }

    fn remove(&mut self, index: usize, count: usize) -> Result<(), TreeError> {
        let parent = self.position();
        self.tree.remove(parent, index, count).map(drop)
    }

    fn move_nodes(&mut self, from: usize, to: usize, count: usize) -> Result<(), TreeError> {
        let parent = self.position();
        self.tree.move_children(parent, from, to, count)
    }

    fn clear(&mut self) {
        let disposed = self.tree.dispose_all();
        self.stack.truncate(1);
        debug!(disposed, "cleared composition output");
    }

    fn on_begin_changes(&mut self) {
        trace!(batch = self.batches, "begin changes");
    }

    fn on_end_changes(&mut self) {
        self.tree.sweep_detached();
        self.batches += 1;
        debug_assert_eq!(self.tree.verify(), Ok(()), "engine graph diverged");
        trace!(batch = self.batches, "end changes");
    }
}
