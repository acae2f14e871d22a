//! The node wrapper tree.
//!
//! Every retained engine object Sigil creates is wrapped by exactly one entry of
//! a [`NodeTree`]. Entries live in an arena and are addressed by [`NodeId`]; a
//! child keeps a non-owning id of its parent. The tree owns the engine value,
//! so every attach and detach goes through here and the engine graph always
//! mirrors the wrapper graph.
//!
//! Slots of disposed wrappers are reused by later creations. A [`NodeId`]
//! carries the generation of its slot, so an id kept past disposal keeps
//! reporting the node as disposed instead of aliasing the newcomer.

use tracing::{debug, trace};

use sigil_scene::{CameraSpec, Color, GeometrySpec, LightKind, MaterialSpec, SceneSettings, Transform};

use crate::{
    Materia, TreeError,
    disposable::{DisposableSet, ReleaseLedger},
};

/// Identifier of a wrapper stored inside a [`NodeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl NodeId {
    /// Creates a [`NodeId`] for the first generation of an arena slot.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self::with_generation(index, 0)
    }

    /// Creates a [`NodeId`] for a given slot generation.
    #[must_use]
    pub const fn with_generation(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns the raw arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }

    /// Returns how many times the slot was reused before this id was issued.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug)]
struct NodeEntry<E: Materia> {
    generation: u32,
    object: E::Object,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    // Resources owned by this node's own object.
    resources: Vec<E::Resource>,
    // Resources of attached children, released in bulk on disposal.
    tracked: DisposableSet<E::Resource>,
    disposed: bool,
}

impl<E: Materia> NodeEntry<E> {
    const fn new(generation: u32, object: E::Object, resources: Vec<E::Resource>) -> Self {
        Self {
            generation,
            object,
            parent: None,
            children: Vec::new(),
            resources,
            tracked: DisposableSet::new(),
            disposed: false,
        }
    }
}

/// Arena of node wrappers over a [`Materia`] scene graph.
#[derive(Debug)]
pub struct NodeTree<E: Materia> {
    engine: E,
    nodes: Vec<NodeEntry<E>>,
    root: NodeId,
    // Disposed slots ready for reuse.
    free: Vec<usize>,
    // Wrappers that lost or never had a parent since the last sweep.
    orphans: Vec<NodeId>,
    live: usize,
    ledger: ReleaseLedger<E::Resource>,
}

impl<E: Materia> NodeTree<E> {
    /// Creates a tree whose root wraps the engine's scene root.
    pub fn new(engine: E) -> Self {
        let root = NodeEntry::new(0, engine.scene_root(), Vec::new());
        Self {
            engine,
            nodes: vec![root],
            root: NodeId::new(0),
            free: Vec::new(),
            orphans: Vec::new(),
            live: 1,
            ledger: ReleaseLedger::default(),
        }
    }

    /// The root wrapper.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Read access to the engine, for rendering.
    #[must_use]
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// Gives the engine back. Live objects stay alive inside it.
    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Wraps an object produced by `create`. The new node is detached.
    ///
    /// The slot of a disposed wrapper is reused when one is available.
    ///
    /// # Errors
    ///
    /// Propagates the engine error returned by `create`.
    pub fn create_with(
        &mut self,
        create: impl FnOnce(&mut E) -> Result<E::Object, E::Error>,
    ) -> Result<NodeId, E::Error> {
        let object = create(&mut self.engine)?;
        let resources = self.engine.resources(object);
        // The engine may hand out a released handle again.
        for resource in &resources {
            self.ledger.forget(resource);
        }

        let id = if let Some(index) = self.free.pop() {
            let previous = &self.nodes[index];
            for resource in &previous.resources {
                self.ledger.forget(resource);
            }
            let generation = previous.generation.wrapping_add(1);
            self.nodes[index] = NodeEntry::new(generation, object, resources);
            NodeId::with_generation(index, generation)
        } else {
            self.nodes.push(NodeEntry::new(0, object, resources));
            NodeId::new(self.nodes.len() - 1)
        };
        self.live += 1;
        self.orphans.push(id);
        trace!(?id, ?object, "created node");
        Ok(id)
    }

    /// Creates a detached group node.
    ///
    /// # Errors
    ///
    /// Returns the engine error if the object cannot be created.
    pub fn create_group(&mut self) -> Result<NodeId, E::Error> {
        self.create_with(E::create_group)
    }

    /// Creates a detached mesh node.
    ///
    /// # Errors
    ///
    /// Returns the engine error if the object cannot be created.
    pub fn create_mesh(
        &mut self,
        geometry: &GeometrySpec,
        material: &MaterialSpec,
    ) -> Result<NodeId, E::Error> {
        self.create_with(|engine| engine.create_mesh(geometry, material))
    }

    /// Creates a detached light node.
    ///
    /// # Errors
    ///
    /// Returns the engine error if the object cannot be created.
    pub fn create_light(
        &mut self,
        kind: LightKind,
        color: Color,
        intensity: f32,
    ) -> Result<NodeId, E::Error> {
        self.create_with(|engine| engine.create_light(kind, color, intensity))
    }

    /// Creates a detached camera node.
    ///
    /// # Errors
    ///
    /// Returns the engine error if the object cannot be created.
    pub fn create_camera(&mut self, spec: &CameraSpec) -> Result<NodeId, E::Error> {
        self.create_with(|engine| engine.create_camera(spec))
    }

    /// Inserts `child` into `parent`'s children at `index`.
    ///
    /// A child that already has a parent is detached from it first. Its
    /// engine object is attached under the parent's and its resources become
    /// tracked by the parent.
    ///
    /// # Errors
    ///
    /// - [`TreeError::IndexOutOfBounds`] if `index > child_count(parent)`.
    /// - [`TreeError::RootProtected`] if `child` is the root.
    /// - [`TreeError::Cycle`] if `child` is `parent` or one of its ancestors.
    /// - [`TreeError::UnknownNode`] / [`TreeError::Disposed`] for invalid ids.
    pub fn insert(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<(), TreeError> {
        if child == self.root {
            return Err(TreeError::RootProtected);
        }
        let len = self.live(parent)?.children.len();
        self.live(child)?;
        if index > len {
            return Err(TreeError::IndexOutOfBounds { index, len });
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(TreeError::Cycle { parent, child });
        }

        let mut index = index;
        if let Some(previous) = self.nodes[child.index].parent {
            if previous == parent {
                // Detaching shifts later siblings one slot to the left.
                let position = self.nodes[parent.index]
                    .children
                    .iter()
                    .position(|&id| id == child);
                if position.is_some_and(|position| position < index) {
                    index -= 1;
                }
            }
            debug!(?previous, ?child, "detaching before reinsert");
            self.detach(previous, child);
        }

        self.attach(parent, index, child);
        debug!(?parent, ?child, index, "inserted node");
        Ok(())
    }

    /// Detaches `count` children of `parent` starting at `index` and returns them.
    ///
    /// Removed nodes are not disposed; they may be inserted elsewhere.
    /// Anything still detached at the end of a change set is reclaimed by
    /// [`sweep_detached`](Self::sweep_detached).
    ///
    /// # Errors
    ///
    /// [`TreeError::RangeOutOfBounds`] if the run does not fit, or an invalid
    /// `parent`.
    pub fn remove(
        &mut self,
        parent: NodeId,
        index: usize,
        count: usize,
    ) -> Result<Vec<NodeId>, TreeError> {
        let len = self.live(parent)?.children.len();
        if index.checked_add(count).is_none_or(|end| end > len) {
            return Err(TreeError::RangeOutOfBounds {
                start: index,
                count,
                len,
            });
        }

        let removed = self.nodes[parent.index].children[index..index + count].to_vec();
        for &child in &removed {
            self.detach(parent, child);
        }
        self.orphans.extend_from_slice(&removed);
        debug!(?parent, index, count, "removed nodes");
        Ok(removed)
    }

    /// Moves the run `from..from + count` of `parent`'s children.
    ///
    /// `to` is an index into the child list before the move. When moving
    /// forward the run ends up at `to - count`. Only wrapper order changes; the
    /// engine's draw order is left as is.
    ///
    /// # Errors
    ///
    /// [`TreeError::MoveOutOfBounds`] if the run does not fit, `to` is past
    /// the end, or `to` falls strictly inside the run.
    pub fn move_children(
        &mut self,
        parent: NodeId,
        from: usize,
        to: usize,
        count: usize,
    ) -> Result<(), TreeError> {
        let len = self.live(parent)?.children.len();
        let out_of_bounds = TreeError::MoveOutOfBounds {
            from,
            to,
            count,
            len,
        };
        let Some(end) = from.checked_add(count) else {
            return Err(out_of_bounds);
        };
        if end > len || to > len || (to > from && to < end) {
            return Err(out_of_bounds);
        }
        if from == to || count == 0 {
            return Ok(());
        }

        let destination = if from > to { to } else { to - count };
        let children = &mut self.nodes[parent.index].children;
        let run: Vec<NodeId> = children.drain(from..end).collect();
        children.splice(destination..destination, run);
        debug!(?parent, from, to, count, "moved nodes");
        Ok(())
    }

    /// Disposes every child of `parent`, recursively, and empties its child list.
    ///
    /// # Errors
    ///
    /// Fails only for an invalid `parent`.
    pub fn clear(&mut self, parent: NodeId) -> Result<(), TreeError> {
        let children = self.live(parent)?.children.clone();
        for child in children {
            self.dispose_attached(child);
        }
        debug!(?parent, "cleared children");
        Ok(())
    }

    /// Disposes `node` and its subtree, bottom-up, and detaches it from its parent.
    ///
    /// Disposing an already disposed node does nothing, even after its slot
    /// has been reused.
    ///
    /// # Errors
    ///
    /// [`TreeError::RootProtected`] for the root, [`TreeError::UnknownNode`]
    /// for an id that does not belong to this tree.
    pub fn dispose(&mut self, node: NodeId) -> Result<(), TreeError> {
        if node == self.root {
            return Err(TreeError::RootProtected);
        }
        match self.live(node).map(|_| ()) {
            Ok(()) => {
                self.dispose_attached(node);
                Ok(())
            }
            Err(TreeError::Disposed(_)) => Ok(()),
            Err(error) => Err(error),
        }
    }

    /// Disposes every wrapper except the root, attached or not.
    ///
    /// Returns how many wrappers were disposed.
    pub fn dispose_all(&mut self) -> usize {
        let before = self.live;
        let children = self.nodes[self.root.index].children.clone();
        for child in children {
            self.dispose_attached(child);
        }
        self.sweep_detached();
        let disposed = before - self.live;
        debug!(disposed, "disposed node tree");
        disposed
    }

    /// Disposes every live wrapper that has no parent, except the root.
    ///
    /// Only wrappers created or removed since the previous sweep are looked
    /// at, so the cost follows the size of the change set.
    ///
    /// Returns how many wrappers were disposed, descendants included.
    pub fn sweep_detached(&mut self) -> usize {
        let orphans = core::mem::take(&mut self.orphans);
        let before = self.live;
        for orphan in orphans {
            let detached = self
                .live(orphan)
                .is_ok_and(|entry| entry.parent.is_none());
            if detached && orphan != self.root {
                self.dispose_subtree(orphan);
            }
        }
        let swept = before - self.live;
        if swept > 0 {
            debug!(swept, "swept detached nodes");
        }
        swept
    }

    /// Applies a transform; rotation is converted from degrees to radians.
    ///
    /// # Errors
    ///
    /// Fails for an unknown or disposed node.
    pub fn set_transform(&mut self, node: NodeId, transform: &Transform) -> Result<(), TreeError> {
        let object = self.live(node)?.object;
        if let Some(position) = transform.position {
            self.engine.set_position(object, position);
        }
        if let Some(radians) = transform.rotation_radians() {
            self.engine.set_rotation(object, radians);
        }
        if let Some(scale) = transform.scale {
            self.engine.set_scale(object, scale);
        }
        Ok(())
    }

    /// Forwards scene settings to the engine.
    pub fn apply_settings(&mut self, settings: &SceneSettings) {
        self.engine.apply_settings(settings);
    }

    /// Checks that the engine graph mirrors the wrapper graph.
    ///
    /// Every live wrapper must have exactly the engine children its wrapper
    /// children point to, and parent links must agree in both directions.
    ///
    /// # Errors
    ///
    /// [`TreeError::Diverged`] naming the first inconsistent node.
    pub fn verify(&self) -> Result<(), TreeError> {
        for (index, entry) in self.nodes.iter().enumerate() {
            let id = NodeId::with_generation(index, entry.generation);
            if entry.disposed {
                if entry.parent.is_some() || !entry.children.is_empty() {
                    return Err(TreeError::Diverged(id));
                }
                continue;
            }

            let engine_children = self.engine.children(entry.object);
            if engine_children.len() != entry.children.len() {
                return Err(TreeError::Diverged(id));
            }
            for &child in &entry.children {
                let child_entry = self.slot(child).ok_or(TreeError::Diverged(id))?;
                if child_entry.disposed
                    || child_entry.parent != Some(id)
                    || !engine_children.contains(&child_entry.object)
                {
                    return Err(TreeError::Diverged(id));
                }
            }

            if let Some(parent) = entry.parent {
                let linked = self
                    .slot(parent)
                    .is_some_and(|parent| !parent.disposed && parent.children.contains(&id));
                if !linked {
                    return Err(TreeError::Diverged(id));
                }
            }
        }
        Ok(())
    }

    /// Returns `true` if `node` belongs to this tree and is not disposed.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.slot(node).is_some_and(|entry| !entry.disposed)
    }

    /// Returns `true` if `node` belongs to this tree and has been disposed.
    #[must_use]
    pub fn is_disposed(&self, node: NodeId) -> bool {
        matches!(self.live(node), Err(TreeError::Disposed(_)))
    }

    /// Ids of every live wrapper, the root included, in slot order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, entry)| !entry.disposed)
            .map(|(index, entry)| NodeId::with_generation(index, entry.generation))
    }

    /// Number of arena slots, live or awaiting reuse.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Parent of `node`, if attached.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.slot(node).and_then(|entry| entry.parent)
    }

    /// Children of `node` in composition order.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.slot(node)
            .map_or(&[], |entry| entry.children.as_slice())
    }

    /// Number of children of `node`.
    #[must_use]
    pub fn child_count(&self, node: NodeId) -> usize {
        self.children(node).len()
    }

    /// Engine object wrapped by `node`.
    #[must_use]
    pub fn object(&self, node: NodeId) -> Option<E::Object> {
        self.slot(node).map(|entry| entry.object)
    }

    /// Resources owned by `node`'s own object.
    #[must_use]
    pub fn resources(&self, node: NodeId) -> &[E::Resource] {
        self.slot(node)
            .map_or(&[], |entry| entry.resources.as_slice())
    }

    /// Child resources currently tracked by `node`.
    #[must_use]
    pub fn tracked(&self, node: NodeId) -> &[E::Resource] {
        self.slot(node)
            .map_or(&[], |entry| entry.tracked.as_slice())
    }

    /// Returns `true` if `resource` has been released through this tree.
    #[must_use]
    pub fn is_released(&self, resource: &E::Resource) -> bool {
        self.ledger.is_released(resource)
    }

    /// Number of live wrappers, the root included.
    #[must_use]
    pub const fn live_count(&self) -> usize {
        self.live
    }

    /// Every wrapper below `node` in depth-first pre-order, `node` excluded.
    #[must_use]
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    // The entry `node` was issued for, disposed or not.
    fn slot(&self, node: NodeId) -> Option<&NodeEntry<E>> {
        self.nodes
            .get(node.index)
            .filter(|entry| entry.generation == node.generation)
    }

    fn live(&self, node: NodeId) -> Result<&NodeEntry<E>, TreeError> {
        let entry = self
            .nodes
            .get(node.index)
            .ok_or(TreeError::UnknownNode(node))?;
        if node.generation > entry.generation {
            return Err(TreeError::UnknownNode(node));
        }
        if entry.disposed || node.generation < entry.generation {
            return Err(TreeError::Disposed(node));
        }
        Ok(entry)
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.nodes[id.index].parent;
        }
        false
    }

    fn attach(&mut self, parent: NodeId, index: usize, child: NodeId) {
        let child_object = self.nodes[child.index].object;
        let resources = self.nodes[child.index].resources.clone();

        let parent_entry = &mut self.nodes[parent.index];
        parent_entry.children.insert(index, child);
        parent_entry.tracked.track_all(&resources);
        let parent_object = parent_entry.object;

        self.nodes[child.index].parent = Some(parent);
        self.engine.add_child(parent_object, child_object);
    }

    fn detach(&mut self, parent: NodeId, child: NodeId) {
        let child_object = self.nodes[child.index].object;
        let resources = self.nodes[child.index].resources.clone();

        let parent_entry = &mut self.nodes[parent.index];
        parent_entry.children.retain(|&id| id != child);
        parent_entry.tracked.untrack_all(&resources);
        let parent_object = parent_entry.object;

        self.nodes[child.index].parent = None;
        self.engine.remove_child(parent_object, child_object);
    }

    fn dispose_attached(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.index].parent {
            self.detach(parent, node);
        }
        self.dispose_subtree(node);
    }

    // Children first, then tracked and own resources, then the object.
    fn dispose_subtree(&mut self, node: NodeId) {
        let object = self.nodes[node.index].object;
        let children = core::mem::take(&mut self.nodes[node.index].children);
        for child in children {
            let child_object = self.nodes[child.index].object;
            self.engine.remove_child(object, child_object);
            self.nodes[child.index].parent = None;
            self.dispose_subtree(child);
        }

        let entry = &mut self.nodes[node.index];
        let mut pending = entry.tracked.drain();
        pending.extend_from_slice(&entry.resources);
        entry.disposed = true;
        self.live -= 1;
        self.free.push(node.index);

        for resource in pending {
            self.ledger
                .release(resource, |resource| self.engine.release(resource));
        }
        self.engine.dispose(object);
        trace!(?node, ?object, "disposed node");
    }
}
