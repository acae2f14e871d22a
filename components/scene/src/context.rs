//! Scoped registry that composables write into during one render pass.
//!
//! A [`CompositionContext`] is made active for the current thread with
//! [`CompositionContext::enter`], which returns a guard. Dropping the guard
//! restores whatever context was active before, so passes can nest and a
//! panic inside a pass never leaves a stale context behind. Worker threads
//! each see their own active context.
//!
//! Group nesting follows the same discipline: [`CompositionContext::with_group`]
//! closes the group it opened even when the body unwinds.

use core::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::{ContextError, NodeDescription, SceneDescription, SceneSettings};

thread_local! {
    static ACTIVE: RefCell<Option<Rc<CompositionContext>>> = const { RefCell::new(None) };
}

#[derive(Debug, Default)]
struct Registry {
    roots: Vec<NodeDescription>,
    groups: Vec<Vec<NodeDescription>>,
    settings: SceneSettings,
}

impl Registry {
    fn target(&mut self) -> &mut Vec<NodeDescription> {
        self.groups.last_mut().unwrap_or(&mut self.roots)
    }
}

/// Collects node descriptions and settings for one render pass.
#[derive(Debug, Default)]
pub struct CompositionContext {
    registry: RefCell<Registry>,
}

impl CompositionContext {
    /// Creates an empty, inactive context.
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Returns the context active on this thread.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::NoActiveContext`] when called outside of a scope.
    pub fn current() -> Result<Rc<Self>, ContextError> {
        Self::current_or_none().ok_or(ContextError::NoActiveContext)
    }

    /// Returns the context active on this thread, if any.
    #[must_use]
    pub fn current_or_none() -> Option<Rc<Self>> {
        ACTIVE.with(|active| active.borrow().clone())
    }

    /// Makes this context the active one until the returned guard is dropped.
    ///
    /// Guards must be dropped in reverse order of creation, which holds for
    /// ordinary lexical scoping.
    #[must_use = "the context is deactivated as soon as the guard is dropped"]
    pub fn enter(self: &Rc<Self>) -> ContextGuard {
        let previous = ACTIVE.with(|active| active.borrow_mut().replace(Rc::clone(self)));
        debug!(nested = previous.is_some(), "entered composition context");
        ContextGuard { previous }
    }

    /// Runs `f` with this context active.
    pub fn scope<R>(self: &Rc<Self>, f: impl FnOnce() -> R) -> R {
        let _guard = self.enter();
        f()
    }

    /// Appends a node to the innermost open group, or to the roots.
    pub fn register_node(&self, node: NodeDescription) {
        let mut registry = self.registry.borrow_mut();
        trace!(tag = node.tag(), depth = registry.groups.len(), "registered node");
        registry.target().push(node);
    }

    /// Routes subsequently registered nodes into `container` until the matching
    /// [`exit_group`](Self::exit_group).
    pub fn enter_group(&self, container: Vec<NodeDescription>) {
        self.registry.borrow_mut().groups.push(container);
    }

    /// Closes the innermost group and returns its children.
    ///
    /// Unlike the node tree, an unmatched exit is tolerated: cleanup code may
    /// call this defensively, so an empty stack yields `None` and changes nothing.
    pub fn exit_group(&self) -> Option<Vec<NodeDescription>> {
        let children = self.registry.borrow_mut().groups.pop();
        if children.is_none() {
            warn!("exit_group called without an open group");
        }
        children
    }

    /// Runs `body` with a fresh group open and returns its result together with
    /// the group's children. The group is closed even if `body` panics.
    pub fn with_group<R>(&self, body: impl FnOnce() -> R) -> (R, Vec<NodeDescription>) {
        self.enter_group(Vec::new());
        let open = OpenGroup {
            context: self,
            closed: false,
        };
        let result = body();
        (result, open.close())
    }

    /// Number of currently open groups.
    #[must_use]
    pub fn group_depth(&self) -> usize {
        self.registry.borrow().groups.len()
    }

    /// Snapshot of the root nodes and settings registered so far.
    ///
    /// Does not consume anything; calling it repeatedly yields equal scenes.
    #[must_use]
    pub fn build_scene(&self) -> SceneDescription {
        let registry = self.registry.borrow();
        SceneDescription::new(registry.roots.clone(), registry.settings)
    }

    /// Replaces the settings with `update(previous)`.
    pub fn configure_settings(&self, update: impl FnOnce(SceneSettings) -> SceneSettings) {
        let previous = self.settings();
        let next = update(previous);
        self.registry.borrow_mut().settings = next;
    }

    /// Current settings.
    #[must_use]
    pub fn settings(&self) -> SceneSettings {
        self.registry.borrow().settings
    }

    /// Resets nodes, settings and the group stack.
    pub fn clear(&self) {
        *self.registry.borrow_mut() = Registry::default();
    }
}

/// Restores the previously active context when dropped.
#[derive(Debug)]
pub struct ContextGuard {
    previous: Option<Rc<CompositionContext>>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        // The thread-local may already be gone during thread teardown.
        let _ = ACTIVE.try_with(|active| *active.borrow_mut() = previous);
    }
}

struct OpenGroup<'a> {
    context: &'a CompositionContext,
    closed: bool,
}

impl OpenGroup<'_> {
    fn close(mut self) -> Vec<NodeDescription> {
        self.closed = true;
        self.context.exit_group().unwrap_or_default()
    }
}

impl Drop for OpenGroup<'_> {
    fn drop(&mut self) {
        if !self.closed {
            self.context.exit_group();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use sigil_color::Color;

    use super::*;
    use crate::{GeometrySpec, LightKind, MaterialSpec};

    fn leaf() -> NodeDescription {
        NodeDescription::mesh(GeometrySpec::fallback(), MaterialSpec::fallback())
    }

    #[test]
    fn current_fails_outside_scope() {
        assert_eq!(
            CompositionContext::current().unwrap_err(),
            ContextError::NoActiveContext
        );
        assert!(CompositionContext::current_or_none().is_none());
    }

    #[test]
    fn nested_scopes_restore_enclosing_context() {
        let outer = CompositionContext::new();
        let inner = CompositionContext::new();

        outer.scope(|| {
            let active = CompositionContext::current().unwrap();
            assert!(Rc::ptr_eq(&active, &outer));

            inner.scope(|| {
                let active = CompositionContext::current().unwrap();
                assert!(Rc::ptr_eq(&active, &inner));
            });

            let active = CompositionContext::current().unwrap();
            assert!(Rc::ptr_eq(&active, &outer));
        });

        assert!(CompositionContext::current_or_none().is_none());
    }

    #[test]
    fn panic_inside_scope_clears_context() {
        let context = CompositionContext::new();
        let result = catch_unwind(AssertUnwindSafe(|| {
            context.scope(|| panic!("composable failed"));
        }));
        assert!(result.is_err());
        assert!(CompositionContext::current_or_none().is_none());
    }

    #[test]
    fn contexts_are_isolated_per_thread() {
        let context = CompositionContext::new();
        let _guard = context.enter();

        let seen_elsewhere = std::thread::spawn(|| CompositionContext::current_or_none().is_some())
            .join()
            .unwrap();

        assert!(!seen_elsewhere);
        assert!(CompositionContext::current_or_none().is_some());
    }

    #[test]
    fn matched_group_pairs_restore_root_target() {
        let context = CompositionContext::new();
        for depth in 0..4 {
            context.enter_group(Vec::new());
            assert_eq!(context.group_depth(), depth + 1);
        }
        context.register_node(leaf());
        for _ in 0..4 {
            assert!(context.exit_group().is_some());
        }
        assert_eq!(context.group_depth(), 0);

        context.register_node(leaf());
        assert_eq!(context.build_scene().nodes, vec![leaf()]);
    }

    #[test]
    fn exit_group_on_empty_stack_is_noop() {
        let context = CompositionContext::new();
        context.register_node(leaf());
        assert!(context.exit_group().is_none());
        assert_eq!(context.build_scene().nodes.len(), 1);
    }

    #[test]
    fn enter_group_appends_to_given_container() {
        let context = CompositionContext::new();
        context.enter_group(vec![leaf()]);
        context.register_node(leaf());
        let children = context.exit_group().unwrap();
        assert_eq!(children.len(), 2);
        assert!(context.build_scene().is_empty());
    }

    #[test]
    fn with_group_closes_on_panic() {
        let context = CompositionContext::new();
        let result = catch_unwind(AssertUnwindSafe(|| {
            context.with_group(|| {
                context.register_node(leaf());
                panic!("group body failed");
            })
        }));
        assert!(result.is_err());
        assert_eq!(context.group_depth(), 0);
    }

    #[test]
    fn settings_are_last_write_wins() {
        let context = CompositionContext::new();
        context.configure_settings(|s| s.with_background(Color::BLACK));
        context.configure_settings(|s| s.with_shadows(true));
        context.configure_settings(|s| s.with_background(Color::WHITE));

        let settings = context.build_scene().settings;
        assert_eq!(settings.background, Some(Color::WHITE));
        assert!(settings.shadows);
    }

    #[test]
    fn clear_resets_everything() {
        let context = CompositionContext::new();
        context.register_node(NodeDescription::light(LightKind::Point, Color::WHITE, 1.0));
        context.configure_settings(|s| s.with_shadows(true));
        context.enter_group(Vec::new());

        context.clear();

        assert_eq!(context.build_scene(), SceneDescription::default());
        assert_eq!(context.group_depth(), 0);
    }
}
