//! Rebuilding server rendered scenes on the client.

use core::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tracing::{debug, error, info, warn};

use sigil_core::{
    EngineFactory, FrameScheduler, NodeTree, RenderLoop, Renderer, spawn_scene,
};

use crate::{
    HydrationConfig, HydrationError, HydrationGuard, HydrationState, MarkerStore, PayloadSource,
    payload::load_scene,
};

/// Per call hydration options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HydrateOptions {
    /// Tear down whatever exists for the mount, clear the marker and rebuild.
    pub force_reinitialize: bool,
}

impl HydrateOptions {
    /// Options forcing a fresh rebuild.
    #[must_use]
    pub const fn force() -> Self {
        Self {
            force_reinitialize: true,
        }
    }
}

/// What a hydrate call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrateOutcome {
    /// The scene was rebuilt from the payload.
    Rebuilt,
    /// The mount was already hydrated by this hydrator.
    AlreadyHydrated,
    /// The persisted marker was present; state adopted without rebuilding.
    Resynchronized,
    /// A rebuild for the mount is running.
    InProgress,
    /// The mount was disposed; pass `force_reinitialize` to revive it.
    Disposed,
}

/// Summary of a torn down mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisposeReport {
    /// Frames rendered before the loop stopped.
    pub frames: u64,
    /// Node wrappers disposed.
    pub nodes: usize,
}

struct LiveScene<F: EngineFactory> {
    tree: NodeTree<F::Engine>,
    renderer: F::Renderer,
}

struct Mount<F: EngineFactory, S: FrameScheduler + 'static> {
    scene: Rc<RefCell<LiveScene<F>>>,
    render_loop: Option<RenderLoop<S>>,
}

/// Hydrates mount points from their embedded payloads.
///
/// Single threaded: every method must be called from the thread that owns
/// the DOM, which is also where frames are delivered.
pub struct Hydrator<F, M, P, S>
where
    F: EngineFactory + 'static,
    S: FrameScheduler + 'static,
{
    factory: F,
    markers: M,
    payloads: P,
    scheduler: S,
    config: HydrationConfig,
    guard: HydrationGuard,
    mounts: HashMap<String, Mount<F, S>>,
    rebuilds: usize,
}

impl<F, M, P, S> core::fmt::Debug for Hydrator<F, M, P, S>
where
    F: EngineFactory + 'static,
    M: core::fmt::Debug,
    S: FrameScheduler + 'static,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hydrator")
            .field("factory", &self.factory)
            .field("markers", &self.markers)
            .field("config", &self.config)
            .field("guard", &self.guard)
            .field("mounts", &self.mounts.keys().collect::<Vec<_>>())
            .field("rebuilds", &self.rebuilds)
            .finish_non_exhaustive()
    }
}

impl<F, M, P, S> Hydrator<F, M, P, S>
where
    F: EngineFactory + 'static,
    M: MarkerStore,
    P: PayloadSource,
    S: FrameScheduler + Clone + 'static,
{
    /// Creates a hydrator.
    pub fn new(factory: F, markers: M, payloads: P, scheduler: S, config: HydrationConfig) -> Self {
        Self {
            factory,
            markers,
            payloads,
            scheduler,
            config,
            guard: HydrationGuard::new(),
            mounts: HashMap::new(),
            rebuilds: 0,
        }
    }

    /// Hydrates `mount_id` once.
    ///
    /// Repeated calls are expected and return an outcome instead of
    /// rebuilding. When the persisted marker says another instance already
    /// hydrated the mount, the state is adopted and nothing is rebuilt.
    ///
    /// # Errors
    ///
    /// Fails when the payload is missing or malformed, the engine cannot be
    /// created, or the scene cannot be built. The mount is left
    /// `NotHydrated` with nothing attached.
    pub fn hydrate(
        &mut self,
        mount_id: &str,
        options: HydrateOptions,
    ) -> Result<HydrateOutcome, HydrationError> {
        if options.force_reinitialize {
            debug!(mount = mount_id, "forcing reinitialization");
            self.teardown(mount_id);
            self.markers.clear(mount_id);
            self.guard.reset(mount_id);
        } else {
            match self.guard.state(mount_id) {
                HydrationState::Hydrated => return Ok(HydrateOutcome::AlreadyHydrated),
                HydrationState::Hydrating => return Ok(HydrateOutcome::InProgress),
                HydrationState::Disposed => {
                    info!(mount = mount_id, "mount was disposed, not hydrating");
                    return Ok(HydrateOutcome::Disposed);
                }
                HydrationState::NotHydrated => {
                    if self.markers.is_marked(mount_id) {
                        warn!(mount = mount_id, "hydration marker present, resynchronizing");
                        self.guard.resynchronize(mount_id);
                        return Ok(HydrateOutcome::Resynchronized);
                    }
                }
            }
        }

        self.guard.begin(mount_id);
        match self.rebuild(mount_id) {
            Ok(mount) => {
                self.mounts.insert(mount_id.to_owned(), mount);
                self.markers.mark(mount_id);
                self.guard.complete(mount_id);
                self.rebuilds += 1;
                info!(mount = mount_id, "hydrated");
                Ok(HydrateOutcome::Rebuilt)
            }
            Err(err) => {
                error!(mount = mount_id, error = %err, "hydration failed");
                self.guard.fail(mount_id);
                Err(err)
            }
        }
    }

    /// Tears down `mount_id` and moves it to `Disposed`.
    ///
    /// Order: render loop stopped, node tree disposed, renderer disposed,
    /// marker removed. Returns `None` and changes nothing for a mount that
    /// was never hydrated.
    pub fn dispose_hydrator(&mut self, mount_id: &str) -> Option<DisposeReport> {
        let state = self.guard.state(mount_id);
        let marked = self.markers.is_marked(mount_id);
        if state == HydrationState::NotHydrated && !marked && !self.mounts.contains_key(mount_id) {
            debug!(mount = mount_id, "dispose on a mount that was never hydrated");
            return None;
        }

        let report = self.teardown(mount_id).unwrap_or(DisposeReport {
            frames: 0,
            nodes: 0,
        });
        self.markers.clear(mount_id);
        self.guard.dispose(mount_id);
        info!(mount = mount_id, nodes = report.nodes, "disposed");
        Some(report)
    }

    /// Returns `true` only for a mount in the `Hydrated` state.
    #[must_use]
    pub fn is_hydrated(&self, mount_id: &str) -> bool {
        self.guard.is_hydrated(mount_id)
    }

    /// Current state of `mount_id`.
    #[must_use]
    pub fn state(&self, mount_id: &str) -> HydrationState {
        self.guard.state(mount_id)
    }

    /// Completed rebuilds across all mounts.
    #[must_use]
    pub const fn rebuilds(&self) -> usize {
        self.rebuilds
    }

    /// Runs `f` with the live tree of `mount_id`.
    ///
    /// Returns `None` if this hydrator holds no scene for the mount, which is
    /// also the case after a resynchronization.
    pub fn with_scene<R>(
        &self,
        mount_id: &str,
        f: impl FnOnce(&NodeTree<F::Engine>) -> R,
    ) -> Option<R> {
        let mount = self.mounts.get(mount_id)?;
        let scene = mount.scene.try_borrow().ok()?;
        Some(f(&scene.tree))
    }

    /// Renders one frame of `mount_id` outside of the render loop.
    ///
    /// Returns `false` if there is no live scene for the mount.
    pub fn render_now(&self, mount_id: &str) -> bool {
        let Some(mount) = self.mounts.get(mount_id) else {
            return false;
        };
        render_frame(&mount.scene);
        true
    }

    /// Frames rendered by the loop of `mount_id`.
    #[must_use]
    pub fn frames(&self, mount_id: &str) -> Option<u64> {
        self.mounts
            .get(mount_id)?
            .render_loop
            .as_ref()
            .map(RenderLoop::frames)
    }

    /// The marker store.
    #[must_use]
    pub const fn markers(&self) -> &M {
        &self.markers
    }

    /// Mutable access to the marker store.
    pub const fn markers_mut(&mut self) -> &mut M {
        &mut self.markers
    }

    /// Mutable access to the payload source.
    pub const fn payloads_mut(&mut self) -> &mut P {
        &mut self.payloads
    }

    /// The engine factory.
    #[must_use]
    pub const fn factory(&self) -> &F {
        &self.factory
    }

    fn rebuild(&mut self, mount_id: &str) -> Result<Mount<F, S>, HydrationError> {
        let scene = load_scene(&self.payloads, mount_id)?;

        let (engine, mut renderer) =
            self.factory
                .create(mount_id)
                .map_err(|source| HydrationError::EngineInit {
                    mount: mount_id.to_owned(),
                    source: Box::new(source),
                })?;
        if let Some(viewport) = self.config.viewport {
            renderer.resize(viewport.width, viewport.height);
        }

        let mut tree = NodeTree::new(engine);
        if let Err(source) = spawn_scene(&mut tree, &scene) {
            renderer.dispose();
            return Err(HydrationError::Rebuild {
                mount: mount_id.to_owned(),
                source: Box::new(source),
            });
        }
        debug!(
            mount = mount_id,
            nodes = tree.live_count() - 1,
            "rebuilt scene graph"
        );

        let scene = Rc::new(RefCell::new(LiveScene { tree, renderer }));
        let render_loop = self.config.start_render_loop.then(|| {
            let weak = Rc::downgrade(&scene);
            RenderLoop::started(self.scheduler.clone(), move |_| {
                if let Some(scene) = Weak::upgrade(&weak) {
                    render_frame(&scene);
                }
            })
        });
        Ok(Mount { scene, render_loop })
    }

    fn teardown(&mut self, mount_id: &str) -> Option<DisposeReport> {
        let mut mount = self.mounts.remove(mount_id)?;

        let frames = mount.render_loop.as_ref().map_or(0, RenderLoop::frames);
        if let Some(render_loop) = mount.render_loop.take() {
            render_loop.stop();
        }

        let mut scene = mount.scene.borrow_mut();
        let nodes = scene.tree.dispose_all();
        scene.renderer.dispose();
        debug!(mount = mount_id, frames, nodes, "torn down");
        Some(DisposeReport { frames, nodes })
    }
}

fn render_frame<F: EngineFactory>(scene: &RefCell<LiveScene<F>>) {
    let Ok(mut scene) = scene.try_borrow_mut() else {
        return;
    };
    let LiveScene { tree, renderer } = &mut *scene;
    renderer.render(tree.engine());
}
