//! Reconciliation of declarative scene composition onto a retained 3D engine.
//!
//! The crate is organised around three pieces:
//!
//! - [`Materia`]: the seam to the external engine that owns the actual scene
//!   graph, together with [`Renderer`] and [`EngineFactory`].
//! - [`NodeTree`]: an arena of node wrappers, one per engine object, that owns
//!   the engine and keeps its graph mirroring the wrapper graph.
//! - [`SceneApplier`]: the [`Applier`] a composition runtime drives with
//!   insert/remove/move/clear edits.
//!
//! [`spawn_scene`] builds a tree from a [`SceneDescription`](sigil_scene::SceneDescription),
//! [`RenderLoop`] drives per-frame rendering and [`HeadlessEngine`] is an
//! in-memory engine for servers and tests.

mod applier;
mod disposable;
mod engine;
mod error;
mod headless;
mod materialize;
mod node;
mod render_loop;

#[cfg(test)]
mod tests;

pub use applier::{Applier, SceneApplier};
pub use disposable::{DisposableSet, ReleaseLedger};
pub use engine::{EngineFactory, Materia, Renderer};
pub use error::{SpawnError, TreeError};
pub use headless::{
    HeadlessEngine, HeadlessError, HeadlessFactory, HeadlessKind, HeadlessObject,
    HeadlessRenderer, HeadlessResource, HeadlessTransform,
};
pub use materialize::{spawn_node, spawn_scene};
pub use node::{NodeId, NodeTree};
pub use render_loop::{FrameScheduler, FrameToken, ManualScheduler, RenderLoop};
