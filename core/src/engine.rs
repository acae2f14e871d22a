//! The seam between Sigil and the retained-mode 3D engine.
//!
//! Sigil never renders anything itself. It drives an engine through
//! [`Materia`]: creating objects, placing them, wiring the parent/child graph
//! and releasing GPU backed resources. A [`Renderer`] then draws whatever graph
//! the engine holds. [`EngineFactory`] produces both for a mount point.

use core::fmt::Debug;
use core::hash::Hash;

use sigil_scene::{CameraSpec, Color, GeometrySpec, LightKind, MaterialSpec, SceneSettings, Vec3};

/// A retained scene graph owned by an external engine.
///
/// Objects and resources are opaque handles. The engine keeps its own
/// parent/child graph; [`NodeTree`](crate::NodeTree) is the only caller allowed
/// to mutate it and keeps it mirroring the wrapper graph.
pub trait Materia: Debug {
    /// Handle to a scene graph object.
    type Object: Copy + Eq + Hash + Debug;
    /// Handle to a disposable resource such as a geometry buffer or material.
    type Resource: Copy + Eq + Hash + Debug;
    /// Error returned when the engine cannot create an object.
    type Error: std::error::Error + Send + Sync + 'static;

    /// The object every root node is attached to.
    fn scene_root(&self) -> Self::Object;

    /// Creates an empty transform node.
    ///
    /// # Errors
    ///
    /// Returns an engine specific error when the object cannot be allocated.
    fn create_group(&mut self) -> Result<Self::Object, Self::Error>;

    /// Creates a mesh. Only built-in geometries and materials are passed here.
    ///
    /// # Errors
    ///
    /// Returns an engine specific error when the object cannot be allocated.
    fn create_mesh(
        &mut self,
        geometry: &GeometrySpec,
        material: &MaterialSpec,
    ) -> Result<Self::Object, Self::Error>;

    /// Creates a light source.
    ///
    /// # Errors
    ///
    /// Returns an engine specific error when the object cannot be allocated.
    fn create_light(
        &mut self,
        kind: LightKind,
        color: Color,
        intensity: f32,
    ) -> Result<Self::Object, Self::Error>;

    /// Creates a perspective camera.
    ///
    /// # Errors
    ///
    /// Returns an engine specific error when the object cannot be allocated.
    fn create_camera(&mut self, spec: &CameraSpec) -> Result<Self::Object, Self::Error>;

    /// Sets the local position.
    fn set_position(&mut self, object: Self::Object, position: Vec3);
    /// Sets the local Euler rotation in radians.
    fn set_rotation(&mut self, object: Self::Object, radians: Vec3);
    /// Sets the local scale.
    fn set_scale(&mut self, object: Self::Object, scale: Vec3);

    /// Attaches `child` under `parent`.
    fn add_child(&mut self, parent: Self::Object, child: Self::Object);
    /// Detaches `child` from `parent`. Detaching a non-child is a no-op.
    fn remove_child(&mut self, parent: Self::Object, child: Self::Object);
    /// Current children of `object` in engine order.
    fn children(&self, object: Self::Object) -> Vec<Self::Object>;

    /// Disposable resources owned by `object`.
    fn resources(&self, object: Self::Object) -> Vec<Self::Resource>;
    /// Frees a resource. Called at most once per resource.
    fn release(&mut self, resource: Self::Resource);
    /// Frees the object itself. Its resources have already been released.
    fn dispose(&mut self, object: Self::Object);

    /// Applies background, fog and shadow settings.
    fn apply_settings(&mut self, settings: &SceneSettings);
}

/// Draws the scene held by an engine.
pub trait Renderer<E: Materia>: Debug {
    /// Resizes the drawing surface.
    fn resize(&mut self, width: u32, height: u32);
    /// Draws one frame.
    fn render(&mut self, engine: &E);
    /// Frees the drawing surface. No frame is rendered afterwards.
    fn dispose(&mut self);
}

/// Creates an engine and its renderer for a mount point.
pub trait EngineFactory: Debug {
    /// Engine type produced.
    type Engine: Materia;
    /// Renderer type produced.
    type Renderer: Renderer<Self::Engine>;
    /// Initialization failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sets up an engine bound to the element identified by `mount_id`.
    ///
    /// # Errors
    ///
    /// Returns an error when the surface or the engine cannot be initialized.
    fn create(&mut self, mount_id: &str) -> Result<(Self::Engine, Self::Renderer), Self::Error>;
}
