//! Composable functions for the server rendering pass.
//!
//! Each function writes into the [`CompositionContext`] active on the calling
//! thread. Use [`compose`] to run a scene body inside a fresh context and get
//! the resulting [`SceneDescription`].
//!
//! ```
//! use sigil_color::Color;
//! use sigil_scene::compose::{compose, group, light, mesh};
//! use sigil_scene::{GeometrySpec, LightKind, MaterialSpec};
//!
//! let scene = compose(|| {
//!     light(LightKind::Ambient, Color::new(0x404040), 0.4).emit()?;
//!     group(None, || {
//!         mesh(GeometrySpec::cuboid(1.0, 1.0, 1.0), MaterialSpec::default())
//!             .position([0.0, 1.0, 0.0])
//!             .emit()
//!     })
//! })
//! .unwrap();
//!
//! assert_eq!(scene.nodes.len(), 2);
//! ```

use sigil_color::Color;

use crate::{
    CameraSpec, CompositionContext, ContextError, GeometrySpec, LightKind, MaterialSpec,
    NodeDescription, SceneDescription, SceneSettings, Transform, Vec3,
};

/// Runs `content` in a fresh composition context and returns the built scene.
///
/// # Errors
///
/// Propagates the first error returned by `content`.
pub fn compose(
    content: impl FnOnce() -> Result<(), ContextError>,
) -> Result<SceneDescription, ContextError> {
    let context = CompositionContext::new();
    context.scope(content)?;
    Ok(context.build_scene())
}

/// Registers an already built node description.
///
/// # Errors
///
/// Returns [`ContextError::NoActiveContext`] outside of a composition scope.
pub fn node(node: NodeDescription) -> Result<(), ContextError> {
    CompositionContext::current()?.register_node(node);
    Ok(())
}

/// Starts a mesh; call [`Mesh::emit`] to register it.
#[must_use]
pub fn mesh(geometry: GeometrySpec, material: MaterialSpec) -> Mesh {
    Mesh {
        geometry,
        material,
        transform: Transform::default(),
    }
}

/// Starts a light; call [`Light::emit`] to register it.
#[must_use]
pub fn light(kind: LightKind, color: Color, intensity: f32) -> Light {
    Light {
        kind,
        color,
        intensity,
        transform: Transform::default(),
        cast_shadow: false,
    }
}

/// Registers a camera.
///
/// # Errors
///
/// Returns [`ContextError::NoActiveContext`] outside of a composition scope.
pub fn camera(spec: CameraSpec) -> Result<(), ContextError> {
    node(NodeDescription::Camera(spec))
}

/// Registers a group whose children are the nodes registered by `content`.
///
/// The group is closed even if `content` fails or panics, so the enclosing
/// container is always restored.
///
/// # Errors
///
/// Returns [`ContextError::NoActiveContext`] outside of a composition scope, or
/// the first error returned by `content`.
pub fn group(
    transform: Option<Transform>,
    content: impl FnOnce() -> Result<(), ContextError>,
) -> Result<(), ContextError> {
    let context = CompositionContext::current()?;
    let (result, children) = context.with_group(content);
    result?;
    context.register_node(NodeDescription::group(transform, children));
    Ok(())
}

/// Updates the scene settings of the active context.
///
/// # Errors
///
/// Returns [`ContextError::NoActiveContext`] outside of a composition scope.
pub fn settings(update: impl FnOnce(SceneSettings) -> SceneSettings) -> Result<(), ContextError> {
    CompositionContext::current()?.configure_settings(update);
    Ok(())
}

/// A mesh being described.
#[derive(Debug, Clone)]
#[must_use = "a mesh is only registered by calling `emit`"]
pub struct Mesh {
    geometry: GeometrySpec,
    material: MaterialSpec,
    transform: Transform,
}

impl Mesh {
    /// Sets the position.
    pub const fn position(mut self, position: Vec3) -> Self {
        self.transform.position = Some(position);
        self
    }

    /// Sets the rotation in degrees.
    pub const fn rotation(mut self, degrees: Vec3) -> Self {
        self.transform.rotation = Some(degrees);
        self
    }

    /// Sets the scale.
    pub const fn scale(mut self, scale: Vec3) -> Self {
        self.transform.scale = Some(scale);
        self
    }

    /// Replaces the whole transform.
    pub const fn transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Converts into a node description without registering it.
    #[must_use]
    pub fn into_node(self) -> NodeDescription {
        NodeDescription::Mesh {
            geometry: self.geometry,
            material: self.material,
            transform: (!self.transform.is_empty()).then_some(self.transform),
        }
    }

    /// Registers the mesh with the active context.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::NoActiveContext`] outside of a composition scope.
    pub fn emit(self) -> Result<(), ContextError> {
        node(self.into_node())
    }
}

/// A light being described.
#[derive(Debug, Clone)]
#[must_use = "a light is only registered by calling `emit`"]
pub struct Light {
    kind: LightKind,
    color: Color,
    intensity: f32,
    transform: Transform,
    cast_shadow: bool,
}

impl Light {
    /// Sets the position.
    pub const fn position(mut self, position: Vec3) -> Self {
        self.transform.position = Some(position);
        self
    }

    /// Sets the rotation in degrees.
    pub const fn rotation(mut self, degrees: Vec3) -> Self {
        self.transform.rotation = Some(degrees);
        self
    }

    /// Enables shadow casting.
    pub const fn cast_shadow(mut self, enabled: bool) -> Self {
        self.cast_shadow = enabled;
        self
    }

    /// Converts into a node description without registering it.
    #[must_use]
    pub fn into_node(self) -> NodeDescription {
        NodeDescription::Light {
            kind: self.kind,
            color: self.color,
            intensity: self.intensity,
            transform: (!self.transform.is_empty()).then_some(self.transform),
            cast_shadow: self.cast_shadow,
        }
    }

    /// Registers the light with the active context.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::NoActiveContext`] outside of a composition scope.
    pub fn emit(self) -> Result<(), ContextError> {
        node(self.into_node())
    }
}
