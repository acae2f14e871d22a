//! Engine independent scene descriptions for Sigil.
//!
//! This crate holds the data that travels between a server rendering pass and
//! a hydrating client:
//!
//! - [`SceneDescription`]: root [`NodeDescription`]s plus [`SceneSettings`],
//!   serialized as JSON.
//! - [`CompositionContext`]: the scoped registry composables write into while
//!   a scene is rendered on the server.
//! - [`compose`]: composable functions built on top of the registry.
//! - [`protocol`]: attribute names and ids both sides agree on.

mod context;
mod description;
mod error;
mod geometry;
mod material;
mod node;
mod settings;
mod transform;

pub mod compose;
pub mod protocol;


pub use context::{CompositionContext, ContextGuard};
pub use description::SceneDescription;
pub use error::ContextError;
pub use geometry::GeometrySpec;
pub use material::MaterialSpec;
pub use node::{CameraSpec, LightKind, NodeDescription};
pub use settings::{Fog, SceneSettings};
pub use sigil_color::Color;
pub use transform::{Transform, Vec3};
