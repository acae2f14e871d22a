//! Geometry specifications.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Parametric description of a mesh geometry.
///
/// Only plain numbers and strings are carried so the description stays engine
/// independent. Tags that a consumer does not know deserialize to
/// [`GeometrySpec::Unknown`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GeometrySpec {
    /// Axis aligned box.
    Box {
        /// Extent along X.
        width: f32,
        /// Extent along Y.
        height: f32,
        /// Extent along Z.
        depth: f32,
    },
    /// UV sphere.
    Sphere {
        /// Sphere radius.
        radius: f32,
        /// Horizontal segment count.
        #[serde(default = "default_width_segments")]
        width_segments: u32,
        /// Vertical segment count.
        #[serde(default = "default_height_segments")]
        height_segments: u32,
    },
    /// Flat plane in the XY plane.
    Plane {
        /// Extent along X.
        width: f32,
        /// Extent along Y.
        height: f32,
    },
    /// Cylinder or truncated cone.
    Cylinder {
        /// Radius of the top cap.
        radius_top: f32,
        /// Radius of the bottom cap.
        radius_bottom: f32,
        /// Height along Y.
        height: f32,
        /// Segment count around the circumference.
        #[serde(default = "default_radial_segments")]
        radial_segments: u32,
    },
    /// Geometry provided by an application specific generator.
    Custom {
        /// Generator name understood by the consuming engine.
        name: String,
        /// Numeric generator parameters.
        #[serde(default)]
        params: BTreeMap<String, f32>,
    },
    /// A tag this build does not understand.
    #[serde(other)]
    Unknown,
}

const fn default_width_segments() -> u32 {
    32
}

const fn default_height_segments() -> u32 {
    16
}

const fn default_radial_segments() -> u32 {
    32
}

impl GeometrySpec {
    /// A box with the given extents.
    #[must_use]
    pub const fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        Self::Box {
            width,
            height,
            depth,
        }
    }

    /// A sphere with default tessellation.
    #[must_use]
    pub const fn sphere(radius: f32) -> Self {
        Self::Sphere {
            radius,
            width_segments: default_width_segments(),
            height_segments: default_height_segments(),
        }
    }

    /// A plane with the given extents.
    #[must_use]
    pub const fn plane(width: f32, height: f32) -> Self {
        Self::Plane { width, height }
    }

    /// A cylinder with default tessellation.
    #[must_use]
    pub const fn cylinder(radius_top: f32, radius_bottom: f32, height: f32) -> Self {
        Self::Cylinder {
            radius_top,
            radius_bottom,
            height,
            radial_segments: default_radial_segments(),
        }
    }

    /// The representation used when a geometry cannot be built natively.
    #[must_use]
    pub const fn fallback() -> Self {
        Self::cuboid(1.0, 1.0, 1.0)
    }

    /// Returns `true` for the built-in primitive variants.
    #[must_use]
    pub const fn is_primitive(&self) -> bool {
        matches!(
            self,
            Self::Box { .. } | Self::Sphere { .. } | Self::Plane { .. } | Self::Cylinder { .. }
        )
    }

    /// Wire tag of this variant.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Box { .. } => "box",
            Self::Sphere { .. } => "sphere",
            Self::Plane { .. } => "plane",
            Self::Cylinder { .. } => "cylinder",
            Self::Custom { .. } => "custom",
            Self::Unknown => "unknown",
        }
    }
}
