//! Engine-independent transforms.

use serde::{Deserialize, Serialize};

/// A three component vector, serialized as a JSON array.
pub type Vec3 = [f32; 3];

/// Position, rotation and scale of a node.
///
/// Every component is optional; engines keep their own default for a missing
/// one. Rotation is expressed in degrees on the wire and converted to radians
/// when applied to an engine object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    /// Translation relative to the parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec3>,
    /// Euler rotation in degrees (XYZ order).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Vec3>,
    /// Non-uniform scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Vec3>,
}

impl Transform {
    /// A transform where every component is explicitly set to its neutral value.
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            position: Some([0.0; 3]),
            rotation: Some([0.0; 3]),
            scale: Some([1.0; 3]),
        }
    }

    /// Returns a copy with the position set.
    #[must_use]
    pub const fn with_position(mut self, position: Vec3) -> Self {
        self.position = Some(position);
        self
    }

    /// Returns a copy with the rotation (degrees) set.
    #[must_use]
    pub const fn with_rotation(mut self, degrees: Vec3) -> Self {
        self.rotation = Some(degrees);
        self
    }

    /// Returns a copy with the scale set.
    #[must_use]
    pub const fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Returns `true` when no component is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.position.is_none() && self.rotation.is_none() && self.scale.is_none()
    }

    /// Rotation converted to radians, the unit engines consume.
    #[must_use]
    pub fn rotation_radians(&self) -> Option<Vec3> {
        self.rotation.map(|r| r.map(f32::to_radians))
    }
}
