//! Material specifications.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sigil_color::Color;

/// Surface description of a mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum MaterialSpec {
    /// Physically based metallic/roughness material.
    Standard {
        /// Base color.
        color: Color,
        /// Metalness in `0.0..=1.0`.
        #[serde(default)]
        metalness: f32,
        /// Roughness in `0.0..=1.0`.
        #[serde(default = "one")]
        roughness: f32,
        /// Emissive color, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        emissive: Option<Color>,
        /// Opacity; values below one make the material transparent.
        #[serde(default = "one")]
        opacity: f32,
        /// Render edges only.
        #[serde(default)]
        wireframe: bool,
    },
    /// Unlit material.
    Basic {
        /// Flat color.
        color: Color,
        /// Opacity; values below one make the material transparent.
        #[serde(default = "one")]
        opacity: f32,
        /// Render edges only.
        #[serde(default)]
        wireframe: bool,
    },
    /// Material provided by an application specific shader.
    Custom {
        /// Shader or preset name understood by the consuming engine.
        name: String,
        /// Numeric uniforms.
        #[serde(default)]
        params: BTreeMap<String, f32>,
    },
    /// A tag this build does not understand.
    #[serde(other)]
    Unknown,
}

const fn one() -> f32 {
    1.0
}

impl MaterialSpec {
    /// A standard material with default metalness and roughness.
    #[must_use]
    pub const fn standard(color: Color) -> Self {
        Self::Standard {
            color,
            metalness: 0.0,
            roughness: 1.0,
            emissive: None,
            opacity: 1.0,
            wireframe: false,
        }
    }

    /// An opaque unlit material.
    #[must_use]
    pub const fn basic(color: Color) -> Self {
        Self::Basic {
            color,
            opacity: 1.0,
            wireframe: false,
        }
    }

    /// The representation used when a material cannot be built natively.
    #[must_use]
    pub const fn fallback() -> Self {
        Self::basic(Color::GREY)
    }

    /// Returns `true` for the built-in variants.
    #[must_use]
    pub const fn is_builtin(&self) -> bool {
        matches!(self, Self::Standard { .. } | Self::Basic { .. })
    }

    /// Returns `true` when the material needs alpha blending.
    #[must_use]
    pub fn is_transparent(&self) -> bool {
        match self {
            Self::Standard { opacity, .. } | Self::Basic { opacity, .. } => *opacity < 1.0,
            Self::Custom { .. } | Self::Unknown => false,
        }
    }

    /// Wire tag of this variant.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Standard { .. } => "standard",
            Self::Basic { .. } => "basic",
            Self::Custom { .. } => "custom",
            Self::Unknown => "unknown",
        }
    }
}

impl Default for MaterialSpec {
    fn default() -> Self {
        Self::standard(Color::WHITE)
    }
}
