//! Scene level settings.

use serde::{Deserialize, Serialize};
use sigil_color::Color;

/// Linear distance fog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fog {
    /// Fog color.
    pub color: Color,
    /// Distance where fog starts.
    pub near: f32,
    /// Distance where fog is fully opaque.
    pub far: f32,
}

/// Settings that apply to the whole scene rather than to a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneSettings {
    /// Clear color; engines keep their own default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,
    /// Distance fog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fog: Option<Fog>,
    /// Enables shadow maps in the renderer.
    #[serde(default)]
    pub shadows: bool,
}

impl SceneSettings {
    /// Returns a copy with the background set.
    #[must_use]
    pub const fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    /// Returns a copy with fog set.
    #[must_use]
    pub const fn with_fog(mut self, fog: Fog) -> Self {
        self.fog = Some(fog);
        self
    }

    /// Returns a copy with shadows toggled.
    #[must_use]
    pub const fn with_shadows(mut self, enabled: bool) -> Self {
        self.shadows = enabled;
        self
    }
}
