//! Server rendering options.

use serde::{Deserialize, Serialize};

/// Where the serialized scene is placed in the markup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedMode {
    /// Inline `<script type="application/json">` next to the canvas.
    #[default]
    Script,
    /// Single quoted `data-sigil-scene` attribute on the mount element.
    Attribute,
}

/// Options for [`SsrRenderer`](crate::SsrRenderer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsrConfig {
    /// Element id of the mount point; also derives the payload script id.
    pub mount_id: String,
    /// Payload placement.
    pub embed: EmbedMode,
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// CSS class for the mount element.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

impl Default for SsrConfig {
    fn default() -> Self {
        Self {
            mount_id: "sigil-root".to_owned(),
            embed: EmbedMode::Script,
            width: 800,
            height: 600,
            class: None,
        }
    }
}

impl SsrConfig {
    /// Default options for the given mount id.
    #[must_use]
    pub fn for_mount(mount_id: impl Into<String>) -> Self {
        Self {
            mount_id: mount_id.into(),
            ..Self::default()
        }
    }

    /// Returns a copy using `embed`.
    #[must_use]
    pub const fn with_embed(mut self, embed: EmbedMode) -> Self {
        self.embed = embed;
        self
    }

    /// Returns a copy with the canvas size set.
    #[must_use]
    pub const fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Returns a copy with a CSS class.
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config: SsrConfig = toml::from_str(
            r#"
            mount_id = "hero"
            embed = "attribute"
            "#,
        )
        .unwrap();

        assert_eq!(config.mount_id, "hero");
        assert_eq!(config.embed, EmbedMode::Attribute);
        assert_eq!((config.width, config.height), (800, 600));
        assert!(config.class.is_none());
    }
}
