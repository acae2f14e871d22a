//! The server rendering pass.

use core::fmt::Write as _;

use tracing::debug;

use sigil_scene::{
    CompositionContext, ContextError, SceneDescription,
    protocol::{self, MOUNT_ATTRIBUTE, PAYLOAD_SCRIPT_TYPE, SCENE_ATTRIBUTE},
};

use crate::{
    EmbedMode, SsrConfig, SsrError,
    escape::{escape_attribute, escape_script},
};

/// Output of one rendering pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedScene {
    /// The scene the composables described.
    pub scene: SceneDescription,
    /// Its compact JSON, before escaping.
    pub json: String,
    /// Mount element with the embedded payload.
    pub html: String,
}

/// Builds scenes in an isolated composition scope and embeds them in HTML.
#[derive(Debug, Clone, Default)]
pub struct SsrRenderer {
    config: SsrConfig,
}

impl SsrRenderer {
    /// Creates a renderer with the given options.
    #[must_use]
    pub const fn new(config: SsrConfig) -> Self {
        Self { config }
    }

    /// Options in use.
    #[must_use]
    pub const fn config(&self) -> &SsrConfig {
        &self.config
    }

    /// Runs `content` in a fresh composition context and returns the scene.
    ///
    /// The context is only active for the duration of the call, so
    /// concurrent requests on other threads never observe each other's nodes.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `content`.
    pub fn build(
        &self,
        content: impl FnOnce() -> Result<(), ContextError>,
    ) -> Result<SceneDescription, SsrError> {
        let context = CompositionContext::new();
        context.scope(content)?;
        Ok(context.build_scene())
    }

    /// Builds the scene described by `content` and embeds it.
    ///
    /// # Errors
    ///
    /// Fails if `content` fails, the scene cannot be serialized or the
    /// configured mount id is invalid.
    pub fn render(
        &self,
        content: impl FnOnce() -> Result<(), ContextError>,
    ) -> Result<RenderedScene, SsrError> {
        let scene = self.build(content)?;
        let json = scene.to_json()?;
        let html = self.embed_json(&json)?;
        debug!(
            mount = %self.config.mount_id,
            nodes = scene.node_count(),
            bytes = json.len(),
            "rendered scene"
        );
        Ok(RenderedScene { scene, json, html })
    }

    /// Embeds an already built scene.
    ///
    /// # Errors
    ///
    /// Fails if the scene cannot be serialized or the mount id is invalid.
    pub fn embed(&self, scene: &SceneDescription) -> Result<String, SsrError> {
        self.embed_json(&scene.to_json()?)
    }

    fn embed_json(&self, json: &str) -> Result<String, SsrError> {
        let config = &self.config;
        let mount = config.mount_id.as_str();
        validate_mount_id(mount)?;

        let mut html = String::with_capacity(json.len() + 256);
        // Writing into a String cannot fail.
        let _ = write!(html, "<div id='{mount}' {MOUNT_ATTRIBUTE}='{mount}'");
        if let Some(class) = &config.class {
            let _ = write!(html, " class='{}'", escape_attribute(class));
        }
        if config.embed == EmbedMode::Attribute {
            let _ = write!(html, " {SCENE_ATTRIBUTE}='{}'", escape_attribute(json));
        }
        let _ = write!(
            html,
            "><canvas width='{}' height='{}'></canvas>",
            config.width, config.height
        );
        if config.embed == EmbedMode::Script {
            let _ = write!(
                html,
                "<script type='{PAYLOAD_SCRIPT_TYPE}' id='{}'>{}</script>",
                protocol::payload_element_id(mount),
                escape_script(json)
            );
        }
        html.push_str("</div>");
        Ok(html)
    }
}

fn validate_mount_id(mount: &str) -> Result<(), SsrError> {
    let invalid = mount.is_empty()
        || mount
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '\'' | '"' | '<' | '>' | '&'));
    if invalid {
        return Err(SsrError::InvalidMountId(mount.to_owned()));
    }
    Ok(())
}
