//! Client hydration options.

use serde::{Deserialize, Serialize};

/// Options for [`Hydrator`](crate::Hydrator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HydrationConfig {
    /// Starts a render loop for every hydrated mount.
    pub start_render_loop: bool,
    /// Resizes the renderer after creation; the factory size is kept when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
}

impl Default for HydrationConfig {
    fn default() -> Self {
        Self {
            start_render_loop: true,
            viewport: None,
        }
    }
}

/// Drawing surface size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_viewport_table() {
        let config: HydrationConfig = toml::from_str(
            r"
            start_render_loop = false
            viewport = { width = 1280, height = 720 }
            ",
        )
        .unwrap();
        assert!(!config.start_render_loop);
        assert_eq!(
            config.viewport,
            Some(Viewport {
                width: 1280,
                height: 720
            })
        );
        assert_eq!(toml::from_str::<HydrationConfig>("").unwrap(), HydrationConfig::default());
    }
}
