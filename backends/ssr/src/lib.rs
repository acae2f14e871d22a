//! Server side rendering for Sigil scenes.
//!
//! A request handler runs its composables through [`SsrRenderer::render`]. The
//! composables write into a composition context that only lives for that
//! call; the resulting [`SceneDescription`](sigil_scene::SceneDescription) is
//! serialized to JSON and embedded in a mount element the client hydrates.
//!
//! ```
//! use sigil_scene::compose::mesh;
//! use sigil_scene::{GeometrySpec, MaterialSpec};
//! use sigil_ssr::{SsrConfig, SsrRenderer};
//!
//! let renderer = SsrRenderer::new(SsrConfig::for_mount("hero"));
//! let rendered = renderer
//!     .render(|| mesh(GeometrySpec::sphere(1.0), MaterialSpec::default()).emit())
//!     .unwrap();
//! assert!(rendered.html.contains("id='hero-scene'"));
//! ```

mod config;
mod error;
mod render;

pub mod escape;

pub use config::{EmbedMode, SsrConfig};
pub use error::SsrError;
pub use render::{RenderedScene, SsrRenderer};
