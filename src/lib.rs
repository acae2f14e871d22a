//! # Sigil
//!
//! Declarative 3D scenes, rendered on the server and hydrated in the browser.
//!
//! The workspace is split by role:
//!
//! - [`scene`]: engine independent [`SceneDescription`]s, the scoped
//!   [`CompositionContext`] and the composable functions that write into it.
//! - [`runtime`]: the node wrapper tree that owns engine objects, the
//!   [`SceneApplier`] that drives it from a reconciler, and the render loop.
//! - [`ssr`]: the server rendering pass that embeds a scene next to a canvas.
//! - [`web`]: the client side hydrator that rebuilds the embedded scene once.
//!
//! This crate re-exports all of them, plus [`logging`] and [`config`] for
//! applications that want the usual setup.
//!
//! ```
//! use sigil::prelude::*;
//!
//! let renderer = SsrRenderer::new(SsrConfig::for_mount("hero"));
//! let rendered = renderer
//!     .render(|| {
//!         light(LightKind::Ambient, Color::WHITE, 0.4).emit()?;
//!         mesh(GeometrySpec::sphere(1.0), MaterialSpec::default()).emit()
//!     })
//!     .unwrap();
//!
//! assert!(rendered.html.contains("id='hero-scene'"));
//! ```

pub mod config;
pub mod logging;


pub use sigil_color as color;
pub use sigil_core as runtime;
pub use sigil_scene as scene;
pub use sigil_ssr as ssr;
pub use sigil_web as web;

pub use config::{LogConfig, SigilConfig};

#[doc(inline)]
pub use sigil_core::{Applier, NodeId, NodeTree, SceneApplier};
#[doc(inline)]
pub use sigil_scene::{CompositionContext, SceneDescription};
#[doc(inline)]
pub use sigil_ssr::{RenderedScene, SsrRenderer};
#[doc(inline)]
pub use sigil_web::Hydrator;

pub mod prelude {
    //! Commonly used items, importable with a single `use`.
    //!
    //! ```
    //! use sigil::prelude::*;
    //!
    //! let scene = compose(|| camera(CameraSpec::default())).unwrap();
    //! assert_eq!(scene.node_count(), 1);
    //! ```

    pub use sigil_color::Color;
    pub use sigil_core::{
        Applier, EngineFactory, FrameScheduler, Materia, NodeId, NodeTree, RenderLoop, Renderer,
        SceneApplier, spawn_node, spawn_scene,
    };
    pub use sigil_scene::compose::{camera, compose, group, light, mesh, node, settings};
    pub use sigil_scene::{
        CameraSpec, CompositionContext, GeometrySpec, LightKind, MaterialSpec, NodeDescription,
        SceneDescription, SceneSettings, Transform, Vec3,
    };
    pub use sigil_ssr::{EmbedMode, RenderedScene, SsrConfig, SsrRenderer};
    pub use sigil_web::{
        HydrateOptions, HydrateOutcome, HydrationConfig, HydrationState, Hydrator, MarkerStore,
        PayloadSource,
    };

    pub use crate::config::SigilConfig;
}
