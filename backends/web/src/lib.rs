//! Client side hydration for Sigil.
//!
//! The server embeds a scene payload next to each mount point. A [`Hydrator`]
//! reads it, rebuilds an equivalent scene graph through an
//! [`EngineFactory`](sigil_core::EngineFactory), and starts a render loop. A
//! [`HydrationGuard`] together with a persisted [`MarkerStore`] makes repeated
//! hydration of the same mount a no-op.
//!
//! The DOM bindings ([`DomMarkers`], [`DomPayloads`],
//! [`AnimationFrameScheduler`]) are only compiled for `wasm32`. Every other
//! piece runs natively, which is how it is tested.

mod config;
mod error;
mod hydrator;
mod payload;
mod state;

#[cfg(target_arch = "wasm32")]
mod dom;

#[cfg(test)]
mod tests;

pub use config::{HydrationConfig, Viewport};
pub use error::HydrationError;
pub use hydrator::{DisposeReport, HydrateOptions, HydrateOutcome, Hydrator};
pub use payload::{PayloadSource, StaticPayloads, load_scene};
pub use state::{HydrationGuard, HydrationState, MarkerStore, MemoryMarkers};

#[cfg(target_arch = "wasm32")]
pub use dom::{
    AnimationFrameScheduler, BrowserHydrator, DomMarkers, DomPayloads, browser_hydrator, document,
    mount_element,
};
#[cfg(target_arch = "wasm32")]
pub use error::WebError;
