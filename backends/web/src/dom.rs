//! Browser bindings: marker attribute, payload lookup and animation frames.

use tracing::debug;
use wasm_bindgen::{JsCast, closure::Closure};
use web_sys::{Document, Element, Window};

use sigil_core::{FrameScheduler, FrameToken};
use sigil_scene::protocol::{self, HYDRATED_ATTRIBUTE, HYDRATED_VALUE, SCENE_ATTRIBUTE};

use crate::{HydrationConfig, Hydrator, MarkerStore, PayloadSource, error::WebError};

/// Hydrator wired to the live document.
pub type BrowserHydrator<F> = Hydrator<F, DomMarkers, DomPayloads, AnimationFrameScheduler>;

/// Creates a hydrator bound to the current document and window.
///
/// # Errors
///
/// Returns [`WebError::DomUnavailable`] outside of a browser.
pub fn browser_hydrator<F: sigil_core::EngineFactory + 'static>(
    factory: F,
    config: HydrationConfig,
) -> Result<BrowserHydrator<F>, WebError> {
    Ok(Hydrator::new(
        factory,
        DomMarkers::new()?,
        DomPayloads::new()?,
        AnimationFrameScheduler::new()?,
        config,
    ))
}

fn window() -> Result<Window, WebError> {
    web_sys::window().ok_or(WebError::DomUnavailable)
}

/// Returns the current document.
///
/// # Errors
///
/// Returns [`WebError::DomUnavailable`] outside of a browser.
pub fn document() -> Result<Document, WebError> {
    window()?.document().ok_or(WebError::DomUnavailable)
}

/// Looks up a mount element by id.
///
/// # Errors
///
/// Returns [`WebError::MountNotFound`] when no element has that id.
pub fn mount_element(document: &Document, mount_id: &str) -> Result<Element, WebError> {
    document
        .get_element_by_id(mount_id)
        .ok_or_else(|| WebError::MountNotFound(mount_id.to_owned()))
}

/// Marker store backed by the `data-sigil-hydrated` attribute.
#[derive(Debug, Clone)]
pub struct DomMarkers {
    document: Document,
}

impl DomMarkers {
    /// Binds to the current document.
    ///
    /// # Errors
    ///
    /// Returns [`WebError::DomUnavailable`] outside of a browser.
    pub fn new() -> Result<Self, WebError> {
        Ok(Self {
            document: document()?,
        })
    }
}

impl MarkerStore for DomMarkers {
    fn is_marked(&self, mount_id: &str) -> bool {
        mount_element(&self.document, mount_id)
            .ok()
            .and_then(|element| element.get_attribute(HYDRATED_ATTRIBUTE))
            .is_some_and(|value| value == HYDRATED_VALUE)
    }

    fn mark(&mut self, mount_id: &str) {
        let result = mount_element(&self.document, mount_id).and_then(|element| {
            element
                .set_attribute(HYDRATED_ATTRIBUTE, HYDRATED_VALUE)
                .map_err(WebError::from)
        });
        if let Err(error) = result {
            debug!(mount = mount_id, %error, "cannot set hydration marker");
        }
    }

    fn clear(&mut self, mount_id: &str) {
        let result = mount_element(&self.document, mount_id).and_then(|element| {
            element
                .remove_attribute(HYDRATED_ATTRIBUTE)
                .map_err(WebError::from)
        });
        if let Err(error) = result {
            debug!(mount = mount_id, %error, "cannot clear hydration marker");
        }
    }
}

/// Payload source reading the inline script, falling back to the attribute.
#[derive(Debug, Clone)]
pub struct DomPayloads {
    document: Document,
}

impl DomPayloads {
    /// Binds to the current document.
    ///
    /// # Errors
    ///
    /// Returns [`WebError::DomUnavailable`] outside of a browser.
    pub fn new() -> Result<Self, WebError> {
        Ok(Self {
            document: document()?,
        })
    }
}

impl PayloadSource for DomPayloads {
    fn payload(&self, mount_id: &str) -> Option<String> {
        let script_id = protocol::payload_element_id(mount_id);
        if let Some(text) = self
            .document
            .get_element_by_id(&script_id)
            .and_then(|script| script.text_content())
        {
            return Some(text);
        }
        self.document
            .get_element_by_id(mount_id)
            .and_then(|element| element.get_attribute(SCENE_ATTRIBUTE))
    }
}

/// [`FrameScheduler`] on top of `requestAnimationFrame`.
#[derive(Debug, Clone)]
pub struct AnimationFrameScheduler {
    window: Window,
}

impl AnimationFrameScheduler {
    /// Binds to the current window.
    ///
    /// # Errors
    ///
    /// Returns [`WebError::DomUnavailable`] outside of a browser.
    pub fn new() -> Result<Self, WebError> {
        Ok(Self { window: window()? })
    }
}

impl FrameScheduler for AnimationFrameScheduler {
    fn request_frame(&mut self, callback: Box<dyn FnOnce()>) -> FrameToken {
        let closure = Closure::once_into_js(move || callback());
        match self
            .window
            .request_animation_frame(closure.unchecked_ref())
        {
            Ok(handle) => FrameToken::new(u64::from(handle.unsigned_abs())),
            Err(error) => {
                debug!(error = %WebError::from(error), "requestAnimationFrame failed");
                FrameToken::new(0)
            }
        }
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        if let Ok(handle) = i32::try_from(token.id())
            && handle != 0
        {
            let _ = self.window.cancel_animation_frame(handle);
        }
    }
}
