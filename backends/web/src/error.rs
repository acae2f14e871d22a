//! Error types for payload loading, hydration and the DOM bindings.

use sigil_core::TreeError;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type produced while hydrating a mount point.
#[derive(Debug, thiserror::Error)]
pub enum HydrationError {
    /// Neither the payload script nor the payload attribute exists.
    #[error("no scene payload found for mount `{0}`")]
    MissingPayload(String),
    /// The payload is not a valid scene description.
    #[error("malformed scene payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
    /// The engine or its drawing surface could not be set up.
    #[error("engine initialization failed for mount `{mount}`")]
    EngineInit {
        /// Mount id.
        mount: String,
        /// Engine error.
        #[source]
        source: BoxError,
    },
    /// Building the scene graph failed; nothing was left attached.
    #[error("rebuilding the scene for mount `{mount}` failed")]
    Rebuild {
        /// Mount id.
        mount: String,
        /// Underlying spawn error.
        #[source]
        source: BoxError,
    },
    /// A structural edit was rejected.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Error type produced by the DOM bindings.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, thiserror::Error)]
pub enum WebError {
    /// The DOM APIs are not accessible (e.g., when executed outside of a browser).
    #[error("DOM is not available")]
    DomUnavailable,
    /// The requested mount element cannot be located.
    #[error("failed to find DOM element with id `{0}`")]
    MountNotFound(String),
    /// Wrapper around JavaScript exceptions.
    #[error("JavaScript error: {0}")]
    Js(String),
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for WebError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        value
            .as_string()
            .map_or_else(|| Self::Js(format!("{value:?}")), Self::Js)
    }
}

#[cfg(target_arch = "wasm32")]
impl From<WebError> for wasm_bindgen::JsValue {
    fn from(value: WebError) -> Self {
        js_sys::Error::new(&value.to_string()).into()
    }
}

#[cfg(target_arch = "wasm32")]
impl From<HydrationError> for wasm_bindgen::JsValue {
    fn from(value: HydrationError) -> Self {
        js_sys::Error::new(&value.to_string()).into()
    }
}
