//! Locating and parsing the embedded scene payload.

use std::collections::HashMap;

use sigil_scene::SceneDescription;

use crate::HydrationError;

/// Where the client reads the server payload from.
pub trait PayloadSource {
    /// Raw JSON embedded for `mount_id`, if any.
    fn payload(&self, mount_id: &str) -> Option<String>;
}

/// [`PayloadSource`] backed by a map, for tests and non-DOM hosts.
#[derive(Debug, Clone, Default)]
pub struct StaticPayloads {
    payloads: HashMap<String, String>,
}

impl StaticPayloads {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the payload for `mount_id`.
    #[must_use]
    pub fn with(mut self, mount_id: impl Into<String>, json: impl Into<String>) -> Self {
        self.insert(mount_id, json);
        self
    }

    /// Adds or replaces the payload for `mount_id`.
    pub fn insert(&mut self, mount_id: impl Into<String>, json: impl Into<String>) {
        self.payloads.insert(mount_id.into(), json.into());
    }

    /// Removes the payload for `mount_id`.
    pub fn remove(&mut self, mount_id: &str) -> Option<String> {
        self.payloads.remove(mount_id)
    }
}

impl PayloadSource for StaticPayloads {
    fn payload(&self, mount_id: &str) -> Option<String> {
        self.payloads.get(mount_id).cloned()
    }
}

/// Reads and parses the payload for `mount_id`.
///
/// # Errors
///
/// [`HydrationError::MissingPayload`] when the source has nothing for the
/// mount, [`HydrationError::MalformedPayload`] when the JSON does not parse.
pub fn load_scene(
    source: &impl PayloadSource,
    mount_id: &str,
) -> Result<SceneDescription, HydrationError> {
    let json = source
        .payload(mount_id)
        .ok_or_else(|| HydrationError::MissingPayload(mount_id.to_owned()))?;
    Ok(SceneDescription::from_json(json.trim())?)
}
