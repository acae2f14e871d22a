//! The serializable scene exchanged between server and client.

use serde::{Deserialize, Serialize};

use crate::{NodeDescription, SceneSettings};

/// Root nodes plus scene settings. This is the JSON wire format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDescription {
    /// Ordered root nodes.
    #[serde(default, deserialize_with = "crate::node::deserialize_nodes")]
    pub nodes: Vec<NodeDescription>,
    /// Scene level settings.
    #[serde(default)]
    pub settings: SceneSettings,
}

impl SceneDescription {
    /// Creates a description from root nodes and settings.
    #[must_use]
    pub const fn new(nodes: Vec<NodeDescription>, settings: SceneSettings) -> Self {
        Self { nodes, settings }
    }

    /// Returns `true` when the scene has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total number of nodes at every depth.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.iter().map(NodeDescription::subtree_len).sum()
    }

    /// Serializes to compact JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails. Non-finite floats are written as
    /// `null` and will be rejected by [`from_json`](Self::from_json).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes to indented JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parses a JSON payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not valid JSON or does not match the model.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
