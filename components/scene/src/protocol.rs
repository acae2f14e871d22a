//! Markup contract shared by the server renderer and the client hydrator.

/// Attribute marking an element as a Sigil mount point; its value is the mount id.
pub const MOUNT_ATTRIBUTE: &str = "data-sigil-mount";

/// Attribute carrying the scene JSON when it is embedded in attribute mode.
pub const SCENE_ATTRIBUTE: &str = "data-sigil-scene";

/// Attribute set on the mount element once a client has hydrated it.
pub const HYDRATED_ATTRIBUTE: &str = "data-sigil-hydrated";

/// Value written to [`HYDRATED_ATTRIBUTE`].
pub const HYDRATED_VALUE: &str = "true";

/// MIME type of the inline payload script.
pub const PAYLOAD_SCRIPT_TYPE: &str = "application/json";

const PAYLOAD_SUFFIX: &str = "-scene";

/// Id of the inline `<script>` element holding the payload for `mount_id`.
#[must_use]
pub fn payload_element_id(mount_id: &str) -> String {
    format!("{mount_id}{PAYLOAD_SUFFIX}")
}
