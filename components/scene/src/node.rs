//! Node descriptions: the tagged tree a scene is made of.

use serde::{Deserialize, Deserializer, Serialize, de};
use sigil_color::Color;
use tracing::warn;

use crate::{GeometrySpec, MaterialSpec, Transform, Vec3};

/// Kind of light source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LightKind {
    /// Uniform light from every direction.
    Ambient,
    /// Parallel rays, like sunlight.
    Directional,
    /// Omnidirectional light from a point.
    Point,
    /// Cone shaped light from a point.
    Spot,
    /// Sky/ground gradient.
    Hemisphere,
}

/// Perspective camera parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraSpec {
    /// Eye position.
    pub position: Vec3,
    /// Point the camera looks at.
    #[serde(default)]
    pub look_at: Vec3,
    /// Vertical field of view in degrees.
    #[serde(default = "default_fov")]
    pub fov: f32,
    /// Near clipping plane.
    #[serde(default = "default_near")]
    pub near: f32,
    /// Far clipping plane.
    #[serde(default = "default_far")]
    pub far: f32,
}

const fn default_fov() -> f32 {
    75.0
}

const fn default_near() -> f32 {
    0.1
}

const fn default_far() -> f32 {
    1000.0
}

impl CameraSpec {
    /// A camera at `position` looking at the origin with default projection.
    #[must_use]
    pub const fn new(position: Vec3) -> Self {
        Self {
            position,
            look_at: [0.0; 3],
            fov: default_fov(),
            near: default_near(),
            far: default_far(),
        }
    }

    /// Returns a copy looking at `target`.
    #[must_use]
    pub const fn looking_at(mut self, target: Vec3) -> Self {
        self.look_at = target;
        self
    }
}

impl Default for CameraSpec {
    fn default() -> Self {
        Self::new([0.0, 0.0, 5.0])
    }
}

/// One node of a scene description.
///
/// Node lists skip entries whose `type` is not one of the tags below, so a
/// payload from a newer producer still loads. A known tag with bad fields is
/// still an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum NodeDescription {
    /// Renderable geometry with a material.
    Mesh {
        /// Geometry parameters.
        geometry: GeometrySpec,
        /// Surface parameters.
        material: MaterialSpec,
        /// Placement relative to the parent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transform: Option<Transform>,
    },
    /// Light source.
    Light {
        /// Light kind.
        kind: LightKind,
        /// Light color.
        color: Color,
        /// Intensity multiplier.
        intensity: f32,
        /// Placement relative to the parent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transform: Option<Transform>,
        /// Whether the light casts shadows.
        #[serde(default, skip_serializing_if = "core::ops::Not::not")]
        cast_shadow: bool,
    },
    /// Transform node grouping other nodes.
    Group {
        /// Placement relative to the parent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transform: Option<Transform>,
        /// Ordered children.
        #[serde(default, deserialize_with = "deserialize_nodes")]
        children: Vec<NodeDescription>,
    },
    /// Perspective camera.
    Camera(CameraSpec),
}

impl NodeDescription {
    /// Every wire tag this version understands.
    pub const TAGS: [&'static str; 4] = ["mesh", "light", "group", "camera"];

    /// A mesh without a transform.
    #[must_use]
    pub const fn mesh(geometry: GeometrySpec, material: MaterialSpec) -> Self {
        Self::Mesh {
            geometry,
            material,
            transform: None,
        }
    }

    /// A light without a transform.
    #[must_use]
    pub const fn light(kind: LightKind, color: Color, intensity: f32) -> Self {
        Self::Light {
            kind,
            color,
            intensity,
            transform: None,
            cast_shadow: false,
        }
    }

    /// A group with the given children.
    #[must_use]
    pub const fn group(transform: Option<Transform>, children: Vec<Self>) -> Self {
        Self::Group {
            transform,
            children,
        }
    }

    /// Returns a copy with `transform` applied. Cameras ignore transforms.
    #[must_use]
    pub fn with_transform(mut self, value: Transform) -> Self {
        match &mut self {
            Self::Mesh { transform, .. }
            | Self::Light { transform, .. }
            | Self::Group { transform, .. } => *transform = Some(value),
            Self::Camera(_) => {}
        }
        self
    }

    /// The node's transform, if it carries one.
    #[must_use]
    pub const fn transform(&self) -> Option<&Transform> {
        match self {
            Self::Mesh { transform, .. }
            | Self::Light { transform, .. }
            | Self::Group { transform, .. } => transform.as_ref(),
            Self::Camera(_) => None,
        }
    }

    /// Children of a group; empty for every other variant.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        match self {
            Self::Group { children, .. } => children,
            _ => &[],
        }
    }

    /// Number of nodes in this subtree, including `self`.
    #[must_use]
    pub fn subtree_len(&self) -> usize {
        1 + self.children().iter().map(Self::subtree_len).sum::<usize>()
    }

    /// Wire tag of this variant.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Mesh { .. } => "mesh",
            Self::Light { .. } => "light",
            Self::Group { .. } => "group",
            Self::Camera(_) => "camera",
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireNode {
    Known(NodeDescription),
    Other {
        #[serde(rename = "type")]
        tag: String,
    },
}

/// Reads a node list, dropping nodes of unknown type.
pub(crate) fn deserialize_nodes<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<NodeDescription>, D::Error> {
    let wire = Vec::<WireNode>::deserialize(deserializer)?;
    let mut nodes = Vec::with_capacity(wire.len());
    for node in wire {
        match node {
            WireNode::Known(node) => nodes.push(node),
            WireNode::Other { tag } if NodeDescription::TAGS.contains(&tag.as_str()) => {
                return Err(de::Error::custom(format_args!("malformed `{tag}` node")));
            }
            WireNode::Other { tag } => warn!(%tag, "skipping node of unknown type"),
        }
    }
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_flattens_into_tagged_object() {
        let node = NodeDescription::Camera(CameraSpec::new([0.0, 2.0, 8.0]));
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "camera");
        assert_eq!(json["lookAt"], serde_json::json!([0.0, 0.0, 0.0]));
        assert_eq!(json["fov"], 75.0);
    }

    #[test]
    fn light_omits_default_flags() {
        let node = NodeDescription::light(LightKind::Ambient, Color::new(0x40_4040), 0.4);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["kind"], "ambient");
        assert!(json.get("castShadow").is_none());
        assert!(json.get("transform").is_none());
    }

    #[test]
    fn subtree_len_counts_nested_children() {
        let leaf = NodeDescription::mesh(GeometrySpec::fallback(), MaterialSpec::fallback());
        let inner = NodeDescription::group(None, vec![leaf.clone(), leaf.clone()]);
        let outer = NodeDescription::group(None, vec![inner, leaf]);
        assert_eq!(outer.subtree_len(), 5);
        assert_eq!(outer.children().len(), 2);
    }

    #[test]
    fn unknown_children_are_skipped() {
        let json = r#"{"type":"group","children":[
            {"type":"portal","radius":2},
            {"type":"light","kind":"point","color":16777215,"intensity":1.0}
        ]}"#;
        let node: NodeDescription = serde_json::from_str(json).unwrap();
        assert_eq!(node.children().len(), 1);
        assert_eq!(node.children()[0].tag(), "light");
    }

    #[test]
    fn cameras_ignore_transforms() {
        let camera = NodeDescription::Camera(CameraSpec::default())
            .with_transform(Transform::identity());
        assert!(camera.transform().is_none());
    }
}
