//! Turning scene descriptions into live wrappers.

use tracing::{debug, warn};

use sigil_scene::{GeometrySpec, MaterialSpec, NodeDescription, SceneDescription};

use crate::{Materia, NodeId, NodeTree, SpawnError};

/// Creates the subtree for `description` and attaches it as the last child of `parent`.
///
/// Geometries and materials the engine has no native builder for are replaced
/// by [`GeometrySpec::fallback`] and [`MaterialSpec::fallback`].
///
/// Nothing is left behind on failure: every wrapper created by this call is
/// disposed before the error is returned.
///
/// # Errors
///
/// Returns [`SpawnError::Engine`] if the engine cannot create an object and
/// [`SpawnError::Tree`] if `parent` cannot receive children.
pub fn spawn_node<E: Materia>(
    tree: &mut NodeTree<E>,
    parent: NodeId,
    description: &NodeDescription,
) -> Result<NodeId, SpawnError<E::Error>> {
    let mut created = Vec::new();
    spawn_into(tree, parent, description, &mut created).inspect_err(|_| rollback(tree, &created))
}

/// Builds every root of `scene` under the tree root and applies its settings.
///
/// All or nothing: on failure the wrappers created so far are disposed and
/// settings are left untouched.
///
/// # Errors
///
/// See [`spawn_node`].
pub fn spawn_scene<E: Materia>(
    tree: &mut NodeTree<E>,
    scene: &SceneDescription,
) -> Result<Vec<NodeId>, SpawnError<E::Error>> {
    let root = tree.root();
    let mut created = Vec::new();
    let mut roots = Vec::with_capacity(scene.nodes.len());

    for description in &scene.nodes {
        match spawn_into(tree, root, description, &mut created) {
            Ok(id) => roots.push(id),
            Err(error) => {
                rollback(tree, &created);
                return Err(error);
            }
        }
    }

    tree.apply_settings(&scene.settings);
    debug!(roots = roots.len(), nodes = created.len(), "spawned scene");
    Ok(roots)
}

fn spawn_into<E: Materia>(
    tree: &mut NodeTree<E>,
    parent: NodeId,
    description: &NodeDescription,
    created: &mut Vec<NodeId>,
) -> Result<NodeId, SpawnError<E::Error>> {
    let id = match description {
        NodeDescription::Mesh {
            geometry, material, ..
        } => {
            let geometry = native_geometry(geometry);
            let material = native_material(material);
            tree.create_mesh(&geometry, &material)
        }
        NodeDescription::Light {
            kind,
            color,
            intensity,
            ..
        } => tree.create_light(*kind, *color, *intensity),
        NodeDescription::Group { .. } => tree.create_group(),
        NodeDescription::Camera(spec) => tree.create_camera(spec),
    }
    .map_err(SpawnError::Engine)?;
    created.push(id);

    if let Some(transform) = description.transform() {
        tree.set_transform(id, transform)?;
    }
    tree.insert(parent, tree.child_count(parent), id)?;

    for child in description.children() {
        spawn_into(tree, id, child, created)?;
    }
    Ok(id)
}

fn native_geometry(geometry: &GeometrySpec) -> GeometrySpec {
    if geometry.is_primitive() {
        return geometry.clone();
    }
    match geometry {
        GeometrySpec::Custom { name, .. } => {
            warn!(%name, "custom geometry has no native builder, using a unit box");
        }
        _ => warn!(tag = geometry.tag(), "unknown geometry, using a unit box"),
    }
    GeometrySpec::fallback()
}

fn native_material(material: &MaterialSpec) -> MaterialSpec {
    if material.is_builtin() {
        return material.clone();
    }
    match material {
        MaterialSpec::Custom { name, .. } => {
            warn!(%name, "custom material has no native builder, using basic grey");
        }
        _ => warn!(tag = material.tag(), "unknown material, using basic grey"),
    }
    MaterialSpec::fallback()
}

fn rollback<E: Materia>(tree: &mut NodeTree<E>, created: &[NodeId]) {
    warn!(nodes = created.len(), "rolling back partially spawned scene");
    for &id in created.iter().rev() {
        if let Err(error) = tree.dispose(id) {
            warn!(?id, %error, "cannot dispose node during rollback");
        }
    }
}
