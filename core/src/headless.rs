//! An in-memory [`Materia`] implementation.
//!
//! [`HeadlessEngine`] keeps the whole scene graph as plain records: object
//! kinds, transforms, parent links and resource lifetimes. Servers use it to
//! validate scenes without a GPU, and tests use it to observe that the wrapper
//! tree releases everything it created.

use std::collections::HashSet;

use tracing::{trace, warn};

use sigil_scene::{CameraSpec, Color, GeometrySpec, LightKind, MaterialSpec, SceneSettings, Vec3};

use crate::{EngineFactory, Materia, Renderer};

/// Object handle of the headless engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeadlessObject(u32);

/// Resource handle of the headless engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeadlessResource(u64);

/// What a headless object stands for.
#[derive(Debug, Clone, PartialEq)]
pub enum HeadlessKind {
    /// The scene root.
    Scene,
    /// Transform node.
    Group,
    /// Geometry with a material.
    Mesh {
        /// Geometry the mesh was built from.
        geometry: GeometrySpec,
        /// Material the mesh was built from.
        material: MaterialSpec,
    },
    /// Light source.
    Light {
        /// Light kind.
        kind: LightKind,
        /// Light color.
        color: Color,
        /// Intensity multiplier.
        intensity: f32,
    },
    /// Perspective camera.
    Camera(CameraSpec),
}

/// Local transform of a headless object, rotation in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadlessTransform {
    /// Translation.
    pub position: Vec3,
    /// Euler rotation in radians.
    pub rotation: Vec3,
    /// Scale.
    pub scale: Vec3,
}

impl Default for HeadlessTransform {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

/// Errors produced by the headless engine and factory.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeadlessError {
    /// Object creation was configured to fail.
    #[error("object creation refused after {0} objects")]
    Exhausted(usize),
    /// Factory initialization was configured to fail.
    #[error("cannot initialize an engine for mount `{0}`")]
    Init(String),
}

#[derive(Debug)]
struct ObjectRecord {
    kind: HeadlessKind,
    transform: HeadlessTransform,
    parent: Option<HeadlessObject>,
    children: Vec<HeadlessObject>,
    resources: Vec<HeadlessResource>,
    disposed: bool,
}

impl ObjectRecord {
    fn new(kind: HeadlessKind, resources: Vec<HeadlessResource>) -> Self {
        Self {
            kind,
            transform: HeadlessTransform::default(),
            parent: None,
            children: Vec::new(),
            resources,
            disposed: false,
        }
    }
}

/// In-memory scene graph.
#[derive(Debug)]
pub struct HeadlessEngine {
    objects: Vec<ObjectRecord>,
    next_resource: u64,
    live_resources: HashSet<HeadlessResource>,
    released: Vec<HeadlessResource>,
    // Released handles waiting to be handed out again.
    recycled: Option<Vec<HeadlessResource>>,
    double_releases: usize,
    settings: SceneSettings,
    fail_after: Option<usize>,
    created: usize,
}

impl Default for HeadlessEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessEngine {
    /// Creates an engine holding only the scene root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            objects: vec![ObjectRecord::new(HeadlessKind::Scene, Vec::new())],
            next_resource: 0,
            live_resources: HashSet::new(),
            released: Vec::new(),
            recycled: None,
            double_releases: 0,
            settings: SceneSettings::default(),
            fail_after: None,
            created: 0,
        }
    }

    /// Makes every creation after the first `count` fail.
    pub const fn fail_after(&mut self, count: usize) {
        self.fail_after = Some(count);
    }

    /// Hands released resource handles out again, most recent first, the way
    /// engines with pooled GPU handles do.
    pub fn reuse_released_handles(&mut self) {
        self.recycled.get_or_insert_with(Vec::new);
    }

    /// Kind of `object`.
    #[must_use]
    pub fn kind(&self, object: HeadlessObject) -> Option<&HeadlessKind> {
        self.record(object).map(|record| &record.kind)
    }

    /// Local transform of `object`.
    #[must_use]
    pub fn transform(&self, object: HeadlessObject) -> Option<HeadlessTransform> {
        self.record(object).map(|record| record.transform)
    }

    /// Engine-side parent of `object`.
    #[must_use]
    pub fn parent_of(&self, object: HeadlessObject) -> Option<HeadlessObject> {
        self.record(object).and_then(|record| record.parent)
    }

    /// Returns `true` once `object` has been disposed.
    #[must_use]
    pub fn is_disposed(&self, object: HeadlessObject) -> bool {
        self.record(object).is_some_and(|record| record.disposed)
    }

    /// Objects not yet disposed, the scene root included.
    #[must_use]
    pub fn live_objects(&self) -> usize {
        self.objects.iter().filter(|record| !record.disposed).count()
    }

    /// Resources allocated and not yet released.
    #[must_use]
    pub fn live_resources(&self) -> usize {
        self.live_resources.len()
    }

    /// Resources released so far, in release order.
    #[must_use]
    pub fn released(&self) -> &[HeadlessResource] {
        &self.released
    }

    /// Number of times an already released resource was released again.
    #[must_use]
    pub const fn double_releases(&self) -> usize {
        self.double_releases
    }

    /// Number of objects created, the scene root excluded.
    #[must_use]
    pub const fn created(&self) -> usize {
        self.created
    }

    /// Last applied settings.
    #[must_use]
    pub const fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    /// Objects reachable from the scene root, the root excluded.
    #[must_use]
    pub fn reachable(&self) -> usize {
        let mut count = 0;
        let mut stack = self.objects[0].children.clone();
        while let Some(object) = stack.pop() {
            count += 1;
            if let Some(record) = self.record(object) {
                stack.extend_from_slice(&record.children);
            }
        }
        count
    }

    fn record(&self, object: HeadlessObject) -> Option<&ObjectRecord> {
        self.objects.get(object.0 as usize)
    }

    fn record_mut(&mut self, object: HeadlessObject) -> Option<&mut ObjectRecord> {
        self.objects.get_mut(object.0 as usize)
    }

    fn allocate(&mut self) -> Result<HeadlessResource, HeadlessError> {
        let resource = match self.recycled.as_mut().and_then(Vec::pop) {
            Some(resource) => resource,
            None => {
                let resource = HeadlessResource(self.next_resource);
                self.next_resource = self
                    .next_resource
                    .checked_add(1)
                    .ok_or(HeadlessError::Exhausted(self.created))?;
                resource
            }
        };
        self.live_resources.insert(resource);
        Ok(resource)
    }

    fn spawn(
        &mut self,
        kind: HeadlessKind,
        resources: Vec<HeadlessResource>,
    ) -> Result<HeadlessObject, HeadlessError> {
        let id = u32::try_from(self.objects.len()).map_err(|_| HeadlessError::Exhausted(self.created))?;
        let object = HeadlessObject(id);
        trace!(?object, ?kind, "headless object created");
        self.objects.push(ObjectRecord::new(kind, resources));
        self.created += 1;
        Ok(object)
    }

    fn check_budget(&self) -> Result<(), HeadlessError> {
        match self.fail_after {
            Some(limit) if self.created >= limit => Err(HeadlessError::Exhausted(self.created)),
            _ => Ok(()),
        }
    }

    fn update(&mut self, object: HeadlessObject, f: impl FnOnce(&mut HeadlessTransform)) {
        if let Some(record) = self.record_mut(object) {
            f(&mut record.transform);
        }
    }
}

impl Materia for HeadlessEngine {
    type Object = HeadlessObject;
    type Resource = HeadlessResource;
    type Error = HeadlessError;

    fn scene_root(&self) -> HeadlessObject {
        HeadlessObject(0)
    }

    fn create_group(&mut self) -> Result<HeadlessObject, HeadlessError> {
        self.check_budget()?;
        self.spawn(HeadlessKind::Group, Vec::new())
    }

    fn create_mesh(
        &mut self,
        geometry: &GeometrySpec,
        material: &MaterialSpec,
    ) -> Result<HeadlessObject, HeadlessError> {
        self.check_budget()?;
        let resources = vec![self.allocate()?, self.allocate()?];
        self.spawn(
            HeadlessKind::Mesh {
                geometry: geometry.clone(),
                material: material.clone(),
            },
            resources,
        )
    }

    fn create_light(
        &mut self,
        kind: LightKind,
        color: Color,
        intensity: f32,
    ) -> Result<HeadlessObject, HeadlessError> {
        self.check_budget()?;
        self.spawn(
            HeadlessKind::Light {
                kind,
                color,
                intensity,
            },
            Vec::new(),
        )
    }

    fn create_camera(&mut self, spec: &CameraSpec) -> Result<HeadlessObject, HeadlessError> {
        self.check_budget()?;
        self.spawn(HeadlessKind::Camera(*spec), Vec::new())
    }

    fn set_position(&mut self, object: HeadlessObject, position: Vec3) {
        self.update(object, |transform| transform.position = position);
    }

    fn set_rotation(&mut self, object: HeadlessObject, radians: Vec3) {
        self.update(object, |transform| transform.rotation = radians);
    }

    fn set_scale(&mut self, object: HeadlessObject, scale: Vec3) {
        self.update(object, |transform| transform.scale = scale);
    }

    fn add_child(&mut self, parent: HeadlessObject, child: HeadlessObject) {
        // An object has a single parent; attaching elsewhere moves it.
        if let Some(previous) = self.parent_of(child) {
            self.remove_child(previous, child);
        }
        if let Some(record) = self.record_mut(parent) {
            record.children.push(child);
        }
        if let Some(record) = self.record_mut(child) {
            record.parent = Some(parent);
        }
    }

    fn remove_child(&mut self, parent: HeadlessObject, child: HeadlessObject) {
        let Some(record) = self.record_mut(parent) else {
            return;
        };
        let before = record.children.len();
        record.children.retain(|&id| id != child);
        if record.children.len() != before {
            if let Some(child) = self.record_mut(child) {
                child.parent = None;
            }
        }
    }

    fn children(&self, object: HeadlessObject) -> Vec<HeadlessObject> {
        self.record(object)
            .map(|record| record.children.clone())
            .unwrap_or_default()
    }

    fn resources(&self, object: HeadlessObject) -> Vec<HeadlessResource> {
        self.record(object)
            .map(|record| record.resources.clone())
            .unwrap_or_default()
    }

    fn release(&mut self, resource: HeadlessResource) {
        if self.live_resources.remove(&resource) {
            self.released.push(resource);
            if let Some(recycled) = &mut self.recycled {
                recycled.push(resource);
            }
        } else {
            self.double_releases += 1;
            warn!(?resource, "resource released twice");
        }
    }

    fn dispose(&mut self, object: HeadlessObject) {
        if let Some(record) = self.record_mut(object) {
            record.disposed = true;
        }
    }

    fn apply_settings(&mut self, settings: &SceneSettings) {
        self.settings = *settings;
    }
}

/// Renderer that counts frames instead of drawing them.
#[derive(Debug, Clone, Default)]
pub struct HeadlessRenderer {
    width: u32,
    height: u32,
    frames: u64,
    last_visible: usize,
    disposed: bool,
}

impl HeadlessRenderer {
    /// Creates a renderer for a surface of the given size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frames: 0,
            last_visible: 0,
            disposed: false,
        }
    }

    /// Surface size.
    #[must_use]
    pub const fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Frames rendered so far.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Objects reachable from the scene root during the last frame.
    #[must_use]
    pub const fn last_visible(&self) -> usize {
        self.last_visible
    }

    /// Returns `true` once [`Renderer::dispose`] has run.
    #[must_use]
    pub const fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Renderer<HeadlessEngine> for HeadlessRenderer {
    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn render(&mut self, engine: &HeadlessEngine) {
        if self.disposed {
            warn!("render called on a disposed renderer");
            return;
        }
        self.last_visible = engine.reachable();
        self.frames += 1;
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }
}

/// Factory producing headless engines.
#[derive(Debug, Clone)]
pub struct HeadlessFactory {
    width: u32,
    height: u32,
    fail: bool,
    created: usize,
}

impl Default for HeadlessFactory {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

impl HeadlessFactory {
    /// Creates a factory whose renderers use the given surface size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            fail: false,
            created: 0,
        }
    }

    /// A factory whose initialization always fails.
    #[must_use]
    pub const fn failing() -> Self {
        let mut factory = Self::new(0, 0);
        factory.fail = true;
        factory
    }

    /// Number of engines created.
    #[must_use]
    pub const fn created(&self) -> usize {
        self.created
    }
}

impl EngineFactory for HeadlessFactory {
    type Engine = HeadlessEngine;
    type Renderer = HeadlessRenderer;
    type Error = HeadlessError;

    fn create(&mut self, mount_id: &str) -> Result<(HeadlessEngine, HeadlessRenderer), HeadlessError> {
        if self.fail {
            return Err(HeadlessError::Init(mount_id.to_owned()));
        }
        self.created += 1;
        Ok((
            HeadlessEngine::new(),
            HeadlessRenderer::new(self.width, self.height),
        ))
    }
}
