//! Hydration scenarios against the headless engine.

use sigil_core::{
    EngineFactory, HeadlessEngine, HeadlessError, HeadlessFactory, HeadlessRenderer,
    ManualScheduler,
};
use sigil_scene::{
    Color, GeometrySpec, LightKind, MaterialSpec, NodeDescription, SceneDescription,
    SceneSettings, Transform,
};

use crate::{
    HydrateOptions, HydrateOutcome, HydrationConfig, HydrationError, HydrationState, Hydrator,
    MarkerStore, MemoryMarkers, StaticPayloads,
};

const MOUNT: &str = "hero";

type TestHydrator<F = HeadlessFactory> = Hydrator<F, MemoryMarkers, StaticPayloads, ManualScheduler>;

fn scene() -> SceneDescription {
    SceneDescription::new(
        vec![
            NodeDescription::light(LightKind::Ambient, Color::new(0x40_4040), 0.4),
            NodeDescription::mesh(
                GeometrySpec::sphere(1.0),
                MaterialSpec::standard(Color::new(0xCC_CCCC)),
            ),
            NodeDescription::group(
                Some(Transform::identity()),
                vec![NodeDescription::mesh(
                    GeometrySpec::cuboid(1.0, 1.0, 1.0),
                    MaterialSpec::default(),
                )],
            ),
        ],
        SceneSettings::default(),
    )
}

fn payloads() -> StaticPayloads {
    StaticPayloads::new().with(MOUNT, scene().to_json().unwrap())
}

fn hydrator() -> (TestHydrator, ManualScheduler) {
    let scheduler = ManualScheduler::new();
    let hydrator = Hydrator::new(
        HeadlessFactory::default(),
        MemoryMarkers::new(),
        payloads(),
        scheduler.clone(),
        HydrationConfig::default(),
    );
    (hydrator, scheduler)
}

/// Factory whose n-th engine refuses objects after the n-th budget, to break
/// rebuilds midway. Engines past the listed budgets are unlimited.
#[derive(Debug)]
struct BudgetFactory {
    budgets: Vec<Option<usize>>,
    created: usize,
}

impl BudgetFactory {
    fn new(budgets: impl Into<Vec<Option<usize>>>) -> Self {
        Self {
            budgets: budgets.into(),
            created: 0,
        }
    }
}

impl EngineFactory for BudgetFactory {
    type Engine = HeadlessEngine;
    type Renderer = HeadlessRenderer;
    type Error = HeadlessError;

    fn create(&mut self, _mount_id: &str) -> Result<(HeadlessEngine, HeadlessRenderer), HeadlessError> {
        let mut engine = HeadlessEngine::new();
        if let Some(&Some(budget)) = self.budgets.get(self.created) {
            engine.fail_after(budget);
        }
        self.created += 1;
        Ok((engine, HeadlessRenderer::new(1, 1)))
    }
}

#[test]
fn hydrating_twice_rebuilds_once() {
    let (mut hydrator, _) = hydrator();

    assert_eq!(
        hydrator.hydrate(MOUNT, HydrateOptions::default()).unwrap(),
        HydrateOutcome::Rebuilt
    );
    assert_eq!(
        hydrator.hydrate(MOUNT, HydrateOptions::default()).unwrap(),
        HydrateOutcome::AlreadyHydrated
    );

    assert_eq!(hydrator.rebuilds(), 1);
    assert_eq!(hydrator.factory().created(), 1);
    assert!(hydrator.is_hydrated(MOUNT));
    assert!(hydrator.markers().is_marked(MOUNT));
}

#[test]
fn rebuilt_graph_matches_payload() {
    let (mut hydrator, _) = hydrator();
    hydrator.hydrate(MOUNT, HydrateOptions::default()).unwrap();

    hydrator
        .with_scene(MOUNT, |tree| {
            tree.verify().unwrap();
            let roots = tree.children(tree.root());
            assert_eq!(roots.len(), 3);
            assert_eq!(tree.child_count(roots[2]), 1);
            assert_eq!(tree.live_count(), 5);
            assert_eq!(tree.engine().reachable(), 4);
        })
        .unwrap();
}

#[test]
fn force_reinitialize_rebuilds_from_scratch() {
    let (mut hydrator, scheduler) = hydrator();
    hydrator.hydrate(MOUNT, HydrateOptions::default()).unwrap();
    scheduler.advance();

    assert_eq!(
        hydrator.hydrate(MOUNT, HydrateOptions::force()).unwrap(),
        HydrateOutcome::Rebuilt
    );

    assert_eq!(hydrator.rebuilds(), 2);
    assert_eq!(hydrator.factory().created(), 2);
    assert_eq!(hydrator.frames(MOUNT), Some(0));
    // Only the new loop has a frame queued.
    assert_eq!(scheduler.pending(), 1);
    assert!(hydrator.is_hydrated(MOUNT));
}

#[test]
fn persisted_marker_is_adopted_without_rebuilding() {
    let (mut hydrator, scheduler) = hydrator();
    hydrator.markers_mut().mark(MOUNT);

    assert_eq!(
        hydrator.hydrate(MOUNT, HydrateOptions::default()).unwrap(),
        HydrateOutcome::Resynchronized
    );

    assert!(hydrator.is_hydrated(MOUNT));
    assert_eq!(hydrator.rebuilds(), 0);
    assert_eq!(hydrator.factory().created(), 0);
    assert!(hydrator.with_scene(MOUNT, |_| ()).is_none());
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn missing_payload_leaves_mount_untouched() {
    let (mut hydrator, _) = hydrator();
    hydrator.payloads_mut().remove(MOUNT);

    let error = hydrator
        .hydrate(MOUNT, HydrateOptions::default())
        .unwrap_err();

    assert!(matches!(error, HydrationError::MissingPayload(_)));
    assert_eq!(hydrator.state(MOUNT), HydrationState::NotHydrated);
    assert!(!hydrator.markers().is_marked(MOUNT));
    assert_eq!(hydrator.factory().created(), 0);
}

#[test]
fn engine_failure_leaves_mount_unrendered() {
    let mut hydrator = Hydrator::new(
        HeadlessFactory::failing(),
        MemoryMarkers::new(),
        payloads(),
        ManualScheduler::new(),
        HydrationConfig::default(),
    );

    let error = hydrator
        .hydrate(MOUNT, HydrateOptions::default())
        .unwrap_err();

    assert!(matches!(error, HydrationError::EngineInit { .. }));
    assert_eq!(hydrator.state(MOUNT), HydrationState::NotHydrated);
    assert!(!hydrator.markers().is_marked(MOUNT));
}

#[test]
fn failed_rebuild_leaves_nothing_attached() {
    let scheduler = ManualScheduler::new();
    let mut hydrator: TestHydrator<BudgetFactory> = Hydrator::new(
        BudgetFactory::new([Some(3)]),
        MemoryMarkers::new(),
        payloads(),
        scheduler.clone(),
        HydrationConfig::default(),
    );

    let error = hydrator
        .hydrate(MOUNT, HydrateOptions::default())
        .unwrap_err();

    assert!(matches!(error, HydrationError::Rebuild { .. }));
    assert_eq!(hydrator.state(MOUNT), HydrationState::NotHydrated);
    assert!(hydrator.with_scene(MOUNT, |_| ()).is_none());
    assert_eq!(hydrator.rebuilds(), 0);
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn failed_forced_rebuild_leaves_mount_unhydrated() {
    let scheduler = ManualScheduler::new();
    let mut hydrator: TestHydrator<BudgetFactory> = Hydrator::new(
        BudgetFactory::new([None, Some(2)]),
        MemoryMarkers::new(),
        payloads(),
        scheduler.clone(),
        HydrationConfig::default(),
    );
    hydrator.hydrate(MOUNT, HydrateOptions::default()).unwrap();
    scheduler.advance();

    let error = hydrator
        .hydrate(MOUNT, HydrateOptions::force())
        .unwrap_err();

    assert!(matches!(error, HydrationError::Rebuild { .. }));
    assert_eq!(hydrator.state(MOUNT), HydrationState::NotHydrated);
    assert!(!hydrator.is_hydrated(MOUNT));
    assert!(!hydrator.markers().is_marked(MOUNT));
    assert!(hydrator.with_scene(MOUNT, |_| ()).is_none());
    assert_eq!(scheduler.pending(), 0);
    assert_eq!(hydrator.rebuilds(), 1);

    // A plain retry gets a fresh engine and succeeds.
    assert_eq!(
        hydrator.hydrate(MOUNT, HydrateOptions::default()).unwrap(),
        HydrateOutcome::Rebuilt
    );
    assert!(hydrator.is_hydrated(MOUNT));
    assert!(hydrator.markers().is_marked(MOUNT));
    assert_eq!(hydrator.rebuilds(), 2);
    assert_eq!(scheduler.pending(), 1);
}

#[test]
fn dispose_stops_loop_before_releasing_scene() {
    let (mut hydrator, scheduler) = hydrator();
    hydrator.hydrate(MOUNT, HydrateOptions::default()).unwrap();
    scheduler.advance();
    scheduler.advance();
    assert_eq!(hydrator.frames(MOUNT), Some(2));

    let report = hydrator.dispose_hydrator(MOUNT).unwrap();

    assert_eq!(report.frames, 2);
    assert_eq!(report.nodes, 4);
    assert_eq!(scheduler.pending(), 0);
    assert_eq!(scheduler.advance(), 0);
    assert_eq!(hydrator.state(MOUNT), HydrationState::Disposed);
    assert!(!hydrator.is_hydrated(MOUNT));
    assert!(!hydrator.markers().is_marked(MOUNT));
    assert!(hydrator.with_scene(MOUNT, |_| ()).is_none());
}

#[test]
fn disposed_mount_needs_force_to_come_back() {
    let (mut hydrator, _) = hydrator();
    hydrator.hydrate(MOUNT, HydrateOptions::default()).unwrap();
    hydrator.dispose_hydrator(MOUNT).unwrap();

    assert_eq!(
        hydrator.hydrate(MOUNT, HydrateOptions::default()).unwrap(),
        HydrateOutcome::Disposed
    );
    assert_eq!(hydrator.rebuilds(), 1);

    assert_eq!(
        hydrator.hydrate(MOUNT, HydrateOptions::force()).unwrap(),
        HydrateOutcome::Rebuilt
    );
    assert!(hydrator.is_hydrated(MOUNT));
}

#[test]
fn disposing_an_unknown_mount_is_a_noop() {
    let (mut hydrator, _) = hydrator();
    assert!(hydrator.dispose_hydrator("elsewhere").is_none());
    assert_eq!(hydrator.state("elsewhere"), HydrationState::NotHydrated);

    // Disposing twice only reports the first teardown.
    hydrator.hydrate(MOUNT, HydrateOptions::default()).unwrap();
    assert!(hydrator.dispose_hydrator(MOUNT).is_some_and(|r| r.nodes == 4));
    assert!(hydrator.dispose_hydrator(MOUNT).is_some_and(|r| r.nodes == 0));
}

#[test]
fn render_now_without_loop() {
    let mut hydrator = Hydrator::new(
        HeadlessFactory::default(),
        MemoryMarkers::new(),
        payloads(),
        ManualScheduler::new(),
        HydrationConfig {
            start_render_loop: false,
            viewport: None,
        },
    );
    assert!(!hydrator.render_now(MOUNT));
    hydrator.hydrate(MOUNT, HydrateOptions::default()).unwrap();

    assert_eq!(hydrator.frames(MOUNT), None);
    assert!(hydrator.render_now(MOUNT));
}
