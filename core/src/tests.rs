//! Node tree scenarios checked against the headless engine.

use sigil_scene::{Color, GeometrySpec, LightKind, MaterialSpec, Transform};

use crate::{Applier, HeadlessEngine, Materia, NodeId, NodeTree, SceneApplier, TreeError};

fn tree() -> NodeTree<HeadlessEngine> {
    NodeTree::new(HeadlessEngine::new())
}

fn mesh(tree: &mut NodeTree<HeadlessEngine>) -> NodeId {
    tree.create_mesh(&GeometrySpec::fallback(), &MaterialSpec::default())
        .unwrap()
}

fn engine_children(tree: &NodeTree<HeadlessEngine>, node: NodeId) -> Vec<NodeId> {
    let objects = tree.engine().children(tree.object(node).unwrap());
    objects
        .into_iter()
        .map(|object| {
            tree.nodes()
                .find(|&id| tree.object(id) == Some(object))
                .unwrap()
        })
        .collect()
}

/// Builds a chain `root -> g1 -> g2 -> ... -> gD -> mesh` and returns every node below root.
fn chain(tree: &mut NodeTree<HeadlessEngine>, depth: usize) -> Vec<NodeId> {
    let mut nodes = Vec::new();
    let mut parent = tree.root();
    for _ in 0..depth {
        let group = tree.create_group().unwrap();
        tree.insert(parent, 0, group).unwrap();
        nodes.push(group);
        parent = group;
    }
    let leaf = mesh(tree);
    tree.insert(parent, 0, leaf).unwrap();
    nodes.push(leaf);
    nodes
}

#[test]
fn insert_attaches_and_tracks_resources() {
    let mut tree = tree();
    let root = tree.root();
    let a = mesh(&mut tree);
    let b = mesh(&mut tree);

    tree.insert(root, 0, a).unwrap();
    tree.insert(root, 0, b).unwrap();

    assert_eq!(tree.children(root), &[b, a]);
    assert_eq!(tree.parent(a), Some(root));
    assert_eq!(tree.tracked(root).len(), 4);
    assert_eq!(engine_children(&tree, root).len(), 2);
    tree.verify().unwrap();
}

#[test]
fn insert_out_of_bounds_leaves_tree_untouched() {
    let mut tree = tree();
    let root = tree.root();
    let a = mesh(&mut tree);

    assert_eq!(
        tree.insert(root, 1, a),
        Err(TreeError::IndexOutOfBounds { index: 1, len: 0 })
    );
    assert!(tree.children(root).is_empty());
    assert_eq!(tree.parent(a), None);
    tree.verify().unwrap();
}

#[test]
fn reinserting_detaches_from_previous_parent_once() {
    let mut tree = tree();
    let root = tree.root();
    let first = tree.create_group().unwrap();
    let second = tree.create_group().unwrap();
    let leaf = mesh(&mut tree);
    tree.insert(root, 0, first).unwrap();
    tree.insert(root, 1, second).unwrap();
    tree.insert(first, 0, leaf).unwrap();

    tree.insert(second, 0, leaf).unwrap();

    assert!(tree.children(first).is_empty());
    assert!(tree.tracked(first).is_empty());
    assert_eq!(tree.children(second), &[leaf]);
    assert_eq!(tree.tracked(second), tree.resources(leaf));
    assert!(engine_children(&tree, first).is_empty());
    assert_eq!(engine_children(&tree, second), vec![leaf]);
    tree.verify().unwrap();
}

#[test]
fn reinserting_under_same_parent_reorders() {
    let mut tree = tree();
    let root = tree.root();
    let nodes: Vec<NodeId> = (0..3).map(|_| mesh(&mut tree)).collect();
    for (index, &node) in nodes.iter().enumerate() {
        tree.insert(root, index, node).unwrap();
    }

    tree.insert(root, 3, nodes[0]).unwrap();
    assert_eq!(tree.children(root), &[nodes[1], nodes[2], nodes[0]]);

    tree.insert(root, 0, nodes[2]).unwrap();
    assert_eq!(tree.children(root), &[nodes[2], nodes[1], nodes[0]]);
    tree.verify().unwrap();
}

#[test]
fn cycles_and_root_misuse_are_rejected() {
    let mut tree = tree();
    let root = tree.root();
    let nodes = chain(&mut tree, 3);

    assert_eq!(
        tree.insert(nodes[2], 0, nodes[0]),
        Err(TreeError::Cycle {
            parent: nodes[2],
            child: nodes[0]
        })
    );
    assert_eq!(
        tree.insert(nodes[1], 0, nodes[1]),
        Err(TreeError::Cycle {
            parent: nodes[1],
            child: nodes[1]
        })
    );
    assert_eq!(tree.insert(nodes[0], 0, root), Err(TreeError::RootProtected));
    assert_eq!(tree.dispose(root), Err(TreeError::RootProtected));
    assert_eq!(
        tree.insert(root, 0, NodeId::new(40)),
        Err(TreeError::UnknownNode(NodeId::new(40)))
    );
    tree.verify().unwrap();
}

#[test]
fn remove_detaches_without_disposing() {
    let mut tree = tree();
    let root = tree.root();
    let nodes: Vec<NodeId> = (0..4).map(|_| mesh(&mut tree)).collect();
    for (index, &node) in nodes.iter().enumerate() {
        tree.insert(root, index, node).unwrap();
    }

    let removed = tree.remove(root, 1, 2).unwrap();

    assert_eq!(removed, vec![nodes[1], nodes[2]]);
    assert_eq!(tree.children(root), &[nodes[0], nodes[3]]);
    for node in removed {
        assert_eq!(tree.parent(node), None);
        assert!(tree.contains(node));
        for resource in tree.resources(node) {
            assert!(!tree.tracked(root).contains(resource));
            assert!(!tree.is_released(resource));
        }
    }
    assert_eq!(
        tree.remove(root, 1, 2),
        Err(TreeError::RangeOutOfBounds {
            start: 1,
            count: 2,
            len: 2
        })
    );
    assert!(tree.remove(root, usize::MAX, 2).is_err());
    tree.verify().unwrap();
}

#[test]
fn move_follows_composition_convention() {
    let mut tree = tree();
    let root = tree.root();
    let n: Vec<NodeId> = (0..5).map(|_| mesh(&mut tree)).collect();
    for (index, &node) in n.iter().enumerate() {
        tree.insert(root, index, node).unwrap();
    }

    // Forward: the run lands at `to - count`.
    tree.move_children(root, 0, 3, 2).unwrap();
    assert_eq!(tree.children(root), &[n[2], n[0], n[1], n[3], n[4]]);

    // Backward: the run lands at `to`.
    tree.move_children(root, 3, 0, 2).unwrap();
    assert_eq!(tree.children(root), &[n[3], n[4], n[2], n[0], n[1]]);

    // Same position is a no-op.
    tree.move_children(root, 2, 2, 3).unwrap();
    assert_eq!(tree.children(root), &[n[3], n[4], n[2], n[0], n[1]]);

    tree.verify().unwrap();
}

#[test]
fn invalid_moves_are_rejected() {
    let mut tree = tree();
    let root = tree.root();
    for index in 0..3 {
        let node = mesh(&mut tree);
        tree.insert(root, index, node).unwrap();
    }
    let before = tree.children(root).to_vec();

    for (from, to, count) in [(2, 0, 2), (0, 4, 1), (0, 1, 2), (usize::MAX, 0, 1)] {
        assert!(
            matches!(
                tree.move_children(root, from, to, count),
                Err(TreeError::MoveOutOfBounds { .. })
            ),
            "move({from}, {to}, {count}) should fail"
        );
    }
    assert_eq!(tree.children(root), before.as_slice());
}

#[test]
fn dispose_is_idempotent() {
    let mut tree = tree();
    let root = tree.root();
    let nodes = chain(&mut tree, 2);

    tree.dispose(nodes[0]).unwrap();
    let live = tree.live_count();
    let released = tree.engine().released().to_vec();

    tree.dispose(nodes[0]).unwrap();
    tree.dispose(nodes[2]).unwrap();

    assert_eq!(tree.live_count(), live);
    assert_eq!(tree.engine().released(), released.as_slice());
    assert_eq!(tree.engine().double_releases(), 0);
    assert!(tree.children(root).is_empty());
    assert_eq!(
        tree.insert(root, 0, nodes[0]),
        Err(TreeError::Disposed(nodes[0]))
    );
    tree.verify().unwrap();
}

#[test]
fn dispose_runs_bottom_up() {
    let mut tree = tree();
    let nodes = chain(&mut tree, 3);
    let leaf = *nodes.last().unwrap();
    let leaf_resources = tree.resources(leaf).to_vec();

    tree.dispose(nodes[0]).unwrap();

    // The leaf's resources are the first ones released.
    assert_eq!(&tree.engine().released()[..2], leaf_resources.as_slice());
    for node in nodes {
        assert!(tree.is_disposed(node));
        assert!(tree.engine().is_disposed(tree.object(node).unwrap()));
    }
}

#[test]
fn clear_disposes_every_descendant() {
    for depth in [1, 4, 12] {
        let mut tree = tree();
        let root = tree.root();
        let holder = tree.create_group().unwrap();
        tree.insert(root, 0, holder).unwrap();
        let mut nodes = chain(&mut tree, depth);
        // `chain` put its top group in front of `holder`.
        tree.remove(root, 0, 1).unwrap();
        tree.insert(holder, 0, nodes[0]).unwrap();
        let sibling = mesh(&mut tree);
        tree.insert(holder, 1, sibling).unwrap();
        nodes.push(sibling);

        tree.clear(holder).unwrap();

        assert!(tree.children(holder).is_empty());
        assert!(tree.contains(holder));
        for node in &nodes {
            assert!(tree.is_disposed(*node), "depth {depth}: {node:?} still live");
        }
        assert_eq!(tree.engine().live_resources(), 0);
        tree.verify().unwrap();
    }
}

#[test]
fn sweep_reclaims_only_detached_nodes() {
    let mut tree = tree();
    let root = tree.root();
    let kept = chain(&mut tree, 1);
    let orphan = chain(&mut tree, 1);
    tree.remove(root, 0, 1).unwrap();

    // `chain` inserts at index 0, so `orphan` went in front of `kept`.
    assert_eq!(tree.children(root), &[kept[0]]);
    assert_eq!(tree.sweep_detached(), 2);
    assert!(orphan.iter().all(|&node| tree.is_disposed(node)));
    assert!(kept.iter().all(|&node| tree.contains(node)));
    assert_eq!(tree.sweep_detached(), 0);
    tree.verify().unwrap();
}

#[test]
fn dispose_all_keeps_only_the_root() {
    let mut tree = tree();
    chain(&mut tree, 3);
    let stray = tree
        .create_light(LightKind::Directional, Color::WHITE, 1.0)
        .unwrap();

    let disposed = tree.dispose_all();

    assert_eq!(disposed, 5);
    assert!(tree.is_disposed(stray));
    assert_eq!(tree.live_count(), 1);
    assert_eq!(tree.engine().live_objects(), 1);
    assert_eq!(tree.engine().reachable(), 0);
}

#[test]
fn set_transform_converts_degrees() {
    let mut tree = tree();
    let node = mesh(&mut tree);
    tree.set_transform(
        node,
        &Transform::default()
            .with_position([1.0, 2.0, 3.0])
            .with_rotation([180.0, 0.0, 90.0]),
    )
    .unwrap();

    let transform = tree.engine().transform(tree.object(node).unwrap()).unwrap();
    assert_eq!(transform.position, [1.0, 2.0, 3.0]);
    assert!((transform.rotation[0] - core::f32::consts::PI).abs() < 1e-6);
    assert!((transform.rotation[2] - core::f32::consts::FRAC_PI_2).abs() < 1e-6);
    assert_eq!(transform.scale, [1.0; 3]);
}

#[test]
fn mixed_edit_sequence_stays_consistent() {
    let mut tree = tree();
    let root = tree.root();
    let groups: Vec<NodeId> = (0..3).map(|_| tree.create_group().unwrap()).collect();
    for (index, &group) in groups.iter().enumerate() {
        tree.insert(root, index, group).unwrap();
        tree.verify().unwrap();
    }
    let leaves: Vec<NodeId> = (0..6).map(|_| mesh(&mut tree)).collect();
    for (index, &leaf) in leaves.iter().enumerate() {
        let parent = groups[index % 3];
        tree.insert(parent, tree.child_count(parent), leaf).unwrap();
        tree.verify().unwrap();
    }

    tree.move_children(root, 0, 3, 1).unwrap();
    tree.verify().unwrap();
    tree.insert(groups[1], 0, leaves[0]).unwrap();
    tree.verify().unwrap();
    tree.remove(groups[2], 0, 1).unwrap();
    tree.verify().unwrap();
    tree.insert(groups[0], 0, groups[2]).unwrap();
    tree.verify().unwrap();
    tree.clear(groups[1]).unwrap();
    tree.verify().unwrap();
    tree.sweep_detached();
    tree.verify().unwrap();

    assert_eq!(tree.children(root), &[groups[1], groups[0]]);
    assert_eq!(tree.children(groups[0]), &[groups[2], leaves[3]]);
    assert_eq!(tree.children(groups[2]), &[leaves[5]]);
    assert_eq!(tree.engine().double_releases(), 0);
}

#[test]
fn disposed_slots_are_reused() {
    let mut tree = tree();
    let root = tree.root();
    let first = mesh(&mut tree);
    let first_resources = tree.resources(first).to_vec();
    tree.dispose(first).unwrap();

    let mut last = first;
    for _ in 0..1000 {
        let node = mesh(&mut tree);
        tree.insert(root, 0, node).unwrap();
        tree.remove(root, 0, 1).unwrap();
        tree.sweep_detached();
        last = node;
    }

    assert_eq!(tree.live_count(), 1);
    assert_eq!(tree.capacity(), 2);
    assert_eq!(last.index(), first.index());
    assert!(last.generation() > first.generation());
    assert_eq!(tree.engine().live_resources(), 0);
    assert_eq!(tree.engine().double_releases(), 0);
    // Records of recycled slots are dropped.
    assert!(first_resources.iter().all(|r| !tree.is_released(r)));
}

#[test]
fn stale_ids_never_alias_a_reused_slot() {
    let mut tree = tree();
    let root = tree.root();
    let old = mesh(&mut tree);
    tree.dispose(old).unwrap();
    let new = tree.create_group().unwrap();
    tree.insert(root, 0, new).unwrap();

    assert_eq!(old.index(), new.index());
    assert!(tree.is_disposed(old));
    assert!(!tree.contains(old));
    assert_eq!(tree.object(old), None);
    assert_eq!(tree.parent(old), None);
    assert_eq!(tree.insert(root, 0, old), Err(TreeError::Disposed(old)));
    tree.dispose(old).unwrap();
    assert!(tree.contains(new));

    let forged = NodeId::with_generation(new.index(), new.generation() + 1);
    assert_eq!(tree.dispose(forged), Err(TreeError::UnknownNode(forged)));
    tree.verify().unwrap();
}

#[test]
fn reused_engine_handles_are_released_again() {
    let mut engine = HeadlessEngine::new();
    engine.reuse_released_handles();
    let mut tree = NodeTree::new(engine);
    let root = tree.root();

    let keep = tree.create_group().unwrap();
    tree.insert(root, 0, keep).unwrap();
    let first = mesh(&mut tree);
    tree.insert(keep, 0, first).unwrap();
    let handles = tree.resources(first).to_vec();
    tree.dispose(first).unwrap();

    let second = mesh(&mut tree);
    tree.insert(keep, 0, second).unwrap();
    let mut reused = tree.resources(second).to_vec();
    reused.sort();
    let mut expected = handles;
    expected.sort();
    assert_eq!(reused, expected);

    tree.dispose(keep).unwrap();
    assert_eq!(tree.engine().live_resources(), 0);
    assert_eq!(tree.engine().double_releases(), 0);
}

/// Small deterministic generator so edit sequences are reproducible.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.0 >> 33
    }

    fn below(&mut self, bound: usize) -> usize {
        usize::try_from(self.next() % bound as u64).unwrap()
    }
}

fn random_edit(applier: &mut SceneApplier<HeadlessEngine>, rng: &mut Lcg) {
    let live: Vec<NodeId> = applier.tree().nodes().collect();
    let root = applier.tree().root();
    let parent = live[rng.below(live.len())];
    let len = applier.tree().child_count(parent);
    let tree = applier.tree_mut();

    match rng.below(7) {
        0 | 1 => {
            let node = if rng.below(2) == 0 {
                tree.create_group().unwrap()
            } else {
                mesh(tree)
            };
            tree.insert(parent, rng.below(len + 1), node).unwrap();
        }
        2 => {
            let node = live[rng.below(live.len())];
            let result = tree.insert(parent, rng.below(len + 1), node);
            if node == root {
                assert_eq!(result, Err(TreeError::RootProtected));
            } else {
                assert!(
                    matches!(result, Ok(()) | Err(TreeError::Cycle { .. })),
                    "{result:?}"
                );
            }
        }
        3 if len > 0 => {
            let start = rng.below(len);
            let count = 1 + rng.below(len - start);
            let removed = tree.remove(parent, start, count).unwrap();
            assert!(removed.iter().all(|&node| tree.parent(node).is_none()));
        }
        4 if len > 0 => {
            let from = rng.below(len);
            let count = 1 + rng.below(len - from);
            let to = rng.below(len + 1);
            let result = tree.move_children(parent, from, to, count);
            if to > from && to < from + count {
                assert!(matches!(result, Err(TreeError::MoveOutOfBounds { .. })));
            } else {
                result.unwrap();
            }
        }
        5 if rng.below(4) == 0 => tree.clear(parent).unwrap(),
        6 if parent != root => tree.dispose(parent).unwrap(),
        _ => {}
    }
}

#[test]
fn random_edit_sequences_keep_the_mirror_intact() {
    for seed in [1, 7, 42, 2024, 0xDEAD_BEEF] {
        let mut rng = Lcg(seed);
        let mut applier = SceneApplier::with_engine(HeadlessEngine::new());
        let mut peak = 1;

        for _ in 0..40 {
            applier.on_begin_changes();
            for _ in 0..25 {
                random_edit(&mut applier, &mut rng);
                peak = peak.max(applier.tree().live_count());
                applier.tree().verify().unwrap();
            }
            applier.on_end_changes();

            let tree = applier.tree();
            tree.verify().unwrap();
            // After the sweep every live wrapper hangs below the root.
            assert_eq!(tree.engine().reachable(), tree.live_count() - 1, "seed {seed}");
            assert_eq!(tree.engine().double_releases(), 0, "seed {seed}");
        }

        assert!(applier.tree().capacity() <= peak, "seed {seed}");
        applier.clear();
        applier.on_end_changes();
        assert_eq!(applier.tree().engine().live_resources(), 0, "seed {seed}");
    }
}
