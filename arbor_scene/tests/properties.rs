// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end behavior of the scene: propagation, caching, hit testing, events, lifecycle.

use std::cell::Cell;
use std::rc::Rc;

use arbor_events::alias::{TAP, primitive};
use arbor_geometry::ObservablePoint;
use arbor_scene::{
    DestroyOptions, Listen, ListenOptions, NodeDesc, NodeEvent, NodeId, Phase, Scene,
    SceneHandler, TransformParts,
};
use kurbo::{Point, Rect, Vec2};

fn counter() -> (Rc<Cell<u32>>, SceneHandler) {
    let hits = Rc::new(Cell::new(0));
    let h = {
        let hits = hits.clone();
        SceneHandler::new(move |_, _| hits.set(hits.get() + 1))
    };
    (hits, h)
}

fn rect_at(scene: &mut Scene, x: f64, y: f64, w: f64, h: f64) -> NodeId {
    let n = scene.create(NodeDesc::leaf(Rect::new(0.0, 0.0, w, h)));
    scene.set_position(n, (x, y));
    n
}

#[test]
fn world_alpha_is_product_along_the_chain() {
    let mut scene = Scene::new();
    let alphas = [0.9, 0.5, 1.0, 0.25, 0.8];
    let mut chain = Vec::new();
    for (i, &alpha) in alphas.iter().enumerate() {
        let n = scene.create(NodeDesc::container());
        scene.set_alpha(n, alpha);
        if i > 0 {
            scene.add_child(chain[i - 1], n).unwrap();
        }
        chain.push(n);
    }
    scene.update_transform(chain[0]);

    let mut expected = 1.0;
    for (&n, &alpha) in chain.iter().zip(&alphas) {
        expected *= alpha;
        let got = scene.world_alpha(n).unwrap();
        assert!((got - expected).abs() < 1e-12, "{got} != {expected}");
    }
}

#[test]
fn to_local_inverts_to_global() {
    let mut scene = Scene::new();
    let root = scene.create(NodeDesc::container());
    let mid = scene.create(NodeDesc::container());
    let leaf = rect_at(&mut scene, 0.0, 0.0, 1.0, 1.0);
    scene.add_child(root, mid).unwrap();
    scene.add_child(mid, leaf).unwrap();

    let configs = [
        (Point::new(10.0, -4.0), Vec2::new(2.0, 0.5), 0.3, Vec2::ZERO),
        (Point::new(-3.0, 7.5), Vec2::new(-1.0, 3.0), 2.1, Vec2::new(0.2, -0.1)),
        (Point::new(0.0, 0.0), Vec2::new(0.01, 100.0), -1.2, Vec2::new(0.0, 0.4)),
    ];
    for (position, scale, rotation, skew) in configs {
        let parts = TransformParts {
            position,
            scale,
            rotation,
            skew,
            pivot: Point::new(1.0, 2.0),
        };
        scene.set_transform(mid, parts);
        scene.set_rotation(leaf, rotation / 2.0);

        for p in [Point::ZERO, Point::new(3.5, -8.0), Point::new(1e3, 1e-3)] {
            let global = scene.to_global(leaf, p, false).unwrap();
            let back = scene.to_local(leaf, global, None, false).unwrap();
            let tol = 1e-9 * (1.0 + p.x.abs().max(p.y.abs()));
            assert!((back - p).hypot() < tol, "{p:?} -> {global:?} -> {back:?}");
        }
    }
}

#[test]
fn observable_point_notifies_once_per_distinct_write() {
    let fired = Rc::new(Cell::new(0));
    let mut point = {
        let fired = fired.clone();
        ObservablePoint::with_callback(0.0, 0.0, move || fired.set(fired.get() + 1))
    };
    point.set_x(5.0);
    point.set_x(5.0);
    assert_eq!(fired.get(), 1);

    point.set(5.0, Some(0.0));
    assert_eq!(fired.get(), 1);
    point.set(2.0, None);
    assert_eq!(fired.get(), 2);
    assert_eq!(point.get(), Point::new(2.0, 2.0));
}

#[test]
fn bounds_are_cached_until_a_transform_changes() {
    let mut scene = Scene::new();
    let n = rect_at(&mut scene, 0.0, 0.0, 10.0, 10.0);
    scene.update_transform(n);

    let first = scene.get_bounds(n, true);
    let second = scene.get_bounds(n, true);
    assert_eq!(first, second);

    scene.set_position(n, (4.0, 0.0));
    scene.update_transform(n);
    let moved = scene.get_bounds(n, true);
    assert_ne!(moved, first);
    assert_eq!(moved, Rect::new(4.0, 0.0, 14.0, 10.0));
}

#[test]
fn hit_test_cases() {
    let mut scene = Scene::new();
    let a = rect_at(&mut scene, 0.0, 0.0, 10.0, 10.0);
    let b = rect_at(&mut scene, 5.0, 5.0, 10.0, 10.0);
    let far = rect_at(&mut scene, 20.0, 20.0, 10.0, 10.0);
    let inner = rect_at(&mut scene, 4.0, 4.0, 2.0, 2.0);

    assert!(scene.hit_test(a, b));
    assert!(!scene.hit_test(a, far));
    // No edges cross; only containment can detect this.
    assert!(scene.hit_test(a, inner));
    assert!(scene.hit_test(inner, a));
}

#[test]
fn tap_alias_fans_out_and_removes_both() {
    let mut scene = Scene::new();
    let n = rect_at(&mut scene, 0.0, 0.0, 1.0, 1.0);
    let (hits, h) = counter();
    scene.on(n, TAP, &h, ListenOptions::default());

    let mut event = NodeEvent::new(n);
    scene.emit(n, primitive::CLICK, Phase::Bubble, &mut event);
    assert_eq!(hits.get(), 1);
    scene.emit(n, primitive::TAP, Phase::Bubble, &mut event);
    assert_eq!(hits.get(), 2);

    scene.off(n, TAP, &h, None);
    assert!(!scene.has_listeners(n, primitive::CLICK));
    assert!(!scene.has_listeners(n, primitive::TAP));
    scene.emit(n, primitive::CLICK, Phase::Bubble, &mut event);
    assert_eq!(hits.get(), 2);
}

#[test]
fn capture_and_bubble_listeners_are_filtered_by_phase() {
    let mut scene = Scene::new();
    let n = rect_at(&mut scene, 0.0, 0.0, 1.0, 1.0);
    let (captured, on_capture) = counter();
    let (bubbled, on_bubble) = counter();
    scene.on(n, "press", &on_capture, ListenOptions::capture());
    scene.on(n, "press", &on_bubble, ListenOptions::default());

    let mut event = NodeEvent::new(n);
    scene.emit(n, "press", Phase::Bubble, &mut event);
    assert_eq!((captured.get(), bubbled.get()), (0, 1));
    scene.emit(n, "press", Phase::Capture, &mut event);
    assert_eq!((captured.get(), bubbled.get()), (1, 1));
    // No discriminator reaches everyone.
    scene.emit(n, "press", Phase::Target, &mut event);
    assert_eq!((captured.get(), bubbled.get()), (2, 2));

    scene.off(n, "press", &on_capture, Some(Listen::Bubble));
    assert_eq!(scene.listener_count(n, "press"), 2);
}

#[test]
fn destroyed_nodes_read_as_defaults() {
    let mut scene = Scene::new();
    let root = scene.create(NodeDesc::container());
    let child = rect_at(&mut scene, 0.0, 0.0, 5.0, 5.0);
    scene.add_child(root, child).unwrap();
    let (hits, h) = counter();
    scene.on(child, "press", &h, ListenOptions::both());

    scene.destroy(child, DestroyOptions::default());
    assert!(scene.is_destroyed(child));
    assert_eq!(scene.world_transform(child), None);
    assert_eq!(scene.get_bounds(child, false), Rect::ZERO);
    assert_eq!(scene.get_local_bounds(child), Rect::ZERO);
    assert_eq!(scene.to_global(child, Point::ZERO, false), None);
    assert!(scene.children_of(root).is_empty());
    assert!(!scene.has_listeners(child, "press"));

    // Writes are ignored, and a second destroy is harmless.
    scene.set_position(child, (1.0, 1.0));
    scene.set_alpha(child, 0.5);
    scene.destroy(child, DestroyOptions { children: true });
    scene.emit(child, "press", Phase::Target, &mut NodeEvent::new(child));
    assert_eq!(hits.get(), 0);
    assert_eq!(scene.get_bounds(root, false), Rect::ZERO);
}
