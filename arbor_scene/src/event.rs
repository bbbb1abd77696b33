// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node listeners and capture → target → bubble routing.
//!
//! Every node owns an [`EventDispatcher`](arbor_events::dispatcher::EventDispatcher) whose
//! handlers receive the whole [`Scene`] by mutable reference. [`Scene::dispatch`] walks the
//! path from the root to a target the way a DOM-style router does:
//!
//! - Capture: ancestors, root first.
//! - Target: the target node only. Every listener on it fires.
//! - Bubble: ancestors, parent first.
//!
//! The path is captured before the first handler runs. Handlers may restructure the tree or
//! destroy nodes; destroyed nodes are skipped, and the remaining path is still walked.
//!
//! ```
//! use arbor_scene::{NodeDesc, NodeEvent, Scene, SceneHandler};
//! use arbor_scene::{ListenOptions, Outcome};
//! use kurbo::Rect;
//!
//! let mut scene = Scene::new();
//! let root = scene.create(NodeDesc::container());
//! let button = scene.create(NodeDesc::leaf(Rect::new(0.0, 0.0, 10.0, 10.0)));
//! scene.add_child(root, button).unwrap();
//!
//! // Hide the button when the root sees a click bubble up from it.
//! let hide: SceneHandler = SceneHandler::new(|scene, ev| {
//!     scene.set_visible(ev.payload.target, false);
//! });
//! scene.on(root, "click", &hide, ListenOptions::default());
//!
//! let outcome = scene.dispatch(button, "click", &mut NodeEvent::new(button));
//! assert_eq!(outcome, Outcome::Continue);
//! assert!(!scene.visible(button));
//! ```

use arbor_events::dispatcher::{Handler, run};
use arbor_events::types::{Listen, ListenOptions, Outcome, Phase};
use kurbo::Point;

use crate::scene::Scene;
use crate::types::NodeId;

/// Emitted on a child (target phase) after it was attached; `related` is the new parent.
pub const ADDED: &str = "added";
/// Emitted on a child (target phase) after it was detached; `related` is the old parent.
pub const REMOVED: &str = "removed";

/// Handler type for node listeners.
pub type SceneHandler = Handler<Scene, NodeEvent>;

/// Payload delivered to node listeners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeEvent {
    /// Node the event was dispatched to.
    pub target: NodeId,
    /// Node whose listeners are running.
    pub current_target: NodeId,
    /// Secondary node, such as the parent for [`ADDED`]/[`REMOVED`].
    pub related: Option<NodeId>,
    /// Pointer position in world space, if the event has one.
    pub global: Point,
    /// Identifier of the pointer or touch point, if any.
    pub pointer_id: Option<u32>,
}

impl NodeEvent {
    /// An event aimed at `target` with no position.
    pub fn new(target: NodeId) -> Self {
        Self {
            target,
            current_target: target,
            related: None,
            global: Point::ZERO,
            pointer_id: None,
        }
    }

    /// An event aimed at `target` at a world-space position.
    pub fn at(target: NodeId, global: Point) -> Self {
        Self {
            global,
            ..Self::new(target)
        }
    }

    /// Same event with a related node.
    pub fn with_related(mut self, related: NodeId) -> Self {
        self.related = Some(related);
        self
    }

    /// Same event with a pointer identifier.
    pub fn with_pointer(mut self, pointer_id: u32) -> Self {
        self.pointer_id = Some(pointer_id);
        self
    }
}

impl Scene {
    /// Register `handler` on `id` for `name` (alias names register both primitives).
    pub fn on(&mut self, id: NodeId, name: &str, handler: &SceneHandler, options: ListenOptions) {
        match self.node_opt_mut(id) {
            Some(n) => n.events.on(name, handler, options),
            None => tracing::trace!(?id, name, "listener on stale node ignored"),
        }
    }

    /// Register a listener that removes itself before its first invocation.
    pub fn once(&mut self, id: NodeId, name: &str, handler: &SceneHandler, options: ListenOptions) {
        match self.node_opt_mut(id) {
            Some(n) => n.events.once(name, handler, options),
            None => tracing::trace!(?id, name, "listener on stale node ignored"),
        }
    }

    /// Unregister `handler` from `id`. With `listen` set, only that phase's registration goes.
    ///
    /// A handler is always required; use [`Scene::remove_all_listeners`] to clear a name.
    pub fn off(&mut self, id: NodeId, name: &str, handler: &SceneHandler, listen: Option<Listen>) {
        if let Some(n) = self.node_opt_mut(id) {
            n.events.off(name, handler, listen);
        }
    }

    /// Drop the listeners for `name` on `id`, or all of them with `None`.
    pub fn remove_all_listeners(&mut self, id: NodeId, name: Option<&str>) {
        if let Some(n) = self.node_opt_mut(id) {
            n.events.remove_all(name);
        }
    }

    /// Whether `id` has listeners for the primitive `name`.
    pub fn has_listeners(&self, id: NodeId, name: &str) -> bool {
        self.node_opt(id).is_some_and(|n| n.events.has_listeners(name))
    }

    /// Number of listeners on `id` for the primitive `name`.
    pub fn listener_count(&self, id: NodeId, name: &str) -> usize {
        self.node_opt(id).map_or(0, |n| n.events.listener_count(name))
    }

    /// Deliver `event` to the listeners of a single node in `phase`.
    ///
    /// Sets `current_target` to `id`. A stale `id` delivers nothing and returns
    /// [`Outcome::Continue`].
    pub fn emit(&mut self, id: NodeId, name: &str, phase: Phase, event: &mut NodeEvent) -> Outcome {
        let Some(node) = self.node_opt(id) else {
            tracing::trace!(?id, name, "emit on stale node ignored");
            return Outcome::Continue;
        };
        let snapshot = node.events.matching(name, phase);
        if snapshot.is_empty() {
            return Outcome::Continue;
        }
        event.current_target = id;
        run(self, &snapshot, name, phase, event, |scene, reg| {
            scene
                .node_opt_mut(id)
                .is_some_and(|n| n.events.retire(name, reg))
        })
    }

    /// Route `event` from the root of `target`'s tree down to `target` and back up.
    ///
    /// Returns [`Outcome::Stop`] if a handler stopped propagation; the remaining nodes are not
    /// visited (listeners left on the stopping node still run unless the stop was immediate).
    pub fn dispatch(&mut self, target: NodeId, name: &str, event: &mut NodeEvent) -> Outcome {
        let path = self.path_to(target);
        let Some((&target, ancestors)) = path.split_last() else {
            tracing::trace!(?target, name, "dispatch to stale node ignored");
            return Outcome::Continue;
        };
        event.target = target;

        for &n in ancestors {
            if self.emit(n, name, Phase::Capture, event) == Outcome::Stop {
                return Outcome::Stop;
            }
        }
        if self.emit(target, name, Phase::Target, event) == Outcome::Stop {
            return Outcome::Stop;
        }
        for &n in ancestors.iter().rev() {
            if self.emit(n, name, Phase::Bubble, event) == Outcome::Stop {
                return Outcome::Stop;
            }
        }
        Outcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DestroyOptions, NodeDesc};
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    type Log = Rc<RefCell<Vec<(&'static str, Phase)>>>;

    fn recorder(log: &Log, tag: &'static str) -> SceneHandler {
        let log = log.clone();
        SceneHandler::new(move |_, ev| log.borrow_mut().push((tag, ev.phase())))
    }

    fn chain(scene: &mut Scene) -> (NodeId, NodeId, NodeId) {
        let root = scene.create(NodeDesc::container());
        let mid = scene.create(NodeDesc::container());
        let leaf = scene.create(NodeDesc::container());
        scene.add_child(root, mid).unwrap();
        scene.add_child(mid, leaf).unwrap();
        (root, mid, leaf)
    }

    #[test]
    fn capture_target_bubble_order() {
        let mut scene = Scene::new();
        let (root, mid, leaf) = chain(&mut scene);
        let log = Log::default();
        for (id, tag) in [(root, "root"), (mid, "mid"), (leaf, "leaf")] {
            scene.on(id, "press", &recorder(&log, tag), ListenOptions::both());
        }

        let outcome = scene.dispatch(leaf, "press", &mut NodeEvent::new(leaf));
        assert_eq!(outcome, Outcome::Continue);
        assert_eq!(
            *log.borrow(),
            [
                ("root", Phase::Capture),
                ("mid", Phase::Capture),
                ("leaf", Phase::Target),
                ("mid", Phase::Bubble),
                ("root", Phase::Bubble),
            ]
        );
    }

    #[test]
    fn listeners_only_see_their_phase() {
        let mut scene = Scene::new();
        let (root, _, leaf) = chain(&mut scene);
        let log = Log::default();
        scene.on(root, "press", &recorder(&log, "capture"), ListenOptions::capture());
        scene.on(root, "press", &recorder(&log, "bubble"), ListenOptions::default());

        scene.dispatch(leaf, "press", &mut NodeEvent::new(leaf));
        assert_eq!(
            *log.borrow(),
            [("capture", Phase::Capture), ("bubble", Phase::Bubble)]
        );
    }

    #[test]
    fn stop_in_capture_skips_target_and_bubble() {
        let mut scene = Scene::new();
        let (root, mid, leaf) = chain(&mut scene);
        let log = Log::default();
        let stopper = SceneHandler::new(|_, ev| ev.stop_propagation());
        scene.on(mid, "press", &stopper, ListenOptions::capture());
        scene.on(mid, "press", &recorder(&log, "mid"), ListenOptions::capture());
        scene.on(leaf, "press", &recorder(&log, "leaf"), ListenOptions::default());
        scene.on(root, "press", &recorder(&log, "root"), ListenOptions::default());

        let outcome = scene.dispatch(leaf, "press", &mut NodeEvent::new(leaf));
        assert_eq!(outcome, Outcome::Stop);
        // Sibling listeners on the stopping node still run.
        assert_eq!(*log.borrow(), [("mid", Phase::Capture)]);
    }

    #[test]
    fn current_target_tracks_the_running_node() {
        let mut scene = Scene::new();
        let (root, _, leaf) = chain(&mut scene);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let h = SceneHandler::new(move |_, ev| {
            s.borrow_mut()
                .push((ev.payload.target, ev.payload.current_target));
        });
        scene.on(root, "press", &h, ListenOptions::default());
        scene.on(leaf, "press", &h, ListenOptions::default());
        scene.dispatch(leaf, "press", &mut NodeEvent::new(leaf));
        assert_eq!(*seen.borrow(), [(leaf, leaf), (leaf, root)]);
    }

    #[test]
    fn nodes_destroyed_mid_dispatch_are_skipped() {
        let mut scene = Scene::new();
        let (root, mid, leaf) = chain(&mut scene);
        let log = Log::default();
        let destroy_mid = SceneHandler::new(move |scene, _| {
            scene.destroy(mid, DestroyOptions::default());
        });
        scene.on(leaf, "press", &destroy_mid, ListenOptions::default());
        scene.on(mid, "press", &recorder(&log, "mid"), ListenOptions::default());
        scene.on(root, "press", &recorder(&log, "root"), ListenOptions::default());

        scene.dispatch(leaf, "press", &mut NodeEvent::new(leaf));
        assert_eq!(*log.borrow(), [("root", Phase::Bubble)]);
        assert!(scene.is_destroyed(mid));
        assert!(scene.is_alive(leaf));
    }

    #[test]
    fn once_listener_fires_once_across_dispatches() {
        let mut scene = Scene::new();
        let (_, _, leaf) = chain(&mut scene);
        let log = Log::default();
        scene.once(leaf, "press", &recorder(&log, "once"), ListenOptions::default());
        scene.dispatch(leaf, "press", &mut NodeEvent::new(leaf));
        scene.dispatch(leaf, "press", &mut NodeEvent::new(leaf));
        assert_eq!(log.borrow().len(), 1);
        assert!(!scene.has_listeners(leaf, "press"));
    }

    #[test]
    fn structural_events_carry_the_parent() {
        let mut scene = Scene::new();
        let a = scene.create(NodeDesc::container());
        let b = scene.create(NodeDesc::container());
        let c = scene.create(NodeDesc::container());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let h = SceneHandler::new(move |_, ev| {
            s.borrow_mut().push((ev.name() == ADDED, ev.payload.related));
        });
        scene.on(c, ADDED, &h, ListenOptions::default());
        scene.on(c, REMOVED, &h, ListenOptions::default());

        scene.add_child(a, c).unwrap();
        scene.add_child(b, c).unwrap();
        scene.remove_child(b, c);
        assert_eq!(
            *seen.borrow(),
            [
                (true, Some(a)),
                (false, Some(a)),
                (true, Some(b)),
                (false, Some(b)),
            ]
        );
    }

    #[test]
    fn destroy_drops_listeners_and_stale_emit_is_silent() {
        let mut scene = Scene::new();
        let (_, _, leaf) = chain(&mut scene);
        let log = Log::default();
        scene.on(leaf, "press", &recorder(&log, "leaf"), ListenOptions::default());
        scene.destroy(leaf, DestroyOptions::default());
        assert_eq!(
            scene.emit(leaf, "press", Phase::Target, &mut NodeEvent::new(leaf)),
            Outcome::Continue
        );
        assert_eq!(scene.listener_count(leaf, "press"), 0);
        assert!(log.borrow().is_empty());
    }
}
