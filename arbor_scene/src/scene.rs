// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core scene implementation: arena, structure, transform propagation, lifecycle.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::ops::{Bound, RangeBounds};

use arbor_events::dispatcher::EventDispatcher;
use arbor_events::types::Phase;
use arbor_geometry::{Bounds, ParentFrame, Transform, TransformParts};
use kurbo::{Affine, Point, Rect, Vec2};

use crate::error::SceneError;
use crate::event::{ADDED, NodeEvent, REMOVED};
use crate::types::{DestroyOptions, FilterId, NodeDesc, NodeFlags, NodeId, NodeKind, NodeTag};

/// Arena of display nodes.
///
/// Nodes are created detached ([`Scene::create`]) and attached under containers with
/// [`Scene::add_child`] and friends. A node's world transform, world alpha and bounds are
/// derived state: mutating a node's transform components only marks it dirty, and the derived
/// values catch up on [`Scene::update_transform`] (usually once per frame from the roots), or
/// on demand in [`Scene::get_bounds`] and [`Scene::to_global`].
///
/// ## Example
///
/// ```rust
/// use arbor_scene::{NodeDesc, Scene};
/// use kurbo::{Point, Rect};
///
/// let mut scene = Scene::new();
/// let root = scene.create(NodeDesc::container());
/// let leaf = scene.create(NodeDesc::leaf(Rect::new(0.0, 0.0, 10.0, 10.0)));
/// scene.add_child(root, leaf).unwrap();
///
/// scene.set_position(root, (100.0, 0.0));
/// scene.set_scale(leaf, 2.0, None);
/// scene.update_transforms();
///
/// assert_eq!(scene.get_bounds(leaf, true), Rect::new(100.0, 0.0, 120.0, 20.0));
/// assert_eq!(scene.to_global(leaf, Point::new(1.0, 1.0), true), Some(Point::new(102.0, 2.0)));
/// ```
pub struct Scene {
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    /// Bumped once per bounds invalidation sweep; see [`Scene::invalidate_bounds`].
    invalidation_epoch: u64,
}

impl core::fmt::Debug for Scene {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("Scene")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &self.free_list.len())
            .finish_non_exhaustive()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub(crate) struct Node {
    generation: u32,
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) transform: Transform,
    pub(crate) alpha: f64,
    pub(crate) world_alpha: f64,
    pub(crate) flags: NodeFlags,
    pub(crate) content: Option<Rect>,
    /// World-space envelope of content and renderable descendants.
    pub(crate) bounds: Bounds,
    /// `bounds.update_id()` at the last recomputation.
    pub(crate) bounds_id: Option<u64>,
    invalidated_in: u64,
    pub(crate) mask: Option<NodeId>,
    /// The node this one masks, if any.
    pub(crate) mask_owner: Option<NodeId>,
    pub(crate) filters: Option<Vec<FilterId>>,
    pub(crate) filter_area: Option<Rect>,
    name: Option<String>,
    tag: Option<NodeTag>,
    pub(crate) events: EventDispatcher<Scene, NodeEvent>,
}

impl Node {
    fn new(generation: u32, desc: NodeDesc) -> Self {
        Self {
            generation,
            kind: desc.kind,
            parent: None,
            children: Vec::new(),
            transform: Transform::from_parts(desc.transform),
            alpha: desc.alpha,
            world_alpha: 1.0,
            flags: desc.flags - NodeFlags::IS_MASK,
            content: desc.content,
            bounds: Bounds::new(),
            bounds_id: None,
            invalidated_in: 0,
            mask: None,
            mask_owner: None,
            filters: None,
            filter_area: None,
            name: desc.name,
            tag: desc.tag,
            events: EventDispatcher::new(),
        }
    }

    pub(crate) fn bounds_valid(&self) -> bool {
        self.bounds_id == Some(self.bounds.update_id())
    }

    pub(crate) fn is_drawn(&self) -> bool {
        self.flags.contains(NodeFlags::VISIBLE | NodeFlags::RENDERABLE)
    }
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            invalidation_epoch: 0,
        }
    }

    /// Create a detached node.
    ///
    /// The node's world state is identity with world alpha 1 until its first update.
    pub fn create(&mut self, desc: NodeDesc) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, desc));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, desc)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        NodeId::new(idx, generation)
    }

    /// Returns true if `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node_opt(id).is_some()
    }

    /// Returns true if `id` was destroyed (or never belonged to this scene).
    pub fn is_destroyed(&self, id: NodeId) -> bool {
        !self.is_alive(id)
    }

    pub(crate) fn node_opt(&self, id: NodeId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.1).then_some(n)
    }

    pub(crate) fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    /// Like [`Scene::node_opt_mut`], but traces the ignored operation on a stale handle.
    fn live_mut(&mut self, id: NodeId, op: &'static str) -> Option<&mut Node> {
        let node = self.node_opt_mut(id);
        if node.is_none() {
            tracing::trace!(?id, op, "stale node ignored");
        }
        node
    }

    // --- structure ---

    /// Whether `id` can hold children. `None` for stale ids.
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.node_opt(id).map(|n| n.kind)
    }

    /// Returns the parent of a node if live, or `None` for roots or stale ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|n| n.parent)
    }

    /// Get the children of a node in paint order, or an empty slice if the node is stale.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.node_opt(id).map_or(&[], |n| &n.children)
    }

    /// Live nodes without a parent.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().enumerate().filter_map(|(i, n)| match n {
            Some(n) if n.parent.is_none() =>
            {
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "NodeId uses 32-bit indices by design."
                )]
                Some(NodeId::new(i as u32, n.generation))
            }
            _ => None,
        })
    }

    /// Ancestors of `id`, parent first. Excludes `id` itself.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        core::iter::successors(self.parent_of(id), move |&p| self.parent_of(p))
    }

    /// Whether `ancestor` is a strict ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// Path from the root of `id`'s tree down to `id` (inclusive).
    ///
    /// Empty for stale ids. The path is captured before any caller mutation, so walking it
    /// stays well defined even if handlers restructure the tree meanwhile.
    pub fn path_to(&self, id: NodeId) -> Vec<NodeId> {
        if !self.is_alive(id) {
            return Vec::new();
        }
        let mut path = vec![id];
        path.extend(self.ancestors(id));
        path.reverse();
        path
    }

    fn container(&self, id: NodeId) -> Result<&Node, SceneError> {
        let node = self.node_opt(id).ok_or(SceneError::StaleNode(id))?;
        if node.kind == NodeKind::Leaf {
            tracing::warn!(?id, "leaf cannot hold children");
            return Err(SceneError::InvalidArgument(
                "target is a leaf and cannot hold children",
            ));
        }
        Ok(node)
    }

    /// Append `child` to `parent`'s children, detaching it from any previous parent first.
    ///
    /// Emits [`REMOVED`](crate::REMOVED) (when it had a parent) and then
    /// [`ADDED`](crate::ADDED) on the child, with the respective parent as `related`.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        let len = self.container(parent)?.children.len();
        self.add_child_at(parent, child, len)
    }

    /// Insert `child` at `index` in `parent`'s children.
    ///
    /// `index` may equal the current child count. When the child already belongs to `parent`,
    /// the index is clamped after its removal.
    pub fn add_child_at(
        &mut self,
        parent: NodeId,
        child: NodeId,
        index: usize,
    ) -> Result<(), SceneError> {
        let len = self.container(parent)?.children.len();
        if !self.is_alive(child) {
            return Err(SceneError::StaleNode(child));
        }
        if index > len {
            return Err(SceneError::IndexOutOfBounds { index, len });
        }
        if child == parent || self.is_ancestor(child, parent) {
            tracing::warn!(?parent, ?child, "rejected attachment that would form a cycle");
            return Err(SceneError::InvalidArgument(
                "a node cannot be attached to itself or to one of its descendants",
            ));
        }

        let old_parent = self.unlink(child);
        let index = index.min(self.children_of(parent).len());
        self.link(parent, child, index);
        tracing::debug!(?parent, ?child, index, "child added");

        if let Some(old) = old_parent {
            self.emit_structural(child, REMOVED, old);
        }
        self.emit_structural(child, ADDED, parent);
        Ok(())
    }

    /// Attach `child` under `parent` (appending), like [`Scene::add_child`] seen from the child.
    ///
    /// Fails with [`SceneError::InvalidArgument`] when `parent` is a leaf, since attachment must
    /// not silently do nothing.
    pub fn set_parent(&mut self, child: NodeId, parent: NodeId) -> Result<(), SceneError> {
        if !self.is_alive(child) {
            return Err(SceneError::StaleNode(child));
        }
        self.add_child(parent, child)
    }

    /// Detach `child` from `parent`. Returns false when it is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self.parent_of(child) != Some(parent) {
            tracing::trace!(?parent, ?child, "remove_child: not a child");
            return false;
        }
        self.detach(child);
        true
    }

    /// Detach and return the child at `index`.
    pub fn remove_child_at(&mut self, parent: NodeId, index: usize) -> Result<NodeId, SceneError> {
        let node = self.node_opt(parent).ok_or(SceneError::StaleNode(parent))?;
        let child = node
            .children
            .get(index)
            .copied()
            .ok_or(SceneError::IndexOutOfBounds {
                index,
                len: node.children.len(),
            })?;
        self.detach(child);
        Ok(child)
    }

    /// Detach the children in `range` and return them in their former order.
    ///
    /// An empty range is valid. `removed` is emitted on each child after all of them were
    /// detached.
    pub fn remove_children(
        &mut self,
        parent: NodeId,
        range: impl RangeBounds<usize>,
    ) -> Result<Vec<NodeId>, SceneError> {
        let node = self
            .node_opt_mut(parent)
            .ok_or(SceneError::StaleNode(parent))?;
        let len = node.children.len();
        let begin = match range.start_bound() {
            Bound::Included(&b) => b,
            Bound::Excluded(&b) => b.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => e.saturating_add(1),
            Bound::Excluded(&e) => e,
            Bound::Unbounded => len,
        };
        if begin > end || end > len {
            return Err(SceneError::IndexOutOfBounds {
                index: end.max(begin),
                len,
            });
        }

        let removed: Vec<NodeId> = node.children.drain(begin..end).collect();
        for &child in &removed {
            if let Some(c) = self.node_opt_mut(child) {
                c.parent = None;
                c.transform.invalidate_parent();
            }
        }
        if !removed.is_empty() {
            self.invalidate_bounds(parent);
            tracing::debug!(?parent, count = removed.len(), "children removed");
        }
        for &child in &removed {
            self.emit_structural(child, REMOVED, parent);
        }
        Ok(removed)
    }

    /// Child at `index`, if any.
    pub fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        self.children_of(parent).get(index).copied()
    }

    /// Position of `child` in `parent`'s children.
    pub fn child_index(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.children_of(parent).iter().position(|&c| c == child)
    }

    /// Move `child` to `index` among its siblings.
    pub fn set_child_index(
        &mut self,
        parent: NodeId,
        child: NodeId,
        index: usize,
    ) -> Result<(), SceneError> {
        let node = self
            .node_opt_mut(parent)
            .ok_or(SceneError::StaleNode(parent))?;
        let len = node.children.len();
        if index >= len {
            return Err(SceneError::IndexOutOfBounds { index, len });
        }
        let current = node
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or(SceneError::InvalidArgument("node is not a child of this container"))?;
        let c = node.children.remove(current);
        node.children.insert(index, c);
        Ok(())
    }

    /// Exchange the positions of two children of `parent`.
    pub fn swap_children(
        &mut self,
        parent: NodeId,
        a: NodeId,
        b: NodeId,
    ) -> Result<(), SceneError> {
        let node = self
            .node_opt_mut(parent)
            .ok_or(SceneError::StaleNode(parent))?;
        let (Some(ia), Some(ib)) = (
            node.children.iter().position(|&c| c == a),
            node.children.iter().position(|&c| c == b),
        ) else {
            return Err(SceneError::InvalidArgument(
                "both nodes must be children of this container",
            ));
        };
        node.children.swap(ia, ib);
        Ok(())
    }

    /// First direct child of `parent` named `name`.
    pub fn child_by_name(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children_of(parent)
            .iter()
            .copied()
            .find(|&c| self.name(c) == Some(name))
    }

    fn link(&mut self, parent: NodeId, child: NodeId, index: usize) {
        if let Some(p) = self.node_opt_mut(parent) {
            p.children.insert(index, child);
        }
        if let Some(c) = self.node_opt_mut(child) {
            c.parent = Some(parent);
            c.transform.invalidate_parent();
        }
        self.invalidate_bounds(parent);
    }

    fn unlink(&mut self, child: NodeId) -> Option<NodeId> {
        let node = self.node_opt_mut(child)?;
        let parent = node.parent.take()?;
        node.transform.invalidate_parent();
        if let Some(p) = self.node_opt_mut(parent) {
            p.children.retain(|c| *c != child);
        }
        self.invalidate_bounds(parent);
        Some(parent)
    }

    fn detach(&mut self, child: NodeId) -> Option<NodeId> {
        let parent = self.unlink(child)?;
        tracing::debug!(?parent, ?child, "child removed");
        self.emit_structural(child, REMOVED, parent);
        Some(parent)
    }

    fn emit_structural(&mut self, child: NodeId, name: &'static str, related: NodeId) {
        let mut event = NodeEvent::new(child).with_related(related);
        self.emit(child, name, Phase::Target, &mut event);
    }

    // --- transforms ---

    /// Recompute the world transform and world alpha of `id` and its visible descendants.
    ///
    /// `id` composes against its parent's world state as of the parent's last update, or the
    /// identity root frame (world alpha 1) when it has no parent. Invisible children and their
    /// subtrees are skipped; `id` itself is updated regardless of its own visibility.
    pub fn update_transform(&mut self, id: NodeId) {
        let Some(node) = self.node_opt(id) else {
            tracing::trace!(?id, "update_transform on stale node ignored");
            return;
        };
        let (frame, alpha) = self.parent_state(node.parent);

        // Depth-first, root-first, so every node reads an already updated parent.
        let mut changed = Vec::new();
        let mut stack = vec![(id, frame, alpha)];
        while let Some((current, frame, parent_alpha)) = stack.pop() {
            let Some(node) = self.node_opt_mut(current) else {
                continue;
            };
            if current != id && !node.flags.contains(NodeFlags::VISIBLE) {
                continue;
            }
            if node.transform.update(&frame) {
                changed.push(current);
            }
            node.world_alpha = node.alpha * parent_alpha;
            let (frame, alpha) = (node.transform.frame(), node.world_alpha);
            // `.rev()` so children are visited in paint order.
            for &child in node.children.iter().rev() {
                stack.push((child, frame, alpha));
            }
        }

        if !changed.is_empty() {
            self.invalidation_epoch += 1;
            for id in changed {
                self.invalidate_bounds_in_epoch(id);
            }
        }
    }

    /// Update every tree in the scene from its root.
    pub fn update_transforms(&mut self) {
        let roots: Vec<NodeId> = self.roots().collect();
        for root in roots {
            self.update_transform(root);
        }
    }

    /// Update the single nodes on the path from the root down to `id`, without their other
    /// descendants.
    ///
    /// The path is captured first; a stale entry (impossible unless the tree changes
    /// underneath) is skipped.
    pub(crate) fn refresh_chain(&mut self, id: NodeId, include_self: bool) {
        let mut path = self.path_to(id);
        if !include_self {
            path.pop();
        }
        for node in path {
            self.update_single(node);
        }
    }

    fn update_single(&mut self, id: NodeId) {
        let Some(parent) = self.node_opt(id).map(|n| n.parent) else {
            return;
        };
        let (frame, parent_alpha) = self.parent_state(parent);
        let Some(node) = self.node_opt_mut(id) else {
            return;
        };
        let changed = node.transform.update(&frame);
        node.world_alpha = node.alpha * parent_alpha;
        if changed {
            self.invalidate_bounds(id);
        }
    }

    fn parent_state(&self, parent: Option<NodeId>) -> (ParentFrame, f64) {
        match parent.and_then(|p| self.node_opt(p)) {
            Some(p) => (p.transform.frame(), p.world_alpha),
            None => (ParentFrame::ROOT, 1.0),
        }
    }

    /// Mark the cached bounds of `id`, its ancestors, and nodes it masks as stale.
    pub(crate) fn invalidate_bounds(&mut self, id: NodeId) {
        self.invalidation_epoch += 1;
        self.invalidate_bounds_in_epoch(id);
    }

    /// Each node is visited at most once per epoch, which also terminates mask cycles.
    fn invalidate_bounds_in_epoch(&mut self, id: NodeId) {
        let epoch = self.invalidation_epoch;
        let mut work = vec![id];
        while let Some(current) = work.pop() {
            let Some(node) = self.node_opt_mut(current) else {
                continue;
            };
            if node.invalidated_in == epoch {
                continue;
            }
            node.invalidated_in = epoch;
            node.bounds.invalidate();
            work.extend(node.parent);
            work.extend(node.mask_owner);
        }
    }

    /// Decomposed transform of a live node.
    pub fn transform(&self, id: NodeId) -> Option<&Transform> {
        self.node_opt(id).map(|n| &n.transform)
    }

    /// Mutable transform of a live node. Changes take effect on the next update.
    pub fn transform_mut(&mut self, id: NodeId) -> Option<&mut Transform> {
        self.live_mut(id, "transform_mut").map(|n| &mut n.transform)
    }

    /// Local matrix from the current components (whether or not an update ran since).
    pub fn local_transform(&self, id: NodeId) -> Option<Affine> {
        self.node_opt(id).map(|n| n.transform.compose_with(Affine::IDENTITY))
    }

    /// Local→world matrix as of the node's last update.
    pub fn world_transform(&self, id: NodeId) -> Option<Affine> {
        self.node_opt(id).map(|n| n.transform.world_matrix())
    }

    /// Product of alphas from the root, as of the node's last update.
    pub fn world_alpha(&self, id: NodeId) -> Option<f64> {
        self.node_opt(id).map(|n| n.world_alpha)
    }

    /// Whether the node and every ancestor are visible.
    pub fn world_visible(&self, id: NodeId) -> bool {
        let visible = |n: NodeId| {
            self.node_opt(n).is_some_and(|n| n.flags.contains(NodeFlags::VISIBLE))
        };
        visible(id) && self.ancestors(id).all(visible)
    }

    /// Set the position (translation of the pivot in parent space).
    pub fn set_position(&mut self, id: NodeId, position: impl Into<Point>) {
        if let Some(n) = self.live_mut(id, "set_position") {
            n.transform.position_mut().copy_from(position.into());
        }
    }

    /// Set the scale. `None` for `y` means uniform scale.
    pub fn set_scale(&mut self, id: NodeId, x: f64, y: Option<f64>) {
        if let Some(n) = self.live_mut(id, "set_scale") {
            n.transform.scale_mut().set(x, y);
        }
    }

    /// Set the rotation in radians.
    pub fn set_rotation(&mut self, id: NodeId, rotation: f64) {
        if let Some(n) = self.live_mut(id, "set_rotation") {
            n.transform.set_rotation(rotation);
        }
    }

    /// Set the shear angles in radians.
    pub fn set_skew(&mut self, id: NodeId, skew: impl Into<Vec2>) {
        if let Some(n) = self.live_mut(id, "set_skew") {
            n.transform.skew_mut().copy_from(skew.into().to_point());
        }
    }

    /// Set the pivot in local space.
    pub fn set_pivot(&mut self, id: NodeId, pivot: impl Into<Point>) {
        if let Some(n) = self.live_mut(id, "set_pivot") {
            n.transform.pivot_mut().copy_from(pivot.into());
        }
    }

    /// Overwrite all transform components at once.
    pub fn set_transform(&mut self, id: NodeId, parts: TransformParts) {
        if let Some(n) = self.live_mut(id, "set_transform") {
            n.transform.set_parts(parts);
        }
    }

    /// Own opacity. `None` for stale ids.
    pub fn alpha(&self, id: NodeId) -> Option<f64> {
        self.node_opt(id).map(|n| n.alpha)
    }

    /// Set the opacity. World alpha follows on the next update.
    pub fn set_alpha(&mut self, id: NodeId, alpha: f64) {
        if let Some(n) = self.live_mut(id, "set_alpha") {
            n.alpha = alpha;
        }
    }

    /// Flags of a live node.
    pub fn flags(&self, id: NodeId) -> Option<NodeFlags> {
        self.node_opt(id).map(|n| n.flags)
    }

    /// Whether the node itself is visible. False for stale ids.
    pub fn visible(&self, id: NodeId) -> bool {
        self.flags(id).is_some_and(|f| f.contains(NodeFlags::VISIBLE))
    }

    /// Show or hide the node and its subtree.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        self.set_flag(id, NodeFlags::VISIBLE, visible);
    }

    /// Whether the node itself is drawn. False for stale ids.
    pub fn renderable(&self, id: NodeId) -> bool {
        self.flags(id).is_some_and(|f| f.contains(NodeFlags::RENDERABLE))
    }

    /// Include or exclude the node from drawing (it keeps being updated).
    pub fn set_renderable(&mut self, id: NodeId, renderable: bool) {
        self.set_flag(id, NodeFlags::RENDERABLE, renderable);
    }

    /// Opt the node in or out of bounds queries.
    pub fn set_allow_get_bounds(&mut self, id: NodeId, allow: bool) {
        self.set_flag(id, NodeFlags::ALLOW_GET_BOUNDS, allow);
    }

    fn set_flag(&mut self, id: NodeId, flag: NodeFlags, value: bool) {
        let Some(n) = self.live_mut(id, "set_flag") else {
            return;
        };
        if n.flags.contains(flag) == value {
            return;
        }
        n.flags.set(flag, value);
        self.invalidate_bounds(id);
    }

    /// Local-space rectangle the node draws.
    pub fn content(&self, id: NodeId) -> Option<Rect> {
        self.node_opt(id).and_then(|n| n.content)
    }

    /// Replace the node's drawn rectangle.
    pub fn set_content(&mut self, id: NodeId, content: Option<Rect>) {
        let Some(n) = self.live_mut(id, "set_content") else {
            return;
        };
        if n.content != content {
            n.content = content;
            self.invalidate_bounds(id);
        }
    }

    /// Name of a live node.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.node_opt(id).and_then(|n| n.name.as_deref())
    }

    /// Rename a node.
    pub fn set_name(&mut self, id: NodeId, name: Option<String>) {
        if let Some(n) = self.live_mut(id, "set_name") {
            n.name = name;
        }
    }

    /// Tag of a live node.
    pub fn tag(&self, id: NodeId) -> Option<NodeTag> {
        self.node_opt(id).and_then(|n| n.tag)
    }

    /// Change a node's tag.
    pub fn set_tag(&mut self, id: NodeId, tag: Option<NodeTag>) {
        if let Some(n) = self.live_mut(id, "set_tag") {
            n.tag = tag;
        }
    }

    // --- masks and filters ---

    /// Set or clear the node that masks `id`.
    ///
    /// The previous mask becomes renderable again and loses [`NodeFlags::IS_MASK`]; the new
    /// one is made non-renderable and gains it. A node masks at most one other node: if `mask`
    /// already masked another node, that node loses its mask.
    pub fn set_mask(&mut self, id: NodeId, mask: Option<NodeId>) -> Result<(), SceneError> {
        let previous = self
            .node_opt(id)
            .ok_or(SceneError::StaleNode(id))?
            .mask;
        if let Some(m) = mask {
            if m == id {
                tracing::warn!(?id, "rejected self mask");
                return Err(SceneError::InvalidArgument("a node cannot mask itself"));
            }
            if !self.is_alive(m) {
                return Err(SceneError::StaleNode(m));
            }
        }
        if previous == mask {
            return Ok(());
        }

        if let Some(old) = previous {
            self.release_mask(old);
        }
        if let Some(m) = mask {
            let former_owner = self.node_opt_mut(m).and_then(|mn| {
                mn.flags.remove(NodeFlags::RENDERABLE);
                mn.flags.insert(NodeFlags::IS_MASK);
                mn.mask_owner.replace(id)
            });
            // The mask no longer counts toward its own parent's envelope.
            self.invalidate_bounds(m);
            if let Some(owner) = former_owner.filter(|&o| o != id) {
                if let Some(on) = self.node_opt_mut(owner) {
                    on.mask = None;
                }
                self.invalidate_bounds(owner);
            }
        }
        if let Some(n) = self.node_opt_mut(id) {
            n.mask = mask;
        }
        self.invalidate_bounds(id);
        tracing::debug!(?id, ?mask, "mask set");
        Ok(())
    }

    fn release_mask(&mut self, mask: NodeId) {
        if let Some(m) = self.node_opt_mut(mask) {
            m.flags.insert(NodeFlags::RENDERABLE);
            m.flags.remove(NodeFlags::IS_MASK);
            m.mask_owner = None;
        }
        self.invalidate_bounds(mask);
    }

    /// The node masking `id`, if any.
    pub fn mask(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|n| n.mask)
    }

    /// Replace the node's filter list.
    pub fn set_filters(&mut self, id: NodeId, filters: Option<Vec<FilterId>>) {
        if let Some(n) = self.live_mut(id, "set_filters") {
            n.filters = filters.filter(|f| !f.is_empty());
        }
    }

    /// A copy of the node's filter list; mutating it does not affect the node.
    pub fn filters(&self, id: NodeId) -> Vec<FilterId> {
        self.node_opt(id)
            .and_then(|n| n.filters.clone())
            .unwrap_or_default()
    }

    /// Restrict the node's contribution to its parent's bounds to a world-space area.
    pub fn set_filter_area(&mut self, id: NodeId, area: Option<Rect>) {
        let Some(n) = self.live_mut(id, "set_filter_area") else {
            return;
        };
        if n.filter_area != area {
            n.filter_area = area;
            self.invalidate_bounds(id);
        }
    }

    /// The node's filter area, if any.
    pub fn filter_area(&self, id: NodeId) -> Option<Rect> {
        self.node_opt(id).and_then(|n| n.filter_area)
    }

    // --- queries ---

    /// Closest ancestor (parent first, excluding `id`) satisfying `predicate`.
    ///
    /// Evaluated on every call, so the answer always reflects the current parent chain.
    pub fn find_ancestor(
        &self,
        id: NodeId,
        mut predicate: impl FnMut(NodeId) -> bool,
    ) -> Option<NodeId> {
        self.ancestors(id).find(|&a| predicate(a))
    }

    /// Closest ancestor carrying `tag`.
    pub fn find_ancestor_tagged(&self, id: NodeId, tag: NodeTag) -> Option<NodeId> {
        self.find_ancestor(id, |a| self.tag(a) == Some(tag))
    }

    // --- lifecycle ---

    /// Tear the node down and invalidate its handle.
    ///
    /// Listeners are dropped first, then the node is detached from its parent, its mask is
    /// released (made renderable again) and its filters are dropped. Children are destroyed
    /// too when [`DestroyOptions::children`] is set; otherwise they become roots and receive
    /// [`REMOVED`](crate::REMOVED) after the node is gone.
    ///
    /// Destroying a stale handle is a no-op.
    pub fn destroy(&mut self, id: NodeId, options: DestroyOptions) {
        if !self.is_alive(id) {
            tracing::trace!(?id, "destroy on stale node ignored");
            return;
        }
        // Worklist instead of recursion, so deep subtrees are fine.
        let mut work = vec![id];
        while let Some(current) = work.pop() {
            let children = self.destroy_one(current);
            if options.children {
                work.extend(children.into_iter().rev());
            } else {
                for child in children {
                    self.emit_structural(child, REMOVED, current);
                }
            }
        }
    }

    /// Free a single node and return its former children, now parentless.
    fn destroy_one(&mut self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.node_opt_mut(id) else {
            return Vec::new();
        };
        node.events.remove_all(None);
        let mask = node.mask.take();
        let owner = node.mask_owner.take();
        let children = core::mem::take(&mut node.children);

        self.unlink(id);
        if let Some(m) = mask {
            self.release_mask(m);
        }
        if let Some(o) = owner {
            if let Some(on) = self.node_opt_mut(o) {
                on.mask = None;
            }
            self.invalidate_bounds(o);
        }
        for &child in &children {
            if let Some(c) = self.node_opt_mut(child) {
                c.parent = None;
                c.transform.invalidate_parent();
            }
        }

        if let Some(slot) = self.nodes.get_mut(id.idx()) {
            *slot = None;
        }
        self.free_list.push(id.idx());
        tracing::debug!(?id, children = children.len(), "node destroyed");
        children
    }
}
