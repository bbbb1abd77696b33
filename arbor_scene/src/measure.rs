// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounds: cached world bounds, pure local bounds, and size accessors.

use alloc::vec;
use alloc::vec::Vec;

use arbor_geometry::Bounds;
use kurbo::{Affine, Rect};

use crate::scene::Scene;
use crate::types::{NodeFlags, NodeId};

impl Scene {
    /// World-space bounds of the node's content and its visible, renderable descendants.
    ///
    /// Unless `skip_update` is set, the ancestor chain and the node's subtree are updated
    /// first, so the result reflects the current transform components. The rectangle is cached
    /// per node and only recomputed after something it depends on changed. Masked children
    /// contribute only their intersection with the mask's bounds; children with a filter area
    /// contribute only their intersection with that area.
    ///
    /// Returns [`Rect::ZERO`] for stale ids, for nodes with nothing to measure, and for nodes
    /// that opted out via [`NodeFlags::ALLOW_GET_BOUNDS`].
    pub fn get_bounds(&mut self, id: NodeId, skip_update: bool) -> Rect {
        let Some(node) = self.node_opt(id) else {
            tracing::trace!(?id, "get_bounds on stale node");
            return Rect::ZERO;
        };
        if !node.flags.contains(NodeFlags::ALLOW_GET_BOUNDS) {
            return Rect::ZERO;
        }
        if !skip_update {
            self.refresh_chain(id, false);
            self.update_transform(id);
        }
        self.ensure_bounds(id).rectangle()
    }

    /// Recompute the node's bounds from the current world state, bypassing its own cache.
    ///
    /// Descendants still reuse their cached bounds when those are current.
    pub fn calculate_bounds(&mut self, id: NodeId) -> Rect {
        let Some(node) = self.node_opt_mut(id) else {
            return Rect::ZERO;
        };
        node.bounds_id = None;
        self.ensure_bounds(id).rectangle()
    }

    /// Bounds in the node's own coordinate space: its content and descendants, with the
    /// node's own transform (and everything above it) treated as identity.
    ///
    /// This is a pure computation; no stored transform, cache or parent link changes.
    /// Descendant components changed since the last update are honored. Masks outside the
    /// subtree are mapped in through the node's last world transform; filter areas, being
    /// world-space, are not applied.
    pub fn get_local_bounds(&self, id: NodeId) -> Rect {
        let Some(node) = self.node_opt(id) else {
            return Rect::ZERO;
        };
        if !node.flags.contains(NodeFlags::ALLOW_GET_BOUNDS) {
            return Rect::ZERO;
        }
        let world = node.transform.world_matrix();
        let world_to_local = (world.determinant() != 0.0).then(|| world.inverse());
        self.envelope(id, Affine::IDENTITY, world_to_local, true).rectangle()
    }

    /// Width after scaling: `scale.x * local bounds width`. `None` for stale ids.
    pub fn width(&self, id: NodeId) -> Option<f64> {
        let scale = self.transform(id)?.scale().x();
        Some(scale * self.get_local_bounds(id).width())
    }

    /// Height after scaling: `scale.y * local bounds height`. `None` for stale ids.
    pub fn height(&self, id: NodeId) -> Option<f64> {
        let scale = self.transform(id)?.scale().y();
        Some(scale * self.get_local_bounds(id).height())
    }

    /// Set the x scale so the scaled width is `width`. Empty local bounds reset it to 1.
    pub fn set_width(&mut self, id: NodeId, width: f64) {
        let local = self.get_local_bounds(id).width();
        if let Some(t) = self.transform_mut(id) {
            t.scale_mut().set_x(if local != 0.0 { width / local } else { 1.0 });
        }
    }

    /// Set the y scale so the scaled height is `height`. Empty local bounds reset it to 1.
    pub fn set_height(&mut self, id: NodeId, height: f64) {
        let local = self.get_local_bounds(id).height();
        if let Some(t) = self.transform_mut(id) {
            t.scale_mut().set_y(if local != 0.0 { height / local } else { 1.0 });
        }
    }

    /// Cached world bounds of `id`, recomputed if stale.
    ///
    /// Stale nodes are collected depth-first and recomputed bottom-up, so every child and
    /// mask is current by the time its parent aggregates it. A node is marked current when it
    /// is first visited, so a mask that is also an ancestor contributes its still empty
    /// envelope instead of looping forever.
    pub(crate) fn ensure_bounds(&mut self, id: NodeId) -> Bounds {
        let mut stack = vec![Visit::Enter(id)];
        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter(current) => {
                    let Some(node) = self.node_opt_mut(current) else {
                        continue;
                    };
                    if node.bounds_valid() {
                        continue;
                    }
                    node.bounds.clear();
                    node.bounds_id = Some(node.bounds.update_id());
                    stack.push(Visit::Exit(current));
                    let Some(node) = self.node_opt(current) else {
                        continue;
                    };
                    for &child in node.children.iter().rev() {
                        let Some(c) = self.node_opt(child) else {
                            continue;
                        };
                        if !c.is_drawn() {
                            continue;
                        }
                        stack.push(Visit::Enter(child));
                        stack.extend(c.mask.map(Visit::Enter));
                    }
                }
                Visit::Exit(current) => {
                    let acc = self.aggregate(current);
                    if let Some(node) = self.node_opt_mut(current) {
                        node.bounds.add_bounds(&acc);
                    }
                }
            }
        }
        self.node_opt(id).map_or_else(Bounds::new, |n| n.bounds)
    }

    /// Own content plus the current bounds of drawn children, clipped by masks and areas.
    fn aggregate(&self, id: NodeId) -> Bounds {
        let mut acc = Bounds::new();
        let Some(node) = self.node_opt(id) else {
            return acc;
        };
        if let Some(content) = node.content {
            acc.add_frame(node.transform.world_matrix(), content);
        }
        for &child in &node.children {
            let Some(c) = self.node_opt(child) else {
                continue;
            };
            if !c.is_drawn() {
                continue;
            }
            let mask = c.mask.and_then(|m| self.node_opt(m));
            match (mask, c.filter_area) {
                (Some(mask), _) => acc.add_bounds_mask(&c.bounds, &mask.bounds),
                (None, Some(area)) => acc.add_bounds_area(&c.bounds, area),
                (None, None) => acc.add_bounds(&c.bounds),
            }
        }
        acc
    }

    /// Envelope of `id`'s subtree with `id`'s content mapped through `frame`.
    ///
    /// `world_to_local` maps stored world matrices into the measured node's space and is only
    /// used for masks. Masks inside a mask's own subtree are ignored, so the nested envelope
    /// for a mask never nests again.
    fn envelope(
        &self,
        id: NodeId,
        frame: Affine,
        world_to_local: Option<Affine>,
        apply_masks: bool,
    ) -> Bounds {
        let Some(mut open) = self.open_envelope(id, frame, None) else {
            return Bounds::new();
        };
        let mut stack = Vec::new();
        loop {
            let next = self
                .node_opt(open.id)
                .and_then(|n| n.children.get(open.next).copied());
            if let Some(child) = next {
                open.next += 1;
                let Some(c) = self.node_opt(child) else {
                    continue;
                };
                if !c.is_drawn() {
                    continue;
                }
                let clip = c
                    .mask
                    .filter(|_| apply_masks)
                    .and_then(|m| Some((m, world_to_local? * self.world_transform(m)?)))
                    .map(|(m, mask_frame)| self.envelope(m, mask_frame, world_to_local, false));
                let frame = c.transform.compose_with(open.frame);
                if let Some(entry) = self.open_envelope(child, frame, clip) {
                    stack.push(core::mem::replace(&mut open, entry));
                }
                continue;
            }

            let Some(mut parent) = stack.pop() else {
                return open.acc;
            };
            match &open.clip {
                Some(mask) => parent.acc.add_bounds_mask(&open.acc, mask),
                None => parent.acc.add_bounds(&open.acc),
            }
            open = parent;
        }
    }

    fn open_envelope(&self, id: NodeId, frame: Affine, clip: Option<Bounds>) -> Option<Envelope> {
        let node = self.node_opt(id)?;
        let mut acc = Bounds::new();
        if let Some(content) = node.content {
            acc.add_frame(frame, content);
        }
        Some(Envelope {
            id,
            frame,
            clip,
            acc,
            next: 0,
        })
    }
}

enum Visit {
    Enter(NodeId),
    Exit(NodeId),
}

/// A node whose children are still being folded into its envelope.
struct Envelope {
    id: NodeId,
    frame: Affine,
    /// Mask envelope the finished subtree is intersected with.
    clip: Option<Bounds>,
    acc: Bounds,
    /// Index of the next child to visit.
    next: usize,
}
