// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coordinate conversion and hit testing.

use arbor_geometry::{Quad, apply_inverse};
use kurbo::Point;

use crate::scene::Scene;
use crate::types::NodeId;

impl Scene {
    /// Map a point from `id`'s local space into world space.
    ///
    /// Unless `skip_update` is set, every node from the root down to `id` is updated first,
    /// since the world matrix is only correct when all ancestors are current.
    pub fn to_global(&mut self, id: NodeId, point: Point, skip_update: bool) -> Option<Point> {
        if !self.is_alive(id) {
            tracing::trace!(?id, "to_global on stale node");
            return None;
        }
        if !skip_update {
            self.refresh_chain(id, true);
        }
        Some(self.world_transform(id)? * point)
    }

    /// Map a point into `id`'s local space.
    ///
    /// With `from`, the point is first taken from `from`'s local space to world space.
    /// Returns `None` for stale handles or when `id`'s world transform is singular.
    pub fn to_local(
        &mut self,
        id: NodeId,
        point: Point,
        from: Option<NodeId>,
        skip_update: bool,
    ) -> Option<Point> {
        let global = match from {
            Some(from) => self.to_global(from, point, skip_update)?,
            None => point,
        };
        if !self.is_alive(id) {
            tracing::trace!(?id, "to_local on stale node");
            return None;
        }
        if !skip_update {
            self.refresh_chain(id, true);
        }
        apply_inverse(self.world_transform(id)?, global)
    }

    /// Whether the transformed local bounds of `a` and `b` overlap in world space.
    ///
    /// Each node's local bounds are mapped corner by corner through its world transform, so
    /// rotation and skew of either node are respected. Touching edges count as overlap, and
    /// so does full containment. False when either handle is stale.
    pub fn hit_test(&mut self, a: NodeId, b: NodeId) -> bool {
        let (Some(qa), Some(qb)) = (self.world_quad(a), self.world_quad(b)) else {
            return false;
        };
        qa.overlaps(&qb)
    }

    /// Whether the world-space point lies within the node's (axis-aligned) bounds.
    pub fn hit_test_point(&mut self, id: NodeId, point: Point) -> bool {
        self.is_alive(id) && self.get_bounds(id, false).contains(point)
    }

    fn world_quad(&mut self, id: NodeId) -> Option<Quad> {
        if !self.is_alive(id) {
            return None;
        }
        self.refresh_chain(id, true);
        let local = self.get_local_bounds(id);
        Some(Quad::transformed(self.world_transform(id)?, local))
    }
}
