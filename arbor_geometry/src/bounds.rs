// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Axis-aligned bounds accumulation.

use kurbo::{Affine, Point, Rect};

/// An axis-aligned envelope built up from points, rectangles and other bounds.
///
/// A cleared envelope is inverted (`min > max`) so the first addition defines it. The
/// [`update_id`](Self::update_id) counter is owned by whoever caches a rectangle derived from
/// these bounds: they call [`invalidate`](Self::invalidate) whenever the inputs change and
/// compare the id against the one they recorded at their last recomputation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    /// Minimum x (left)
    pub min_x: f64,
    /// Minimum y (top)
    pub min_y: f64,
    /// Maximum x (right)
    pub max_x: f64,
    /// Maximum y (bottom)
    pub max_y: f64,
    update_id: u64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new()
    }
}

impl Bounds {
    /// An empty envelope with `update_id` zero.
    pub const fn new() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
            update_id: 0,
        }
    }

    /// Whether nothing has been added since the last [`clear`](Self::clear).
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Reset to the empty envelope. The update id is left alone.
    pub fn clear(&mut self) {
        self.min_x = f64::INFINITY;
        self.min_y = f64::INFINITY;
        self.max_x = f64::NEG_INFINITY;
        self.max_y = f64::NEG_INFINITY;
    }

    /// Version of the inputs these bounds were derived from.
    pub fn update_id(&self) -> u64 {
        self.update_id
    }

    /// Mark any rectangle derived from these bounds as stale.
    pub fn invalidate(&mut self) {
        self.update_id = self.update_id.wrapping_add(1);
    }

    /// The envelope as a rectangle, or [`Rect::ZERO`] if it is empty.
    pub fn rectangle(&self) -> Rect {
        if self.is_empty() {
            Rect::ZERO
        } else {
            Rect::new(self.min_x, self.min_y, self.max_x, self.max_y)
        }
    }

    /// Extend the envelope to include `p`.
    pub fn add_point(&mut self, p: Point) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    /// Extend the envelope to include `rect`.
    pub fn add_rect(&mut self, rect: Rect) {
        let rect = rect.abs();
        self.add_point(Point::new(rect.x0, rect.y0));
        self.add_point(Point::new(rect.x1, rect.y1));
    }

    /// Extend the envelope to include four arbitrary corners.
    pub fn add_quad(&mut self, corners: &[Point; 4]) {
        for &p in corners {
            self.add_point(p);
        }
    }

    /// Extend the envelope to include `rect` mapped through `affine`.
    ///
    /// All four corners are transformed, so rotation and skew produce the enclosing box of
    /// the transformed quadrilateral.
    pub fn add_frame(&mut self, affine: Affine, rect: Rect) {
        self.add_quad(&[
            affine * Point::new(rect.x0, rect.y0),
            affine * Point::new(rect.x1, rect.y0),
            affine * Point::new(rect.x1, rect.y1),
            affine * Point::new(rect.x0, rect.y1),
        ]);
    }

    /// Extend the envelope to include another envelope.
    pub fn add_bounds(&mut self, other: &Self) {
        if other.is_empty() {
            return;
        }
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    /// Extend the envelope to include `other` clipped by `mask`.
    ///
    /// Nothing is added when the two do not intersect.
    pub fn add_bounds_mask(&mut self, other: &Self, mask: &Self) {
        self.add_clipped(
            other,
            Rect::new(mask.min_x, mask.min_y, mask.max_x, mask.max_y),
        );
    }

    /// Extend the envelope to include `other` clipped by a rectangular area.
    pub fn add_bounds_area(&mut self, other: &Self, area: Rect) {
        self.add_clipped(other, area.abs());
    }

    fn add_clipped(&mut self, other: &Self, clip: Rect) {
        let min_x = other.min_x.max(clip.x0);
        let min_y = other.min_y.max(clip.y0);
        let max_x = other.max_x.min(clip.x1);
        let max_y = other.max_y.min(clip.y1);
        if min_x <= max_x && min_y <= max_y {
            self.add_point(Point::new(min_x, min_y));
            self.add_point(Point::new(max_x, max_y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::FRAC_PI_4;

    #[test]
    fn untouched_bounds_yield_zero_rect() {
        let b = Bounds::new();
        assert!(b.is_empty());
        assert_eq!(b.rectangle(), Rect::ZERO);
    }

    #[test]
    fn points_and_rects_extend_envelope() {
        let mut b = Bounds::new();
        b.add_point(Point::new(5.0, 5.0));
        b.add_rect(Rect::new(-1.0, 2.0, 3.0, 4.0));
        assert_eq!(b.rectangle(), Rect::new(-1.0, 2.0, 5.0, 5.0));
    }

    #[test]
    fn clear_keeps_update_id() {
        let mut b = Bounds::new();
        b.invalidate();
        b.add_point(Point::new(1.0, 1.0));
        b.clear();
        assert!(b.is_empty());
        assert_eq!(b.update_id(), 1);
    }

    #[test]
    fn frame_uses_all_four_corners() {
        let mut b = Bounds::new();
        b.add_frame(Affine::rotate(FRAC_PI_4), Rect::new(0.0, 0.0, 10.0, 10.0));
        let r = b.rectangle();
        let half_diag = 10.0 * FRAC_PI_4.cos();
        assert!((r.x0 + half_diag).abs() < 1e-9);
        assert!((r.x1 - half_diag).abs() < 1e-9);
        assert!(r.y0.abs() < 1e-9);
        assert!((r.y1 - 2.0 * half_diag).abs() < 1e-9);
    }

    #[test]
    fn empty_bounds_do_not_extend() {
        let mut b = Bounds::new();
        b.add_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        b.add_bounds(&Bounds::new());
        assert_eq!(b.rectangle(), Rect::new(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn mask_and_area_clip_the_added_bounds() {
        let mut child = Bounds::new();
        child.add_rect(Rect::new(0.0, 0.0, 100.0, 100.0));
        let mut mask = Bounds::new();
        mask.add_rect(Rect::new(50.0, 50.0, 200.0, 200.0));

        let mut b = Bounds::new();
        b.add_bounds_mask(&child, &mask);
        assert_eq!(b.rectangle(), Rect::new(50.0, 50.0, 100.0, 100.0));

        let mut b = Bounds::new();
        b.add_bounds_area(&child, Rect::new(200.0, 200.0, 300.0, 300.0));
        assert!(b.is_empty());
    }
}
