// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quadrilateral overlap testing for transformed rectangles.

use kurbo::{Affine, Point, Rect};

/// A quadrilateral given by its four corners in winding order.
///
/// Quads usually come from mapping a local-space rectangle through a world transform, so
/// they may be rotated or sheared. [`Quad::overlaps`] is exact for such (convex) quads;
/// it does not assume axis alignment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quad(pub [Point; 4]);

impl Quad {
    /// The corners of an axis-aligned rectangle, clockwise from `(x0, y0)` in y-down space.
    pub fn from_rect(rect: Rect) -> Self {
        Self([
            Point::new(rect.x0, rect.y0),
            Point::new(rect.x1, rect.y0),
            Point::new(rect.x1, rect.y1),
            Point::new(rect.x0, rect.y1),
        ])
    }

    /// `rect` with each corner mapped through `affine`.
    pub fn transformed(affine: Affine, rect: Rect) -> Self {
        let Self(corners) = Self::from_rect(rect);
        Self(corners.map(|p| affine * p))
    }

    /// The four edges as `(start, end)` pairs, closing back to the first corner.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        (0..4).map(move |i| (self.0[i], self.0[(i + 1) % 4]))
    }

    /// Axis-aligned box enclosing the four corners.
    pub fn bounding_box(&self) -> Rect {
        let [p0, p1, p2, p3] = self.0;
        Rect::from_points(p0, p1).union_pt(p2).union_pt(p3)
    }

    /// Whether `p` lies inside the quad (even-odd ray casting).
    pub fn contains(&self, p: Point) -> bool {
        let mut inside = false;
        let mut j = 3;
        for i in 0..4 {
            let (pi, pj) = (self.0[i], self.0[j]);
            // The crossing condition implies `pi.y != pj.y`, so the division is safe.
            if (pi.y > p.y) != (pj.y > p.y)
                && p.x < (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// Whether the two quads touch or overlap.
    ///
    /// Any pair of crossing or touching edges is an overlap. With no edge contact, one quad
    /// can still lie entirely inside the other, which is detected by testing the corners of
    /// each against the other.
    pub fn overlaps(&self, other: &Self) -> bool {
        for (a0, a1) in self.edges() {
            for (b0, b1) in other.edges() {
                if segments_intersect(a0, a1, b0, b1) {
                    return true;
                }
            }
        }
        other.0.iter().any(|&p| self.contains(p)) || self.0.iter().any(|&p| other.contains(p))
    }
}

/// Closed segment intersection, including collinear overlap and degenerate segments.
fn segments_intersect(p0: Point, p1: Point, q0: Point, q1: Point) -> bool {
    let r = p1 - p0;
    let s = q1 - q0;
    let qp = q0 - p0;
    let denom = r.cross(s);

    if denom == 0.0 {
        if qp.cross(r) != 0.0 || qp.cross(s) != 0.0 {
            // Parallel but not on a common line.
            return false;
        }
        let rr = r.dot(r);
        if rr == 0.0 {
            let ss = s.dot(s);
            if ss == 0.0 {
                return p0 == q0;
            }
            let t = (p0 - q0).dot(s) / ss;
            return (0.0..=1.0).contains(&t);
        }
        let t0 = qp.dot(r) / rr;
        let t1 = t0 + s.dot(r) / rr;
        let (lo, hi) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
        return hi >= 0.0 && lo <= 1.0;
    }

    let t = qp.cross(s) / denom;
    let u = qp.cross(r) / denom;
    (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::{FRAC_PI_4, SQRT_2};

    fn quad(x: f64, y: f64, w: f64, h: f64) -> Quad {
        Quad::from_rect(Rect::new(x, y, x + w, y + h))
    }

    #[test]
    fn overlapping_rects() {
        assert!(quad(0.0, 0.0, 10.0, 10.0).overlaps(&quad(5.0, 5.0, 10.0, 10.0)));
    }

    #[test]
    fn disjoint_rects() {
        assert!(!quad(0.0, 0.0, 10.0, 10.0).overlaps(&quad(20.0, 20.0, 10.0, 10.0)));
    }

    #[test]
    fn containment_without_edge_crossings() {
        let outer = quad(0.0, 0.0, 10.0, 10.0);
        let inner = quad(4.0, 4.0, 2.0, 2.0);
        assert!(!outer.edges().any(|(a0, a1)| {
            inner
                .edges()
                .any(|(b0, b1)| segments_intersect(a0, a1, b0, b1))
        }));
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn shared_edge_counts_as_touching() {
        assert!(quad(0.0, 0.0, 10.0, 10.0).overlaps(&quad(10.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn rotation_is_respected() {
        // A diamond next to the square's bottom-right corner: the bounding boxes overlap,
        // but the diamond's edge (x + y = 26) stays clear of the corner (x + y = 20).
        let side = 8.0 * SQRT_2;
        let diamond = Quad::transformed(
            Affine::translate((17.0, 9.0)) * Affine::rotate(FRAC_PI_4),
            Rect::new(0.0, 0.0, side, side),
        );
        let square = quad(0.0, 0.0, 10.0, 10.0);
        let boxes = diamond.bounding_box().intersect(square.bounding_box());
        assert!(boxes.width() > 0.0 && boxes.height() > 0.0);
        assert!(!diamond.overlaps(&square));
    }

    #[test]
    fn degenerate_segments_do_not_divide_by_zero() {
        let p = Point::new(1.0, 1.0);
        assert!(segments_intersect(p, p, p, p));
        assert!(segments_intersect(
            p,
            p,
            Point::new(0.0, 0.0),
            Point::new(2.0, 2.0)
        ));
        assert!(!segments_intersect(
            p,
            p,
            Point::new(0.0, 1.0),
            Point::new(0.0, 2.0)
        ));
    }
}
