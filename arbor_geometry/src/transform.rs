// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Decomposed affine transform with lazy local and world matrices.

use alloc::rc::Rc;
use core::cell::Cell;
use core::f64::consts::PI;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Affine, Point, Vec2};

use crate::point::ObservablePoint;

/// Tolerance used when deciding whether a decomposed matrix is a pure rotation.
const DECOMPOSE_EPSILON: f64 = 1e-5;

/// The parent state a [`Transform`] composes against.
///
/// `world_id` identifies the parent's world matrix; a transform only recomposes its own world
/// matrix when it sees a different id (or its local matrix changed).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParentFrame {
    /// Parent local→world matrix.
    pub world: Affine,
    /// Version of `world`.
    pub world_id: u64,
}

impl ParentFrame {
    /// The identity frame used for nodes without a parent.
    pub const ROOT: Self = Self {
        world: Affine::IDENTITY,
        world_id: 0,
    };
}

impl Default for ParentFrame {
    fn default() -> Self {
        Self::ROOT
    }
}

/// All decomposed components of a [`Transform`] at once.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformParts {
    /// Translation of the pivot in parent space.
    pub position: Point,
    /// Scale along the local axes.
    pub scale: Vec2,
    /// Rotation in radians.
    pub rotation: f64,
    /// Independent shear angles for the x and y axes, in radians.
    pub skew: Vec2,
    /// Local point that `position` refers to and that rotation/scale happen around.
    pub pivot: Point,
}

impl Default for TransformParts {
    fn default() -> Self {
        Self {
            position: Point::ZERO,
            scale: Vec2::new(1.0, 1.0),
            rotation: 0.0,
            skew: Vec2::ZERO,
            pivot: Point::ZERO,
        }
    }
}

/// Position, scale, rotation, skew and pivot, with cached local and world matrices.
///
/// Mutating any component bumps an internal version through the [`ObservablePoint`]
/// callbacks (or the rotation setter). Nothing is recomputed at that point: the local matrix
/// is rebuilt on the next [`Transform::update`] or [`Transform::update_local`], and the world
/// matrix only on [`Transform::update`]. Between updates, [`Transform::world_matrix`] reports the
/// matrix as of the most recent update.
pub struct Transform {
    position: ObservablePoint,
    scale: ObservablePoint,
    pivot: ObservablePoint,
    skew: ObservablePoint,
    rotation: f64,
    version: Rc<Cell<u64>>,
    local: Affine,
    local_version: Option<u64>,
    world: Affine,
    parent_id: Option<u64>,
    world_id: u64,
}

impl core::fmt::Debug for Transform {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Transform")
            .field("position", &self.position.get())
            .field("scale", &self.scale.get())
            .field("pivot", &self.pivot.get())
            .field("skew", &self.skew.get())
            .field("rotation", &self.rotation)
            .field("world_id", &self.world_id)
            .finish_non_exhaustive()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform {
    /// Create an identity transform (unit scale, no rotation, skew or pivot).
    pub fn new() -> Self {
        let version = Rc::new(Cell::new(0_u64));
        let observed = |x: f64, y: f64| {
            let version = version.clone();
            ObservablePoint::with_callback(x, y, move || version.set(version.get() + 1))
        };
        Self {
            position: observed(0.0, 0.0),
            scale: observed(1.0, 1.0),
            pivot: observed(0.0, 0.0),
            skew: observed(0.0, 0.0),
            rotation: 0.0,
            local: Affine::IDENTITY,
            local_version: None,
            world: Affine::IDENTITY,
            parent_id: None,
            world_id: 0,
            version,
        }
    }

    /// Create a transform from decomposed parts.
    pub fn from_parts(parts: TransformParts) -> Self {
        let mut t = Self::new();
        t.set_parts(parts);
        t
    }

    /// Translation of the pivot in parent space.
    pub fn position(&self) -> &ObservablePoint {
        &self.position
    }

    /// Mutable access to the position; changing writes invalidate the local matrix.
    pub fn position_mut(&mut self) -> &mut ObservablePoint {
        &mut self.position
    }

    /// Scale along the local axes.
    pub fn scale(&self) -> &ObservablePoint {
        &self.scale
    }

    /// Mutable access to the scale.
    pub fn scale_mut(&mut self) -> &mut ObservablePoint {
        &mut self.scale
    }

    /// Pivot in local space.
    pub fn pivot(&self) -> &ObservablePoint {
        &self.pivot
    }

    /// Mutable access to the pivot.
    pub fn pivot_mut(&mut self) -> &mut ObservablePoint {
        &mut self.pivot
    }

    /// Shear angles in radians.
    pub fn skew(&self) -> &ObservablePoint {
        &self.skew
    }

    /// Mutable access to the skew.
    pub fn skew_mut(&mut self) -> &mut ObservablePoint {
        &mut self.skew
    }

    /// Rotation in radians.
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Set the rotation in radians.
    pub fn set_rotation(&mut self, rotation: f64) {
        if self.rotation != rotation {
            self.rotation = rotation;
            self.version.set(self.version.get() + 1);
        }
    }

    /// Snapshot of all decomposed components.
    pub fn parts(&self) -> TransformParts {
        TransformParts {
            position: self.position.get(),
            scale: self.scale.get().to_vec2(),
            rotation: self.rotation,
            skew: self.skew.get().to_vec2(),
            pivot: self.pivot.get(),
        }
    }

    /// Overwrite all decomposed components.
    pub fn set_parts(&mut self, parts: TransformParts) {
        self.position.copy_from(parts.position);
        self.scale.copy_from(parts.scale.to_point());
        self.set_rotation(parts.rotation);
        self.skew.copy_from(parts.skew.to_point());
        self.pivot.copy_from(parts.pivot);
    }

    /// Whether a component changed since the local matrix was last built.
    pub fn is_local_dirty(&self) -> bool {
        self.local_version != Some(self.version.get())
    }

    /// The local matrix as of the last rebuild.
    pub fn local_matrix(&self) -> Affine {
        self.local
    }

    /// The local→world matrix as of the last [`Transform::update`].
    pub fn world_matrix(&self) -> Affine {
        self.world
    }

    /// Version of the world matrix; increments every time it is recomposed.
    pub fn world_id(&self) -> u64 {
        self.world_id
    }

    /// This transform's world state viewed as a parent frame for its children.
    pub fn frame(&self) -> ParentFrame {
        ParentFrame {
            world: self.world,
            world_id: self.world_id,
        }
    }

    /// Forget which parent frame the world matrix was composed against.
    ///
    /// Owners call this on reparenting, since world ids of unrelated parents can collide.
    pub fn invalidate_parent(&mut self) {
        self.parent_id = None;
    }

    /// Rebuild the local matrix if a component changed. Returns whether it was rebuilt.
    pub fn update_local(&mut self) -> bool {
        if !self.is_local_dirty() {
            return false;
        }
        self.local = self.compose_local();
        self.local_version = Some(self.version.get());
        self.parent_id = None;
        true
    }

    /// Recompute local (if needed) and world (if needed) against `parent`.
    ///
    /// Must be called root-first, since it reads the parent's already updated world matrix.
    /// Returns whether the world matrix changed version.
    pub fn update(&mut self, parent: &ParentFrame) -> bool {
        self.update_local();
        if self.parent_id == Some(parent.world_id) {
            return false;
        }
        self.world = parent.world * self.local;
        self.parent_id = Some(parent.world_id);
        self.world_id = self.world_id.wrapping_add(1);
        true
    }

    /// Compute `parent * local` without touching any cached state.
    pub fn compose_with(&self, parent: Affine) -> Affine {
        let local = if self.is_local_dirty() {
            self.compose_local()
        } else {
            self.local
        };
        parent * local
    }

    /// Decompose `matrix` into position, scale, rotation and skew, keeping the current pivot.
    ///
    /// When both shear angles describe the same rotation the result is a pure rotation with
    /// zero skew; otherwise rotation is zero and the angles are stored as skew.
    pub fn set_from_matrix(&mut self, matrix: Affine) {
        let [a, b, c, d, e, f] = matrix.as_coeffs();
        let skew_x = -(-c).atan2(d);
        let skew_y = b.atan2(a);
        let delta = (skew_x + skew_y).abs();

        if delta < DECOMPOSE_EPSILON || (2.0 * PI - delta).abs() < DECOMPOSE_EPSILON {
            let mut rotation = skew_y;
            if a < 0.0 && d >= 0.0 {
                rotation += if rotation <= 0.0 { PI } else { -PI };
            }
            self.set_rotation(rotation);
            self.skew.set(0.0, Some(0.0));
        } else {
            self.set_rotation(0.0);
            self.skew.set(skew_x, Some(skew_y));
        }

        self.scale.set((a * a + b * b).sqrt(), Some((c * c + d * d).sqrt()));
        let pivot = self.pivot.get();
        self.position.set(
            e + (pivot.x * a + pivot.y * c),
            Some(f + (pivot.x * b + pivot.y * d)),
        );
    }

    fn compose_local(&self) -> Affine {
        let scale = self.scale.get();
        let skew = self.skew.get();
        let pivot = self.pivot.get();
        let position = self.position.get();

        let (sin_y, cos_y) = (self.rotation + skew.y).sin_cos();
        let (sin_x, cos_x) = (self.rotation - skew.x).sin_cos();
        let a = cos_y * scale.x;
        let b = sin_y * scale.x;
        let c = -sin_x * scale.y;
        let d = cos_x * scale.y;
        let e = position.x - (pivot.x * a + pivot.y * c);
        let f = position.y - (pivot.x * b + pivot.y * d);
        Affine::new([a, b, c, d, e, f])
    }
}

/// Map a world point back through `affine`.
///
/// Returns `None` when `affine` is singular (for example a zero scale), rather than producing
/// infinite or NaN coordinates.
pub fn apply_inverse(affine: Affine, point: Point) -> Option<Point> {
    let det = affine.determinant();
    if det == 0.0 || !det.is_finite() {
        return None;
    }
    Some(affine.inverse() * point)
}
