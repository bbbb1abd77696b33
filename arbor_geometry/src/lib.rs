// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=arbor_geometry --heading-base-level=0

//! Arbor Geometry: the transform and bounds primitives of the Arbor scene graph.
//!
//! This crate holds the small, self-contained pieces that the scene crate composes into
//! world-space state. Everything is expressed in terms of [`kurbo`] types, so matrices are
//! [`kurbo::Affine`], points are [`kurbo::Point`], and rectangles are [`kurbo::Rect`].
//!
//! - [`ObservablePoint`]: a 2D value that invokes a callback whenever a write changes it.
//!   Writes that do not change the value are silent.
//! - [`Transform`]: position, scale, rotation, skew and pivot, decomposed. It lazily rebuilds
//!   its local matrix when one of those fields changed, and its world matrix when either the
//!   local matrix or the parent frame changed.
//! - [`Bounds`]: an axis-aligned envelope accumulator with a version counter used by owners to
//!   detect stale cached bounds.
//! - [`Quad`]: a possibly rotated quadrilateral with a general overlap test, used for
//!   rotation-aware hit testing between two nodes.
//!
//! ## Minimal example
//!
//! ```
//! use arbor_geometry::{ParentFrame, Transform};
//! use kurbo::Point;
//!
//! let mut transform = Transform::new();
//! transform.position_mut().set(10.0, Some(20.0));
//! transform.scale_mut().set(2.0, None);
//! transform.update(&ParentFrame::ROOT);
//!
//! let world = transform.world_matrix();
//! assert_eq!(world * Point::new(1.0, 1.0), Point::new(12.0, 22.0));
//! ```
//!
//! ## Matrix conventions
//!
//! Matrices follow kurbo's column-vector convention: a point maps as
//! `x' = a·x + c·y + e`, `y' = b·x + d·y + f`, and `parent * local` is the composition that
//! applies `local` first. [`apply_inverse`] guards singular matrices instead of producing
//! non-finite points.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod bounds;
mod point;
mod quad;
mod transform;

pub use bounds::Bounds;
pub use point::ObservablePoint;
pub use quad::Quad;
pub use transform::{ParentFrame, Transform, TransformParts, apply_inverse};
