// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=arbor_scene --heading-base-level=0

//! Arbor Scene: a 2D display tree with lazily propagated transforms, bounds, and events.
//!
//! Arbor Scene keeps a hierarchy of display nodes, each with a decomposed local transform
//! (position, scale, rotation, skew, pivot), an alpha, and visibility flags. It derives the
//! state a renderer needs from that hierarchy: world transforms, world alpha, and world-space
//! bounds. Derived state is recomputed only when something it depends on changed.
//!
//! - Nodes live in an arena and are addressed by generational [`NodeId`]s. A destroyed node's
//!   handle becomes stale, and every query on it degrades to `None`, `false`, or an empty rect.
//! - Containers own ordered child lists. Child order is paint order.
//! - Each node carries an [`EventDispatcher`](arbor_events::dispatcher::EventDispatcher);
//!   [`Scene::dispatch`] routes an event through capture, target, and bubble phases along the
//!   node's ancestor path.
//!
//! ## Not a renderer
//!
//! Nothing here rasterizes. [`Scene::render`] walks a subtree and hands each drawable node
//! to a [`Renderer`], which is where a real backend plugs in.
//! Hit testing is limited to (possibly rotated) rectangles; masks are not hit-tested.
//!
//! ## API overview
//!
//! - [`Scene`]: the arena and every operation on it.
//! - [`NodeDesc`]: kind, content rect, initial transform, alpha, flags, name, and tag of a new node.
//! - [`NodeFlags`]: visibility, renderability, mask, and bounds opt-out.
//! - [`NodeEvent`]: payload of node events, with [`ADDED`] and [`REMOVED`] emitted on structural changes.
//! - [`SceneError`]: structural misuse reported by container operations.
//!
//! Key operations:
//! - [`Scene::create`] → [`NodeId`], [`Scene::add_child`], [`Scene::remove_child`], [`Scene::destroy`].
//! - [`Scene::update_transform`] / [`Scene::update_transforms`] bring world transforms and
//!   world alpha up to date.
//! - [`Scene::get_bounds`] and [`Scene::get_local_bounds`] measure a subtree.
//! - [`Scene::to_global`], [`Scene::to_local`], [`Scene::hit_test`], [`Scene::hit_test_point`].
//! - [`Scene::set_mask`], [`Scene::set_filters`], [`Scene::set_filter_area`].
//! - [`Scene::on`], [`Scene::once`], [`Scene::off`], [`Scene::emit`], [`Scene::dispatch`].
//!
//! ## Example
//!
//! ```rust
//! use arbor_scene::{NodeDesc, Scene};
//! use kurbo::{Point, Rect};
//!
//! let mut scene = Scene::new();
//! let stage = scene.create(NodeDesc::container());
//! let sprite = scene.create(NodeDesc::leaf(Rect::new(0.0, 0.0, 10.0, 10.0)));
//! scene.add_child(stage, sprite).unwrap();
//!
//! scene.set_position(sprite, (5.0, 5.0));
//! scene.set_alpha(stage, 0.5);
//! scene.update_transforms();
//!
//! assert_eq!(scene.world_alpha(sprite), Some(0.5));
//! assert_eq!(scene.get_bounds(stage, false), Rect::new(5.0, 5.0, 15.0, 15.0));
//! assert!(scene.hit_test_point(sprite, Point::new(6.0, 6.0)));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod convert;
mod error;
mod event;
mod measure;
mod render;
mod scene;
mod types;

pub use arbor_events::dispatcher::Handler;
pub use arbor_events::types::{Listen, ListenOptions, Outcome, Phase};
pub use arbor_geometry::TransformParts;

pub use error::SceneError;
pub use event::{ADDED, NodeEvent, REMOVED, SceneHandler};
pub use render::{RenderView, Renderer};
pub use scene::Scene;
pub use types::{DestroyOptions, FilterId, NodeDesc, NodeFlags, NodeId, NodeKind, NodeTag};
