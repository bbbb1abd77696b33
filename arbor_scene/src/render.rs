// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renderer hooks.
//!
//! The scene does not draw anything. [`Scene::render`] walks a subtree in paint order and
//! hands each drawable node to a [`Renderer`] as a [`RenderView`], bracketing masked and
//! filtered subtrees with push/pop calls, much like a layer stack.

use alloc::vec;
use alloc::vec::Vec;

use kurbo::{Affine, Rect};

use crate::scene::{Node, Scene};
use crate::types::{FilterId, NodeFlags, NodeId};

/// Backend that consumes the derived state of a scene.
///
/// Every method defaults to a no-op, so a backend only overrides what it draws.
/// Push and pop calls are always balanced.
pub trait Renderer {
    /// Draw a single node. Called before the node's children.
    fn render_node(&mut self, view: &RenderView<'_>) {
        let _ = view;
    }

    /// Begin clipping `view` and its subtree by `mask`.
    fn push_mask(&mut self, view: &RenderView<'_>, mask: &RenderView<'_>) {
        let _ = (view, mask);
    }

    /// End the clip started by the matching [`Renderer::push_mask`].
    fn pop_mask(&mut self) {}

    /// Begin applying `filters`, in order, to `view` and its subtree.
    fn push_filters(&mut self, view: &RenderView<'_>, filters: &[FilterId]) {
        let _ = (view, filters);
    }

    /// End the filters started by the matching [`Renderer::push_filters`].
    fn pop_filters(&mut self) {}
}

/// Read-only view of one node's render state.
#[derive(Clone, Copy)]
pub struct RenderView<'a> {
    id: NodeId,
    node: &'a Node,
}

impl<'a> RenderView<'a> {
    /// The node being rendered.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Local→world matrix from the last update.
    pub fn world_transform(&self) -> Affine {
        self.node.transform.world_matrix()
    }

    /// Product of alphas from the root.
    pub fn world_alpha(&self) -> f64 {
        self.node.world_alpha
    }

    /// Local content rect, if the node draws anything itself.
    pub fn content(&self) -> Option<Rect> {
        self.node.content
    }

    /// The node's mask.
    pub fn mask(&self) -> Option<NodeId> {
        self.node.mask
    }

    /// The node's filters, in application order.
    pub fn filters(&self) -> &'a [FilterId] {
        self.node.filters.as_deref().unwrap_or_default()
    }
}

impl core::fmt::Debug for RenderView<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RenderView")
            .field("id", &self.id)
            .field("world_alpha", &self.node.world_alpha)
            .field("content", &self.node.content)
            .finish_non_exhaustive()
    }
}

enum Step {
    Enter(NodeId),
    Exit { mask: bool, filters: bool },
}

impl Scene {
    /// Update `root`'s subtree and hand it to `renderer` in paint order.
    ///
    /// Nodes that are invisible, non-renderable (this includes masks) or fully transparent
    /// are skipped along with their subtrees. A mask living outside the subtree has its own
    /// ancestor chain refreshed so the renderer sees a current world transform.
    pub fn render(&mut self, root: NodeId, renderer: &mut impl Renderer) {
        if !self.is_alive(root) {
            tracing::trace!(?root, "render on stale node");
            return;
        }
        self.update_transform(root);
        for mask in self.masks_in(root) {
            self.refresh_chain(mask, true);
        }

        let mut stack = vec![Step::Enter(root)];
        while let Some(step) = stack.pop() {
            let id = match step {
                Step::Enter(id) => id,
                Step::Exit { mask, filters } => {
                    if filters {
                        renderer.pop_filters();
                    }
                    if mask {
                        renderer.pop_mask();
                    }
                    continue;
                }
            };
            let Some(node) = self.node_opt(id) else {
                continue;
            };
            if !node.is_drawn() || node.world_alpha <= 0.0 {
                continue;
            }
            let view = RenderView { id, node };

            let mask = node
                .mask
                .and_then(|m| self.node_opt(m).map(|node| RenderView { id: m, node }));
            if let Some(mask) = &mask {
                renderer.push_mask(&view, mask);
            }
            let filters = view.filters();
            if !filters.is_empty() {
                renderer.push_filters(&view, filters);
            }
            renderer.render_node(&view);

            stack.push(Step::Exit {
                mask: mask.is_some(),
                filters: !filters.is_empty(),
            });
            for &child in node.children.iter().rev() {
                stack.push(Step::Enter(child));
            }
        }
    }

    /// Masks referenced from `root`'s drawable subtree.
    fn masks_in(&self, root: NodeId) -> Vec<NodeId> {
        let mut masks = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node_opt(id) else {
                continue;
            };
            if !node.flags.contains(NodeFlags::VISIBLE) {
                continue;
            }
            masks.extend(node.mask);
            stack.extend(node.children.iter().copied());
        }
        masks
    }
}
