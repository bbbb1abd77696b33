// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the scene: node identifiers, flags, and creation descriptors.

use alloc::string::String;

use arbor_geometry::TransformParts;
use kurbo::Rect;

/// Identifier for a node in the scene (generational).
///
/// A handle stays valid until its node is destroyed. After that it is stale: the slot may be
/// reused, but the generation no longer matches, so the old handle never aliases a new node.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Per-node switches for visibility, rendering and bounds.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Node and its subtree are shown, updated, and counted in the parent's bounds.
        const VISIBLE          = 0b0000_0001;
        /// Node is drawn and counted in the parent's bounds (still updated when cleared).
        const RENDERABLE       = 0b0000_0010;
        /// Node is currently some other node's mask. Managed by [`Scene::set_mask`](crate::Scene::set_mask).
        const IS_MASK          = 0b0000_0100;
        /// Bounds queries on this node compute real bounds; when cleared they report an empty rectangle.
        const ALLOW_GET_BOUNDS = 0b0000_1000;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::VISIBLE | Self::RENDERABLE | Self::ALLOW_GET_BOUNDS
    }
}

/// Whether a node may hold children.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Never has children; attaching under it fails.
    Leaf,
    /// Holds an ordered child list.
    #[default]
    Container,
}

/// Caller-defined category used by [`Scene::find_ancestor_tagged`](crate::Scene::find_ancestor_tagged).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeTag(pub u32);

/// Opaque filter reference handed to the renderer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FilterId(pub u32);

/// Everything needed to create a node.
#[derive(Clone, Debug)]
pub struct NodeDesc {
    /// Leaf or container.
    pub kind: NodeKind,
    /// Local-space rectangle the node draws itself, if any.
    pub content: Option<Rect>,
    /// Initial transform components.
    pub transform: TransformParts,
    /// Opacity multiplier in `[0, 1]`.
    pub alpha: f64,
    /// Initial flags. `IS_MASK` is ignored here.
    pub flags: NodeFlags,
    /// Name used by [`Scene::child_by_name`](crate::Scene::child_by_name).
    pub name: Option<String>,
    /// Category used by ancestor queries.
    pub tag: Option<NodeTag>,
}

impl Default for NodeDesc {
    fn default() -> Self {
        Self {
            kind: NodeKind::Container,
            content: None,
            transform: TransformParts::default(),
            alpha: 1.0,
            flags: NodeFlags::default(),
            name: None,
            tag: None,
        }
    }
}

impl NodeDesc {
    /// A leaf drawing `content`.
    pub fn leaf(content: Rect) -> Self {
        Self {
            kind: NodeKind::Leaf,
            content: Some(content),
            ..Self::default()
        }
    }

    /// An empty container.
    pub fn container() -> Self {
        Self::default()
    }

    /// Same descriptor with a name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Same descriptor with a tag.
    pub fn tagged(mut self, tag: NodeTag) -> Self {
        self.tag = Some(tag);
        self
    }
}

/// Options for [`Scene::destroy`](crate::Scene::destroy).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DestroyOptions {
    /// Destroy the whole subtree. When false, children are detached and become roots.
    pub children: bool,
}
