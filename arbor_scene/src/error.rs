// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by structural scene operations.

use core::fmt;

use crate::types::NodeId;

/// Errors from structural [`Scene`](crate::Scene) operations.
///
/// Only misuse at the API boundary is reported. Reads on destroyed nodes degrade to
/// `None` or empty values instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneError {
    /// The arguments describe an impossible structure (a leaf as parent, a cycle, ...).
    InvalidArgument(&'static str),
    /// The handle refers to a destroyed node.
    StaleNode(NodeId),
    /// A child index outside the parent's child list.
    IndexOutOfBounds {
        /// Requested index.
        index: usize,
        /// Length of the child list.
        len: usize,
    },
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(reason) => write!(f, "invalid argument: {reason}"),
            Self::StaleNode(id) => write!(f, "node {id:?} has been destroyed"),
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "child index {index} out of bounds for {len} children")
            }
        }
    }
}

impl core::error::Error for SceneError {}
