// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! High-level touch names and their primitive fan-out.
//!
//! Input layers raise primitive names: one for pointer/mouse input and one for touch input.
//! Application code usually does not care which device produced an interaction, so it
//! registers on an alias instead. [`expand`] maps an alias to both primitives and any other
//! name to itself; the dispatcher applies it in `on`, `once` and `off`, never in `emit`.

use smallvec::{SmallVec, smallvec};

/// Press began (pointer down or touch start).
pub const TOUCH_BEGIN: &str = "touchBegin";
/// Pointer or touch point moved.
pub const TOUCH_MOVE: &str = "touchMove";
/// Press ended over the node.
pub const TOUCH_END: &str = "touchEnd";
/// Press and release over the same node.
pub const TAP: &str = "touchTap";
/// Press ended outside the node that received the press.
pub const TOUCH_END_OUTSIDE: &str = "touchReleaseOutside";

/// Primitive names raised by input layers.
pub mod primitive {
    /// Mouse button pressed.
    pub const MOUSE_DOWN: &str = "mousedown";
    /// Mouse moved.
    pub const MOUSE_MOVE: &str = "mousemove";
    /// Mouse button released.
    pub const MOUSE_UP: &str = "mouseup";
    /// Mouse press and release on the same node.
    pub const CLICK: &str = "click";
    /// Mouse button released away from the pressed node.
    pub const MOUSE_UP_OUTSIDE: &str = "mouseupoutside";
    /// Touch point placed.
    pub const TOUCH_START: &str = "touchstart";
    /// Touch point moved.
    pub const TOUCH_MOVE: &str = "touchmove";
    /// Touch point lifted.
    pub const TOUCH_END: &str = "touchend";
    /// Touch placed and lifted on the same node.
    pub const TAP: &str = "tap";
    /// Touch point lifted away from the touched node.
    pub const TOUCH_END_OUTSIDE: &str = "touchendoutside";
}

const ALIASES: [(&str, [&str; 2]); 5] = [
    (TOUCH_BEGIN, [primitive::MOUSE_DOWN, primitive::TOUCH_START]),
    (TOUCH_MOVE, [primitive::MOUSE_MOVE, primitive::TOUCH_MOVE]),
    (TOUCH_END, [primitive::MOUSE_UP, primitive::TOUCH_END]),
    (TAP, [primitive::CLICK, primitive::TAP]),
    (
        TOUCH_END_OUTSIDE,
        [primitive::MOUSE_UP_OUTSIDE, primitive::TOUCH_END_OUTSIDE],
    ),
];

/// Whether `name` is one of the aliases in this module.
pub fn is_alias(name: &str) -> bool {
    ALIASES.iter().any(|(alias, _)| *alias == name)
}

/// The primitive names that `name` stands for.
///
/// Aliases expand to their two primitives (pointer first); every other name expands to itself.
pub fn expand(name: &str) -> SmallVec<[&str; 2]> {
    match ALIASES.iter().find(|(alias, _)| *alias == name) {
        Some((_, [pointer, touch])) => smallvec![*pointer, *touch],
        None => smallvec![name],
    }
}
