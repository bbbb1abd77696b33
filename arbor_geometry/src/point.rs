// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A 2D point that reports changes to its owner.

use alloc::boxed::Box;
use core::fmt;

use kurbo::Point;

/// A two-component value that invokes a callback when a write changes it.
///
/// The callback is how a [`Transform`](crate::Transform) learns that its local matrix is
/// stale without every field needing a dedicated setter. Every mutator compares against the
/// current value first, so assigning the value a point already holds never fires the
/// callback.
///
/// ```
/// use arbor_geometry::ObservablePoint;
/// use core::cell::Cell;
/// use std::rc::Rc;
///
/// let fired = Rc::new(Cell::new(0));
/// let counter = fired.clone();
/// let mut p = ObservablePoint::with_callback(0.0, 0.0, move || counter.set(counter.get() + 1));
///
/// p.set_x(5.0);
/// p.set_x(5.0);
/// assert_eq!(fired.get(), 1);
/// ```
pub struct ObservablePoint {
    x: f64,
    y: f64,
    callback: Option<Box<dyn FnMut()>>,
}

impl fmt::Debug for ObservablePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservablePoint")
            .field("x", &self.x)
            .field("y", &self.y)
            .field("observed", &self.callback.is_some())
            .finish()
    }
}

impl Default for ObservablePoint {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl ObservablePoint {
    /// Create a point with no observer.
    pub const fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            callback: None,
        }
    }

    /// Create a point that invokes `callback` on every changing write.
    pub fn with_callback(x: f64, y: f64, callback: impl FnMut() + 'static) -> Self {
        Self {
            x,
            y,
            callback: Some(Box::new(callback)),
        }
    }

    /// Replace (or remove) the change callback.
    ///
    /// Installing a callback does not invoke it.
    pub fn set_callback(&mut self, callback: Option<Box<dyn FnMut()>>) {
        self.callback = callback;
    }

    /// Horizontal component.
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Vertical component.
    pub fn y(&self) -> f64 {
        self.y
    }

    /// The current value as a plain [`Point`].
    pub fn get(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Write the horizontal component.
    pub fn set_x(&mut self, x: f64) {
        if self.x != x {
            self.x = x;
            self.notify();
        }
    }

    /// Write the vertical component.
    pub fn set_y(&mut self, y: f64) {
        if self.y != y {
            self.y = y;
            self.notify();
        }
    }

    /// Write both components.
    ///
    /// When `y` is `None` it mirrors `x`, which is the usual shorthand for uniform scale.
    /// `Some(0.0)` is a literal zero and is never confused with an omitted value.
    pub fn set(&mut self, x: f64, y: Option<f64>) {
        let y = y.unwrap_or(x);
        if self.x != x || self.y != y {
            self.x = x;
            self.y = y;
            self.notify();
        }
    }

    /// Copy another value into this point.
    pub fn copy_from(&mut self, p: Point) {
        self.set(p.x, Some(p.y));
    }

    /// Component-wise sum; `self` is left untouched.
    pub fn add(&self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    /// Component-wise difference; `self` is left untouched.
    pub fn subtract(&self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    /// Whether this point holds exactly `p`.
    pub fn equals(&self, p: Point) -> bool {
        self.x == p.x && self.y == p.y
    }

    fn notify(&mut self) {
        if let Some(callback) = self.callback.as_mut() {
            callback();
        }
    }
}
