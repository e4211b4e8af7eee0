#![forbid(unsafe_code)]

//! Geometric primitives.

use serde::{Deserialize, Serialize};

/// A point in canvas space.
///
/// Uses canvas pixels (origin at top-left, `y` grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Same point with a different `y`.
    #[inline]
    #[must_use]
    pub const fn with_y(self, y: f64) -> Self {
        Self { x: self.x, y }
    }

    /// Linear interpolation of `y` toward `target` by `t` (0.0..=1.0).
    ///
    /// `x` is taken from `target` unchanged.
    #[inline]
    #[must_use]
    pub fn lerp_y(self, target: Point, t: f64) -> Self {
        Self {
            x: target.x,
            y: self.y + (target.y - self.y) * t,
        }
    }
}

/// A half-open vertical interval `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Span {
    /// Top edge (inclusive).
    pub min: f64,
    /// Bottom edge (exclusive).
    pub max: f64,
}

impl Span {
    /// Create a new span. `max` is raised to `min` if it is smaller.
    #[inline]
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }

    /// Extent of the span.
    #[inline]
    pub fn len(&self) -> f64 {
        self.max - self.min
    }

    /// Check if the span has zero extent.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() <= 0.0
    }

    /// Midpoint.
    #[inline]
    pub fn center(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    /// Half-open containment test.
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value < self.max
    }

    /// Closed containment test (`max` included).
    #[inline]
    pub fn contains_inclusive(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp `value` into `[min, max]`.
    ///
    /// NaN clamps to `min`. Never panics, even on a span with NaN edges.
    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        value.max(self.min).min(self.max)
    }

    /// Pull the bottom edge up by `amount`, never past `min`.
    #[inline]
    #[must_use]
    pub fn shrink_end(&self, amount: f64) -> Span {
        Span::new(self.min, self.max - amount.max(0.0))
    }
}
