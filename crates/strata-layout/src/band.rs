#![forbid(unsafe_code)]

//! Pixel bands: the vertical split of the canvas into one strip per tier.
//!
//! A [`BandSet`] is an equal-share vertical split of the usable canvas
//! height (`canvas_height - top_margin - bottom_margin`), one band per tier
//! in tier order. The foundational band is always first.
//!
//! # Invariants
//!
//! 1. A `BandSet` is never empty.
//! 2. `bands[i].y_max == bands[i + 1].y_min` (contiguous, no overlap).
//! 3. `bands[0].y_min == top_margin` and the last `y_max` equals
//!    `top_margin + usable_height`. Non-finite frame values count as 0, so
//!    every edge is finite.
//! 4. `bands[0]` belongs to the foundational tier.

use serde::{Deserialize, Serialize};
use strata_core::Span;

use crate::tier::{Tier, TierId, TierSet, normalize_tiers};

/// Default canvas height in pixels.
pub const DEFAULT_CANVAS_HEIGHT: f64 = 850.0;

/// Default top/bottom margin in pixels.
pub const DEFAULT_CANVAS_MARGIN: f64 = 40.0;

/// Vertical frame the bands are laid into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasFrame {
    pub canvas_height: f64,
    pub top_margin: f64,
    pub bottom_margin: f64,
}

impl CanvasFrame {
    pub const fn new(canvas_height: f64, top_margin: f64, bottom_margin: f64) -> Self {
        Self {
            canvas_height,
            top_margin,
            bottom_margin,
        }
    }

    /// Usable height after margins, never negative. A non-finite height or
    /// margin counts as 0.
    #[must_use]
    pub fn usable_height(&self) -> f64 {
        (finite_or_zero(self.canvas_height)
            - finite_or_zero(self.top_margin)
            - finite_or_zero(self.bottom_margin))
        .max(0.0)
    }

    /// Top edge of the first band.
    #[must_use]
    pub fn origin(&self) -> f64 {
        finite_or_zero(self.top_margin)
    }

    /// Same frame with a different canvas height.
    #[must_use]
    pub const fn with_height(self, canvas_height: f64) -> Self {
        Self {
            canvas_height,
            ..self
        }
    }
}

impl Default for CanvasFrame {
    fn default() -> Self {
        Self::new(
            DEFAULT_CANVAS_HEIGHT,
            DEFAULT_CANVAS_MARGIN,
            DEFAULT_CANVAS_MARGIN,
        )
    }
}

/// Pixel extent of one tier at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub tier_id: TierId,
    pub name: String,
    pub order: u32,
    pub y_min: f64,
    pub y_max: f64,
    pub y_center: f64,
    pub is_foundational: bool,
}

impl Band {
    /// `[y_min, y_max)` as a span.
    #[must_use]
    pub fn span(&self) -> Span {
        Span::new(self.y_min, self.y_max)
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Half-open containment test.
    #[must_use]
    pub fn contains(&self, y: f64) -> bool {
        self.span().contains(y)
    }

    /// Range a node's top edge may occupy so a node of height `buffer`
    /// stays inside the band: `[y_min, max(y_min, y_max - buffer)]`.
    #[must_use]
    pub fn resting_span(&self, buffer: f64) -> Span {
        self.span().shrink_end(buffer)
    }
}

/// Non-empty, ordered set of bands.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BandSet {
    bands: Vec<Band>,
}

impl BandSet {
    /// Bands for a normalized tier set.
    #[must_use]
    pub fn for_tiers(tiers: &TierSet, frame: &CanvasFrame) -> Self {
        let count = tiers.len().max(1);
        let origin = frame.origin();
        let height_per_tier = frame.usable_height() / count as f64;

        let bands = tiers
            .iter()
            .enumerate()
            .map(|(index, tier)| {
                // Both edges from the same formula so neighbours abut exactly.
                let y_min = origin + index as f64 * height_per_tier;
                let y_max = origin + (index + 1) as f64 * height_per_tier;
                Band {
                    tier_id: tier.id.clone(),
                    name: tier.name.clone(),
                    order: tier.order,
                    y_min,
                    y_max,
                    y_center: (y_min + y_max) / 2.0,
                    is_foundational: tier.is_foundational,
                }
            })
            .collect();

        Self { bands }
    }

    /// All bands in order.
    #[must_use]
    pub fn as_slice(&self) -> &[Band] {
        &self.bands
    }

    pub fn iter(&self) -> impl Iterator<Item = &Band> {
        self.bands.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bands.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// The foundational band.
    #[must_use]
    pub fn foundational(&self) -> &Band {
        &self.bands[0]
    }

    #[must_use]
    pub fn first(&self) -> &Band {
        &self.bands[0]
    }

    #[must_use]
    pub fn last(&self) -> &Band {
        &self.bands[self.bands.len() - 1]
    }

    /// Band for a tier id.
    #[must_use]
    pub fn get(&self, tier_id: &TierId) -> Option<&Band> {
        self.bands.iter().find(|band| &band.tier_id == tier_id)
    }

    /// Covered extent `[first.y_min, last.y_max)`.
    #[must_use]
    pub fn extent(&self) -> Span {
        Span::new(self.first().y_min, self.last().y_max)
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Build bands for any tier list; the input is normalized first.
#[must_use]
pub fn build_bands(tiers: &[Tier], frame: &CanvasFrame) -> BandSet {
    BandSet::for_tiers(&normalize_tiers(tiers), frame)
}
