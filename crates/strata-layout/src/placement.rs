#![forbid(unsafe_code)]

//! Vertical position → tier classification.
//!
//! Classification is total: every `f64` (negative, beyond the canvas, NaN)
//! maps to some tier of a non-empty [`BandSet`].
//!
//! | `y`                         | result        |
//! |-----------------------------|---------------|
//! | `< first.y_min`             | first tier    |
//! | in `[y_min, y_max)` of band | that tier     |
//! | `>= last.y_max`, NaN        | last tier     |

use crate::band::{BandSet, CanvasFrame, build_bands};
use crate::tier::{Tier, TierId};

/// Tier owning `y`.
#[must_use]
pub fn tier_for_y(y: f64, bands: &BandSet) -> &TierId {
    let band = match band_index_for_y(y, bands) {
        Some(index) => &bands.as_slice()[index],
        None => bands.last(),
    };
    &band.tier_id
}

/// Normalize `tiers`, build bands for `frame`, and classify `y`.
#[must_use]
pub fn classify_y(y: f64, tiers: &[Tier], frame: &CanvasFrame) -> TierId {
    let bands = build_bands(tiers, frame);
    tier_for_y(y, &bands).clone()
}

/// Index of the band owning `y`, or `None` when it clamps to the last band.
fn band_index_for_y(y: f64, bands: &BandSet) -> Option<usize> {
    if y < bands.first().y_min {
        return Some(0);
    }
    bands.iter().position(|band| band.contains(y))
}
