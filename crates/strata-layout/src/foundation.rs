#![forbid(unsafe_code)]

//! Deterministic grid packing for the foundational tier.
//!
//! Every node whose tier is the foundational tier gets a canonical slot in a
//! centered, row-major grid inside the foundational band, independent of how
//! it was created or where it was last dropped.
//!
//! # Ordering
//!
//! Slots are assigned in a stable order so repeated passes never shuffle
//! nodes:
//!
//! 1. *Placed* nodes (current `y` inside the band) come first, grouped into
//!    row buckets by `y` and sorted by `x` inside a bucket, then by creation
//!    stamp, then id.
//! 2. *Unplaced* nodes (e.g. freshly created at the origin) follow in
//!    creation order, then id.
//!
//! # Invariants
//!
//! 1. Every returned position satisfies `band.y_min <= y < band.y_max` for a
//!    band of positive height.
//! 2. Laying out an already laid-out node set returns the same positions and
//!    an empty correction list.
//!
//! # Failure Modes
//!
//! None. An empty node set yields an empty map.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strata_core::Point;

use crate::band::{Band, BandSet};
use crate::config::LayoutConfig;
use crate::node::{Correction, Node, NodeId};
use crate::tier::TierSet;

/// Grid dimensions for foundational nodes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoundationGrid {
    /// Left edge of the usable row width.
    pub min_x: f64,
    /// Right edge of the usable row width.
    pub max_x: f64,
    pub node_width: f64,
    pub node_height: f64,
    pub gap_x: f64,
    pub gap_y: f64,
    /// Distance from the band top to the first row.
    pub top_inset: f64,
    /// Max `y` distance for two nodes to share a row bucket.
    pub row_tolerance: f64,
}

impl Default for FoundationGrid {
    fn default() -> Self {
        Self {
            min_x: 120.0,
            max_x: 1200.0,
            node_width: 190.0,
            node_height: 90.0,
            gap_x: 18.0,
            gap_y: 14.0,
            top_inset: 50.0,
            row_tolerance: 50.0,
        }
    }
}

/// Vertical placement of rows for one pass.
#[derive(Debug, Clone, Copy)]
struct RowPlan {
    start_y: f64,
    pitch: f64,
}

impl FoundationGrid {
    #[must_use]
    pub fn usable_width(&self) -> f64 {
        (self.max_x - self.min_x).max(0.0)
    }

    /// Nodes per full row (at least one).
    #[must_use]
    pub fn columns(&self) -> usize {
        let per_node = self.node_width + self.gap_x;
        if per_node <= 0.0 {
            return 1;
        }
        let fit = ((self.usable_width() + self.gap_x) / per_node).floor();
        if fit.is_finite() && fit >= 1.0 {
            fit as usize
        } else {
            1
        }
    }

    /// Position of slot `index` in a grid of `total` nodes.
    #[must_use]
    pub fn slot(&self, index: usize, total: usize, band: &Band) -> Point {
        let plan = self.row_plan(total, band);
        self.slot_with_plan(index, total, &plan)
    }

    /// Foundational nodes of `nodes` in slot order.
    #[must_use]
    pub fn order<'a>(&self, nodes: &'a [Node], band: &Band) -> Vec<&'a Node> {
        let members: Vec<&Node> = nodes
            .iter()
            .filter(|node| node.tier_id.is_foundational())
            .collect();
        let plan = self.row_plan(members.len(), band);
        // Rows sit exactly `pitch` apart after a pass; half a pitch keeps
        // compressed rows from merging into one bucket.
        let tolerance = self.row_tolerance.min(plan.pitch / 2.0).max(0.0);

        let (mut placed, mut unplaced): (Vec<&Node>, Vec<&Node>) = members
            .into_iter()
            .partition(|node| band.contains(node.position.y));

        placed.sort_by(|a, b| a.position.y.total_cmp(&b.position.y));
        let mut ordered = Vec::with_capacity(placed.len() + unplaced.len());
        let mut bucket: Vec<&Node> = Vec::new();
        let mut anchor = 0.0;
        for node in placed {
            if !bucket.is_empty() && node.position.y - anchor > tolerance {
                flush_bucket(&mut bucket, &mut ordered);
            }
            if bucket.is_empty() {
                anchor = node.position.y;
            }
            bucket.push(node);
        }
        flush_bucket(&mut bucket, &mut ordered);

        unplaced.sort_by(|a, b| creation_order(a, b));
        ordered.extend(unplaced);
        ordered
    }

    /// Canonical position for every foundational node.
    #[must_use]
    pub fn layout(&self, nodes: &[Node], band: &Band) -> BTreeMap<NodeId, Point> {
        let ordered = self.order(nodes, band);
        let total = ordered.len();
        let plan = self.row_plan(total, band);
        ordered
            .into_iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), self.slot_with_plan(index, total, &plan)))
            .collect()
    }

    /// Corrections for foundational nodes whose canonical slot differs from
    /// their current position, in slot order.
    #[must_use]
    pub fn corrections(&self, nodes: &[Node], band: &Band) -> Vec<Correction> {
        let ordered = self.order(nodes, band);
        let total = ordered.len();
        let plan = self.row_plan(total, band);
        let corrections: Vec<Correction> = ordered
            .into_iter()
            .enumerate()
            .filter_map(|(index, node)| {
                let slot = self.slot_with_plan(index, total, &plan);
                (slot != node.position).then(|| Correction::moved(node.id.clone(), slot))
            })
            .collect();
        tracing::debug!(
            target: "strata.layout",
            members = total,
            moved = corrections.len(),
            "foundational layout pass"
        );
        corrections
    }

    /// Rows start `top_inset` below the band top and sit one node height
    /// plus `gap_y` apart. Only when the last row would then start at or
    /// past `band.y_max` is the pitch compressed, first so the last row ends
    /// inside the band, else so the row tops spread evenly over it.
    fn row_plan(&self, total: usize, band: &Band) -> RowPlan {
        let height = band.height().max(0.0);
        let inset = self.top_inset.min(height / 2.0).max(0.0);
        let start_y = band.y_min + inset;
        let natural = self.node_height + self.gap_y;

        let columns = self.columns();
        let rows = total.div_ceil(columns).max(1);
        if rows == 1 {
            return RowPlan {
                start_y,
                pitch: natural,
            };
        }

        let steps = (rows - 1) as f64;
        let fits = |pitch: f64| pitch > 0.0 && start_y + steps * pitch < band.y_max;
        if fits(natural) {
            return RowPlan {
                start_y,
                pitch: natural,
            };
        }

        let reach = (band.y_max - self.node_height).max(start_y);
        let squeezed = (reach - start_y) / steps;
        let pitch = if fits(squeezed) {
            squeezed
        } else {
            (band.y_max - start_y) / rows as f64
        };
        tracing::trace!(target: "strata.layout", rows, pitch, "compressing foundational rows");
        RowPlan { start_y, pitch }
    }

    fn slot_with_plan(&self, index: usize, total: usize, plan: &RowPlan) -> Point {
        let columns = self.columns();
        let row = index / columns;
        let col = index % columns;

        let last_row = total.saturating_sub(1) / columns;
        let nodes_in_row = if row == last_row {
            match total % columns {
                0 => columns,
                remainder => remainder,
            }
        } else {
            columns
        };

        let row_width =
            nodes_in_row as f64 * self.node_width + (nodes_in_row as f64 - 1.0) * self.gap_x;
        let start_x = self.min_x + ((self.usable_width() - row_width) / 2.0).max(0.0);

        Point::new(
            start_x + col as f64 * (self.node_width + self.gap_x),
            plan.start_y + row as f64 * plan.pitch,
        )
    }
}

fn flush_bucket<'a>(bucket: &mut Vec<&'a Node>, ordered: &mut Vec<&'a Node>) {
    bucket.sort_by(|a, b| {
        a.position
            .x
            .total_cmp(&b.position.x)
            .then_with(|| creation_order(a, b))
    });
    ordered.append(bucket);
}

/// Creation stamp ascending (missing stamps last), then id.
fn creation_order(a: &Node, b: &Node) -> Ordering {
    match (&a.created_at, &b.created_at) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.id.cmp(&b.id))
}

/// Snap every foundational node in `nodes` to its grid slot.
///
/// Returns the corrections that were applied.
pub fn apply_foundational_layout(
    nodes: &mut [Node],
    tiers: &TierSet,
    config: &LayoutConfig,
) -> Vec<Correction> {
    let bands = BandSet::for_tiers(tiers, &config.canvas);
    let corrections = config.foundation.corrections(nodes, bands.foundational());
    if corrections.is_empty() {
        return corrections;
    }
    let by_id: BTreeMap<&NodeId, &Correction> =
        corrections.iter().map(|c| (&c.id, c)).collect();
    for node in nodes.iter_mut() {
        if let Some(correction) = by_id.get(&node.id) {
            node.apply(correction);
        }
    }
    corrections
}
