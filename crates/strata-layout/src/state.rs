#![forbid(unsafe_code)]

//! Owned layout state for one canvas.
//!
//! [`LayoutState`] holds the tier list, the node slice the engine cares
//! about, the band cache for the current canvas height, and the active drag
//! sessions. Hosts drive it from a single event loop; every method either
//! reads or computes a full new value before replacing the old one.
//!
//! Methods that move nodes return the [`Correction`]s the persistence layer
//! needs, in application order and coalesced per node.

use rustc_hash::FxHashMap;
use serde::Serialize;
use strata_core::Point;

use crate::band::BandSet;
use crate::config::LayoutConfig;
use crate::drag::{DragCancelReason, DragController, DragEffect, DragNoopReason, DragTransition};
use crate::mutation::{
    self, Direction, TierMutationError, add_custom_tier, remove_top_custom_tier,
};
use crate::node::{Correction, Node, NodeId};
use crate::placement::tier_for_y;
use crate::tier::{TierId, TierSet};

/// Outcome of [`LayoutState::remove_top_tier`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierMigration {
    pub removed_tier_id: TierId,
    /// Tier that received the removed tier's nodes.
    pub target_tier_id: TierId,
    /// Migrated nodes plus any foundation re-flow, coalesced per node.
    pub corrections: Vec<Correction>,
}

/// Tiers, nodes, bands, and drag sessions of one canvas.
#[derive(Debug, Clone)]
pub struct LayoutState {
    config: LayoutConfig,
    tiers: TierSet,
    bands: BandSet,
    nodes: Vec<Node>,
    index: FxHashMap<NodeId, usize>,
    drag: DragController,
}

impl Default for LayoutState {
    fn default() -> Self {
        Self::new(LayoutConfig::default(), TierSet::default(), Vec::new())
    }
}

impl LayoutState {
    /// Build state as loaded from storage. Positions are not touched; call
    /// [`relayout_foundation`](Self::relayout_foundation) to settle them.
    ///
    /// Later duplicates of a node id replace earlier ones.
    #[must_use]
    pub fn new(config: LayoutConfig, tiers: TierSet, nodes: Vec<Node>) -> Self {
        let bands = BandSet::for_tiers(&tiers, &config.canvas);
        let mut state = Self {
            config,
            tiers,
            bands,
            nodes: Vec::with_capacity(nodes.len()),
            index: FxHashMap::default(),
            drag: DragController::new(config.drag),
        };
        for node in nodes {
            state.upsert(node);
        }
        state
    }

    #[must_use]
    pub const fn config(&self) -> &LayoutConfig {
        &self.config
    }

    #[must_use]
    pub const fn tiers(&self) -> &TierSet {
        &self.tiers
    }

    #[must_use]
    pub const fn bands(&self) -> &BandSet {
        &self.bands
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.index.get(id).map(|&slot| &self.nodes[slot])
    }

    #[must_use]
    pub const fn drag(&self) -> &DragController {
        &self.drag
    }

    /// Tier a node created at `position` should belong to.
    #[must_use]
    pub fn classify_new_node(&self, position: Point) -> TierId {
        tier_for_y(position.y, &self.bands).clone()
    }

    /// Add or replace a node. Re-flows the foundation when foundational
    /// membership changed.
    pub fn insert_node(&mut self, node: Node) -> Vec<Correction> {
        let joins = node.tier_id.is_foundational();
        let previous = self.upsert(node);
        let leaves = previous.is_some_and(|old| old.tier_id.is_foundational());
        if joins || leaves {
            self.relayout_foundation()
        } else {
            Vec::new()
        }
    }

    /// Remove a node and cancel its drag, if any.
    pub fn remove_node(&mut self, id: &NodeId) -> Vec<Correction> {
        let Some(slot) = self.index.remove(id) else {
            return Vec::new();
        };
        if self.drag.is_dragging(id) {
            self.drag.cancel(id, DragCancelReason::Programmatic);
        }
        let removed = self.nodes.remove(slot);
        self.rebuild_index();
        tracing::debug!(target: "strata.state", node = %id, "node removed");
        if removed.tier_id.is_foundational() {
            self.relayout_foundation()
        } else {
            Vec::new()
        }
    }

    /// Change the canvas height and re-flow the foundation.
    ///
    /// A negative or non-finite height is ignored.
    pub fn set_canvas_height(&mut self, canvas_height: f64) -> Vec<Correction> {
        if !(canvas_height.is_finite() && canvas_height >= 0.0) {
            tracing::warn!(target: "strata.state", canvas_height, "ignoring invalid canvas height");
            return Vec::new();
        }
        self.config = self.config.with_canvas_height(canvas_height);
        self.rebuild_bands();
        self.relayout_foundation()
    }

    /// Append a custom tier.
    pub fn add_tier(&mut self) -> Vec<Correction> {
        self.tiers = add_custom_tier(&self.tiers);
        self.rebuild_bands();
        self.relayout_foundation()
    }

    /// Remove the top custom tier, migrating its nodes to the tier below.
    ///
    /// Migrated nodes keep their `x` and have their `y` clamped into the
    /// target tier's resting span.
    ///
    /// # Errors
    ///
    /// [`TierMutationError::NoRemovableTier`] with the state unchanged.
    pub fn remove_top_tier(&mut self) -> Result<TierMigration, TierMutationError> {
        let removal = remove_top_custom_tier(&self.tiers)?;
        self.tiers = removal.tiers;
        self.rebuild_bands();

        let buffer = self.config.drag.snap_buffer;
        let resting = self
            .bands
            .get(&removal.target_tier_id)
            .unwrap_or_else(|| self.bands.foundational())
            .resting_span(buffer);
        let mut corrections = Vec::new();
        for node in &mut self.nodes {
            if node.tier_id != removal.removed_tier_id {
                continue;
            }
            let position = node.position.with_y(resting.clamp(node.position.y));
            let correction = Correction::reassigned(
                node.id.clone(),
                position,
                removal.target_tier_id.clone(),
            );
            node.apply(&correction);
            corrections.push(correction);
        }
        tracing::debug!(
            target: "strata.state",
            removed = %removal.removed_tier_id,
            target = %removal.target_tier_id,
            migrated = corrections.len(),
            "tier removed"
        );

        let reflow = self.relayout_foundation();
        Ok(TierMigration {
            removed_tier_id: removal.removed_tier_id,
            target_tier_id: removal.target_tier_id,
            corrections: coalesce(corrections, reflow),
        })
    }

    /// Move a custom tier to `target_index`. Returns whether the order changed.
    pub fn move_tier_to_index(&mut self, tier_id: &TierId, target_index: usize) -> bool {
        let next = mutation::move_tier_to_index(&self.tiers, tier_id, target_index);
        self.replace_tiers(next)
    }

    /// Swap a custom tier with its neighbour. Returns whether the order changed.
    pub fn move_tier(&mut self, tier_id: &TierId, direction: Direction) -> bool {
        let next = mutation::move_tier(&self.tiers, tier_id, direction);
        self.replace_tiers(next)
    }

    /// Rename a custom tier. Returns whether the name changed.
    pub fn rename_tier(&mut self, tier_id: &TierId, name: &str) -> bool {
        let next = mutation::rename_tier(&self.tiers, tier_id, name);
        self.replace_tiers(next)
    }

    /// Snap every foundational node to its grid slot.
    pub fn relayout_foundation(&mut self) -> Vec<Correction> {
        let corrections = self
            .config
            .foundation
            .corrections(&self.nodes, self.bands.foundational());
        for correction in &corrections {
            self.apply_one(correction);
        }
        corrections
    }

    /// Apply externally produced corrections. Returns how many matched a node.
    pub fn apply_corrections(&mut self, corrections: &[Correction]) -> usize {
        corrections
            .iter()
            .filter(|correction| self.apply_one(correction))
            .count()
    }

    /// Begin dragging a node.
    pub fn start_drag(&mut self, id: &NodeId) -> DragTransition {
        match self.index.get(id) {
            Some(&slot) => self.drag.start(&self.nodes[slot]),
            None => self.drag.noop(id, DragNoopReason::UnknownNode),
        }
    }

    /// Move a dragged node; its live position follows the transition.
    pub fn drag_node(&mut self, id: &NodeId, proposed: Point) -> DragTransition {
        let transition = self.drag.drag_to(id, proposed, &self.bands);
        if let (Some(position), Some(&slot)) = (transition.position(), self.index.get(id)) {
            self.nodes[slot].position = position;
        }
        transition
    }

    /// Drop a dragged node. Returns the commit transition and every
    /// correction it caused, including a foundation re-flow when the node
    /// entered or left the foundational tier or was foundational.
    pub fn end_drag(&mut self, id: &NodeId, final_position: Point) -> (DragTransition, Vec<Correction>) {
        let transition = self.drag.end(id, final_position, &self.bands);
        let committed = match &transition.effect {
            DragEffect::Committed { correction } => Some(correction.clone()),
            _ => None,
        };
        let Some(correction) = committed else {
            return (transition, Vec::new());
        };

        let was_foundational = self
            .node(id)
            .is_some_and(|node| node.tier_id.is_foundational());
        let is_foundational = correction
            .tier_id
            .as_ref()
            .is_some_and(TierId::is_foundational);
        self.apply_one(&correction);
        let committed = vec![correction];

        let corrections = if was_foundational || is_foundational {
            coalesce(committed, self.relayout_foundation())
        } else {
            committed
        };
        (transition, corrections)
    }

    /// Abandon a drag and restore the node's start position.
    pub fn cancel_drag(&mut self, id: &NodeId, reason: DragCancelReason) -> DragTransition {
        let transition = self.drag.cancel(id, reason);
        if let DragEffect::Canceled { restore, .. } = &transition.effect {
            if let Some(&slot) = self.index.get(id) {
                self.nodes[slot].position = *restore;
            }
        }
        transition
    }

    fn upsert(&mut self, node: Node) -> Option<Node> {
        if let Some(&slot) = self.index.get(&node.id) {
            return Some(std::mem::replace(&mut self.nodes[slot], node));
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        None
    }

    fn apply_one(&mut self, correction: &Correction) -> bool {
        match self.index.get(&correction.id) {
            Some(&slot) => self.nodes[slot].apply(correction),
            None => false,
        }
    }

    fn replace_tiers(&mut self, next: TierSet) -> bool {
        if next == self.tiers {
            return false;
        }
        self.tiers = next;
        self.rebuild_bands();
        true
    }

    fn rebuild_bands(&mut self) {
        self.bands = BandSet::for_tiers(&self.tiers, &self.config.canvas);
        tracing::trace!(
            target: "strata.state",
            tiers = self.tiers.len(),
            canvas_height = self.config.canvas.canvas_height,
            "bands rebuilt"
        );
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(slot, node)| (node.id.clone(), slot))
            .collect();
    }
}

/// Merge two correction batches, one entry per node in first-seen order.
/// Later positions win; a tier change survives a later position-only entry.
fn coalesce(first: Vec<Correction>, second: Vec<Correction>) -> Vec<Correction> {
    let mut merged: Vec<Correction> = Vec::with_capacity(first.len() + second.len());
    let mut seen: FxHashMap<NodeId, usize> = FxHashMap::default();
    for correction in first.into_iter().chain(second) {
        match seen.get(&correction.id) {
            Some(&slot) => {
                let entry = &mut merged[slot];
                entry.x_position = correction.x_position;
                entry.y_position = correction.y_position;
                if correction.tier_id.is_some() {
                    entry.tier_id = correction.tier_id;
                }
            }
            None => {
                seen.insert(correction.id.clone(), merged.len());
                merged.push(correction);
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tier::FOUNDATIONAL_TIER_ID;

    fn core(id: &str, stamp: &str) -> Node {
        Node::new(id, FOUNDATIONAL_TIER_ID, Point::default())
            .locked()
            .created_at(stamp)
    }

    fn sample() -> LayoutState {
        let mut state = LayoutState::new(
            LayoutConfig::default(),
            TierSet::default(),
            vec![
                core("c1", "1"),
                core("c2", "2"),
                Node::new("free", "tier_1", Point::new(300.0, 300.0)),
                Node::new("top", "tier_3", Point::new(400.0, 700.0)),
            ],
        );
        state.relayout_foundation();
        state
    }

    #[test]
    fn classify_new_node_uses_bands() {
        let state = sample();
        assert_eq!(state.classify_new_node(Point::new(0.0, 80.0)).as_str(), FOUNDATIONAL_TIER_ID);
        assert_eq!(state.classify_new_node(Point::new(0.0, 500.0)).as_str(), "tier_2");
    }

    #[test]
    fn inserting_foundational_node_reflows() {
        let mut state = sample();
        let corrections = state.insert_node(core("c3", "3"));
        assert!(corrections.iter().any(|c| c.id.as_str() == "c3"));
        let c3 = state.node(&"c3".into()).expect("inserted");
        assert!(state.bands().foundational().contains(c3.position.y));

        assert!(state
            .insert_node(Node::new("another", "tier_2", Point::new(1.0, 500.0)))
            .is_empty());
    }

    #[test]
    fn removing_foundational_node_recenters_rest() {
        let mut state = sample();
        let corrections = state.remove_node(&"c1".into());
        assert_eq!(corrections.len(), 1);
        assert_eq!(corrections[0].id.as_str(), "c2");
        assert_eq!(corrections[0].x_position, 565.0);
        assert!(state.node(&"c1".into()).is_none());
        assert!(state.remove_node(&"c1".into()).is_empty());
    }

    #[test]
    fn remove_top_tier_migrates_nodes() {
        let mut state = sample();
        let migration = state.remove_top_tier().expect("removable");
        assert_eq!(migration.removed_tier_id.as_str(), "tier_3");
        assert_eq!(migration.target_tier_id.as_str(), "tier_2");
        let top = migration
            .corrections
            .iter()
            .find(|c| c.id.as_str() == "top")
            .expect("migrated");
        assert_eq!(top.tier_id.as_ref().map(TierId::as_str), Some("tier_2"));
        let band = state.bands().get(&"tier_2".into()).expect("band");
        assert!(band.contains(top.y_position));
        assert_eq!(state.node(&"top".into()).map(|n| n.tier_id.as_str()), Some("tier_2"));
    }

    #[test]
    fn remove_top_tier_refuses_at_minimum() {
        let mut state = LayoutState::new(
            LayoutConfig::default(),
            crate::tier::normalize_tiers(&[crate::tier::Tier::foundational()]),
            Vec::new(),
        );
        let before = state.tiers().clone();
        assert_eq!(state.remove_top_tier(), Err(TierMutationError::NoRemovableTier));
        assert_eq!(state.tiers(), &before);
    }

    #[test]
    fn drag_updates_live_position_and_cancel_restores() {
        let mut state = sample();
        let id = NodeId::new("free");
        state.start_drag(&id);
        state.drag_node(&id, Point::new(320.0, 310.0));
        assert_eq!(state.node(&id).map(|n| n.position), Some(Point::new(320.0, 310.0)));

        state.cancel_drag(&id, DragCancelReason::EscapeKey);
        assert_eq!(state.node(&id).map(|n| n.position), Some(Point::new(300.0, 300.0)));
    }

    #[test]
    fn drag_commit_updates_tier() {
        let mut state = sample();
        let id = NodeId::new("free");
        state.start_drag(&id);
        state.drag_node(&id, Point::new(300.0, 560.0));
        let (transition, corrections) = state.end_drag(&id, Point::new(300.0, 560.0));
        assert!(matches!(transition.effect, DragEffect::Committed { .. }));
        assert_eq!(corrections.len(), 1);
        assert_eq!(state.node(&id).map(|n| n.tier_id.as_str()), Some("tier_2"));
    }

    #[test]
    fn unknown_node_drag_is_noop() {
        let mut state = sample();
        let transition = state.start_drag(&"ghost".into());
        assert_eq!(
            transition.effect,
            DragEffect::Noop {
                reason: DragNoopReason::UnknownNode
            }
        );
    }

    #[test]
    fn tier_edits_report_changes() {
        let mut state = sample();
        assert!(state.rename_tier(&"tier_1".into(), "Creeds"));
        assert!(!state.rename_tier(&"tier_1".into(), "Creeds"));
        assert!(state.move_tier(&"tier_1".into(), Direction::Down));
        assert_eq!(state.bands().as_slice()[2].name, "Creeds");
        assert!(!state.move_tier_to_index(&"tier_1".into(), 9));
    }

    #[test]
    fn canvas_resize_keeps_foundation_inside_band() {
        let mut state = sample();
        state.set_canvas_height(500.0);
        let band = state.bands().foundational().clone();
        for node in state.nodes().iter().filter(|n| n.tier_id.is_foundational()) {
            assert!(band.contains(node.position.y));
        }
    }

    #[test]
    fn invalid_canvas_height_is_ignored() {
        let mut state = sample();
        let before = state.bands().clone();
        for height in [f64::INFINITY, f64::NAN, -10.0] {
            assert!(state.set_canvas_height(height).is_empty());
            assert_eq!(state.bands(), &before);
        }

        let id = NodeId::new("free");
        state.start_drag(&id);
        let transition = state.drag_node(&id, Point::new(1.0, 310.0));
        assert!(transition.position().is_some_and(|p| p.y.is_finite()));
    }

    #[test]
    fn non_finite_config_still_drags() {
        let mut config = LayoutConfig::default();
        config.canvas.canvas_height = f64::INFINITY;
        config.drag.snap_threshold = f64::NAN;
        config.drag.snap_buffer = f64::INFINITY;
        let mut state = LayoutState::new(
            config,
            TierSet::default(),
            vec![Node::new("free", "tier_1", Point::new(300.0, 300.0))],
        );
        let id = NodeId::new("free");
        state.start_drag(&id);
        for y in [310.0, -5_000.0, f64::NAN, 9_000.0] {
            let transition = state.drag_node(&id, Point::new(1.0, y));
            assert!(transition.position().is_some_and(|p| p.y.is_finite()), "y={y}");
        }
        let (_, corrections) = state.end_drag(&id, Point::new(1.0, 400.0));
        assert!(corrections.iter().all(|c| c.y_position.is_finite()));
    }

    #[test]
    fn coalesce_merges_per_node() {
        let a = Correction::reassigned("a".into(), Point::new(1.0, 1.0), "tier_2".into());
        let b = Correction::moved("b".into(), Point::new(2.0, 2.0));
        let a2 = Correction::moved("a".into(), Point::new(3.0, 3.0));
        let merged = coalesce(vec![a, b], vec![a2]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].position(), Point::new(3.0, 3.0));
        assert_eq!(merged[0].tier_id.as_ref().map(TierId::as_str), Some("tier_2"));
    }
}
