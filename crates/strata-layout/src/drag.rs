#![forbid(unsafe_code)]

//! Drag interaction controller: resistance, snapping, and commit.
//!
//! Each node being dragged owns one [`DragSession`]. The controller is a
//! small per-node lifecycle machine:
//!
//! ```text
//! Idle -> Dragging -> Idle (committed | canceled)
//! ```
//!
//! Every call returns a [`DragTransition`] with a monotonically increasing
//! `transition_id`. Events that cannot apply (a second start, a move for a
//! node that is not being dragged) produce [`DragEffect::Noop`] instead of
//! failing.
//!
//! # Move decision table
//!
//! | locked | inside resting span | `|delta| <= threshold` | action |
//! |--------|---------------------|------------------------|--------|
//! | yes    | -                   | -                      | Clamp  |
//! | no     | yes                 | -                      | Accept |
//! | no     | no                  | yes                    | Resist |
//! | no     | no                  | no                     | Snap   |
//!
//! The resting span of a band is `[y_min, max(y_min, y_max - snap_buffer)]`,
//! the range a node's top edge may occupy while the node stays visually
//! inside the band.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use strata_core::{Point, Span};

use crate::band::{Band, BandSet};
use crate::node::{Correction, Node, NodeId};
use crate::placement::tier_for_y;
use crate::tier::TierId;

/// Tuning for resistance and snapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragTuning {
    /// Reserved space at the bottom of a band (roughly one node height).
    pub snap_buffer: f64,
    /// Displacement past a boundary at which the node snaps to a new tier.
    pub snap_threshold: f64,
    pub resistance_scale: f64,
    pub resistance_gain: f64,
    /// Fraction of the remaining distance covered by the snap frame.
    pub snap_lerp: f64,
}

impl Default for DragTuning {
    fn default() -> Self {
        Self {
            snap_buffer: 90.0,
            snap_threshold: 180.0,
            resistance_scale: 0.1,
            resistance_gain: 20.0,
            snap_lerp: 0.4,
        }
    }
}

impl DragTuning {
    /// Describe every invalid field; empty when usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !(self.snap_buffer.is_finite() && self.snap_buffer >= 0.0) {
            errors.push(format!(
                "drag.snap_buffer must be finite and >= 0 (got {})",
                self.snap_buffer
            ));
        }
        if !(self.snap_threshold.is_finite() && self.snap_threshold > 0.0) {
            errors.push(format!(
                "drag.snap_threshold must be finite and > 0 (got {})",
                self.snap_threshold
            ));
        }
        if !(self.resistance_scale.is_finite() && self.resistance_scale > 0.0) {
            errors.push(format!(
                "drag.resistance_scale must be finite and > 0 (got {})",
                self.resistance_scale
            ));
        }
        if !(self.resistance_gain.is_finite() && self.resistance_gain >= 0.0) {
            errors.push(format!(
                "drag.resistance_gain must be finite and >= 0 (got {})",
                self.resistance_gain
            ));
        }
        if !(self.snap_lerp > 0.0 && self.snap_lerp <= 1.0) {
            errors.push(format!(
                "drag.snap_lerp must be in (0, 1] (got {})",
                self.snap_lerp
            ));
        }
        errors
    }

    /// Same tuning with every field that fails [`validate`](Self::validate)
    /// replaced by its default.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let fallback = Self::default();
        let pick = |value: f64, ok: bool, default: f64| if ok { value } else { default };
        Self {
            snap_buffer: pick(
                self.snap_buffer,
                self.snap_buffer.is_finite() && self.snap_buffer >= 0.0,
                fallback.snap_buffer,
            ),
            snap_threshold: pick(
                self.snap_threshold,
                self.snap_threshold.is_finite() && self.snap_threshold > 0.0,
                fallback.snap_threshold,
            ),
            resistance_scale: pick(
                self.resistance_scale,
                self.resistance_scale.is_finite() && self.resistance_scale > 0.0,
                fallback.resistance_scale,
            ),
            resistance_gain: pick(
                self.resistance_gain,
                self.resistance_gain.is_finite() && self.resistance_gain >= 0.0,
                fallback.resistance_gain,
            ),
            snap_lerp: pick(
                self.snap_lerp,
                self.snap_lerp > 0.0 && self.snap_lerp <= 1.0,
                fallback.snap_lerp,
            ),
        }
    }

    /// Tuning for a canvas drawn at `factor` times the reference scale.
    ///
    /// Distances scale linearly and the easing curve keeps its shape.
    /// Non-positive or non-finite factors return `self` unchanged.
    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        if !(factor.is_finite() && factor > 0.0) {
            return self;
        }
        Self {
            snap_buffer: self.snap_buffer * factor,
            snap_threshold: self.snap_threshold * factor,
            resistance_scale: self.resistance_scale / factor,
            resistance_gain: self.resistance_gain * factor,
            snap_lerp: self.snap_lerp,
        }
    }

    /// Signed displayed displacement for a raw displacement `delta`.
    #[must_use]
    pub fn resist(&self, delta: f64) -> f64 {
        let eased = self.resistance_gain * (delta.abs() * self.resistance_scale + 1.0).log10();
        eased.copysign(delta)
    }
}

/// Lifecycle phase of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragPhase {
    Idle,
    Dragging,
}

/// Why a drag was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragCancelReason {
    EscapeKey,
    PointerCancel,
    FocusLost,
    Programmatic,
}

/// Events that were safely ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragNoopReason {
    SessionAlreadyActive,
    NoActiveSession,
    UnknownNode,
}

/// Outcome of [`decide_move`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DragAction {
    /// Locked node pinned to `y` inside the foundational band.
    Clamp { y: f64 },
    /// Pointer position used as-is.
    Accept,
    /// Eased pushback past `boundary` by raw displacement `delta`.
    Resist { boundary: f64, delta: f64 },
    /// Reclassify into `target`.
    Snap { target: TierId },
}

/// Live state of one drag gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragSession {
    pub node_id: NodeId,
    /// Tier the node currently belongs to; replaced on snap.
    pub origin_tier_id: TierId,
    pub is_locked: bool,
    pub start_position: Point,
    /// Last position handed back to the host.
    pub last_applied: Point,
}

impl DragSession {
    #[must_use]
    pub fn new(node: &Node) -> Self {
        Self {
            node_id: node.id.clone(),
            origin_tier_id: node.tier_id.clone(),
            is_locked: node.is_locked,
            start_position: node.position,
            last_applied: node.position,
        }
    }

    /// Band of the current origin tier, re-derived from the last applied
    /// position if that tier has no band any more.
    #[must_use]
    pub fn origin_band<'a>(&self, bands: &'a BandSet) -> &'a Band {
        if let Some(band) = bands.get(&self.origin_tier_id) {
            return band;
        }
        let fallback = tier_for_y(self.last_applied.y, bands);
        bands.get(fallback).unwrap_or_else(|| bands.last())
    }
}

/// Decide how a proposed pointer position is applied.
#[must_use]
pub fn decide_move(
    session: &DragSession,
    proposed: Point,
    bands: &BandSet,
    tuning: &DragTuning,
) -> DragAction {
    let y = pointer_y(proposed.y, session, bands, tuning);

    if session.is_locked {
        let resting = bands.foundational().resting_span(tuning.snap_buffer);
        return DragAction::Clamp {
            y: resting.clamp(y),
        };
    }

    let origin = session.origin_band(bands);
    let resting = origin.resting_span(tuning.snap_buffer);
    if resting.contains_inclusive(y) {
        return DragAction::Accept;
    }

    let boundary = if y < resting.min {
        resting.min
    } else {
        resting.max
    };
    let delta = y - boundary;
    if delta.abs() <= tuning.snap_threshold {
        return DragAction::Resist { boundary, delta };
    }

    let mut target = tier_for_y(y, bands);
    if target.is_foundational() {
        // Free nodes land in the first custom tier instead.
        target = bands
            .as_slice()
            .get(1)
            .map_or(&origin.tier_id, |band| &band.tier_id);
    }
    if *target == origin.tier_id {
        return DragAction::Resist {
            boundary,
            delta: tuning.snap_threshold.copysign(delta),
        };
    }
    DragAction::Snap {
        target: target.clone(),
    }
}

fn sanitize(value: f64, fallback: f64) -> f64 {
    if value.is_nan() { fallback } else { value }
}

/// Pointer `y` with NaN replaced by the last applied value and the result
/// kept within snapping reach of the canvas, so it is always finite.
fn pointer_y(y: f64, session: &DragSession, bands: &BandSet, tuning: &DragTuning) -> f64 {
    let reach = 2.0 * tuning.snap_threshold + tuning.snap_buffer;
    let extent = bands.extent();
    Span::new(extent.min - reach, extent.max + reach).clamp(sanitize(y, session.last_applied.y))
}

/// Effect emitted by one lifecycle step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum DragEffect {
    Started {
        origin_tier_id: TierId,
        position: Point,
    },
    Moved {
        action: DragAction,
        position: Point,
        tier_id: TierId,
    },
    Committed {
        correction: Correction,
    },
    Canceled {
        reason: DragCancelReason,
        /// Position the host should restore.
        restore: Point,
    },
    Noop {
        reason: DragNoopReason,
    },
}

/// One lifecycle transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragTransition {
    pub transition_id: u64,
    pub node_id: NodeId,
    pub from: DragPhase,
    pub to: DragPhase,
    pub effect: DragEffect,
}

impl DragTransition {
    /// Position the host should display after this transition, if any.
    #[must_use]
    pub fn position(&self) -> Option<Point> {
        match &self.effect {
            DragEffect::Started { position, .. } | DragEffect::Moved { position, .. } => {
                Some(*position)
            }
            DragEffect::Committed { correction } => Some(correction.position()),
            DragEffect::Canceled { restore, .. } => Some(*restore),
            DragEffect::Noop { .. } => None,
        }
    }

    #[must_use]
    pub fn is_noop(&self) -> bool {
        matches!(self.effect, DragEffect::Noop { .. })
    }
}

/// Drag lifecycle machine for any number of independently dragged nodes.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    tuning: DragTuning,
    sessions: FxHashMap<NodeId, DragSession>,
    transition_counter: u64,
}

impl DragController {
    /// Invalid tuning fields fall back to their defaults.
    #[must_use]
    pub fn new(tuning: DragTuning) -> Self {
        Self {
            tuning: tuning.sanitized(),
            sessions: FxHashMap::default(),
            transition_counter: 0,
        }
    }

    #[must_use]
    pub const fn tuning(&self) -> &DragTuning {
        &self.tuning
    }

    /// Replace the tuning; active sessions pick it up on their next move.
    pub fn set_tuning(&mut self, tuning: DragTuning) {
        self.tuning = tuning.sanitized();
    }

    #[must_use]
    pub fn session(&self, node_id: &NodeId) -> Option<&DragSession> {
        self.sessions.get(node_id)
    }

    #[must_use]
    pub fn is_dragging(&self, node_id: &NodeId) -> bool {
        self.sessions.contains_key(node_id)
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn phase(&self, node_id: &NodeId) -> DragPhase {
        if self.is_dragging(node_id) {
            DragPhase::Dragging
        } else {
            DragPhase::Idle
        }
    }

    /// Begin dragging `node`.
    pub fn start(&mut self, node: &Node) -> DragTransition {
        if self.is_dragging(&node.id) {
            return self.noop(&node.id, DragNoopReason::SessionAlreadyActive);
        }
        let session = DragSession::new(node);
        tracing::debug!(
            target: "strata.drag",
            node = %node.id,
            tier = %node.tier_id,
            locked = node.is_locked,
            "drag started"
        );
        let effect = DragEffect::Started {
            origin_tier_id: session.origin_tier_id.clone(),
            position: session.start_position,
        };
        self.sessions.insert(node.id.clone(), session);
        self.transition(&node.id, DragPhase::Idle, DragPhase::Dragging, effect)
    }

    /// Apply one pointer move.
    pub fn drag_to(&mut self, node_id: &NodeId, proposed: Point, bands: &BandSet) -> DragTransition {
        let tuning = self.tuning;
        let Some(session) = self.sessions.get_mut(node_id) else {
            return self.noop(node_id, DragNoopReason::NoActiveSession);
        };

        let action = decide_move(session, proposed, bands, &tuning);
        let x = sanitize(proposed.x, session.last_applied.x);
        let y = pointer_y(proposed.y, session, bands, &tuning);
        let position = match &action {
            DragAction::Clamp { y } => Point::new(x, *y),
            DragAction::Accept => Point::new(x, y),
            DragAction::Resist { boundary, delta } => {
                Point::new(x, boundary + tuning.resist(*delta))
            }
            DragAction::Snap { target } => {
                tracing::debug!(
                    target: "strata.drag",
                    node = %node_id,
                    from = %session.origin_tier_id,
                    to = %target,
                    "tier snap"
                );
                session.origin_tier_id = target.clone();
                let pointer = Point::new(x, y);
                if session.last_applied.y.is_finite() {
                    session.last_applied.lerp_y(pointer, tuning.snap_lerp)
                } else {
                    pointer
                }
            }
        };
        session.last_applied = position;
        tracing::trace!(
            target: "strata.drag",
            node = %node_id,
            action = ?action,
            y = position.y,
            "drag move"
        );

        let effect = DragEffect::Moved {
            action,
            position,
            tier_id: session.origin_tier_id.clone(),
        };
        self.transition(node_id, DragPhase::Dragging, DragPhase::Dragging, effect)
    }

    /// Finish the gesture and emit the persisted placement.
    pub fn end(&mut self, node_id: &NodeId, final_position: Point, bands: &BandSet) -> DragTransition {
        let Some(session) = self.sessions.remove(node_id) else {
            return self.noop(node_id, DragNoopReason::NoActiveSession);
        };

        let band = if session.is_locked {
            bands.foundational()
        } else {
            session.origin_band(bands)
        };
        let y = band
            .resting_span(self.tuning.snap_buffer)
            .clamp(sanitize(final_position.y, session.last_applied.y));
        let x = sanitize(final_position.x, session.last_applied.x);

        let mut tier_id = band.tier_id.clone();
        let classified = tier_for_y(y, bands);
        if *classified != tier_id {
            // Only happens for zero-height bands; the origin wins.
            tracing::debug!(
                target: "strata.drag",
                node = %node_id,
                origin = %tier_id,
                classified = %classified,
                "classifier disagrees with origin; keeping origin"
            );
        } else {
            tier_id = classified.clone();
        }

        let correction = Correction::reassigned(node_id.clone(), Point::new(x, y), tier_id);
        tracing::debug!(
            target: "strata.drag",
            node = %node_id,
            tier = ?correction.tier_id,
            y = correction.y_position,
            "drag committed"
        );
        self.transition(
            node_id,
            DragPhase::Dragging,
            DragPhase::Idle,
            DragEffect::Committed { correction },
        )
    }

    /// Abandon the gesture. The host restores the start position.
    pub fn cancel(&mut self, node_id: &NodeId, reason: DragCancelReason) -> DragTransition {
        let Some(session) = self.sessions.remove(node_id) else {
            return self.noop(node_id, DragNoopReason::NoActiveSession);
        };
        tracing::debug!(target: "strata.drag", node = %node_id, ?reason, "drag canceled");
        self.transition(
            node_id,
            DragPhase::Dragging,
            DragPhase::Idle,
            DragEffect::Canceled {
                reason,
                restore: session.start_position,
            },
        )
    }

    /// Cancel every active session, in node id order.
    pub fn force_cancel_all(&mut self) -> Vec<DragTransition> {
        let mut ids: Vec<NodeId> = self.sessions.keys().cloned().collect();
        ids.sort();
        ids.into_iter()
            .map(|id| self.cancel(&id, DragCancelReason::Programmatic))
            .collect()
    }

    pub(crate) fn noop(&mut self, node_id: &NodeId, reason: DragNoopReason) -> DragTransition {
        let phase = self.phase(node_id);
        self.transition(node_id, phase, phase, DragEffect::Noop { reason })
    }

    fn transition(
        &mut self,
        node_id: &NodeId,
        from: DragPhase,
        to: DragPhase,
        effect: DragEffect,
    ) -> DragTransition {
        self.transition_counter = self.transition_counter.saturating_add(1);
        DragTransition {
            transition_id: self.transition_counter,
            node_id: node_id.clone(),
            from,
            to,
            effect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::CanvasFrame;
    use crate::tier::{FOUNDATIONAL_TIER_ID, default_tiers};

    fn bands() -> BandSet {
        BandSet::for_tiers(&default_tiers(), &CanvasFrame::default())
    }

    fn free_node() -> Node {
        Node::new("n", "tier_1", Point::new(300.0, 300.0))
    }

    fn moved_tier(transition: &DragTransition) -> &TierId {
        match &transition.effect {
            DragEffect::Moved { tier_id, .. } => tier_id,
            other => panic!("expected move, got {other:?}"),
        }
    }

    #[test]
    fn easing_stays_below_raw_displacement() {
        let tuning = DragTuning::default();
        for d in [0.5, 1.0, 10.0, 50.0, 120.0, 180.0] {
            let eased = tuning.resist(d);
            assert!(eased > 0.0 && eased < d, "f({d}) = {eased}");
            assert_eq!(tuning.resist(-d), -eased);
        }
        assert_eq!(tuning.resist(0.0), 0.0);
    }

    #[test]
    fn small_overshoot_resists_without_tier_change() {
        let bands = bands();
        let mut controller = DragController::default();
        let node = free_node();
        controller.start(&node);

        // tier_1 resting span is [232.5, 335]; delta 50 below it.
        let transition = controller.drag_to(&node.id, Point::new(310.0, 385.0), &bands);
        let DragEffect::Moved {
            action, position, ..
        } = &transition.effect
        else {
            panic!("expected move");
        };
        assert_eq!(
            *action,
            DragAction::Resist {
                boundary: 335.0,
                delta: 50.0
            }
        );
        assert!((position.y - (335.0 + 20.0 * 6f64.log10())).abs() < 1e-9);
        assert_eq!(position.x, 310.0);
        assert_eq!(moved_tier(&transition).as_str(), "tier_1");
    }

    #[test]
    fn large_overshoot_snaps_to_tier_below() {
        let bands = bands();
        let mut controller = DragController::default();
        let node = free_node();
        controller.start(&node);

        let transition = controller.drag_to(&node.id, Point::new(300.0, 555.0), &bands);
        assert_eq!(moved_tier(&transition).as_str(), "tier_2");
        let position = transition.position().expect("move has a position");
        assert!((position.y - (300.0 + 255.0 * 0.4)).abs() < 1e-9);

        let end = controller.end(&node.id, Point::new(300.0, 560.0), &bands);
        let DragEffect::Committed { correction } = &end.effect else {
            panic!("expected commit");
        };
        assert_eq!(correction.tier_id.as_ref().map(TierId::as_str), Some("tier_2"));
        assert_eq!(correction.y_position, 527.5);
        assert!(!controller.is_dragging(&node.id));
    }

    #[test]
    fn resistance_anchors_on_snapped_tier() {
        let bands = bands();
        let mut controller = DragController::default();
        let node = free_node();
        controller.start(&node);
        controller.drag_to(&node.id, Point::new(300.0, 555.0), &bands);

        // Back above tier_2 by 50: resist against tier_2's top, not tier_1.
        let back = controller.drag_to(&node.id, Point::new(300.0, 375.0), &bands);
        assert_eq!(moved_tier(&back).as_str(), "tier_2");
        let DragEffect::Moved { action, .. } = &back.effect else {
            panic!("expected move");
        };
        assert_eq!(
            *action,
            DragAction::Resist {
                boundary: 425.0,
                delta: -50.0
            }
        );
    }

    #[test]
    fn free_node_never_snaps_into_foundation() {
        let bands = bands();
        let mut controller = DragController::default();
        let node = Node::new("n", "tier_2", Point::new(300.0, 450.0));
        controller.start(&node);

        let transition = controller.drag_to(&node.id, Point::new(300.0, 60.0), &bands);
        assert_eq!(moved_tier(&transition).as_str(), "tier_1");

        // Already in tier_1: pushing further up only resists.
        let again = controller.drag_to(&node.id, Point::new(300.0, -400.0), &bands);
        assert_eq!(moved_tier(&again).as_str(), "tier_1");
        let DragEffect::Moved { action, .. } = &again.effect else {
            panic!("expected move");
        };
        assert_eq!(
            *action,
            DragAction::Resist {
                boundary: 232.5,
                delta: -180.0
            }
        );
    }

    #[test]
    fn locked_node_is_clamped_to_foundation() {
        let bands = bands();
        let mut controller = DragController::default();
        let node = Node::new("core", FOUNDATIONAL_TIER_ID, Point::new(500.0, 90.0)).locked();
        controller.start(&node);

        let low = controller.drag_to(&node.id, Point::new(520.0, 700.0), &bands);
        assert_eq!(low.position(), Some(Point::new(520.0, 142.5)));
        assert_eq!(moved_tier(&low).as_str(), FOUNDATIONAL_TIER_ID);

        let high = controller.drag_to(&node.id, Point::new(520.0, -50.0), &bands);
        assert_eq!(high.position(), Some(Point::new(520.0, 40.0)));

        let end = controller.end(&node.id, Point::new(520.0, 800.0), &bands);
        let DragEffect::Committed { correction } = &end.effect else {
            panic!("expected commit");
        };
        assert_eq!(correction.y_position, 142.5);
        assert_eq!(
            correction.tier_id.as_ref().map(TierId::as_str),
            Some(FOUNDATIONAL_TIER_ID)
        );
    }

    #[test]
    fn cancel_reports_start_position() {
        let bands = bands();
        let mut controller = DragController::default();
        let node = free_node();
        controller.start(&node);
        controller.drag_to(&node.id, Point::new(300.0, 700.0), &bands);

        let canceled = controller.cancel(&node.id, DragCancelReason::EscapeKey);
        assert_eq!(
            canceled.effect,
            DragEffect::Canceled {
                reason: DragCancelReason::EscapeKey,
                restore: Point::new(300.0, 300.0),
            }
        );
        assert_eq!(canceled.to, DragPhase::Idle);
    }

    #[test]
    fn events_without_session_are_noops() {
        let bands = bands();
        let mut controller = DragController::default();
        let id = NodeId::new("ghost");
        for transition in [
            controller.drag_to(&id, Point::new(1.0, 1.0), &bands),
            controller.end(&id, Point::new(1.0, 1.0), &bands),
            controller.cancel(&id, DragCancelReason::FocusLost),
        ] {
            assert_eq!(
                transition.effect,
                DragEffect::Noop {
                    reason: DragNoopReason::NoActiveSession
                }
            );
            assert_eq!(transition.from, DragPhase::Idle);
        }
    }

    #[test]
    fn second_start_is_noop() {
        let mut controller = DragController::default();
        let node = free_node();
        let first = controller.start(&node);
        let second = controller.start(&node);
        assert_eq!(
            second.effect,
            DragEffect::Noop {
                reason: DragNoopReason::SessionAlreadyActive
            }
        );
        assert!(second.transition_id > first.transition_id);
        assert_eq!(controller.active_count(), 1);
    }

    #[test]
    fn nan_pointer_keeps_last_position() {
        let bands = bands();
        let mut controller = DragController::default();
        let node = free_node();
        controller.start(&node);
        let transition = controller.drag_to(&node.id, Point::new(f64::NAN, f64::NAN), &bands);
        assert_eq!(transition.position(), Some(Point::new(300.0, 300.0)));
    }

    #[test]
    fn non_finite_pointer_stays_finite() {
        let bands = bands();
        let mut controller = DragController::default();
        let node = Node::new("n", "tier_1", Point::new(300.0, f64::NAN));
        controller.start(&node);
        for y in [f64::NAN, f64::INFINITY, 400.0, f64::NEG_INFINITY, 500.0] {
            let transition = controller.drag_to(&node.id, Point::new(300.0, y), &bands);
            let position = transition.position().expect("move has a position");
            assert!(position.y.is_finite(), "y={y} produced {}", position.y);
        }
    }

    #[test]
    fn missing_origin_band_is_rederived() {
        let mut controller = DragController::default();
        let node = Node::new("n", "gone", Point::new(300.0, 500.0));
        controller.start(&node);
        let session = controller.session(&node.id).expect("session exists");
        assert_eq!(session.origin_band(&bands()).tier_id.as_str(), "tier_2");
    }

    #[test]
    fn scaled_tuning_preserves_curve_shape() {
        let base = DragTuning::default();
        let doubled = base.scaled(2.0);
        assert_eq!(doubled.snap_threshold, 360.0);
        assert!((doubled.resist(100.0) - 2.0 * base.resist(50.0)).abs() < 1e-9);
        assert_eq!(base.scaled(0.0), base);
        assert_eq!(base.scaled(f64::NAN), base);
    }

    #[test]
    fn validate_flags_bad_values() {
        assert!(DragTuning::default().validate().is_empty());
        let bad = DragTuning {
            snap_threshold: 0.0,
            snap_lerp: 1.5,
            ..DragTuning::default()
        };
        assert_eq!(bad.validate().len(), 2);
    }

    #[test]
    fn sanitized_replaces_only_invalid_fields() {
        let tuning = DragTuning {
            snap_buffer: f64::NAN,
            snap_threshold: f64::INFINITY,
            resistance_scale: 0.2,
            resistance_gain: -1.0,
            snap_lerp: 0.7,
        }
        .sanitized();
        let defaults = DragTuning::default();
        assert_eq!(tuning.snap_buffer, defaults.snap_buffer);
        assert_eq!(tuning.snap_threshold, defaults.snap_threshold);
        assert_eq!(tuning.resistance_scale, 0.2);
        assert_eq!(tuning.resistance_gain, defaults.resistance_gain);
        assert_eq!(tuning.snap_lerp, 0.7);
        assert!(tuning.validate().is_empty());
    }

    #[test]
    fn controller_never_keeps_invalid_tuning() {
        let nan = DragTuning {
            snap_threshold: f64::NAN,
            ..DragTuning::default()
        };
        let mut controller = DragController::new(nan);
        assert_eq!(*controller.tuning(), DragTuning::default());
        controller.set_tuning(nan);
        assert_eq!(*controller.tuning(), DragTuning::default());

        let node = free_node();
        controller.start(&node);
        let transition = controller.drag_to(&node.id, Point::new(310.0, 385.0), &bands());
        assert!(transition.position().is_some_and(|p| p.y.is_finite()));
    }

    #[test]
    fn displacement_equal_to_threshold_still_resists() {
        let bands = bands();
        let tuning = DragTuning::default();
        let session = DragSession::new(&free_node());
        // tier_1 resting span ends at 335.
        let at_threshold = decide_move(&session, Point::new(300.0, 335.0 + 180.0), &bands, &tuning);
        assert_eq!(
            at_threshold,
            DragAction::Resist {
                boundary: 335.0,
                delta: 180.0
            }
        );
    }

    #[test]
    fn displacement_past_threshold_snaps() {
        let bands = bands();
        let tuning = DragTuning::default();
        let session = DragSession::new(&free_node());
        let past = decide_move(&session, Point::new(300.0, 335.0 + 180.001), &bands, &tuning);
        assert_eq!(
            past,
            DragAction::Snap {
                target: TierId::new("tier_2")
            }
        );
    }

    #[test]
    fn force_cancel_all_is_ordered() {
        let mut controller = DragController::default();
        controller.start(&Node::new("b", "tier_1", Point::default()));
        controller.start(&Node::new("a", "tier_1", Point::default()));
        let canceled = controller.force_cancel_all();
        let ids: Vec<&str> = canceled.iter().map(|t| t.node_id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(controller.active_count(), 0);
    }
}
