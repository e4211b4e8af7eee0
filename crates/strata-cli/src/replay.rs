//! Drag trace replay.
//!
//! A trace is a JSON array of pointer events applied in order:
//!
//! ```json
//! [
//!   { "event": "start", "node": "n1" },
//!   { "event": "move", "node": "n1", "x": 300, "y": 555 },
//!   { "event": "end", "node": "n1", "x": 300, "y": 560 },
//!   { "event": "cancel", "node": "n2", "reason": "escape_key" }
//! ]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use strata_layout::{Correction, DragCancelReason, DragTransition, LayoutState, NodeId, Point};

use crate::error::{CliError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    Start {
        node: NodeId,
    },
    Move {
        node: NodeId,
        x: f64,
        y: f64,
    },
    End {
        node: NodeId,
        x: f64,
        y: f64,
    },
    Cancel {
        node: NodeId,
        #[serde(default = "default_cancel_reason")]
        reason: DragCancelReason,
    },
}

fn default_cancel_reason() -> DragCancelReason {
    DragCancelReason::Programmatic
}

/// Everything a replay produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplayOutcome {
    pub transitions: Vec<DragTransition>,
    pub corrections: Vec<Correction>,
}

pub fn load_trace(path: &Path) -> Result<Vec<TraceEvent>> {
    if !path.exists() {
        return Err(CliError::MissingPath {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Apply `events` to `state` in order.
pub fn replay(state: &mut LayoutState, events: &[TraceEvent]) -> ReplayOutcome {
    let mut outcome = ReplayOutcome::default();
    for event in events {
        let transition = match event {
            TraceEvent::Start { node } => state.start_drag(node),
            TraceEvent::Move { node, x, y } => state.drag_node(node, Point::new(*x, *y)),
            TraceEvent::End { node, x, y } => {
                let (transition, corrections) = state.end_drag(node, Point::new(*x, *y));
                outcome.corrections.extend(corrections);
                transition
            }
            TraceEvent::Cancel { node, reason } => state.cancel_drag(node, *reason),
        };
        outcome.transitions.push(transition);
    }
    tracing::debug!(
        target: "strata.cli",
        events = events.len(),
        corrections = outcome.corrections.len(),
        "trace replayed"
    );
    outcome
}
