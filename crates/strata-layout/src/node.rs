#![forbid(unsafe_code)]

//! Node and correction records exchanged with the persistence layer.
//!
//! The engine only sees the slice of a node record that affects placement:
//! identity, tier membership, position, and the lock flag. Everything else
//! (titles, Toulmin fields, validation state) stays with the caller.
//!
//! The wire shape uses flat `x_position`/`y_position` columns; internally a
//! [`Node`] carries a [`Point`]. Conversion happens through [`NodeRecord`]
//! so both shapes stay in sync.

use std::fmt;

use serde::{Deserialize, Serialize};
use strata_core::Point;

use crate::tier::TierId;

/// Stable node identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A node as consumed by the placement engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "NodeRecord", into = "NodeRecord")]
pub struct Node {
    pub id: NodeId,
    pub tier_id: TierId,
    pub position: Point,
    pub is_locked: bool,
    /// Opaque creation stamp; ordered lexicographically.
    pub created_at: Option<String>,
}

impl Node {
    pub fn new(id: impl Into<String>, tier_id: impl Into<String>, position: Point) -> Self {
        Self {
            id: NodeId::new(id),
            tier_id: TierId::new(tier_id),
            position,
            is_locked: false,
            created_at: None,
        }
    }

    /// Builder: mark the node locked.
    #[must_use]
    pub fn locked(mut self) -> Self {
        self.is_locked = true;
        self
    }

    /// Builder: set the creation stamp.
    #[must_use]
    pub fn created_at(mut self, stamp: impl Into<String>) -> Self {
        self.created_at = Some(stamp.into());
        self
    }

    /// Apply a correction addressed to this node. Returns `false` on id mismatch.
    pub fn apply(&mut self, correction: &Correction) -> bool {
        if correction.id != self.id {
            return false;
        }
        self.position = Point::new(correction.x_position, correction.y_position);
        if let Some(tier_id) = &correction.tier_id {
            self.tier_id = tier_id.clone();
        }
        true
    }
}

/// Flat wire shape of a [`Node`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub tier_id: TierId,
    #[serde(default)]
    pub x_position: f64,
    #[serde(default)]
    pub y_position: f64,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl From<NodeRecord> for Node {
    fn from(record: NodeRecord) -> Self {
        Self {
            id: record.id,
            tier_id: record.tier_id,
            position: Point::new(record.x_position, record.y_position),
            is_locked: record.is_locked,
            created_at: record.created_at,
        }
    }
}

impl From<Node> for NodeRecord {
    fn from(node: Node) -> Self {
        Self {
            id: node.id,
            tier_id: node.tier_id,
            x_position: node.position.x,
            y_position: node.position.y,
            is_locked: node.is_locked,
            created_at: node.created_at,
        }
    }
}

/// Outbound position/tier change for the persistence collaborator.
///
/// `tier_id` is omitted when only the position changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub id: NodeId,
    pub x_position: f64,
    pub y_position: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier_id: Option<TierId>,
}

impl Correction {
    /// Position-only correction.
    pub fn moved(id: NodeId, position: Point) -> Self {
        Self {
            id,
            x_position: position.x,
            y_position: position.y,
            tier_id: None,
        }
    }

    /// Position and tier correction.
    pub fn reassigned(id: NodeId, position: Point, tier_id: TierId) -> Self {
        Self {
            id,
            x_position: position.x,
            y_position: position.y,
            tier_id: Some(tier_id),
        }
    }

    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x_position, self.y_position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_reads_flat_wire_record() {
        let json = r#"{
            "id": "n-1",
            "tier_id": "tier_2",
            "x_position": 310.5,
            "y_position": 480,
            "is_locked": false,
            "created_at": "2025-02-01T10:00:00Z"
        }"#;
        let node: Node = serde_json::from_str(json).expect("node record parses");
        assert_eq!(node.id.as_str(), "n-1");
        assert_eq!(node.tier_id.as_str(), "tier_2");
        assert_eq!(node.position, Point::new(310.5, 480.0));
        assert_eq!(node.created_at.as_deref(), Some("2025-02-01T10:00:00Z"));
    }

    #[test]
    fn node_defaults_missing_position_and_lock() {
        let node: Node = serde_json::from_str(r#"{"id":"a","tier_id":"foundational_core"}"#)
            .expect("minimal record parses");
        assert_eq!(node.position, Point::default());
        assert!(!node.is_locked);
        assert_eq!(node.created_at, None);
    }

    #[test]
    fn correction_omits_unchanged_tier() {
        let moved = Correction::moved(NodeId::new("n"), Point::new(1.0, 2.0));
        let value = serde_json::to_value(&moved).expect("serializes");
        assert_eq!(
            value,
            serde_json::json!({"id": "n", "x_position": 1.0, "y_position": 2.0})
        );

        let reassigned =
            Correction::reassigned(NodeId::new("n"), Point::new(1.0, 2.0), TierId::new("tier_1"));
        let value = serde_json::to_value(&reassigned).expect("serializes");
        assert_eq!(value["tier_id"], "tier_1");
    }

    #[test]
    fn apply_ignores_foreign_correction() {
        let mut node = Node::new("a", "tier_1", Point::new(5.0, 5.0));
        let foreign = Correction::moved(NodeId::new("b"), Point::new(9.0, 9.0));
        assert!(!node.apply(&foreign));
        assert_eq!(node.position, Point::new(5.0, 5.0));

        let own = Correction::reassigned(NodeId::new("a"), Point::new(9.0, 9.0), "tier_2".into());
        assert!(node.apply(&own));
        assert_eq!(node.position, Point::new(9.0, 9.0));
        assert_eq!(node.tier_id.as_str(), "tier_2");
    }
}
