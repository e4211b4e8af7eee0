#![forbid(unsafe_code)]

//! Tier model: identifiers, records, and deterministic normalization.
//!
//! Tier lists arrive from storage as untrusted JSON. [`normalize`] turns any
//! input into a [`TierSet`], the only way to obtain one, so the structural
//! invariants hold wherever a `TierSet` is in hand.
//!
//! # Invariants
//!
//! 1. Exactly one tier is foundational; its id is [`FOUNDATIONAL_TIER_ID`]
//!    and its name is [`FOUNDATIONAL_TIER_NAME`].
//! 2. The foundational tier is first and has `order == 0`.
//! 3. `order` equals list position (contiguous from 0, no duplicates).
//! 4. Tier ids are unique.
//! 5. `normalize_tiers(&set) == set` for every `TierSet` (idempotence).
//!
//! # Failure Modes
//!
//! None. Malformed input is repaired or replaced by [`default_tiers`].

use std::collections::BTreeSet;
use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Well-known id of the protected foundational tier.
pub const FOUNDATIONAL_TIER_ID: &str = "foundational_core";

/// Canonical display name of the foundational tier.
pub const FOUNDATIONAL_TIER_NAME: &str = "Foundational Dogma";

/// Stable tier identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierId(String);

impl TierId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The foundational tier id.
    #[must_use]
    pub fn foundational() -> Self {
        Self(FOUNDATIONAL_TIER_ID.to_owned())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_foundational(&self) -> bool {
        self.0 == FOUNDATIONAL_TIER_ID
    }
}

impl fmt::Display for TierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TierId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl PartialEq<str> for TierId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for TierId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// One ordered stratum of the belief graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    pub id: TierId,
    pub name: String,
    pub order: u32,
    #[serde(default)]
    pub is_foundational: bool,
}

impl Tier {
    /// The canonical foundational tier.
    #[must_use]
    pub fn foundational() -> Self {
        Self {
            id: TierId::foundational(),
            name: FOUNDATIONAL_TIER_NAME.to_owned(),
            order: 0,
            is_foundational: true,
        }
    }

    /// A custom (non-foundational) tier. `order` is fixed up on reindex.
    pub fn custom(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: TierId::new(id),
            name: name.into(),
            order: 0,
            is_foundational: false,
        }
    }
}

/// A normalized, invariant-respecting tier list.
///
/// Dereferences to `[Tier]` in order. Deserializing accepts any JSON value
/// and normalizes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TierSet(Vec<Tier>);

impl TierSet {
    /// Build from custom tiers in their intended order.
    ///
    /// The canonical foundational tier is prepended; any foundational entry
    /// in `custom` is discarded. Orders are reassigned.
    pub(crate) fn from_custom(custom: Vec<Tier>) -> Self {
        let mut tiers = Vec::with_capacity(custom.len() + 1);
        tiers.push(Tier::foundational());
        tiers.extend(
            custom
                .into_iter()
                .filter(|tier| !tier.id.is_foundational()),
        );
        Self(reindex(tiers))
    }

    /// The foundational tier (always first).
    #[must_use]
    pub fn foundational(&self) -> &Tier {
        &self.0[0]
    }

    /// Custom tiers in order.
    #[must_use]
    pub fn custom(&self) -> &[Tier] {
        &self.0[1..]
    }

    /// Highest-order custom tier, if any.
    #[must_use]
    pub fn top_custom(&self) -> Option<&Tier> {
        self.custom().last()
    }

    /// Look up a tier by id.
    #[must_use]
    pub fn get(&self, id: &TierId) -> Option<&Tier> {
        self.0.iter().find(|tier| &tier.id == id)
    }

    /// Whether a tier with `id` exists.
    #[must_use]
    pub fn contains(&self, id: &TierId) -> bool {
        self.get(id).is_some()
    }

    /// Index of `id` among custom tiers.
    #[must_use]
    pub fn custom_index(&self, id: &TierId) -> Option<usize> {
        self.custom().iter().position(|tier| &tier.id == id)
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Tier> {
        self.0
    }
}

impl Default for TierSet {
    fn default() -> Self {
        default_tiers()
    }
}

impl Deref for TierSet {
    type Target = [Tier];

    fn deref(&self) -> &[Tier] {
        &self.0
    }
}

impl<'de> Deserialize<'de> for TierSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(normalize(&raw))
    }
}

/// Built-in tier set: the foundational tier plus three custom tiers.
#[must_use]
pub fn default_tiers() -> TierSet {
    TierSet::from_custom(vec![
        Tier::custom("tier_1", "Official Doctrine"),
        Tier::custom("tier_2", "Theological Deduction"),
        Tier::custom("tier_3", "Personal Speculation"),
    ])
}

/// Normalize an untrusted JSON tier list.
///
/// Non-arrays and arrays without object entries yield [`default_tiers`].
#[must_use]
pub fn normalize(raw: &Value) -> TierSet {
    let Some(items) = raw.as_array() else {
        tracing::debug!(target: "strata.tiers", "tier input is not a list; using defaults");
        return default_tiers();
    };
    let candidates = items
        .iter()
        .filter_map(Value::as_object)
        .map(|object| Candidate {
            id: non_empty_str(object.get("id")),
            name: non_empty_str(object.get("name")),
            order: object.get("order").and_then(Value::as_f64),
            flagged: object.get("is_foundational").is_some_and(truthy),
        })
        .collect();
    normalize_candidates(candidates)
}

/// Normalize an already-typed tier list.
#[must_use]
pub fn normalize_tiers(tiers: &[Tier]) -> TierSet {
    let candidates = tiers
        .iter()
        .map(|tier| Candidate {
            id: (!tier.id.as_str().is_empty()).then(|| tier.id.as_str().to_owned()),
            name: (!tier.name.is_empty()).then(|| tier.name.clone()),
            order: Some(f64::from(tier.order)),
            flagged: tier.is_foundational,
        })
        .collect();
    normalize_candidates(candidates)
}

/// Reassign `order` from list position and mark only the foundational id.
pub(crate) fn reindex(tiers: Vec<Tier>) -> Vec<Tier> {
    tiers
        .into_iter()
        .enumerate()
        .map(|(index, tier)| Tier {
            is_foundational: tier.id.is_foundational(),
            order: u32::try_from(index).unwrap_or(u32::MAX),
            ..tier
        })
        .collect()
}

struct Candidate {
    id: Option<String>,
    name: Option<String>,
    order: Option<f64>,
    flagged: bool,
}

fn normalize_candidates(candidates: Vec<Candidate>) -> TierSet {
    if candidates.is_empty() {
        tracing::debug!(target: "strata.tiers", "tier list empty; using defaults");
        return default_tiers();
    }

    let explicit: BTreeSet<String> = candidates.iter().filter_map(|c| c.id.clone()).collect();
    let mut seen = BTreeSet::new();
    let mut has_foundation = false;
    let mut custom: Vec<(f64, Tier)> = Vec::with_capacity(candidates.len());

    for (index, candidate) in candidates.into_iter().enumerate() {
        let id = match candidate.id {
            Some(id) => id,
            None => synthesize_id(index, &explicit, &seen),
        };
        if !seen.insert(id.clone()) {
            tracing::trace!(target: "strata.tiers", tier_id = %id, "dropping duplicate tier id");
            continue;
        }
        if id == FOUNDATIONAL_TIER_ID {
            has_foundation = true;
            continue;
        }
        if candidate.flagged {
            tracing::debug!(target: "strata.tiers", tier_id = %id, "demoting non-canonical foundational flag");
        }
        let name = candidate
            .name
            .unwrap_or_else(|| format!("Tier {}", index + 1));
        let order = candidate.order.unwrap_or(index as f64);
        custom.push((order, Tier::custom(id, name)));
    }

    if !has_foundation {
        tracing::debug!(target: "strata.tiers", "no foundational tier present; synthesizing one");
    }

    custom.sort_by(|a, b| a.0.total_cmp(&b.0));
    TierSet::from_custom(custom.into_iter().map(|(_, tier)| tier).collect())
}

fn synthesize_id(index: usize, explicit: &BTreeSet<String>, seen: &BTreeSet<String>) -> String {
    let base = format!("tier_{index}");
    let taken = |id: &str| explicit.contains(id) || seen.contains(id);
    if !taken(&base) {
        return base;
    }
    (1..)
        .map(|suffix| format!("{base}_{suffix}"))
        .find(|id| !taken(id))
        .unwrap_or(base)
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
