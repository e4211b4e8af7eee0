#![forbid(unsafe_code)]

//! Structural edits to a tier list.
//!
//! Every function normalizes its input and returns a freshly reindexed
//! [`TierSet`]; the foundational tier can be neither moved, renamed, nor
//! removed. Edits that cannot apply return the normalized input unchanged,
//! except removal, which reports [`TierMutationError::NoRemovableTier`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tier::{Tier, TierId, TierSet, normalize_tiers};

/// Direction for [`move_tier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Toward the foundation (lower index).
    Up,
    Down,
}

/// Result of removing the top custom tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRemoval {
    pub tiers: TierSet,
    pub removed_tier_id: TierId,
    /// Where nodes of the removed tier should move.
    pub target_tier_id: TierId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierMutationError {
    /// Only the foundational tier is left.
    NoRemovableTier,
}

impl fmt::Display for TierMutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRemovableTier => {
                write!(f, "no custom tier to remove: only the foundational tier remains")
            }
        }
    }
}

impl std::error::Error for TierMutationError {}

/// Append a new custom tier after all existing ones.
///
/// The id is `tier_<n>` with `n` one past the largest numeric `tier_<n>`
/// suffix in use; the name is `Tier <custom count + 2>`.
#[must_use]
pub fn add_custom_tier(tiers: &[Tier]) -> TierSet {
    let set = normalize_tiers(tiers);
    let id = set
        .custom()
        .iter()
        .filter_map(|tier| tier_suffix(tier.id.as_str()))
        .max()
        .map_or(Some(1), |max| max.checked_add(1))
        .map(|next| format!("tier_{next}"))
        .filter(|id| !set.contains(&TierId::new(id.as_str())))
        .unwrap_or_else(|| first_free_id(&set));
    let name = format!("Tier {}", set.custom().len() + 2);

    tracing::debug!(target: "strata.tiers", %id, %name, "custom tier added");
    let mut custom = set.custom().to_vec();
    custom.push(Tier::custom(id, name));
    TierSet::from_custom(custom)
}

/// Lowest unused `tier_<n>`; one of the first `len + 1` candidates is free.
fn first_free_id(set: &TierSet) -> String {
    (1..=set.len() as u64 + 1)
        .map(|n| format!("tier_{n}"))
        .find(|id| !set.contains(&TierId::new(id.as_str())))
        .unwrap_or_else(|| format!("tier_{}", set.len() + 1))
}

fn tier_suffix(id: &str) -> Option<u64> {
    let digits = id.strip_prefix("tier_")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Remove the highest-order custom tier.
///
/// # Errors
///
/// [`TierMutationError::NoRemovableTier`] when no custom tier exists.
pub fn remove_top_custom_tier(tiers: &[Tier]) -> Result<TierRemoval, TierMutationError> {
    let set = normalize_tiers(tiers);
    let mut custom = set.custom().to_vec();
    let Some(removed) = custom.pop() else {
        return Err(TierMutationError::NoRemovableTier);
    };
    let target_tier_id = custom
        .last()
        .map_or_else(TierId::foundational, |tier| tier.id.clone());

    tracing::debug!(
        target: "strata.tiers",
        removed = %removed.id,
        target = %target_tier_id,
        "top custom tier removed"
    );
    Ok(TierRemoval {
        tiers: TierSet::from_custom(custom),
        removed_tier_id: removed.id,
        target_tier_id,
    })
}

/// Move a custom tier to `target_index` among the custom tiers.
///
/// No-op for the foundational tier, unknown ids, and indices past the last
/// custom tier.
#[must_use]
pub fn move_tier_to_index(tiers: &[Tier], tier_id: &TierId, target_index: usize) -> TierSet {
    let set = normalize_tiers(tiers);
    if tier_id.is_foundational() {
        return set;
    }
    let Some(current) = set.custom_index(tier_id) else {
        return set;
    };
    if target_index >= set.custom().len() || target_index == current {
        return set;
    }

    let mut custom = set.custom().to_vec();
    let tier = custom.remove(current);
    custom.insert(target_index, tier);
    tracing::debug!(
        target: "strata.tiers",
        tier = %tier_id,
        from = current,
        to = target_index,
        "custom tier moved"
    );
    TierSet::from_custom(custom)
}

/// Swap a custom tier with its neighbour. No-op at the edges.
#[must_use]
pub fn move_tier(tiers: &[Tier], tier_id: &TierId, direction: Direction) -> TierSet {
    let set = normalize_tiers(tiers);
    let Some(current) = set.custom_index(tier_id) else {
        return set;
    };
    let target = match direction {
        Direction::Up => current.checked_sub(1),
        Direction::Down => Some(current + 1),
    };
    match target {
        Some(target) => move_tier_to_index(&set, tier_id, target),
        None => set,
    }
}

/// Rename a custom tier. The name is trimmed; empty names are ignored.
#[must_use]
pub fn rename_tier(tiers: &[Tier], tier_id: &TierId, name: &str) -> TierSet {
    let set = normalize_tiers(tiers);
    let name = name.trim();
    if name.is_empty() || tier_id.is_foundational() || !set.contains(tier_id) {
        return set;
    }
    let custom = set
        .custom()
        .iter()
        .map(|tier| {
            if &tier.id == tier_id {
                Tier {
                    name: name.to_owned(),
                    ..tier.clone()
                }
            } else {
                tier.clone()
            }
        })
        .collect();
    TierSet::from_custom(custom)
}
