#![forbid(unsafe_code)]

//! Tier-based spatial layout for belief-graph canvases.
//!
//! The canvas is split into horizontal bands, one per [`Tier`], with the
//! protected foundational tier always on top. This crate maps positions to
//! tiers, packs foundational nodes into a grid, and turns raw pointer drags
//! into resisted or snapped placements.
//!
//! ```
//! use strata_layout::{BandSet, CanvasFrame, default_tiers, tier_for_y};
//!
//! let bands = BandSet::for_tiers(&default_tiers(), &CanvasFrame::default());
//! assert_eq!(tier_for_y(380.0, &bands).as_str(), "tier_1");
//! ```

pub mod band;
pub mod config;
pub mod drag;
pub mod foundation;
pub mod mutation;
pub mod node;
pub mod placement;
pub mod state;
pub mod tier;

pub use band::{Band, BandSet, CanvasFrame, build_bands};
pub use config::{ConfigError, LayoutConfig};
pub use drag::{
    DragAction, DragCancelReason, DragController, DragEffect, DragNoopReason, DragPhase,
    DragSession, DragTransition, DragTuning, decide_move,
};
pub use foundation::{FoundationGrid, apply_foundational_layout};
pub use mutation::{
    Direction, TierMutationError, TierRemoval, add_custom_tier, move_tier, move_tier_to_index,
    remove_top_custom_tier, rename_tier,
};
pub use node::{Correction, Node, NodeId, NodeRecord};
pub use placement::{classify_y, tier_for_y};
pub use state::{LayoutState, TierMigration};
pub use strata_core::{Point, Span};
pub use tier::{
    FOUNDATIONAL_TIER_ID, FOUNDATIONAL_TIER_NAME, Tier, TierId, TierSet, default_tiers,
    normalize, normalize_tiers,
};
