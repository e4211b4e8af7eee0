#![forbid(unsafe_code)]

//! Core: canvas geometry shared by the Strata crates.
//!
//! # Role in Strata
//! `strata-core` holds the coordinate types that every other crate speaks.
//! It has no knowledge of tiers or nodes; `strata-layout` builds the tier
//! model, bands, and interaction machinery on top of these primitives.

pub mod geometry;

pub use geometry::{Point, Span};
