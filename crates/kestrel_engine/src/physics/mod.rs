//! Collision shapes and tag-based collider bookkeeping
//!
//! Colliders are tagged shapes owned by entities. The scene buckets them by
//! tag for queries; this module provides the shapes themselves and the
//! narrow-phase overlap tests between them. There is no broad phase: lookup
//! is tag-bucketed, not spatially indexed.

mod collider;

pub use collider::{Collider, ColliderId, ColliderRef, ColliderShape};
