//! Shared types for the spacekit renderer.
//!
//! # Invariants
//! - Entity, component, material and scene identities are issued by an
//!   explicit per-world allocator; only `WorldId` comes from process-wide
//!   state, so (world, id) pairs are unique within a run.
//! - A transform's world matrix is never stale with respect to its inputs.

mod id;
mod transform;

pub use id::{ComponentId, EntityId, IdAllocator, MaterialId, SceneId, WorldId};
pub use transform::{Transform, TransformConfig};
