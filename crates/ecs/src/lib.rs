//! Entity/component model.
//!
//! A [`World`] owns entities and components. Components are a closed set
//! (camera, directional light, point light, mesh) stored in a single table
//! keyed by [`ComponentId`](spacekit_common::ComponentId); entities record
//! which components they own.
//!
//! # Invariants
//! - A component is attached to at most one entity at a time.
//! - Iteration order is deterministic (BTreeMap, ids ascending).
//! - "First component of a kind" means the earliest-created one.
//! - Materials are immutable once created.

mod camera;
mod component;
mod entity;
mod error;
mod light;
mod material;
mod mesh;
mod world;

pub use camera::{CameraComponent, CameraConfig};
pub use component::{Component, ComponentKind, ComponentType};
pub use entity::Entity;
pub use error::EcsError;
pub use light::{
    DirectionalLightComponent, DirectionalLightConfig, PointLightComponent, PointLightConfig,
};
pub use material::{Bitmap, FilterMode, Material, MaterialConfig};
pub use mesh::{MeshComponent, NORMAL_OFFSET, POSITION_OFFSET, UV_OFFSET, VERTEX_FLOATS, VERTEX_STRIDE};
pub use world::World;
