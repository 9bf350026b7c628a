//! Prism ECS - entity storage and component lifecycle
//!
//! Entities are generational handles; components live in per-type sparse
//! sets inside a [`World`]. The [`Lifecycle`] drives behaviour components
//! through enable, awake, initialize, update, disable and finalize.

mod component;
mod entity;
mod error;
pub mod lifecycle;
mod resource;
mod world;

pub use component::Component;
pub use entity::Entity;
pub use error::EcsError;
pub use lifecycle::{Behaviour, ComponentState, Context, Lifecycle};
pub use world::World;
