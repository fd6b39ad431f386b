//! The object runtime: lifecycle-tracked game objects, a type-bucketed
//! store with subtype-aware queries, and the entity/component registry.

pub mod component;
pub mod entity;
pub mod object;
pub mod registry;
pub mod store;

pub use self::component::{Component, ComponentCore};
pub use self::entity::{Entity, EntityCore};
pub use self::object::{Ancestors, EcsObject, GameObject, Lifecycle, Stage};
pub use self::registry::{Registry, UpdateContext};
pub use self::store::{AnyObj, Obj, TypedStore};
