pub use crate::application::{
    Context, Engine, EngineStatus, ManualClock, Settings, State, StateCore, StateHandle,
    StateParams, TimeParams, TimeSource, TimeStep, WallClock,
};
pub use crate::assets::AssetLoader;
pub use crate::ecs::{
    AnyObj, Component, ComponentCore, EcsObject, Entity, EntityCore, GameObject, Lifecycle, Obj,
    Registry, Stage, TypedStore, UpdateContext,
};
pub use crate::errors::{Error, Result};
pub use crate::physics::{NullWorld, PhysicsWorld};
pub use crate::utils::{Routine, Timer};
pub use crate::video::{DrawCall, HeadlessRenderer, Renderer};

pub use crate::{declare_component, declare_entity, declare_object};
