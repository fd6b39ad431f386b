//! The object registry: two type-bucketed stores (entities and the global
//! component index) plus the per-frame passes that drive them.
//!
//! Pass ordering is fixed. `update` and `late_update` visit entities before
//! components; `draw` visits components before entities, so an entity can
//! always paint over whatever its components emitted. The sweep destroys
//! components before entities for the same reason: by the time an entity's
//! `on_destroy` runs, everything it owned is already gone.

use std::rc::Rc;

use super::entity::{Entity, EntityAttachment};
use super::store::{Obj, TypedStore};
use crate::video::Renderer;

/// What a per-frame callback gets to see: the frame's timing and the
/// registry the object lives in.
pub struct UpdateContext<'a> {
    /// Seconds since the previous frame, scaled by the owning state's time
    /// scale.
    pub dt: f32,
    /// Seconds since the previous frame, unscaled.
    pub unscaled_dt: f32,
    pub registry: &'a Registry,
}

/// A world of entities and components.
pub struct Registry {
    entities: Rc<TypedStore>,
    components: Rc<TypedStore>,
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            entities: Rc::new(TypedStore::new()),
            components: Rc::new(TypedStore::new()),
        }
    }

    /// Registers an entity, wires it into this registry, and runs its
    /// `on_init`. Components attached from inside `on_init` land in the
    /// registry immediately.
    pub fn add_entity<T: Entity>(&self, value: T) -> Obj<T> {
        let obj = self.entities.add(value);

        obj.borrow().entity_core().attach(EntityAttachment {
            self_obj: Rc::downgrade(obj.cell()),
            entities: Rc::clone(&self.entities),
            components: Rc::clone(&self.components),
        });

        obj.borrow_mut().on_init();
        obj
    }

    /// Runs the update pass: every entity, then every component. Each store
    /// is walked over a snapshot, so callbacks may register or mark objects
    /// freely; additions join the passes of the next frame.
    pub fn update(&self, ctx: &UpdateContext) {
        self.entities.update_all(ctx);
        self.components.update_all(ctx);
    }

    /// Runs the late-update pass, in the same order as `update`.
    pub fn late_update(&self, ctx: &UpdateContext) {
        self.entities.late_update_all(ctx);
        self.components.late_update_all(ctx);
    }

    /// Runs the draw pass: every component, then every entity.
    pub fn draw(&self, renderer: &mut dyn Renderer) {
        self.components.draw_all(renderer);
        self.entities.draw_all(renderer);
    }

    /// Sweeps everything marked for destruction out of both stores. A no-op
    /// when nothing has been marked since the last sweep.
    pub fn destroy_marked(&self) {
        self.components.sweep();
        self.entities.sweep();
    }

    /// Marks every registered object for destruction; the next sweep clears
    /// the whole world.
    pub fn destroy_all(&self) {
        self.components.mark_all();
        self.entities.mark_all();
    }

    /// Immediately finalizes everything, bypassing the mark/sweep cycle.
    /// Only the state stack calls this, when a state is popped for good.
    pub(crate) fn truly_destroy_all(&self) {
        self.components.truly_destroy_all();
        self.entities.truly_destroy_all();
    }

    /// The entity store, for typed queries across the whole world.
    pub fn entities(&self) -> &TypedStore {
        &self.entities
    }

    /// The global component index, spanning the components of every entity.
    pub fn components(&self) -> &TypedStore {
        &self.components
    }
}
