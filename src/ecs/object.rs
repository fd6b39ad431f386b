//! The base lifecycle every stored object shares, and the traits that make a
//! plain struct storable.
//!
//! Objects move through a forward-only state machine: `Active` on
//! construction, `MarkedForDestruction` once anybody asks for their removal,
//! and `Destroyed` when the owning store finally sweeps them. Marking is
//! cheap and idempotent; the actual teardown happens at a well-defined frame
//! boundary, so no per-frame callback ever observes an object halfway
//! through destruction.

use std::any::{Any, TypeId};
use std::cell::Cell;
use std::rc::Rc;

use smallvec::SmallVec;

use super::registry::UpdateContext;
use crate::video::Renderer;

/// The strict-ancestor list a concrete type reports to the store. Built by
/// the `declare_*` macros.
pub type Ancestors = SmallVec<[TypeId; 4]>;

/// The destruction stage of a stored object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Active,
    MarkedForDestruction,
    Destroyed,
}

/// A shared lifecycle cell. Cloning a `Lifecycle` shares the underlying
/// stage, which lets a store entry and the object itself observe one state
/// without borrowing each other.
#[derive(Clone)]
pub struct Lifecycle {
    stage: Rc<Cell<Stage>>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Lifecycle::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Lifecycle {
            stage: Rc::new(Cell::new(Stage::Active)),
        }
    }

    #[inline]
    pub fn stage(&self) -> Stage {
        self.stage.get()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.stage.get() == Stage::Active
    }

    #[inline]
    pub fn is_marked(&self) -> bool {
        self.stage.get() == Stage::MarkedForDestruction
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.stage.get() == Stage::Destroyed
    }

    /// Marks the object for destruction. Idempotent; marking an already
    /// marked or destroyed object does nothing. Returns true if the stage
    /// actually advanced.
    #[doc(hidden)]
    pub fn mark(&self) -> bool {
        if self.stage.get() == Stage::Active {
            self.stage.set(Stage::MarkedForDestruction);
            true
        } else {
            false
        }
    }

    /// Moves the object to `Destroyed`. Only the owning store's sweep may
    /// call this, exactly once per object.
    pub(crate) fn finalize(&self) {
        if self.stage.get() == Stage::Destroyed {
            panic!("an object may not be finalized twice");
        }

        self.stage.set(Stage::Destroyed);
    }

    /// Identity comparison; two clones of the same lifecycle compare equal.
    #[inline]
    pub(crate) fn same(&self, other: &Lifecycle) -> bool {
        Rc::ptr_eq(&self.stage, &other.stage)
    }
}

/// Plumbing every storable object carries. Implementations are generated by
/// `declare_entity!`, `declare_component!` or `declare_object!`; user code
/// never writes these by hand.
pub trait EcsObject: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// The shared lifecycle of this object.
    fn lifecycle(&self) -> &Lifecycle;

    /// Marks this object for destruction. For entities this cascades to all
    /// attached components.
    fn mark(&self);

    /// Framework-internal teardown that runs right before `on_destroy`,
    /// releasing ownership slots (an entity's remaining components, a
    /// component's slot in its entity).
    #[doc(hidden)]
    fn teardown(&mut self) {}

    /// TypeIds of all strict ancestor types, nearest first. Consulted once,
    /// when this type's bucket is created.
    fn ancestors() -> Ancestors
    where
        Self: Sized,
    {
        Ancestors::new()
    }
}

/// The per-frame hooks of a stored object. Every method has a default no-op
/// body, so a type only spells out the callbacks it cares about.
///
/// Contract: `update`/`late_update`/`draw` run while the owning store walks
/// a snapshot of its buckets; a callback may add objects or mark them for
/// destruction, but must not re-borrow the object it is running on through a
/// query handle.
pub trait GameObject: EcsObject {
    /// Runs once, right after the object is registered.
    fn on_init(&mut self) {}

    /// Runs exactly once, when the owning store finally destroys the object.
    fn on_destroy(&mut self) {}

    fn update(&mut self, _ctx: &UpdateContext) {}

    fn late_update(&mut self, _ctx: &UpdateContext) {}

    fn draw(&mut self, _renderer: &mut dyn Renderer) {}
}

/// Declares a struct as a free-standing storable object. The struct must
/// hold a [`Lifecycle`] in the named field. Optionally takes the list of
/// strict ancestor types, nearest first.
#[macro_export]
macro_rules! declare_object {
    ($ty:ident => $field:ident) => {
        $crate::declare_object!($ty => $field, []);
    };
    ($ty:ident => $field:ident, [$($ancestor:ty),*]) => {
        impl $crate::ecs::EcsObject for $ty {
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn lifecycle(&self) -> &$crate::ecs::Lifecycle {
                &self.$field
            }

            fn mark(&self) {
                self.$field.mark();
            }

            fn ancestors() -> $crate::ecs::Ancestors {
                let mut chain = $crate::ecs::Ancestors::new();
                $( chain.push(::std::any::TypeId::of::<$ancestor>()); )*
                chain
            }
        }
    };
}

/// Declares a struct as an entity. The struct must hold an
/// [`EntityCore`](crate::ecs::EntityCore) in the named field.
#[macro_export]
macro_rules! declare_entity {
    ($ty:ident => $field:ident) => {
        $crate::declare_entity!($ty => $field, []);
    };
    ($ty:ident => $field:ident, [$($ancestor:ty),*]) => {
        impl $crate::ecs::EcsObject for $ty {
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn lifecycle(&self) -> &$crate::ecs::Lifecycle {
                self.$field.lifecycle()
            }

            fn mark(&self) {
                self.$field.mark();
            }

            fn teardown(&mut self) {
                self.$field.teardown();
            }

            fn ancestors() -> $crate::ecs::Ancestors {
                let mut chain = $crate::ecs::Ancestors::new();
                $( chain.push(::std::any::TypeId::of::<$ancestor>()); )*
                chain
            }
        }

        impl $crate::ecs::Entity for $ty {
            fn entity_core(&self) -> &$crate::ecs::EntityCore {
                &self.$field
            }
        }
    };
}

/// Declares a struct as a component. The struct must hold a
/// [`ComponentCore`](crate::ecs::ComponentCore) in the named field.
#[macro_export]
macro_rules! declare_component {
    ($ty:ident => $field:ident) => {
        $crate::declare_component!($ty => $field, []);
    };
    ($ty:ident => $field:ident, [$($ancestor:ty),*]) => {
        impl $crate::ecs::EcsObject for $ty {
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn lifecycle(&self) -> &$crate::ecs::Lifecycle {
                self.$field.lifecycle()
            }

            fn mark(&self) {
                self.$field.mark();
            }

            fn teardown(&mut self) {
                self.$field.teardown(::std::any::TypeId::of::<$ty>());
            }

            fn ancestors() -> $crate::ecs::Ancestors {
                let mut chain = $crate::ecs::Ancestors::new();
                $( chain.push(::std::any::TypeId::of::<$ancestor>()); )*
                chain
            }
        }

        impl $crate::ecs::Component for $ty {
            fn component_core(&self) -> &$crate::ecs::ComponentCore {
                &self.$field
            }
        }
    };
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn forward_only() {
        let life = Lifecycle::new();
        assert!(life.is_active());

        assert!(life.mark());
        assert!(life.is_marked());

        // Marking again is accepted and changes nothing.
        assert!(!life.mark());
        assert!(life.is_marked());

        life.finalize();
        assert!(life.is_destroyed());
        assert!(!life.mark());
        assert!(life.is_destroyed());
    }

    #[test]
    fn clones_share_stage() {
        let life = Lifecycle::new();
        let alias = life.clone();

        alias.mark();
        assert!(life.is_marked());
        assert!(life.same(&alias));
        assert!(!life.same(&Lifecycle::new()));
    }

    #[test]
    #[should_panic(expected = "finalized twice")]
    fn double_finalize() {
        let life = Lifecycle::new();
        life.finalize();
        life.finalize();
    }
}
