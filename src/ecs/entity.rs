//! Entities: objects that own a private set of components.
//!
//! Every component an entity owns is registered twice, once in the entity's
//! private store and once in the registry-global component index. Both
//! registrations share one lifecycle cell, so marking through either side
//! invalidates both at the next sweep.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::component::{Component, ComponentAttachment};
use super::object::{GameObject, Lifecycle};
use super::store::{AnyObj, Obj, TypedStore};

/// A registered entity; implemented by `declare_entity!`.
pub trait Entity: GameObject {
    fn entity_core(&self) -> &EntityCore;
}

/// Wiring an entity receives when it is registered.
pub(crate) struct EntityAttachment {
    /// The entity's own storage cell, used to hand components a back
    /// reference without keeping the entity alive.
    pub self_obj: Weak<RefCell<dyn GameObject>>,
    pub entities: Rc<TypedStore>,
    pub components: Rc<TypedStore>,
}

/// The state every entity embeds. Owns the entity's private component store
/// and, once registered, the wiring back to the owning registry.
pub struct EntityCore {
    lifecycle: Lifecycle,
    components: Rc<TypedStore>,
    attachment: RefCell<Option<EntityAttachment>>,
}

impl Default for EntityCore {
    fn default() -> Self {
        EntityCore::new()
    }
}

impl EntityCore {
    pub fn new() -> Self {
        EntityCore {
            lifecycle: Lifecycle::new(),
            components: Rc::new(TypedStore::new()),
            attachment: RefCell::new(None),
        }
    }

    #[inline]
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// True once the entity has been registered and until it is destroyed.
    pub fn is_attached(&self) -> bool {
        self.attachment.borrow().is_some()
    }

    pub(crate) fn attach(&self, attachment: EntityAttachment) {
        *self.attachment.borrow_mut() = Some(attachment);
    }

    /// Attaches a component to this entity, registering it both locally and
    /// in the global component index, then runs its `on_init`.
    ///
    /// Panics if the entity has not been registered yet, or is already
    /// queued for destruction; a component added to a dying entity would
    /// never be swept.
    pub fn add_component<T: Component>(&self, value: T) -> Obj<T> {
        assert!(
            self.lifecycle.is_active(),
            "components can not be attached to an entity queued for destruction"
        );

        let attachment = self.attachment.borrow();
        let attachment = attachment
            .as_ref()
            .expect("components can only be attached to a registered entity");

        let obj = self.components.add(value);
        attachment.components.adopt(&obj);

        obj.borrow().component_core().attach(ComponentAttachment {
            entity: Weak::clone(&attachment.self_obj),
            local: Rc::clone(&self.components),
            global: Rc::clone(&attachment.components),
        });

        obj.borrow_mut().on_init();
        obj
    }

    /// Marks the entity and every component it owns. The cascade touches
    /// lifecycle cells only, so it is safe to call from inside any per-frame
    /// callback, including a component's own `update`.
    #[doc(hidden)]
    pub fn mark(&self) {
        if !self.lifecycle.mark() {
            return;
        }

        self.components.mark_all();

        if let Some(attachment) = self.attachment.borrow().as_ref() {
            attachment.entities.set_marked();
            attachment.components.set_marked();
        }
    }

    /// Finalizes any component that somehow outlived its owner, then drops
    /// the registry wiring. Components destroyed by the regular sweep are
    /// already gone from the private store at this point.
    #[doc(hidden)]
    pub fn teardown(&self) {
        self.components.truly_destroy_all();
        self.attachment.borrow_mut().take();
    }

    /// The first owned component of exactly `T`.
    pub fn get_component<T: Component>(&self) -> Option<Obj<T>> {
        self.components.get_first_exact::<T>()
    }

    /// All owned components of exactly `T`, in attachment order.
    pub fn get_components<T: Component>(&self) -> Vec<Obj<T>> {
        self.components.get_all_exact::<T>()
    }

    /// The first owned component of `T` or any declared descendant of `T`.
    pub fn get_any_component<T: Component>(&self) -> Option<AnyObj> {
        self.components.get_first_any::<T>()
    }

    /// All owned components of `T` and its declared descendants.
    pub fn get_any_components<T: Component>(&self) -> Vec<AnyObj> {
        self.components.get_all_any::<T>()
    }

    /// The entity's private component store.
    pub fn components(&self) -> &TypedStore {
        &self.components
    }
}
