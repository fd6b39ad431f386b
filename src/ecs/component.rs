//! Components: objects owned by exactly one entity.
//!
//! A component lives in two stores at once, its entity's private store and
//! the registry-global component index, sharing a single lifecycle cell
//! between both slots. Destroying the component through either path removes
//! it from both.

use std::any::TypeId;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::object::{GameObject, Lifecycle};
use super::store::{AnyObj, Obj, TypedStore};

/// A registered component; implemented by `declare_component!`.
pub trait Component: GameObject {
    fn component_core(&self) -> &ComponentCore;
}

/// Wiring a component receives when it is attached to an entity.
pub(crate) struct ComponentAttachment {
    pub entity: Weak<RefCell<dyn GameObject>>,
    /// The owning entity's private store.
    pub local: Rc<TypedStore>,
    /// The registry-global component index.
    pub global: Rc<TypedStore>,
}

/// The state every component embeds.
pub struct ComponentCore {
    lifecycle: Lifecycle,
    attachment: RefCell<Option<ComponentAttachment>>,
}

impl Default for ComponentCore {
    fn default() -> Self {
        ComponentCore::new()
    }
}

impl ComponentCore {
    pub fn new() -> Self {
        ComponentCore {
            lifecycle: Lifecycle::new(),
            attachment: RefCell::new(None),
        }
    }

    #[inline]
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// True once the component has been attached and until it is destroyed.
    pub fn is_attached(&self) -> bool {
        self.attachment.borrow().is_some()
    }

    pub(crate) fn attach(&self, attachment: ComponentAttachment) {
        *self.attachment.borrow_mut() = Some(attachment);
    }

    /// Marks the component for destruction at the next sweep. The owning
    /// entity is left untouched.
    #[doc(hidden)]
    pub fn mark(&self) {
        if !self.lifecycle.mark() {
            return;
        }

        if let Some(attachment) = self.attachment.borrow().as_ref() {
            attachment.local.set_marked();
            attachment.global.set_marked();
        }
    }

    /// Releases both ownership slots of the destroyed component. The store
    /// driving the destruction has already dropped its own entry, so one of
    /// the two removals is typically a no-op.
    #[doc(hidden)]
    pub fn teardown(&self, type_id: TypeId) {
        if let Some(attachment) = self.attachment.borrow_mut().take() {
            attachment.local.remove(type_id, &self.lifecycle);
            attachment.global.remove(type_id, &self.lifecycle);
        }
    }

    /// The entity this component is attached to.
    ///
    /// Panics when the component has not been attached yet, or has already
    /// been torn down.
    pub fn entity(&self) -> AnyObj {
        let attachment = self.attachment.borrow();
        let attachment = attachment
            .as_ref()
            .expect("the component is not attached to an entity");

        let cell = attachment
            .entity
            .upgrade()
            .expect("the owning entity is gone");

        AnyObj::from_parts(cell)
    }

    /// The first sibling component of exactly `T`, including this one.
    pub fn get_component<T: Component>(&self) -> Option<Obj<T>> {
        self.local().get_first_exact::<T>()
    }

    /// All sibling components of exactly `T`.
    pub fn get_components<T: Component>(&self) -> Vec<Obj<T>> {
        self.local().get_all_exact::<T>()
    }

    /// The first sibling component of `T` or any declared descendant.
    pub fn get_any_component<T: Component>(&self) -> Option<AnyObj> {
        self.local().get_first_any::<T>()
    }

    /// All sibling components of `T` and its declared descendants.
    pub fn get_any_components<T: Component>(&self) -> Vec<AnyObj> {
        self.local().get_all_any::<T>()
    }

    fn local(&self) -> Rc<TypedStore> {
        let attachment = self.attachment.borrow();
        let attachment = attachment
            .as_ref()
            .expect("the component is not attached to an entity");
        Rc::clone(&attachment.local)
    }
}
