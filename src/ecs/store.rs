//! A storage that buckets heterogeneous objects by their exact concrete
//! type, designed to make lookups of a known type O(1).
//!
//! Every concrete type gets its own ordered bucket, created lazily on the
//! first insertion or the first exact query of that type. When a bucket is
//! created, its declared ancestor list is compared against every previously
//! registered type exactly once, producing cached ancestor/descendant
//! relations; later "any" queries (a type or any of its descendants) walk
//! the cache instead of rescanning the whole storage.
//!
//! The store never removes entries on its own behalf. Removal happens only
//! through the owning registry's sweep, or by identity when an ownership
//! slot is released.

use std::any::TypeId;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::rc::Rc;

use super::object::{GameObject, Lifecycle};
use super::registry::UpdateContext;
use crate::video::Renderer;

pub(crate) type ObjCell = Rc<RefCell<dyn GameObject>>;

/// A typed handle to a stored object. `Obj<T>` is only ever produced for
/// objects whose exact concrete type is `T`, so borrowing through it cannot
/// fail on the type check.
pub struct Obj<T> {
    cell: ObjCell,
    life: Lifecycle,
    _marker: PhantomData<T>,
}

impl<T> Clone for Obj<T> {
    fn clone(&self) -> Self {
        Obj {
            cell: Rc::clone(&self.cell),
            life: self.life.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: GameObject> Obj<T> {
    /// Immutably borrows the object. Panics if the object is currently
    /// mutably borrowed (e.g. from inside its own `update`).
    #[inline]
    pub fn borrow(&self) -> Ref<T> {
        Ref::map(self.cell.borrow(), |o| {
            o.as_any()
                .downcast_ref::<T>()
                .expect("bucket holds an object of a foreign type")
        })
    }

    /// Mutably borrows the object.
    #[inline]
    pub fn borrow_mut(&self) -> RefMut<T> {
        RefMut::map(self.cell.borrow_mut(), |o| {
            o.as_any_mut()
                .downcast_mut::<T>()
                .expect("bucket holds an object of a foreign type")
        })
    }

    /// Marks the object for destruction; for entities this cascades to all
    /// attached components. Idempotent.
    #[inline]
    pub fn mark(&self) {
        self.cell.borrow().mark();
    }

    #[inline]
    pub fn is_marked(&self) -> bool {
        self.life.is_marked()
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.life.is_destroyed()
    }

    /// Erases the handle's type.
    pub fn any(&self) -> AnyObj {
        AnyObj {
            cell: Rc::clone(&self.cell),
            life: self.life.clone(),
        }
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Obj<T>) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }

    pub(crate) fn cell(&self) -> &ObjCell {
        &self.cell
    }
}

/// A type-erased handle to a stored object, produced by "any" queries which
/// may match descendant types.
#[derive(Clone)]
pub struct AnyObj {
    cell: ObjCell,
    life: Lifecycle,
}

impl AnyObj {
    pub(crate) fn from_parts(cell: ObjCell) -> AnyObj {
        let life = cell.borrow().lifecycle().clone();
        AnyObj { cell, life }
    }

    #[inline]
    pub fn borrow(&self) -> Ref<dyn GameObject> {
        self.cell.borrow()
    }

    #[inline]
    pub fn borrow_mut(&self) -> RefMut<dyn GameObject> {
        self.cell.borrow_mut()
    }

    /// Returns true if the exact concrete type of the object is `T`.
    pub fn is<T: GameObject>(&self) -> bool {
        self.cell.borrow().as_any().is::<T>()
    }

    /// Recovers a typed handle, or `None` when the exact concrete type is
    /// not `T`.
    pub fn downcast<T: GameObject>(self) -> Option<Obj<T>> {
        if self.is::<T>() {
            Some(Obj {
                cell: self.cell,
                life: self.life,
                _marker: PhantomData,
            })
        } else {
            None
        }
    }

    #[inline]
    pub fn mark(&self) {
        self.cell.borrow().mark();
    }

    #[inline]
    pub fn is_marked(&self) -> bool {
        self.life.is_marked()
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.life.is_destroyed()
    }

    #[inline]
    pub fn ptr_eq(&self, other: &AnyObj) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}

struct Entry {
    obj: ObjCell,
    lifecycle: Lifecycle,
}

impl Entry {
    fn handle(&self) -> AnyObj {
        AnyObj {
            cell: Rc::clone(&self.obj),
            life: self.lifecycle.clone(),
        }
    }

    fn typed<T: GameObject>(&self) -> Obj<T> {
        Obj {
            cell: Rc::clone(&self.obj),
            life: self.lifecycle.clone(),
            _marker: PhantomData,
        }
    }
}

struct Bucket {
    type_id: TypeId,
    /// Strict-ancestor TypeIds of this bucket's type, as declared.
    lineage: super::object::Ancestors,
    /// Indices of buckets holding strict descendant types, in the order
    /// those types were registered.
    descendants: Vec<usize>,
    entries: Vec<Entry>,
}

/// The type-bucketed object storage.
pub struct TypedStore {
    buckets: RefCell<Vec<Bucket>>,
    index: RefCell<HashMap<TypeId, usize>>,
    marked: Cell<bool>,
}

impl TypedStore {
    pub(crate) fn new() -> Self {
        TypedStore {
            buckets: RefCell::new(Vec::new()),
            index: RefCell::new(HashMap::new()),
            marked: Cell::new(false),
        }
    }

    /// Indicates whether items queued for destruction are contained.
    #[inline]
    pub fn contains_marked_items(&self) -> bool {
        self.marked.get()
    }

    #[inline]
    pub(crate) fn set_marked(&self) {
        self.marked.set(true);
    }

    /// Appends an object to the bucket of its exact concrete type, creating
    /// the bucket (and its relation caches) if this is the first object of
    /// that type seen.
    pub(crate) fn add<T: GameObject>(&self, value: T) -> Obj<T> {
        let life = value.lifecycle().clone();
        let cell: ObjCell = Rc::new(RefCell::new(value));

        let si = self.ensure_bucket::<T>();
        self.buckets.borrow_mut()[si].entries.push(Entry {
            obj: Rc::clone(&cell),
            lifecycle: life.clone(),
        });

        Obj {
            cell,
            life,
            _marker: PhantomData,
        }
    }

    /// Appends an already-stored object to this store as well; used for the
    /// dual registration of components (entity-local slot plus the
    /// registry-global index).
    pub(crate) fn adopt<T: GameObject>(&self, obj: &Obj<T>) {
        let si = self.ensure_bucket::<T>();
        self.buckets.borrow_mut()[si].entries.push(Entry {
            obj: Rc::clone(&obj.cell),
            lifecycle: obj.life.clone(),
        });
    }

    /// The first element of `T`'s bucket, or `None` when the bucket is
    /// empty or the type has never been seen.
    pub fn get_first_exact<T: GameObject>(&self) -> Option<Obj<T>> {
        let si = self.ensure_bucket::<T>();
        let buckets = self.buckets.borrow();
        buckets[si].entries.first().map(Entry::typed)
    }

    /// The first element across `T`'s bucket and all cached descendant
    /// buckets. `T`'s own bucket is checked first, then descendant buckets
    /// in the order their types were registered.
    pub fn get_first_any<T: GameObject>(&self) -> Option<AnyObj> {
        let si = self.ensure_bucket::<T>();
        let buckets = self.buckets.borrow();

        if let Some(entry) = buckets[si].entries.first() {
            return Some(entry.handle());
        }

        for &di in &buckets[si].descendants {
            if let Some(entry) = buckets[di].entries.first() {
                return Some(entry.handle());
            }
        }

        None
    }

    /// All elements of exactly `T`, in insertion order.
    pub fn get_all_exact<T: GameObject>(&self) -> Vec<Obj<T>> {
        let si = self.ensure_bucket::<T>();
        let buckets = self.buckets.borrow();
        buckets[si].entries.iter().map(Entry::typed).collect()
    }

    /// All elements of `T` and its descendant types: `T`'s bucket first,
    /// then each descendant bucket in type-registration order, insertion
    /// order within every bucket.
    pub fn get_all_any<T: GameObject>(&self) -> Vec<AnyObj> {
        let si = self.ensure_bucket::<T>();
        let buckets = self.buckets.borrow();

        let mut all: Vec<AnyObj> = buckets[si].entries.iter().map(Entry::handle).collect();
        for &di in &buckets[si].descendants {
            all.extend(buckets[di].entries.iter().map(Entry::handle));
        }

        all
    }

    /// Iterates over every stored object, grouped by bucket, buckets in
    /// registration order, insertion order within a bucket. Each call is a
    /// fresh pass over a snapshot; the store must not be mutated while a
    /// pass is consumed.
    pub fn iter(&self) -> ::std::vec::IntoIter<AnyObj> {
        let buckets = self.buckets.borrow();
        let all: Vec<AnyObj> = buckets
            .iter()
            .flat_map(|b| b.entries.iter().map(Entry::handle))
            .collect();
        all.into_iter()
    }

    /// The number of stored objects across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.borrow().iter().map(|b| b.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn update_all(&self, ctx: &UpdateContext) {
        for obj in self.snapshot() {
            obj.borrow_mut().update(ctx);
        }
    }

    pub(crate) fn late_update_all(&self, ctx: &UpdateContext) {
        for obj in self.snapshot() {
            obj.borrow_mut().late_update(ctx);
        }
    }

    pub(crate) fn draw_all(&self, renderer: &mut dyn Renderer) {
        for obj in self.snapshot() {
            obj.borrow_mut().draw(renderer);
        }
    }

    /// Marks every stored object, without finalizing anything.
    pub(crate) fn mark_all(&self) {
        let buckets = self.buckets.borrow();
        for bucket in buckets.iter() {
            for entry in &bucket.entries {
                entry.lifecycle.mark();
            }
        }

        self.marked.set(true);
    }

    /// Destroys and removes all items marked for destruction. A no-op
    /// unless the marked flag is set.
    pub(crate) fn sweep(&self) {
        if !self.marked.get() {
            return;
        }

        self.marked.set(false);

        let removed = self.drain_if(|life| life.is_marked());
        if !removed.is_empty() {
            trace!("swept {} marked object(s)", removed.len());
        }

        for entry in removed {
            finalize(entry);
        }
    }

    /// Unconditionally finalizes and removes every stored object. Used when
    /// an entire world is torn down; the two-phase mark/sweep is bypassed
    /// since nothing can observe the intermediate state.
    pub(crate) fn truly_destroy_all(&self) {
        self.marked.set(false);

        for entry in self.drain_if(|_| true) {
            if !entry.lifecycle.is_destroyed() {
                finalize(entry);
            }
        }
    }

    /// Removes the entry with the given lifecycle identity from the exact
    /// bucket it was inserted into. Silently does nothing when the entry is
    /// already gone.
    pub(crate) fn remove(&self, type_id: TypeId, life: &Lifecycle) {
        let si = match self.index.borrow().get(&type_id) {
            Some(&si) => si,
            None => return,
        };

        let mut buckets = self.buckets.borrow_mut();
        let entries = &mut buckets[si].entries;
        if let Some(pos) = entries.iter().position(|e| e.lifecycle.same(life)) {
            entries.remove(pos);
        }
    }

    /// Removes matching entries bucket-by-bucket, in reverse insertion
    /// order within each bucket, and returns them in removal order. The
    /// store borrow is released before the caller finalizes anything, so
    /// teardown hooks are free to query the store again.
    fn drain_if<F>(&self, pred: F) -> Vec<Entry>
    where
        F: Fn(&Lifecycle) -> bool,
    {
        let mut removed = Vec::new();
        let mut buckets = self.buckets.borrow_mut();

        for bucket in buckets.iter_mut() {
            for li in (0..bucket.entries.len()).rev() {
                if pred(&bucket.entries[li].lifecycle) {
                    removed.push(bucket.entries.remove(li));
                }
            }
        }

        removed
    }

    fn snapshot(&self) -> Vec<ObjCell> {
        let buckets = self.buckets.borrow();
        buckets
            .iter()
            .flat_map(|b| b.entries.iter().map(|e| Rc::clone(&e.obj)))
            .collect()
    }

    fn ensure_bucket<T: GameObject>(&self) -> usize {
        let type_id = TypeId::of::<T>();
        if let Some(&si) = self.index.borrow().get(&type_id) {
            return si;
        }

        let lineage = T::ancestors();
        let mut buckets = self.buckets.borrow_mut();
        let si = buckets.len();

        let mut bucket = Bucket {
            type_id,
            lineage,
            descendants: Vec::new(),
            entries: Vec::new(),
        };

        // One-time relation pass against every previously registered type.
        for (oi, other) in buckets.iter_mut().enumerate() {
            if bucket.lineage.contains(&other.type_id) {
                other.descendants.push(si);
            }

            if other.lineage.contains(&type_id) {
                bucket.descendants.push(oi);
            }
        }

        buckets.push(bucket);
        self.index.borrow_mut().insert(type_id, si);
        si
    }
}

fn finalize(entry: Entry) {
    entry.lifecycle.finalize();

    let mut obj = entry.obj.borrow_mut();
    obj.teardown();
    obj.on_destroy();
}
