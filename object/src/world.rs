//! Multi-version variable storage.
//!
//! A [`Slot`] holds one value per world that has written or inherited
//! it. Worlds form a tree rooted at a single root world; reads walk
//! from the active world towards the root. Non-root worlds record what
//! they read from ancestors and which slots they wrote, so their changes
//! can later be validated and merged into the parent ([`World::commit`])
//! or thrown away ([`World::revert`]).

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashMap;
use log::{debug, warn};

use crate::{ObjectError, Value};

pub type SlotRef = Rc<Slot>;
pub type WorldRef = Rc<World>;

static NEXT_SLOT: AtomicU64 = AtomicU64::new(0);
static NEXT_WORLD: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorldId(u64);

/// Storage for one variable: world -> value.
pub struct Slot {
    id: u64,
    values: RefCell<AHashMap<WorldId, Value>>,
}

impl Slot {
    pub fn new() -> SlotRef {
        Rc::new(Self {
            id: NEXT_SLOT.fetch_add(1, Ordering::Relaxed),
            values: RefCell::new(AHashMap::new()),
        })
    }

    /// A new slot whose world map is a copy of `other`'s.
    pub fn copy_of(other: &Slot) -> SlotRef {
        Rc::new(Self {
            id: NEXT_SLOT.fetch_add(1, Ordering::Relaxed),
            values: RefCell::new(other.values.borrow().clone()),
        })
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Value stored exactly at `world`, without consulting ancestors.
    pub fn get(&self, world: WorldId) -> Option<Value> {
        self.values.borrow().get(&world).cloned()
    }

    fn put(&self, world: WorldId, value: Value) {
        self.values.borrow_mut().insert(world, value);
    }

    fn remove(&self, world: WorldId) -> Option<Value> {
        self.values.borrow_mut().remove(&world)
    }

    /// Number of worlds holding an entry.
    pub fn versions(&self) -> usize {
        self.values.borrow().len()
    }
}

pub struct World {
    id: WorldId,
    parent: Option<WorldRef>,
    reads: RefCell<Vec<(SlotRef, Value)>>,
    writes: RefCell<AHashMap<u64, SlotRef>>,
}

impl World {
    /// Creates a root world. The runtime makes exactly one.
    pub fn root() -> WorldRef {
        Rc::new(Self::with_parent(None))
    }

    pub fn spawn(parent: &WorldRef) -> WorldRef {
        let world = Self::with_parent(Some(parent.clone()));
        debug!("spawn world {} from {}", world.id.0, parent.id.0);
        Rc::new(world)
    }

    fn with_parent(parent: Option<WorldRef>) -> Self {
        Self {
            id: WorldId(NEXT_WORLD.fetch_add(1, Ordering::Relaxed)),
            parent,
            reads: RefCell::new(Vec::new()),
            writes: RefCell::new(AHashMap::new()),
        }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id.0
    }

    #[inline]
    pub fn world_id(&self) -> WorldId {
        self.id
    }

    #[inline]
    pub fn parent(&self) -> Option<&WorldRef> {
        self.parent.as_ref()
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn read_set_len(&self) -> usize {
        self.reads.borrow().len()
    }

    pub fn write_set_len(&self) -> usize {
        self.writes.borrow().len()
    }

    /// Value of `slot` as seen from this world, walking ancestors.
    /// Records nothing.
    pub fn peek(&self, slot: &Slot) -> Option<Value> {
        if let Some(value) = slot.get(self.id) {
            return Some(value);
        }
        let mut current = self.parent.as_deref();
        while let Some(world) = current {
            if let Some(value) = slot.get(world.id) {
                return Some(value);
            }
            current = world.parent.as_deref();
        }
        None
    }

    /// Value of `slot` as seen from this world. A value inherited from an
    /// ancestor is cached under this world and added to the read-set.
    pub fn read(&self, slot: &SlotRef) -> Option<Value> {
        if let Some(value) = slot.get(self.id) {
            return Some(value);
        }
        let value = self.parent.as_deref()?.peek(slot)?;
        slot.put(self.id, value.clone());
        self.reads.borrow_mut().push((slot.clone(), value.clone()));
        Some(value)
    }

    /// Store `value` under this world. Ancestor entries are never touched.
    pub fn write(&self, slot: &SlotRef, value: Value) {
        slot.put(self.id, value);
        if !self.is_root() {
            self.writes.borrow_mut().insert(slot.id, slot.clone());
        }
    }

    /// Merges this world's writes into its parent.
    ///
    /// Every recorded read is re-validated against the parent's current
    /// state first. On any mismatch the commit fails with `Ok(false)` and
    /// nothing is mutated. On success the written values move into the
    /// parent, this world's own entries are dropped so later reads fall
    /// through to the parent, and both sets are cleared.
    ///
    /// After a commit the world reads through to its parent again, and the
    /// reads it had recorded are carried into the parent's read-set.
    pub fn commit(&self) -> Result<bool, ObjectError> {
        let parent = self.parent.as_ref().ok_or(ObjectError::CommitRoot)?;

        for (slot, observed) in self.reads.borrow().iter() {
            let current = parent.peek(slot);
            if !current.as_ref().is_some_and(|v| v.identical(observed)) {
                warn!(
                    "commit of world {} into {} failed: slot {} read {:?}, parent now has {:?}",
                    self.id.0, parent.id.0, slot.id, observed, current
                );
                return Ok(false);
            }
        }

        let reads = std::mem::take(&mut *self.reads.borrow_mut());
        let writes = std::mem::take(&mut *self.writes.borrow_mut());

        // The parent now depends on whatever its own ancestors supplied.
        for (slot, _) in &reads {
            parent.read(slot);
        }
        for slot in writes.values() {
            if let Some(value) = slot.remove(self.id) {
                parent.write(slot, value);
            }
        }
        for (slot, _) in &reads {
            slot.remove(self.id);
        }

        debug!(
            "committed world {} into {}: {} reads, {} writes",
            self.id.0,
            parent.id.0,
            reads.len(),
            writes.len()
        );
        Ok(true)
    }

    /// Discards this world's writes and cached reads. Afterwards the world
    /// behaves like a fresh spawn from its parent's current state.
    pub fn revert(&self) {
        let reads = std::mem::take(&mut *self.reads.borrow_mut());
        let writes = std::mem::take(&mut *self.writes.borrow_mut());
        for slot in writes.values() {
            slot.remove(self.id);
        }
        for (slot, _) in &reads {
            slot.remove(self.id);
        }
        debug!(
            "reverted world {}: dropped {} writes, {} reads",
            self.id.0,
            writes.len(),
            reads.len()
        );
    }
}
