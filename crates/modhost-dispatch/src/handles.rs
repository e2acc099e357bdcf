//! Handle table: stable integer handles for weakly-held host objects.
//!
//! Scripts only ever hold the integer. Looking up a handle whose referent
//! has been destroyed yields `None`, never a dangling object.

use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use tracing::trace;

use modhost_core::types::Handle;

/// Slot-indexed table of weak references with FIFO slot reuse.
#[derive(Debug)]
pub struct HandleTable<T> {
    /// Slot index → weak reference (`None` when freed).
    slots: Vec<Option<Weak<T>>>,
    /// Freed slot indices, oldest first.
    free: VecDeque<usize>,
}

impl<T> HandleTable<T> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: VecDeque::new(),
        }
    }

    /// Allocates a handle for `object`, reusing the oldest freed slot before
    /// growing the table.
    pub fn create(&mut self, object: Weak<T>) -> Handle {
        let index = match self.free.pop_front() {
            Some(index) => {
                self.slots[index] = Some(object);
                index
            }
            None => {
                self.slots.push(Some(object));
                self.slots.len() - 1
            }
        };

        trace!(handle = index, "Handle allocated");
        Handle::new(index as u32)
    }

    /// Returns the live object behind `handle`.
    ///
    /// Out-of-range, freed and destroyed referents all report `None`.
    pub fn get(&self, handle: Handle) -> Option<Rc<T>> {
        self.slots
            .get(handle.index())
            .and_then(|slot| slot.as_ref())
            .and_then(Weak::upgrade)
    }

    /// Releases `handle` for reuse. Freeing an already free or unknown
    /// handle is a no-op.
    pub fn free(&mut self, handle: Handle) {
        let index = handle.index();
        if let Some(slot) = self.slots.get_mut(index) {
            if slot.take().is_some() {
                self.free.push_back(index);
                trace!(handle = index, "Handle freed");
            }
        }
    }

    /// Reverse lookup: the handle currently assigned to `object`.
    pub fn get_key(&self, object: &Weak<T>) -> Option<Handle> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|weak| weak.ptr_eq(object)))
            .map(|index| Handle::new(index as u32))
    }

    /// Number of allocated (not freed) slots.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Returns whether no slot is allocated.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every slot and the free list.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}
