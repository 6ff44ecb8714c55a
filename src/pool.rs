use std::marker::PhantomData;

use crate::handle::Handle;

struct Slot {
    generation: u32,
    alive: bool,
}

/// A generational arena storing backend wrappers, indirected through
/// [`Handle<Tag>`].
///
/// Mirrors the teacher's `wgpu-core::registry::Storage` in spirit (dense
/// storage + generation tracking) but is deliberately the single-threaded,
/// `Vec`-backed shape the original KDGpu `Pool<T, H>` uses: there is no
/// concurrent-access story here (see spec §5) and the element type is
/// never individually destructed on `remove` — only overwritten on reuse,
/// or dropped wholesale when the pool itself is dropped. Types stored here
/// must tolerate that (the Vulkan backend only ever stores POD wrappers
/// around native handles and raw pointers; they release native resources
/// from the `delete<X>` call path, not from `Drop`).
pub struct Pool<T, Tag> {
    data: Vec<T>,
    slots: Vec<Slot>,
    free_indices: Vec<u32>,
    capacity: usize,
    _tag: PhantomData<fn() -> Tag>,
}

impl<T, Tag> Pool<T, Tag> {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            slots: Vec::new(),
            free_indices: Vec::new(),
            capacity: 0,
            _tag: PhantomData,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            free_indices: Vec::with_capacity(capacity),
            capacity,
            _tag: PhantomData,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live slots.
    pub fn len(&self) -> usize {
        self.data.len() - self.free_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn can_use(&self, handle: Handle<Tag>) -> bool {
        let index = handle.index() as usize;
        index < self.slots.len()
            && self.slots[index].generation == handle.generation()
            && self.slots[index].alive
    }

    pub fn get(&self, handle: Handle<Tag>) -> Option<&T> {
        if self.can_use(handle) {
            Some(&self.data[handle.index() as usize])
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, handle: Handle<Tag>) -> Option<&mut T> {
        if self.can_use(handle) {
            Some(&mut self.data[handle.index() as usize])
        } else {
            None
        }
    }

    pub fn contains(&self, handle: Handle<Tag>) -> bool {
        self.can_use(handle)
    }

    fn grow_capacity(&mut self) {
        self.capacity = if self.capacity == 0 { 1 } else { self.capacity * 2 };
        self.data.reserve(self.capacity);
        self.slots.reserve(self.capacity);
        self.free_indices.reserve(self.capacity);
    }

    /// Inserts `value`, reusing a free slot when one exists, returning the
    /// fresh handle.
    pub fn insert(&mut self, value: T) -> Handle<Tag> {
        if self.len() >= self.capacity {
            self.grow_capacity();
        }

        if let Some(index) = self.free_indices.pop() {
            let slot = &mut self.slots[index as usize];
            slot.alive = true;
            self.data[index as usize] = value;
            Handle::new(index, slot.generation)
        } else {
            let index = self.data.len() as u32;
            self.data.push(value);
            self.slots.push(Slot {
                generation: 1,
                alive: true,
            });
            Handle::new(index, 1)
        }
    }

    /// Removes the element named by `handle`. A no-op if the handle does not
    /// resolve (idempotent against double-removal, per spec §4.1).
    pub fn remove(&mut self, handle: Handle<Tag>) {
        if !self.can_use(handle) {
            return;
        }
        let slot = &mut self.slots[handle.index() as usize];
        slot.generation += 1;
        slot.alive = false;
        self.free_indices.push(handle.index());
    }

    /// Removes every live slot, bumping generations so all issued handles
    /// become invalid. Capacity is preserved.
    pub fn clear(&mut self) {
        let live: Vec<Handle<Tag>> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.alive)
            .map(|(index, slot)| Handle::new(index as u32, slot.generation))
            .collect();
        for handle in live {
            self.remove(handle);
        }
    }

    /// Converts a raw storage index into a handle, if the slot is currently
    /// alive.
    pub fn handle_for_index(&self, index: u32) -> Option<Handle<Tag>> {
        let slot = self.slots.get(index as usize)?;
        slot.alive.then(|| Handle::new(index, slot.generation))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle<Tag>, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.alive)
            .map(move |(index, slot)| (Handle::new(index as u32, slot.generation), &self.data[index]))
    }
}

impl<T, Tag> Default for Pool<T, Tag> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TagA;

    #[test]
    fn insert_then_get() {
        let mut pool: Pool<i32, TagA> = Pool::new();
        let h = pool.insert(42);
        assert_eq!(pool.get(h), Some(&42));
    }

    #[test]
    fn remove_invalidates_handle() {
        let mut pool: Pool<i32, TagA> = Pool::new();
        let h = pool.insert(1);
        pool.remove(h);
        assert_eq!(pool.get(h), None);
    }

    #[test]
    fn reuse_bumps_generation_and_old_handle_stays_dead() {
        let mut pool: Pool<i32, TagA> = Pool::new();
        let h1 = pool.insert(1);
        pool.remove(h1);
        let h2 = pool.insert(2);
        assert_eq!(h1.index(), h2.index());
        assert!(h2.generation() > h1.generation());
        assert_eq!(pool.get(h1), None);
        assert_eq!(pool.get(h2), Some(&2));
    }

    #[test]
    fn remove_does_not_affect_other_handles() {
        let mut pool: Pool<i32, TagA> = Pool::new();
        let a = pool.insert(1);
        let b = pool.insert(2);
        pool.remove(a);
        assert_eq!(pool.get(b), Some(&2));
    }

    #[test]
    fn double_remove_is_a_no_op() {
        let mut pool: Pool<i32, TagA> = Pool::new();
        let h = pool.insert(1);
        pool.remove(h);
        pool.remove(h);
        assert_eq!(pool.get(h), None);
    }

    #[test]
    fn clear_invalidates_every_issued_handle_and_keeps_capacity() {
        let mut pool: Pool<i32, TagA> = Pool::new();
        let h1 = pool.insert(1);
        let h2 = pool.insert(2);
        let capacity_before = pool.capacity();
        pool.clear();
        assert_eq!(pool.get(h1), None);
        assert_eq!(pool.get(h2), None);
        assert_eq!(pool.capacity(), capacity_before);
    }

    #[test]
    fn capacity_doubles_from_one_on_exhaustion() {
        let mut pool: Pool<i32, TagA> = Pool::new();
        assert_eq!(pool.capacity(), 0);
        pool.insert(1);
        assert_eq!(pool.capacity(), 1);
        pool.insert(2);
        assert_eq!(pool.capacity(), 2);
        pool.insert(3);
        assert_eq!(pool.capacity(), 4);
    }
}
