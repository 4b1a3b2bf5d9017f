//! Generational handle arena.
//!
//! Every entity a caller can hold onto (documents, pages, display lists,
//! devices, cookies, annotations) lives in a [`HandleStore`] and is referred
//! to by a [`Handle`]. A handle carries the slot index and the generation the
//! slot had when the value was inserted; removing the value bumps the
//! generation, so stale handles are detected instead of aliasing whatever
//! occupies the slot next.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::num::NonZeroU64;

/// Typed reference into a [`HandleStore<T>`].
pub struct Handle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    const fn new(index: u32, generation: u32) -> Self {
        Self {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    /// Opaque non-zero integer form, for boundary layers that traffic in
    /// integers. Zero is never a valid handle.
    #[must_use = "returns the raw handle value"]
    pub fn to_raw(self) -> NonZeroU64 {
        let raw = (u64::from(self.generation) << 32) | u64::from(self.index);
        // Generations start at 1, so the high half is never zero.
        NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN)
    }

    /// Inverse of [`Handle::to_raw`]. Returns `None` for zero.
    #[must_use = "returns the decoded handle"]
    pub fn from_raw(raw: u64) -> Option<Self> {
        #[allow(clippy::cast_possible_truncation)]
        let (generation, index) = ((raw >> 32) as u32, raw as u32);
        (generation != 0).then(|| Self::new(index, generation))
    }

    #[inline]
    #[must_use = "returns the slot index"]
    pub const fn index(self) -> u32 {
        self.index
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}v{})", self.index, self.generation)
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot arena issuing generational handles.
#[derive(Debug)]
pub struct HandleStore<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for HandleStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HandleStore<T> {
    #[must_use = "creates a new HandleStore"]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Store `value` and return its handle.
    pub fn insert(&mut self, value: T) -> Handle<T> {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return Handle::new(index, slot.generation);
        }
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 1,
            value: Some(value),
        });
        Handle::new(index, 1)
    }

    fn slot(&self, handle: Handle<T>) -> Option<&Slot<T>> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation && s.value.is_some())
    }

    #[must_use = "returns whether the handle is live"]
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.slot(handle).is_some()
    }

    #[must_use = "returns the value if the handle is live"]
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.slot(handle).and_then(|s| s.value.as_ref())
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.value.as_mut())
    }

    /// Take the value out and invalidate `handle`. Returns `None` for a
    /// stale or foreign handle, so double removal is harmless.
    pub fn remove(&mut self, handle: Handle<T>) -> Option<T> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation)?;
        let value = slot.value.take()?;
        slot.generation = next_generation(slot.generation);
        self.free.push(handle.index);
        self.len -= 1;
        Some(value)
    }

    /// Remove every value for which `keep` returns false.
    pub fn retain(&mut self, mut keep: impl FnMut(Handle<T>, &T) -> bool) {
        let doomed: Vec<Handle<T>> = self
            .iter()
            .filter(|(h, v)| !keep(*h, *v))
            .map(|(h, _)| h)
            .collect();
        for h in doomed {
            self.remove(h);
        }
    }

    /// Remove everything, invalidating all outstanding handles.
    pub fn clear(&mut self) {
        let live: Vec<Handle<T>> = self.iter().map(|(h, _)| h).collect();
        for h in live {
            self.remove(h);
        }
    }

    #[inline]
    #[must_use = "returns the number of live values"]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use = "returns whether the store is empty"]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Live values in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            let index = u32::try_from(i).ok()?;
            s.value
                .as_ref()
                .map(|v| (Handle::new(index, s.generation), v))
        })
    }
}

const fn next_generation(g: u32) -> u32 {
    match g.wrapping_add(1) {
        0 => 1,
        n => n,
    }
}
