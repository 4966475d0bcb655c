use crate::Recycle;

/// Handle to a slot in a [`SlotArena`]. Generations are never reused, so a handle
/// outliving its value (or an arena clear) resolves to nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotHandle {
    index: u32,
    generation: u32,
}

impl SlotHandle {
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    pub live: usize,
    pub free: usize,
    pub allocated: u64,
    pub recycled: u64,
}

impl ArenaStats {
    pub fn merge(&mut self, o: &Self) {
        self.live += o.live;
        self.free += o.free;
        self.allocated += o.allocated;
        self.recycled += o.recycled;
    }
}

struct Slot<T> {
    value: T,
    generation: u32,
    live: bool,
}

/// Flat backing store of recyclable values addressed by handle, with a free-list.
pub struct SlotArena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    next_generation: u32,
    allocated: u64,
    recycled: u64,
}

impl<T: Recycle + Default> Default for SlotArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Recycle + Default> SlotArena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            next_generation: 1,
            allocated: 0,
            recycled: 0,
        }
    }

    /// Allocate a slot holding an empty value, reusing a released one if possible.
    pub fn alloc(&mut self) -> SlotHandle {
        let generation = self.next_generation;
        self.next_generation = self.next_generation.wrapping_add(1).max(1);
        self.allocated += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = generation;
            slot.live = true;
            return SlotHandle { index, generation };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            value: T::default(),
            generation,
            live: true,
        });
        SlotHandle { index, generation }
    }

    #[inline]
    pub fn get(&self, h: SlotHandle) -> Option<&T> {
        self.slots
            .get(h.index as usize)
            .filter(|s| s.live && s.generation == h.generation)
            .map(|s| &s.value)
    }

    #[inline]
    pub fn get_mut(&mut self, h: SlotHandle) -> Option<&mut T> {
        self.slots
            .get_mut(h.index as usize)
            .filter(|s| s.live && s.generation == h.generation)
            .map(|s| &mut s.value)
    }

    #[inline]
    pub fn contains(&self, h: SlotHandle) -> bool {
        self.get(h).is_some()
    }

    /// Recycle the value and put its slot on the free-list. Returns false for a
    /// stale handle.
    pub fn release(&mut self, h: SlotHandle) -> bool {
        let Some(slot) = self.slots.get_mut(h.index as usize) else {
            return false;
        };
        if !slot.live || slot.generation != h.generation {
            return false;
        }
        slot.value.recycle();
        slot.live = false;
        self.free.push(h.index);
        self.recycled += 1;
        true
    }

    /// Drop every slot without recycling. Outstanding handles become stale.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }

    pub fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            live: self.live(),
            free: self.free.len(),
            allocated: self.allocated,
            recycled: self.recycled,
        }
    }
}
