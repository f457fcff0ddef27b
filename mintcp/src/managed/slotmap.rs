use alloc::vec::Vec;

/// A bounded slotmap with generational keys.
///
/// A slotmap provides a `Vec`-like interface where each entry is associated with a stable
/// index-like key. Lookup with the key will detect if an entry has been removed, even when its
/// slot was reused for another element in the meantime, but does not require any lifetime
/// relation between the key and the map.
///
/// ## Usage
///
/// ```
/// # use mintcp::managed::SlotMap;
/// let mut map = SlotMap::with_capacity(2);
/// let index = map.insert(42).unwrap();
/// assert_eq!(map.get(index).cloned(), Some(42));
/// assert_eq!(map.remove(index), Some(42));
/// assert_eq!(map.get(index), None);
/// ```
#[derive(Clone, Debug)]
pub struct SlotMap<T> {
    slots: Vec<Slot<T>>,
    /// Head of the list of vacant slots.
    free_top: Option<usize>,
    generation: Generation,
    len: usize,
    capacity: usize,
}

/// An index into a slotmap.
///
/// The index remains valid until the entry is removed. Accessing the slotmap with the index
/// after the entry was removed will fail, even if the slot where the element was previously
/// stored has been reused for another element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key {
    idx: usize,
    generation: Generation,
}

/// The generation counter.
///
/// Has strictly positive values and advances on every insertion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Generation(u64);

#[derive(Clone, Debug)]
enum Slot<T> {
    Occupied {
        generation: Generation,
        value: T,
    },
    /// A vacant slot, linked to the next vacant one.
    Vacant {
        next_free: Option<usize>,
    },
}

impl<T> SlotMap<T> {
    /// Create an empty map holding at most `capacity` elements.
    ///
    /// No memory is reserved upfront, slots are added on demand up to the limit.
    pub fn with_capacity(capacity: usize) -> Self {
        SlotMap {
            slots: Vec::new(),
            free_top: None,
            generation: Generation(1),
            len: 0,
            capacity,
        }
    }

    /// The number of occupied entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The maximum number of simultaneous entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Retrieve a value by index.
    pub fn get(&self, index: Key) -> Option<&T> {
        match self.slots.get(index.idx)? {
            Slot::Occupied { generation, value } if *generation == index.generation => Some(value),
            _ => None,
        }
    }

    /// Retrieve a mutable value by index.
    pub fn get_mut(&mut self, index: Key) -> Option<&mut T> {
        match self.slots.get_mut(index.idx)? {
            Slot::Occupied { generation, value } if *generation == index.generation => Some(value),
            _ => None,
        }
    }

    /// Insert a value, returning its new key.
    ///
    /// Returns `None` if the map is at capacity or if no memory could be reserved for a new slot.
    /// The value is dropped in that case.
    pub fn insert(&mut self, value: T) -> Option<Key> {
        if self.len >= self.capacity {
            return None;
        }

        let idx = match self.free_top {
            Some(idx) => idx,
            None => {
                self.slots.try_reserve(1).ok()?;
                self.slots.push(Slot::Vacant { next_free: None });
                self.slots.len() - 1
            },
        };

        self.free_top = match self.slots[idx] {
            Slot::Vacant { next_free } => next_free,
            // The free list only links vacant slots.
            Slot::Occupied { .. } => return None,
        };

        let key = Key {
            idx,
            generation: self.generation,
        };
        self.slots[idx] = Slot::Occupied {
            generation: self.generation,
            value,
        };
        self.generation.advance();
        self.len += 1;
        Some(key)
    }

    /// Remove an element.
    ///
    /// Returns the removed element, or `None` if the index did not refer to an element.
    pub fn remove(&mut self, index: Key) -> Option<T> {
        self.get(index)?;

        let vacant = Slot::Vacant { next_free: self.free_top };
        let removed = core::mem::replace(&mut self.slots[index.idx], vacant);
        self.free_top = Some(index.idx);
        self.len -= 1;

        match removed {
            Slot::Occupied { value, .. } => Some(value),
            Slot::Vacant { .. } => None,
        }
    }

    /// Iterate over all entries and their keys, in slot order.
    pub fn iter(&self) -> impl Iterator<Item=(Key, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| match slot {
                Slot::Occupied { generation, value } => Some((Key {
                    idx,
                    generation: *generation,
                }, value)),
                Slot::Vacant { .. } => None,
            })
    }

    /// Collect the keys of all entries.
    pub fn keys(&self) -> Vec<Key> {
        self.iter().map(|(key, _)| key).collect()
    }
}

impl Generation {
    fn advance(&mut self) {
        // Exhausting 64 bits of generations is not a practical concern.
        self.0 = self.0.wrapping_add(1).max(1);
    }
}
