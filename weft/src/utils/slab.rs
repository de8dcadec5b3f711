/// A generation-checked slab allocator.
///
/// A `Slab` stores values of type `T` in a contiguous array and hands out
/// [`Key`]s made of a slot index and a generation counter. When a slot is
/// freed its generation is bumped, so a stale key pointing at a reused slot
/// is detected instead of aliasing the new occupant.
///
/// The runtime stores task frames here and only ever passes keys around:
/// a waker that outlives its task resolves to `None` rather than to a
/// dangling frame.
pub(crate) struct Slab<T> {
    /// Storage for entries, occupied or vacant.
    entries: Vec<Entry<T>>,

    /// Stack of vacant indices that can be reused.
    free: Vec<u32>,

    /// Number of occupied entries.
    len: usize,
}

/// Stable handle to a value stored in a [`Slab`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Key {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

enum Entry<T> {
    Occupied { generation: u32, value: T },
    Vacant { generation: u32 },
}

impl<T> Slab<T> {
    /// Creates a slab with room for `capacity` entries before reallocating.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Inserts the value built by `make`, which receives the key it will
    /// be stored under.
    ///
    /// Vacant slots are reused first; otherwise the slab grows.
    pub(crate) fn insert_with(&mut self, make: impl FnOnce(Key) -> T) -> Key {
        let key = match self.free.pop() {
            Some(index) => {
                let generation = match &self.entries[index as usize] {
                    Entry::Vacant { generation } => *generation,
                    Entry::Occupied { .. } => unreachable!("free list points at an occupied slot"),
                };
                Key { index, generation }
            }
            None => {
                let index = u32::try_from(self.entries.len()).expect("slab index overflow");
                self.entries.push(Entry::Vacant { generation: 0 });
                Key {
                    index,
                    generation: 0,
                }
            }
        };

        self.entries[key.index as usize] = Entry::Occupied {
            generation: key.generation,
            value: make(key),
        };
        self.len += 1;

        key
    }

    /// Returns a mutable reference to the value stored under `key`, or
    /// `None` if the key is stale.
    pub(crate) fn get_mut(&mut self, key: Key) -> Option<&mut T> {
        match self.entries.get_mut(key.index as usize) {
            Some(Entry::Occupied { generation, value }) if *generation == key.generation => {
                Some(value)
            }
            _ => None,
        }
    }

    /// Returns `true` if `key` still designates a live value.
    pub(crate) fn contains(&self, key: Key) -> bool {
        matches!(
            self.entries.get(key.index as usize),
            Some(Entry::Occupied { generation, .. }) if *generation == key.generation
        )
    }

    /// Removes and returns the value stored under `key`.
    ///
    /// Returns `None` if the key is stale. The slot's generation is bumped
    /// so `key` never matches again.
    pub(crate) fn remove(&mut self, key: Key) -> Option<T> {
        if !self.contains(key) {
            return None;
        }

        let vacant = Entry::Vacant {
            generation: key.generation.wrapping_add(1),
        };

        match std::mem::replace(&mut self.entries[key.index as usize], vacant) {
            Entry::Occupied { value, .. } => {
                self.free.push(key.index);
                self.len -= 1;
                Some(value)
            }
            Entry::Vacant { .. } => unreachable!("contains() checked occupancy"),
        }
    }

    /// Removes every value, returning them in slot order.
    pub(crate) fn drain(&mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len);

        for (index, entry) in self.entries.iter_mut().enumerate() {
            let generation = match entry {
                Entry::Occupied { generation, .. } => *generation,
                Entry::Vacant { .. } => continue,
            };

            let vacant = Entry::Vacant {
                generation: generation.wrapping_add(1),
            };

            if let Entry::Occupied { value, .. } = std::mem::replace(entry, vacant) {
                out.push(value);
                self.free.push(index as u32);
            }
        }

        self.len = 0;
        out
    }

    /// Iterates over live values.
    pub(crate) fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Occupied { value, .. } => Some(value),
            Entry::Vacant { .. } => None,
        })
    }

    /// Number of live values.
    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut slab = Slab::with_capacity(4);
        let key = slab.insert_with(|_| 10);

        assert_eq!(slab.get_mut(key).copied(), Some(10));
        assert_eq!(slab.len(), 1);
    }

    #[test]
    fn test_insert_with_sees_its_own_key() {
        let mut slab = Slab::with_capacity(1);
        let key = slab.insert_with(|key| key);

        assert_eq!(slab.get_mut(key).copied(), Some(key));
    }

    #[test]
    fn test_stale_key_is_rejected_after_reuse() {
        let mut slab = Slab::with_capacity(1);

        let old = slab.insert_with(|_| "first");
        assert_eq!(slab.remove(old), Some("first"));

        let new = slab.insert_with(|_| "second");
        assert_eq!(new.index, old.index);
        assert_ne!(new.generation, old.generation);

        assert!(slab.get_mut(old).is_none());
        assert!(slab.remove(old).is_none());
        assert_eq!(slab.get_mut(new).copied(), Some("second"));
    }

    #[test]
    fn test_drain_empties_and_invalidates() {
        let mut slab = Slab::with_capacity(3);
        let a = slab.insert_with(|_| 1);
        let b = slab.insert_with(|_| 2);

        let mut drained = slab.drain();
        drained.sort();

        assert_eq!(drained, vec![1, 2]);
        assert_eq!(slab.len(), 0);
        assert!(!slab.contains(a));
        assert!(!slab.contains(b));
    }
}
