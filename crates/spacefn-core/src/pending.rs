//! Bounded set of keys held under the modifier

use evdev::Key;

/// Maximum number of keys tracked at once.
///
/// Keys beyond this are dropped rather than tracked; no physical keyboard
/// use of SpaceFN holds this many keys under space.
pub const PENDING_CAPACITY: usize = 8;

/// Insertion-ordered set of held keys with a fixed capacity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingKeys {
    keys: Vec<Key>,
}

impl PendingKeys {
    pub fn new() -> Self {
        Self {
            keys: Vec::with_capacity(PENDING_CAPACITY),
        }
    }

    pub fn contains(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }

    /// Remove `key`, returning whether it was present.
    ///
    /// Removal does not keep the relative order of the remaining keys.
    pub fn remove(&mut self, key: Key) -> bool {
        match self.keys.iter().position(|&k| k == key) {
            Some(index) => {
                self.keys.swap_remove(index);
                true
            }
            None => false,
        }
    }

    /// Append `key` if it is not already present and there is room.
    ///
    /// Returns `false` when the key was not added.
    pub fn append(&mut self, key: Key) -> bool {
        if self.contains(key) {
            return false;
        }
        if self.keys.len() >= PENDING_CAPACITY {
            tracing::debug!("Pending key buffer full, dropping {:?}", key);
            return false;
        }
        self.keys.push(key);
        true
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Key> + '_ {
        self.keys.iter().copied()
    }

    /// Remove and yield every key, leaving the set empty.
    pub fn drain(&mut self) -> impl Iterator<Item = Key> + '_ {
        self.keys.drain(..)
    }
}
